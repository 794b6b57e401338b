//! ZIP bundling of output files.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};

/// Default deflate level.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 6;

/// A file to put into the archive.
#[derive(Debug, Clone)]
pub enum ArchiveEntry {
    /// In-memory contents stored under `name`
    Bytes { name: String, data: Vec<u8> },
    /// A file read from disk; `name` defaults to the file name
    Path { name: Option<String>, path: PathBuf },
}

impl ArchiveEntry {
    pub fn bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        ArchiveEntry::Bytes {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        ArchiveEntry::Path {
            name: None,
            path: path.into(),
        }
    }

    /// Name the entry will have in the archive, before de-duplication.
    pub fn name(&self) -> String {
        match self {
            ArchiveEntry::Bytes { name, .. } => name.clone(),
            ArchiveEntry::Path {
                name: Some(name), ..
            } => name.clone(),
            ArchiveEntry::Path { name: None, path } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }

    fn read(&self) -> std::io::Result<Vec<u8>> {
        match self {
            ArchiveEntry::Bytes { data, .. } => Ok(data.clone()),
            ArchiveEntry::Path { path, .. } => std::fs::read(path),
        }
    }
}

/// An entry left out of the archive.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedEntry {
    pub name: String,
    pub reason: String,
}

/// A finished archive.
#[derive(Debug, Clone)]
pub struct ArchiveOutput {
    /// ZIP bytes
    pub data: Vec<u8>,
    /// Names stored in the archive, in order
    pub entries: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
}

impl ArchiveOutput {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}

/// Writes entries into a single ZIP archive.
#[derive(Debug, Clone)]
pub struct ArchiveBundler {
    level: i32,
}

impl Default for ArchiveBundler {
    fn default() -> Self {
        Self {
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ArchiveBundler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deflate level (0-9).
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Bundle `entries` into a ZIP archive.
    ///
    /// Entries that cannot be read are skipped and listed in
    /// [`ArchiveOutput::skipped`].
    pub fn bundle(&self, entries: &[ArchiveEntry]) -> Result<ArchiveOutput> {
        if entries.is_empty() {
            return Err(Error::validation("nothing to archive"));
        }
        if !(0..=9).contains(&self.level) {
            return Err(Error::validation(format!(
                "compression level must be between 0 and 9, got {}",
                self.level
            )));
        }

        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.level));
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut names = UniqueNames::default();
        let mut stored = Vec::new();
        let mut skipped = Vec::new();

        for entry in entries {
            let requested = entry.name();
            let data = match entry.read() {
                Ok(data) => data,
                Err(e) => {
                    log::warn!("skipping {}: {}", requested, e);
                    skipped.push(SkippedEntry {
                        name: requested,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let name = names.claim(&requested);
            zip.start_file(name.clone(), options)?;
            zip.write_all(&data)?;
            stored.push(name);
        }

        let data = zip.finish()?.into_inner();
        log::debug!(
            "archived {} entries ({} skipped, {} bytes)",
            stored.len(),
            skipped.len(),
            data.len()
        );
        Ok(ArchiveOutput {
            data,
            entries: stored,
            skipped,
        })
    }
}

/// Hands out names, appending ` (n)` before the extension on collisions.
///
/// Used for archive entries and for batch outputs sharing a directory.
#[derive(Debug, Default)]
pub struct UniqueNames {
    seen: HashMap<String, u32>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name`, or the first free ` (n)` variant of it.
    pub fn claim(&mut self, name: &str) -> String {
        if !self.seen.contains_key(name) {
            self.seen.insert(name.to_string(), 0);
            return name.to_string();
        }
        let (stem, ext) = match name.rfind('.') {
            Some(dot) if dot > 0 => name.split_at(dot),
            _ => (name, ""),
        };
        let mut n = self.seen.get(name).copied().unwrap_or(0);
        loop {
            n += 1;
            let candidate = format!("{} ({}){}", stem, n, ext);
            if !self.seen.contains_key(&candidate) {
                self.seen.insert(name.to_string(), n);
                self.seen.insert(candidate.clone(), 0);
                return candidate;
            }
        }
    }
}
