//! Recently used files.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default number of remembered files.
pub const DEFAULT_CAPACITY: usize = 10;

const MAX_CAPACITY: usize = 50;

/// One remembered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentFile {
    /// File name; entries are unique by name
    pub name: String,

    /// What was last done with the file, e.g. `"compress"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,

    pub used_at: DateTime<Utc>,
}

/// Most-recently-used list, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentFiles {
    capacity: usize,
    entries: Vec<RecentFile>,
}

impl Default for RecentFiles {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RecentFiles {
    /// Create an empty list holding at most `capacity` files (clamped to 1..=50).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.clamp(1, MAX_CAPACITY),
            entries: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[RecentFile] {
        &self.entries
    }

    /// Record a use of `name`, moving it to the front.
    pub fn add(&mut self, name: impl Into<String>, operation: Option<&str>) {
        self.add_at(name, operation, Utc::now());
    }

    fn add_at(&mut self, name: impl Into<String>, operation: Option<&str>, used_at: DateTime<Utc>) {
        let name = name.into();
        self.entries.retain(|e| e.name != name);
        self.entries.insert(
            0,
            RecentFile {
                name,
                operation: operation.map(str::to_string),
                used_at,
            },
        );
        self.entries.truncate(self.capacity);
    }

    /// Forget `name`. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Load a list saved with [`save`](Self::save). A missing file yields an empty list.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read(path)?;
        let mut list: RecentFiles = serde_json::from_slice(&data)?;
        list.capacity = list.capacity.clamp(1, MAX_CAPACITY);
        list.entries.truncate(list.capacity);
        Ok(list)
    }

    /// Write the list as JSON, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
