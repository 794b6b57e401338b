//! PDF format detection and validation.
//!
//! Cheap checks that run before the object graph is parsed, so obviously
//! wrong inputs fail fast with [`Error::UnknownFormat`].

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// PDF format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
    /// Whether a linearization dictionary appears near the start of the file
    pub linearized: bool,
    /// Whether the trailer appears to reference an `/Encrypt` dictionary
    pub encrypted_hint: bool,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)?;
        if self.encrypted_hint {
            write!(f, " (encrypted)")?;
        }
        Ok(())
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Some producers emit junk before the header; readers accept it within 1 KiB.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// The linearization dictionary must be the first object in the file.
const LINEARIZED_SEARCH_WINDOW: usize = 2048;

/// Trailers live at the end; scanning the tail is enough for the hint.
const TRAILER_SEARCH_WINDOW: usize = 4096;

/// Detect PDF format from a file path.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let mut data = Vec::new();
    File::open(path)?.read_to_end(&mut data)?;
    detect_format_from_bytes(&data)
}

/// Detect PDF format from bytes.
///
/// # Returns
/// * `Ok(PdfFormat)` if the data contains a valid PDF header
/// * `Err(Error::UnknownFormat)` if the data is not a PDF
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    let start = find_header(data).ok_or(Error::UnknownFormat)?;
    let header = &data[start..];
    if header.len() < PDF_MAGIC_LEN + VERSION_LEN {
        return Err(Error::UnknownFormat);
    }

    let version_bytes = &header[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();
    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    let head = &data[..data.len().min(LINEARIZED_SEARCH_WINDOW)];
    let tail = &data[data.len().saturating_sub(TRAILER_SEARCH_WINDOW)..];

    Ok(PdfFormat {
        version,
        linearized: contains(head, b"/Linearized"),
        encrypted_hint: contains(tail, b"/Encrypt"),
    })
}

fn find_header(data: &[u8]) -> Option<usize> {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    window
        .windows(PDF_MAGIC_LEN)
        .position(|w| w == PDF_MAGIC)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Check if a version string is valid.
fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

/// Check if a file is a valid PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes represent a valid PDF.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
