//! Document-level types.

use std::path::Path;

use chrono::{DateTime, Utc};
use lopdf::Document as LopdfDocument;
use serde::{Deserialize, Serialize};

use super::Page;
use crate::detect::{detect_format_from_bytes, PdfFormat};
use crate::error::{Error, Result};
use crate::objects;
use crate::security;

/// An immutable PDF document: the serialized bytes plus the parsed object graph.
///
/// Transforms never modify a `PdfDocument`; they clone the object graph, work
/// on the clone and serialize it into a new `PdfDocument`.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    bytes: Vec<u8>,
    inner: LopdfDocument,
    pages: Vec<Page>,
    format: PdfFormat,
    was_encrypted: bool,
}

impl PdfDocument {
    /// Parse a PDF from bytes.
    ///
    /// Encrypted documents open only if their user password is empty;
    /// otherwise [`Error::Encrypted`] is returned.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Result<Self> {
        Self::from_bytes_with_password(data, None)
    }

    /// Parse a PDF from bytes, decrypting it with `password` if needed.
    pub fn from_bytes_with_password(
        data: impl Into<Vec<u8>>,
        password: Option<&str>,
    ) -> Result<Self> {
        let bytes = data.into();
        let format = detect_format_from_bytes(&bytes)?;

        let mut inner = LopdfDocument::load_mem(&bytes)?;
        let was_encrypted = inner.trailer.get(b"Encrypt").is_ok();
        if was_encrypted {
            match password {
                Some(password) => security::decrypt_document(&mut inner, password)?,
                None => security::decrypt_document(&mut inner, "").map_err(|e| match e {
                    Error::InvalidPassword => Error::Encrypted,
                    other => other,
                })?,
            }
            log::debug!("decrypted {} document", format);
        } else if password.is_some() {
            log::debug!("password supplied for an unencrypted document; ignoring");
        }

        let pages = collect_pages(&inner);
        Ok(Self {
            bytes,
            inner,
            pages,
            format,
            was_encrypted,
        })
    }

    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_password(path, None)
    }

    /// Open a PDF file with an optional password.
    pub fn open_with_password<P: AsRef<Path>>(path: P, password: Option<&str>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes_with_password(data, password)
    }

    /// Serialize a lopdf document and wrap the result.
    pub(crate) fn from_lopdf(mut inner: LopdfDocument) -> Result<Self> {
        let bytes = objects::save_to_vec(&mut inner)?;
        let format = detect_format_from_bytes(&bytes)?;
        let pages = collect_pages(&inner);
        Ok(Self {
            bytes,
            inner,
            pages,
            format,
            was_encrypted: false,
        })
    }

    /// Wrap encrypted output bytes together with the plaintext graph they were made from.
    pub(crate) fn from_encrypted_parts(bytes: Vec<u8>, plain: LopdfDocument) -> Result<Self> {
        let format = detect_format_from_bytes(&bytes)?;
        let pages = collect_pages(&plain);
        Ok(Self {
            bytes,
            inner: plain,
            pages,
            format,
            was_encrypted: true,
        })
    }

    /// Serialized bytes of this document.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the document and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Size of the serialized document in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the serialized document is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Header information detected from the bytes.
    pub fn format(&self) -> &PdfFormat {
        &self.format
    }

    /// Whether the source bytes were encrypted (and have been decrypted in memory).
    pub fn was_encrypted(&self) -> bool {
        self.was_encrypted
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// All pages in document order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Get a page by number (1-indexed).
    pub fn page(&self, number: u32) -> Result<&Page> {
        if number == 0 {
            return Err(Error::PageOutOfRange(number, self.page_count()));
        }
        self.pages
            .get((number - 1) as usize)
            .ok_or(Error::PageOutOfRange(number, self.page_count()))
    }

    /// Ensure `number` is a valid 1-based page number.
    pub fn check_page(&self, number: u32) -> Result<()> {
        self.page(number).map(|_| ())
    }

    /// Access the underlying lopdf document.
    pub fn lopdf(&self) -> &LopdfDocument {
        &self.inner
    }

    /// A deep copy of the object graph for transforms to mutate.
    pub(crate) fn to_lopdf(&self) -> LopdfDocument {
        self.inner.clone()
    }

    /// Write the document to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }

    /// Document information dictionary and summary.
    pub fn info(&self) -> DocumentInfo {
        let mut info = DocumentInfo {
            version: self.format.version.clone(),
            page_count: self.page_count(),
            encrypted: self.was_encrypted,
            linearized: self.format.linearized,
            size: self.bytes.len() as u64,
            ..Default::default()
        };

        let dict = self
            .inner
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|o| objects::resolve_dict(&self.inner, o));
        if let Some(dict) = dict {
            info.title = string_from_dict(dict, b"Title");
            info.author = string_from_dict(dict, b"Author");
            info.creator = string_from_dict(dict, b"Creator");
            info.producer = string_from_dict(dict, b"Producer");
            info.created = string_from_dict(dict, b"CreationDate").and_then(|s| parse_pdf_date(&s));
            info.modified = string_from_dict(dict, b"ModDate").and_then(|s| parse_pdf_date(&s));
        }
        info
    }
}

/// Summary of a document, as shown by `pdfsuite info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// PDF version (e.g., "1.7")
    pub version: String,
    /// Number of pages
    pub page_count: u32,
    /// File size in bytes
    pub size: u64,
    /// Whether the file was encrypted
    pub encrypted: bool,
    /// Whether the file is linearized for fast web view
    pub linearized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

fn collect_pages(doc: &LopdfDocument) -> Vec<Page> {
    doc.get_pages()
        .into_iter()
        .map(|(number, id)| {
            let [x0, y0, x1, y1] = objects::page_box(doc, id);
            let mut page = Page::new(number, x1 - x0, y1 - y0);
            page.rotation = objects::page_rotation(doc, id);
            page.origin = (x0, y0);
            page.id = id;
            page
        })
        .collect()
}

fn string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        lopdf::Object::String(bytes, _) => {
            // UTF-16BE with byte order mark
            if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
                let utf16: Vec<u16> = bytes[2..]
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&utf16).ok()
            } else {
                String::from_utf8(bytes.clone())
                    .ok()
                    .or_else(|| Some(bytes.iter().map(|&b| b as char).collect()))
            }
        }
        lopdf::Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSS...).
fn parse_pdf_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);
    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use lopdf::{dictionary, Object, StringFormat};

    fn build(pages: usize) -> LopdfDocument {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 200.into(), 100.into()],
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        let info = doc.add_object(dictionary! {
            "Title" => Object::String(b"Quarterly report".to_vec(), StringFormat::Literal),
            "CreationDate" => Object::String(b"D:20240115103045Z".to_vec(), StringFormat::Literal),
        });
        doc.trailer.set("Root", catalog);
        doc.trailer.set("Info", info);
        doc
    }

    #[test]
    fn test_from_lopdf_round_trip() {
        let doc = PdfDocument::from_lopdf(build(3)).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert!(!doc.is_empty());

        let reopened = PdfDocument::from_bytes(doc.bytes().to_vec()).unwrap();
        assert_eq!(reopened.page_count(), 3);
        assert_eq!(reopened.page(2).unwrap().width, 200.0);
        assert_eq!(reopened.page(2).unwrap().height, 100.0);
    }

    #[test]
    fn test_page_out_of_range() {
        let doc = PdfDocument::from_lopdf(build(2)).unwrap();
        assert!(matches!(doc.page(0), Err(Error::PageOutOfRange(0, 2))));
        assert!(matches!(doc.page(3), Err(Error::PageOutOfRange(3, 2))));
    }

    #[test]
    fn test_not_a_pdf() {
        let result = PdfDocument::from_bytes(b"hello world".to_vec());
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_info() {
        let doc = PdfDocument::from_lopdf(build(1)).unwrap();
        let info = doc.info();
        assert_eq!(info.page_count, 1);
        assert_eq!(info.title.as_deref(), Some("Quarterly report"));
        assert!(!info.encrypted);
        let created = info.created.unwrap();
        assert_eq!(created.year(), 2024);
        assert_eq!(created.month(), 1);
    }

    #[test]
    fn test_parse_pdf_date_partial() {
        let date = parse_pdf_date("D:2023").unwrap();
        assert_eq!(date.year(), 2023);
        assert_eq!(date.month(), 1);
        assert!(parse_pdf_date("D:").is_none());
    }
}
