//! Error types for pdfsuite.

use std::io;
use thiserror::Error;

/// Result type alias for pdfsuite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while transforming PDF documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing or serializing the PDF object graph.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF structure is corrupted or malformed.
    #[error("Corrupted PDF structure: {0}")]
    Corrupted(String),

    /// A required PDF object is missing.
    #[error("Missing required object: {0}")]
    MissingObject(String),

    /// A page could not be rasterized.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Caller-supplied parameters are invalid.
    #[error("Invalid parameters: {0}")]
    Validation(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// A page ordering is not a permutation of the document's pages.
    #[error("Invalid page order: {0}")]
    InvalidPermutation(String),

    /// The document is encrypted and requires a password.
    #[error("Document is encrypted")]
    Encrypted,

    /// The provided password is incorrect.
    #[error("Invalid password")]
    InvalidPassword,

    /// The document uses a security handler that is not supported.
    #[error("Unsupported encryption: {0}")]
    UnsupportedEncryption(String),

    /// The image re-compression service failed or answered garbage.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Error writing an archive.
    #[error("Archive error: {0}")]
    Archive(String),

    /// An operation was requested in the wrong editing state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A result was produced for a document state that has since been replaced.
    #[error("Result discarded: document state changed while the operation was running")]
    Stale,

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of [`Error`] values.
///
/// Callers use this to decide how to present a failure: protected documents
/// should prompt for a password, render failures may be retried, validation
/// failures never are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A page could not be rasterized.
    Render,
    /// Parameters supplied by the caller are invalid.
    Validation,
    /// The document is encrypted or protected and needs a (different) password.
    Protected,
    /// The optional image re-compression service failed.
    ExternalService,
    /// Filesystem error.
    Io,
    /// The PDF could not be parsed or written.
    Parse,
    /// The archive container could not be written.
    Archive,
    /// Editing state machine violation or stale result.
    State,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Render(_) => ErrorKind::Render,
            Error::Validation(_) | Error::PageOutOfRange(..) | Error::InvalidPermutation(_) => {
                ErrorKind::Validation
            }
            Error::Encrypted | Error::InvalidPassword | Error::UnsupportedEncryption(_) => {
                ErrorKind::Protected
            }
            Error::ExternalService(_) => ErrorKind::ExternalService,
            Error::Io(_) => ErrorKind::Io,
            Error::UnknownFormat
            | Error::UnsupportedVersion(_)
            | Error::PdfParse(_)
            | Error::Corrupted(_)
            | Error::MissingObject(_)
            | Error::Json(_) => ErrorKind::Parse,
            Error::Archive(_) => ErrorKind::Archive,
            Error::InvalidState(_) | Error::Stale => ErrorKind::State,
        }
    }

    /// Whether running the same operation again could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::Validation | ErrorKind::Protected | ErrorKind::State
        )
    }

    /// Whether the error means the document needs a password.
    pub fn is_protected(&self) -> bool {
        self.kind() == ErrorKind::Protected
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub(crate) fn render(msg: impl Into<String>) -> Self {
        Error::Render(msg.into())
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Render(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Archive(err.to_string())
    }
}
