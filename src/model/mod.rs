//! Document model types.
//!
//! A [`PdfDocument`] is an owned PDF byte buffer together with its parsed
//! object graph and page list. Every transform in this crate takes a
//! `&PdfDocument` and returns a new one; inputs are never mutated.

mod document;
mod page;
mod raster;

pub use document::{DocumentInfo, PdfDocument};
pub use page::{Page, Rotation};
pub use raster::RasterImage;
