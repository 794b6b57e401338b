//! Page rasterization.
//!
//! A [`RenderEngine`] draws a page onto an RGBA surface; the [`Rasterizer`]
//! owns that surface and encodes the result as JPEG; the
//! [`ThumbnailGenerator`] walks a whole document and never aborts on a
//! single bad page.

mod engine;
mod hayro_engine;
#[cfg(feature = "mupdf")]
mod mupdf_engine;
mod options;
mod rasterizer;
mod thumbnails;

pub use engine::{EngineConfig, EngineKind, RenderEngine, RenderParams};
pub use hayro_engine::HayroEngine;
#[cfg(feature = "mupdf")]
pub use mupdf_engine::MupdfEngine;
pub use options::{PageSelection, RasterOptions, RenderIntent};
pub use rasterizer::Rasterizer;
pub use thumbnails::{
    Progress, Thumbnail, ThumbnailGenerator, ThumbnailImage, Thumbnails, DEFAULT_THUMBNAIL_SCALE,
};
