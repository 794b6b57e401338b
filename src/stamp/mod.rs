//! Stamping content onto existing pages.

mod color;
mod watermark;

pub use color::Color;
pub use watermark::{apply_watermark, WatermarkOptions};
