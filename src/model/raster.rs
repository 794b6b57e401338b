//! Rasterized page images.

use serde::{Deserialize, Serialize};

/// A page rendered to a JPEG-encoded bitmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterImage {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// JPEG bytes
    #[serde(skip)]
    pub data: Vec<u8>,

    /// JPEG quality the image was encoded with (1-100)
    pub quality: u8,
}

impl RasterImage {
    /// Create a new raster image.
    pub fn new(width: u32, height: u32, data: Vec<u8>, quality: u8) -> Self {
        Self {
            width,
            height,
            data,
            quality,
        }
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the encoded payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }
}
