//! Lazy, failure-tolerant thumbnail generation.

use serde::Serialize;

use super::options::{RasterOptions, RenderIntent};
use super::rasterizer::Rasterizer;
use crate::edit::GenerationToken;
use crate::model::{PdfDocument, RasterImage};

/// Scale used for thumbnails unless configured otherwise.
pub const DEFAULT_THUMBNAIL_SCALE: f32 = 0.2;

const THUMBNAIL_QUALITY: u8 = 75;

/// A rendered thumbnail, or a placeholder for a page that failed to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ThumbnailImage {
    Rendered(RasterImage),
    Placeholder {
        width: u32,
        height: u32,
        reason: String,
    },
}

impl ThumbnailImage {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, ThumbnailImage::Placeholder { .. })
    }

    /// Pixel size of the thumbnail (or of the space a placeholder reserves).
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ThumbnailImage::Rendered(image) => (image.width, image.height),
            ThumbnailImage::Placeholder { width, height, .. } => (*width, *height),
        }
    }
}

/// Pages processed so far out of the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
}

impl Progress {
    /// Completion as a fraction in 0.0..=1.0.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            f64::from(self.completed) / f64::from(self.total)
        }
    }
}

/// One item of a thumbnail run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnail {
    /// Page number (1-indexed)
    pub page: u32,
    pub image: ThumbnailImage,
    pub progress: Progress,
}

/// Produces thumbnails for every page of a document, one at a time.
pub struct ThumbnailGenerator {
    rasterizer: Rasterizer,
    options: RasterOptions,
}

impl ThumbnailGenerator {
    /// Create a generator using [`DEFAULT_THUMBNAIL_SCALE`].
    pub fn new(rasterizer: Rasterizer) -> Self {
        Self::with_scale(rasterizer, DEFAULT_THUMBNAIL_SCALE)
    }

    /// Create a generator rendering at `scale`.
    pub fn with_scale(rasterizer: Rasterizer, scale: f32) -> Self {
        Self {
            rasterizer,
            options: RasterOptions::new()
                .with_scale(scale)
                .with_quality(THUMBNAIL_QUALITY)
                .with_intent(RenderIntent::Display),
        }
    }

    /// The options thumbnails are rendered with.
    pub fn options(&self) -> &RasterOptions {
        &self.options
    }

    /// Start a run over all pages of `doc`, from page 1.
    ///
    /// Each call starts over; an earlier iterator must be dropped first.
    pub fn generate<'a>(&'a mut self, doc: &'a PdfDocument) -> Thumbnails<'a> {
        Thumbnails {
            rasterizer: &mut self.rasterizer,
            options: &self.options,
            doc,
            next_page: 1,
            total: doc.page_count(),
            token: None,
        }
    }

    /// Give the rasterizer back.
    pub fn into_rasterizer(self) -> Rasterizer {
        self.rasterizer
    }
}

/// Iterator over thumbnails; see [`ThumbnailGenerator::generate`].
pub struct Thumbnails<'a> {
    rasterizer: &'a mut Rasterizer,
    options: &'a RasterOptions,
    doc: &'a PdfDocument,
    next_page: u32,
    total: u32,
    token: Option<GenerationToken>,
}

impl Thumbnails<'_> {
    /// Stop yielding as soon as `token` is superseded.
    pub fn with_token(mut self, token: GenerationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Progress so far.
    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.next_page.saturating_sub(1).min(self.total),
            total: self.total,
        }
    }
}

impl Iterator for Thumbnails<'_> {
    type Item = Thumbnail;

    fn next(&mut self) -> Option<Thumbnail> {
        if self.next_page > self.total {
            return None;
        }
        if let Some(token) = &self.token {
            if !token.is_current() {
                log::debug!(
                    "document changed; stopping thumbnails at page {}",
                    self.next_page
                );
                self.next_page = self.total + 1;
                return None;
            }
        }

        let page = self.next_page;
        self.next_page += 1;

        let image = match self.rasterizer.rasterize(self.doc, page, self.options) {
            Ok(raster) => ThumbnailImage::Rendered(raster),
            Err(e) => {
                log::warn!("thumbnail for page {} failed: {}", page, e);
                let (width, height) =
                    Rasterizer::output_size(self.doc, page, self.options.scale).unwrap_or((1, 1));
                ThumbnailImage::Placeholder {
                    width,
                    height,
                    reason: e.to_string(),
                }
            }
        };

        Some(Thumbnail {
            page,
            image,
            progress: self.progress(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total + 1).saturating_sub(self.next_page) as usize;
        if self.token.is_some() {
            (0, Some(remaining))
        } else {
            (remaining, Some(remaining))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_fraction() {
        assert_eq!(Progress { completed: 0, total: 0 }.fraction(), 1.0);
        assert_eq!(Progress { completed: 1, total: 4 }.fraction(), 0.25);
    }

    #[test]
    fn test_placeholder_dimensions() {
        let image = ThumbnailImage::Placeholder {
            width: 12,
            height: 16,
            reason: "boom".into(),
        };
        assert!(image.is_placeholder());
        assert_eq!(image.dimensions(), (12, 16));
    }
}
