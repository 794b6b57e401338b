//! Redaction by rasterizing pages and painting opaque boxes over them.

use std::collections::BTreeMap;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use super::rewriter::{PageRewriter, Replacement};
use crate::error::{Error, Result};
use crate::model::PdfDocument;
use crate::render::{RasterOptions, Rasterizer, RenderIntent};
use crate::stamp::Color;

/// A box to black out, in points on the page as displayed (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CensorRegion {
    /// Page number (1-indexed)
    pub page: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CensorRegion {
    pub fn new(page: u32, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            page,
            x,
            y,
            width,
            height,
        }
    }

    fn validate(&self) -> Result<()> {
        let finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width <= 0.0 || self.height <= 0.0 {
            return Err(Error::validation(format!(
                "invalid censor region on page {}: {}x{} at ({}, {})",
                self.page, self.width, self.height, self.x, self.y
            )));
        }
        Ok(())
    }

    /// Pixel rectangle `(x0, y0, x1, y1)` at `scale`, clipped to the surface.
    fn pixel_rect(&self, scale: f32, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let clamp = |v: f32, max: u32| (v.max(0.0) as u32).min(max);
        (
            clamp((self.x * scale).floor(), width),
            clamp((self.y * scale).floor(), height),
            clamp(((self.x + self.width) * scale).ceil(), width),
            clamp(((self.y + self.height) * scale).ceil(), height),
        )
    }
}

/// Options for [`censor`].
#[derive(Debug, Clone, PartialEq)]
pub struct CensorOptions {
    /// How censored pages are rasterized
    pub raster: RasterOptions,

    /// Fill colour of the boxes
    pub color: Color,
}

impl Default for CensorOptions {
    fn default() -> Self {
        Self {
            raster: RasterOptions::new()
                .with_scale(2.0)
                .with_quality(90)
                .with_intent(RenderIntent::Print),
            color: Color::rgb(0, 0, 0),
        }
    }
}

impl CensorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raster(mut self, raster: RasterOptions) -> Self {
        self.raster = raster;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Black out regions of a document.
///
/// Only pages with at least one region are rasterized; the covered content
/// is gone from the output, not merely hidden.
pub fn censor(
    doc: &PdfDocument,
    regions: &[CensorRegion],
    rasterizer: &mut Rasterizer,
    options: &CensorOptions,
    rewriter: &PageRewriter,
) -> Result<PdfDocument> {
    if regions.is_empty() {
        return Err(Error::validation("no regions to censor"));
    }
    let mut by_page: BTreeMap<u32, Vec<CensorRegion>> = BTreeMap::new();
    for region in regions {
        doc.check_page(region.page)?;
        region.validate()?;
        by_page.entry(region.page).or_default().push(*region);
    }

    let scale = options.raster.scale;
    let Color { r, g, b } = options.color;
    let fill = Rgba([r, g, b, 255]);
    let mut replacements = BTreeMap::new();
    for (&page, boxes) in &by_page {
        let image = rasterizer.render_with(doc, page, &options.raster, |surface| {
            paint_boxes(surface, boxes, scale, fill);
            Ok(())
        })?;
        replacements.insert(page, Replacement::full_page(image));
    }
    log::debug!(
        "censoring {} regions on {} pages",
        regions.len(),
        replacements.len()
    );
    rewriter.replace(doc, &replacements)
}

fn paint_boxes(surface: &mut RgbaImage, boxes: &[CensorRegion], scale: f32, fill: Rgba<u8>) {
    let (width, height) = surface.dimensions();
    for region in boxes {
        let (x0, y0, x1, y1) = region.pixel_rect(scale, width, height);
        for y in y0..y1 {
            for x in x0..x1 {
                surface.put_pixel(x, y, fill);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_rect_is_clipped() {
        let region = CensorRegion::new(1, -5.0, 10.0, 20.0, 1000.0);
        assert_eq!(region.pixel_rect(2.0, 100, 100), (0, 20, 30, 100));
    }

    #[test]
    fn test_invalid_region() {
        assert!(CensorRegion::new(1, 0.0, 0.0, 0.0, 5.0).validate().is_err());
        assert!(CensorRegion::new(1, f32::NAN, 0.0, 1.0, 5.0)
            .validate()
            .is_err());
        assert!(CensorRegion::new(1, 0.0, 0.0, 1.0, 5.0).validate().is_ok());
    }

    #[test]
    fn test_paint_boxes() {
        let mut surface = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let boxes = [CensorRegion::new(1, 1.0, 1.0, 2.0, 2.0)];
        paint_boxes(&mut surface, &boxes, 1.0, Rgba([0, 0, 0, 255]));
        assert_eq!(surface.get_pixel(1, 1), &Rgba([0, 0, 0, 255]));
        assert_eq!(surface.get_pixel(2, 2), &Rgba([0, 0, 0, 255]));
        assert_eq!(surface.get_pixel(3, 3), &Rgba([255, 255, 255, 255]));
    }
}
