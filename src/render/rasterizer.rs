//! Single-page rasterization to JPEG.

use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, Rgba, RgbaImage};

use super::engine::{RenderEngine, RenderParams};
use super::options::RasterOptions;
use crate::error::{Error, Result};
use crate::model::{PdfDocument, RasterImage};

/// Largest surface the rasterizer will allocate (about 400 MB of RGBA).
const MAX_SURFACE_PIXELS: u64 = 100_000_000;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Renders one page at a time onto a reusable surface.
///
/// The surface is resized and cleared to opaque white before every page, so
/// nothing from a previous page can leak into the next. Methods take
/// `&mut self`; a rasterizer cannot be shared between concurrent renders.
pub struct Rasterizer {
    engine: Arc<dyn RenderEngine>,
    surface: RgbaImage,
}

impl Rasterizer {
    /// Create a rasterizer drawing with `engine`.
    pub fn new(engine: Arc<dyn RenderEngine>) -> Self {
        Self {
            engine,
            surface: RgbaImage::new(0, 0),
        }
    }

    /// The engine used to draw pages.
    pub fn engine(&self) -> &Arc<dyn RenderEngine> {
        &self.engine
    }

    /// Pixel size of `page` at `scale`, after rotation.
    pub fn output_size(doc: &PdfDocument, page: u32, scale: f32) -> Result<(u32, u32)> {
        let page = doc.page(page)?;
        let (w, h) = page.display_size();
        Ok((
            ((w * scale).ceil() as u32).max(1),
            ((h * scale).ceil() as u32).max(1),
        ))
    }

    /// Rasterize a page to a JPEG image.
    pub fn rasterize(
        &mut self,
        doc: &PdfDocument,
        page: u32,
        options: &RasterOptions,
    ) -> Result<RasterImage> {
        self.render_with(doc, page, options, |_| Ok(()))
    }

    /// Rasterize a page, letting `paint` draw over the rendered surface before encoding.
    pub fn render_with<F>(
        &mut self,
        doc: &PdfDocument,
        page: u32,
        options: &RasterOptions,
        paint: F,
    ) -> Result<RasterImage>
    where
        F: FnOnce(&mut RgbaImage) -> Result<()>,
    {
        options.validate()?;
        let (width, height) = Self::output_size(doc, page, options.scale)?;
        if u64::from(width) * u64::from(height) > MAX_SURFACE_PIXELS {
            return Err(Error::validation(format!(
                "page {} at scale {} would be {}x{} pixels",
                page, options.scale, width, height
            )));
        }

        self.prepare_surface(width, height);
        let params = RenderParams {
            scale: options.scale,
            intent: options.intent,
        };
        let target = doc.page(page)?;
        self.engine
            .render_page(doc, target, &mut self.surface, &params)
            .map_err(|e| match e {
                Error::Render(_) | Error::Encrypted => e,
                other => Error::render(format!("page {}: {}", page, other)),
            })?;
        paint(&mut self.surface)?;

        let data = encode_jpeg(&self.surface, options.quality)?;
        log::debug!(
            "rasterized page {} with {} at {}x{} (q{}, {} bytes)",
            page,
            self.engine.name(),
            width,
            height,
            options.quality,
            data.len()
        );
        Ok(RasterImage::new(width, height, data, options.quality))
    }

    fn prepare_surface(&mut self, width: u32, height: u32) {
        if self.surface.dimensions() != (width, height) {
            self.surface = RgbaImage::from_pixel(width, height, WHITE);
        } else {
            for pixel in self.surface.pixels_mut() {
                *pixel = WHITE;
            }
        }
    }
}

/// Encode an RGBA surface as a baseline RGB JPEG.
fn encode_jpeg(surface: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let rgb: Vec<u8> = surface
        .pixels()
        .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
        .collect();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality).encode(
        &rgb,
        surface.width(),
        surface.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}
