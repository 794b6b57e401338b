//! MuPDF-backed rendering engine.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use mupdf::{Colorspace, Document, Matrix};

use super::engine::{pixel_size, RenderEngine, RenderParams};
use crate::error::{Error, Result};
use crate::model::{Page, PdfDocument};
use crate::objects;

/// Full-fidelity engine: text, vector graphics, shadings and every image filter.
#[derive(Debug, Clone, Default)]
pub struct MupdfEngine;

impl MupdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl RenderEngine for MupdfEngine {
    fn name(&self) -> &str {
        "mupdf"
    }

    fn render_page(
        &self,
        doc: &PdfDocument,
        page: &Page,
        surface: &mut RgbaImage,
        params: &RenderParams,
    ) -> Result<()> {
        // MuPDF parses its own copy; hand it plaintext so it never needs the password.
        let bytes = if doc.was_encrypted() {
            objects::save_to_vec(&mut doc.to_lopdf())?
        } else {
            doc.bytes().to_vec()
        };

        let document = Document::from_bytes(&bytes, "application/pdf")
            .map_err(|e| Error::render(format!("MuPDF could not open the document: {}", e)))?;
        if document.needs_password().unwrap_or(false) {
            return Err(Error::Encrypted);
        }
        let mupdf_page = document
            .load_page(page.number as i32 - 1)
            .map_err(|e| Error::render(format!("MuPDF could not load page {}: {}", page.number, e)))?;

        let matrix = Matrix::new_scale(params.scale, params.scale);
        let pixmap = mupdf_page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), false, true)
            .map_err(|e| Error::render(format!("MuPDF failed on page {}: {}", page.number, e)))?;

        let (width, height) = pixel_size(pixmap.width(), pixmap.height())?;
        let n = pixmap.n() as usize;
        let stride = pixmap.stride() as usize;
        let samples = pixmap.samples();

        let mut rendered = RgbaImage::new(width, height);
        for (x, y, pixel) in rendered.enumerate_pixels_mut() {
            let offset = y as usize * stride + x as usize * n;
            let rgb = samples.get(offset..offset + 3).unwrap_or(&[255, 255, 255]);
            *pixel = Rgba([rgb[0], rgb[1], rgb[2], 255]);
        }

        // MuPDF rounds the page box its own way; match the surface exactly.
        if rendered.dimensions() != surface.dimensions() {
            rendered = imageops::resize(
                &rendered,
                surface.width(),
                surface.height(),
                FilterType::Triangle,
            );
        }
        imageops::replace(surface, &rendered, 0, 0);
        Ok(())
    }
}
