//! hayro-backed rendering engine.
//!
//! hayro is a pure-Rust PDF interpreter and rasterizer: text (including the
//! standard 14 fonts), vector paths, shadings and the common image filters.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use hayro::{render, InterpreterSettings, Pdf, RenderSettings};
use image::imageops::{self, FilterType};
use image::ImageFormat;
use image::RgbaImage;

use super::engine::{RenderEngine, RenderParams};
use crate::error::{Error, Result};
use crate::model::{Page, PdfDocument};
use crate::objects;

/// Default engine. Needs no system libraries.
#[derive(Debug, Clone, Default)]
pub struct HayroEngine;

impl HayroEngine {
    pub fn new() -> Self {
        Self
    }

    fn draw(&self, data: Vec<u8>, index: usize, scale: f32) -> Result<RgbaImage> {
        let pdf = Pdf::new(Arc::new(data))
            .map_err(|e| Error::render(format!("hayro could not open the document: {:?}", e)))?;
        let page = pdf
            .pages()
            .get(index)
            .ok_or_else(|| Error::render(format!("hayro found no page {}", index + 1)))?;

        let render_settings = RenderSettings {
            x_scale: scale,
            y_scale: scale,
            ..Default::default()
        };
        let png = render(page, &InterpreterSettings::default(), &render_settings).take_png();
        Ok(image::load_from_memory_with_format(&png, ImageFormat::Png)?.to_rgba8())
    }
}

impl RenderEngine for HayroEngine {
    fn name(&self) -> &str {
        "hayro"
    }

    fn render_page(
        &self,
        doc: &PdfDocument,
        page: &Page,
        surface: &mut RgbaImage,
        params: &RenderParams,
    ) -> Result<()> {
        // hayro parses its own copy; hand it plaintext so it never needs the password.
        let data = if doc.was_encrypted() {
            objects::save_to_vec(&mut doc.to_lopdf())?
        } else {
            doc.bytes().to_vec()
        };
        let index = page.number as usize - 1;

        // A malformed content stream must fail this page, not the whole batch.
        let mut rendered = panic::catch_unwind(AssertUnwindSafe(|| {
            self.draw(data, index, params.scale)
        }))
        .map_err(|_| Error::render(format!("hayro panicked on page {}", page.number)))??;

        // hayro rounds the page box its own way; match the surface exactly.
        if rendered.dimensions() != surface.dimensions() {
            rendered = imageops::resize(
                &rendered,
                surface.width(),
                surface.height(),
                FilterType::Triangle,
            );
        }
        // The surface is already white; transparent page areas stay white.
        imageops::overlay(surface, &rendered, 0, 0);
        Ok(())
    }
}
