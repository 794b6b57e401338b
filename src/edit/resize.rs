//! Resizing documents to standard paper formats.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::rewriter::{PageRewriter, Replacement};
use crate::error::{Error, Result};
use crate::model::PdfDocument;
use crate::render::{RasterOptions, Rasterizer, RenderIntent};

/// Standard paper formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageFormat {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl PageFormat {
    pub const ALL: [PageFormat; 5] = [
        PageFormat::A3,
        PageFormat::A4,
        PageFormat::A5,
        PageFormat::Letter,
        PageFormat::Legal,
    ];

    /// Portrait size in points.
    pub fn size(self) -> (f32, f32) {
        match self {
            PageFormat::A3 => (841.89, 1190.55),
            PageFormat::A4 => (595.28, 841.89),
            PageFormat::A5 => (419.53, 595.28),
            PageFormat::Letter => (612.0, 792.0),
            PageFormat::Legal => (612.0, 1008.0),
        }
    }

    /// Size in points matching the orientation of a `width` x `height` page.
    pub fn oriented_size(self, width: f32, height: f32) -> (f32, f32) {
        let (w, h) = self.size();
        if width > height {
            (h, w)
        } else {
            (w, h)
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PageFormat::A3 => "A3",
            PageFormat::A4 => "A4",
            PageFormat::A5 => "A5",
            PageFormat::Letter => "LETTER",
            PageFormat::Legal => "LEGAL",
        }
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PageFormat::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation(format!("unknown page format: {}", s)))
    }
}

/// Rasterize every page and place it, fitted and centred, on a page of `format`.
///
/// Each output page keeps the orientation of its source page.
pub fn resize(
    doc: &PdfDocument,
    format: PageFormat,
    rasterizer: &mut Rasterizer,
    options: &RasterOptions,
    rewriter: &PageRewriter,
) -> Result<PdfDocument> {
    let options = options.clone().with_intent(RenderIntent::Print);
    let mut replacements = BTreeMap::new();
    for page in doc.pages() {
        let image = rasterizer.rasterize(doc, page.number, &options)?;
        let (w, h) = page.display_size();
        let (target_w, target_h) = format.oriented_size(w, h);
        replacements.insert(page.number, Replacement::fitted(image, target_w, target_h));
    }
    log::debug!("resizing {} pages to {}", replacements.len(), format);
    rewriter.replace(doc, &replacements)
}
