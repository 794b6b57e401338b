//! Text watermarks drawn over every page.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document as LopdfDocument, Object, ObjectId, StringFormat};
use serde::{Deserialize, Serialize};

use super::color::Color;
use crate::error::{Error, Result};
use crate::model::{Page, PdfDocument};
use crate::objects;

/// Helvetica cap height, in thousandths of the font size.
const CAP_HEIGHT: f32 = 718.0;

/// Appearance of a watermark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkOptions {
    /// Text to draw
    pub text: String,

    /// Fill colour
    pub color: Color,

    /// Opacity, from 0.0 (invisible) to 1.0 (opaque)
    pub opacity: f32,

    /// Font size in points
    pub font_size: f32,

    /// Counter-clockwise angle in degrees, relative to the page as displayed
    pub rotation: f32,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            color: Color::rgb(128, 128, 128),
            opacity: 0.3,
            font_size: 48.0,
            rotation: 45.0,
        }
    }
}

impl WatermarkOptions {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::validation("watermark text is empty"));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(Error::validation(format!(
                "opacity must be between 0 and 1, got {}",
                self.opacity
            )));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(Error::validation(format!(
                "font size must be positive, got {}",
                self.font_size
            )));
        }
        if !self.rotation.is_finite() {
            return Err(Error::validation("rotation must be a finite angle"));
        }
        Ok(())
    }
}

/// Draw `options.text` across the centre of every page.
///
/// The existing page content is wrapped in `q`/`Q` so graphics state it
/// leaves behind cannot affect the watermark.
pub fn apply_watermark(doc: &PdfDocument, options: &WatermarkOptions) -> Result<PdfDocument> {
    options.validate()?;

    let mut inner = doc.to_lopdf();
    let font_id = inner.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let gs_id = inner.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => Object::Real(options.opacity),
        "CA" => Object::Real(options.opacity),
    });
    let text = objects::win_ansi(&options.text);

    for page in doc.pages() {
        let id = page.object_id();
        let mut resources = objects::page_resources(&inner, id);
        let font_name = add_resource(&inner, &mut resources, b"Font", "WmF", font_id);
        let gs_name = add_resource(&inner, &mut resources, b"ExtGState", "WmGs", gs_id);

        let stamp = watermark_content(page, options, &text, &font_name, &gs_name)?;
        let open_id = inner.add_object(lopdf::Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let stamp_id = inner.add_object(objects::flate_stream(Dictionary::new(), &stamp)?);

        let mut contents = vec![Object::Reference(open_id)];
        contents.extend(content_refs(&inner, id));
        contents.push(Object::Reference(stamp_id));

        let dict = inner.get_dictionary_mut(id)?;
        dict.set("Resources", resources);
        dict.set("Contents", contents);
    }

    log::debug!("watermarked {} pages", doc.page_count());
    PdfDocument::from_lopdf(inner)
}

/// Insert `id` into the `category` sub-dictionary under a fresh name and return the name.
fn add_resource(
    doc: &LopdfDocument,
    resources: &mut Dictionary,
    category: &[u8],
    prefix: &str,
    id: ObjectId,
) -> String {
    let mut entries = resources
        .get(category)
        .ok()
        .and_then(|o| objects::resolve_dict(doc, o))
        .cloned()
        .unwrap_or_default();
    let name = (0..)
        .map(|n| format!("{}{}", prefix, n))
        .find(|name| !entries.has(name.as_bytes()))
        .unwrap_or_else(|| prefix.to_string());
    entries.set(name.clone(), Object::Reference(id));
    resources.set(category.to_vec(), entries);
    name
}

/// Existing content streams of a page, flattened to a list of references.
fn content_refs(doc: &LopdfDocument, page_id: ObjectId) -> Vec<Object> {
    let Ok(contents) = doc.get_dictionary(page_id).and_then(|d| d.get(b"Contents")) else {
        return Vec::new();
    };
    match contents {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Array(parts)) => parts.clone(),
            _ => vec![contents.clone()],
        },
        Object::Array(parts) => parts.clone(),
        _ => Vec::new(),
    }
}

fn watermark_content(
    page: &Page,
    options: &WatermarkOptions,
    text: &[u8],
    font_name: &str,
    gs_name: &str,
) -> Result<Vec<u8>> {
    let [x0, y0, x1, y1] = page.bounds();
    let (cx, cy) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);

    // Page rotation turns the page clockwise for display; compensate so the
    // angle holds on screen.
    let angle = (options.rotation + f32::from(page.rotation.degrees())).to_radians();
    let (sin, cos) = angle.sin_cos();

    let size = options.font_size;
    let width = text_width(text) * size / 1000.0;
    let height = CAP_HEIGHT * size / 1000.0;
    let tx = cx - (cos * width / 2.0 - sin * height / 2.0);
    let ty = cy - (sin * width / 2.0 + cos * height / 2.0);

    let [r, g, b] = options.color.components();
    let content = Content {
        operations: vec![
            Operation::new("Q", vec![]),
            Operation::new("q", vec![]),
            Operation::new("gs", vec![Object::Name(gs_name.as_bytes().to_vec())]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(font_name.as_bytes().to_vec()), size.into()],
            ),
            Operation::new(
                "Tm",
                vec![
                    cos.into(),
                    sin.into(),
                    (-sin).into(),
                    cos.into(),
                    tx.into(),
                    ty.into(),
                ],
            ),
            Operation::new(
                "Tj",
                vec![Object::String(text.to_vec(), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    };
    content
        .encode()
        .map_err(|e| Error::PdfParse(format!("cannot encode watermark: {}", e)))
}

/// Width of WinAnsi-encoded text in Helvetica, in thousandths of the font size.
fn text_width(text: &[u8]) -> f32 {
    text.iter().map(|&c| f32::from(helvetica_width(c))).sum()
}

fn helvetica_width(c: u8) -> u16 {
    const ASCII: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
        278, 278, 584, 584, 584, 556, 1015, // :..@
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722,
        667, 611, 722, 667, 944, 667, 667, 611, // A-Z
        278, 278, 278, 469, 556, 333, // [..`
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333,
        500, 278, 556, 500, 722, 500, 500, 500, // a-z
        334, 260, 334, 584, // {..~
    ];
    match c {
        0x20..=0x7E => ASCII[(c - 0x20) as usize],
        _ => 556,
    }
}
