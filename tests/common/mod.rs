//! Shared fixtures for integration tests.
//!
//! Documents are generated in code: scanned-style pages with one noisy JPEG
//! each, and text pages set in a standard font.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbaImage};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use pdfsuite::render::{HayroEngine, RenderParams};
use pdfsuite::{Page, PdfDocument, RenderEngine, Result};

/// Page size of generated documents, in points.
pub const PAGE_SIZE: (i64, i64) = (200, 260);

/// Deterministic noise, so JPEG sizes are stable between runs.
struct Lcg(u64);

impl Lcg {
    fn next_byte(&mut self) -> u8 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u8
    }
}

/// A JPEG of random pixels, which compresses badly at high quality.
pub fn noisy_jpeg(width: u32, height: u32, seed: u64, quality: u8) -> Vec<u8> {
    let mut rng = Lcg(seed);
    let pixels: Vec<u8> = (0..width * height * 3).map(|_| rng.next_byte()).collect();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode(&pixels, width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

fn finish(mut doc: Document, pages_id: ObjectId, kids: Vec<ObjectId>) -> Vec<u8> {
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_SIZE.0.into(), PAGE_SIZE.1.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// A document of `pages` scanned pages. Each page paints a distinct noisy
/// image at twice the page resolution; the MediaBox is inherited from the
/// page tree root.
pub fn scanned_pdf(pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let (w, h) = PAGE_SIZE;

    let kids = (1..=pages)
        .map(|n| {
            let jpeg = noisy_jpeg(w as u32 * 2, h as u32 * 2, u64::from(n), 95);
            let image_id = doc.add_object(
                Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => w * 2,
                        "Height" => h * 2,
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => 8,
                        "Filter" => "DCTDecode",
                    },
                    jpeg,
                )
                .with_compression(false),
            );
            let content = format!("q {} 0 0 {} 0 0 cm /Im0 Do Q", w, h);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im0" => image_id },
                },
            })
        })
        .collect();

    finish(doc, pages_id, kids)
}

/// JPEG painted by [`nested_pdf`] pages, by seed.
pub fn nested_image(seed: u64) -> Vec<u8> {
    noisy_jpeg(40, 52, seed, 80)
}

fn image_xobject(doc: &mut Document, seed: u64) -> ObjectId {
    doc.add_object(
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 40,
                "Height" => 52,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            nested_image(seed),
        )
        .with_compression(false),
    )
}

/// A three-page document with a two-level page tree. Pages carry no
/// attributes of their own beyond page 2's `/Rotate 180`:
///
/// - root: MediaBox `PAGE_SIZE`, Rotate 90
///   - left: Resources painting `nested_image(11)`; pages 1 and 2
///   - right: MediaBox 300x400, Rotate 0, Resources painting `nested_image(22)`; page 3
pub fn nested_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let root_id = doc.new_object_id();
    let left_id = doc.new_object_id();
    let right_id = doc.new_object_id();
    let left_image = image_xobject(&mut doc, 11);
    let right_image = image_xobject(&mut doc, 22);
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        b"q 200 260 0 0 cm /Im0 Do Q".to_vec(),
    ));

    let page = |doc: &mut Document, parent: ObjectId, rotate: Option<i64>| {
        let mut dict = dictionary! {
            "Type" => "Page",
            "Parent" => parent,
            "Contents" => content_id,
        };
        if let Some(rotate) = rotate {
            dict.set("Rotate", rotate);
        }
        doc.add_object(dict)
    };
    let p1 = page(&mut doc, left_id, None);
    let p2 = page(&mut doc, left_id, Some(180));
    let p3 = page(&mut doc, right_id, None);

    doc.objects.insert(
        left_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Parent" => root_id,
            "Kids" => vec![p1.into(), p2.into()],
            "Count" => 2,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => left_image },
            },
        }),
    );
    doc.objects.insert(
        right_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Parent" => root_id,
            "Kids" => vec![p3.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 300.into(), 400.into()],
            "Rotate" => 0,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => right_image },
            },
        }),
    );
    doc.objects.insert(
        root_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![left_id.into(), right_id.into()],
            "Count" => 3,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_SIZE.0.into(), PAGE_SIZE.1.into()],
            "Rotate" => 90,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => root_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// A document whose pages draw a line of Helvetica text.
pub fn text_pdf(pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let kids = (1..=pages)
        .map(|n| {
            let content = format!("BT /F1 24 Tf 20 200 Td (Page {}) Tj ET", n);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            })
        })
        .collect();

    finish(doc, pages_id, kids)
}

pub fn open(bytes: Vec<u8>) -> PdfDocument {
    PdfDocument::from_bytes(bytes).unwrap()
}

/// Raw bytes of the image each page paints, in page order.
pub fn page_images(doc: &PdfDocument) -> Vec<Vec<u8>> {
    let pdf = doc.lopdf();
    pdf.get_pages()
        .values()
        .map(|&id| {
            let page = pdf.get_dictionary(id).unwrap();
            let resources = match page.get(b"Resources").unwrap() {
                Object::Reference(r) => pdf.get_dictionary(*r).unwrap(),
                Object::Dictionary(d) => d,
                other => panic!("unexpected resources {:?}", other),
            };
            let xobjects = match resources.get(b"XObject").unwrap() {
                Object::Reference(r) => pdf.get_dictionary(*r).unwrap(),
                Object::Dictionary(d) => d,
                other => panic!("unexpected xobjects {:?}", other),
            };
            let image_id = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
            pdf.get_object(image_id)
                .unwrap()
                .as_stream()
                .unwrap()
                .content
                .clone()
        })
        .collect()
}

/// Default engine that fails on the given pages.
pub struct ScriptedEngine {
    inner: HayroEngine,
    failing: HashSet<u32>,
}

impl ScriptedEngine {
    pub fn failing_on(pages: impl IntoIterator<Item = u32>) -> Arc<Self> {
        Arc::new(Self {
            inner: HayroEngine::new(),
            failing: pages.into_iter().collect(),
        })
    }
}

impl RenderEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn render_page(
        &self,
        doc: &PdfDocument,
        page: &Page,
        surface: &mut RgbaImage,
        params: &RenderParams,
    ) -> Result<()> {
        if self.failing.contains(&page.number) {
            return Err(pdfsuite::Error::Render(format!(
                "scripted failure on page {}",
                page.number
            )));
        }
        self.inner.render_page(doc, page, surface, params)
    }
}
