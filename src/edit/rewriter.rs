//! Page-level document rewriting: rotation, reordering and raster replacement.

use std::collections::BTreeMap;

use lopdf::{dictionary, Document as LopdfDocument, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{PdfDocument, RasterImage, Rotation};
use crate::objects;

/// Image that takes the place of a page's content.
#[derive(Debug, Clone)]
pub struct Replacement {
    /// The new page content
    pub image: RasterImage,

    /// New page size in points; `None` keeps the page's displayed size and
    /// stretches the image over it.
    pub page_size: Option<(f32, f32)>,
}

impl Replacement {
    /// Replace the page with `image` at the page's current displayed size.
    pub fn full_page(image: RasterImage) -> Self {
        Self {
            image,
            page_size: None,
        }
    }

    /// Replace the page with a page of `width` x `height` points, the image fitted and centred.
    pub fn fitted(image: RasterImage, width: f32, height: f32) -> Self {
        Self {
            image,
            page_size: Some((width, height)),
        }
    }
}

/// Rotation and ordering edits applied together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewritePlan {
    /// Rotation added to each listed page (1-indexed)
    pub rotations: BTreeMap<u32, Rotation>,

    /// New page order; `order[i]` is the source page shown at position `i + 1`
    pub order: Option<Vec<u32>>,
}

impl RewritePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rotation for a page.
    pub fn with_rotation(mut self, page: u32, rotation: Rotation) -> Self {
        self.rotations.insert(page, rotation);
        self
    }

    /// Set the page order.
    pub fn with_order(mut self, order: Vec<u32>) -> Self {
        self.order = Some(order);
        self
    }

    /// Whether applying the plan would change nothing.
    pub fn is_empty(&self) -> bool {
        self.rotations.values().all(|r| *r == Rotation::Deg0)
            && self
                .order
                .as_ref()
                .map_or(true, |order| is_identity(order))
    }
}

/// Check that `order` is a bijection over `1..=total`.
pub fn validate_permutation(order: &[u32], total: u32) -> Result<()> {
    if order.len() != total as usize {
        return Err(Error::InvalidPermutation(format!(
            "expected {} pages, got {}",
            total,
            order.len()
        )));
    }
    let mut seen = vec![false; total as usize];
    for &page in order {
        if page == 0 || page > total {
            return Err(Error::PageOutOfRange(page, total));
        }
        let slot = &mut seen[(page - 1) as usize];
        if *slot {
            return Err(Error::InvalidPermutation(format!(
                "page {} appears more than once",
                page
            )));
        }
        *slot = true;
    }
    Ok(())
}

fn is_identity(order: &[u32]) -> bool {
    order.iter().enumerate().all(|(i, &p)| p as usize == i + 1)
}

/// Produces new documents from page-level edits. Inputs are never modified.
///
/// Every operation validates all page references before producing output,
/// so a bad index never yields a partially edited document.
#[derive(Debug, Clone)]
pub struct PageRewriter {
    compress_streams: bool,
}

impl Default for PageRewriter {
    fn default() -> Self {
        Self {
            compress_streams: true,
        }
    }
}

impl PageRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flate-compress unfiltered streams when writing (on by default).
    pub fn with_stream_compression(mut self, compress: bool) -> Self {
        self.compress_streams = compress;
        self
    }

    /// Add rotations to pages by updating `/Rotate`. Page content is untouched.
    pub fn rotate(
        &self,
        doc: &PdfDocument,
        rotations: &BTreeMap<u32, Rotation>,
    ) -> Result<PdfDocument> {
        check_pages(doc, rotations.keys().copied())?;
        let mut inner = doc.to_lopdf();
        rotate_pages(&mut inner, doc, rotations)?;
        self.finish(inner, false)
    }

    /// Copy pages into a new flat page tree in `order`.
    pub fn reorder(&self, doc: &PdfDocument, order: &[u32]) -> Result<PdfDocument> {
        validate_permutation(order, doc.page_count())?;
        let mut inner = doc.to_lopdf();
        reorder_pages(&mut inner, doc, order)?;
        self.finish(inner, true)
    }

    /// Replace the content of pages with images.
    ///
    /// This is lossy: text on replaced pages is no longer selectable.
    pub fn replace(
        &self,
        doc: &PdfDocument,
        replacements: &BTreeMap<u32, Replacement>,
    ) -> Result<PdfDocument> {
        check_pages(doc, replacements.keys().copied())?;
        for (page, replacement) in replacements {
            if replacement.image.is_empty() {
                return Err(Error::validation(format!("empty image for page {}", page)));
            }
            if let Some((w, h)) = replacement.page_size {
                if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
                    return Err(Error::validation(format!(
                        "invalid page size {}x{} for page {}",
                        w, h, page
                    )));
                }
            }
        }

        let mut inner = doc.to_lopdf();
        for (&number, replacement) in replacements {
            let page = doc.page(number)?;
            replace_page(&mut inner, page, replacement)?;
        }
        log::debug!("replaced {} of {} pages", replacements.len(), doc.page_count());
        self.finish(inner, true)
    }

    /// Apply rotations, then reordering, in one pass.
    pub fn apply(&self, doc: &PdfDocument, plan: &RewritePlan) -> Result<PdfDocument> {
        check_pages(doc, plan.rotations.keys().copied())?;
        if let Some(order) = &plan.order {
            validate_permutation(order, doc.page_count())?;
        }

        let mut inner = doc.to_lopdf();
        rotate_pages(&mut inner, doc, &plan.rotations)?;
        let reordered = match &plan.order {
            Some(order) if !is_identity(order) => {
                reorder_pages(&mut inner, doc, order)?;
                true
            }
            _ => false,
        };
        self.finish(inner, reordered)
    }

    fn finish(&self, mut inner: LopdfDocument, prune: bool) -> Result<PdfDocument> {
        if prune {
            inner.prune_objects();
        }
        if self.compress_streams {
            inner.compress();
        }
        PdfDocument::from_lopdf(inner)
    }
}

fn check_pages(doc: &PdfDocument, pages: impl IntoIterator<Item = u32>) -> Result<()> {
    for page in pages {
        doc.check_page(page)?;
    }
    Ok(())
}

fn rotate_pages(
    inner: &mut LopdfDocument,
    doc: &PdfDocument,
    rotations: &BTreeMap<u32, Rotation>,
) -> Result<()> {
    for (&number, &rotation) in rotations {
        let page = doc.page(number)?;
        let updated = page.rotation.add(rotation);
        let dict = inner.get_dictionary_mut(page.object_id())?;
        dict.set("Rotate", i64::from(updated.degrees()));
    }
    Ok(())
}

fn reorder_pages(inner: &mut LopdfDocument, doc: &PdfDocument, order: &[u32]) -> Result<()> {
    let root = objects::pages_root(inner)?;
    let ids: Vec<ObjectId> = doc.pages().iter().map(|p| p.object_id()).collect();

    for &id in &ids {
        objects::materialize_inherited(inner, id)?;
    }

    let kids: Vec<Object> = order
        .iter()
        .map(|&n| Object::Reference(ids[(n - 1) as usize]))
        .collect();
    for &id in &ids {
        inner.get_dictionary_mut(id)?.set("Parent", root);
    }

    let pages = inner.get_dictionary_mut(root)?;
    pages.set("Kids", kids);
    pages.set("Count", order.len() as i64);
    for key in objects::INHERITABLE_KEYS {
        pages.remove(key);
    }
    Ok(())
}

fn replace_page(
    inner: &mut LopdfDocument,
    page: &crate::model::Page,
    replacement: &Replacement,
) -> Result<()> {
    let image = &replacement.image;
    let (page_w, page_h) = replacement.page_size.unwrap_or_else(|| page.display_size());

    // Fit the image into the page, preserving its aspect ratio.
    let (draw_w, draw_h) = match replacement.page_size {
        None => (page_w, page_h),
        Some(_) => {
            let aspect = image.aspect_ratio();
            if page_w / page_h > aspect {
                (page_h * aspect, page_h)
            } else {
                (page_w, page_w / aspect)
            }
        }
    };
    let (x, y) = ((page_w - draw_w) / 2.0, (page_h - draw_h) / 2.0);

    let image_id = inner.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width),
            "Height" => i64::from(image.height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        image.data.clone(),
    ));

    let content = format!(
        "q\n{:.4} 0 0 {:.4} {:.4} {:.4} cm\n/Im0 Do\nQ\n",
        draw_w, draw_h, x, y
    );
    let content_id = inner.add_object(objects::flate_stream(
        lopdf::Dictionary::new(),
        content.as_bytes(),
    )?);

    let geometry_kept = replacement.page_size.is_none()
        && page.rotation == Rotation::Deg0
        && page.bounds()[0] == 0.0
        && page.bounds()[1] == 0.0;

    let dict = inner.get_dictionary_mut(page.object_id())?;
    dict.set(
        "MediaBox",
        vec![0.into(), 0.into(), Object::Real(page_w), Object::Real(page_h)],
    );
    dict.remove(b"CropBox");
    dict.remove(b"BleedBox");
    dict.remove(b"TrimBox");
    dict.remove(b"ArtBox");
    dict.set("Rotate", 0);
    dict.set(
        "Resources",
        dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    );
    dict.set("Contents", content_id);
    dict.remove(b"Thumb");
    if !geometry_kept {
        // Annotation rectangles refer to the old coordinate space.
        dict.remove(b"Annots");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_permutation() {
        assert!(validate_permutation(&[3, 1, 2], 3).is_ok());
        assert!(matches!(
            validate_permutation(&[1, 1, 2], 3),
            Err(Error::InvalidPermutation(_))
        ));
        assert!(matches!(
            validate_permutation(&[1, 2, 4], 3),
            Err(Error::PageOutOfRange(4, 3))
        ));
        assert!(matches!(
            validate_permutation(&[0, 1, 2], 3),
            Err(Error::PageOutOfRange(0, 3))
        ));
        assert!(matches!(
            validate_permutation(&[1, 2], 3),
            Err(Error::InvalidPermutation(_))
        ));
        assert!(validate_permutation(&[], 0).is_ok());
    }

    #[test]
    fn test_plan_is_empty() {
        assert!(RewritePlan::new().is_empty());
        assert!(RewritePlan::new().with_order(vec![1, 2, 3]).is_empty());
        assert!(RewritePlan::new()
            .with_rotation(1, Rotation::Deg0)
            .is_empty());
        assert!(!RewritePlan::new().with_order(vec![2, 1]).is_empty());
        assert!(!RewritePlan::new()
            .with_rotation(2, Rotation::Deg90)
            .is_empty());
    }
}
