//! Helpers over the lopdf object graph shared by the transform modules.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::model::Rotation;

/// Used when neither the page nor its ancestors declare a MediaBox.
pub(crate) const DEFAULT_PAGE_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Page tree attributes a page may inherit from its ancestors.
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

const MAX_DEPTH: usize = 32;

/// Extract a number from an integer or real object.
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Follow indirect references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a LopdfDocument, mut obj: &'a Object) -> Option<&'a Object> {
    for _ in 0..MAX_DEPTH {
        match obj {
            Object::Reference(id) => obj = doc.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    None
}

/// Resolve `obj` as a dictionary (direct or referenced).
pub(crate) fn resolve_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Look up `key` on a page, walking up the Pages tree for inheritable keys.
pub(crate) fn inherited<'a>(
    doc: &'a LopdfDocument,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut dict = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_DEPTH {
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
        dict = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Parse a rectangle array, normalizing corner order.
pub(crate) fn rect(doc: &LopdfDocument, obj: &Object) -> Option<[f32; 4]> {
    let arr = match resolve(doc, obj)? {
        Object::Array(arr) => arr,
        _ => return None,
    };
    if arr.len() != 4 {
        return None;
    }
    let values: Vec<f32> = arr
        .iter()
        .filter_map(|o| resolve(doc, o).and_then(number))
        .collect();
    if values.len() != 4 {
        return None;
    }
    Some([
        values[0].min(values[2]),
        values[1].min(values[3]),
        values[0].max(values[2]),
        values[1].max(values[3]),
    ])
}

/// The visible page box: CropBox if present, else MediaBox, else Letter.
pub(crate) fn page_box(doc: &LopdfDocument, page_id: ObjectId) -> [f32; 4] {
    let media = inherited(doc, page_id, b"MediaBox")
        .and_then(|o| rect(doc, o))
        .unwrap_or(DEFAULT_PAGE_BOX);
    let visible = inherited(doc, page_id, b"CropBox")
        .and_then(|o| rect(doc, o))
        .unwrap_or(media);
    if visible[2] - visible[0] <= 0.0 || visible[3] - visible[1] <= 0.0 {
        return DEFAULT_PAGE_BOX;
    }
    visible
}

/// The page's `/Rotate` attribute, normalized to a quarter turn.
pub(crate) fn page_rotation(doc: &LopdfDocument, page_id: ObjectId) -> Rotation {
    inherited(doc, page_id, b"Rotate")
        .and_then(|o| resolve(doc, o))
        .and_then(number)
        .map(|deg| Rotation::from_degrees_f64(deg as f64))
        .unwrap_or_default()
}

/// Effective resource dictionary of a page, with references resolved one level.
pub(crate) fn page_resources(doc: &LopdfDocument, page_id: ObjectId) -> Dictionary {
    inherited(doc, page_id, b"Resources")
        .and_then(|o| resolve_dict(doc, o))
        .cloned()
        .unwrap_or_default()
}

/// Build a FlateDecode stream from raw content bytes.
pub(crate) fn flate_stream(mut dict: Dictionary, content: &[u8]) -> Result<Stream> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content)?;
    let compressed = encoder.finish()?;
    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    Ok(Stream::new(dict, compressed))
}

/// Serialize a document into a fresh byte buffer.
pub(crate) fn save_to_vec(doc: &mut LopdfDocument) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| Error::PdfParse(format!("failed to write document: {}", e)))?;
    Ok(out)
}

/// Object id of the root `Pages` node.
pub(crate) fn pages_root(doc: &LopdfDocument) -> Result<ObjectId> {
    let catalog = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| Error::MissingObject("trailer /Root".into()))?;
    doc.get_dictionary(catalog)
        .and_then(|c| c.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|_| Error::MissingObject("catalog /Pages".into()))
}

/// Copy inheritable attributes from ancestors onto the page dictionary itself.
///
/// Must run before a page is detached from (or re-parented within) the tree.
pub(crate) fn materialize_inherited(doc: &mut LopdfDocument, page_id: ObjectId) -> Result<()> {
    let mut found = Vec::new();
    for key in INHERITABLE_KEYS {
        let own = doc.get_dictionary(page_id)?.has(key);
        if !own {
            if let Some(value) = inherited(doc, page_id, key) {
                found.push((key.to_vec(), value.clone()));
            }
        }
    }
    let page = doc.get_dictionary_mut(page_id)?;
    for (key, value) in found {
        page.set(key, value);
    }
    Ok(())
}

/// Encode a text string as a PDF WinAnsi byte string; unmappable characters become `?`.
pub(crate) fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            0x20AC => 0x80,
            0x2018 => 0x91,
            0x2019 => 0x92,
            0x201C => 0x93,
            0x201D => 0x94,
            0x2013 => 0x96,
            0x2014 => 0x97,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn tree_doc() -> (LopdfDocument, ObjectId) {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 300.into(), 400.into()],
                "Rotate" => 90,
            }),
        );
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog);
        (doc, page_id)
    }

    #[test]
    fn test_number() {
        assert_eq!(number(&Object::Integer(42)), Some(42.0));
        assert_eq!(number(&Object::Real(1.5)), Some(1.5));
        assert_eq!(number(&Object::Null), None);
    }

    #[test]
    fn test_inherited_attributes() {
        let (doc, page_id) = tree_doc();
        assert_eq!(page_box(&doc, page_id), [0.0, 0.0, 300.0, 400.0]);
        assert_eq!(page_rotation(&doc, page_id), Rotation::Deg90);
    }

    #[test]
    fn test_materialize_inherited() {
        let (mut doc, page_id) = tree_doc();
        materialize_inherited(&mut doc, page_id).unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Rotate"));
        assert!(!page.has(b"CropBox"));
    }

    #[test]
    fn test_rect_normalizes_corners() {
        let doc = LopdfDocument::with_version("1.5");
        let obj = Object::Array(vec![100.into(), 200.into(), 0.into(), 0.into()]);
        assert_eq!(rect(&doc, &obj), Some([0.0, 0.0, 100.0, 200.0]));
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(win_ansi("Draft é"), b"Draft \xe9".to_vec());
        assert_eq!(win_ansi("日本"), b"??".to_vec());
    }
}
