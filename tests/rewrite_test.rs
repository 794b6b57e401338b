//! Integration tests for page rewriting and the edit store.

mod common;

use std::collections::BTreeMap;

use common::{nested_image, nested_pdf, open, page_images, scanned_pdf, PAGE_SIZE};
use lopdf::Object;
use pdfsuite::{
    CensorOptions, CensorRegion, Error, PageFormat, PageRewriter, PageTransformStore,
    RewritePlan, Rotation, Toolkit,
};

fn inverse(order: &[u32]) -> Vec<u32> {
    let mut inv = vec![0; order.len()];
    for (i, &page) in order.iter().enumerate() {
        inv[(page - 1) as usize] = i as u32 + 1;
    }
    inv
}

#[test]
fn test_reorder_then_inverse_restores_pages() {
    let doc = open(scanned_pdf(5));
    let original = page_images(&doc);
    let rewriter = PageRewriter::new();

    let order = vec![3, 5, 1, 4, 2];
    let shuffled = rewriter.reorder(&doc, &order).unwrap();
    let shuffled_images = page_images(&shuffled);
    for (i, &page) in order.iter().enumerate() {
        assert_eq!(shuffled_images[i], original[(page - 1) as usize]);
    }

    let restored = rewriter.reorder(&shuffled, &inverse(&order)).unwrap();
    assert_eq!(page_images(&restored), original);
    assert_eq!(restored.page_count(), 5);
}

#[test]
fn test_reorder_keeps_inherited_page_size() {
    let doc = open(scanned_pdf(3));
    let reordered = PageRewriter::new().reorder(&doc, &[2, 3, 1]).unwrap();
    for page in reordered.pages() {
        assert_eq!(page.width, PAGE_SIZE.0 as f32);
        assert_eq!(page.height, PAGE_SIZE.1 as f32);
    }
}

#[test]
fn test_reorder_flattens_nested_page_tree() {
    let doc = open(nested_pdf());
    let geometry = |doc: &pdfsuite::PdfDocument| -> Vec<(f32, f32, Rotation)> {
        doc.pages()
            .iter()
            .map(|p| (p.width, p.height, p.rotation))
            .collect()
    };
    assert_eq!(
        geometry(&doc),
        [
            (200.0, 260.0, Rotation::Deg90),
            (200.0, 260.0, Rotation::Deg180),
            (300.0, 400.0, Rotation::Deg0),
        ]
    );

    let reordered = PageRewriter::new().reorder(&doc, &[3, 1, 2]).unwrap();
    assert_eq!(
        geometry(&reordered),
        [
            (300.0, 400.0, Rotation::Deg0),
            (200.0, 260.0, Rotation::Deg90),
            (200.0, 260.0, Rotation::Deg180),
        ]
    );
    assert_eq!(
        page_images(&reordered),
        [nested_image(22), nested_image(11), nested_image(11)]
    );

    // Every page hangs directly off the root, which no longer carries page attributes.
    let pdf = reordered.lopdf();
    let catalog = pdf.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let root_id = pdf
        .get_dictionary(catalog)
        .unwrap()
        .get(b"Pages")
        .unwrap()
        .as_reference()
        .unwrap();
    let root = pdf.get_dictionary(root_id).unwrap();
    let kids = root.get(b"Kids").unwrap().as_array().unwrap();
    assert_eq!(kids.len(), 3);
    assert!(!root.has(b"MediaBox"));
    assert!(!root.has(b"Rotate"));
    assert!(!root.has(b"Resources"));
    for kid in kids {
        let page = pdf.get_dictionary(kid.as_reference().unwrap()).unwrap();
        assert_eq!(page.get(b"Parent").unwrap(), &Object::Reference(root_id));
    }
}

#[test]
fn test_reorder_leaves_source_untouched() {
    let doc = open(scanned_pdf(3));
    let before = doc.bytes().to_vec();
    PageRewriter::new().reorder(&doc, &[3, 2, 1]).unwrap();
    assert_eq!(doc.bytes(), &before[..]);
}

#[test]
fn test_reorder_rejects_non_permutations() {
    let doc = open(scanned_pdf(3));
    let rewriter = PageRewriter::new();
    assert!(matches!(
        rewriter.reorder(&doc, &[1, 1, 2]),
        Err(Error::InvalidPermutation(_))
    ));
    assert!(matches!(
        rewriter.reorder(&doc, &[1, 2, 4]),
        Err(Error::PageOutOfRange(4, 3))
    ));
    assert!(rewriter.reorder(&doc, &[1, 2]).is_err());
}

#[test]
fn test_rotation_is_metadata_only() {
    let doc = open(scanned_pdf(2));
    let rotations = BTreeMap::from([(2, Rotation::Deg90)]);
    let rotated = PageRewriter::new().rotate(&doc, &rotations).unwrap();

    assert_eq!(rotated.pages()[0].rotation, Rotation::Deg0);
    assert_eq!(rotated.pages()[1].rotation, Rotation::Deg90);
    assert_eq!(page_images(&rotated), page_images(&doc));

    // Rotations accumulate on top of the existing /Rotate.
    let twice = PageRewriter::new()
        .rotate(&rotated, &BTreeMap::from([(2, Rotation::Deg270)]))
        .unwrap();
    assert_eq!(twice.pages()[1].rotation, Rotation::Deg0);
}

#[test]
fn test_rotate_out_of_range() {
    let doc = open(scanned_pdf(2));
    let result = PageRewriter::new().rotate(&doc, &BTreeMap::from([(3, Rotation::Deg90)]));
    assert!(matches!(result, Err(Error::PageOutOfRange(3, 2))));
}

#[test]
fn test_apply_plan_rotates_then_reorders() {
    let doc = open(scanned_pdf(3));
    let plan = RewritePlan::new()
        .with_rotation(1, Rotation::Deg180)
        .with_order(vec![3, 1, 2]);
    let result = PageRewriter::new().apply(&doc, &plan).unwrap();

    let rotations: Vec<_> = result.pages().iter().map(|p| p.rotation).collect();
    assert_eq!(
        rotations,
        [Rotation::Deg0, Rotation::Deg180, Rotation::Deg0]
    );
    assert_eq!(page_images(&result)[1], page_images(&doc)[0]);
}

#[test]
fn test_store_commit_writes_pending_edits() {
    let doc = open(scanned_pdf(3));
    let mut store = PageTransformStore::new();
    store.load(doc.page_count());

    store.set_rotation(2, 90).unwrap();
    store.set_rotation(2, 90).unwrap();
    store.reorder(vec![2, 1, 3]).unwrap();
    assert!(store.is_dirty());

    let committed = store.commit(&doc, &PageRewriter::new()).unwrap();
    assert_eq!(committed.pages()[0].rotation, Rotation::Deg180);
    assert_eq!(page_images(&committed)[0], page_images(&doc)[1]);
    assert!(!store.is_dirty());
}

#[test]
fn test_store_rotation_always_normalized() {
    let mut store = PageTransformStore::new();
    store.load(1);
    for delta in [90, -90, 270, 450, -720, 180, 90, -270, 36000, 90] {
        let rotation = store.set_rotation(1, delta).unwrap();
        assert!([0, 90, 180, 270].contains(&rotation.degrees()));
    }
}

#[test]
fn test_store_commit_rejects_other_document() {
    let doc = open(scanned_pdf(2));
    let mut store = PageTransformStore::new();
    store.load(3);
    store.set_rotation(1, 90).unwrap();
    assert!(store.commit(&doc, &PageRewriter::new()).is_err());
    // Edits survive the rejected commit.
    assert_eq!(store.rotation(1).unwrap(), Rotation::Deg90);
}

#[test]
fn test_commit_after_reload_is_stale() {
    let doc = open(scanned_pdf(2));
    let mut store = PageTransformStore::new();
    store.load(2);
    store.set_rotation(1, 90).unwrap();

    let ticket = store.begin_commit().unwrap();
    let result = PageRewriter::new().apply(&doc, ticket.plan());
    store.load(4);

    assert!(matches!(store.finish_commit(ticket, result), Err(Error::Stale)));
    assert_eq!(store.total_pages(), 4);
}

#[test]
fn test_resize_to_a4() {
    let doc = open(scanned_pdf(2));
    let resized = Toolkit::new().resize(&doc, PageFormat::A4).unwrap();

    assert_eq!(resized.page_count(), 2);
    for page in resized.pages() {
        assert!((page.width - 595.28).abs() < 0.01);
        assert!((page.height - 841.89).abs() < 0.01);
        assert_eq!(page.rotation, Rotation::Deg0);
    }
}

#[test]
fn test_resize_keeps_landscape_orientation() {
    let doc = open(scanned_pdf(1));
    let turned = Toolkit::new().rotate_all(&doc, Rotation::Deg90).unwrap();
    let resized = Toolkit::new().resize(&turned, PageFormat::Letter).unwrap();
    let page = &resized.pages()[0];
    assert_eq!((page.width, page.height), (792.0, 612.0));
    assert_eq!(page.rotation, Rotation::Deg0);

    let image = image::load_from_memory(&page_images(&resized)[0]).unwrap();
    assert!(image.width() > image.height());
}

#[test]
fn test_censor_replaces_only_marked_pages() {
    let doc = open(scanned_pdf(3));
    let regions = [
        CensorRegion::new(2, 10.0, 10.0, 50.0, 20.0),
        CensorRegion::new(2, 100.0, 100.0, 30.0, 30.0),
    ];
    let censored = Toolkit::new()
        .censor(&doc, &regions, &CensorOptions::new())
        .unwrap();

    let before = page_images(&doc);
    let after = page_images(&censored);
    assert_eq!(after[0], before[0]);
    assert_ne!(after[1], before[1]);
    assert_eq!(after[2], before[2]);
}

#[test]
fn test_censor_validates_regions() {
    let doc = open(scanned_pdf(1));
    let toolkit = Toolkit::new();
    let options = CensorOptions::new();
    assert!(matches!(
        toolkit.censor(&doc, &[], &options),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        toolkit.censor(&doc, &[CensorRegion::new(2, 0.0, 0.0, 1.0, 1.0)], &options),
        Err(Error::PageOutOfRange(2, 1))
    ));
    assert!(toolkit
        .censor(&doc, &[CensorRegion::new(1, 0.0, 0.0, -1.0, 1.0)], &options)
        .is_err());
}
