//! Integration tests for thumbnail generation.

mod common;

use common::{open, scanned_pdf, text_pdf, ScriptedEngine, PAGE_SIZE};
use pdfsuite::render::ThumbnailImage;
use pdfsuite::{EngineConfig, GenerationCounter, Rasterizer, ThumbnailGenerator, Toolkit};

#[test]
fn test_failed_page_becomes_placeholder() {
    let doc = open(scanned_pdf(5));
    let mut generator = ThumbnailGenerator::new(Rasterizer::new(ScriptedEngine::failing_on([3])));

    let thumbnails: Vec<_> = generator.generate(&doc).collect();
    assert_eq!(thumbnails.len(), 5);

    for thumbnail in &thumbnails {
        assert_eq!(thumbnail.image.is_placeholder(), thumbnail.page == 3);
    }
    match &thumbnails[2].image {
        ThumbnailImage::Placeholder { reason, .. } => assert!(reason.contains("page 3")),
        other => panic!("expected placeholder, got {:?}", other),
    }

    let last = thumbnails.last().unwrap().progress;
    assert_eq!((last.completed, last.total), (5, 5));
    assert_eq!(last.fraction(), 1.0);
}

#[test]
fn test_thumbnail_size_follows_scale() {
    let doc = open(scanned_pdf(1));
    let mut generator = Toolkit::new().thumbnails();
    let thumbnail = generator.generate(&doc).next().unwrap();

    let expected = (
        (PAGE_SIZE.0 as f32 * 0.2).ceil() as u32,
        (PAGE_SIZE.1 as f32 * 0.2).ceil() as u32,
    );
    assert_eq!(thumbnail.image.dimensions(), expected);
    assert!(!thumbnail.image.is_placeholder());
}

#[test]
fn test_text_pages_render() {
    let doc = open(text_pdf(3));
    let mut generator = Toolkit::new().thumbnails();
    let thumbnails: Vec<_> = generator.generate(&doc).collect();

    assert_eq!(thumbnails.len(), 3);
    assert!(thumbnails.iter().all(|t| !t.image.is_placeholder()));
}

#[test]
fn test_progress_is_incremental() {
    let doc = open(scanned_pdf(3));
    let mut generator = ThumbnailGenerator::with_scale(Toolkit::new().rasterizer(), 0.1);
    let completed: Vec<u32> = generator
        .generate(&doc)
        .map(|t| t.progress.completed)
        .collect();
    assert_eq!(completed, [1, 2, 3]);
}

#[test]
fn test_generation_restarts() {
    let doc = open(scanned_pdf(2));
    let mut generator = ThumbnailGenerator::with_scale(Toolkit::new().rasterizer(), 0.1);
    assert_eq!(generator.generate(&doc).count(), 2);
    assert_eq!(generator.generate(&doc).count(), 2);
}

#[test]
fn test_superseded_run_stops() {
    let doc = open(scanned_pdf(4));
    let engine = ScriptedEngine::failing_on([4]);
    let toolkit = Toolkit::with_engine_config(EngineConfig::new().with_engine(engine)).unwrap();
    let mut generator = ThumbnailGenerator::with_scale(toolkit.rasterizer(), 0.1);

    let counter = GenerationCounter::new();
    let token = counter.bump();
    let mut run = generator.generate(&doc).with_token(token);

    assert!(run.next().is_some());
    counter.bump();
    assert!(run.next().is_none());
    assert!(run.next().is_none());
}
