//! # pdfsuite
//!
//! PDF page transforms and batch processing for Rust.
//!
//! Every operation takes a [`PdfDocument`] by reference and returns a new
//! one: compress, rotate, reorder, resize, censor, watermark, protect and
//! unlock.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfsuite::{Toolkit, Rotation};
//! use std::collections::BTreeMap;
//!
//! fn main() -> pdfsuite::Result<()> {
//!     let toolkit = Toolkit::new();
//!     let doc = pdfsuite::open("scan.pdf")?;
//!
//!     // Turn page 2 a quarter turn clockwise
//!     let rotated = toolkit.rotate(&doc, &BTreeMap::from([(2, Rotation::Deg90)]))?;
//!     rotated.save("scan_rotado.pdf")?;
//!
//!     // Shrink by rasterizing every page
//!     let (compressed, stats) = toolkit.compress(&doc)?;
//!     println!("saved {:.1}%", stats.saved_percentage);
//!     compressed.save("scan_comprimido.pdf")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Metadata-only rotation**: pages are never re-rendered to rotate them
//! - **Batch compression**: retry, fallback copies and per-file statistics
//! - **Pluggable rendering**: hayro (pure Rust) by default, or MuPDF behind the `mupdf` feature
//! - **Standard security handler**: RC4 protection, RC4/AES-128 unlocking
//! - **Stale-result protection**: generation tokens discard outdated work

pub mod archive;
pub mod compress;
pub mod detect;
pub mod edit;
pub mod error;
pub mod history;
pub mod model;
pub mod naming;
mod objects;
pub mod render;
pub mod security;
pub mod stamp;

// Re-export commonly used types
pub use archive::{ArchiveBundler, ArchiveEntry, ArchiveOutput, UniqueNames};
pub use compress::{
    BatchInput, BatchReport, CompressOptions, CompressionLevel, CompressionPipeline,
    CompressionStats, Fallback, ImageOptimizer, OptimizerConfig, RetryPolicy,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, PdfFormat};
pub use edit::{
    CensorOptions, CensorRegion, GenerationCounter, GenerationToken, PageFormat, PageRewriter,
    PageTransformStore, Replacement, RewritePlan, RotationTarget,
};
pub use error::{Error, ErrorKind, Result};
pub use history::RecentFiles;
pub use model::{DocumentInfo, Page, PdfDocument, RasterImage, Rotation};
pub use naming::{output_name, Operation};
pub use render::{
    EngineConfig, EngineKind, PageSelection, RasterOptions, Rasterizer, RenderEngine,
    RenderIntent, ThumbnailGenerator,
};
pub use security::{Permissions, ProtectionOptions};
pub use stamp::{Color, WatermarkOptions};

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Open a PDF file.
///
/// # Example
///
/// ```no_run
/// let doc = pdfsuite::open("document.pdf").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn open<P: AsRef<Path>>(path: P) -> Result<PdfDocument> {
    PdfDocument::open(path)
}

/// Open a password-protected PDF file.
pub fn open_with_password<P: AsRef<Path>>(path: P, password: &str) -> Result<PdfDocument> {
    PdfDocument::open_with_password(path, Some(password))
}

/// Parse a PDF from bytes.
pub fn open_bytes(data: &[u8]) -> Result<PdfDocument> {
    PdfDocument::from_bytes(data)
}

/// Entry point bundling a rendering engine with the components that need one.
///
/// # Example
///
/// ```no_run
/// use pdfsuite::{Toolkit, EngineConfig, EngineKind, CompressOptions, CompressionLevel};
///
/// let toolkit = Toolkit::with_engine_config(EngineConfig::new().with_kind(EngineKind::Hayro))?
///     .with_compression(CompressOptions::new().with_level(CompressionLevel::High));
/// let doc = pdfsuite::open("scan.pdf")?;
/// let (small, _) = toolkit.compress(&doc)?;
/// # Ok::<(), pdfsuite::Error>(())
/// ```
pub struct Toolkit {
    engine: Arc<dyn RenderEngine>,
    rewriter: PageRewriter,
    compress: CompressOptions,
    optimizer: Option<Arc<dyn ImageOptimizer>>,
}

impl Toolkit {
    /// Create a toolkit using the hayro rendering engine.
    pub fn new() -> Self {
        Self {
            engine: Arc::new(render::HayroEngine::new()),
            rewriter: PageRewriter::new(),
            compress: CompressOptions::default(),
            optimizer: None,
        }
    }

    /// Create a toolkit with an explicitly configured engine.
    pub fn with_engine_config(config: EngineConfig) -> Result<Self> {
        Ok(Self {
            engine: config.build()?,
            ..Self::new()
        })
    }

    /// Set compression options.
    pub fn with_compression(mut self, options: CompressOptions) -> Self {
        self.compress = options;
        self
    }

    /// Set the image optimizer used when compression enables it.
    pub fn with_optimizer(mut self, optimizer: Arc<dyn ImageOptimizer>) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    /// Use the HTTP re-compression service described by `config`.
    #[cfg(feature = "remote-optimize")]
    pub fn with_optimizer_config(self, config: OptimizerConfig) -> Result<Self> {
        let optimizer = compress::HttpImageOptimizer::new(config)?;
        let mut toolkit = self.with_optimizer(Arc::new(optimizer));
        toolkit.compress.use_optimizer = true;
        Ok(toolkit)
    }

    /// Set the page rewriter.
    pub fn with_rewriter(mut self, rewriter: PageRewriter) -> Self {
        self.rewriter = rewriter;
        self
    }

    /// The rendering engine.
    pub fn engine(&self) -> &Arc<dyn RenderEngine> {
        &self.engine
    }

    pub fn rewriter(&self) -> &PageRewriter {
        &self.rewriter
    }

    pub fn compress_options(&self) -> &CompressOptions {
        &self.compress
    }

    /// A new rasterizer drawing with this toolkit's engine.
    pub fn rasterizer(&self) -> Rasterizer {
        Rasterizer::new(Arc::clone(&self.engine))
    }

    /// A thumbnail generator at the default thumbnail scale.
    pub fn thumbnails(&self) -> ThumbnailGenerator {
        ThumbnailGenerator::new(self.rasterizer())
    }

    /// A compression pipeline using this toolkit's settings.
    pub fn pipeline(&self) -> CompressionPipeline {
        let mut pipeline = CompressionPipeline::new(self.rasterizer(), self.compress.clone())
            .with_rewriter(self.rewriter.clone());
        if let Some(optimizer) = &self.optimizer {
            pipeline = pipeline.with_optimizer(Arc::clone(optimizer));
        }
        pipeline
    }

    /// Rotate pages by the given amounts.
    pub fn rotate(
        &self,
        doc: &PdfDocument,
        rotations: &BTreeMap<u32, Rotation>,
    ) -> Result<PdfDocument> {
        self.rewriter.rotate(doc, rotations)
    }

    /// Rotate every page by the same amount.
    pub fn rotate_all(&self, doc: &PdfDocument, rotation: Rotation) -> Result<PdfDocument> {
        let rotations: BTreeMap<u32, Rotation> =
            (1..=doc.page_count()).map(|p| (p, rotation)).collect();
        self.rewriter.rotate(doc, &rotations)
    }

    /// Put pages in a new order.
    pub fn reorder(&self, doc: &PdfDocument, order: &[u32]) -> Result<PdfDocument> {
        self.rewriter.reorder(doc, order)
    }

    /// Apply rotations and reordering together.
    pub fn apply(&self, doc: &PdfDocument, plan: &RewritePlan) -> Result<PdfDocument> {
        self.rewriter.apply(doc, plan)
    }

    /// Compress a single document without retries.
    pub fn compress(&self, doc: &PdfDocument) -> Result<(PdfDocument, CompressionStats)> {
        let (output, _) = self.pipeline().compress_document(doc)?;
        let stats = CompressionStats::new(doc.len() as u64, output.len() as u64);
        Ok((output, stats))
    }

    /// Compress a batch of files.
    pub fn compress_batch<F>(&self, inputs: Vec<BatchInput>, progress: F) -> Result<BatchReport>
    where
        F: FnMut(&compress::BatchProgress<'_>),
    {
        self.pipeline().run(inputs, progress)
    }

    /// Fit every page onto a standard paper format.
    pub fn resize(&self, doc: &PdfDocument, format: PageFormat) -> Result<PdfDocument> {
        let options = RasterOptions::new().with_scale(2.0).with_quality(90);
        edit::resize(doc, format, &mut self.rasterizer(), &options, &self.rewriter)
    }

    /// Black out regions of pages.
    pub fn censor(
        &self,
        doc: &PdfDocument,
        regions: &[CensorRegion],
        options: &CensorOptions,
    ) -> Result<PdfDocument> {
        edit::censor(doc, regions, &mut self.rasterizer(), options, &self.rewriter)
    }

    /// Draw a text watermark on every page.
    pub fn watermark(&self, doc: &PdfDocument, options: &WatermarkOptions) -> Result<PdfDocument> {
        stamp::apply_watermark(doc, options)
    }

    /// Encrypt a document with the standard security handler.
    pub fn protect(&self, doc: &PdfDocument, options: &ProtectionOptions) -> Result<PdfDocument> {
        security::protect(doc, options)
    }

    /// Remove encryption from a document.
    pub fn unlock(&self, data: &[u8], password: &str) -> Result<PdfDocument> {
        security::unlock(data, password)
    }

    /// Bundle files into a ZIP archive.
    pub fn bundle(&self, entries: &[ArchiveEntry]) -> Result<ArchiveOutput> {
        ArchiveBundler::new().bundle(entries)
    }
}

impl Default for Toolkit {
    fn default() -> Self {
        Self::new()
    }
}
