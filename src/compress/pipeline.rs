//! Sequential batch compression with retry and fallback.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use super::optimizer::ImageOptimizer;
use super::options::CompressOptions;
use super::retry::Fallback;
use super::stats::{BatchStats, CompressionStats};
use crate::edit::{GenerationToken, PageRewriter, Replacement};
use crate::error::{Error, ErrorKind, Result};
use crate::model::PdfDocument;
use crate::naming::{output_name, Operation};
use crate::render::Rasterizer;

/// One file to compress.
#[derive(Debug, Clone)]
pub struct BatchInput {
    /// File name, used for the output name and in reports
    pub name: String,
    pub bytes: Vec<u8>,
    /// Password for encrypted inputs
    pub password: Option<String>,
}

impl BatchInput {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            password: None,
        }
    }

    /// Read a file from disk, named after its file name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// What the pipeline is doing with the current file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum BatchPhase {
    Started,
    Rendering { page: u32, pages: u32 },
    Retrying { attempt: u32 },
    Compressed,
    FellBack,
}

/// Progress report passed to the batch callback.
#[derive(Debug, Clone, Serialize)]
pub struct BatchProgress<'a> {
    /// Index of the current file (0-based)
    pub index: usize,
    /// Number of files in the batch
    pub total: usize,
    pub name: &'a str,
    pub phase: BatchPhase,
}

/// Whether a file was compressed or copied unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Compressed,
    Fallback,
}

/// Result for one input file.
#[derive(Debug)]
pub struct FileOutcome {
    /// Input name
    pub name: String,
    /// Name the output should be saved under
    pub output_name: String,
    /// Output bytes; identical to the input for fallbacks
    pub data: Vec<u8>,
    pub stats: CompressionStats,
    pub status: FileStatus,
    /// Attempts made
    pub attempts: u32,
    /// The last error, for fallbacks
    pub error: Option<Error>,
    /// Page images the optimizer failed on
    pub optimizer_failures: usize,
}

impl FileOutcome {
    pub fn is_fallback(&self) -> bool {
        self.status == FileStatus::Fallback
    }

    /// Kind of the recorded error, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(Error::kind)
    }
}

/// Result of a batch: one outcome per input, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
    pub stats: BatchStats,
}

impl BatchReport {
    pub fn compressed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.is_fallback())
    }

    pub fn fallbacks(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.is_fallback())
    }
}

/// Compresses documents by replacing every page with a JPEG raster.
pub struct CompressionPipeline {
    rasterizer: Rasterizer,
    rewriter: PageRewriter,
    optimizer: Option<Arc<dyn ImageOptimizer>>,
    options: CompressOptions,
    token: Option<GenerationToken>,
}

impl CompressionPipeline {
    pub fn new(rasterizer: Rasterizer, options: CompressOptions) -> Self {
        Self {
            rasterizer,
            rewriter: PageRewriter::new(),
            optimizer: None,
            options,
            token: None,
        }
    }

    /// Pass page images through `optimizer` when the options enable it.
    pub fn with_optimizer(mut self, optimizer: Arc<dyn ImageOptimizer>) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    pub fn with_rewriter(mut self, rewriter: PageRewriter) -> Self {
        self.rewriter = rewriter;
        self
    }

    /// Abort between files once `token` is superseded.
    pub fn with_token(mut self, token: GenerationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn options(&self) -> &CompressOptions {
        &self.options
    }

    /// Give the rasterizer back.
    pub fn into_rasterizer(self) -> Rasterizer {
        self.rasterizer
    }

    /// Compress one document, without retries or fallback.
    ///
    /// Returns the new document and the number of page images the
    /// optimizer failed on.
    pub fn compress_document(&mut self, doc: &PdfDocument) -> Result<(PdfDocument, usize)> {
        self.compress_pages(doc, &mut |_, _| {})
    }

    fn compress_pages(
        &mut self,
        doc: &PdfDocument,
        on_page: &mut dyn FnMut(u32, u32),
    ) -> Result<(PdfDocument, usize)> {
        let raster_options = self.options.level.raster_options();
        let optimizer = match (&self.optimizer, self.options.use_optimizer) {
            (Some(optimizer), true) => Some(Arc::clone(optimizer)),
            _ => None,
        };

        let pages = doc.page_count();
        let mut failures = 0;
        let mut replacements = BTreeMap::new();
        for page in 1..=pages {
            on_page(page, pages);
            let mut image = self.rasterizer.rasterize(doc, page, &raster_options)?;
            if let Some(optimizer) = &optimizer {
                match optimizer.optimize(&image) {
                    Ok(optimized) => {
                        log::debug!(
                            "page {}: {} shrank image from {} to {} bytes",
                            page,
                            optimizer.name(),
                            image.len(),
                            optimized.len()
                        );
                        image = optimized;
                    }
                    Err(e) => {
                        log::warn!("page {}: keeping unoptimized image: {}", page, e);
                        failures += 1;
                    }
                }
            }
            replacements.insert(page, Replacement::full_page(image));
        }

        let output = self.rewriter.replace(doc, &replacements)?;
        Ok((output, failures))
    }

    /// Compress a batch, one file after another, reporting progress to `progress`.
    ///
    /// Files that keep failing are copied unchanged unless the retry policy
    /// says to abort, in which case the first such failure is returned.
    pub fn run<F>(&mut self, inputs: Vec<BatchInput>, mut progress: F) -> Result<BatchReport>
    where
        F: FnMut(&BatchProgress<'_>),
    {
        if inputs.is_empty() {
            return Err(Error::validation("no files to compress"));
        }

        let total = inputs.len();
        let policy = self.options.retry.clone();
        let mut report = BatchReport::default();

        for (index, input) in inputs.into_iter().enumerate() {
            if let Some(token) = &self.token {
                token.check()?;
            }
            let name = input.name.as_str();
            let mut emit = |phase| {
                progress(&BatchProgress {
                    index,
                    total,
                    name,
                    phase,
                })
            };
            emit(BatchPhase::Started);

            let attempted = policy.run(|attempt| {
                if attempt > 1 {
                    emit(BatchPhase::Retrying { attempt });
                }
                let doc = PdfDocument::from_bytes_with_password(
                    input.bytes.clone(),
                    input.password.as_deref(),
                )?;
                self.compress_pages(&doc, &mut |page, pages| {
                    emit(BatchPhase::Rendering { page, pages })
                })
            });
            let attempts = attempted.attempts;
            let original_size = input.bytes.len() as u64;

            let outcome = match attempted.into_result() {
                Ok((doc, optimizer_failures)) => {
                    let data = doc.into_bytes();
                    let stats = CompressionStats::new(original_size, data.len() as u64);
                    log::info!(
                        "{}: {} -> {} bytes ({:.1}% saved)",
                        name,
                        stats.original_size,
                        stats.compressed_size,
                        stats.saved_percentage
                    );
                    emit(BatchPhase::Compressed);
                    FileOutcome {
                        name: input.name.clone(),
                        output_name: output_name(name, Operation::Compress),
                        data,
                        stats,
                        status: FileStatus::Compressed,
                        attempts,
                        error: None,
                        optimizer_failures,
                    }
                }
                Err(e) => {
                    if policy.fallback == Fallback::Abort {
                        log::error!("{}: aborting batch after {} attempts: {}", name, attempts, e);
                        return Err(e);
                    }
                    log::warn!(
                        "{}: copying original after {} attempt(s): {}",
                        name,
                        attempts,
                        e
                    );
                    emit(BatchPhase::FellBack);
                    FileOutcome {
                        name: input.name.clone(),
                        output_name: output_name(name, Operation::Compress),
                        data: input.bytes.clone(),
                        stats: CompressionStats::new(original_size, original_size),
                        status: FileStatus::Fallback,
                        attempts,
                        error: Some(e),
                        optimizer_failures: 0,
                    }
                }
            };

            report.stats.record(&outcome.stats, outcome.is_fallback());
            report.stats.optimizer_failures += outcome.optimizer_failures;
            report.files.push(outcome);
        }

        Ok(report)
    }

    /// [`run`](Self::run) without a progress callback.
    pub fn run_quiet(&mut self, inputs: Vec<BatchInput>) -> Result<BatchReport> {
        self.run(inputs, |_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_input_builder() {
        let input = BatchInput::new("a.pdf", vec![1, 2, 3]).with_password("pw");
        assert_eq!(input.name, "a.pdf");
        assert_eq!(input.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_report_filters() {
        let outcome = |status| FileOutcome {
            name: "x.pdf".into(),
            output_name: "x_comprimido.pdf".into(),
            data: Vec::new(),
            stats: CompressionStats::default(),
            status,
            attempts: 1,
            error: None,
            optimizer_failures: 0,
        };
        let report = BatchReport {
            files: vec![outcome(FileStatus::Compressed), outcome(FileStatus::Fallback)],
            stats: BatchStats::default(),
        };
        assert_eq!(report.compressed().count(), 1);
        assert_eq!(report.fallbacks().count(), 1);
    }
}
