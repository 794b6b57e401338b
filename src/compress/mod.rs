//! Batch compression by page rasterization.
//!
//! Every page is rendered to a JPEG at the [`CompressionLevel`]'s scale and
//! quality, optionally re-compressed by an [`ImageOptimizer`], and the
//! document is rebuilt from those images. Files are processed one after
//! another; a [`RetryPolicy`] decides how often a failing file is retried
//! and whether it is then copied unchanged or aborts the batch.

mod optimizer;
mod options;
mod pipeline;
mod retry;
mod stats;

#[cfg(feature = "remote-optimize")]
pub use optimizer::HttpImageOptimizer;
pub use optimizer::{
    accept_optimized, jpeg_data_url, parse_optimizer_response, ImageOptimizer, OptimizerConfig,
    OptimizerResponse,
};
pub use options::{CompressOptions, CompressionLevel};
pub use pipeline::{
    BatchInput, BatchPhase, BatchProgress, BatchReport, CompressionPipeline, FileOutcome,
    FileStatus,
};
pub use retry::{Attempted, Fallback, RetryPolicy};
pub use stats::{saved_percentage, BatchStats, CompressionStats};
