//! Size statistics for compression runs.

use serde::{Deserialize, Serialize};

/// Size change of one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressionStats {
    /// Input size in bytes
    pub original_size: u64,

    /// Output size in bytes
    pub compressed_size: u64,

    /// Space saved, in percent of the input. Negative when the output grew.
    pub saved_percentage: f64,
}

impl CompressionStats {
    pub fn new(original_size: u64, compressed_size: u64) -> Self {
        Self {
            original_size,
            compressed_size,
            saved_percentage: saved_percentage(original_size, compressed_size),
        }
    }

    /// Bytes saved; negative when the output grew.
    pub fn saved_bytes(&self) -> i64 {
        self.original_size as i64 - self.compressed_size as i64
    }
}

/// `(original - compressed) / original * 100`, or 0 for an empty input.
pub fn saved_percentage(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - compressed as f64) / original as f64 * 100.0
}

/// Totals over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Number of files in the batch
    pub file_count: usize,

    /// Files that were actually compressed
    pub compressed_count: usize,

    /// Files emitted unchanged after failing
    pub fallback_count: usize,

    pub total_original_size: u64,
    pub total_compressed_size: u64,

    /// Space saved over the whole batch, in percent
    pub saved_percentage: f64,

    /// Page images that the optimizer failed on
    pub optimizer_failures: usize,
}

impl BatchStats {
    /// Add one file's statistics.
    pub fn record(&mut self, stats: &CompressionStats, fallback: bool) {
        self.file_count += 1;
        if fallback {
            self.fallback_count += 1;
        } else {
            self.compressed_count += 1;
        }
        self.total_original_size += stats.original_size;
        self.total_compressed_size += stats.compressed_size;
        self.saved_percentage =
            saved_percentage(self.total_original_size, self.total_compressed_size);
    }
}
