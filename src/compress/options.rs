//! Compression levels and options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::retry::RetryPolicy;
use crate::error::{Error, Result};
use crate::render::{RasterOptions, RenderIntent};

/// How aggressively to compress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Best quality, largest output
    Low,
    #[default]
    Medium,
    /// Smallest output
    High,
}

impl CompressionLevel {
    /// JPEG quality used for page rasters.
    pub fn quality(self) -> u8 {
        match self {
            CompressionLevel::Low => 95,
            CompressionLevel::Medium => 70,
            CompressionLevel::High => 40,
        }
    }

    /// Rasterization scale (pixels per point).
    pub fn scale(self) -> f32 {
        match self {
            CompressionLevel::Low => 2.0,
            CompressionLevel::Medium => 1.5,
            CompressionLevel::High => 1.0,
        }
    }

    /// Raster options for this level.
    pub fn raster_options(self) -> RasterOptions {
        RasterOptions::new()
            .with_scale(self.scale())
            .with_quality(self.quality())
            .with_intent(RenderIntent::Print)
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressionLevel::Low => "low",
            CompressionLevel::Medium => "medium",
            CompressionLevel::High => "high",
        };
        f.write_str(name)
    }
}

impl FromStr for CompressionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(CompressionLevel::Low),
            "medium" => Ok(CompressionLevel::Medium),
            "high" => Ok(CompressionLevel::High),
            other => Err(Error::validation(format!(
                "unknown compression level: {} (expected low, medium or high)",
                other
            ))),
        }
    }
}

/// Options for a compression run.
#[derive(Debug, Clone, Default)]
pub struct CompressOptions {
    /// Compression level
    pub level: CompressionLevel,

    /// What to do when a file keeps failing
    pub retry: RetryPolicy,

    /// Send page rasters through the configured image optimizer
    pub use_optimizer: bool,
}

impl CompressOptions {
    /// Create compression options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression level.
    pub fn with_level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enable or disable the image optimizer.
    pub fn with_optimizer(mut self, enabled: bool) -> Self {
        self.use_optimizer = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_table() {
        assert_eq!(CompressionLevel::Low.quality(), 95);
        assert_eq!(CompressionLevel::Medium.quality(), 70);
        assert_eq!(CompressionLevel::High.quality(), 40);
        assert_eq!(CompressionLevel::High.scale(), 1.0);
        assert_eq!(
            CompressionLevel::Low.raster_options().intent,
            RenderIntent::Print
        );
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("HIGH".parse::<CompressionLevel>().unwrap(), CompressionLevel::High);
        assert_eq!(" low".parse::<CompressionLevel>().unwrap(), CompressionLevel::Low);
        assert!("extreme".parse::<CompressionLevel>().is_err());
        assert_eq!(CompressionLevel::Medium.to_string(), "medium");
    }
}
