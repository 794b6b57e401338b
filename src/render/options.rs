//! Rasterization options and page selection.

use std::ops::RangeInclusive;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What the raster is for. Selects the resampling filter used for images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderIntent {
    /// On-screen previews and thumbnails
    #[default]
    Display,
    /// Output that replaces the page content (compression, resizing)
    Print,
}

impl RenderIntent {
    pub(crate) fn filter(self) -> FilterType {
        match self {
            RenderIntent::Display => FilterType::Triangle,
            RenderIntent::Print => FilterType::Lanczos3,
        }
    }
}

/// Options for rasterizing a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterOptions {
    /// Pixels per point (1.0 = 72 dpi)
    pub scale: f32,

    /// Resampling quality
    pub intent: RenderIntent,

    /// JPEG quality (1-100)
    pub quality: u8,
}

impl RasterOptions {
    /// Create raster options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the render intent.
    pub fn with_intent(mut self, intent: RenderIntent) -> Self {
        self.intent = intent;
        self
    }

    /// Set the JPEG quality.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Reject non-finite or non-positive scales and out-of-range qualities.
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::validation(format!(
                "scale must be a positive number, got {}",
                self.scale
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(Error::validation(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            intent: RenderIntent::Display,
            quality: 85,
        }
    }
}

/// Page selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number is selected.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Selected page numbers within a document of `total` pages.
    ///
    /// Explicitly named pages beyond `total` are an error.
    pub fn resolve(&self, total: u32) -> Result<Vec<u32>> {
        match self {
            PageSelection::All => Ok((1..=total).collect()),
            PageSelection::Range(range) => {
                let (start, end) = (*range.start(), *range.end());
                if start == 0 || end > total || start > end {
                    return Err(Error::PageOutOfRange(end.max(start), total));
                }
                Ok((start..=end).collect())
            }
            PageSelection::Pages(pages) => {
                if let Some(&bad) = pages.iter().find(|&&p| p == 0 || p > total) {
                    return Err(Error::PageOutOfRange(bad, total));
                }
                Ok(pages.clone())
            }
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid start page")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid end page")?;
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid page number")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid page number")?;
                for p in start..=end {
                    if !pages.contains(&p) {
                        pages.push(p);
                    }
                }
            } else {
                let p: u32 = part.parse().map_err(|_| "Invalid page number")?;
                if !pages.contains(&p) {
                    pages.push(p);
                }
            }
        }

        pages.sort();
        Ok(PageSelection::Pages(pages))
    }
}
