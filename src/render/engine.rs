//! Rendering engine abstraction.
//!
//! The engine is chosen once, explicitly, through [`EngineConfig`] and handed
//! to every component that needs to draw pages. Nothing in the crate creates
//! an engine behind the caller's back.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::options::RenderIntent;
use crate::error::{Error, Result};
use crate::model::{Page, PdfDocument};

/// Parameters of a single draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    /// Pixels per point
    pub scale: f32,
    /// Resampling quality
    pub intent: RenderIntent,
}

/// Something that can draw a PDF page into an RGBA surface.
pub trait RenderEngine: Send + Sync {
    /// Engine name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Draw `page` onto `surface`.
    ///
    /// The surface is already sized to the page's display size at
    /// `params.scale` and cleared to opaque white.
    fn render_page(
        &self,
        doc: &PdfDocument,
        page: &Page,
        surface: &mut RgbaImage,
        params: &RenderParams,
    ) -> Result<()>;
}

/// Convert a pixel size reported by a rendering backend, rejecting negative,
/// zero or out-of-range dimensions instead of truncating them.
#[cfg_attr(not(feature = "mupdf"), allow(dead_code))]
pub(crate) fn pixel_size<T>(width: T, height: T) -> Result<(u32, u32)>
where
    T: TryInto<u32> + Copy + fmt::Display,
{
    match (width.try_into(), height.try_into()) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(Error::render(format!("invalid raster size {}x{}", width, height))),
    }
}

/// Which engine implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// hayro, a pure-Rust interpreter and rasterizer
    #[default]
    Hayro,
    /// MuPDF (requires the `mupdf` cargo feature)
    Mupdf,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Hayro => write!(f, "hayro"),
            EngineKind::Mupdf => write!(f, "mupdf"),
        }
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hayro" => Ok(EngineKind::Hayro),
            "mupdf" => Ok(EngineKind::Mupdf),
            other => Err(Error::validation(format!("unknown rendering engine '{}'", other))),
        }
    }
}

/// Explicit engine configuration.
#[derive(Clone, Default)]
pub struct EngineConfig {
    kind: EngineKind,
    custom: Option<Arc<dyn RenderEngine>>,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("kind", &self.kind)
            .field("custom", &self.custom.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}

impl EngineConfig {
    /// Create engine configuration with defaults (the hayro engine).
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given engine kind.
    pub fn with_kind(mut self, kind: EngineKind) -> Self {
        self.kind = kind;
        self.custom = None;
        self
    }

    /// Use a caller-supplied engine.
    pub fn with_engine(mut self, engine: Arc<dyn RenderEngine>) -> Self {
        self.custom = Some(engine);
        self
    }

    /// The configured engine kind (ignored when a custom engine is set).
    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Instantiate the configured engine.
    pub fn build(&self) -> Result<Arc<dyn RenderEngine>> {
        if let Some(engine) = &self.custom {
            return Ok(Arc::clone(engine));
        }
        match self.kind {
            EngineKind::Hayro => Ok(Arc::new(super::hayro_engine::HayroEngine::new())),
            #[cfg(feature = "mupdf")]
            EngineKind::Mupdf => Ok(Arc::new(super::mupdf_engine::MupdfEngine::new())),
            #[cfg(not(feature = "mupdf"))]
            EngineKind::Mupdf => Err(Error::validation(
                "this build does not include the MuPDF engine (enable the `mupdf` feature)",
            )),
        }
    }
}
