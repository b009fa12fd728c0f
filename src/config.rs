//! Configuration types for citation rendering and composition.
//!
//! All pipeline behaviour is controlled through [`CitationConfig`], built
//! via its [`CitationConfigBuilder`]. The sizing constants that decide how
//! big the caption is relative to the photo live here too, so a run can be
//! reproduced from its config alone.

use crate::error::PhotociteError;
use crate::progress::ProgressCallback;
use crate::template::{has_body_placeholder, DEFAULT_TEMPLATE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest density accepted for rendering, configured or probed.
pub const MIN_DPI: u32 = 36;
/// Highest density accepted for rendering, configured or probed.
pub const MAX_DPI: u32 = 1200;

/// Configuration for one photocite run.
///
/// Built via [`CitationConfig::builder()`] or using
/// [`CitationConfig::default()`].
///
/// # Example
/// ```rust
/// use photocite::{CitationConfig, LayoutMode};
///
/// let config = CitationConfig::builder()
///     .layout(LayoutMode::Stacked)
///     .dpi(300)
///     .keep_intermediates(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct CitationConfig {
    /// LaTeX template content. `None` uses [`DEFAULT_TEMPLATE`].
    pub template: Option<String>,

    /// Forced output DPI. `None` uses the DPI read from the source photo.
    pub dpi: Option<u32>,

    /// DPI for citation-only runs, where there is no photo to match. Default: 72.
    pub citation_only_dpi: u32,

    /// DPI assumed when the photo carries none (or reports 0). Default: 300.
    pub fallback_dpi: u32,

    /// JPEG quality used when the photo's quality cannot be read. Default: 92.
    pub fallback_quality: u8,

    /// Where the caption goes relative to the photo. Default: [`LayoutMode::Auto`].
    pub layout: LayoutMode,

    /// Caption width as a fraction of photo width, for landscape photos. Default: 0.50.
    pub landscape_width_factor: f64,

    /// Caption width as a fraction of photo width, for portrait and square photos. Default: 0.80.
    pub portrait_width_factor: f64,

    /// Height/width ratio at or above which [`LayoutMode::Auto`] switches to
    /// side-by-side. Default: 2.0.
    pub side_by_side_threshold: f64,

    /// Margin `pdfcrop` leaves around the typeset text, in big points. Default: 20.
    pub crop_margin: u32,

    /// zlib level for PNG output. Levels above 4 are much slower for little gain. Default: 4.
    pub png_compression_level: u8,

    /// Colour used to flatten transparency and pad the canvas. Default: "white".
    pub background: String,

    /// Keep the work directory and its intermediate files. Default: false.
    pub keep_intermediates: bool,

    /// Per-subprocess timeout in seconds. Default: 120.
    pub tool_timeout_secs: u64,

    /// Download timeout for URL photos in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// External programs to run.
    pub tools: Toolchain,

    /// Optional stage-progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            template: None,
            dpi: None,
            citation_only_dpi: 72,
            fallback_dpi: 300,
            fallback_quality: 92,
            layout: LayoutMode::default(),
            landscape_width_factor: 0.50,
            portrait_width_factor: 0.80,
            side_by_side_threshold: 2.0,
            crop_margin: 20,
            png_compression_level: 4,
            background: "white".to_string(),
            keep_intermediates: false,
            tool_timeout_secs: 120,
            download_timeout_secs: 120,
            tools: Toolchain::from_env(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CitationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CitationConfig")
            .field("template", &self.template.as_ref().map(|t| t.len()))
            .field("dpi", &self.dpi)
            .field("citation_only_dpi", &self.citation_only_dpi)
            .field("fallback_dpi", &self.fallback_dpi)
            .field("fallback_quality", &self.fallback_quality)
            .field("layout", &self.layout)
            .field("landscape_width_factor", &self.landscape_width_factor)
            .field("portrait_width_factor", &self.portrait_width_factor)
            .field("side_by_side_threshold", &self.side_by_side_threshold)
            .field("crop_margin", &self.crop_margin)
            .field("keep_intermediates", &self.keep_intermediates)
            .field("tool_timeout_secs", &self.tool_timeout_secs)
            .field("tools", &self.tools)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl CitationConfig {
    /// Create a new builder for `CitationConfig`.
    pub fn builder() -> CitationConfigBuilder {
        CitationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The template pandoc will use for this run.
    pub fn template(&self) -> &str {
        self.template.as_deref().unwrap_or(DEFAULT_TEMPLATE)
    }
}

/// Builder for [`CitationConfig`].
#[derive(Debug)]
pub struct CitationConfigBuilder {
    config: CitationConfig,
}

impl CitationConfigBuilder {
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.config.template = Some(template.into());
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = Some(dpi.clamp(MIN_DPI, MAX_DPI));
        self
    }

    pub fn citation_only_dpi(mut self, dpi: u32) -> Self {
        self.config.citation_only_dpi = dpi.clamp(MIN_DPI, MAX_DPI);
        self
    }

    pub fn fallback_dpi(mut self, dpi: u32) -> Self {
        self.config.fallback_dpi = dpi.clamp(MIN_DPI, MAX_DPI);
        self
    }

    pub fn fallback_quality(mut self, q: u8) -> Self {
        self.config.fallback_quality = q.min(100);
        self
    }

    pub fn layout(mut self, mode: LayoutMode) -> Self {
        self.config.layout = mode;
        self
    }

    pub fn landscape_width_factor(mut self, f: f64) -> Self {
        self.config.landscape_width_factor = f;
        self
    }

    pub fn portrait_width_factor(mut self, f: f64) -> Self {
        self.config.portrait_width_factor = f;
        self
    }

    pub fn side_by_side_threshold(mut self, ratio: f64) -> Self {
        self.config.side_by_side_threshold = ratio;
        self
    }

    pub fn crop_margin(mut self, bp: u32) -> Self {
        self.config.crop_margin = bp;
        self
    }

    pub fn png_compression_level(mut self, level: u8) -> Self {
        self.config.png_compression_level = level.min(9);
        self
    }

    pub fn background(mut self, colour: impl Into<String>) -> Self {
        self.config.background = colour.into();
        self
    }

    pub fn keep_intermediates(mut self, v: bool) -> Self {
        self.config.keep_intermediates = v;
        self
    }

    pub fn tool_timeout_secs(mut self, secs: u64) -> Self {
        self.config.tool_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn tools(mut self, tools: Toolchain) -> Self {
        self.config.tools = tools;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CitationConfig, PhotociteError> {
        let c = &self.config;
        for (name, f) in [
            ("landscape width factor", c.landscape_width_factor),
            ("portrait width factor", c.portrait_width_factor),
        ] {
            if !(f > 0.0 && f <= 1.0) {
                return Err(PhotociteError::InvalidConfig(format!(
                    "{name} must be in (0, 1], got {f}"
                )));
            }
        }
        if !(c.side_by_side_threshold > 0.0) {
            return Err(PhotociteError::InvalidConfig(format!(
                "side-by-side threshold must be > 0, got {}",
                c.side_by_side_threshold
            )));
        }
        if c.tool_timeout_secs == 0 || c.download_timeout_secs == 0 {
            return Err(PhotociteError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.background.trim().is_empty() {
            return Err(PhotociteError::InvalidConfig(
                "Background colour must not be empty".into(),
            ));
        }
        if let Some(ref t) = c.template {
            if !has_body_placeholder(t) {
                return Err(PhotociteError::InvalidConfig(
                    "LaTeX template has no $body$ placeholder".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Where the citation is placed relative to the photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    /// Stacked, unless the photo is a tall strip (see
    /// [`CitationConfig::side_by_side_threshold`]). (default)
    #[default]
    Auto,
    /// Citation centered under the photo.
    Stacked,
    /// Citation in a panel to the right of the photo.
    SideBySide,
}

// ── Toolchain ────────────────────────────────────────────────────────────

/// Names (or paths) of the external programs the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
    pub pandoc: String,
    pub pdfcrop: String,
    pub magick: String,
    /// LaTeX engine pandoc is told to use.
    pub pdf_engine: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            pandoc: "pandoc".to_string(),
            pdfcrop: "pdfcrop".to_string(),
            magick: "magick".to_string(),
            pdf_engine: "xelatex".to_string(),
        }
    }
}

impl Toolchain {
    /// Defaults overridden by `PHOTOCITE_PANDOC`, `PHOTOCITE_PDFCROP`,
    /// `PHOTOCITE_MAGICK` and `PHOTOCITE_PDF_ENGINE` when set and non-empty.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |key: &str, default: String| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        };
        let d = Self::default();
        Self {
            pandoc: pick("PHOTOCITE_PANDOC", d.pandoc),
            pdfcrop: pick("PHOTOCITE_PDFCROP", d.pdfcrop),
            magick: pick("PHOTOCITE_MAGICK", d.magick),
            pdf_engine: pick("PHOTOCITE_PDF_ENGINE", d.pdf_engine),
        }
    }
}
