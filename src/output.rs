//! Result types returned by the pipeline.
//!
//! Everything here is `Serialize` so the CLI's `--json` flag can dump a
//! complete record of what was measured and decided.

use crate::config::LayoutMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What the probe stage learned about a photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Horizontal resolution in dots per inch (fallback applied).
    pub dpi: u32,
    /// JPEG quality (fallback applied for non-JPEG images).
    pub quality: u8,
    /// ImageMagick format name, e.g. "JPEG", "PNG". Empty if unknown.
    pub format: String,
}

impl ImageInfo {
    /// Landscape means strictly wider than tall; squares count as portrait.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// Height divided by width.
    pub fn aspect_ratio(&self) -> f64 {
        if self.width == 0 {
            return 0.0;
        }
        self.height as f64 / self.width as f64
    }
}

/// Direction ImageMagick joins the two images in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppendDirection {
    /// `-append`: top to bottom.
    Vertical,
    /// `+append`: left to right.
    Horizontal,
}

impl AppendDirection {
    pub fn magick_flag(self) -> &'static str {
        match self {
            AppendDirection::Vertical => "-append",
            AppendDirection::Horizontal => "+append",
        }
    }
}

/// The sizing and placement decided for a photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPlan {
    /// The resolved mode; never [`LayoutMode::Auto`].
    pub mode: LayoutMode,
    /// Width the rendered citation is resized to, in pixels.
    pub citation_width: u32,
    /// Canvas width the citation is centered on.
    pub canvas_width: u32,
    /// Canvas height, or `None` to let it follow the citation.
    pub canvas_height: Option<u32>,
    pub direction: AppendDirection,
    pub dpi: u32,
    pub quality: u8,
}

impl LayoutPlan {
    /// Geometry for `magick -extent`, e.g. `"1200x"` or `"640x2000"`.
    pub fn extent(&self) -> String {
        match self.canvas_height {
            Some(h) => format!("{}x{}", self.canvas_width, h),
            None => format!("{}x", self.canvas_width),
        }
    }

    /// Geometry for `magick -resize`. Stacked captions are scaled to the
    /// citation width; side-by-side captions are fitted into
    /// `citation_width x canvas_height` so the canvas never crops them.
    pub fn resize_geometry(&self) -> String {
        match self.canvas_height {
            Some(h) => format!("{}x{}", self.citation_width, h),
            None => self.citation_width.to_string(),
        }
    }
}

/// Wall-clock timings for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub probe_duration_ms: u64,
    pub render_duration_ms: u64,
    pub compose_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Result of [`crate::annotate::annotate`] or
/// [`crate::annotate::render_citation_only`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotateOutput {
    /// The file that was written.
    pub output: PathBuf,
    /// Where the citation text came from, e.g. `file: ref.md`.
    pub citation_source: String,
    /// Photo measurements; `None` for citation-only runs.
    pub image: Option<ImageInfo>,
    /// Layout decision; `None` for citation-only runs.
    pub layout: Option<LayoutPlan>,
    /// Kept work directory (debug mode only).
    pub intermediates: Option<PathBuf>,
    pub stats: RunStats,
}
