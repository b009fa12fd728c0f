//! # photocite
//!
//! Render a citation written in markdown (with inline LaTeX) and attach it
//! to a photograph, producing a new annotated image.
//!
//! The heavy lifting is done by external tools: pandoc and xelatex typeset
//! the citation, pdfcrop trims it, and ImageMagick rasterises, resizes and
//! joins the images. This crate decides how big the caption should be and
//! where it goes, and carries the photo's DPI and JPEG quality through to
//! the output so the composite looks like it came from the same camera.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photo + citation.md
//!  │
//!  ├─ 1. Input    resolve local file or download from URL; pick citation source
//!  ├─ 2. Probe    width, height, DPI, JPEG quality (magick identify)
//!  ├─ 3. Layout   caption width, canvas extent, stacked vs side-by-side
//!  ├─ 4. Render   pandoc → pdfcrop → magick  (citation PNG at photo DPI)
//!  └─ 5. Compose  resize → center on canvas → append (atomic write)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use photocite::{annotate, Citation, CitationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CitationConfig::default();
//!     let citation = Citation::from_text("Photo: *Ansel Adams*, 1942");
//!     let out = annotate("moonrise.jpg", &citation, None, &config).await?;
//!     println!("wrote {}", out.output.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `photocite` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Required tools
//!
//! `pandoc`, a LaTeX distribution providing `xelatex` and `pdfcrop`, and
//! ImageMagick 7 (`magick`). Locations can be overridden with
//! `PHOTOCITE_PANDOC`, `PHOTOCITE_PDFCROP`, `PHOTOCITE_MAGICK` and
//! `PHOTOCITE_PDF_ENGINE`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod annotate;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod template;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use annotate::{
    annotate, annotate_sync, default_citation_path, default_composite_path, inspect,
    render_citation_only,
};
pub use config::{CitationConfig, CitationConfigBuilder, LayoutMode, Toolchain};
pub use error::PhotociteError;
pub use output::{AnnotateOutput, AppendDirection, ImageInfo, LayoutPlan, RunStats};
pub use pipeline::input::{select_citation_source, Citation, CitationRequest, CitationSource};
pub use pipeline::layout::plan_layout;
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback, Stage};
pub use template::DEFAULT_TEMPLATE;
