//! Pipeline stages for photo annotation.
//!
//! Each submodule implements one transformation step. Every step except
//! [`layout`] is a thin wrapper over an external program run through
//! [`tools::ToolCommand`].
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ probe ──▶ layout ──▶ render ──▶ compose
//! (path/URL) (identify) (sizes)  (pandoc,   (resize, canvas,
//!                                 pdfcrop,   append)
//!                                 magick)
//! ```
//!
//! 1. [`input`]   — resolve the photo path or URL; choose the citation source
//! 2. [`probe`]   — pixel size, DPI and JPEG quality of the photo
//! 3. [`layout`]  — pure sizing rules: caption width, canvas, direction
//! 4. [`render`]  — typeset the citation markdown into a cropped PNG
//! 5. [`compose`] — fit the PNG to the photo and write the composite

pub mod compose;
pub mod input;
pub mod layout;
pub mod probe;
pub mod render;
pub mod tools;

use crate::config::CitationConfig;
use crate::error::PhotociteError;
use crate::progress::Stage;
use std::future::Future;
use std::time::Instant;
use tracing::info;

/// Run one stage, reporting start/finish to the progress callback.
pub(crate) async fn stage<T, F>(
    config: &CitationConfig,
    stage: Stage,
    work: F,
) -> Result<T, PhotociteError>
where
    F: Future<Output = Result<T, PhotociteError>>,
{
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
    let start = Instant::now();
    let value = work.await?;
    let elapsed_ms = start.elapsed().as_millis() as u64;
    info!("{} done in {}ms", stage.label(), elapsed_ms);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, elapsed_ms);
    }
    Ok(value)
}
