//! Citation typesetting: markdown → PDF → cropped PDF → PNG.
//!
//! pandoc turns the markdown into a one-page PDF through the LaTeX template,
//! pdfcrop trims the page down to the ink plus a fixed margin, and
//! ImageMagick rasterises the crop at the requested density with the alpha
//! channel flattened onto the background colour.
//!
//! All three intermediates live in the run's work directory; only the final
//! PNG path is chosen by the caller.

use crate::config::CitationConfig;
use crate::error::PhotociteError;
use crate::pipeline::stage;
use crate::pipeline::tools::{pandoc_args, pdfcrop_args, rasterise_args, ToolCommand};
use crate::progress::Stage;
use std::path::{Path, PathBuf};
use tracing::info;

/// File names used inside the work directory.
pub const TEMPLATE_FILE: &str = "template.tex";
pub const RENDERED_PDF: &str = "citation.pdf";
pub const CROPPED_PDF: &str = "citation-cropped.pdf";

/// Render `markdown` to a PNG at `output_png` with the given density.
///
/// The caller owns `workdir`; nothing is deleted here so debug runs can
/// keep every intermediate.
pub async fn render_citation(
    markdown: &str,
    output_png: &Path,
    dpi: u32,
    workdir: &Path,
    config: &CitationConfig,
) -> Result<PathBuf, PhotociteError> {
    let template_path = workdir.join(TEMPLATE_FILE);
    let pdf_path = workdir.join(RENDERED_PDF);
    let cropped_path = workdir.join(CROPPED_PDF);

    tokio::fs::write(&template_path, config.template())
        .await
        .map_err(|source| PhotociteError::WorkDir { source })?;

    stage(config, Stage::RenderPdf, async {
        ToolCommand::new(&config.tools.pandoc, config.tool_timeout_secs)
            .args(pandoc_args(&config.tools.pdf_engine, &template_path, &pdf_path))
            .stdin(markdown.as_bytes())
            .run()
            .await
    })
    .await?;

    stage(config, Stage::Crop, async {
        ToolCommand::new(&config.tools.pdfcrop, config.tool_timeout_secs)
            .args(pdfcrop_args(config.crop_margin, &pdf_path, &cropped_path))
            .run()
            .await
    })
    .await?;

    stage(config, Stage::Rasterise, async {
        ToolCommand::new(&config.tools.magick, config.tool_timeout_secs)
            .args(rasterise_args(
                dpi,
                &cropped_path,
                &config.background,
                output_png,
            ))
            .run()
            .await
    })
    .await?;

    info!("Rendered citation at {} dpi → {}", dpi, output_png.display());
    Ok(output_png.to_path_buf())
}
