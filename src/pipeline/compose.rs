//! Composition: fit the rendered citation to the photo and join them.
//!
//! Three `magick` calls, each writing a fresh file:
//! resize the citation to the planned width, center it on a canvas of the
//! planned extent, then append the canvas to the photo. The composite is
//! written to a partial file beside the destination and renamed into place,
//! so an interrupted run never leaves a truncated image under the final name.

use crate::config::CitationConfig;
use crate::error::PhotociteError;
use crate::output::LayoutPlan;
use crate::pipeline::stage;
use crate::pipeline::tools::{append_args, canvas_args, encoding_args, resize_args, ToolCommand};
use crate::progress::Stage;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const RESIZED_PNG: &str = "citation-resized.png";
pub const CANVAS_PNG: &str = "citation-canvas.png";

/// Resize `input` to `geometry` (see [`LayoutPlan::resize_geometry`]) and
/// tag it with `dpi`. The aspect ratio is always preserved.
pub async fn resize(
    input: &Path,
    geometry: &str,
    dpi: u32,
    output: &Path,
    config: &CitationConfig,
) -> Result<(), PhotociteError> {
    stage(config, Stage::Resize, async {
        ToolCommand::new(&config.tools.magick, config.tool_timeout_secs)
            .args(resize_args(input, geometry, dpi, output))
            .run()
            .await
    })
    .await?;
    Ok(())
}

/// Center `input` on a background canvas of `plan.extent()`.
pub async fn place_on_canvas(
    input: &Path,
    plan: &LayoutPlan,
    output: &Path,
    config: &CitationConfig,
) -> Result<(), PhotociteError> {
    let extent = plan.extent();
    stage(config, Stage::Canvas, async {
        ToolCommand::new(&config.tools.magick, config.tool_timeout_secs)
            .args(canvas_args(
                input,
                &config.background,
                &extent,
                plan.dpi,
                output,
            ))
            .run()
            .await
    })
    .await?;
    Ok(())
}

/// Join `photo` and `citation` in the plan's direction and write `output`
/// atomically.
pub async fn append(
    photo: &Path,
    citation: &Path,
    plan: &LayoutPlan,
    output: &Path,
    config: &CitationConfig,
) -> Result<(), PhotociteError> {
    let partial = partial_path(output);
    let encoding = encoding_args(output, plan.quality, config.png_compression_level);

    let result = stage(config, Stage::Append, async {
        ToolCommand::new(&config.tools.magick, config.tool_timeout_secs)
            .args(append_args(photo, citation, plan.direction, encoding, &partial))
            .run()
            .await
    })
    .await;

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }

    commit(&partial, output).await
}

/// Move a finished file from `from` to `to`, creating parent directories.
///
/// Falls back to copy + delete when the two paths are on different
/// filesystems (the work directory usually lives under `/tmp`).
pub async fn commit(from: &Path, to: &Path) -> Result<(), PhotociteError> {
    let write_err = |source| PhotociteError::OutputWriteFailed {
        path: to.to_path_buf(),
        source,
    };

    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    debug!("rename {} → {} failed; copying", from.display(), to.display());
    tokio::fs::copy(from, to).await.map_err(write_err)?;
    let _ = tokio::fs::remove_file(from).await;
    Ok(())
}

/// `dir/name.ext` → `dir/.name.partial.ext`. The extension is kept because
/// ImageMagick picks the encoder from it.
pub fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match output.extension() {
        Some(ext) => format!(".{stem}.partial.{}", ext.to_string_lossy()),
        None => format!(".{stem}.partial"),
    };
    output.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_keeps_extension() {
        assert_eq!(
            partial_path(Path::new("/photos/beach with citation.jpg")),
            PathBuf::from("/photos/.beach with citation.partial.jpg")
        );
        assert_eq!(
            partial_path(Path::new("out.png")),
            PathBuf::from(".out.partial.png")
        );
        assert_eq!(partial_path(Path::new("out")), PathBuf::from(".out.partial"));
    }

    #[tokio::test]
    async fn commit_moves_file_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a.png");
        let to = dir.path().join("nested/deeper/b.png");
        std::fs::write(&from, b"png bytes").unwrap();

        commit(&from, &to).await.unwrap();

        assert!(!from.exists());
        assert_eq!(std::fs::read(&to).unwrap(), b"png bytes");
    }

    #[tokio::test]
    async fn commit_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = commit(&dir.path().join("nope.png"), &dir.path().join("out.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, PhotociteError::OutputWriteFailed { .. }));
    }
}
