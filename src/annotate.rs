//! Top-level entry points: annotate a photo, or render a citation alone.
//!
//! Both runs share one temporary work directory for every intermediate
//! (template, PDFs, PNGs). It is removed when the run ends, successfully or
//! not, unless [`CitationConfig::keep_intermediates`] is set, in which case
//! its path is logged and reported in [`AnnotateOutput::intermediates`].

use crate::config::CitationConfig;
use crate::error::PhotociteError;
use crate::output::{AnnotateOutput, ImageInfo, RunStats};
use crate::pipeline::input::{self, Citation};
use crate::pipeline::{compose, layout, probe, render, stage};
use crate::progress::Stage;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use tracing::{info, warn};

const CITATION_PNG: &str = "citation.png";

/// Render `citation` and attach it to the photo at `image`.
///
/// # Arguments
/// * `image`    — local path or HTTP/HTTPS URL of the photo
/// * `citation` — markdown text and where it came from
/// * `output`   — destination; `None` writes `<stem> with citation<ext>`
///   next to the photo
/// * `config`   — run configuration
///
/// The composite is encoded by extension: JPEG output keeps the photo's
/// quality, PNG output uses the configured compression level.
pub async fn annotate(
    image: impl AsRef<str>,
    citation: &Citation,
    output: Option<&Path>,
    config: &CitationConfig,
) -> Result<AnnotateOutput, PhotociteError> {
    let total_start = Instant::now();
    let image = image.as_ref();
    info!("Annotating {} with citation from {}", image, citation.source);
    ensure_not_blank(citation)?;

    // ── Step 1: Resolve the photo ────────────────────────────────────────
    let resolved = input::resolve_image(image, config.download_timeout_secs).await?;
    let photo = resolved.path().to_path_buf();
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_composite_path(&resolved.naming_path()));

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(Stage::COMPOSITE.len());
    }

    // ── Step 2: Probe ────────────────────────────────────────────────────
    let probe_start = Instant::now();
    let info = stage(config, Stage::Probe, probe::probe_image(&photo, config)).await?;
    let probe_duration_ms = probe_start.elapsed().as_millis() as u64;

    // ── Step 3: Plan ─────────────────────────────────────────────────────
    let plan = layout::plan_layout(&info, config);
    info!(
        "Layout: {:?}, citation {} px wide on {} canvas at {} dpi",
        plan.mode,
        plan.citation_width,
        plan.extent(),
        plan.dpi
    );

    let workdir = WorkDir::new(config.keep_intermediates)?;

    // ── Step 4: Typeset the citation ─────────────────────────────────────
    let render_start = Instant::now();
    let citation_png = workdir.path().join(CITATION_PNG);
    render::render_citation(&citation.text, &citation_png, plan.dpi, workdir.path(), config)
        .await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    // ── Step 5: Fit and append ───────────────────────────────────────────
    let compose_start = Instant::now();
    let resized = workdir.path().join(compose::RESIZED_PNG);
    let canvas = workdir.path().join(compose::CANVAS_PNG);
    compose::resize(
        &citation_png,
        &plan.resize_geometry(),
        plan.dpi,
        &resized,
        config,
    )
    .await?;
    compose::place_on_canvas(&resized, &plan, &canvas, config).await?;
    compose::append(&photo, &canvas, &plan, &output_path, config).await?;
    let compose_duration_ms = compose_start.elapsed().as_millis() as u64;

    let intermediates = workdir.finish();

    let stats = RunStats {
        probe_duration_ms,
        render_duration_ms,
        compose_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Created '{}' in {}ms",
        output_path.display(),
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(&output_path);
    }

    Ok(AnnotateOutput {
        output: output_path,
        citation_source: citation.source.to_string(),
        image: Some(info),
        layout: Some(plan),
        intermediates,
        stats,
    })
}

/// Synchronous wrapper around [`annotate`].
///
/// Creates a temporary tokio runtime internally.
pub fn annotate_sync(
    image: impl AsRef<str>,
    citation: &Citation,
    output: Option<&Path>,
    config: &CitationConfig,
) -> Result<AnnotateOutput, PhotociteError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PhotociteError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(annotate(image, citation, output, config))
}

/// Render only the citation image.
///
/// There is no photo to match, so the image is rendered at
/// [`CitationConfig::citation_only_dpi`] unless a DPI is forced. With no
/// `output`, it is named after the citation file (`<stem> citation.png`)
/// or `citation.png` for inline and piped text. ImageMagick encodes by the
/// output's extension, so `-o cite.jpg` yields a JPEG.
pub async fn render_citation_only(
    citation: &Citation,
    output: Option<&Path>,
    config: &CitationConfig,
) -> Result<AnnotateOutput, PhotociteError> {
    let total_start = Instant::now();
    ensure_not_blank(citation)?;

    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_citation_path(citation.source.file()));
    let dpi = config.dpi.unwrap_or(config.citation_only_dpi);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(Stage::CITATION_ONLY.len());
    }

    let workdir = WorkDir::new(config.keep_intermediates)?;
    let rendered = workdir.path().join(rendered_name(&output_path));
    render::render_citation(&citation.text, &rendered, dpi, workdir.path(), config).await?;
    if config.keep_intermediates {
        copy_out(&rendered, &output_path).await?;
    } else {
        compose::commit(&rendered, &output_path).await?;
    }
    let render_duration_ms = total_start.elapsed().as_millis() as u64;

    let intermediates = workdir.finish();

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(&output_path);
    }

    Ok(AnnotateOutput {
        output: output_path,
        citation_source: citation.source.to_string(),
        image: None,
        layout: None,
        intermediates,
        stats: RunStats {
            render_duration_ms,
            total_duration_ms: render_duration_ms,
            ..RunStats::default()
        },
    })
}

/// Measure a photo without rendering anything.
///
/// Needs only ImageMagick, not pandoc or LaTeX.
pub async fn inspect(
    image: impl AsRef<str>,
    config: &CitationConfig,
) -> Result<ImageInfo, PhotociteError> {
    let resolved = input::resolve_image(image.as_ref(), config.download_timeout_secs).await?;
    probe::probe_image(resolved.path(), config).await
}

// ── Output naming ────────────────────────────────────────────────────────

/// `dir/beach.jpg` → `dir/beach with citation.jpg`.
pub fn default_composite_path(photo: &Path) -> PathBuf {
    let stem = photo
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let name = match photo.extension() {
        Some(ext) => format!("{stem} with citation.{}", ext.to_string_lossy()),
        None => format!("{stem} with citation"),
    };
    photo.with_file_name(name)
}

/// `dir/ref.md` → `dir/ref citation.png`; no file → `citation.png`.
pub fn default_citation_path(citation_file: Option<&Path>) -> PathBuf {
    match citation_file {
        Some(file) => {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "citation".to_string());
            file.with_file_name(format!("{stem} citation.png"))
        }
        None => PathBuf::from("citation.png"),
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Work-dir name for a citation-only raster: `citation.<ext of output>`.
fn rendered_name(output: &Path) -> String {
    match output.extension() {
        Some(ext) if !ext.is_empty() => format!("citation.{}", ext.to_string_lossy()),
        _ => CITATION_PNG.to_string(),
    }
}

fn ensure_not_blank(citation: &Citation) -> Result<(), PhotociteError> {
    if citation.is_blank() {
        return Err(PhotociteError::EmptyCitation {
            source_desc: citation.source.to_string(),
        });
    }
    Ok(())
}

async fn copy_out(from: &Path, to: &Path) -> Result<(), PhotociteError> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| PhotociteError::OutputWriteFailed {
                path: to.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|source| PhotociteError::OutputWriteFailed {
            path: to.to_path_buf(),
            source,
        })?;
    Ok(())
}

/// Per-run scratch directory. Deleted on drop unless `keep` was set, in
/// which case it survives failed runs too.
struct WorkDir {
    dir: Option<TempDir>,
    path: PathBuf,
    keep: bool,
}

impl WorkDir {
    fn new(keep: bool) -> Result<Self, PhotociteError> {
        let dir = tempfile::Builder::new()
            .prefix("photocite-")
            .tempdir()
            .map_err(|source| PhotociteError::WorkDir { source })?;
        let path = dir.path().to_path_buf();
        if keep {
            info!("Work directory: {}", path.display());
        }
        Ok(Self {
            dir: Some(dir),
            path,
            keep,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// End the run; returns the directory path if it is being kept.
    fn finish(mut self) -> Option<PathBuf> {
        if self.keep {
            self.release();
            Some(self.path.clone())
        } else {
            None
        }
    }

    fn release(&mut self) {
        if let Some(dir) = self.dir.take() {
            let kept = dir.keep();
            warn!("Keeping intermediate files in {}", kept.display());
        }
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.keep {
            self.release();
        }
    }
}
