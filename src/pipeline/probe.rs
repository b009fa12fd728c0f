//! Photo measurements: pixel size, resolution and JPEG quality.
//!
//! Dimensions come from the `image` crate when it can read the header
//! (no subprocess, no full decode). Anything it cannot read, and the DPI
//! and quality fields it does not expose, go through `magick identify`.
//!
//! DPI and quality are best-effort: a photo straight off a phone often has
//! no density tag, and PNGs have no quality at all. Those cases fall back to
//! the configured defaults with a warning rather than failing the run.

use crate::config::{CitationConfig, MAX_DPI, MIN_DPI};
use crate::error::PhotociteError;
use crate::output::ImageInfo;
use crate::pipeline::tools::{identify_args, identify_verbose_args, ToolCommand};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, warn};

static QUALITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Quality: (\d+)").expect("static regex"));

static DIMENSIONS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)x(\d+)").expect("static regex"));

/// Probe everything the layout stage needs.
pub async fn probe_image(path: &Path, config: &CitationConfig) -> Result<ImageInfo, PhotociteError> {
    let (width, height) = dimensions(path, config).await?;
    let format = format_name(path, config).await.unwrap_or_default();
    let dpi = dpi(path, config).await;
    let quality = quality_for_format(path, &format, config).await;

    debug!(
        "Probed {}: {}x{} px, {} dpi, quality {}, format {:?}",
        path.display(),
        width,
        height,
        dpi,
        quality,
        format
    );

    Ok(ImageInfo {
        width,
        height,
        dpi,
        quality,
        format,
    })
}

/// Pixel width and height of the first frame.
pub async fn dimensions(path: &Path, config: &CitationConfig) -> Result<(u32, u32), PhotociteError> {
    match image::image_dimensions(path) {
        Ok(dims) => return Ok(dims),
        Err(e) => debug!(
            "image crate could not read {} ({e}); asking magick",
            path.display()
        ),
    }

    let out = ToolCommand::new(&config.tools.magick, config.tool_timeout_secs)
        .args(identify_args("%wx%h\\n", path))
        .run()
        .await?;

    parse_dimensions(&out).ok_or_else(|| PhotociteError::ProbeFailed {
        what: "dimensions",
        path: path.to_path_buf(),
        detail: format!("unexpected identify output {:?}", out.trim()),
    })
}

/// Horizontal resolution in DPI, or `config.fallback_dpi`.
pub async fn dpi(path: &Path, config: &CitationConfig) -> u32 {
    let out = ToolCommand::new(&config.tools.magick, config.tool_timeout_secs)
        .args(identify_args("%x\\n", path))
        .run()
        .await;

    match out.map(|s| parse_resolution(&s)) {
        Ok(Some(dpi)) if dpi > 0 => {
            let clamped = dpi.clamp(MIN_DPI, MAX_DPI);
            if clamped != dpi {
                warn!(
                    "Resolution {} of {} is out of range; using {} dpi",
                    dpi,
                    path.display(),
                    clamped
                );
            }
            clamped
        }
        Ok(_) => {
            warn!(
                "No usable resolution in {}; using default {} dpi",
                path.display(),
                config.fallback_dpi
            );
            config.fallback_dpi
        }
        Err(e) => {
            warn!(
                "Could not determine DPI of {} ({e}); using default {} dpi",
                path.display(),
                config.fallback_dpi
            );
            config.fallback_dpi
        }
    }
}

/// ImageMagick's format name for the file ("JPEG", "PNG", ...).
pub async fn format_name(path: &Path, config: &CitationConfig) -> Option<String> {
    ToolCommand::new(&config.tools.magick, config.tool_timeout_secs)
        .args(identify_args("%m\\n", path))
        .run()
        .await
        .ok()
        .and_then(|s| s.lines().next().map(|l| l.trim().to_string()))
        .filter(|s| !s.is_empty())
}

/// JPEG quality, or `config.fallback_quality`.
pub async fn quality(path: &Path, config: &CitationConfig) -> u8 {
    let format = format_name(path, config).await.unwrap_or_default();
    quality_for_format(path, &format, config).await
}

async fn quality_for_format(path: &Path, format: &str, config: &CitationConfig) -> u8 {
    if !is_jpeg(format) {
        return config.fallback_quality;
    }
    match ToolCommand::new(&config.tools.magick, config.tool_timeout_secs)
        .args(identify_verbose_args(path))
        .run()
        .await
    {
        Ok(out) => parse_quality(&out).unwrap_or(config.fallback_quality),
        Err(e) => {
            warn!("Could not read JPEG quality of {}: {e}", path.display());
            config.fallback_quality
        }
    }
}

fn is_jpeg(format: &str) -> bool {
    matches!(format, "JPEG" | "JPG")
}

// ── Parsers ──────────────────────────────────────────────────────────────

/// Parse `"<w>x<h>"` from the first line of identify output.
pub fn parse_dimensions(out: &str) -> Option<(u32, u32)> {
    let line = out.lines().next()?;
    let caps = DIMENSIONS_RE.captures(line)?;
    let w = caps[1].parse().ok()?;
    let h = caps[2].parse().ok()?;
    Some((w, h))
}

/// Parse identify's `%x`: `"72"`, `"72 PixelsPerInch"`, `"300.00"` or
/// `"28.35 PixelsPerCentimeter"`. Returns whole dots per inch.
pub fn parse_resolution(out: &str) -> Option<u32> {
    let line = out.lines().next()?.trim();
    let mut parts = line.split_whitespace();
    let value: f64 = parts.next()?.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let per_inch = match parts.next() {
        Some(unit) if unit.eq_ignore_ascii_case("PixelsPerCentimeter") => value * 2.54,
        _ => value,
    };
    Some(per_inch.round() as u32)
}

/// Find `Quality: NN` in `identify -verbose` output.
pub fn parse_quality(out: &str) -> Option<u8> {
    let caps = QUALITY_RE.captures(out)?;
    let q: u32 = caps[1].parse().ok()?;
    u8::try_from(q.min(100)).ok()
}
