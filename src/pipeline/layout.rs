//! Sizing and placement: how big the citation is and where it goes.
//!
//! This stage is pure arithmetic over the probed [`ImageInfo`]; it never
//! touches the filesystem, so every rule below is unit-tested directly.
//!
//! ## Rules
//!
//! - A photo is landscape iff it is strictly wider than tall. Squares are
//!   portrait.
//! - Stacked: the citation is resized to `⌊width × factor⌋` (0.50 landscape,
//!   0.80 portrait), centered on a canvas as wide as the photo, and appended
//!   below it. A landscape caption at full width would dominate the frame;
//!   a portrait one at half width wraps into a tall narrow block.
//! - Side-by-side: the citation panel is `⌊width × portrait factor⌋` wide and
//!   exactly as tall as the photo, appended on the right.
//! - `Auto` picks side-by-side only for tall strips (height/width at or
//!   above the configured threshold), where a caption underneath would
//!   make the composite even taller.
//! - The output DPI is the configured override or the photo's own, so the
//!   caption prints at the same physical scale as the picture.

use crate::config::{CitationConfig, LayoutMode};
use crate::output::{AppendDirection, ImageInfo, LayoutPlan};

/// Decide the concrete layout for `info`.
pub fn plan_layout(info: &ImageInfo, config: &CitationConfig) -> LayoutPlan {
    let mode = resolve_mode(info, config);
    let dpi = config.dpi.unwrap_or(info.dpi);

    match mode {
        LayoutMode::SideBySide => {
            let citation_width = scaled(info.width, config.portrait_width_factor);
            LayoutPlan {
                mode,
                citation_width,
                canvas_width: citation_width,
                canvas_height: Some(info.height.max(1)),
                direction: AppendDirection::Horizontal,
                dpi,
                quality: info.quality,
            }
        }
        LayoutMode::Stacked | LayoutMode::Auto => LayoutPlan {
            mode: LayoutMode::Stacked,
            citation_width: scaled(info.width, width_factor(info, config)),
            canvas_width: info.width.max(1),
            canvas_height: None,
            direction: AppendDirection::Vertical,
            dpi,
            quality: info.quality,
        },
    }
}

/// Resolve [`LayoutMode::Auto`] against the photo's shape.
pub fn resolve_mode(info: &ImageInfo, config: &CitationConfig) -> LayoutMode {
    match config.layout {
        LayoutMode::Auto => {
            if info.aspect_ratio() >= config.side_by_side_threshold {
                LayoutMode::SideBySide
            } else {
                LayoutMode::Stacked
            }
        }
        fixed => fixed,
    }
}

/// Stacked-mode citation width as a fraction of photo width.
pub fn width_factor(info: &ImageInfo, config: &CitationConfig) -> f64 {
    if info.is_landscape() {
        config.landscape_width_factor
    } else {
        config.portrait_width_factor
    }
}

fn scaled(width: u32, factor: f64) -> u32 {
    ((width as f64 * factor).floor() as u32).max(1)
}
