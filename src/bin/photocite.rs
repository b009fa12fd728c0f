//! CLI binary for photocite.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `CitationConfig`, picks the citation source and prints the result.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use photocite::{
    annotate, inspect, render_citation_only, select_citation_source, CitationConfig,
    CitationRequest, LayoutMode, PipelineProgressCallback, ProgressCallback,
    Stage,
};
use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner on stderr that ticks one step per pipeline stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:24.green/238}] {pos}/{len}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("photocite");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_stages: usize) {
        self.bar.set_length(total_stages as u64);
    }

    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{}…", stage.label()));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<22} {}",
            green("✓"),
            stage.label(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _output: &Path) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"By default, the citation will be appended to the original image.
The output will be saved as "<original_image> with citation<extension>".

EXAMPLES:
  1. Standard mode:
       photocite image.jpg "Citation text"
     The first argument is the image file, followed by citation text.

  2. Citation-only mode from a file:
       photocite --citation-only b.md

  3. Citation-only mode with direct text:
       photocite --citation-only "Citation text"

  4. Piped input:
       cat citation.md | photocite image.jpg
       cat citation.md | photocite --citation-only

  5. Side-by-side layout with a custom template:
       photocite --layout side-by-side -l caption.tex tall.png -c ref.md

REQUIRED TOOLS:
  pandoc, xelatex, pdfcrop (TeX Live) and ImageMagick 7 (`magick`).

ENVIRONMENT VARIABLES:
  PHOTOCITE_PANDOC        Path to pandoc
  PHOTOCITE_PDFCROP       Path to pdfcrop
  PHOTOCITE_MAGICK        Path to magick
  PHOTOCITE_PDF_ENGINE    LaTeX engine for pandoc (default: xelatex)
  RUST_LOG                Log filter, overrides --debug / --quiet
"#;

/// Add citation text to an image, or generate a citation image only.
#[derive(Parser, Debug)]
#[command(
    name = "photocite",
    version,
    about = "Add citation text to an image, or generate a citation image only",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Standard mode: the image file (path or URL). Citation-only mode: citation file or text.
    image: Option<String>,

    /// Citation text in markdown format (standard mode only).
    citation_text: Option<String>,

    /// Only generate the citation image, without appending it to a photo.
    #[arg(long = "citation-only", visible_alias = "co")]
    citation_only: bool,

    /// Path to a custom LaTeX template for pandoc.
    #[arg(short, long, env = "PHOTOCITE_TEMPLATE")]
    latex: Option<PathBuf>,

    /// Custom output filename.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Read citation text from this file (markdown format).
    #[arg(short, long)]
    cite: Option<PathBuf>,

    /// Debug mode: verbose logs and keep intermediate files.
    #[arg(short, long, env = "PHOTOCITE_DEBUG")]
    debug: bool,

    /// Caption placement: auto, stacked or side-by-side.
    #[arg(long, env = "PHOTOCITE_LAYOUT", value_enum, default_value = "auto")]
    layout: LayoutArg,

    /// Force the output DPI instead of using the photo's.
    #[arg(long, env = "PHOTOCITE_DPI",
          value_parser = clap::value_parser!(u32).range(36..=1200))]
    dpi: Option<u32>,

    /// Per-tool timeout in seconds.
    #[arg(long, env = "PHOTOCITE_TOOL_TIMEOUT", default_value_t = 120)]
    tool_timeout: u64,

    /// HTTP download timeout in seconds (URL images).
    #[arg(long, env = "PHOTOCITE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print photo measurements only; no citation is rendered.
    #[arg(long)]
    inspect_only: bool,

    /// Print the run result as JSON.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PHOTOCITE_NO_PROGRESS")]
    no_progress: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum LayoutArg {
    Auto,
    Stacked,
    SideBySide,
}

impl From<LayoutArg> for LayoutMode {
    fn from(v: LayoutArg) -> Self {
        match v {
            LayoutArg::Auto => LayoutMode::Auto,
            LayoutArg::Stacked => LayoutMode::Stacked,
            LayoutArg::SideBySide => LayoutMode::SideBySide,
        }
    }
}

/// Accept the historical single-dash `-co` spelling, which clap would
/// otherwise read as `-c o`.
fn normalise_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|a| {
            if a == "-co" {
                OsString::from("--citation-only")
            } else {
                a
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_from(normalise_args(std::env::args_os()));

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.debug;
    let filter = if cli.debug {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if !cli.citation_only && cli.image.is_none() {
        Cli::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "In standard mode, you must provide an image file as the first argument",
            )
            .exit();
    }
    tracing::debug!("Arguments: {:?}", cli);

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let image = cli
            .image
            .as_deref()
            .context("--inspect-only needs an image argument")?;
        let config = build_config(&cli, None).await?;
        let info = inspect(image, &config)
            .await
            .context("Failed to inspect image")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize image info")?
            );
        } else {
            println!("File:         {}", image);
            println!("Size:         {}x{} px", info.width, info.height);
            println!("DPI:          {}", info.dpi);
            println!("Quality:      {}", info.quality);
            if !info.format.is_empty() {
                println!("Format:       {}", info.format);
            }
            let plan = photocite::plan_layout(&info, &config);
            println!(
                "Layout:       {:?}, citation {} px on {} canvas",
                plan.mode,
                plan.citation_width,
                plan.extent()
            );
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Citation text ────────────────────────────────────────────────────
    let request = CitationRequest {
        cite_file: cli.cite.as_deref(),
        citation_only: cli.citation_only,
        first: cli.image.as_deref(),
        second: cli.citation_text.as_deref(),
        stdin_piped: !io::stdin().is_terminal(),
    };
    let source = select_citation_source(&request)?;
    let citation = source.read(io::stdin().lock())?;

    // ── Run ──────────────────────────────────────────────────────────────
    let result = if cli.citation_only {
        render_citation_only(&citation, cli.output.as_deref(), &config)
            .await
            .context("Failed to generate citation image")?
    } else {
        let image = cli.image.as_deref().unwrap_or_default();
        annotate(image, &citation, cli.output.as_deref(), &config)
            .await
            .with_context(|| format!("Failed to create output for '{image}'"))?
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        let out = result.output.display().to_string();
        if cli.citation_only {
            println!(
                "Citation only mode: Generated citation file at '{}' using text from {}",
                out, result.citation_source
            );
        } else {
            println!(
                "Created '{}' using citation text from {}",
                out, result.citation_source
            );
        }
        if let Some(ref dir) = result.intermediates {
            eprintln!("   {} {}", dim("intermediates kept in"), bold(&dir.display().to_string()));
        }
        if show_progress {
            eprintln!(
                "{} {}",
                green("✔"),
                dim(&format!("{}ms total", result.stats.total_duration_ms))
            );
        }
    }

    Ok(())
}

/// Map CLI args to `CitationConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<CitationConfig> {
    let mut builder = CitationConfig::builder()
        .layout(cli.layout.clone().into())
        .keep_intermediates(cli.debug)
        .tool_timeout_secs(cli.tool_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(template) = load_template(cli.latex.as_deref()).await? {
        builder = builder.template(template);
    }
    if let Some(dpi) = cli.dpi {
        builder = builder.dpi(dpi);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Read a `--latex` template. A missing file falls back to the built-in
/// template.
async fn load_template(path: Option<&Path>) -> Result<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    if !path.exists() {
        tracing::warn!(
            "LaTeX template '{}' does not exist; using the built-in template",
            path.display()
        );
        return Ok(None);
    }
    let template = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read LaTeX template from {:?}", path))?;
    Ok(Some(template))
}
