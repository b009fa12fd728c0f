//! Subprocess plumbing: run one external tool and collect its output.
//!
//! Every transformation in the pipeline is a single invocation of pandoc,
//! pdfcrop or ImageMagick. [`ToolCommand`] wraps `tokio::process::Command`
//! with the things each call needs: optional stdin payload, captured
//! stderr for error messages, a timeout, and `kill_on_drop` so a timed-out
//! child never outlives the run.
//!
//! The argument lists are built by pure functions at the bottom of this
//! module so they can be unit-tested without any of the tools installed.

use crate::error::PhotociteError;
use crate::output::AppendDirection;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// One external program invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
    stdin: Option<Vec<u8>>,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Bytes written to the child's stdin, which is then closed.
    pub fn stdin(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(bytes.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arg_list(&self) -> &[OsString] {
        &self.args
    }

    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        let mut s = self.program.clone();
        for a in &self.args {
            s.push(' ');
            let a = a.to_string_lossy();
            if a.contains(' ') {
                s.push('\'');
                s.push_str(&a);
                s.push('\'');
            } else {
                s.push_str(&a);
            }
        }
        s
    }

    /// Run to completion and return stdout (lossily decoded).
    pub async fn run(&self) -> Result<String, PhotociteError> {
        debug!("Running: {}", self.display());
        let start = Instant::now();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PhotociteError::ToolNotFound {
                    tool: self.program.clone(),
                }
            } else {
                PhotociteError::ToolFailed {
                    tool: self.program.clone(),
                    status: "could not start".to_string(),
                    stderr: e.to_string(),
                }
            }
        })?;

        // Feed stdin while the child runs; a large payload would otherwise
        // deadlock against a child blocked on a full stdout pipe.
        let pipe = child.stdin.take();
        let payload = self.stdin.clone();
        let feed = async move {
            if let (Some(mut pipe), Some(data)) = (pipe, payload) {
                pipe.write_all(&data).await?;
                pipe.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };

        let finished = tokio::time::timeout(self.timeout, async move {
            tokio::join!(feed, child.wait_with_output())
        })
        .await
        .map_err(|_| PhotociteError::ToolTimeout {
            tool: self.program.clone(),
            secs: self.timeout.as_secs(),
        })?;

        let (fed, output) = finished;
        let output = output.map_err(|e| PhotociteError::ToolFailed {
            tool: self.program.clone(),
            status: "wait failed".to_string(),
            stderr: e.to_string(),
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(PhotociteError::ToolFailed {
                tool: self.program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }
        if let Err(e) = fed {
            return Err(PhotociteError::ToolFailed {
                tool: self.program.clone(),
                status: "stdin closed early".to_string(),
                stderr: e.to_string(),
            });
        }
        if !stderr.is_empty() {
            warn!("{} wrote to stderr: {}", self.program, stderr);
        }

        debug!(
            "{} finished in {}ms",
            self.program,
            start.elapsed().as_millis()
        );
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ── Argument builders ────────────────────────────────────────────────────

fn os(p: &Path) -> OsString {
    p.as_os_str().to_os_string()
}

/// `pandoc -f markdown --pdf-engine=<engine> --template <tex> -o <pdf>`; the
/// markdown itself arrives on stdin.
pub fn pandoc_args(pdf_engine: &str, template: &Path, out_pdf: &Path) -> Vec<OsString> {
    vec![
        "-f".into(),
        "markdown".into(),
        format!("--pdf-engine={pdf_engine}").into(),
        "--template".into(),
        os(template),
        "-o".into(),
        os(out_pdf),
    ]
}

/// `pdfcrop --quiet --margins <m> <in> <out>`
pub fn pdfcrop_args(margin: u32, input: &Path, output: &Path) -> Vec<OsString> {
    vec![
        "--quiet".into(),
        "--margins".into(),
        margin.to_string().into(),
        os(input),
        os(output),
    ]
}

/// `magick -density <dpi> <pdf> -background <bg> -alpha remove -alpha off <png>`
pub fn rasterise_args(dpi: u32, pdf: &Path, background: &str, png: &Path) -> Vec<OsString> {
    vec![
        "-density".into(),
        dpi.to_string().into(),
        os(pdf),
        "-background".into(),
        background.into(),
        "-alpha".into(),
        "remove".into(),
        "-alpha".into(),
        "off".into(),
        os(png),
    ]
}

/// `magick identify -format <fmt> <path>`
pub fn identify_args(format: &str, path: &Path) -> Vec<OsString> {
    vec!["identify".into(), "-format".into(), format.into(), os(path)]
}

/// `magick identify -verbose <path>`
pub fn identify_verbose_args(path: &Path) -> Vec<OsString> {
    vec!["identify".into(), "-verbose".into(), os(path)]
}

/// `magick <in> -resize <geometry> -density <dpi> <out>`
pub fn resize_args(input: &Path, geometry: &str, dpi: u32, output: &Path) -> Vec<OsString> {
    vec![
        os(input),
        "-resize".into(),
        geometry.into(),
        "-density".into(),
        dpi.to_string().into(),
        os(output),
    ]
}

/// `magick <in> -gravity center -background <bg> -extent <geom> -density <dpi> <out>`
pub fn canvas_args(
    input: &Path,
    background: &str,
    extent: &str,
    dpi: u32,
    output: &Path,
) -> Vec<OsString> {
    vec![
        os(input),
        "-gravity".into(),
        "center".into(),
        "-background".into(),
        background.into(),
        "-extent".into(),
        extent.into(),
        "-density".into(),
        dpi.to_string().into(),
        os(output),
    ]
}

/// Encoder options chosen from the output file's extension.
pub fn encoding_args(output: &Path, quality: u8, png_compression_level: u8) -> Vec<OsString> {
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => vec!["-quality".into(), quality.to_string().into()],
        "png" => vec![
            "-define".into(),
            format!("png:compression-level={png_compression_level}").into(),
        ],
        _ => Vec::new(),
    }
}

/// `magick <photo> <citation> (-append|+append) [encoding...] <out>`
pub fn append_args(
    photo: &Path,
    citation: &Path,
    direction: AppendDirection,
    encoding: Vec<OsString>,
    output: &Path,
) -> Vec<OsString> {
    let mut args = vec![os(photo), os(citation), direction.magick_flag().into()];
    args.extend(encoding);
    args.push(os(output));
    args
}
