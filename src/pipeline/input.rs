//! Input resolution: the photo, and the citation text.
//!
//! ## Photo
//!
//! ImageMagick needs a file-system path. Local paths are validated up front
//! so the user gets "file not found" rather than a magick stack trace; URLs
//! are downloaded into a `TempDir` owned by the returned [`ResolvedImage`],
//! which removes it on drop.
//!
//! ## Citation text
//!
//! The text can come from four places. [`select_citation_source`] applies
//! the precedence (`--cite` file, citation-only positional, standard-mode
//! positional, piped stdin) without reading anything, so the choice itself
//! is testable; [`CitationSource::read`] then loads the text.

use crate::error::PhotociteError;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved photo: a local path or a downloaded temp file.
pub enum ResolvedImage {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the photo was downloaded to a temporary directory.
    /// The `TempDir` is kept alive until processing completes.
    Downloaded {
        path: PathBuf,
        url: String,
        _temp_dir: TempDir,
    },
}

impl ResolvedImage {
    /// Path to the photo regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedImage::Local(p) => p,
            ResolvedImage::Downloaded { path, .. } => path,
        }
    }

    /// Path default output names are derived from: the photo itself when
    /// local, the bare downloaded file name (so output lands in the current
    /// directory) for URLs.
    pub fn naming_path(&self) -> PathBuf {
        match self {
            ResolvedImage::Local(p) => p.clone(),
            ResolvedImage::Downloaded { path, .. } => {
                PathBuf::from(path.file_name().unwrap_or_default())
            }
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the photo argument to a local file path.
pub async fn resolve_image(input: &str, timeout_secs: u64) -> Result<ResolvedImage, PhotociteError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input))
    }
}

fn resolve_local(path: &Path) -> Result<ResolvedImage, PhotociteError> {
    let path = path.to_path_buf();
    if !path.is_file() {
        return Err(PhotociteError::FileNotFound { path });
    }
    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PhotociteError::PermissionDenied { path });
        }
        Err(_) => return Err(PhotociteError::FileNotFound { path }),
    }
    debug!("Resolved local image: {}", path.display());
    Ok(ResolvedImage::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedImage, PhotociteError> {
    info!("Downloading image from: {}", url);

    let failed = |reason: String| PhotociteError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            PhotociteError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    let temp_dir = TempDir::new().map_err(|source| PhotociteError::WorkDir { source })?;
    let file_path = temp_dir.path().join(filename_from_url(url));
    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|source| PhotociteError::WorkDir { source })?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedImage::Downloaded {
        path: file_path,
        url: url.to_string(),
        _temp_dir: temp_dir,
    })
}

/// Last path segment of `url` if it looks like a file name, else `image.jpg`.
pub fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "image.jpg".to_string())
}

// ── Citation text ────────────────────────────────────────────────────────

/// Where citation text is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CitationSource {
    File(PathBuf),
    Text(String),
    Stdin,
}

impl CitationSource {
    /// The citation file, if the text came from one.
    pub fn file(&self) -> Option<&Path> {
        match self {
            CitationSource::File(p) => Some(p),
            _ => None,
        }
    }

    /// Load the text. `stdin` is only read for [`CitationSource::Stdin`].
    pub fn read(&self, stdin: impl Read) -> Result<Citation, PhotociteError> {
        let text = match self {
            CitationSource::File(path) => std::fs::read_to_string(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PhotociteError::CitationFileNotFound { path: path.clone() }
                } else {
                    PhotociteError::Internal(format!(
                        "Failed to read citation file '{}': {e}",
                        path.display()
                    ))
                }
            })?,
            CitationSource::Text(t) => t.clone(),
            CitationSource::Stdin => {
                let mut buf = String::new();
                let mut stdin = stdin;
                stdin
                    .read_to_string(&mut buf)
                    .map_err(|e| PhotociteError::Internal(format!("Failed to read stdin: {e}")))?;
                buf
            }
        };
        Ok(Citation {
            text,
            source: self.clone(),
        })
    }
}

impl fmt::Display for CitationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CitationSource::File(p) => write!(f, "file: {}", p.display()),
            CitationSource::Text(_) => f.write_str("command line argument"),
            CitationSource::Stdin => f.write_str("stdin (piped input)"),
        }
    }
}

/// Citation markdown together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub text: String,
    pub source: CitationSource,
}

impl Citation {
    /// Citation given directly as a string.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            source: CitationSource::Text(text.clone()),
            text,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The arguments that decide where citation text comes from.
#[derive(Debug, Clone, Default)]
pub struct CitationRequest<'a> {
    /// `--cite FILE`
    pub cite_file: Option<&'a Path>,
    /// Citation-only mode: the first positional is the citation.
    pub citation_only: bool,
    /// First positional (photo in standard mode, citation in citation-only mode).
    pub first: Option<&'a str>,
    /// Second positional (citation text in standard mode).
    pub second: Option<&'a str>,
    /// Whether stdin is piped rather than a terminal.
    pub stdin_piped: bool,
}

/// Pick the citation source by precedence.
pub fn select_citation_source(req: &CitationRequest<'_>) -> Result<CitationSource, PhotociteError> {
    if let Some(path) = req.cite_file {
        if !path.exists() {
            return Err(PhotociteError::CitationFileNotFound {
                path: path.to_path_buf(),
            });
        }
        return Ok(CitationSource::File(path.to_path_buf()));
    }

    if req.citation_only {
        if let Some(arg) = req.first {
            let candidate = Path::new(arg);
            return Ok(if candidate.is_file() {
                CitationSource::File(candidate.to_path_buf())
            } else {
                CitationSource::Text(arg.to_string())
            });
        }
    } else if let Some(text) = req.second {
        return Ok(CitationSource::Text(text.to_string()));
    }

    if req.stdin_piped {
        return Ok(CitationSource::Stdin);
    }

    Err(PhotociteError::NoCitationText)
}
