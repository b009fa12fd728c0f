//! Error types for the photocite library.
//!
//! Every failure in the pipeline is fatal: a composite with a half-rendered
//! caption is worse than no composite at all. [`PhotociteError`] therefore
//! covers the whole run, grouped by the stage that produced it.
//!
//! Recoverable oddities (a photo without DPI metadata, a PNG with no JPEG
//! quality) never surface here. The probe stage logs a warning and falls
//! back to the configured default instead.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the photocite library.
#[derive(Debug, Error)]
pub enum PhotociteError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The source photo was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The `--cite` file does not exist.
    #[error("Citation file '{path}' does not exist.")]
    CitationFileNotFound { path: PathBuf },

    /// No citation argument was given and stdin is a terminal.
    #[error(
        "No citation text provided. Please provide it as an argument, \
from a file with --cite, or pipe it to stdin."
    )]
    NoCitationText,

    /// The citation text is empty after trimming whitespace.
    #[error("Citation text from {source_desc} is empty")]
    EmptyCitation { source_desc: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Tool errors ───────────────────────────────────────────────────────
    /// The external program could not be started at all.
    #[error(
        "'{tool}' was not found on PATH.\n\
photocite needs pandoc (with xelatex), pdfcrop and ImageMagick 7 (`magick`).\n\
Override a location with PHOTOCITE_PANDOC, PHOTOCITE_PDFCROP or PHOTOCITE_MAGICK."
    )]
    ToolNotFound { tool: String },

    /// The external program ran and exited with a failure status.
    #[error("'{tool}' failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    /// The external program did not finish within the configured timeout.
    #[error("'{tool}' timed out after {secs}s\nIncrease --tool-timeout.")]
    ToolTimeout { tool: String, secs: u64 },

    /// A tool ran successfully but its output could not be interpreted.
    #[error("Could not read {what} of '{path}': {detail}")]
    ProbeFailed {
        what: &'static str,
        path: PathBuf,
        detail: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the temporary work directory or one of its files.
    #[error("Failed to prepare work directory: {source}")]
    WorkDir {
        #[source]
        source: std::io::Error,
    },

    /// Could not move the finished image into place.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PhotociteError {
    /// True when the error means a required external program is unusable,
    /// as opposed to bad input.
    pub fn is_tool_error(&self) -> bool {
        matches!(
            self,
            PhotociteError::ToolNotFound { .. }
                | PhotociteError::ToolFailed { .. }
                | PhotociteError::ToolTimeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failed_display() {
        let e = PhotociteError::ToolFailed {
            tool: "pdfcrop".into(),
            status: "exit status: 1".into(),
            stderr: "!!! Error: Input file `x.pdf' not found!".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("pdfcrop"), "got: {msg}");
        assert!(msg.contains("exit status: 1"), "got: {msg}");
    }

    #[test]
    fn tool_not_found_mentions_override() {
        let e = PhotociteError::ToolNotFound {
            tool: "magick".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("'magick'"));
        assert!(msg.contains("PHOTOCITE_MAGICK"));
        assert!(e.is_tool_error());
    }

    #[test]
    fn no_citation_text_matches_cli_wording() {
        let msg = PhotociteError::NoCitationText.to_string();
        assert!(msg.starts_with("No citation text provided."));
        assert!(msg.contains("--cite"));
    }

    #[test]
    fn citation_file_display() {
        let e = PhotociteError::CitationFileNotFound {
            path: PathBuf::from("missing.md"),
        };
        assert_eq!(e.to_string(), "Citation file 'missing.md' does not exist.");
        assert!(!e.is_tool_error());
    }

    #[test]
    fn timeout_display() {
        let e = PhotociteError::ToolTimeout {
            tool: "pandoc".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }
}
