//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::CitationConfigBuilder::progress_callback`] to be told
//! when each external tool starts and finishes. The CLI uses it to drive a
//! spinner; library users can forward the events wherever they like.
//!
//! # Example
//!
//! ```rust
//! use photocite::{CitationConfig, PipelineProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl PipelineProgressCallback for Printer {
//!     fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
//!         eprintln!("{} done in {elapsed_ms}ms", stage.label());
//!     }
//! }
//!
//! let config = CitationConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// One step of the pipeline. Each maps to a single external tool call,
/// except [`Stage::Probe`] which may issue several `magick identify` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Probe,
    RenderPdf,
    Crop,
    Rasterise,
    Resize,
    Canvas,
    Append,
}

impl Stage {
    /// Stages run when only a citation image is produced.
    pub const CITATION_ONLY: [Stage; 3] = [Stage::RenderPdf, Stage::Crop, Stage::Rasterise];

    /// Stages run for a full composite.
    pub const COMPOSITE: [Stage; 7] = [
        Stage::Probe,
        Stage::RenderPdf,
        Stage::Crop,
        Stage::Rasterise,
        Stage::Resize,
        Stage::Canvas,
        Stage::Append,
    ];

    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Probe => "probing photo",
            Stage::RenderPdf => "typesetting citation",
            Stage::Crop => "cropping PDF",
            Stage::Rasterise => "rasterising citation",
            Stage::Resize => "resizing citation",
            Stage::Canvas => "centering citation",
            Stage::Append => "writing composite",
        }
    }
}

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once before the first stage.
    fn on_run_start(&self, total_stages: usize) {
        let _ = total_stages;
    }

    /// Called just before the stage's tool is spawned.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when the stage finished successfully.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called once the output file is in place.
    fn on_run_complete(&self, output: &Path) {
        let _ = output;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CitationConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl PipelineProgressCallback for Recorder {
        fn on_run_start(&self, total_stages: usize) {
            self.events.lock().unwrap().push(format!("start {total_stages}"));
        }

        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("> {stage:?}"));
        }

        fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
            self.events.lock().unwrap().push(format!("< {stage:?}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(7);
        cb.on_stage_start(Stage::Probe);
        cb.on_stage_complete(Stage::Probe, 3);
        cb.on_run_complete(Path::new("out.jpg"));
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_run_start(3);
        for stage in Stage::CITATION_ONLY {
            rec.on_stage_start(stage);
            rec.on_stage_complete(stage, 1);
        }
        let events = rec.events.lock().unwrap();
        assert_eq!(events.len(), 7);
        assert_eq!(events[0], "start 3");
        assert_eq!(events[1], "> RenderPdf");
        assert_eq!(events[6], "< Rasterise");
    }

    #[test]
    fn stage_lists_are_consistent() {
        for stage in Stage::CITATION_ONLY {
            assert!(Stage::COMPOSITE.contains(&stage));
        }
        assert_eq!(Stage::COMPOSITE[0], Stage::Probe);
    }

    #[test]
    fn stage_serialises_snake_case() {
        let json = serde_json::to_string(&Stage::RenderPdf).unwrap();
        assert_eq!(json, "\"render_pdf\"");
    }
}
