//! Error taxonomy for the scoring pipeline
//!
//! Fatal errors ([`PipelineError`]) stop a run before any worker starts, with the
//! exception of [`PipelineError::Report`] and [`PipelineError::WorkerPanicked`], which
//! are only surfaced after the sink has been closed and fully drained.
//! Per-unit problems ([`ScoreError`]) never abort a run; they travel out-of-band
//! as [`UnitFailure`] records.

use std::io;

use serde::Serialize;
use thiserror::Error;

/// Fatal pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid settings (zero workers, out-of-range percentages, missing config file)
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The input could not be read
    #[error("cannot read input {input}: {source}")]
    SourceUnavailable {
        input: String,
        #[source]
        source: io::Error,
    },

    /// The scoring model failed to load or validate
    #[error("failed to load scoring model {model}: {reason}")]
    ScorerInit { model: String, reason: String },

    /// Writing results failed; the run still drained every result
    #[error("failed to write results: {0}")]
    Report(#[source] io::Error),

    /// A worker thread died outside of per-unit panic handling
    #[error("a worker thread panicked during the run")]
    WorkerPanicked,
}

impl PipelineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        PipelineError::Configuration(message.into())
    }

    pub fn scorer_init(model: impl Into<String>, reason: impl ToString) -> Self {
        PipelineError::ScorerInit {
            model: model.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors a scorer can report for a single unit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("rejected by scorer: {0}")]
    Rejected(String),
}

/// A unit that was skipped because scoring failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    /// Index of the unit in the input sequence
    pub position: usize,
    /// Worker that attempted the unit
    pub worker: usize,
    pub unit: String,
    pub reason: String,
}

impl std::fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unit #{} skipped by worker-{} ({}): {:?}",
            self.position, self.worker, self.reason, self.unit
        )
    }
}
