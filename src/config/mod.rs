//! Configuration management for fanscore
//!
//! Settings are layered with figment (see [`core`]) and extracted into the typed
//! sections below. Every section has serde defaults, so partial files are fine.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::parallel::ParallelConfig;
use crate::pipeline::OrderMode;
use crate::scorer::ScorerConfig;
use crate::source::SourceConfig;

pub mod core;

pub use self::core::{CliOverrides, OutputOverrides, ParallelOverrides, ScorerOverrides, SourceOverrides};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FanscoreConfig {
    /// Worker pool and sink
    pub parallel: ParallelConfig,

    /// How input is cut into units
    pub source: SourceConfig,

    /// Which model scores the units
    pub scorer: ScorerConfig,

    /// How results are reported
    pub output: OutputConfig,
}

/// Result output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub order: OrderMode,
    /// Draw progress bars on stderr
    pub progress: bool,
}

/// Result line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `<unit>, <score>`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl FanscoreConfig {
    /// Validate configuration before any work starts
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.parallel.resolve_workers()?;

        if let Some(threshold) = self.scorer.threshold
            && !threshold.is_finite()
        {
            return Err(PipelineError::configuration("scorer threshold must be finite"));
        }

        Ok(())
    }
}
