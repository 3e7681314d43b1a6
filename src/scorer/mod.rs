//! Scoring seam
//!
//! The pipeline treats a scorer as an opaque, immutable function from text to a
//! [`ScoreValue`]. A scorer is constructed once, before any worker starts, and is
//! then shared by reference across all workers.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, ScoreError};

pub mod lexicon;

pub use lexicon::LexiconModel;

/// Opaque per-unit score; the bundled model uses `0` = negative, `1` = positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreValue(pub u8);

impl fmt::Display for ScoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scoring function safe to call concurrently through `&self`
pub trait Scorer: Send + Sync {
    fn score(&self, text: &str) -> Result<ScoreValue, ScoreError>;

    /// Human readable identifier used in logs
    fn name(&self) -> &str;
}

/// Scorer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Model file; the bundled model is used when unset
    pub model: Option<PathBuf>,
    /// Replaces the model's own decision threshold
    pub threshold: Option<f64>,
}

/// Load the configured scorer
pub fn load_scorer(config: &ScorerConfig) -> Result<LexiconModel, PipelineError> {
    let mut model = match &config.model {
        Some(path) => LexiconModel::load(path)?,
        None => LexiconModel::bundled()?,
    };

    if let Some(threshold) = config.threshold {
        model = model.with_threshold(threshold)?;
    }

    tracing::debug!(
        "Loaded scoring model '{}' ({} words, threshold {})",
        model.name(),
        model.vocabulary_size(),
        model.threshold()
    );
    Ok(model)
}
