use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::Serialize;

use super::{FanscoreConfig, OutputFormat};
use crate::error::PipelineError;
use crate::pipeline::OrderMode;
use crate::source::SplitMode;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

const ENV_PREFIX: &str = "FANSCORE_";

/// Command-line values that override every other layer
///
/// Only fields that are set are serialized, so unset flags leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CliOverrides {
    pub parallel: ParallelOverrides,
    pub source: SourceOverrides,
    pub scorer: ScorerOverrides,
    pub output: OutputOverrides,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParallelOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_workers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink_capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_blank: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScorerOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OutputOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<bool>,
}

impl FanscoreConfig {
    /// Load, merge, extract and validate the configuration
    pub fn load_with(
        custom_config: Option<&Path>,
        overrides: &CliOverrides,
    ) -> Result<Self, PipelineError> {
        tracing::trace!("CONFIG LOAD: Starting (custom config: {:?})", custom_config);

        let config: FanscoreConfig = Self::figment(custom_config, overrides)?
            .extract()
            .map_err(|e| PipelineError::configuration(e.to_string()))?;
        config.validate()?;

        tracing::trace!(
            "CONFIG LOAD: workers={} auto={} sink_capacity={} order={:?}",
            config.parallel.workers,
            config.parallel.auto_workers,
            config.parallel.sink_capacity,
            config.output.order
        );
        Ok(config)
    }

    /// The merged figment, lowest priority first
    pub fn figment(
        custom_config: Option<&Path>,
        overrides: &CliOverrides,
    ) -> Result<Figment, PipelineError> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG)); // Embedded defaults

        // A custom config replaces the working-directory files and must exist
        if let Some(custom_path) = custom_config {
            if !custom_path.is_file() {
                return Err(PipelineError::configuration(format!(
                    "config file not found: {}",
                    custom_path.display()
                )));
            }
            figment = match custom_path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file(custom_path)),
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(custom_path)),
                _ => figment.merge(Toml::file(custom_path)),
            };
        } else {
            figment = figment
                .merge(Toml::file("fanscore.toml"))
                .merge(Json::file("fanscore.json"))
                .merge(Yaml::file("fanscore.yaml"))
                .merge(Yaml::file("fanscore.yml"));
        }

        // Environment variables, then command-line flags
        figment = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides));

        Ok(figment)
    }
}
