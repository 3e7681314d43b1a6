//! The scoring command
//!
//! Fatal problems (model, input, worker count) are reported before any worker
//! starts. The CPU-bound run itself happens on tokio's blocking pool.

use std::io;

use anyhow::{Context, Result};

use super::Output;
use crate::config::{FanscoreConfig, OutputFormat};
use crate::error::PipelineError;
use crate::pipeline::{JsonReporter, Pipeline, RunSummary, TextReporter};
use crate::scorer::load_scorer;
use crate::source::{InputPath, read_units};

pub async fn execute(input: InputPath, config: FanscoreConfig, output: Output) -> Result<()> {
    let scorer = load_scorer(&config.scorer)?;
    let units = read_units(&input, &config.source)?;

    // Progress bars only make sense on an interactive terminal
    let show_progress =
        config.output.progress && !output.is_quiet() && atty::is(atty::Stream::Stderr);

    let pipeline = Pipeline::from_config(&config.parallel)?
        .with_order(config.output.order)
        .with_progress(show_progress);

    output.verbose(&format!(
        "Scoring {} units from {} with {} workers ({:?} order, sink capacity {})",
        units.len(),
        input,
        pipeline.workers(),
        config.output.order,
        config.parallel.sink_capacity
    ));

    let format = config.output.format;
    let summary = tokio::task::spawn_blocking(move || -> Result<RunSummary, PipelineError> {
        let stdout = io::stdout().lock();
        match format {
            OutputFormat::Text => {
                pipeline.run(&units, &scorer, &mut TextReporter::new(stdout, output))
            }
            OutputFormat::Json => {
                pipeline.run(&units, &scorer, &mut JsonReporter::new(stdout, output))
            }
        }
    })
    .await
    .context("Scoring task failed")??;

    output.verbose_summary("📊", "Units scored", summary.scored);
    for (score, count) in &summary.counts {
        output.verbose_summary(
            "  ",
            &format!("Score {score} ({:.1}%)", summary.share(*score) * 100.0),
            *count,
        );
    }
    if summary.failed > 0 {
        output.warning(&format!("{} units could not be scored and were skipped", summary.failed));
    }
    output.verbose(&summary.to_string());

    Ok(())
}
