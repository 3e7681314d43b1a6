//! Command-line interface for fanscore
//!
//! A single command: score every unit of one input and print the results.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use crate::config::{
    CliOverrides, FanscoreConfig, OutputFormat, OutputOverrides, ParallelOverrides,
    ScorerOverrides, SourceOverrides,
};
use crate::pipeline::OrderMode;
use crate::source::{InputPath, SplitMode};

mod output;
pub mod score;

pub use output::Output;

#[derive(Parser, Debug)]
#[command(
    name = "fanscore",
    version = env!("CARGO_PKG_VERSION"),
    about = "Score every line of a text file across a fixed pool of workers",
    long_about = "fanscore splits its input into units, divides them into one contiguous \
                  partition per worker, scores each unit with a sentiment model, and prints \
                  `<unit>, <score>` for every unit as results arrive."
)]
pub struct Cli {
    /// Input file, or `-` to read stdin
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Number of workers (one partition each)
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Size the pool from the available CPU cores
    #[arg(long, conflicts_with = "workers")]
    pub auto_workers: bool,

    /// Results buffered between workers and the collector (0 = rendezvous)
    #[arg(long, value_name = "N")]
    pub sink_capacity: Option<usize>,

    /// Report results as they arrive or in input order
    #[arg(long, value_enum)]
    pub order: Option<OrderMode>,

    /// Split the input into lines or sentences
    #[arg(long, value_enum)]
    pub split: Option<SplitMode>,

    /// Keep blank units instead of dropping them
    #[arg(long)]
    pub keep_blank: bool,

    /// Scoring model file (JSON); defaults to the bundled model
    #[arg(long, value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Override the model's decision threshold
    #[arg(long, value_name = "F", allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Result format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Show progress bars on stderr (TTY only)
    #[arg(long)]
    pub progress: bool,

    /// Use custom configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);
        let output = Output::new(self.verbose > 0, self.quiet);

        let config = FanscoreConfig::load_with(self.config.as_deref(), &self.overrides())
            .context("Failed to load configuration")?;

        score::execute(InputPath::parse(&self.input), config, output).await
    }

    /// Flags that were actually given, as a config layer
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            parallel: ParallelOverrides {
                workers: self.workers,
                auto_workers: self.auto_workers.then_some(true),
                sink_capacity: self.sink_capacity,
            },
            source: SourceOverrides {
                split: self.split,
                skip_blank: self.keep_blank.then_some(false),
            },
            scorer: ScorerOverrides {
                model: self.model.clone(),
                threshold: self.threshold,
            },
            output: OutputOverrides {
                format: self.format,
                order: self.order,
                progress: self.progress.then_some(true),
            },
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // Logs share stderr with diagnostics; stdout is reserved for results
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
