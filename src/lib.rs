//! # fanscore - parallel per-line scoring
//!
//! fanscore reads a text input, cuts it into units (lines or sentences), and
//! scores every unit with a sentiment model across a fixed pool of worker threads.
//!
//! ## Pipeline
//!
//! ```text
//! source ──▶ partition ──▶ N workers ──▶ shared sink ──▶ collector ──▶ reporter
//!                                ╲                ▲
//!                                 ╲─▶ coordinator ┘ (closes the sink once all workers return)
//! ```
//!
//! - **Static partitioning**: one contiguous slice per worker, the last one absorbing the remainder
//! - **Unordered fan-in**: results are reported in arrival order, or in input order on request
//! - **Skip-and-report**: a unit the scorer rejects is reported out-of-band and never aborts the run
//! - **Layered configuration**: embedded defaults, config files, `FANSCORE_*` variables, CLI flags
//!
//! ## Quick Start
//!
//! ```bash
//! # Score every line of reviews.txt with 8 workers
//! fanscore reviews.txt
//!
//! # Deterministic output order, JSON lines, 4 workers
//! fanscore --order input --format json -w 4 reviews.txt
//! ```
//!
//! ## Library Usage
//!
//! ```rust
//! use fanscore::pipeline::{CollectingReporter, Pipeline};
//! use fanscore::scorer::LexiconModel;
//! use fanscore::source::TextUnit;
//!
//! let model = LexiconModel::bundled()?;
//! let units: Vec<TextUnit> = ["good", "bad", "neutral", "great"]
//!     .into_iter()
//!     .map(TextUnit::from)
//!     .collect();
//!
//! let mut reporter = CollectingReporter::default();
//! let summary = Pipeline::new(2).run(&units, &model, &mut reporter)?;
//!
//! assert_eq!(summary.scored, 4);
//! # Ok::<(), fanscore::PipelineError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod parallel;
pub mod pipeline;
pub mod scorer;
pub mod source;

pub use cli::{Cli, Output};
pub use config::FanscoreConfig;
pub use error::{PipelineError, ScoreError, UnitFailure};
