//! Scoring pipeline: units in, one result per unit out
//!
//! Wires the unit sequence, a [`Scorer`] and a [`Reporter`] onto the
//! [`FanOutExecutor`]. The collector side lives here: it turns worker output into
//! reported [`ResultPair`]s, optionally restoring input order first.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, UnitFailure};
use crate::parallel::{Collector, FanOutExecutor, ParallelConfig, WorkFailure};
use crate::scorer::{ScoreValue, Scorer};
use crate::source::TextUnit;

pub mod ordering;
pub mod report;

pub use ordering::ReorderBuffer;
pub use report::{CollectingReporter, JsonReporter, Reporter, TextReporter};

/// One scored unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPair {
    /// Index of the unit in the input sequence
    pub position: usize,
    pub unit: TextUnit,
    pub score: ScoreValue,
}

/// Order in which results are reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OrderMode {
    /// As workers produce them
    #[default]
    Arrival,
    /// Buffered and released in input order
    Input,
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub units: usize,
    pub scored: usize,
    pub failed: usize,
    /// Number of scored units per score value
    pub counts: BTreeMap<ScoreValue, usize>,
    pub workers: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn count(&self, score: ScoreValue) -> usize {
        self.counts.get(&score).copied().unwrap_or(0)
    }

    /// Fraction of scored units that received `score`, 0.0 when nothing was scored
    pub fn share(&self, score: ScoreValue) -> f64 {
        if self.scored == 0 {
            0.0
        } else {
            self.count(score) as f64 / self.scored as f64
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} units scored, {} skipped, {} workers in {:.2}s",
            self.scored,
            self.failed,
            self.workers,
            self.elapsed.as_secs_f64()
        )
    }
}

pub struct Pipeline {
    executor: FanOutExecutor,
    order: OrderMode,
}

impl Pipeline {
    pub fn new(workers: usize) -> Self {
        Self {
            executor: FanOutExecutor::new(workers),
            order: OrderMode::Arrival,
        }
    }

    pub fn from_config(config: &ParallelConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            executor: FanOutExecutor::from_config(config)?,
            order: OrderMode::Arrival,
        })
    }

    pub fn with_order(mut self, order: OrderMode) -> Self {
        self.order = order;
        self
    }

    pub fn with_sink_capacity(mut self, sink_capacity: usize) -> Self {
        self.executor = self.executor.with_sink_capacity(sink_capacity);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.executor = self.executor.with_progress(show_progress);
        self
    }

    pub fn workers(&self) -> usize {
        self.executor.workers()
    }

    /// Score every unit and report each result as the collector receives it
    ///
    /// Units the scorer rejects are skipped and passed to [`Reporter::failure`].
    /// A failing reporter does not stop the drain; its first error is returned
    /// once the run has completed.
    pub fn run<S, R>(
        &self,
        units: &[TextUnit],
        scorer: &S,
        reporter: &mut R,
    ) -> Result<RunSummary, PipelineError>
    where
        S: Scorer + ?Sized,
        R: Reporter + ?Sized,
    {
        let started = Instant::now();
        tracing::debug!(
            "Scoring {} units with '{}' ({:?} order)",
            units.len(),
            scorer.name(),
            self.order
        );

        let mut collector = ReportingCollector::new(units, self.order, reporter);
        let stats = self.executor.execute(
            units,
            |unit, position| {
                scorer.score(unit.as_str()).map(|score| ResultPair {
                    position,
                    unit: unit.clone(),
                    score,
                })
            },
            &mut collector,
        )?;
        let counts = collector.finish()?;

        let summary = RunSummary {
            units: units.len(),
            scored: stats.delivered,
            failed: stats.failed,
            counts,
            workers: stats.workers,
            elapsed: started.elapsed(),
        };
        tracing::info!("{}", summary);
        Ok(summary)
    }
}

/// Collector that forwards results to a [`Reporter`]
struct ReportingCollector<'a, R: Reporter + ?Sized> {
    units: &'a [TextUnit],
    order: OrderMode,
    reorder: ReorderBuffer<ResultPair>,
    reporter: &'a mut R,
    counts: BTreeMap<ScoreValue, usize>,
    write_error: Option<io::Error>,
}

impl<'a, R: Reporter + ?Sized> ReportingCollector<'a, R> {
    fn new(units: &'a [TextUnit], order: OrderMode, reporter: &'a mut R) -> Self {
        Self {
            units,
            order,
            reorder: ReorderBuffer::new(),
            reporter,
            counts: BTreeMap::new(),
            write_error: None,
        }
    }

    fn emit(&mut self, pair: ResultPair) {
        *self.counts.entry(pair.score).or_insert(0) += 1;

        // Keep draining after a write error so workers never block on the sink
        if self.write_error.is_some() {
            return;
        }
        if let Err(e) = self.reporter.report(&pair) {
            tracing::warn!("Reporting stopped after write error: {}", e);
            self.write_error = Some(e);
        }
    }

    /// Flush held results and hand back the per-score counts
    fn finish(mut self) -> Result<BTreeMap<ScoreValue, usize>, PipelineError> {
        let held = std::mem::take(&mut self.reorder).into_remaining();
        for pair in held {
            self.emit(pair);
        }

        if let Some(e) = self.write_error.take() {
            return Err(PipelineError::Report(e));
        }
        self.reporter.finish().map_err(PipelineError::Report)?;
        Ok(self.counts)
    }
}

impl<R: Reporter + ?Sized> Collector<ResultPair> for ReportingCollector<'_, R> {
    fn collect(&mut self, pair: ResultPair) {
        match self.order {
            OrderMode::Arrival => self.emit(pair),
            OrderMode::Input => {
                for ready in self.reorder.push(pair.position, pair) {
                    self.emit(ready);
                }
            }
        }
    }

    fn failure(&mut self, failure: WorkFailure) {
        let unit = self
            .units
            .get(failure.position)
            .map(ToString::to_string)
            .unwrap_or_default();
        self.reporter.failure(&UnitFailure {
            position: failure.position,
            worker: failure.worker,
            unit,
            reason: failure.reason,
        });

        if self.order == OrderMode::Input {
            for ready in self.reorder.skip(failure.position) {
                self.emit(ready);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoreError;
    use crate::scorer::LexiconModel;
    use std::collections::HashMap;
    use std::thread;
    use std::time::Duration;

    fn units(texts: &[&str]) -> Vec<TextUnit> {
        texts.iter().copied().map(TextUnit::new).collect()
    }

    fn texts(pairs: &[ResultPair]) -> Vec<&str> {
        pairs.iter().map(|p| p.unit.as_str()).collect()
    }

    /// Scores by length; sleeps to make arrival order scramble
    struct LengthScorer;

    impl Scorer for LengthScorer {
        fn score(&self, text: &str) -> Result<ScoreValue, ScoreError> {
            if text.starts_with('!') {
                return Err(ScoreError::Rejected("bang".to_string()));
            }
            thread::sleep(Duration::from_micros((text.len() as u64 % 5) * 100));
            Ok(ScoreValue(text.len() as u8))
        }

        fn name(&self) -> &str {
            "length"
        }
    }

    #[test]
    fn test_four_units_two_workers() {
        let model = LexiconModel::bundled().unwrap();
        let input = units(&["good", "bad", "neutral", "great"]);
        let mut reporter = CollectingReporter::default();

        let summary = Pipeline::new(2).run(&input, &model, &mut reporter).unwrap();
        assert_eq!(summary.scored, 4);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.count(ScoreValue(1)), 2);
        assert_eq!(summary.count(ScoreValue(0)), 2);
        assert_eq!(summary.share(ScoreValue(1)), 0.5);

        let order = texts(&reporter.pairs);
        let index = |s: &str| order.iter().position(|t| *t == s).unwrap();
        assert!(index("good") < index("bad"));
        assert!(index("neutral") < index("great"));

        let scores: HashMap<&str, ScoreValue> = reporter
            .pairs
            .iter()
            .map(|p| (p.unit.as_str(), p.score))
            .collect();
        assert_eq!(scores["good"], ScoreValue(1));
        assert_eq!(scores["bad"], ScoreValue(0));
        assert_eq!(scores["neutral"], ScoreValue(0));
        assert_eq!(scores["great"], ScoreValue(1));
    }

    #[test]
    fn test_empty_input_eight_workers() {
        let mut reporter = CollectingReporter::default();
        let summary = Pipeline::new(8)
            .run(&[], &LengthScorer, &mut reporter)
            .unwrap();

        assert_eq!(summary.units, 0);
        assert_eq!(summary.scored, 0);
        assert!(reporter.pairs.is_empty());
        assert!(summary.counts.is_empty());
        assert_eq!(summary.share(ScoreValue(1)), 0.0);
    }

    #[test]
    fn test_lines_without_words_get_one_result_each() {
        let model = LexiconModel::bundled().unwrap();
        let input = units(&["good", "...", "---", ":)", "great"]);
        let mut reporter = CollectingReporter::default();

        let summary = Pipeline::new(2)
            .with_order(OrderMode::Input)
            .run(&input, &model, &mut reporter)
            .unwrap();

        assert_eq!(summary.scored, input.len());
        assert_eq!(summary.failed, 0);
        assert_eq!(texts(&reporter.pairs), vec!["good", "...", "---", ":)", "great"]);
        assert_eq!(summary.count(ScoreValue(0)), 3);
        assert_eq!(summary.count(ScoreValue(1)), 2);
    }

    #[test]
    fn test_multiset_preserved_with_duplicates() {
        let input: Vec<TextUnit> = (0..250)
            .map(|i| TextUnit::new(format!("line {}", i % 17)))
            .collect();
        let mut reporter = CollectingReporter::default();

        Pipeline::new(7)
            .with_sink_capacity(3)
            .run(&input, &LengthScorer, &mut reporter)
            .unwrap();

        let mut expected: Vec<&str> = input.iter().map(TextUnit::as_str).collect();
        let mut actual = texts(&reporter.pairs);
        expected.sort_unstable();
        actual.sort_unstable();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_input_order_mode_is_deterministic() {
        let input: Vec<TextUnit> = (0..120).map(|i| TextUnit::new("x".repeat(i % 9 + 1))).collect();
        let mut reporter = CollectingReporter::default();

        Pipeline::new(5)
            .with_order(OrderMode::Input)
            .run(&input, &LengthScorer, &mut reporter)
            .unwrap();

        let positions: Vec<usize> = reporter.pairs.iter().map(|p| p.position).collect();
        assert_eq!(positions, (0..120).collect::<Vec<_>>());
    }

    #[test]
    fn test_failures_skipped_and_reported_in_input_order() {
        let input = units(&["one", "!two", "three", "four", "!five", "six"]);
        let mut reporter = CollectingReporter::default();

        let summary = Pipeline::new(3)
            .with_order(OrderMode::Input)
            .run(&input, &LengthScorer, &mut reporter)
            .unwrap();

        assert_eq!(summary.scored, 4);
        assert_eq!(summary.failed, 2);
        // Failed units are not counted under any score
        assert_eq!(summary.counts.values().sum::<usize>(), 4);
        assert_eq!(texts(&reporter.pairs), vec!["one", "three", "four", "six"]);

        let mut failed: Vec<&str> = reporter.failures.iter().map(|f| f.unit.as_str()).collect();
        failed.sort_unstable();
        assert_eq!(failed, vec!["!five", "!two"]);
        assert!(reporter.failures.iter().all(|f| f.reason.contains("bang")));
    }

    #[test]
    fn test_zero_workers_is_configuration_error() {
        let mut reporter = CollectingReporter::default();
        let err = Pipeline::new(0)
            .run(&units(&["good"]), &LengthScorer, &mut reporter)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert!(reporter.pairs.is_empty());
    }

    #[test]
    fn test_write_error_still_drains() {
        struct BrokenReporter {
            attempts: usize,
        }

        impl Reporter for BrokenReporter {
            fn report(&mut self, _pair: &ResultPair) -> io::Result<()> {
                self.attempts += 1;
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }

            fn failure(&mut self, _failure: &UnitFailure) {}
        }

        let input: Vec<TextUnit> = (0..50).map(|i| TextUnit::new(format!("u{i}"))).collect();
        let mut reporter = BrokenReporter { attempts: 0 };
        let err = Pipeline::new(4)
            .run(&input, &LengthScorer, &mut reporter)
            .unwrap_err();

        assert!(matches!(err, PipelineError::Report(_)));
        assert_eq!(reporter.attempts, 1);
    }

    #[test]
    fn test_dyn_scorer_and_reporter() {
        let scorer: Box<dyn Scorer> = Box::new(LengthScorer);
        let mut reporter: Box<dyn Reporter> = Box::new(CollectingReporter::default());
        let summary = Pipeline::new(2)
            .run(&units(&["a", "bb"]), scorer.as_ref(), reporter.as_mut())
            .unwrap();
        assert_eq!(summary.scored, 2);
    }
}
