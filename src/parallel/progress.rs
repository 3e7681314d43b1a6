use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::partition::Partition;

/// Worker bar colors, cycled by worker index
const WORKER_COLORS: [&str; 4] = ["cyan/blue", "green/yellow", "magenta/red", "yellow/blue"];

/// Live per-worker and overall progress, drawn on stderr
///
/// Worker bars are sized to the worker's partition, so they fill exactly. The
/// overall bar is advanced by the collector as results arrive.
#[derive(Clone)]
pub struct PipelineProgress {
    multi_progress: MultiProgress,
    overall_bar: ProgressBar,
    worker_bars: Vec<ProgressBar>,
    failed: Arc<AtomicUsize>,
}

impl PipelineProgress {
    pub fn new(partitions: &[Partition]) -> Self {
        Self::with_target(partitions, ProgressDrawTarget::stderr())
    }

    /// Tracks counts without drawing anything
    pub fn hidden(partitions: &[Partition]) -> Self {
        Self::with_target(partitions, ProgressDrawTarget::hidden())
    }

    fn with_target(partitions: &[Partition], target: ProgressDrawTarget) -> Self {
        let multi_progress = MultiProgress::with_draw_target(target);

        let worker_bars = partitions
            .iter()
            .map(|partition| {
                let color = WORKER_COLORS[partition.worker % WORKER_COLORS.len()];
                let template = format!(
                    "[Worker {}] [{{elapsed_precise}}] {{bar:40.{color}}} {{pos:>7}}/{{len:7}} {{msg}}",
                    partition.worker + 1
                );
                let bar = multi_progress.add(ProgressBar::new(partition.len() as u64));
                bar.set_style(bar_style(&template));
                bar
            })
            .collect();

        let total: usize = partitions.iter().map(Partition::len).sum();
        let overall_bar = multi_progress.add(ProgressBar::new(total as u64));
        overall_bar.set_style(bar_style(
            "Overall:   [{elapsed_precise}] {bar:40.bright_white/dim} {pos:>7}/{len:7} units ({percent}%) {msg}",
        ));
        overall_bar.enable_steady_tick(Duration::from_millis(120));

        Self {
            multi_progress,
            overall_bar,
            worker_bars,
            failed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A worker finished one unit of its partition
    pub fn worker_advanced(&self, worker: usize) {
        if let Some(bar) = self.worker_bars.get(worker) {
            bar.inc(1);
            if bar.position() >= bar.length().unwrap_or(0) {
                bar.finish_with_message("done");
            }
        }
    }

    /// The collector received a result
    pub fn delivered(&self) {
        self.overall_bar.inc(1);
    }

    /// The collector received a per-unit failure
    pub fn failed(&self) {
        let failed = self.failed.fetch_add(1, Ordering::Relaxed) + 1;
        self.overall_bar.inc(1);
        self.overall_bar.set_message(format!("{failed} skipped"));
    }

    pub fn position(&self) -> u64 {
        self.overall_bar.position()
    }

    pub fn finish(&self) {
        for bar in &self.worker_bars {
            bar.finish();
        }
        self.overall_bar.finish();
        let _ = self.multi_progress.clear();
    }
}

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
}
