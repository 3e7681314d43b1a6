use std::cell::Cell;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use crossbeam::channel::{Receiver, Sender, bounded, never, select, unbounded};
use crossbeam::sync::WaitGroup;
use serde::{Deserialize, Serialize};

use super::partition::{Partition, partition};
use super::progress::PipelineProgress;
use crate::error::PipelineError;

thread_local! {
    // Set while a worker runs `process` for one item
    static GUARDED: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Chain a panic hook that stays silent for panics caught per item
///
/// Those panics are reported once, as a [`WorkFailure`]. Panics anywhere else
/// still reach the previous hook.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !GUARDED.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

fn guarded<R>(f: impl FnOnce() -> R) -> std::thread::Result<R> {
    GUARDED.with(|g| g.set(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    GUARDED.with(|g| g.set(false));
    outcome
}

/// Configuration for the worker pool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Number of workers, one static partition each
    pub workers: usize,
    /// Derive the worker count from available cores instead of `workers`
    pub auto_workers: bool,
    /// Percentage of CPU cores to use with `auto_workers` (1-100)
    pub thread_percentage: u8,
    /// Sink capacity; 0 makes every send a rendezvous with the collector
    pub sink_capacity: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            auto_workers: false,
            thread_percentage: 75,
            sink_capacity: 0,
        }
    }
}

impl ParallelConfig {
    /// Final worker count, failing fast on a count of zero
    pub fn resolve_workers(&self) -> Result<usize, PipelineError> {
        if !(1..=100).contains(&self.thread_percentage) {
            return Err(PipelineError::configuration(format!(
                "thread_percentage must be between 1 and 100, got {}",
                self.thread_percentage
            )));
        }

        if self.auto_workers {
            return Ok(calculate_optimal_workers(self.thread_percentage));
        }

        if self.workers == 0 {
            return Err(PipelineError::configuration("worker count must be at least 1"));
        }
        Ok(self.workers)
    }
}

/// Workers for a percentage of the available cores, never less than one
pub fn calculate_optimal_workers(thread_percentage: u8) -> usize {
    let available_cores = num_cpus::get();
    std::cmp::max(1, (available_cores * thread_percentage as usize) / 100)
}

/// A work item whose processing failed or panicked; the worker moved on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkFailure {
    pub position: usize,
    pub worker: usize,
    pub reason: String,
}

/// Receives everything the workers produce, on the calling thread, in receipt order
pub trait Collector<R> {
    fn collect(&mut self, result: R);

    fn failure(&mut self, failure: WorkFailure);
}

/// What a finished run looked like
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    pub workers: usize,
    pub partition_sizes: Vec<usize>,
    pub delivered: usize,
    pub failed: usize,
}

/// Static-partition fan-out with a single shared sink and an unordered fan-in
///
/// Each worker owns one contiguous partition and processes it in order. A
/// coordinator thread waits for every worker and only then lets the sink close;
/// the calling thread drains the sink until it observes that closure.
pub struct FanOutExecutor {
    workers: usize,
    sink_capacity: usize,
    show_progress: bool,
}

/// Everything one worker owns for the duration of the run
struct WorkerContext<'a, T, R> {
    partition: Partition,
    items: &'a [T],
    result_tx: Sender<R>,
    failure_tx: Sender<WorkFailure>,
    progress: Option<&'a PipelineProgress>,
    // Declared last so it drops after the senders, even while unwinding
    done: WaitGroup,
}

impl FanOutExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            sink_capacity: 0,
            show_progress: false,
        }
    }

    pub fn from_config(config: &ParallelConfig) -> Result<Self, PipelineError> {
        Ok(Self::new(config.resolve_workers()?).with_sink_capacity(config.sink_capacity))
    }

    pub fn with_sink_capacity(mut self, sink_capacity: usize) -> Self {
        self.sink_capacity = sink_capacity;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `process` over every item and hand each outcome to `collector`
    ///
    /// `process` receives the item and its position in `items`. Errors and panics
    /// from `process` become [`WorkFailure`]s; the worker continues with its next
    /// item. Returns once every worker has returned and the sink is drained.
    pub fn execute<T, R, E, F, C>(
        &self,
        items: &[T],
        process: F,
        collector: &mut C,
    ) -> Result<ExecutionStats, PipelineError>
    where
        T: Sync,
        R: Send,
        E: Display,
        F: Fn(&T, usize) -> Result<R, E> + Sync,
        C: Collector<R> + ?Sized,
    {
        let partitions = partition(items.len(), self.workers)?;
        let partition_sizes: Vec<usize> = partitions.iter().map(Partition::len).collect();
        tracing::debug!(
            "Partitioned {} items across {} workers: {:?}",
            items.len(),
            self.workers,
            partition_sizes
        );

        let progress = self.show_progress.then(|| PipelineProgress::new(&partitions));
        install_quiet_hook();

        let (result_tx, result_rx): (Sender<R>, Receiver<R>) = bounded(self.sink_capacity);
        let (failure_tx, failure_rx) = unbounded::<WorkFailure>();
        let done = WaitGroup::new();
        let process = &process;
        let progress_ref = progress.as_ref();

        let drained = crossbeam::thread::scope(|s| {
            for partition in &partitions {
                let ctx = WorkerContext {
                    partition: *partition,
                    items: &items[partition.range()],
                    result_tx: result_tx.clone(),
                    failure_tx: failure_tx.clone(),
                    progress: progress_ref,
                    done: done.clone(),
                };
                s.spawn(move |_| run_worker(ctx, process));
            }

            // Lifecycle coordinator: the last senders live here, so the sink
            // cannot close before every worker has returned
            s.spawn(move |_| {
                done.wait();
                drop(result_tx);
                drop(failure_tx);
                tracing::debug!("All workers returned, sink closed");
            });

            // Receivers move in so a panicking collector disconnects the workers
            drain(result_rx, failure_rx, collector, progress_ref)
        });

        if let Some(progress) = &progress {
            progress.finish();
        }

        let (delivered, failed) = drained.map_err(|_| PipelineError::WorkerPanicked)?;

        Ok(ExecutionStats {
            workers: self.workers,
            partition_sizes,
            delivered,
            failed,
        })
    }
}

fn run_worker<T, R, E, F>(ctx: WorkerContext<'_, T, R>, process: &F)
where
    E: Display,
    F: Fn(&T, usize) -> Result<R, E>,
{
    let worker = ctx.partition.worker;

    for (offset, item) in ctx.items.iter().enumerate() {
        let position = ctx.partition.start + offset;

        let outcome = guarded(|| process(item, position));
        let reason = match outcome {
            Ok(Ok(result)) => {
                tracing::trace!("worker-{} produced item {}", worker, position);
                // Blocks while the sink is full; only fails once the collector is gone
                if ctx.result_tx.send(result).is_err() {
                    break;
                }
                None
            }
            Ok(Err(e)) => Some(e.to_string()),
            Err(payload) => Some(format!("panicked: {}", panic_message(payload.as_ref()))),
        };

        if let Some(reason) = reason {
            tracing::debug!("worker-{} skipped item {}: {}", worker, position, reason);
            let failure = WorkFailure {
                position,
                worker,
                reason,
            };
            if ctx.failure_tx.send(failure).is_err() {
                break;
            }
        }

        if let Some(progress) = ctx.progress {
            progress.worker_advanced(worker);
        }
    }

    tracing::debug!("worker-{} finished {} items", worker, ctx.items.len());

    // Senders first, then signal completion to the coordinator
    drop(ctx.result_tx);
    drop(ctx.failure_tx);
    drop(ctx.done);
}

fn drain<R, C>(
    results: Receiver<R>,
    failures: Receiver<WorkFailure>,
    collector: &mut C,
    progress: Option<&PipelineProgress>,
) -> (usize, usize)
where
    C: Collector<R> + ?Sized,
{
    let closed_results = never::<R>();
    let closed_failures = never::<WorkFailure>();
    let mut results_open = true;
    let mut failures_open = true;
    let mut delivered = 0;
    let mut failed = 0;

    while results_open || failures_open {
        let results_rx = if results_open { &results } else { &closed_results };
        let failures_rx = if failures_open { &failures } else { &closed_failures };

        select! {
            recv(results_rx) -> message => match message {
                Ok(result) => {
                    delivered += 1;
                    if let Some(progress) = progress {
                        progress.delivered();
                    }
                    collector.collect(result);
                }
                Err(_) => results_open = false,
            },
            recv(failures_rx) -> message => match message {
                Ok(failure) => {
                    failed += 1;
                    if let Some(progress) = progress {
                        progress.failed();
                    }
                    collector.failure(failure);
                }
                Err(_) => failures_open = false,
            },
        }
    }

    (delivered, failed)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
