//! Static-partition fan-out / unordered fan-in execution
//!
//! This module owns the only real concurrency contract in the crate: how work is
//! divided, how workers are launched and tracked, how their results are funneled
//! through one shared sink, and how the caller knows when to stop listening.
//!
//! # Architecture
//!
//! ```text
//!                  ┌────────────┐
//!             ┌───▶│  worker-0  │──┐
//! ┌────────┐  │    └────────────┘  │   ┌──────────┐    ┌─────────────┐
//! │ items  │──┼───▶     ...        ├──▶│   sink   │───▶│  collector  │
//! └────────┘  │    ┌────────────┐  │   └──────────┘    │ (caller's   │
//!  partition  └───▶│  worker-N  │──┘        ▲          │  thread)    │
//!                  └────────────┘           │ close    └─────────────┘
//!                        │ done       ┌─────────────┐
//!                        └───────────▶│ coordinator │
//!                                     └─────────────┘
//! ```
//!
//! - **Partitioning**: `N` contiguous, disjoint slices; the last absorbs the remainder.
//! - **Workers**: one scoped thread per partition, processing its slice in order.
//! - **Sink**: a `crossbeam` bounded channel (capacity 0 is a rendezvous).
//! - **Coordinator**: waits on a `WaitGroup` joined by every worker, then releases
//!   the last sink senders. Nothing else can close the sink.
//! - **Collector**: the calling thread drains results and per-item failures in
//!   receipt order until both channels are closed.
//!
//! Order is preserved within a partition only; across partitions the interleaving
//! depends on relative worker progress.
//!
//! # Example
//!
//! ```rust
//! use fanscore::parallel::{Collector, FanOutExecutor, WorkFailure};
//!
//! struct Sum(u64);
//!
//! impl Collector<u64> for Sum {
//!     fn collect(&mut self, result: u64) {
//!         self.0 += result;
//!     }
//!
//!     fn failure(&mut self, _failure: WorkFailure) {}
//! }
//!
//! let items: Vec<u64> = (1..=100).collect();
//! let mut sum = Sum(0);
//! let stats = FanOutExecutor::new(4)
//!     .execute(&items, |n, _| Ok::<_, String>(n * 2), &mut sum)
//!     .unwrap();
//!
//! assert_eq!(sum.0, 10100);
//! assert_eq!(stats.delivered, 100);
//! ```

pub mod core;
pub mod partition;
pub mod progress;

pub use self::core::{
    Collector, ExecutionStats, FanOutExecutor, ParallelConfig, WorkFailure,
    calculate_optimal_workers,
};
pub use partition::{Partition, partition};
pub use progress::PipelineProgress;
