//! # cntryl-microbench
//!
//! A micro-benchmark harness that times a callable over many iterations and
//! can subtract the fixed cost of the timing loop itself.
//!
//! Calling a closure a million times through a loop costs something even if
//! the closure does nothing. On first use the harness calibrates that cost
//! (call overhead per iteration, plus loop bookkeeping) and, when
//! `ignore_overhead` is set, removes it from every measurement. Heap usage is
//! snapshotted before the first and after the last iteration.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cntryl_microbench::{Bench, BenchConfig};
//!
//! let config = BenchConfig::from_env().ignore_overhead(true).report_memory(true);
//! let mut bench = Bench::new(config)?;
//!
//! bench.begin_group("Collections");
//! bench.run("vec with capacity", 100_000u64, || {
//!     let mut v = Vec::with_capacity(64);
//!     v.extend(0..64u32);
//!     v
//! })?;
//! bench.run_with("sort", 10_000u64, &vec![5u32, 3, 9, 1], |data| {
//!     let mut v = data.clone();
//!     v.sort_unstable();
//!     v
//! })?;
//! # Ok::<(), cntryl_microbench::BenchError>(())
//! ```
//!
//! Exact heap accounting is available by installing [`TrackingAllocator`] as
//! the global allocator and passing it to [`Bench::memory_probe`]. Without it
//! the resident set size of the process is used.

mod bench;
mod benches;
mod calibrate;
mod clock;
mod config;
mod engine;
mod error;
mod memory;
mod report;
mod result;


pub use bench::Bench;
pub use calibrate::{OverheadProfile, CALIBRATION_ITERATIONS};
pub use clock::{Clock, MonotonicClock};
pub use config::{BenchConfig, OutputFormat};
pub use engine::Engine;
pub use error::{BenchError, Result};
pub use memory::{MemoryProbe, ProcessMemory, TrackingAllocator};
pub use report::{
    format_group_header, format_measurement, format_seconds, group_thousands, ConsoleReporter,
    MultiReporter, Reporter, StreamReporter,
};
pub use result::{IterationCount, Measurement};

// Built-in workloads used by the `microbench` binary.
pub use benches::{list_workloads, run_workloads, Workload, WORKLOADS};
