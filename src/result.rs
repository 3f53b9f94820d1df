//! Measurement result types.

use crate::error::BenchError;
use serde::Serialize;
use std::num::NonZeroU64;

/// Number of times a callable is invoked in one measurement. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IterationCount(NonZeroU64);

impl IterationCount {
    pub fn get(self) -> u64 {
        self.0.get()
    }

    pub(crate) fn as_f64(self) -> f64 {
        self.0.get() as f64
    }
}

fn not_positive(value: impl std::fmt::Display) -> BenchError {
    BenchError::invalid_argument(
        "iterations",
        format!("must be greater than zero, got {value}"),
    )
}

macro_rules! iteration_count_from {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<$ty> for IterationCount {
                type Error = BenchError;

                fn try_from(value: $ty) -> Result<Self, Self::Error> {
                    u64::try_from(value)
                        .ok()
                        .and_then(NonZeroU64::new)
                        .map(Self)
                        .ok_or_else(|| not_positive(value))
                }
            }
        )*
    };
}

iteration_count_from!(u64, u32, usize, i64, i32);

/// Result of timing one callable over a fixed number of iterations.
///
/// Built only by the engine; read through accessors. Serializes for reports
/// but cannot be deserialized, so `iterations` is always positive:
///
/// ```compile_fail
/// let m: cntryl_microbench::Measurement = serde_json::from_str(
///     r#"{"elapsed_secs":1.0,"start_memory_kb":1.0,"end_memory_kb":1.0,"iterations":0}"#,
/// ).unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    elapsed_secs: f64,
    start_memory_kb: f64,
    end_memory_kb: f64,
    iterations: u64,
}

impl Measurement {
    pub(crate) fn new(
        elapsed_secs: f64,
        start_memory_kb: f64,
        end_memory_kb: f64,
        iterations: IterationCount,
    ) -> Self {
        Self {
            elapsed_secs,
            start_memory_kb,
            end_memory_kb,
            iterations: iterations.get(),
        }
    }

    /// Total elapsed time in seconds, overhead-corrected if that was enabled.
    ///
    /// Can be negative when correction is on and the workload costs less than
    /// the calibrated overhead.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    pub fn start_memory_kb(&self) -> f64 {
        self.start_memory_kb
    }

    pub fn end_memory_kb(&self) -> f64 {
        self.end_memory_kb
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Average time per iteration.
    pub fn per_iteration_secs(&self) -> f64 {
        self.elapsed_secs / self.iterations as f64
    }

    /// Heap growth across the run as a percentage of the starting usage.
    ///
    /// Returns `None` when the starting usage is zero.
    pub fn memory_offset_percent(&self) -> Option<f64> {
        if self.start_memory_kb == 0.0 {
            return None;
        }
        Some((self.end_memory_kb - self.start_memory_kb) / self.start_memory_kb * 100.0)
    }
}
