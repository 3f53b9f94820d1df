//! Timed execution of a callable over a fixed iteration count.

use crate::calibrate::OverheadProfile;
use crate::clock::{Clock, MonotonicClock};
use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::memory::{MemoryProbe, ProcessMemory};
use crate::result::{IterationCount, Measurement};
use std::hint::black_box;

/// Invoke `f(args)` `iterations` times.
///
/// The callable is reached through an opaque trait object so every iteration
/// pays a real call, the same cost the calibrator measures with a no-op.
pub(crate) fn drive<A: ?Sized, R>(iterations: u64, args: &A, f: &mut dyn FnMut(&A) -> R) {
    let f = black_box(f);
    for _ in 0..iterations {
        black_box(f(black_box(args)));
    }
}

/// Like [`drive`], stopping at the first error.
fn try_drive<A: ?Sized, R, E>(
    iterations: u64,
    args: &A,
    f: &mut dyn FnMut(&A) -> Result<R, E>,
) -> Result<(), E> {
    let f = black_box(f);
    for _ in 0..iterations {
        black_box(f(black_box(args))?);
    }
    Ok(())
}

/// Times callables and snapshots memory around each run.
pub struct Engine {
    profile: OverheadProfile,
    clock: Box<dyn Clock>,
    probe: Box<dyn MemoryProbe>,
}

impl Engine {
    /// Engine with the monotonic clock and process memory probe.
    pub fn new(profile: OverheadProfile) -> Self {
        Self {
            profile,
            clock: Box::new(MonotonicClock::new()),
            probe: Box::new(ProcessMemory::new()),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the memory probe.
    pub fn with_probe(mut self, probe: Box<dyn MemoryProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn profile(&self) -> &OverheadProfile {
        &self.profile
    }

    /// Time `f(args)` over `iterations` calls.
    ///
    /// `args` is borrowed for the whole run and handed to every call as is.
    /// Zero or negative iteration counts fail with
    /// [`BenchError::InvalidArgument`] before anything runs.
    pub fn measure_with<A, R, F>(
        &self,
        config: &BenchConfig,
        iterations: impl TryInto<IterationCount, Error = BenchError>,
        args: &A,
        mut f: F,
    ) -> Result<Measurement>
    where
        A: ?Sized,
        F: FnMut(&A) -> R,
    {
        let iterations = iterations.try_into()?;

        let start_memory_kb = self.probe.current_kb()?;
        let start = self.clock.now();
        drive(iterations.get(), args, &mut f);
        let end = self.clock.now();
        let end_memory_kb = self.probe.current_kb()?;

        Ok(self.finish(config, iterations, end - start, start_memory_kb, end_memory_kb))
    }

    /// Time a fallible callable. The first error ends the run and is
    /// returned unchanged; no measurement is produced.
    pub fn try_measure_with<A, R, E, F>(
        &self,
        config: &BenchConfig,
        iterations: impl TryInto<IterationCount, Error = BenchError>,
        args: &A,
        mut f: F,
    ) -> Result<Measurement, E>
    where
        A: ?Sized,
        E: From<BenchError>,
        F: FnMut(&A) -> Result<R, E>,
    {
        let iterations = iterations.try_into()?;

        let start_memory_kb = self.probe.current_kb()?;
        let start = self.clock.now();
        try_drive(iterations.get(), args, &mut f)?;
        let end = self.clock.now();
        let end_memory_kb = self.probe.current_kb()?;

        Ok(self.finish(config, iterations, end - start, start_memory_kb, end_memory_kb))
    }

    fn finish(
        &self,
        config: &BenchConfig,
        iterations: IterationCount,
        raw_secs: f64,
        start_memory_kb: f64,
        end_memory_kb: f64,
    ) -> Measurement {
        let elapsed_secs = if config.ignore_overhead {
            self.profile.correct(raw_secs, iterations)
        } else {
            raw_secs
        };

        tracing::trace!(
            iterations = iterations.get(),
            raw_secs,
            elapsed_secs,
            start_memory_kb,
            end_memory_kb,
            "measurement complete"
        );

        Measurement::new(elapsed_secs, start_memory_kb, end_memory_kb, iterations)
    }
}
