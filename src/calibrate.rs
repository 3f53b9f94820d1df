//! Call and loop overhead calibration.
//!
//! Driving a callable through a counted loop costs something even when the
//! callable does nothing: the indirect call itself and the loop bookkeeping.
//! The calibrator times a no-op through the same driver the engine uses so
//! that cost can be subtracted from real measurements.

use crate::clock::{Clock, MonotonicClock};
use crate::engine::drive;
use crate::error::{BenchError, Result};
use crate::result::IterationCount;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::OnceLock;

/// Iterations of the no-op loop used for calibration.
///
/// Large enough that the loop cannot be discarded and that clock granularity
/// is negligible against the total.
pub const CALIBRATION_ITERATIONS: u64 = 1_000_000;

/// Per-iteration costs of loop and call mechanics, in seconds.
///
/// Both terms are finite and non-negative. Deserialization goes through the
/// same check as [`OverheadProfile::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverheadProfile {
    call_overhead_per_iter: f64,
    loop_overhead_per_iter: f64,
}

#[derive(Deserialize)]
struct RawProfile {
    call_overhead_per_iter: f64,
    loop_overhead_per_iter: f64,
}

impl<'de> Deserialize<'de> for OverheadProfile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawProfile::deserialize(deserializer)?;
        Self::new(raw.call_overhead_per_iter, raw.loop_overhead_per_iter)
            .map_err(serde::de::Error::custom)
    }
}

fn check_overhead(parameter: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(BenchError::invalid_argument(
            parameter,
            format!("must be finite and non-negative, got {value}"),
        ))
    }
}

impl OverheadProfile {
    /// Profile from known values. Negative or non-finite terms are rejected.
    pub fn new(call_overhead_per_iter: f64, loop_overhead_per_iter: f64) -> Result<Self> {
        Ok(Self {
            call_overhead_per_iter: check_overhead(
                "call_overhead_per_iter",
                call_overhead_per_iter,
            )?,
            loop_overhead_per_iter: check_overhead(
                "loop_overhead_per_iter",
                loop_overhead_per_iter,
            )?,
        })
    }

    /// Cost of one call through the driver, in seconds.
    pub fn call_overhead_per_iter(&self) -> f64 {
        self.call_overhead_per_iter
    }

    /// Loop bookkeeping cost, subtracted once per measurement.
    pub fn loop_overhead_per_iter(&self) -> f64 {
        self.loop_overhead_per_iter
    }

    /// Calibrate against the monotonic clock.
    pub fn calibrate() -> Result<Self> {
        Self::calibrate_with(&MonotonicClock::new(), CALIBRATION_ITERATIONS)
    }

    /// Calibrate against `clock` using `iterations` no-op calls per pass.
    ///
    /// The first pass gives the call overhead. The second pass repeats the
    /// same loop and attributes whatever exceeds the known call cost to loop
    /// control flow. Noise can push that remainder below zero; it is clamped.
    pub fn calibrate_with(
        clock: &dyn Clock,
        iterations: impl TryInto<IterationCount, Error = BenchError>,
    ) -> Result<Self> {
        let iterations = iterations.try_into()?;
        let n = iterations.as_f64();

        let call_elapsed = time_noop_loop(clock, iterations)?;
        let call_overhead_per_iter = call_elapsed / n;

        let loop_elapsed = time_noop_loop(clock, iterations)?;
        let loop_overhead_per_iter = ((loop_elapsed - call_overhead_per_iter * n) / n).max(0.0);

        let profile = Self::new(call_overhead_per_iter, loop_overhead_per_iter)
            .map_err(|e| BenchError::Calibration(e.to_string()))?;
        tracing::debug!(
            iterations = iterations.get(),
            call_overhead_per_iter,
            loop_overhead_per_iter,
            "overhead calibrated"
        );
        Ok(profile)
    }

    /// The profile for this process, calibrated on first use.
    ///
    /// A failed calibration is remembered too: later calls return the same
    /// error rather than retrying.
    pub fn process() -> Result<Self> {
        static PROCESS_PROFILE: OnceLock<std::result::Result<OverheadProfile, String>> =
            OnceLock::new();

        PROCESS_PROFILE
            .get_or_init(|| Self::calibrate().map_err(|e| e.to_string()))
            .clone()
            .map_err(BenchError::Calibration)
    }

    /// Remove overhead from a raw elapsed time.
    ///
    /// The call term scales with `iterations`; the loop term is subtracted
    /// once. Treating the loop constant this way is a linear approximation
    /// fitted at the calibration size, not an exact model for other sizes.
    pub fn correct(&self, raw_secs: f64, iterations: IterationCount) -> f64 {
        raw_secs - self.call_overhead_per_iter * iterations.as_f64() - self.loop_overhead_per_iter
    }
}

fn time_noop_loop(clock: &dyn Clock, iterations: IterationCount) -> Result<f64> {
    let t0 = clock.now();
    drive(iterations.get(), &(), &mut |_: &()| ());
    let t1 = clock.now();

    let elapsed = t1 - t0;
    if !elapsed.is_finite() || elapsed < 0.0 {
        return Err(BenchError::Calibration(format!(
            "clock returned an invalid interval ({t0} -> {t1})"
        )));
    }
    Ok(elapsed)
}
