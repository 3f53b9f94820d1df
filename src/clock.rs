//! Time sources.

use std::time::Instant;

/// A monotonic time source read in seconds from an arbitrary origin.
///
/// Calibration and measurement take timestamps only through this trait so a
/// scripted clock can stand in for the real one.
pub trait Clock {
    /// Current time in seconds.
    fn now(&self) -> f64;
}

/// Clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}
