//! The benchmark context.

use crate::calibrate::OverheadProfile;
use crate::clock::Clock;
use crate::config::BenchConfig;
use crate::engine::Engine;
use crate::error::{BenchError, Result};
use crate::memory::MemoryProbe;
use crate::report::{ConsoleReporter, MultiReporter, Reporter, StreamReporter};
use crate::result::{IterationCount, Measurement};

/// Holds the configuration, the calibrated engine and the reporters for one
/// benchmark run.
///
/// # Example
///
/// ```rust,no_run
/// use cntryl_microbench::{Bench, BenchConfig};
///
/// let mut bench = Bench::new(BenchConfig::new().ignore_overhead(true))?;
///
/// bench.begin_group("String building");
/// bench.run_with("push_str", 10_000u64, &("abc", 64usize), |(s, n)| {
///     let mut out = String::new();
///     for _ in 0..*n {
///         out.push_str(s);
///     }
///     out
/// })?;
/// # Ok::<(), cntryl_microbench::BenchError>(())
/// ```
pub struct Bench {
    config: BenchConfig,
    engine: Engine,
    reporter: MultiReporter,
    groups_started: usize,
}

impl Bench {
    /// Create a bench using the process-wide overhead profile, calibrating it
    /// if this is the first bench in the process.
    pub fn new(config: BenchConfig) -> Result<Self> {
        Self::with_profile(config, OverheadProfile::process()?)
    }

    /// Create a bench with an explicit overhead profile.
    ///
    /// Reporters: console (always) plus the output file when configured.
    pub fn with_profile(config: BenchConfig, profile: OverheadProfile) -> Result<Self> {
        let mut reporter = MultiReporter::new(vec![Box::new(ConsoleReporter::new())]);
        if let Some(path) = &config.output {
            reporter.push(Box::new(StreamReporter::append_to(path)?));
        }

        Ok(Self {
            config,
            engine: Engine::new(profile),
            reporter,
            groups_started: 0,
        })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn profile(&self) -> &OverheadProfile {
        self.engine.profile()
    }

    /// Replace reporters with a custom set.
    pub fn reporters(&mut self, reporters: Vec<Box<dyn Reporter>>) -> &mut Self {
        self.reporter = MultiReporter::new(reporters);
        self
    }

    /// Add an additional reporter.
    pub fn add_reporter(&mut self, reporter: Box<dyn Reporter>) -> &mut Self {
        self.reporter.push(reporter);
        self
    }

    /// Replace the clock used for measurements.
    pub fn clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.engine = self.engine.with_clock(clock);
        self
    }

    /// Replace the memory probe used for measurements.
    pub fn memory_probe(mut self, probe: Box<dyn MemoryProbe>) -> Self {
        self.engine = self.engine.with_probe(probe);
        self
    }

    /// Start a named group. Only the first group of this bench prints the
    /// banner.
    pub fn begin_group(&mut self, description: &str) {
        let first = self.groups_started == 0;
        tracing::debug!(group = description, first, "group started");
        self.reporter.group_start(description, first, &self.config);
        self.groups_started += 1;
    }

    /// Start a group and run `f` inside it.
    pub fn group<F, T>(&mut self, description: &str, f: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        self.begin_group(description);
        f(self)
    }

    /// Time a zero-argument closure.
    pub fn measure<R, F>(
        &self,
        iterations: impl TryInto<IterationCount, Error = BenchError>,
        mut f: F,
    ) -> Result<Measurement>
    where
        F: FnMut() -> R,
    {
        self.engine
            .measure_with(&self.config, iterations, &(), |_: &()| f())
    }

    /// Time `f(args)`, passing the same borrowed arguments on every call.
    pub fn measure_with<A, R, F>(
        &self,
        iterations: impl TryInto<IterationCount, Error = BenchError>,
        args: &A,
        f: F,
    ) -> Result<Measurement>
    where
        A: ?Sized,
        F: FnMut(&A) -> R,
    {
        self.engine.measure_with(&self.config, iterations, args, f)
    }

    /// Time a fallible closure; its first error is returned unchanged.
    pub fn try_measure<R, E, F>(
        &self,
        iterations: impl TryInto<IterationCount, Error = BenchError>,
        mut f: F,
    ) -> Result<Measurement, E>
    where
        E: From<BenchError>,
        F: FnMut() -> Result<R, E>,
    {
        self.engine
            .try_measure_with(&self.config, iterations, &(), |_: &()| f())
    }

    /// Fallible counterpart of [`Bench::measure_with`].
    pub fn try_measure_with<A, R, E, F>(
        &self,
        iterations: impl TryInto<IterationCount, Error = BenchError>,
        args: &A,
        f: F,
    ) -> Result<Measurement, E>
    where
        A: ?Sized,
        E: From<BenchError>,
        F: FnMut(&A) -> Result<R, E>,
    {
        self.engine
            .try_measure_with(&self.config, iterations, args, f)
    }

    /// Hand a finished measurement to every reporter.
    pub fn report(&self, description: &str, result: &Measurement) {
        self.reporter.measurement(description, result, &self.config);
    }

    /// Measure a zero-argument closure and report it.
    pub fn run<R, F>(
        &self,
        description: &str,
        iterations: impl TryInto<IterationCount, Error = BenchError>,
        f: F,
    ) -> Result<Measurement>
    where
        F: FnMut() -> R,
    {
        let result = self.measure(iterations, f)?;
        self.report(description, &result);
        Ok(result)
    }

    /// Measure `f(args)` and report it.
    pub fn run_with<A, R, F>(
        &self,
        description: &str,
        iterations: impl TryInto<IterationCount, Error = BenchError>,
        args: &A,
        f: F,
    ) -> Result<Measurement>
    where
        A: ?Sized,
        F: FnMut(&A) -> R,
    {
        let result = self.measure_with(iterations, args, f)?;
        self.report(description, &result);
        Ok(result)
    }
}
