//! Configuration for a benchmark run.

use std::path::PathBuf;
use std::str::FromStr;

/// Format used by file and stream sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Same text as the console.
    #[default]
    Text,
    /// One JSON object per measurement.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" | "jsonl" => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}' (expected text or json)")),
        }
    }
}

/// Settings read by every measurement and report call.
#[derive(Debug, Clone, Default)]
pub struct BenchConfig {
    /// Subtract calibrated call and loop overhead from elapsed times.
    pub ignore_overhead: bool,
    /// Include the memory offset in reports.
    pub report_memory: bool,
    /// Append reports to this file in addition to the console.
    pub output: Option<PathBuf>,
    /// Format for the output file.
    pub output_format: OutputFormat,
    /// Text shown in the banner of the first group.
    pub label: Option<String>,
}

impl BenchConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config from environment variables.
    ///
    /// Supported variables:
    /// - `BENCH_IGNORE_OVERHEAD`: subtract calibrated overhead (default: false)
    /// - `BENCH_REPORT_MEMORY`: report memory offset (default: false)
    /// - `BENCH_OUTPUT`: file to append reports to
    /// - `BENCH_OUTPUT_FORMAT`: `text` or `json` (default: text)
    /// - `BENCH_LABEL`: banner label
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("BENCH_IGNORE_OVERHEAD") {
            cfg.ignore_overhead = parse_flag(&v);
        }
        if let Ok(v) = std::env::var("BENCH_REPORT_MEMORY") {
            cfg.report_memory = parse_flag(&v);
        }
        if let Ok(v) = std::env::var("BENCH_OUTPUT") {
            cfg.output = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("BENCH_OUTPUT_FORMAT") {
            match v.parse() {
                Ok(format) => cfg.output_format = format,
                Err(e) => tracing::warn!("ignoring BENCH_OUTPUT_FORMAT: {e}"),
            }
        }
        if let Ok(v) = std::env::var("BENCH_LABEL") {
            cfg.label = Some(v);
        }

        cfg
    }

    /// Enable or disable overhead subtraction.
    pub fn ignore_overhead(mut self, v: bool) -> Self {
        self.ignore_overhead = v;
        self
    }

    /// Enable or disable memory reporting.
    pub fn report_memory(mut self, v: bool) -> Self {
        self.report_memory = v;
        self
    }

    /// Set the output file.
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Set the output file format.
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set the banner label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

fn parse_flag(v: &str) -> bool {
    v != "0" && !v.eq_ignore_ascii_case("false")
}
