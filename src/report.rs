//! Pluggable reporters for benchmark output.
//!
//! All reporters implement the `Reporter` trait and are designed to be:
//! - Non-panicking: write errors are logged but never propagate
//! - Atomic: each header or result is written as one complete string

use crate::config::{BenchConfig, OutputFormat};
use crate::error::{BenchError, Result};
use crate::result::Measurement;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Trait for benchmark result reporters.
pub trait Reporter: Send + Sync {
    /// Called when a group starts. `first` is true for the first group of
    /// the run.
    fn group_start(&self, _description: &str, _first: bool, _config: &BenchConfig) {}

    /// Called with each completed measurement.
    fn measurement(&self, _description: &str, _result: &Measurement, _config: &BenchConfig) {}
}

/// Fixed width for the description column.
const NAME_WIDTH: usize = 40;
/// Fixed width for the elapsed column.
const DURATION_WIDTH: usize = 12;

const BANNER_RULE: &str = "===============================================================";
const GROUP_RULE: &str = "---------------------------------------------------------------";

/// Header text for a group. The first group of a run carries the banner.
pub fn format_group_header(description: &str, first: bool, config: &BenchConfig) -> String {
    if first {
        let label = config.label.clone().unwrap_or_else(|| {
            format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        });
        format!(
            "{BANNER_RULE}\n\
             Micro-benchmarks: {label}\n\
             Overhead correction: {}, memory reporting: {}\n\
             {BANNER_RULE}\n\
             \n\
             {description}\n\
             {GROUP_RULE}",
            on_off(config.ignore_overhead),
            on_off(config.report_memory),
        )
    } else {
        format!("\n{description}\n{GROUP_RULE}")
    }
}

/// One result line: description, elapsed time, memory offset (when enabled),
/// iteration count.
pub fn format_measurement(description: &str, result: &Measurement, config: &BenchConfig) -> String {
    let mut line = format!(
        "  {:<width$} {:>dur_width$}",
        description,
        format_seconds(result.elapsed_secs()),
        width = NAME_WIDTH,
        dur_width = DURATION_WIDTH
    );

    if config.report_memory {
        let offset = result
            .memory_offset_percent()
            .map(|p| format!("{p:+.2}%"))
            .unwrap_or_else(|| "n/a".to_string());
        line.push_str(&format!("  mem {offset}"));
    }

    line.push_str(&format!(
        "  {} iterations",
        group_thousands(result.iterations())
    ));
    line
}

fn on_off(v: bool) -> &'static str {
    if v {
        "on"
    } else {
        "off"
    }
}

/// Format seconds with a unit suited to the magnitude. Keeps the sign, since
/// corrected times can be negative.
pub fn format_seconds(secs: f64) -> String {
    let magnitude = secs.abs();
    if magnitude >= 1.0 {
        format!("{:.2}s", secs)
    } else if magnitude >= 0.001 {
        format!("{:.2}ms", secs * 1_000.0)
    } else if magnitude >= 0.000_001 {
        format!("{:.2}us", secs * 1_000_000.0)
    } else {
        format!("{:.2}ns", secs * 1_000_000_000.0)
    }
}

/// `1234567` -> `"1,234,567"`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Console reporter that prints to stdout.
pub struct ConsoleReporter {
    output_lock: Mutex<()>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            output_lock: Mutex::new(()),
        }
    }

    fn write_stdout(&self, message: &str) {
        // Ignore poison: a panicking benchmark must not silence the console.
        let _guard = self.output_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", message) {
            tracing::warn!("failed to write to stdout: {e}");
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn group_start(&self, description: &str, first: bool, config: &BenchConfig) {
        self.write_stdout(&format_group_header(description, first, config));
    }

    fn measurement(&self, description: &str, result: &Measurement, config: &BenchConfig) {
        self.write_stdout(&format_measurement(description, result, config));
    }
}

/// JSON line written per measurement in [`OutputFormat::Json`] mode.
#[derive(Serialize)]
struct Record<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
    description: &'a str,
    #[serde(flatten)]
    measurement: &'a Measurement,
    memory_offset_percent: Option<f64>,
}

struct StreamState {
    writer: Box<dyn Write + Send>,
    group: Option<String>,
}

/// Reporter that appends to a writer, typically a file.
///
/// Writes the console text in [`OutputFormat::Text`] and one JSON object per
/// measurement in [`OutputFormat::Json`].
pub struct StreamReporter {
    state: Mutex<StreamState>,
}

impl StreamReporter {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            state: Mutex::new(StreamState {
                writer,
                group: None,
            }),
        }
    }

    /// Open `path` for appending, creating it if needed.
    pub fn append_to(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| BenchError::Sink {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!("appending results to {}", path.display());
        Ok(Self::new(Box::new(file)))
    }

    fn write_line(state: &mut StreamState, message: &str) {
        let result = writeln!(state.writer, "{}", message).and_then(|_| state.writer.flush());
        if let Err(e) = result {
            tracing::warn!("failed to write results: {e}");
        }
    }
}

impl Reporter for StreamReporter {
    fn group_start(&self, description: &str, first: bool, config: &BenchConfig) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.group = Some(description.to_string());
        if config.output_format == OutputFormat::Text {
            Self::write_line(&mut state, &format_group_header(description, first, config));
        }
    }

    fn measurement(&self, description: &str, result: &Measurement, config: &BenchConfig) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let line = match config.output_format {
            OutputFormat::Text => format_measurement(description, result, config),
            OutputFormat::Json => {
                let record = Record {
                    group: state.group.as_deref(),
                    description,
                    measurement: result,
                    memory_offset_percent: result.memory_offset_percent(),
                };
                match serde_json::to_string(&record) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!("failed to serialize result: {e}");
                        return;
                    }
                }
            }
        };
        Self::write_line(&mut state, &line);
    }
}

/// Combines multiple reporters.
///
/// A panicking reporter does not stop the others.
pub struct MultiReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl MultiReporter {
    pub fn new(reporters: Vec<Box<dyn Reporter>>) -> Self {
        Self { reporters }
    }

    pub fn push(&mut self, reporter: Box<dyn Reporter>) {
        self.reporters.push(reporter);
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl Reporter for MultiReporter {
    fn group_start(&self, description: &str, first: bool, config: &BenchConfig) {
        for r in &self.reporters {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                r.group_start(description, first, config);
            }));
        }
    }

    fn measurement(&self, description: &str, result: &Measurement, config: &BenchConfig) {
        for r in &self.reporters {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                r.measurement(description, result, config);
            }));
        }
    }
}
