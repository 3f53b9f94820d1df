//! microbench: run the built-in micro-benchmark workloads.
//!
//! Flags override the `BENCH_*` environment variables read by
//! `BenchConfig::from_env`. Diagnostics go to stderr and are controlled with
//! `RUST_LOG`.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cntryl_microbench::{list_workloads, run_workloads, Bench, BenchConfig, OutputFormat};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "microbench",
    about = "Run micro-benchmarks with calibrated overhead subtraction",
    long_about = "
Runs the built-in workloads, grouped, and prints one line per workload:
description, elapsed time, optional memory offset and iteration count.

Example:
    microbench                             # Run everything
    microbench --ignore-overhead           # Subtract calibrated loop/call cost
    microbench --workload 'strings*'       # Filter by pattern
    microbench --output bench.jsonl --format json
"
)]
struct Cli {
    /// Subtract calibrated call and loop overhead from elapsed times
    #[arg(long)]
    ignore_overhead: bool,

    /// Report heap growth across each measurement
    #[arg(long)]
    report_memory: bool,

    /// Append results to this file as well as the console
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Format for the output file
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Label shown in the banner (e.g. toolchain or host)
    #[arg(long)]
    label: Option<String>,

    /// Filter workloads by glob pattern on "group/name" (e.g. "sorting/*")
    #[arg(long)]
    workload: Option<String>,

    /// Multiply every workload's iteration count
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    scale: u64,

    /// List workloads without running them
    #[arg(long)]
    list: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

impl Cli {
    fn config(&self) -> BenchConfig {
        let mut config = BenchConfig::from_env();
        if self.ignore_overhead {
            config.ignore_overhead = true;
        }
        if self.report_memory {
            config.report_memory = true;
        }
        if let Some(path) = &self.output {
            config.output = Some(path.clone());
        }
        if let Some(format) = self.format {
            config.output_format = format.into();
        }
        if let Some(label) = &self.label {
            config.label = Some(label.clone());
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let pattern = cli.workload.as_deref();

    if cli.list {
        let workloads = list_workloads(pattern);
        if workloads.is_empty() {
            println!("No workloads matched.");
        } else {
            println!("Workloads ({}):", workloads.len());
            for w in workloads {
                println!("  {:<32} {:>12} iterations", w.id(), w.iterations);
            }
        }
        return Ok(());
    }

    let config = cli.config();
    let mut bench = Bench::new(config).context("failed to set up benchmark run")?;
    tracing::info!(profile = ?bench.profile(), "overhead profile ready");

    let ran = run_workloads(&mut bench, pattern, cli.scale).context("benchmark failed")?;
    if ran == 0 {
        eprintln!("No workloads matched the pattern");
    } else {
        eprintln!("\n{} workload(s) completed", ran);
    }

    Ok(())
}
