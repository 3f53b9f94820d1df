//! Error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by calibration, measurement and sink setup.
#[derive(Debug, Error)]
pub enum BenchError {
    /// A caller-supplied argument failed validation before any work was done.
    #[error("invalid argument `{parameter}`: {reason}")]
    InvalidArgument {
        parameter: &'static str,
        reason: String,
    },

    /// The clock misbehaved while calibrating overhead.
    #[error("overhead calibration failed: {0}")]
    Calibration(String),

    /// Heap usage could not be read.
    #[error("memory snapshot failed: {0}")]
    MemoryProbe(String),

    /// The configured output file could not be opened.
    #[error("failed to open output sink {}: {source}", .path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BenchError {
    pub(crate) fn invalid_argument(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = BenchError> = std::result::Result<T, E>;
