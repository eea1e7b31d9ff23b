//! Error types for configuration, metrics, and simulator plumbing.
//!
//! The prefetcher core itself has no recoverable error conditions: every
//! access event is valid and every host predicate is total. Errors only
//! arise at the edges — loading configuration, registering metrics, or
//! parsing trace files for the simulated host.

use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the crate's edges (never by the access hot path).
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed line in a text trace file
    #[error("Trace parse error: {0}")]
    Trace(String),

    /// Prometheus metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a trace-parse error
    pub fn trace(msg: impl Into<String>) -> Self {
        Error::Trace(msg.into())
    }
}
