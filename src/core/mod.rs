//! Core foundations: error handling, configuration, and the value types the
//! rest of the crate is built on.

/// Error types and result handling
pub mod error;
/// Configuration management
pub mod config;
/// Addresses, deltas, and access events
pub mod types;

// Re-export commonly used items
pub use config::{Config, PrefetcherConfig};
pub use error::{Error, Result};
pub use types::{AccessStat, Addr, Delta};
