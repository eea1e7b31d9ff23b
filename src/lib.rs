//! Tiered DCPT — a delta-correlating prediction table prefetcher.
//!
//! The prefetcher watches the `(pc, address)` stream of a CPU simulator,
//! learns per-PC delta patterns, and issues speculative prefetches for the
//! addresses it expects next. It manages its own fixed storage budget by
//! reorganizing between a tiered layout (many PCs tracked lightly, few in
//! full) and a flat layout (every slot a full record), steered by a
//! hysteresis loop over the observed miss ratio.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;

// Main functional modules
pub mod engine;
pub mod host;
pub mod sim;
pub mod system;
pub mod table;

// Re-export commonly used items for convenience
pub use crate::core::{AccessStat, Addr, Config, Delta, Error, PrefetcherConfig, Result};
pub use engine::{prefetch_access, prefetch_complete, prefetch_init, Prefetcher};
pub use host::CacheHost;
pub use table::TableMode;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize tracing and the metrics registry.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    tracing::info!("Initializing {} v{}", NAME, VERSION);

    system::metrics::init_registry();

    Ok(())
}
