//! Metrics collection for the prefetcher.
//!
//! Counters are registered once behind a lazy global and incremented from
//! the dispatcher hot path. Observability is additive only: no prefetcher
//! behavior reads these values back.

use crate::core::error::Result;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter, IntCounter};

/// Centralized prefetcher counters
pub struct Metrics {
    /// Access events processed
    pub accesses: IntCounter,
    /// Prefetches that survived the filter and were issued
    pub prefetches_issued: IntCounter,
    /// Tier-1 entries promoted into Tier-3
    pub promotions: IntCounter,
    /// Reorganizations into the tiered layout
    pub switches_to_tiered: IntCounter,
    /// Reorganizations into the tier-3-only layout
    pub switches_to_tier3_only: IntCounter,
    /// Overflow-guard rescales of the hit counters
    pub counter_rescales: IntCounter,
}

impl Metrics {
    /// Create new metrics instance
    fn new() -> Result<Self> {
        Ok(Self {
            accesses: register_int_counter!(
                "dcpt_accesses_total",
                "Total number of access events processed"
            )?,
            prefetches_issued: register_int_counter!(
                "dcpt_prefetches_issued_total",
                "Total number of prefetches issued to the host"
            )?,
            promotions: register_int_counter!(
                "dcpt_promotions_total",
                "Total number of tier-1 entries promoted to tier-3"
            )?,
            switches_to_tiered: register_int_counter!(
                "dcpt_switches_to_tiered_total",
                "Reorganizations into the tiered layout"
            )?,
            switches_to_tier3_only: register_int_counter!(
                "dcpt_switches_to_tier3_only_total",
                "Reorganizations into the tier-3-only layout"
            )?,
            counter_rescales: register_int_counter!(
                "dcpt_counter_rescales_total",
                "Overflow-guard rescales of the hit counters"
            )?,
        })
    }

    /// Get the global metrics instance
    pub fn global() -> &'static Metrics {
        static INSTANCE: Lazy<Metrics> =
            Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
        &INSTANCE
    }
}

/// Initialize the metrics registry
pub fn init_registry() {
    // Initialize global metrics to register them
    let _ = Metrics::global();
}

/// Collect and return all metrics as a string
pub fn collect_metrics() -> String {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}
