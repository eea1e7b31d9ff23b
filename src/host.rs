//! The seam between the prefetcher and the host simulator.
//!
//! The prefetcher never talks to the cache hierarchy directly; it consults
//! the host through this trait and hands issued prefetches back the same
//! way. Any host can drive the tables — the real simulator, the bundled
//! [`crate::sim::SimHost`], or a bespoke mock in a test.

use crate::core::types::Addr;

/// Host-provided cache and miss-handling primitives.
///
/// All three calls are treated as pure and non-blocking: the dispatcher may
/// invoke them any number of times while processing a single access event,
/// and every `issue_prefetch` for an event lands before the event returns.
pub trait CacheHost {
    /// True if `addr` is currently resident in the cache.
    fn in_cache(&self, addr: Addr) -> bool;

    /// True if a miss for `addr` is already pending in the MSHRs.
    fn in_mshr_queue(&self, addr: Addr) -> bool;

    /// Request a speculative load of `addr`. Completion is reported later
    /// through `prefetch_complete`.
    fn issue_prefetch(&mut self, addr: Addr);
}
