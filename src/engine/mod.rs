//! The event dispatcher tying tables, counters, and mode control together.
//!
//! One [`Prefetcher`] value owns all state: the tier store, the hit
//! counters, and the optional in-flight queue. The host drives it through
//! three entry points — init, access, complete — either on an owned value
//! or through the process-wide singleton shim at the bottom of this module.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::core::config::PrefetcherConfig;
use crate::core::types::{AccessStat, Addr};
use crate::host::CacheHost;
use crate::system::metrics::Metrics;
use crate::table::queue::PrefetchQueue;
use crate::table::store::{TableMode, TierStore};
use crate::table::{BUFFER_DEADZONE, BUFFER_TOLERANCE, NUM_DELTAS};

/// The tiered DCPT prefetcher.
///
/// Accesses are serialized by the host; nothing here blocks or suspends,
/// and every `issue_prefetch` triggered by an access lands before
/// [`Prefetcher::access`] returns.
#[derive(Debug)]
pub struct Prefetcher {
    store: TierStore,
    queue: Option<PrefetchQueue>,
    config: PrefetcherConfig,
    /// Total access events seen, periodically rescaled.
    prefetch_count: u64,
    /// Events not resolved by an existing Tier-3 entry, rescaled in step
    /// with `prefetch_count`. A rising ratio means Tier-3 is undersized for
    /// the working set and the store should widen into Tier-1.
    t1_hit: u64,
}

impl Prefetcher {
    /// Build a prefetcher with the given tunables.
    pub fn new(config: PrefetcherConfig) -> Self {
        let queue = config.use_prefetch_queue.then(PrefetchQueue::new);
        Self {
            store: TierStore::new(),
            queue,
            config,
            prefetch_count: 0,
            t1_hit: 0,
        }
    }

    /// Zero cursors, counters, and both tables; return to tiered mode.
    pub fn reset(&mut self) {
        self.store.reset();
        if let Some(queue) = self.queue.as_mut() {
            queue.clear();
        }
        self.prefetch_count = 0;
        self.t1_hit = 0;
        debug!("prefetcher initialized");
    }

    /// Process one access event, issuing any resulting prefetches into
    /// `host` before returning.
    pub fn access(&mut self, stat: AccessStat, host: &mut dyn CacheHost) {
        let metrics = Metrics::global();
        metrics.accesses.inc();

        self.prefetch_count += 1;
        if self.prefetch_count >= self.config.scale_threshold {
            self.prefetch_count >>= self.config.scale_bits;
            self.t1_hit >>= self.config.scale_bits;
            metrics.counter_rescales.inc();
        }

        trace!(
            pc = stat.pc,
            addr = stat.mem_addr,
            t1_hit = self.t1_hit,
            prefetch_count = self.prefetch_count,
            "access"
        );

        let curr_addr = stat.mem_addr;
        let slot = self.store.locate_t3(stat.pc);

        if self.store.entry(slot).pc() != stat.pc {
            self.on_t3_miss(stat.pc, curr_addr, slot);
        } else if curr_addr != self.store.entry(slot).last_address() {
            self.on_t3_hit(stat.pc, curr_addr, slot, host);
        }
        // Zero delta: the entry already points at this address.
    }

    /// Note that a previously issued prefetch has arrived.
    pub fn complete(&mut self, addr: Addr) {
        if let Some(queue) = self.queue.as_mut() {
            queue.complete(addr);
        }
    }

    fn on_t3_miss(&mut self, pc: Addr, curr_addr: Addr, slot: usize) {
        match self.store.mode() {
            TableMode::Tiered => {
                let t1_slot = self.store.locate_t1(pc);
                if self.store.t1_entry(t1_slot).pc() == pc {
                    // Second sighting: promote into the full table.
                    let seed_addr = self.store.t1_entry(t1_slot).last_address();
                    let entry = self.store.entry_mut(slot);
                    entry.initialize(pc, seed_addr);
                    entry.insert(curr_addr);
                    self.store.t1_entry_mut(t1_slot).initialize(0, 0);
                    Metrics::global().promotions.inc();
                    debug!(pc, "promoted tier-1 entry into tier-3");
                } else {
                    self.t1_hit += 1;
                    self.store.t1_entry_mut(t1_slot).initialize(pc, curr_addr);
                }
            }
            TableMode::Tier3Only => {
                self.t1_hit += 1;
                if self.hit_ratio() > BUFFER_TOLERANCE {
                    info!(
                        t1_hit = self.t1_hit,
                        prefetch_count = self.prefetch_count,
                        ratio = self.hit_ratio(),
                        "widening into tiered organization"
                    );
                    self.store.switch_mode_to(TableMode::Tiered);
                    Metrics::global().switches_to_tiered.inc();
                    // All misses are Tier-1-worthy once the store is tiered,
                    // this one included.
                    let t1_slot = self.store.locate_t1(pc);
                    self.store.t1_entry_mut(t1_slot).initialize(pc, curr_addr);
                } else {
                    self.store.entry_mut(slot).initialize(pc, curr_addr);
                }
            }
        }
    }

    fn on_t3_hit(&mut self, pc: Addr, curr_addr: Addr, slot: usize, host: &mut dyn CacheHost) {
        if self.store.mode() == TableMode::Tiered
            && self.hit_ratio() < BUFFER_TOLERANCE - BUFFER_DEADZONE
        {
            info!(
                t1_hit = self.t1_hit,
                prefetch_count = self.prefetch_count,
                ratio = self.hit_ratio(),
                "narrowing into tier-3-only organization"
            );
            self.store.switch_mode_to(TableMode::Tier3Only);
            Metrics::global().switches_to_tier3_only.inc();
        }

        let replay_cap = self
            .config
            .reject_wild_deltas
            .then_some(self.config.max_replay_delta);

        let mut candidates = [0 as Addr; NUM_DELTAS];
        let entry = self.store.entry_mut(slot);
        entry.insert(curr_addr);
        entry.correlate(&mut candidates, replay_cap);
        let issued = entry.filter(&candidates, host, self.queue.as_mut());
        if issued > 0 {
            Metrics::global().prefetches_issued.inc_by(issued as u64);
            trace!(pc, issued, "prefetches issued");
        }
    }

    /// Fraction of recent events an existing Tier-3 entry could not absorb.
    fn hit_ratio(&self) -> f64 {
        self.t1_hit as f64 / self.prefetch_count as f64
    }

    /// Current table organization.
    pub fn mode(&self) -> TableMode {
        self.store.mode()
    }

    /// Shared view of the tier store, for inspection and reporting.
    pub fn store(&self) -> &TierStore {
        &self.store
    }

    /// Raw `(t1_hit, prefetch_count)` counter values.
    pub fn counters(&self) -> (u64, u64) {
        (self.t1_hit, self.prefetch_count)
    }
}

impl Default for Prefetcher {
    fn default() -> Self {
        Self::new(PrefetcherConfig::default())
    }
}

// The host-facing C-style surface: three free functions over one instance.
// Mutation is exclusive by the host's single-threaded contract; the mutex
// only exists so the singleton is safe if that contract ever breaks, and it
// is uncontended in practice.
static PREFETCHER: Lazy<Mutex<Prefetcher>> = Lazy::new(|| Mutex::new(Prefetcher::default()));

/// Reset the process-wide prefetcher. Call once before any access.
pub fn prefetch_init() {
    PREFETCHER.lock().reset();
}

/// Feed one access event to the process-wide prefetcher.
pub fn prefetch_access(stat: AccessStat, host: &mut dyn CacheHost) {
    PREFETCHER.lock().access(stat, host);
}

/// Mark a prefetched address as arrived in the process-wide prefetcher.
pub fn prefetch_complete(addr: Addr) {
    PREFETCHER.lock().complete(addr);
}
