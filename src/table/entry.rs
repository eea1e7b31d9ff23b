//! Per-PC table entries and the correlation/filter pipeline.

use tracing::debug;

use crate::core::types::{Addr, Delta};
use crate::host::CacheHost;
use crate::table::queue::PrefetchQueue;
use crate::table::ring::DeltaRing;
use crate::table::NUM_DELTAS;

/// Full delta-correlation record for one program counter.
///
/// `write_index` always names the slot the next delta lands in, so the most
/// recent delta sits at `write_index - 1`. A PC of `0` marks the slot empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct TierThreeEntry {
    pc: Addr,
    last_address: Addr,
    last_prefetch: Addr,
    deltas: DeltaRing,
    write_index: usize,
}

impl TierThreeEntry {
    /// Recycle this slot for `pc`, seeding it with the address of the access
    /// that created it. History, cursor, and issue memory all reset.
    pub fn initialize(&mut self, pc: Addr, last_address: Addr) {
        self.pc = pc;
        self.last_address = last_address;
        self.last_prefetch = 0;
        self.deltas.zero();
        self.write_index = 0;
    }

    /// Log the delta to `current_address` and advance the write cursor.
    ///
    /// The delta truncates to 16 bits; the host keeps correlatable patterns
    /// well inside that range, and an entry poisoned by a wider jump is
    /// overwritten as new deltas arrive.
    pub fn insert(&mut self, current_address: Addr) {
        let delta = current_address.wrapping_sub(self.last_address) as Delta;
        self.deltas.set(self.write_index as i64, delta);
        self.write_index = (self.write_index + 1) % NUM_DELTAS;
        self.last_address = current_address;
    }

    /// Program counter owning this entry; `0` when the slot is empty.
    pub fn pc(&self) -> Addr {
        self.pc
    }

    /// Address of the most recent access by this PC.
    pub fn last_address(&self) -> Addr {
        self.last_address
    }

    /// Most recently issued prefetch address, `0` if none.
    pub fn last_prefetch(&self) -> Addr {
        self.last_prefetch
    }

    pub(crate) fn write_index(&self) -> usize {
        self.write_index
    }

    pub(crate) fn deltas(&self) -> &DeltaRing {
        &self.deltas
    }

    /// Predict future addresses from the recent delta history.
    ///
    /// The signature is the pair `(deltas[wi], deltas[wi - 1])` — note the
    /// first component reads the *next* write slot, i.e. the oldest delta in
    /// the ring. The search for a prior occurrence of the signature walks
    /// backward starting at `wi - 2` and, in this revision, stops after that
    /// first pair, so a match replays exactly one delta. Predicted addresses
    /// fill `candidates` from the front; the first zero terminates the valid
    /// prefix.
    ///
    /// `max_replay_delta`, when set, aborts the replay at the first delta
    /// whose magnitude exceeds it — a guard against extrapolating through a
    /// truncated wild jump.
    pub fn correlate(&self, candidates: &mut [Addr; NUM_DELTAS], max_replay_delta: Option<u16>) {
        candidates.fill(0);

        let wi = self.write_index as i64;
        let d1 = self.deltas.get(wi);
        let d2 = self.deltas.get(wi - 1);

        // Only the pair immediately preceding the signature is examined;
        // older history waits for later accesses.
        let i = wi - 2;
        let u = self.deltas.get(i - 1);
        let v = self.deltas.get(i);
        if u != d1 || v != d2 {
            return;
        }

        // Replay the deltas that followed the matched pair. The replay
        // budget is the distance covered by the search so far, which at
        // `i = wi - 2` is zero: a match extrapolates a single address.
        let mut address = self.last_address;
        let mut candidate_index = 0;
        let mut k = i;
        let mut j: i64 = 0;
        while j >= 0 {
            let delta = self.deltas.get(k);
            if let Some(cap) = max_replay_delta {
                if delta.unsigned_abs() > cap {
                    break;
                }
            }
            address = address.wrapping_add(delta as i64 as u64);
            candidates[candidate_index] = address;
            candidate_index += 1;
            if candidate_index == NUM_DELTAS {
                break;
            }
            j -= 1;
            k += 1;
        }
    }

    /// Stage and issue the candidates that are worth fetching.
    ///
    /// A candidate is dropped if it is already resident, already pending in
    /// the MSHRs, or (when the in-flight queue is enabled) already issued
    /// and not yet complete. A candidate equal to the previously issued
    /// prefetch restarts the staging: whatever was staged before it is stale
    /// relative to the new evidence. Returns the number of prefetches
    /// issued.
    pub fn filter(
        &mut self,
        candidates: &[Addr; NUM_DELTAS],
        host: &mut dyn CacheHost,
        mut queue: Option<&mut PrefetchQueue>,
    ) -> usize {
        let mut staged = [0 as Addr; NUM_DELTAS];
        let mut index = 0;

        for &candidate in candidates.iter() {
            if candidate == 0 {
                break;
            }
            if candidate == self.last_prefetch {
                index = 0;
                staged[0] = 0;
            }
            let pending = queue.as_deref().map_or(false, |q| q.contains(candidate));
            if !host.in_cache(candidate) && !host.in_mshr_queue(candidate) && !pending {
                staged[index] = candidate;
                index += 1;
                self.last_prefetch = candidate;
            }
        }

        let mut issued = 0;
        for &addr in staged.iter() {
            if addr == 0 {
                break;
            }
            debug!(addr, "issuing prefetch");
            host.issue_prefetch(addr);
            if let Some(q) = queue.as_deref_mut() {
                q.record(addr);
            }
            issued += 1;
        }
        issued
    }
}

/// Lightweight record: just enough to recognize a PC's second sighting.
#[derive(Debug, Clone, Copy, Default)]
pub struct TierOneEntry {
    pc: Addr,
    last_address: Addr,
}

impl TierOneEntry {
    /// Point this slot at `pc`, remembering the address it just accessed.
    pub fn initialize(&mut self, pc: Addr, last_address: Addr) {
        self.pc = pc;
        self.last_address = last_address;
    }

    /// Program counter owning this slot; `0` when empty.
    pub fn pc(&self) -> Addr {
        self.pc
    }

    /// Address of the single access recorded for this PC.
    pub fn last_address(&self) -> Addr {
        self.last_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scriptable host for filter tests
    struct TestHost {
        cached: Vec<Addr>,
        mshr: Vec<Addr>,
        issued: Vec<Addr>,
    }

    impl TestHost {
        fn new() -> Self {
            Self {
                cached: Vec::new(),
                mshr: Vec::new(),
                issued: Vec::new(),
            }
        }
    }

    impl CacheHost for TestHost {
        fn in_cache(&self, addr: Addr) -> bool {
            self.cached.contains(&addr)
        }

        fn in_mshr_queue(&self, addr: Addr) -> bool {
            self.mshr.contains(&addr)
        }

        fn issue_prefetch(&mut self, addr: Addr) {
            self.issued.push(addr);
        }
    }

    fn seeded_entry(pc: Addr, base: Addr) -> TierThreeEntry {
        let mut entry = TierThreeEntry::default();
        entry.initialize(pc, base);
        entry
    }

    #[test]
    fn test_initialize_resets_everything() {
        let mut entry = seeded_entry(42, 1000);
        entry.insert(1008);
        entry.insert(1016);
        let mut candidates = [0; NUM_DELTAS];
        entry.correlate(&mut candidates, None);
        entry.filter(&candidates, &mut TestHost::new(), None);
        assert_eq!(entry.last_prefetch(), 1024);

        entry.initialize(99, 2000);
        assert_eq!(entry.pc(), 99);
        assert_eq!(entry.last_address(), 2000);
        assert_eq!(entry.last_prefetch(), 0);
        assert_eq!(entry.write_index(), 0);
        assert_eq!(*entry.deltas(), DeltaRing::new());
    }

    #[test]
    fn test_insert_records_difference() {
        let mut entry = seeded_entry(42, 1000);
        entry.insert(1008);
        assert_eq!(entry.last_address(), 1008);
        assert_eq!(entry.write_index(), 1);
        assert_eq!(entry.deltas().get(0), 8);

        entry.insert(1000);
        assert_eq!(entry.deltas().get(1), -8);
        assert_eq!(entry.last_address(), 1000);
    }

    #[test]
    fn test_write_index_wraps() {
        let mut entry = seeded_entry(42, 0);
        for i in 1..=NUM_DELTAS as u64 + 3 {
            entry.insert(i * 8);
            assert!(entry.write_index() < NUM_DELTAS);
        }
        assert_eq!(entry.write_index(), 3);
    }

    #[test]
    fn test_correlate_no_history_is_silent() {
        let entry = seeded_entry(42, 1000);
        let mut candidates = [0; NUM_DELTAS];
        entry.correlate(&mut candidates, None);
        assert_eq!(candidates, [0; NUM_DELTAS]);
    }

    #[test]
    fn test_correlate_single_delta_is_silent() {
        let mut entry = seeded_entry(42, 1000);
        entry.insert(1008);
        let mut candidates = [0; NUM_DELTAS];
        entry.correlate(&mut candidates, None);
        assert_eq!(candidates, [0; NUM_DELTAS]);
    }

    #[test]
    fn test_correlate_seam_signature_after_two_deltas() {
        // With two deltas logged the signature (0, d) matches the zero
        // padding just below the first delta, predicting one stride ahead.
        let mut entry = seeded_entry(42, 1000);
        entry.insert(1008);
        entry.insert(1016);
        let mut candidates = [0; NUM_DELTAS];
        entry.correlate(&mut candidates, None);
        assert_eq!(candidates[0], 1024);
        assert_eq!(&candidates[1..], &[0; NUM_DELTAS - 1]);
    }

    #[test]
    fn test_correlate_goes_quiet_while_ring_fills() {
        // From the third delta until the ring wraps, the examined pair is
        // (d, d) but the signature is (0, d): no match, no candidates.
        let mut entry = seeded_entry(42, 1000);
        for i in 1..=10u64 {
            entry.insert(1000 + i * 8);
        }
        let mut candidates = [0; NUM_DELTAS];
        entry.correlate(&mut candidates, None);
        assert_eq!(candidates, [0; NUM_DELTAS]);
    }

    #[test]
    fn test_correlate_full_ring_predicts_next_stride() {
        let mut entry = seeded_entry(42, 0);
        let mut addr = 0u64;
        for _ in 0..NUM_DELTAS + 1 {
            addr += 8;
            entry.insert(addr);
        }
        let mut candidates = [0; NUM_DELTAS];
        entry.correlate(&mut candidates, None);
        assert_eq!(candidates[0], addr + 8);
        assert_eq!(&candidates[1..], &[0; NUM_DELTAS - 1]);
    }

    #[test]
    fn test_correlate_wild_delta_rejection() {
        let mut entry = seeded_entry(42, 10_000);
        entry.insert(12_000);
        entry.insert(14_000);

        let mut candidates = [0; NUM_DELTAS];
        entry.correlate(&mut candidates, Some(1000));
        assert_eq!(candidates, [0; NUM_DELTAS]);

        // Default policy extrapolates straight through the same history.
        entry.correlate(&mut candidates, None);
        assert_eq!(candidates[0], 16_000);
    }

    #[test]
    fn test_filter_suppresses_resident_and_pending() {
        let mut entry = seeded_entry(42, 0);
        let mut host = TestHost::new();
        host.cached.push(100);
        host.mshr.push(200);

        let mut candidates = [0; NUM_DELTAS];
        candidates[0] = 100;
        candidates[1] = 200;
        candidates[2] = 300;
        let issued = entry.filter(&candidates, &mut host, None);

        assert_eq!(issued, 1);
        assert_eq!(host.issued, vec![300]);
        assert_eq!(entry.last_prefetch(), 300);
    }

    #[test]
    fn test_filter_stops_at_zero_candidate() {
        let mut entry = seeded_entry(42, 0);
        let mut host = TestHost::new();

        let mut candidates = [0; NUM_DELTAS];
        candidates[0] = 100;
        candidates[2] = 300; // unreachable past the zero at [1]
        entry.filter(&candidates, &mut host, None);

        assert_eq!(host.issued, vec![100]);
    }

    #[test]
    fn test_filter_issues_duplicate_candidate_once() {
        let mut entry = seeded_entry(42, 0);
        let mut host = TestHost::new();

        let mut candidates = [0; NUM_DELTAS];
        candidates[0] = 500;
        candidates[1] = 500;
        entry.filter(&candidates, &mut host, None);

        assert_eq!(host.issued, vec![500]);
    }

    #[test]
    fn test_filter_restages_across_repeated_issue() {
        let mut entry = seeded_entry(42, 0);
        let mut host = TestHost::new();

        let mut candidates = [0; NUM_DELTAS];
        candidates[0] = 700;
        entry.filter(&candidates, &mut host, None);
        assert_eq!(entry.last_prefetch(), 700);

        // The previously issued address reappears but is now resident:
        // staging restarts and only the fresh candidate goes out.
        host.cached.push(700);
        let mut candidates = [0; NUM_DELTAS];
        candidates[0] = 700;
        candidates[1] = 900;
        entry.filter(&candidates, &mut host, None);

        assert_eq!(host.issued, vec![700, 900]);
        assert_eq!(entry.last_prefetch(), 900);
    }

    #[test]
    fn test_filter_honors_inflight_queue() {
        let mut entry = seeded_entry(42, 0);
        let mut host = TestHost::new();
        let mut queue = PrefetchQueue::new();

        let mut candidates = [0; NUM_DELTAS];
        candidates[0] = 640;
        entry.filter(&candidates, &mut host, Some(&mut queue));
        assert_eq!(host.issued, vec![640]);
        assert!(queue.contains(640));

        // Still in flight: the same candidate is suppressed even though the
        // host predicates would pass it.
        entry.initialize(42, 0); // forget last_prefetch
        let issued = entry.filter(&candidates, &mut host, Some(&mut queue));
        assert_eq!(issued, 0);
        assert_eq!(host.issued, vec![640]);

        queue.complete(640);
        let issued = entry.filter(&candidates, &mut host, Some(&mut queue));
        assert_eq!(issued, 1);
    }
}
