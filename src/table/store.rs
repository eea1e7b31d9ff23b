//! The two-level table store and its mode reorganizer.
//!
//! Entries live in preallocated arrays and are recycled in place; an entry's
//! identity is its slot index and nothing holds pointers between slots. The
//! store reorganizes between its two layouts without allocating: expansion
//! rehydrates Tier-1 records into the dormant tail of the Tier-3 array, and
//! compression squeezes a cursor-run of Tier-3 entries down into Tier-1
//! records before compacting the freed slots out of the live region.

use tracing::{debug, warn};

use crate::core::types::Addr;
use crate::table::entry::{TierOneEntry, TierThreeEntry};
use crate::table::{TABLE_SIZE, TIER1_ENTRY_SIZE, TIER1_SIZE, TIER3_ENTRY_SIZE, TIER3_REDUCTION};

/// Which organization the store is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// Both tables live: new PCs land in Tier-1 and are promoted to Tier-3
    /// on their second sighting.
    Tiered,
    /// Tier-1 inert; Tier-3 spans the full array and new PCs land there
    /// directly.
    Tier3Only,
}

/// Owner of both tables, the round-robin victim cursors, and the mode.
#[derive(Debug, Clone)]
pub struct TierStore {
    entries: [TierThreeEntry; TABLE_SIZE],
    t1_entries: [TierOneEntry; TIER1_SIZE],
    t3_cursor: usize,
    t1_cursor: usize,
    mode: TableMode,
    t3_live: usize,
    t1_live: usize,
}

impl TierStore {
    /// A fresh store in tiered mode with every slot empty.
    pub fn new() -> Self {
        Self {
            entries: [TierThreeEntry::default(); TABLE_SIZE],
            t1_entries: [TierOneEntry::default(); TIER1_SIZE],
            t3_cursor: 0,
            t1_cursor: 0,
            mode: TableMode::Tiered,
            t3_live: TABLE_SIZE - TIER3_REDUCTION,
            t1_live: TIER1_SIZE,
        }
    }

    /// Zero both tables, both cursors, and return to tiered mode.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Current organization.
    pub fn mode(&self) -> TableMode {
        self.mode
    }

    /// Number of live Tier-3 slots in the current mode.
    pub fn t3_live(&self) -> usize {
        self.t3_live
    }

    /// Number of live Tier-1 slots in the current mode.
    pub fn t1_live(&self) -> usize {
        self.t1_live
    }

    pub(crate) fn t3_cursor(&self) -> usize {
        self.t3_cursor
    }

    pub(crate) fn t1_cursor(&self) -> usize {
        self.t1_cursor
    }

    /// Shared view of a Tier-3 slot (dormant slots included).
    pub fn entry(&self, slot: usize) -> &TierThreeEntry {
        &self.entries[slot]
    }

    /// Exclusive view of a Tier-3 slot.
    pub fn entry_mut(&mut self, slot: usize) -> &mut TierThreeEntry {
        &mut self.entries[slot]
    }

    /// Shared view of a Tier-1 slot.
    pub fn t1_entry(&self, slot: usize) -> &TierOneEntry {
        &self.t1_entries[slot]
    }

    /// Exclusive view of a Tier-1 slot.
    pub fn t1_entry_mut(&mut self, slot: usize) -> &mut TierOneEntry {
        &mut self.t1_entries[slot]
    }

    /// Find the Tier-3 slot for `pc`, or pick the next round-robin victim.
    ///
    /// On a miss the returned slot is the caller's to overwrite; no eviction
    /// hook runs and the caller decides whether to recycle it. The cursor is
    /// a round-robin approximation of LRU — true recency is not tracked.
    pub fn locate_t3(&mut self, pc: Addr) -> usize {
        for slot in 0..self.t3_live {
            if self.entries[slot].pc() == pc {
                return slot;
            }
        }

        if self.t3_cursor >= self.t3_live {
            self.t3_cursor = 0;
        }
        let victim = self.t3_cursor;
        self.t3_cursor += 1;
        victim
    }

    /// Find the Tier-1 slot for `pc`, or pick the next round-robin victim.
    ///
    /// Calling this in tier-3-only mode is a caller bug; it logs and hands
    /// back slot 0 so the caller cannot crash on it.
    pub fn locate_t1(&mut self, pc: Addr) -> usize {
        if self.mode == TableMode::Tier3Only {
            warn!("tier-1 lookup while running tier-3-only");
        }

        for slot in 0..self.t1_live {
            if self.t1_entries[slot].pc() == pc {
                return slot;
            }
        }

        if self.t1_cursor >= self.t1_live {
            self.t1_cursor = 0;
        }
        let victim = self.t1_cursor;
        self.t1_cursor += 1;
        victim
    }

    /// Reorganize the store into `mode`. A no-op when already there.
    pub fn switch_mode_to(&mut self, mode: TableMode) {
        if mode == self.mode {
            return;
        }
        match mode {
            TableMode::Tier3Only => self.expand(),
            TableMode::Tiered => self.compress(),
        }
    }

    /// Tiered -> tier-3-only: rehydrate the most recent Tier-1 records into
    /// the dormant tail of the Tier-3 array, then open up the full pool.
    fn expand(&mut self) {
        for i in 0..TIER3_REDUCTION {
            let offset = TABLE_SIZE - TIER3_REDUCTION + i;
            let source = self.t1_entries[self.t1_cursor];
            self.entries[offset].initialize(source.pc(), source.last_address());
            self.t1_cursor = if self.t1_cursor == 0 {
                TIER1_SIZE - 1
            } else {
                self.t1_cursor - 1
            };
        }

        self.mode = TableMode::Tier3Only;
        self.t3_live = TABLE_SIZE;
        self.t1_live = 0;
        debug!("expanded into tier-3-only organization");
    }

    /// Tier-3-only -> tiered: demote a cursor-run of Tier-3 entries into
    /// Tier-1 records, compact the freed slots out toward the dormant tail,
    /// and shrink the live Tier-3 region.
    fn compress(&mut self) {
        let mut remaining = TIER3_REDUCTION;

        for t1_entry in self.t1_entries.iter_mut() {
            t1_entry.initialize(0, 0);
        }

        for i in 0..TIER3_REDUCTION {
            let slot = self.t3_cursor % TABLE_SIZE;
            let demoted = self.entries[slot];
            self.t1_entries[i].initialize(demoted.pc(), demoted.last_address());
            self.entries[slot].initialize(0, 0);
            self.t3_cursor = (slot + 1) % TABLE_SIZE;
        }

        // One downward pass shifts live entries over the freed slots. The
        // top slot keeps whatever it held; it falls outside the live region
        // and goes dormant.
        for i in (0..TABLE_SIZE).rev() {
            if remaining == 0 {
                break;
            }
            if self.entries[i].pc() == 0 {
                for j in i..TABLE_SIZE - 1 {
                    self.entries[j] = self.entries[j + 1];
                }
                remaining -= 1;
            }
        }

        self.mode = TableMode::Tiered;
        self.t3_live = TABLE_SIZE - TIER3_REDUCTION;
        self.t1_live = TIER1_SIZE;
        self.t3_cursor %= self.t3_live;
        self.t1_cursor = remaining % TIER1_SIZE;
        debug!("compressed into tiered organization");
    }

    /// Logical bytes occupied by the live regions of both tables.
    pub fn logical_bytes(&self) -> usize {
        self.t3_live * TIER3_ENTRY_SIZE + self.t1_live * TIER1_ENTRY_SIZE
    }
}

impl Default for TierStore {
    fn default() -> Self {
        Self::new()
    }
}
