//! The tiered delta-correlation tables.
//!
//! Storage is a fixed pool of full ("Tier-3") entries plus, in tiered mode,
//! a wider array of lightweight ("Tier-1") records. The constants below are
//! part of the prefetcher contract: geometry is sized so the logical byte
//! budget is conserved when the store reorganizes between its two modes.

/// Circular delta buffer
pub mod ring;
/// Tier-3 and Tier-1 entries, correlation, and the issue filter
pub mod entry;
/// In-flight prefetch queue
pub mod queue;
/// Both tables, victim cursors, and the mode reorganizer
pub mod store;

pub use entry::{TierOneEntry, TierThreeEntry};
pub use queue::PrefetchQueue;
pub use ring::DeltaRing;
pub use store::{TableMode, TierStore};

/// Number of Tier-3 entry slots (the physical storage pool).
pub const TABLE_SIZE: usize = 73;

/// Number of Tier-1 entry slots when the tiered organization is active.
pub const TIER1_SIZE: usize = 91;

/// Deltas retained per Tier-3 entry.
pub const NUM_DELTAS: usize = 23;

/// Logical size of a Tier-1 record: PC + last address.
pub const TIER1_ENTRY_SIZE: usize = 8;

/// Logical size of a full Tier-3 record: PC + last prefetch + delta ring +
/// write cursor.
pub const TIER3_ENTRY_SIZE: usize = 8 + 4 + NUM_DELTAS * 2 + 1;

/// How many Tier-1 records fit in one Tier-3 slot's footprint.
pub const TIER3_RATIO: usize = TIER3_ENTRY_SIZE / TIER1_ENTRY_SIZE;

/// Tier-3 slots surrendered to fund the Tier-1 array in tiered mode.
pub const TIER3_REDUCTION: usize = TABLE_SIZE - TIER1_SIZE / TIER3_RATIO;

/// Tier-1-miss ratio above which the store widens back into tiered mode.
pub const BUFFER_TOLERANCE: f64 = 0.40;

/// Hysteresis band; the downward threshold is `BUFFER_TOLERANCE - BUFFER_DEADZONE`.
pub const BUFFER_DEADZONE: f64 = 0.10;

/// In-flight prefetches tracked by the optional issue queue.
pub const PREFETCH_QUEUE_SIZE: usize = 32;
