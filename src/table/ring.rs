//! Fixed-width circular buffer of deltas.

use crate::core::types::Delta;
use crate::table::NUM_DELTAS;

/// Ring of the last [`NUM_DELTAS`] deltas observed for one PC.
///
/// Indexing is Euclidean-modular over any signed integer: negative indices
/// count back from the end and indices past the end wrap forward. The
/// correlation walk starts below the write cursor and reads across the ring
/// seam, so both directions matter. There is no separate length — the ring
/// is always `NUM_DELTAS` wide and logically full of zeros until written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaRing {
    slots: [Delta; NUM_DELTAS],
}

impl DeltaRing {
    /// A ring with every slot zeroed.
    pub fn new() -> Self {
        Self {
            slots: [0; NUM_DELTAS],
        }
    }

    /// Read the delta at `index`, wrapping in either direction.
    pub fn get(&self, index: i64) -> Delta {
        self.slots[Self::slot(index)]
    }

    /// Write `delta` at `index`, wrapping in either direction.
    pub fn set(&mut self, index: i64, delta: Delta) {
        self.slots[Self::slot(index)] = delta;
    }

    /// Clear every slot, readying the ring for a recycled entry.
    pub fn zero(&mut self) {
        self.slots = [0; NUM_DELTAS];
    }

    // Truncated modulo would send negative indices out of range; Euclidean
    // keeps the result in [0, NUM_DELTAS).
    fn slot(index: i64) -> usize {
        index.rem_euclid(NUM_DELTAS as i64) as usize
    }
}

impl Default for DeltaRing {
    fn default() -> Self {
        Self::new()
    }
}
