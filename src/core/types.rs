//! Fundamental value types shared across the prefetcher.

use serde::{Deserialize, Serialize};

/// Physical address as seen by the cache hierarchy.
///
/// Address `0` is reserved as the "empty" sentinel throughout the tables and
/// candidate buffers; the host guarantees it is never a real access target.
pub type Addr = u64;

/// Signed difference between two consecutive addresses touched by one PC.
///
/// 16 bits are plenty for the access patterns worth correlating; wider jumps
/// truncate and the resulting entry self-corrects as it is overwritten.
pub type Delta = i16;

/// One memory-access event delivered by the host simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessStat {
    /// Program counter of the load/store instruction.
    pub pc: Addr,
    /// Address the instruction accessed.
    pub mem_addr: Addr,
}

impl AccessStat {
    /// Convenience constructor used heavily by the simulator and tests.
    pub fn new(pc: Addr, mem_addr: Addr) -> Self {
        Self { pc, mem_addr }
    }
}
