//! Host-side simulation harness.
//!
//! Everything here plays the *host* role from the prefetcher's point of
//! view: an in-memory cache model implementing [`CacheHost`], seeded
//! workload generators for the interesting access shapes, a plain-text
//! trace reader, and a run loop that wires them to a [`Prefetcher`].

use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::core::config::SimConfig;
use crate::core::error::{Error, Result};
use crate::core::types::{AccessStat, Addr};
use crate::engine::Prefetcher;
use crate::host::CacheHost;
use crate::table::store::TableMode;

/// In-memory stand-in for the cache hierarchy.
///
/// Issued prefetches enter the MSHR set immediately and move to the
/// resident set when completed, which is enough fidelity for the filter's
/// predicates to behave the way they do under a real simulator.
#[derive(Debug, Default)]
pub struct SimHost {
    resident: HashSet<Addr>,
    mshr: HashSet<Addr>,
    issued: Vec<Addr>,
}

impl SimHost {
    /// An empty host: nothing resident, nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a resident line, for scripting filter outcomes.
    pub fn insert_cached(&mut self, addr: Addr) {
        self.resident.insert(addr);
    }

    /// Every prefetch issued so far, in issue order.
    pub fn issued(&self) -> &[Addr] {
        &self.issued
    }

    /// Complete an outstanding prefetch: the line becomes resident.
    pub fn complete(&mut self, addr: Addr) {
        self.mshr.remove(&addr);
        self.resident.insert(addr);
    }
}

impl CacheHost for SimHost {
    fn in_cache(&self, addr: Addr) -> bool {
        self.resident.contains(&addr)
    }

    fn in_mshr_queue(&self, addr: Addr) -> bool {
        self.mshr.contains(&addr)
    }

    fn issue_prefetch(&mut self, addr: Addr) {
        self.mshr.insert(addr);
        self.issued.push(addr);
    }
}

/// Seeded generators for the workload shapes worth exercising.
pub struct TraceGenerator;

impl TraceGenerator {
    /// Interleaved stride streams: PCs take turns, each walking its own
    /// arithmetic progression.
    pub fn stride(events: u64, pcs: u64, stride: u64) -> Vec<AccessStat> {
        (0..events)
            .map(|i| {
                let pc = 1 + i % pcs;
                let step = i / pcs;
                AccessStat::new(pc, pc * 0x100_0000 + step * stride)
            })
            .collect()
    }

    /// Uniformly random PCs with strictly increasing unique addresses — a
    /// working set far too wide for the full table.
    pub fn scatter(events: u64, pcs: u64, seed: u64) -> Vec<AccessStat> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut addr = 0x10_000u64;
        (0..events)
            .map(|_| {
                addr += 64;
                AccessStat::new(1 + rng.gen_range(0..pcs), addr)
            })
            .collect()
    }

    /// Consecutive per-PC blocks, each a clean arithmetic progression — a
    /// narrow working set that rewards the flat organization.
    pub fn blocks(events: u64, pcs: u64, stride: u64) -> Vec<AccessStat> {
        let block = (events / pcs).max(1);
        (0..events)
            .map(|i| {
                let pc = 1 + (i / block) % pcs;
                let step = i % block;
                AccessStat::new(pc, pc * 0x100_0000 + step * stride)
            })
            .collect()
    }

    /// Build the workload a [`SimConfig`] describes.
    pub fn from_config(config: &SimConfig) -> Result<Vec<AccessStat>> {
        match config.workload.as_str() {
            "stride" => Ok(Self::stride(config.events, config.pcs, config.stride)),
            "scatter" => Ok(Self::scatter(config.events, config.pcs, config.seed)),
            "blocks" => Ok(Self::blocks(config.events, config.pcs, config.stride)),
            other => Err(Error::config(format!("Unknown workload: {}", other))),
        }
    }
}

/// Parse a plain-text trace: one `pc mem_addr` pair per line, decimal or
/// `0x`-prefixed hex. Blank lines and `#` comments are skipped.
pub fn parse_trace<R: BufRead>(reader: R) -> Result<Vec<AccessStat>> {
    let mut events = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut fields = trimmed.split_whitespace();
        let pc = parse_addr(fields.next(), line_no)?;
        let mem_addr = parse_addr(fields.next(), line_no)?;
        if fields.next().is_some() {
            return Err(Error::trace(format!(
                "line {}: expected `pc mem_addr`",
                line_no + 1
            )));
        }
        events.push(AccessStat::new(pc, mem_addr));
    }
    Ok(events)
}

/// Load a trace file from disk.
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<AccessStat>> {
    let file = std::fs::File::open(path)?;
    parse_trace(std::io::BufReader::new(file))
}

fn parse_addr(field: Option<&str>, line_no: usize) -> Result<Addr> {
    let field = field
        .ok_or_else(|| Error::trace(format!("line {}: missing field", line_no + 1)))?;
    let parsed = match field.strip_prefix("0x") {
        Some(hex) => Addr::from_str_radix(hex, 16),
        None => field.parse(),
    };
    parsed.map_err(|_| Error::trace(format!("line {}: bad address `{}`", line_no + 1, field)))
}

/// Summary of one simulated run.
#[derive(Debug, Clone)]
pub struct SimReport {
    /// Access events processed
    pub events: u64,
    /// Prefetches issued over the run
    pub issued: u64,
    /// Organization the store ended in
    pub final_mode: TableMode,
    /// Final `t1_hit` counter value
    pub t1_hit: u64,
    /// Final `prefetch_count` counter value
    pub prefetch_count: u64,
}

/// Drive a trace through the prefetcher.
///
/// Prefetches issued during one event complete just before the next —
/// a one-event latency model, enough to exercise the completion path.
pub fn run(prefetcher: &mut Prefetcher, host: &mut SimHost, trace: &[AccessStat]) -> SimReport {
    let mut completed = 0usize;
    for &stat in trace {
        while completed < host.issued.len() {
            let addr = host.issued[completed];
            host.complete(addr);
            prefetcher.complete(addr);
            completed += 1;
        }
        prefetcher.access(stat, host);
    }

    let (t1_hit, prefetch_count) = prefetcher.counters();
    let report = SimReport {
        events: trace.len() as u64,
        issued: host.issued.len() as u64,
        final_mode: prefetcher.mode(),
        t1_hit,
        prefetch_count,
    };
    info!(
        events = report.events,
        issued = report.issued,
        final_mode = ?report.final_mode,
        "run complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_host_tracks_lifecycle() {
        let mut host = SimHost::new();
        host.issue_prefetch(0x2000);
        assert!(host.in_mshr_queue(0x2000));
        assert!(!host.in_cache(0x2000));

        host.complete(0x2000);
        assert!(!host.in_mshr_queue(0x2000));
        assert!(host.in_cache(0x2000));
        assert_eq!(host.issued(), &[0x2000]);
    }

    #[test]
    fn test_scatter_is_deterministic_per_seed() {
        let a = TraceGenerator::scatter(500, 100, 7);
        let b = TraceGenerator::scatter(500, 100, 7);
        let c = TraceGenerator::scatter(500, 100, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_scatter_addresses_strictly_increase() {
        let trace = TraceGenerator::scatter(200, 50, 3);
        for pair in trace.windows(2) {
            assert!(pair[1].mem_addr > pair[0].mem_addr);
        }
    }

    #[test]
    fn test_blocks_keeps_pcs_contiguous() {
        let trace = TraceGenerator::blocks(1000, 10, 64);
        // Each PC's block runs to completion before the next PC starts.
        let mut seen = Vec::new();
        for stat in &trace {
            if seen.last() != Some(&stat.pc) {
                seen.push(stat.pc);
            }
        }
        assert_eq!(seen, (1..=10u64).collect::<Vec<_>>());
    }

    #[test]
    fn test_parse_trace_accepts_comments_and_hex() {
        let input = "# trace\n100 0x1000\n\n200 8192\n";
        let events = parse_trace(input.as_bytes()).unwrap();
        assert_eq!(
            events,
            vec![AccessStat::new(100, 0x1000), AccessStat::new(200, 8192)]
        );
    }

    #[test]
    fn test_parse_trace_rejects_garbage() {
        assert!(parse_trace("100".as_bytes()).is_err());
        assert!(parse_trace("100 nope".as_bytes()).is_err());
        assert!(parse_trace("100 200 300".as_bytes()).is_err());
    }

    #[test]
    fn test_run_reports_totals() {
        let mut prefetcher = Prefetcher::default();
        let mut host = SimHost::new();
        let trace = TraceGenerator::blocks(2000, 5, 64);

        let report = run(&mut prefetcher, &mut host, &trace);
        assert_eq!(report.events, 2000);
        assert!(report.issued > 0);
        assert!(report.prefetch_count > 0);
    }
}
