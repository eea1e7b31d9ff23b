//! Configuration management for the prefetcher and its simulator harness.
//!
//! Only the parameters the contract leaves free are configurable here. The
//! table geometry and the mode thresholds are part of the contract and live
//! as constants in [`crate::table`].

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefetcher tunables
    pub prefetcher: PrefetcherConfig,

    /// Simulator workload settings
    pub sim: SimConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Tunables the prefetcher contract leaves open.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefetcherConfig {
    /// Counter value at which both hit counters are rescaled to avoid
    /// overflow drift. Must be at least 1.
    pub scale_threshold: u64,

    /// How far both counters are right-shifted at the rescale point.
    pub scale_bits: u32,

    /// Track in-flight prefetches in a small queue and suppress candidates
    /// that are already pending. `prefetch_complete` retires queue slots.
    pub use_prefetch_queue: bool,

    /// Reject replay deltas with magnitude above `max_replay_delta` instead
    /// of extrapolating through them. Off by default: the canonical policy
    /// is silent 16-bit truncation at insert time.
    pub reject_wild_deltas: bool,

    /// Magnitude cutoff applied when `reject_wild_deltas` is set.
    pub max_replay_delta: u16,
}

/// Workload settings consumed by the driver binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Workload shape: "stride", "scatter", or "blocks"
    pub workload: String,

    /// Number of access events to generate
    pub events: u64,

    /// Number of distinct program counters in the workload
    pub pcs: u64,

    /// Address stride for the stride/blocks workloads (bytes)
    pub stride: u64,

    /// RNG seed, so runs are reproducible
    pub seed: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for PrefetcherConfig {
    fn default() -> Self {
        Self {
            scale_threshold: 512,
            scale_bits: 8,
            use_prefetch_queue: true,
            reject_wild_deltas: false,
            max_replay_delta: 1000,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            workload: "stride".to_string(),
            events: 100_000,
            pcs: 64,
            stride: 64,
            seed: 0x5eed,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file plus environment
    /// overrides, falling back to defaults for everything unset.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Config::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(level) = env::var("DCPT_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(events) = env::var("DCPT_EVENTS") {
            self.sim.events = events
                .parse()
                .map_err(|e| Error::config(format!("Invalid event count: {}", e)))?;
        }

        if let Ok(workload) = env::var("DCPT_WORKLOAD") {
            self.sim.workload = workload;
        }

        if let Ok(seed) = env::var("DCPT_SEED") {
            self.sim.seed = seed
                .parse()
                .map_err(|e| Error::config(format!("Invalid seed: {}", e)))?;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.prefetcher.scale_threshold == 0 {
            return Err(Error::config("scale_threshold must be at least 1"));
        }

        if self.prefetcher.scale_bits >= 64 {
            return Err(Error::config("scale_bits must be below 64"));
        }

        match self.sim.workload.as_str() {
            "stride" | "scatter" | "blocks" => {}
            other => {
                return Err(Error::config(format!("Unknown workload: {}", other)));
            }
        }

        if self.sim.pcs == 0 {
            return Err(Error::config("Workload needs at least one PC"));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.prefetcher.scale_threshold, 512);
        assert_eq!(config.prefetcher.scale_bits, 8);
        assert!(config.prefetcher.use_prefetch_queue);
        assert!(!config.prefetcher.reject_wild_deltas);
    }

    #[test]
    fn test_from_file_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[prefetcher]\nscale_threshold = 1024\n\n[sim]\nworkload = \"blocks\"\nevents = 5000"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.prefetcher.scale_threshold, 1024);
        // Unset fields keep their defaults
        assert_eq!(config.prefetcher.scale_bits, 8);
        assert_eq!(config.sim.workload, "blocks");
        assert_eq!(config.sim.events, 5000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.prefetcher.scale_threshold = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sim.workload = "spiral".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}
