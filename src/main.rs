//! Trace-driven driver for the tiered DCPT prefetcher.
//!
//! Feeds a synthetic workload or a recorded trace through the prefetcher
//! against the in-memory host model and reports what happened.

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use tracing::info;

use tiered_dcpt::core::config::Config;
use tiered_dcpt::engine::Prefetcher;
use tiered_dcpt::sim::{self, SimHost, TraceGenerator};
use tiered_dcpt::system::metrics;

fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("tiered-dcpt")
        .version(tiered_dcpt::VERSION)
        .about("Tiered DCPT prefetcher simulator")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("trace")
                .short('t')
                .long("trace")
                .value_name("FILE")
                .help("Text trace to replay instead of a synthetic workload"),
        )
        .arg(
            Arg::new("workload")
                .short('w')
                .long("workload")
                .value_name("SHAPE")
                .help("Synthetic workload shape: stride, scatter, or blocks"),
        )
        .arg(
            Arg::new("metrics")
                .long("metrics")
                .action(ArgAction::SetTrue)
                .help("Dump the Prometheus counters after the run"),
        )
        .get_matches();

    // Load configuration
    let config_path = matches.get_one::<String>("config").map(|s| s.as_str());
    let mut config = Config::load(config_path)?;
    if let Some(workload) = matches.get_one::<String>("workload") {
        config.sim.workload = workload.clone();
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone())),
        )
        .init();
    metrics::init_registry();

    info!("Starting {} v{}", tiered_dcpt::NAME, tiered_dcpt::VERSION);

    let trace = match matches.get_one::<String>("trace") {
        Some(path) => sim::load_trace(path)?,
        None => TraceGenerator::from_config(&config.sim)?,
    };

    let mut prefetcher = Prefetcher::new(config.prefetcher.clone());
    let mut host = SimHost::new();
    let report = sim::run(&mut prefetcher, &mut host, &trace);

    info!(
        events = report.events,
        issued = report.issued,
        t1_hit = report.t1_hit,
        prefetch_count = report.prefetch_count,
        final_mode = ?report.final_mode,
        "simulation finished"
    );

    if matches.get_flag("metrics") {
        print!("{}", metrics::collect_metrics());
    }

    Ok(())
}
