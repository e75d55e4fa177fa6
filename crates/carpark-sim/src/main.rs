//! Carpark simulation CLI.
//!
//! Spawns a grid of bay actors and a stream of car actors, runs the
//! negotiation protocol for a fixed number of ticks, and reports fuel,
//! emissions, utilization, and queue-wait totals.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use carpark_kernel::metrics::LogSink;
use carpark_kernel::{AllocationStrategy, SimConfig};
use carpark_sim::results::SimulationResult;
use carpark_sim::runner::SimulationRunner;

/// Generate a timestamped output path from the given path.
/// e.g., "results.json" -> "results-20260806-010530.json"
fn timestamped_path(path: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("results");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("json");
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!("{}-{}.{}", stem, timestamp, ext))
}

#[derive(Parser)]
#[command(name = "carpark-sim")]
#[command(version)]
#[command(about = "Autonomous carpark negotiation simulator")]
struct Cli {
    /// Grid width in bays (max 25)
    #[arg(long, default_value = "10")]
    width: u32,

    /// Grid length in bays (max 15)
    #[arg(long, default_value = "10")]
    length: u32,

    /// Minimum parking duration in minutes (>= 10)
    #[arg(long, default_value = "10")]
    min_duration: u32,

    /// Maximum parking duration in minutes (<= 300)
    #[arg(long, default_value = "60")]
    max_duration: u32,

    /// Probability (0-100) that a car is electric
    #[arg(long, default_value = "20")]
    electric_percent: u32,

    /// Probability (0-100) that a car needs accessible parking
    #[arg(long, default_value = "5")]
    accessible_percent: u32,

    /// Car spawn / admission polling interval in milliseconds
    #[arg(long, default_value = "1000")]
    spawn_interval_ms: u64,

    /// Parked-countdown interval in milliseconds (10 minutes per tick)
    #[arg(long, default_value = "1000")]
    duration_tick_ms: u64,

    /// Allocation strategy: closest_first or efficiency_aware
    #[arg(long, default_value = "closest_first")]
    strategy: String,

    /// Model ticks to run (one car spawns per tick)
    #[arg(long, default_value = "60")]
    ticks: u64,

    /// Random seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output file for JSON results
    #[arg(long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    let config = SimConfig {
        grid_width: cli.width,
        grid_length: cli.length,
        min_duration: cli.min_duration,
        max_duration: cli.max_duration,
        electric_percent: cli.electric_percent,
        accessible_percent: cli.accessible_percent,
        spawn_interval_ms: cli.spawn_interval_ms,
        duration_tick_ms: cli.duration_tick_ms,
        strategy: parse_strategy(&cli.strategy)?,
    };
    config
        .validate()
        .context("rejected before simulation start")?;

    let runner =
        SimulationRunner::new(config, cli.ticks, cli.seed).with_sink(Arc::new(LogSink));
    let result: SimulationResult = runner.run().await?;

    result.print_summary();

    if let Some(output) = cli.output {
        let path = timestamped_path(&output);
        result.save(&path)?;
        println!("Results saved to: {}", path.display());
    }

    Ok(())
}

fn parse_strategy(s: &str) -> Result<AllocationStrategy> {
    match s.to_lowercase().as_str() {
        "closest_first" | "closest-first" | "closest" | "fcfs" => {
            Ok(AllocationStrategy::ClosestFirst)
        }
        "efficiency_aware" | "efficiency-aware" | "efficiency" | "eco" => {
            Ok(AllocationStrategy::EfficiencyAware)
        }
        _ => anyhow::bail!(
            "Unknown strategy: {}. Valid: closest_first, efficiency_aware",
            s
        ),
    }
}
