//! Results collection and output for simulation runs.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carpark_kernel::{MetricsSnapshot, SimConfig};

/// Results from a single simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Configuration the run used
    pub config: SimConfig,
    /// Seed the generators used, when fixed
    pub seed: Option<u64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Model ticks driven (one car spawned per tick)
    pub model_ticks: u64,
    /// Cars still waiting in the queue when the run ended
    pub cars_waiting: u64,
    /// Final metrics snapshot
    pub metrics: MetricsSnapshot,
}

impl SimulationResult {
    /// Write the results as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Print the closing console report.
    pub fn print_summary(&self) {
        let metrics = &self.metrics;
        let avg_wait_ms = if metrics.cars_created == 0 {
            0
        } else {
            metrics.queue_wait_ms / metrics.cars_created
        };

        println!("++++++++++++++++++++++++++++++++++++++++++++++++++++++++++");
        println!("{} cars parked.", metrics.cars_parked);
        println!("{:.3} (L) of fuel", metrics.fuel_litres);
        println!("{:.3} (kg) of CO2", metrics.emissions_grams / 1000.0);
        println!("Utilization: {:.1}%", metrics.utilization);
        println!("Average queue wait: {avg_wait_ms} ms");
        println!("Cars still queued: {}", self.cars_waiting);
        println!("++++++++++++++++++++++++++++++++++++++++++++++++++++++++++");
    }
}
