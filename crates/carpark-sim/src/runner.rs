//! Simulation runner: owns the actor runtime and the two clocks.
//!
//! Orchestrates one run:
//! 1. Validate configuration and generate the bay layout
//! 2. Spawn metrics, bridge, coordinator, and bay actors; classify bays
//! 3. Drive the model clock (spawn one car + admission tick per interval)
//!    and the countdown clock until the requested ticks have elapsed
//! 4. Publish and collect the final metrics snapshot

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use rand::prelude::*;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, warn};

use acton_reactive::prelude::*;

use carpark_kernel::actors::{BayActor, CarActor, Coordinator, MetricsActor};
use carpark_kernel::messages::{ClassifyBays, DurationTick, PublishSnapshot, RegisterBays, Tick};
use carpark_kernel::{DisplaySink, NullSink, SimConfig};

use crate::bridge::SnapshotBridge;
use crate::generator::{generate_layout, VehicleGenerator};
use crate::results::SimulationResult;

/// One simulation run, driven for a fixed number of model ticks.
pub struct SimulationRunner {
    config: SimConfig,
    ticks: u64,
    seed: Option<u64>,
    sink: Arc<dyn DisplaySink>,
}

impl SimulationRunner {
    pub fn new(config: SimConfig, ticks: u64, seed: Option<u64>) -> Self {
        Self {
            config,
            ticks,
            seed,
            sink: Arc::new(NullSink),
        }
    }

    /// Replace the display sink (the CLI installs a logging sink; tests
    /// install recorders).
    pub fn with_sink(mut self, sink: Arc<dyn DisplaySink>) -> Self {
        self.sink = sink;
        self
    }

    /// Run the simulation to completion and collect the results.
    pub async fn run(&self) -> Result<SimulationResult> {
        self.config.validate().context("invalid configuration")?;

        let started_at = Utc::now();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::rng().random()),
        };

        let layout = generate_layout(&self.config, &mut rng);
        let mut vehicles = VehicleGenerator::new(&self.config, rng);

        let mut runtime = ActonApp::launch_async().await;

        let metrics = MetricsActor::new(self.sink.clone(), layout.len() as u32)
            .spawn(&mut runtime)
            .await;

        let (tx, mut rx) = mpsc::channel(4);
        SnapshotBridge::new(tx).spawn(&mut runtime).await;

        let coordinator = Coordinator::new(metrics.clone(), self.config.spawn_interval_ms)
            .spawn(&mut runtime)
            .await;

        let mut bays = Vec::with_capacity(layout.len());
        for spec in &layout {
            let handle = BayActor::new(spec).spawn(&mut runtime).await;
            bays.push((spec.id.clone(), handle));
        }
        coordinator.send(RegisterBays { bays }).await;
        coordinator.send(ClassifyBays).await;

        info!(
            bays = layout.len(),
            ticks = self.ticks,
            strategy = self.config.strategy.name(),
            "starting simulation"
        );

        let start = Instant::now();
        let mut model_clock = time::interval(Duration::from_millis(self.config.spawn_interval_ms));
        let mut countdown_clock =
            time::interval(Duration::from_millis(self.config.duration_tick_ms));

        let mut spawned = 0u64;
        while spawned < self.ticks {
            tokio::select! {
                _ = model_clock.tick() => {
                    let now_ms = start.elapsed().as_millis() as u64;
                    coordinator.send(Tick { now_ms }).await;

                    let profile = vehicles.next_profile();
                    debug!(
                        plate = %profile.plate,
                        kind = ?profile.kind,
                        duration_min = profile.duration_min,
                        "spawning car"
                    );
                    CarActor {
                        profile,
                        coordinator: coordinator.clone(),
                        metrics: metrics.clone(),
                        strategy: self.config.strategy,
                    }
                    .spawn(&mut runtime)
                    .await;

                    spawned += 1;
                }
                _ = countdown_clock.tick() => {
                    coordinator.send(DurationTick).await;
                }
            }
        }

        // Let in-flight negotiations settle before sampling the totals
        time::sleep(Duration::from_millis(self.config.duration_tick_ms)).await;

        metrics.send(PublishSnapshot).await;
        let snapshot = time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .context("timed out waiting for the metrics snapshot")?
            .context("metrics bridge closed before reporting")?;

        if runtime.shutdown_all().await.is_err() {
            warn!("actor runtime shutdown reported errors");
        }

        let cars_waiting = snapshot.cars_created.saturating_sub(snapshot.cars_parked);

        Ok(SimulationResult {
            config: self.config.clone(),
            seed: self.seed,
            started_at,
            ended_at: Utc::now(),
            model_ticks: spawned,
            cars_waiting,
            metrics: snapshot,
        })
    }
}
