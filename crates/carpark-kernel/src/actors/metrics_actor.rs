//! MetricsActor: single owner of the metrics snapshot.
//!
//! Every component reports outcomes here as discrete events; the snapshot
//! is never read-modified by anything else. Each mutation is forwarded to
//! the display sink as a fire-and-forget notification.

use std::sync::Arc;

use acton_reactive::prelude::*;
use tracing::trace;

use crate::messages::{
    BayClassified, CarCreated, CarDeparted, CarParked, MetricsReport, PublishSnapshot,
    QueueWaitSample, TickElapsed,
};
use crate::metrics::{DisplaySink, MetricsSnapshot};

/// Actor state for the metrics aggregator.
#[derive(Default, Clone)]
pub struct MetricsActorState {
    snapshot: MetricsSnapshot,
    sink: Option<Arc<dyn DisplaySink>>,
}

impl std::fmt::Debug for MetricsActorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsActorState")
            .field("snapshot", &self.snapshot)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

/// Aggregator for fuel, emissions, utilization, and queue wait.
pub struct MetricsActor {
    pub sink: Arc<dyn DisplaySink>,
    pub total_bays: u32,
}

impl MetricsActor {
    pub fn new(sink: Arc<dyn DisplaySink>, total_bays: u32) -> Self {
        Self { sink, total_bays }
    }

    /// Spawn the metrics actor in the given runtime.
    pub async fn spawn(self, runtime: &mut ActorRuntime) -> ActorHandle {
        let mut actor =
            runtime.new_actor_with_name::<MetricsActorState>("MetricsActor".to_string());

        actor.model.snapshot = MetricsSnapshot::with_capacity(self.total_bays);
        actor.model.sink = Some(self.sink);

        configure_metrics(&mut actor);

        actor.start().await
    }
}

fn configure_metrics(actor: &mut ManagedActor<Idle, MetricsActorState>) {
    // Classification results only pass through to the sink
    actor.act_on::<BayClassified>(|actor, context| {
        let msg = context.message();
        if let Some(sink) = actor.model.sink.as_ref() {
            sink.on_bay_classified(&msg.bay, msg.kind, msg.distance);
        }
        Reply::ready()
    });

    actor.mutate_on::<CarCreated>(|actor, _context| {
        actor.model.snapshot.cars_created += 1;
        if let Some(sink) = actor.model.sink.as_ref() {
            sink.on_car_created();
        }
        Reply::ready()
    });

    actor.mutate_on::<CarParked>(|actor, context| {
        let msg = context.message();
        actor.model.snapshot.record_parked(msg.distance, &msg.car);

        let snapshot = &actor.model.snapshot;
        trace!(
            plate = %msg.car.plate,
            parked = snapshot.cars_parked,
            utilization = format!("{:.1}", snapshot.utilization),
            "parking recorded"
        );

        if let Some(sink) = actor.model.sink.as_ref() {
            sink.on_cars_parked(snapshot.cars_parked);
            sink.on_utilization(snapshot.utilization);
            if !msg.car.is_electric() {
                sink.on_fuel_used(snapshot.fuel_litres);
                sink.on_emissions(snapshot.emissions_grams);
            }
        }
        Reply::ready()
    });

    actor.mutate_on::<CarDeparted>(|actor, context| {
        let msg = context.message();
        actor.model.snapshot.record_departed();
        trace!(plate = %msg.plate, "departure recorded");
        if let Some(sink) = actor.model.sink.as_ref() {
            sink.on_utilization(actor.model.snapshot.utilization);
        }
        Reply::ready()
    });

    actor.mutate_on::<QueueWaitSample>(|actor, context| {
        let wait_ms = context.message().wait_ms;
        actor.model.snapshot.queue_wait_ms += wait_ms;
        if let Some(sink) = actor.model.sink.as_ref() {
            sink.on_queue_wait_sample(wait_ms);
        }
        Reply::ready()
    });

    actor.mutate_on::<TickElapsed>(|actor, context| {
        let now_ms = context.message().now_ms;
        actor.model.snapshot.elapsed_ms = now_ms;
        if let Some(sink) = actor.model.sink.as_ref() {
            sink.on_tick(now_ms);
        }
        Reply::ready()
    });

    // Broadcast the snapshot so the harness bridge can pick it up
    actor.act_on::<PublishSnapshot>(|actor, _context| {
        let report = MetricsReport {
            snapshot: actor.model.snapshot.clone(),
        };
        let broker = actor.broker().clone();

        Reply::pending(async move {
            broker.broadcast(report).await;
        })
    });
}
