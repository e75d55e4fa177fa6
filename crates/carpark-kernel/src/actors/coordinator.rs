//! Coordinator: singleton owner of the admission queue and bay directory.
//!
//! The queue and directory are plain structs mutated only through this
//! actor's mailbox, so enqueue, head checks, and dequeue are linearizable
//! with respect to each other. Bay classification runs concurrently with
//! no completion barrier: a car admitted early sees whatever slice of the
//! directory has answered so far.

use std::collections::HashMap;

use acton_reactive::prelude::*;
use mti::prelude::*;
use tracing::{debug, info, trace, warn};

use crate::bay::{BayId, BayKind, BayRef};
use crate::messages::{
    AdmissionGranted, AdmissionPoll, AdmissionTick, BayClassified, CarCreated, ClassifyBays,
    CountdownTick, DequeueCar, DurationTick, EnqueueCar, EnqueueOutcome, KindQuery, KindReply,
    QueueWaitSample, RegisterBays, Tick, TickElapsed,
};
use crate::queue::AdmissionQueue;

/// Actor state for the coordinator.
#[derive(Default, Clone)]
pub struct CoordinatorState {
    /// FIFO admission queue plus lifetime identity set.
    queue: AdmissionQueue,
    /// Registered but not necessarily classified bays.
    bays: Vec<(BayId, ActorHandle)>,
    /// Kind -> classified bays. Built once, immutable afterward.
    directory: HashMap<BayKind, Vec<BayRef>>,
    /// Correlation ID of the in-flight classification round.
    classify_correlation: Option<String>,
    classified: usize,
    metrics: Option<ActorHandle>,
    /// One denied poll books this much queue wait (the polling interval).
    wait_sample_ms: u64,
    self_handle: Option<ActorHandle>,
}

impl std::fmt::Debug for CoordinatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorState")
            .field("queue_len", &self.queue.len())
            .field("bays", &self.bays.len())
            .field("classified", &self.classified)
            .finish()
    }
}

/// Singleton coordinator actor.
///
/// Handles:
/// - `RegisterBays` / `ClassifyBays` / `KindReply` - directory construction
/// - `EnqueueCar` - admission with duplicate-identity rejection
/// - `Tick` / `DurationTick` - clock fan-out to cars
/// - `AdmissionPoll` - head-of-queue checks, booking queue wait on denial
/// - `DequeueCar` - removal at the moment negotiation succeeds
pub struct Coordinator {
    pub metrics: ActorHandle,
    /// Polling interval; the unit queue wait is measured in.
    pub wait_sample_ms: u64,
}

impl Coordinator {
    pub fn new(metrics: ActorHandle, wait_sample_ms: u64) -> Self {
        Self {
            metrics,
            wait_sample_ms,
        }
    }

    /// Spawn the coordinator in the given runtime.
    pub async fn spawn(self, runtime: &mut ActorRuntime) -> ActorHandle {
        let mut actor = runtime.new_actor_with_name::<CoordinatorState>("Coordinator".to_string());

        actor.model.metrics = Some(self.metrics);
        actor.model.wait_sample_ms = self.wait_sample_ms;
        actor.model.self_handle = Some(actor.handle().clone());

        configure_coordinator(&mut actor);

        actor.start().await
    }
}

fn configure_coordinator(actor: &mut ManagedActor<Idle, CoordinatorState>) {
    actor.mutate_on::<RegisterBays>(|actor, context| {
        let msg = context.message();
        actor.model.bays = msg.bays.clone();
        debug!(bays = actor.model.bays.len(), "bays registered");
        Reply::ready()
    });

    // Fire one kind query per bay under a single correlation ID. Replies
    // fold into the directory as they land; nothing waits for the set to
    // complete.
    actor.mutate_on::<ClassifyBays>(|actor, _context| {
        let correlation_id = "classify".create_type_id::<V7>().to_string();
        actor.model.classify_correlation = Some(correlation_id.clone());
        actor.model.classified = 0;

        let Some(reply_to) = actor.model.self_handle.clone() else {
            warn!("Coordinator: self handle not set");
            return Reply::ready();
        };

        let targets: Vec<ActorHandle> =
            actor.model.bays.iter().map(|(_, h)| h.clone()).collect();

        trace!(
            correlation_id = %correlation_id,
            bays = targets.len(),
            "starting bay classification"
        );

        Reply::pending(async move {
            for handle in targets {
                handle
                    .send(KindQuery {
                        correlation_id: correlation_id.clone(),
                        reply_to: reply_to.clone(),
                    })
                    .await;
            }
        })
    });

    actor.mutate_on::<KindReply>(|actor, context| {
        let msg = context.message().clone();

        if actor.model.classify_correlation.as_deref() != Some(msg.correlation_id.as_str()) {
            warn!(
                correlation_id = %msg.correlation_id,
                bay = %msg.bay,
                "kind reply for unknown classification round"
            );
            return Reply::ready();
        }

        let Some(handle) = actor
            .model
            .bays
            .iter()
            .find(|(id, _)| *id == msg.bay)
            .map(|(_, h)| h.clone())
        else {
            warn!(bay = %msg.bay, "kind reply from unregistered bay");
            return Reply::ready();
        };

        actor.model.directory.entry(msg.kind).or_default().push(BayRef {
            id: msg.bay.clone(),
            handle,
        });
        actor.model.classified += 1;

        if actor.model.classified == actor.model.bays.len() {
            let count = |kind: BayKind| {
                actor
                    .model
                    .directory
                    .get(&kind)
                    .map(|bays| bays.len())
                    .unwrap_or(0)
            };
            info!(
                standard = count(BayKind::Standard),
                accessible = count(BayKind::Accessible),
                electric = count(BayKind::ElectricCharging),
                "bay directory complete"
            );
        }

        let metrics = actor.model.metrics.clone();
        Reply::pending(async move {
            if let Some(metrics) = metrics {
                metrics
                    .send(BayClassified {
                        bay: msg.bay,
                        kind: msg.kind,
                        distance: msg.distance,
                    })
                    .await;
            }
        })
    });

    actor.mutate_on::<EnqueueCar>(|actor, context| {
        let msg = context.message().clone();
        let metrics = actor.model.metrics.clone();

        match actor.model.queue.enqueue(&msg.plate) {
            Ok(()) => {
                debug!(
                    plate = %msg.plate,
                    queue_len = actor.model.queue.len(),
                    "car enqueued"
                );
                Reply::pending(async move {
                    msg.reply_to.send(EnqueueOutcome { accepted: true }).await;
                    if let Some(metrics) = metrics {
                        metrics.send(CarCreated).await;
                    }
                })
            }
            Err(duplicate) => {
                warn!(error = %duplicate, "car rejected before entering the queue");
                Reply::pending(async move {
                    msg.reply_to.send(EnqueueOutcome { accepted: false }).await;
                })
            }
        }
    });

    // Model tick: fan out to cars and report elapsed time
    actor.act_on::<Tick>(|actor, context| {
        let now_ms = context.message().now_ms;
        let broker = actor.broker().clone();
        let metrics = actor.model.metrics.clone();

        Reply::pending(async move {
            broker.broadcast(AdmissionTick { now_ms }).await;
            if let Some(metrics) = metrics {
                metrics.send(TickElapsed { now_ms }).await;
            }
        })
    });

    actor.act_on::<DurationTick>(|actor, _context| {
        let broker = actor.broker().clone();
        Reply::pending(async move {
            broker.broadcast(CountdownTick).await;
        })
    });

    // Head-of-queue check. Only the head gets a grant; every other poller
    // costs its car one polling interval of recorded queue wait.
    actor.act_on::<AdmissionPoll>(|actor, context| {
        let msg = context.message().clone();

        if actor.model.queue.head_is_eligible(&msg.plate) {
            let slice = |kind: BayKind| {
                actor
                    .model
                    .directory
                    .get(&kind)
                    .cloned()
                    .unwrap_or_default()
            };
            let grant = AdmissionGranted {
                preferred: slice(msg.preferred),
                standard: slice(BayKind::Standard),
            };

            trace!(
                plate = %msg.plate,
                preferred = grant.preferred.len(),
                standard = grant.standard.len(),
                "admission granted"
            );

            Reply::pending(async move {
                msg.reply_to.send(grant).await;
            })
        } else {
            let metrics = actor.model.metrics.clone();
            let wait_ms = actor.model.wait_sample_ms;
            Reply::pending(async move {
                if let Some(metrics) = metrics {
                    metrics.send(QueueWaitSample { wait_ms }).await;
                }
            })
        }
    });

    actor.mutate_on::<DequeueCar>(|actor, context| {
        let plate = context.message().plate.clone();
        actor.model.queue.dequeue(&plate);
        debug!(
            plate = %plate,
            queue_len = actor.model.queue.len(),
            "car dequeued"
        );
        Reply::ready()
    });
}
