//! CarActor: the negotiation state machine.
//!
//! A car enters the admission queue on spawn, polls for the queue head on
//! every admission tick, and once admitted runs broadcast/collect/commit/
//! confirm rounds until a bay confirms its reservation. Each round carries
//! a fresh correlation ID; replies from abandoned rounds are dropped.
//!
//! Races are recovered locally: a rejected reservation restarts the
//! broadcast with the same relaxation state, never surfacing an error. A
//! relaxed broadcast that attracts no offers stalls the car back into the
//! queue (it is still the head), with a rate-limited warning so operators
//! can see cars that never make progress.

use std::collections::HashMap;

use acton_reactive::prelude::*;
use mti::prelude::*;
use tracing::{debug, info, trace, warn};

use crate::bay::{BayId, BayRef};
use crate::messages::{
    AdmissionGranted, AdmissionPoll, AdmissionTick, CarDeparted, CarParked, CountdownTick,
    DequeueCar, EnqueueCar, EnqueueOutcome, ProposalDecision, ProposalReply, ProposalRequest,
    ReleaseReply, ReleaseRequest, ReservationOutcome, ReservationReply, ReservationRequest,
};
use crate::strategy::{AllocationStrategy, Offer};
use crate::vehicle::{CarProfile, CarState};

/// Minutes of desired duration burned per countdown tick.
const MINUTES_PER_COUNTDOWN_TICK: i64 = 10;
/// Emit a "still negotiating" warning every this many fruitless rounds.
const STALL_WARN_ROUNDS: u32 = 8;

/// Directory slices snapshotted from the most recent admission grant.
#[derive(Debug, Clone, Default)]
struct DirectorySlices {
    preferred: Vec<BayRef>,
    standard: Vec<BayRef>,
}

/// One broadcast/collect/commit round.
#[derive(Debug, Clone)]
struct NegotiationRound {
    correlation_id: String,
    /// CFPs sent; the collect phase waits for exactly this many replies.
    expected: usize,
    replies: usize,
    offers: Vec<Offer>,
    /// Mailboxes of the solicited bays, for the commit step.
    targets: HashMap<BayId, ActorHandle>,
    /// The winning offer once commit has been sent.
    committed: Option<Offer>,
}

/// Actor state for a single car.
#[derive(Default, Clone)]
pub struct CarActorState {
    profile: CarProfile,
    state: CarState,
    /// Minutes left once parked.
    remaining_min: i64,
    /// Held bay; set iff state is Parked or Leaving.
    reserved: Option<BayRef>,
    coordinator: Option<ActorHandle>,
    metrics: Option<ActorHandle>,
    strategy: AllocationStrategy,
    /// One-time relaxation to the standard-bay set. Once set it is never
    /// re-rolled within this car's negotiation, including race restarts.
    relaxed: bool,
    directory: Option<DirectorySlices>,
    round: Option<NegotiationRound>,
    /// Fruitless rounds since the last park, for the stall warning.
    rounds: u32,
    self_handle: Option<ActorHandle>,
}

impl std::fmt::Debug for CarActorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarActorState")
            .field("plate", &self.profile.plate)
            .field("state", &self.state)
            .field("relaxed", &self.relaxed)
            .field("round", &self.round.is_some())
            .finish()
    }
}

/// Actor representing one car and driver.
pub struct CarActor {
    pub profile: CarProfile,
    pub coordinator: ActorHandle,
    pub metrics: ActorHandle,
    pub strategy: AllocationStrategy,
}

impl CarActor {
    /// Spawn this car actor in the given runtime.
    ///
    /// The car subscribes to the clock broadcasts before starting, then
    /// announces itself to the coordinator for admission.
    pub async fn spawn(self, runtime: &mut ActorRuntime) -> ActorHandle {
        let plate = self.profile.plate.clone();
        let mut actor = runtime.new_actor_with_name::<CarActorState>(format!("Car:{plate}"));

        actor.model.profile = self.profile;
        actor.model.state = CarState::Queued;
        actor.model.coordinator = Some(self.coordinator.clone());
        actor.model.metrics = Some(self.metrics);
        actor.model.strategy = self.strategy;
        actor.model.self_handle = Some(actor.handle().clone());

        actor.handle().subscribe::<AdmissionTick>().await;
        actor.handle().subscribe::<CountdownTick>().await;

        let coordinator = self.coordinator;
        let self_handle = actor.handle().clone();
        actor.after_start(move |_actor| {
            let coordinator = coordinator.clone();
            let enqueue = EnqueueCar {
                plate: plate.clone(),
                reply_to: self_handle.clone(),
            };
            Reply::pending(async move {
                coordinator.send(enqueue).await;
            })
        });

        configure_car(&mut actor);

        actor.start().await
    }
}

/// Start a broadcast round from the snapshotted directory, applying the
/// one-time relaxation when the preferred set is empty. Returns the CFPs
/// to send; an empty list means the car was stalled back into the queue.
fn begin_round(model: &mut CarActorState) -> Vec<(ActorHandle, ProposalRequest)> {
    let (targets, used_standard) = match model.directory.as_ref() {
        Some(dir) if !model.relaxed && !dir.preferred.is_empty() => (dir.preferred.clone(), false),
        Some(dir) => (dir.standard.clone(), true),
        None => (Vec::new(), model.relaxed),
    };

    if used_standard && !model.relaxed {
        debug!(
            plate = %model.profile.plate,
            "no bays of preferred kind; relaxing broadcast to standard bays"
        );
        model.relaxed = true;
    }

    model.rounds += 1;

    if targets.is_empty() {
        return_to_queue(model);
        return Vec::new();
    }

    let Some(reply_to) = model.self_handle.clone() else {
        warn!(plate = %model.profile.plate, "car has no self handle; cannot broadcast");
        return Vec::new();
    };

    let correlation_id = "cfp".create_type_id::<V7>().to_string();

    trace!(
        plate = %model.profile.plate,
        correlation_id = %correlation_id,
        bays = targets.len(),
        relaxed = model.relaxed,
        "broadcasting call for proposals"
    );

    model.round = Some(NegotiationRound {
        correlation_id: correlation_id.clone(),
        expected: targets.len(),
        replies: 0,
        offers: Vec::new(),
        targets: targets
            .iter()
            .map(|bay| (bay.id.clone(), bay.handle.clone()))
            .collect(),
        committed: None,
    });

    targets
        .into_iter()
        .map(|bay| {
            (
                bay.handle,
                ProposalRequest {
                    correlation_id: correlation_id.clone(),
                    plate: model.profile.plate.clone(),
                    reply_to: reply_to.clone(),
                },
            )
        })
        .collect()
}

/// Abandon the current round and wait for a later admission tick. The car
/// is still the queue head, so this is a retry, not a surrender.
fn return_to_queue(model: &mut CarActorState) {
    model.round = None;
    model.state = CarState::Queued;
    if model.rounds % STALL_WARN_ROUNDS == 0 {
        warn!(
            plate = %model.profile.plate,
            rounds = model.rounds,
            "still negotiating: no offers available"
        );
    }
}

/// Configure message handlers for the CarActor.
fn configure_car(actor: &mut ManagedActor<Idle, CarActorState>) {
    actor.mutate_on::<EnqueueOutcome>(|actor, context| {
        if !context.message().accepted {
            // Identity collision; the generator owns regeneration, this
            // car never entered the queue and goes inert.
            warn!(plate = %actor.model.profile.plate, "enqueue rejected; car terminating");
            actor.model.state = CarState::Done;
        }
        Reply::ready()
    });

    // Poll for the queue head while waiting
    actor.act_on::<AdmissionTick>(|actor, _context| {
        if actor.model.state != CarState::Queued {
            return Reply::ready();
        }

        let (Some(coordinator), Some(reply_to)) = (
            actor.model.coordinator.clone(),
            actor.model.self_handle.clone(),
        ) else {
            return Reply::ready();
        };

        let poll = AdmissionPoll {
            plate: actor.model.profile.plate.clone(),
            preferred: actor.model.profile.kind.preferred_bay(),
            reply_to,
        };

        Reply::pending(async move {
            coordinator.send(poll).await;
        })
    });

    // Admitted: snapshot the directory and open the first round
    actor.mutate_on::<AdmissionGranted>(|actor, context| {
        if actor.model.state != CarState::Queued {
            trace!(plate = %actor.model.profile.plate, "stale admission grant ignored");
            return Reply::ready();
        }
        let msg = context.message().clone();

        actor.model.state = CarState::Negotiating;
        actor.model.directory = Some(DirectorySlices {
            preferred: msg.preferred,
            standard: msg.standard,
        });

        let sends = begin_round(&mut actor.model);
        Reply::pending(async move {
            for (handle, request) in sends {
                handle.send(request).await;
            }
        })
    });

    // Collect phase: one reply per solicited bay
    actor.mutate_on::<ProposalReply>(|actor, context| {
        let msg = context.message().clone();
        let plate = actor.model.profile.plate.clone();

        let collect_done = {
            let Some(round) = actor.model.round.as_mut() else {
                return Reply::ready();
            };
            if round.correlation_id != msg.correlation_id || round.committed.is_some() {
                trace!(plate = %plate, "stale proposal reply dropped");
                return Reply::ready();
            }

            round.replies += 1;
            if let ProposalDecision::Offer { distance } = msg.decision {
                round.offers.push(Offer {
                    bay: msg.bay,
                    distance,
                });
            }
            // Fewer replies than CFPs sent: keep waiting, indefinitely.
            round.replies >= round.expected
        };

        if !collect_done {
            return Reply::ready();
        }

        let offers = actor
            .model
            .round
            .as_ref()
            .map(|round| round.offers.clone())
            .unwrap_or_default();

        if offers.is_empty() {
            if !actor.model.relaxed {
                // Preferred bays all refused: one-time relaxation, then
                // rebroadcast immediately.
                debug!(
                    plate = %actor.model.profile.plate,
                    "no offers from preferred bays; relaxing broadcast to standard bays"
                );
                actor.model.relaxed = true;
                actor.model.round = None;
                let sends = begin_round(&mut actor.model);
                return Reply::pending(async move {
                    for (handle, request) in sends {
                        handle.send(request).await;
                    }
                });
            }
            return_to_queue(&mut actor.model);
            return Reply::ready();
        }

        // Commit: accept exactly the winning offer
        let Some(winner_idx) = actor.model.strategy.select(&actor.model.profile, &offers) else {
            return Reply::ready();
        };
        let winner = offers[winner_idx].clone();

        let Some(reply_to) = actor.model.self_handle.clone() else {
            return Reply::ready();
        };
        let car = actor.model.profile.clone();

        let (target, request) = {
            let Some(round) = actor.model.round.as_mut() else {
                return Reply::ready();
            };
            round.committed = Some(winner.clone());
            let target = round.targets.get(&winner.bay).cloned();
            let request = ReservationRequest {
                correlation_id: round.correlation_id.clone(),
                car,
                reply_to,
            };
            (target, request)
        };

        trace!(
            plate = %actor.model.profile.plate,
            bay = %winner.bay,
            distance = winner.distance,
            "accepting winning offer"
        );

        Reply::pending(async move {
            if let Some(target) = target {
                target.send(request).await;
            }
        })
    });

    // Confirm phase
    actor.mutate_on::<ReservationReply>(|actor, context| {
        let msg = context.message().clone();

        let winner = {
            let Some(round) = actor.model.round.as_ref() else {
                return Reply::ready();
            };
            if round.correlation_id != msg.correlation_id {
                trace!(plate = %actor.model.profile.plate, "stale reservation reply dropped");
                return Reply::ready();
            }
            let Some(winner) = round.committed.clone() else {
                return Reply::ready();
            };
            winner
        };

        match msg.outcome {
            ReservationOutcome::Confirmed => {
                let handle = actor
                    .model
                    .round
                    .as_ref()
                    .and_then(|round| round.targets.get(&winner.bay).cloned());

                actor.model.state = CarState::Parked;
                actor.model.remaining_min = i64::from(actor.model.profile.duration_min);
                actor.model.reserved = handle.map(|handle| BayRef {
                    id: winner.bay.clone(),
                    handle,
                });
                actor.model.round = None;
                actor.model.rounds = 0;

                info!(
                    plate = %actor.model.profile.plate,
                    bay = %winner.bay,
                    distance = winner.distance,
                    duration_min = actor.model.profile.duration_min,
                    "car parked"
                );

                let coordinator = actor.model.coordinator.clone();
                let metrics = actor.model.metrics.clone();
                let parked = CarParked {
                    distance: winner.distance,
                    car: actor.model.profile.clone(),
                };
                let dequeue = DequeueCar {
                    plate: actor.model.profile.plate.clone(),
                };

                Reply::pending(async move {
                    if let Some(coordinator) = coordinator {
                        coordinator.send(dequeue).await;
                    }
                    if let Some(metrics) = metrics {
                        metrics.send(parked).await;
                    }
                })
            }
            ReservationOutcome::Rejected => {
                // Lost the race; discard the failed winner and rebroadcast
                // with the same relaxation state.
                debug!(
                    plate = %actor.model.profile.plate,
                    bay = %winner.bay,
                    "reservation lost to a faster competitor; restarting broadcast"
                );
                actor.model.round = None;
                let sends = begin_round(&mut actor.model);
                Reply::pending(async move {
                    for (handle, request) in sends {
                        handle.send(request).await;
                    }
                })
            }
        }
    });

    // Burn down the desired duration while parked
    actor.mutate_on::<CountdownTick>(|actor, _context| {
        if actor.model.state != CarState::Parked {
            return Reply::ready();
        }

        actor.model.remaining_min -= MINUTES_PER_COUNTDOWN_TICK;
        trace!(
            plate = %actor.model.profile.plate,
            remaining_min = actor.model.remaining_min,
            "duration tick"
        );
        if actor.model.remaining_min > 0 {
            return Reply::ready();
        }

        let Some(reserved) = actor.model.reserved.clone() else {
            warn!(plate = %actor.model.profile.plate, "parked car has no reserved bay");
            actor.model.state = CarState::Done;
            return Reply::ready();
        };
        let Some(reply_to) = actor.model.self_handle.clone() else {
            return Reply::ready();
        };

        actor.model.state = CarState::Leaving;

        let release = ReleaseRequest {
            correlation_id: "release".create_type_id::<V7>().to_string(),
            plate: actor.model.profile.plate.clone(),
            reply_to,
        };

        Reply::pending(async move {
            reserved.handle.send(release).await;
        })
    });

    // Release acknowledged: terminal state
    actor.mutate_on::<ReleaseReply>(|actor, context| {
        let msg = context.message().clone();
        if actor.model.state != CarState::Leaving {
            return Reply::ready();
        }

        actor.model.state = CarState::Done;
        actor.model.reserved = None;

        debug!(
            plate = %actor.model.profile.plate,
            bay = %msg.bay,
            outcome = ?msg.outcome,
            "car left the carpark"
        );

        let metrics = actor.model.metrics.clone();
        let departed = CarDeparted {
            plate: actor.model.profile.plate.clone(),
        };

        Reply::pending(async move {
            if let Some(metrics) = metrics {
                metrics.send(departed).await;
            }
        })
    });
}
