//! Message types for actor communication.
//!
//! Request/response pairs carry a correlation ID (via the mti crate) plus a
//! `reply_to` handle; receivers answer by sending directly to that handle,
//! and requesters drop any reply whose correlation ID does not match their
//! current round. This is what lets a car distinguish stale replies from
//! abandoned negotiation rounds.

use acton_reactive::prelude::ActorHandle;

use crate::bay::{BayId, BayKind, BayRef};
use crate::metrics::MetricsSnapshot;
use crate::vehicle::CarProfile;

// ============================================================================
// Clock messages
// ============================================================================

/// Model tick - sent by the harness to the coordinator once per spawn
/// interval.
#[derive(Debug, Clone)]
pub struct Tick {
    /// Simulated time elapsed, milliseconds.
    pub now_ms: u64,
}

/// Duration tick - sent by the harness to the coordinator on the countdown
/// cadence.
#[derive(Debug, Clone)]
pub struct DurationTick;

/// Rebroadcast of `Tick` to every car. Queued cars poll for admission on
/// this signal.
#[derive(Debug, Clone)]
pub struct AdmissionTick {
    pub now_ms: u64,
}

/// Rebroadcast of `DurationTick` to every car. Parked cars burn ten
/// minutes of desired duration per tick.
#[derive(Debug, Clone)]
pub struct CountdownTick;

// ============================================================================
// Coordinator messages
// ============================================================================

/// Register spawned bay actors with the coordinator. Sent by the harness
/// once, before classification.
#[derive(Debug, Clone)]
pub struct RegisterBays {
    pub bays: Vec<(BayId, ActorHandle)>,
}

/// Kick off bay classification: the coordinator queries every registered
/// bay's kind concurrently and folds replies into the directory as they
/// arrive (no completion barrier).
#[derive(Debug, Clone)]
pub struct ClassifyBays;

/// A freshly spawned car announcing itself for admission.
#[derive(Debug, Clone)]
pub struct EnqueueCar {
    pub plate: String,
    /// The car's own mailbox, for the enqueue outcome.
    pub reply_to: ActorHandle,
}

/// Coordinator's answer to `EnqueueCar`. `accepted = false` means the
/// plate collided with an identity already seen this run.
#[derive(Debug, Clone)]
pub struct EnqueueOutcome {
    pub accepted: bool,
}

/// A queued car asking whether it has reached the queue head. Denials get
/// no reply; the coordinator books one polling interval of queue wait
/// instead.
#[derive(Debug, Clone)]
pub struct AdmissionPoll {
    pub plate: String,
    pub preferred: BayKind,
    pub reply_to: ActorHandle,
}

/// Admission grant, carrying the directory slices the car may solicit.
/// The slices are snapshotted at grant time: a car admitted before
/// classification finishes sees only the bays that have answered so far.
#[derive(Debug, Clone)]
pub struct AdmissionGranted {
    /// Bays matching the car's preferred kind.
    pub preferred: Vec<BayRef>,
    /// The standard-bay set, the relaxation fallback.
    pub standard: Vec<BayRef>,
}

/// A car reporting successful negotiation; the coordinator removes it from
/// the queue immediately (not when it finishes parking).
#[derive(Debug, Clone)]
pub struct DequeueCar {
    pub plate: String,
}

// ============================================================================
// Bay protocol
// ============================================================================

/// Ask a bay for its kind. Always answerable regardless of occupancy.
#[derive(Debug, Clone)]
pub struct KindQuery {
    pub correlation_id: String,
    pub reply_to: ActorHandle,
}

/// Answer to `KindQuery`.
#[derive(Debug, Clone)]
pub struct KindReply {
    pub correlation_id: String,
    pub bay: BayId,
    pub kind: BayKind,
    pub distance: u32,
}

/// Call-for-proposals from a negotiating car.
#[derive(Debug, Clone)]
pub struct ProposalRequest {
    pub correlation_id: String,
    pub plate: String,
    pub reply_to: ActorHandle,
}

/// A bay's answer to a call-for-proposals.
#[derive(Debug, Clone)]
pub struct ProposalReply {
    pub correlation_id: String,
    pub bay: BayId,
    pub decision: ProposalDecision,
}

#[derive(Debug, Clone)]
pub enum ProposalDecision {
    /// The bay is free; here is its distance from the entrance.
    Offer { distance: u32 },
    /// The bay is occupied.
    Refuse,
}

/// Accept-reservation sent to exactly the winning bay, carrying the car's
/// attributes.
#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub correlation_id: String,
    pub car: CarProfile,
    pub reply_to: ActorHandle,
}

/// A bay's answer to a reservation attempt. Never silently dropped: a bay
/// that was claimed in the interim always answers `Rejected`.
#[derive(Debug, Clone)]
pub struct ReservationReply {
    pub correlation_id: String,
    pub bay: BayId,
    pub outcome: ReservationOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// Exactly one requester observes this per free bay.
    Confirmed,
    /// Lost the race to a faster competitor.
    Rejected,
}

/// A leaving car handing its bay back.
#[derive(Debug, Clone)]
pub struct ReleaseRequest {
    pub correlation_id: String,
    pub plate: String,
    pub reply_to: ActorHandle,
}

/// A bay's answer to a release.
#[derive(Debug, Clone)]
pub struct ReleaseReply {
    pub correlation_id: String,
    pub bay: BayId,
    pub outcome: ReleaseOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    AlreadyFree,
}

// ============================================================================
// Metrics events
// ============================================================================

/// A bay's classification landed; forwarded to the display sink.
#[derive(Debug, Clone)]
pub struct BayClassified {
    pub bay: BayId,
    pub kind: BayKind,
    pub distance: u32,
}

/// A car was admitted to the simulation.
#[derive(Debug, Clone)]
pub struct CarCreated;

/// A car confirmed a reservation at `distance`; cost accounting happens in
/// the metrics actor (and is skipped entirely for electric cars).
#[derive(Debug, Clone)]
pub struct CarParked {
    pub distance: u32,
    pub car: CarProfile,
}

/// A car released its bay and terminated.
#[derive(Debug, Clone)]
pub struct CarDeparted {
    pub plate: String,
}

/// One denied admission poll's worth of queue wait.
#[derive(Debug, Clone)]
pub struct QueueWaitSample {
    pub wait_ms: u64,
}

/// Simulated time advanced.
#[derive(Debug, Clone)]
pub struct TickElapsed {
    pub now_ms: u64,
}

/// Ask the metrics actor to broadcast its current snapshot.
#[derive(Debug, Clone)]
pub struct PublishSnapshot;

/// Broadcast answer to `PublishSnapshot`; the harness bridge forwards it
/// out of the actor system.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub snapshot: MetricsSnapshot,
}
