//! BayActor: autonomous owner of one parking slot.
//!
//! A bay keeps no history and answers four independent message kinds
//! statelessly from its current `occupant`. Mailbox serialization makes
//! the reservation check-and-set atomic: when several cars race for the
//! same free bay, exactly one observes `Confirmed`.

use acton_reactive::prelude::*;
use tracing::{debug, trace};

use crate::bay::{BayId, BayKind, BaySpec};
use crate::messages::{
    KindQuery, KindReply, ProposalDecision, ProposalReply, ProposalRequest, ReleaseOutcome,
    ReleaseReply, ReleaseRequest, ReservationOutcome, ReservationReply, ReservationRequest,
};

/// Actor state for a single bay.
#[derive(Debug, Default, Clone)]
pub struct BayActorState {
    pub id: BayId,
    pub kind: BayKind,
    pub distance: u32,
    /// Plate of the car holding this bay; `None` means free. Mutated only
    /// by the reservation and release handlers below.
    pub occupant: Option<String>,
}

/// Actor representing one allocatable bay.
///
/// Handles:
/// - `KindQuery` - classification, answerable regardless of occupancy
/// - `ProposalRequest` - offer the distance if free, refuse otherwise
/// - `ReservationRequest` - atomic check-and-set of the occupant
/// - `ReleaseRequest` - clear the occupant (no ownership check)
pub struct BayActor {
    pub id: BayId,
    pub kind: BayKind,
    pub distance: u32,
}

impl BayActor {
    pub fn new(spec: &BaySpec) -> Self {
        Self {
            id: spec.id.clone(),
            kind: spec.kind,
            distance: spec.distance,
        }
    }

    /// Spawn this bay actor in the given runtime.
    pub async fn spawn(self, runtime: &mut ActorRuntime) -> ActorHandle {
        let mut actor = runtime.new_actor_with_name::<BayActorState>(format!("Bay:{}", self.id));

        actor.model.id = self.id;
        actor.model.kind = self.kind;
        actor.model.distance = self.distance;
        actor.model.occupant = None;

        configure_bay(&mut actor);

        actor.start().await
    }
}

/// Configure message handlers for the BayActor.
fn configure_bay(actor: &mut ManagedActor<Idle, BayActorState>) {
    // KindQuery - read-only, always answerable
    actor.act_on::<KindQuery>(|actor, context| {
        let msg = context.message().clone();
        let reply = KindReply {
            correlation_id: msg.correlation_id,
            bay: actor.model.id.clone(),
            kind: actor.model.kind,
            distance: actor.model.distance,
        };

        Reply::pending(async move {
            msg.reply_to.send(reply).await;
        })
    });

    // ProposalRequest - offer the distance if free, refuse otherwise
    actor.act_on::<ProposalRequest>(|actor, context| {
        let msg = context.message().clone();

        let decision = if actor.model.occupant.is_none() {
            ProposalDecision::Offer {
                distance: actor.model.distance,
            }
        } else {
            ProposalDecision::Refuse
        };

        trace!(
            bay = %actor.model.id,
            plate = %msg.plate,
            decision = ?decision,
            "proposal answered"
        );

        let reply = ProposalReply {
            correlation_id: msg.correlation_id,
            bay: actor.model.id.clone(),
            decision,
        };

        Reply::pending(async move {
            msg.reply_to.send(reply).await;
        })
    });

    // ReservationRequest - check-and-set, serialized by the mailbox.
    // Always answered, so a losing car never waits forever on Confirm.
    actor.mutate_on::<ReservationRequest>(|actor, context| {
        let msg = context.message().clone();

        let outcome = if actor.model.occupant.is_none() {
            actor.model.occupant = Some(msg.car.plate.clone());
            debug!(
                bay = %actor.model.id,
                plate = %msg.car.plate,
                "reservation confirmed"
            );
            ReservationOutcome::Confirmed
        } else {
            debug!(
                bay = %actor.model.id,
                plate = %msg.car.plate,
                holder = actor.model.occupant.as_deref().unwrap_or(""),
                "reservation rejected"
            );
            ReservationOutcome::Rejected
        };

        let reply = ReservationReply {
            correlation_id: msg.correlation_id,
            bay: actor.model.id.clone(),
            outcome,
        };

        Reply::pending(async move {
            msg.reply_to.send(reply).await;
        })
    });

    // ReleaseRequest - any release clears the occupant, whoever asks
    actor.mutate_on::<ReleaseRequest>(|actor, context| {
        let msg = context.message().clone();

        let outcome = if actor.model.occupant.is_some() {
            actor.model.occupant = None;
            debug!(bay = %actor.model.id, plate = %msg.plate, "bay released");
            ReleaseOutcome::Released
        } else {
            ReleaseOutcome::AlreadyFree
        };

        let reply = ReleaseReply {
            correlation_id: msg.correlation_id,
            bay: actor.model.id.clone(),
            outcome,
        };

        Reply::pending(async move {
            msg.reply_to.send(reply).await;
        })
    });
}
