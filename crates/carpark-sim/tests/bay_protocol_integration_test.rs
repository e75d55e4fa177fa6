//! Integration tests for the bay responder protocol.
//!
//! Tests the contended-resource guarantees directly against a live bay
//! actor:
//! - at most one of many racing reservations is ever confirmed
//! - losing reservations are always answered, never dropped
//! - release clears the occupant regardless of who asks
//!
//! Uses mock driver actors that fire protocol messages on trigger and
//! record the replies.

use std::sync::Arc;

use acton_reactive::prelude::*;
use tokio::sync::RwLock;
use tokio::time::Duration;

use carpark_kernel::actors::BayActor;
use carpark_kernel::messages::{
    ProposalDecision, ProposalReply, ProposalRequest, ReleaseOutcome, ReleaseReply,
    ReleaseRequest, ReservationOutcome, ReservationReply, ReservationRequest,
};
use carpark_kernel::{BayKind, BaySpec, CarKind, CarProfile};

/// Trigger the mock driver to send a reservation to `bay`.
#[derive(Debug, Clone)]
struct TriggerReserve {
    bay: ActorHandle,
    correlation_id: String,
}

/// Trigger the mock driver to release `bay`.
#[derive(Debug, Clone)]
struct TriggerRelease {
    bay: ActorHandle,
    correlation_id: String,
}

/// Trigger the mock driver to solicit an offer from `bay`.
#[derive(Debug, Clone)]
struct TriggerPropose {
    bay: ActorHandle,
    correlation_id: String,
}

/// Mock actor state recording every reply it receives.
#[derive(Default, Clone)]
struct MockDriverState {
    plate: String,
    self_handle: Option<ActorHandle>,
    reservations: Arc<RwLock<Vec<ReservationReply>>>,
    releases: Arc<RwLock<Vec<ReleaseReply>>>,
    proposals: Arc<RwLock<Vec<ProposalReply>>>,
}

impl std::fmt::Debug for MockDriverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDriverState")
            .field("plate", &self.plate)
            .finish()
    }
}

fn test_profile(plate: &str) -> CarProfile {
    CarProfile {
        plate: plate.to_string(),
        kind: CarKind::Standard,
        make_model: "Ford Focus".to_string(),
        fuel_economy: 50.0,
        emissions_rate: 120.0,
        duration_min: 10,
    }
}

fn test_bay(id: &str, distance: u32) -> BaySpec {
    BaySpec {
        id: id.to_string(),
        kind: BayKind::Standard,
        distance,
    }
}

/// Spawn a mock driver that answers triggers and records replies.
async fn spawn_mock_driver(
    runtime: &mut ActorRuntime,
    plate: &str,
    reservations: Arc<RwLock<Vec<ReservationReply>>>,
    releases: Arc<RwLock<Vec<ReleaseReply>>>,
    proposals: Arc<RwLock<Vec<ProposalReply>>>,
) -> ActorHandle {
    let mut actor = runtime.new_actor_with_name::<MockDriverState>(format!("Mock:{plate}"));
    actor.model.plate = plate.to_string();
    actor.model.self_handle = Some(actor.handle().clone());
    actor.model.reservations = reservations;
    actor.model.releases = releases;
    actor.model.proposals = proposals;

    actor.act_on::<TriggerReserve>(|actor, context| {
        let msg = context.message().clone();
        let car = test_profile(&actor.model.plate);
        let Some(reply_to) = actor.model.self_handle.clone() else {
            return Reply::ready();
        };

        Reply::pending(async move {
            msg.bay
                .send(ReservationRequest {
                    correlation_id: msg.correlation_id,
                    car,
                    reply_to,
                })
                .await;
        })
    });

    actor.act_on::<TriggerRelease>(|actor, context| {
        let msg = context.message().clone();
        let plate = actor.model.plate.clone();
        let Some(reply_to) = actor.model.self_handle.clone() else {
            return Reply::ready();
        };

        Reply::pending(async move {
            msg.bay
                .send(ReleaseRequest {
                    correlation_id: msg.correlation_id,
                    plate,
                    reply_to,
                })
                .await;
        })
    });

    actor.act_on::<TriggerPropose>(|actor, context| {
        let msg = context.message().clone();
        let plate = actor.model.plate.clone();
        let Some(reply_to) = actor.model.self_handle.clone() else {
            return Reply::ready();
        };

        Reply::pending(async move {
            msg.bay
                .send(ProposalRequest {
                    correlation_id: msg.correlation_id,
                    plate,
                    reply_to,
                })
                .await;
        })
    });

    actor.mutate_on::<ReservationReply>(|actor, context| {
        let msg = context.message().clone();
        let sink = actor.model.reservations.clone();
        Reply::pending(async move {
            sink.write().await.push(msg);
        })
    });

    actor.mutate_on::<ReleaseReply>(|actor, context| {
        let msg = context.message().clone();
        let sink = actor.model.releases.clone();
        Reply::pending(async move {
            sink.write().await.push(msg);
        })
    });

    actor.mutate_on::<ProposalReply>(|actor, context| {
        let msg = context.message().clone();
        let sink = actor.model.proposals.clone();
        Reply::pending(async move {
            sink.write().await.push(msg);
        })
    });

    actor.start().await
}

#[tokio::test]
async fn racing_reservations_confirm_exactly_one_winner() {
    let mut runtime = ActonApp::launch_async().await;
    let bay = BayActor::new(&test_bay("bay-1:1", 40)).spawn(&mut runtime).await;

    let reservations = Arc::new(RwLock::new(Vec::new()));
    let mut drivers = Vec::new();
    for plate in ["AA02AAA", "BB02BBB", "CC02CCC"] {
        let driver = spawn_mock_driver(
            &mut runtime,
            plate,
            reservations.clone(),
            Arc::new(RwLock::new(Vec::new())),
            Arc::new(RwLock::new(Vec::new())),
        )
        .await;
        drivers.push(driver);
    }

    // Fire all three reservations back to back so they race in the bay's
    // mailbox.
    for (i, driver) in drivers.iter().enumerate() {
        driver
            .send(TriggerReserve {
                bay: bay.clone(),
                correlation_id: format!("race-{i}"),
            })
            .await;
    }

    tokio::time::sleep(Duration::from_millis(200)).await;

    let received = reservations.read().await;
    assert_eq!(received.len(), 3, "every reservation must be answered");

    let confirmed = received
        .iter()
        .filter(|r| r.outcome == ReservationOutcome::Confirmed)
        .count();
    let rejected = received
        .iter()
        .filter(|r| r.outcome == ReservationOutcome::Rejected)
        .count();
    assert_eq!(confirmed, 1, "exactly one racer may win the bay");
    assert_eq!(rejected, 2, "losers are answered, never dropped");

    runtime.shutdown_all().await.unwrap();
}

#[tokio::test]
async fn release_clears_any_occupant_and_reports_already_free() {
    let mut runtime = ActonApp::launch_async().await;
    let bay = BayActor::new(&test_bay("bay-1:1", 40)).spawn(&mut runtime).await;

    let reservations = Arc::new(RwLock::new(Vec::new()));
    let releases_a = Arc::new(RwLock::new(Vec::new()));
    let releases_b = Arc::new(RwLock::new(Vec::new()));

    let driver_a = spawn_mock_driver(
        &mut runtime,
        "AA02AAA",
        reservations.clone(),
        releases_a.clone(),
        Arc::new(RwLock::new(Vec::new())),
    )
    .await;
    let driver_b = spawn_mock_driver(
        &mut runtime,
        "BB02BBB",
        Arc::new(RwLock::new(Vec::new())),
        releases_b.clone(),
        Arc::new(RwLock::new(Vec::new())),
    )
    .await;

    driver_a
        .send(TriggerReserve {
            bay: bay.clone(),
            correlation_id: "reserve-1".to_string(),
        })
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        reservations.read().await[0].outcome,
        ReservationOutcome::Confirmed
    );

    // A different car releases the bay: no ownership check, it clears.
    driver_b
        .send(TriggerRelease {
            bay: bay.clone(),
            correlation_id: "release-1".to_string(),
        })
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(releases_b.read().await[0].outcome, ReleaseOutcome::Released);

    // The original holder's release finds the bay already free.
    driver_a
        .send(TriggerRelease {
            bay: bay.clone(),
            correlation_id: "release-2".to_string(),
        })
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        releases_a.read().await[0].outcome,
        ReleaseOutcome::AlreadyFree
    );

    runtime.shutdown_all().await.unwrap();
}

#[tokio::test]
async fn occupied_bay_refuses_proposals_and_frees_after_release() {
    let mut runtime = ActonApp::launch_async().await;
    let bay = BayActor::new(&test_bay("bay-1:1", 70)).spawn(&mut runtime).await;

    let reservations = Arc::new(RwLock::new(Vec::new()));
    let releases = Arc::new(RwLock::new(Vec::new()));
    let proposals = Arc::new(RwLock::new(Vec::new()));

    let driver = spawn_mock_driver(
        &mut runtime,
        "AA02AAA",
        reservations.clone(),
        releases.clone(),
        proposals.clone(),
    )
    .await;

    // Free bay offers its distance.
    driver
        .send(TriggerPropose {
            bay: bay.clone(),
            correlation_id: "cfp-1".to_string(),
        })
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    {
        let received = proposals.read().await;
        assert!(matches!(
            received[0].decision,
            ProposalDecision::Offer { distance: 70 }
        ));
    }

    // Occupied bay refuses.
    driver
        .send(TriggerReserve {
            bay: bay.clone(),
            correlation_id: "reserve-1".to_string(),
        })
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    driver
        .send(TriggerPropose {
            bay: bay.clone(),
            correlation_id: "cfp-2".to_string(),
        })
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    {
        let received = proposals.read().await;
        assert!(matches!(received[1].decision, ProposalDecision::Refuse));
    }

    // Released bay offers again: no leaked reservation.
    driver
        .send(TriggerRelease {
            bay: bay.clone(),
            correlation_id: "release-1".to_string(),
        })
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    driver
        .send(TriggerPropose {
            bay: bay.clone(),
            correlation_id: "cfp-3".to_string(),
        })
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    {
        let received = proposals.read().await;
        assert!(matches!(
            received[2].decision,
            ProposalDecision::Offer { distance: 70 }
        ));
    }

    runtime.shutdown_all().await.unwrap();
}
