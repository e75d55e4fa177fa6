//! Acton-reactive actors for the carpark kernel.
//!
//! Message flow for one simulation run:
//!
//! ```text
//! RegisterBays / ClassifyBays → Coordinator
//!   └─ KindQuery (correlation_id) → BayActors
//!       └─ KindReply → Coordinator (directory fold, no barrier)
//!           └─ BayClassified → MetricsActor
//!
//! Tick → Coordinator
//!   ├─ AdmissionTick (broadcast) → CarActors
//!   │    └─ AdmissionPoll → Coordinator
//!   │         ├─ head: AdmissionGranted (directory slices) → CarActor
//!   │         └─ else: QueueWaitSample → MetricsActor
//!   └─ TickElapsed → MetricsActor
//!
//! CarActor negotiation (one round, one correlation_id):
//!   ProposalRequest → BayActors → ProposalReply (Offer | Refuse)
//!   ReservationRequest → winning BayActor → ReservationReply
//!     ├─ Confirmed: DequeueCar → Coordinator, CarParked → MetricsActor
//!     └─ Rejected: restart broadcast (same relaxation state)
//!
//! DurationTick → Coordinator
//!   └─ CountdownTick (broadcast) → CarActors
//!        └─ at zero: ReleaseRequest → BayActor → ReleaseReply
//!             └─ CarDeparted → MetricsActor
//! ```
//!
//! Every actor owns its contended state (a bay's occupant, a car's
//! lifecycle, the coordinator's queue and directory) and mutates it only
//! through its own mailbox, which is what makes the reservation
//! check-and-set atomic under racing cars.

mod bay_actor;
mod car_actor;
mod coordinator;
mod metrics_actor;

pub use bay_actor::{BayActor, BayActorState};
pub use car_actor::{CarActor, CarActorState};
pub use coordinator::{Coordinator, CoordinatorState};
pub use metrics_actor::{MetricsActor, MetricsActorState};
