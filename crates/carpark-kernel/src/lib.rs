//! Carpark negotiation kernel: mutual exclusion over scarce parking bays
//! through asynchronous offer/accept negotiation.
//!
//! Cars and bays are independent actors communicating only by message
//! exchange. A singleton coordinator owns the admission queue and the bay
//! directory; a metrics actor aggregates outcome totals and forwards them
//! to a pluggable display sink.

pub mod actors;
pub mod bay;
pub mod config;
pub mod messages;
pub mod metrics;
pub mod queue;
pub mod strategy;
pub mod vehicle;

pub use bay::{BayId, BayKind, BayRef, BaySpec};
pub use config::{ConfigError, SimConfig};
pub use metrics::{DisplaySink, MetricsSnapshot, NullSink};
pub use queue::{AdmissionQueue, DuplicateIdentity};
pub use strategy::{AllocationStrategy, Offer};
pub use vehicle::{CarKind, CarProfile, CarState};
