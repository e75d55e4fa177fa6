//! Vehicle types: the actors requesting bays.

use serde::{Deserialize, Serialize};

use crate::bay::BayKind;

/// Requester category of a car. Fixed at creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarKind {
    #[default]
    Standard,
    Accessible,
    Electric,
}

impl CarKind {
    /// The bay kind this car solicits first.
    pub fn preferred_bay(&self) -> BayKind {
        match self {
            Self::Standard => BayKind::Standard,
            Self::Accessible => BayKind::Accessible,
            Self::Electric => BayKind::ElectricCharging,
        }
    }
}

/// Fixed attributes of a car, drawn once at creation by the harness
/// generator. The kernel requires only that `plate` is unique and the
/// numeric attributes are non-negative (zero for electric vehicles).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarProfile {
    /// Unique plate token.
    pub plate: String,
    pub kind: CarKind,
    /// Cosmetic make/model label (`"EV"` for electric vehicles).
    pub make_model: String,
    /// Miles per gallon. Zero for electric vehicles.
    pub fuel_economy: f64,
    /// CO2 grams per kilometre. Zero for electric vehicles.
    pub emissions_rate: f64,
    /// Desired parking duration in minutes, a multiple of ten.
    pub duration_min: u32,
}

impl CarProfile {
    pub fn is_electric(&self) -> bool {
        self.kind == CarKind::Electric
    }
}

/// Lifecycle states of a car actor.
///
/// `reserved` bay is held if and only if the car is `Parked` or `Leaving`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CarState {
    /// Waiting in the admission queue.
    #[default]
    Queued,
    /// At the queue head, running the broadcast/collect/commit/confirm
    /// protocol.
    Negotiating,
    /// Holding a bay, counting down the desired duration.
    Parked,
    /// Duration elapsed, release requested and not yet acknowledged.
    Leaving,
    /// Terminal. The car ignores all further traffic.
    Done,
}
