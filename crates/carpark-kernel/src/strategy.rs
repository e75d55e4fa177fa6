//! Allocation strategies: pure selection of a winning offer.
//!
//! Both strategies operate only over the offer set collected in one
//! broadcast round; they never compare across rounds. On equal distance the
//! first-seen offer wins (arrival order dependent, an acknowledged
//! nondeterminism).

use serde::{Deserialize, Serialize};

use crate::bay::BayId;
use crate::vehicle::{CarKind, CarProfile};

/// Fuel-economy floor (mpg) above which `EfficiencyAware` treats a car as
/// cheap to move.
pub const EFFICIENT_MPG_THRESHOLD: f64 = 60.0;
/// Emissions ceiling (g/km) below which `EfficiencyAware` treats a car as
/// cheap to move.
pub const EFFICIENT_EMISSIONS_THRESHOLD: f64 = 150.0;

/// A bay's positive reply to one proposal round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    pub bay: BayId,
    pub distance: u32,
}

/// How a car picks a winner from competing offers. Selected once per
/// simulation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationStrategy {
    /// Minimum distance wins: park every car as close to the entrance as
    /// possible.
    #[default]
    ClosestFirst,
    /// Cars with low or zero environmental cost per unit distance walk
    /// farther (maximum distance), leaving close bays for expensive cars;
    /// everyone else takes the minimum distance.
    EfficiencyAware,
}

impl AllocationStrategy {
    /// All strategies, for sweep runs.
    pub fn all() -> Vec<Self> {
        vec![Self::ClosestFirst, Self::EfficiencyAware]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ClosestFirst => "closest_first",
            Self::EfficiencyAware => "efficiency_aware",
        }
    }

    /// Pick the winning offer for `car`, returning its index into `offers`.
    ///
    /// Returns `None` only when `offers` is empty. Refusals never reach
    /// this function; they are dropped during collection.
    pub fn select(&self, car: &CarProfile, offers: &[Offer]) -> Option<usize> {
        match self {
            Self::ClosestFirst => nearest(offers),
            Self::EfficiencyAware => {
                let cheap_to_move = car.kind == CarKind::Electric
                    || (car.fuel_economy >= EFFICIENT_MPG_THRESHOLD
                        && car.emissions_rate <= EFFICIENT_EMISSIONS_THRESHOLD);
                if cheap_to_move {
                    farthest(offers)
                } else {
                    nearest(offers)
                }
            }
        }
    }
}

fn nearest(offers: &[Offer]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, offer) in offers.iter().enumerate() {
        // Strict comparison keeps the first-seen offer on ties.
        if best.is_none_or(|b| offer.distance < offers[b].distance) {
            best = Some(idx);
        }
    }
    best
}

fn farthest(offers: &[Offer]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, offer) in offers.iter().enumerate() {
        if best.is_none_or(|b| offer.distance > offers[b].distance) {
            best = Some(idx);
        }
    }
    best
}
