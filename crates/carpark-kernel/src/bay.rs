//! Bay types: the allocatable parking resources.

use acton_reactive::prelude::ActorHandle;
use serde::{Deserialize, Serialize};

/// Stable identity of a bay, derived from its grid cell (e.g. `bay-3:7`).
pub type BayId = String;

/// Resource category of a bay. Fixed at creation, never changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BayKind {
    #[default]
    Standard,
    Accessible,
    ElectricCharging,
}

impl BayKind {
    /// Short display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Accessible => "accessible",
            Self::ElectricCharging => "electric",
        }
    }
}

/// Static description of a bay produced by the layout generator.
///
/// `distance` is the weighted Manhattan distance from the carpark entrance
/// to the bay's grid cell, floored to a nonzero value and scaled by 10.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaySpec {
    pub id: BayId,
    pub kind: BayKind,
    pub distance: u32,
}

/// A classified bay as held in the coordinator's directory: identity plus
/// the mailbox cars negotiate with.
#[derive(Debug, Clone)]
pub struct BayRef {
    pub id: BayId,
    pub handle: ActorHandle,
}
