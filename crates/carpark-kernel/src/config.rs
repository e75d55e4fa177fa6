//! Simulation configuration.
//!
//! All parameters are validated before any actor is created; out-of-range
//! values are startup errors, never handled mid-run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::strategy::AllocationStrategy;

/// Widest carpark the reference deployment supports.
pub const MAX_GRID_WIDTH: u32 = 25;
/// Longest carpark the reference deployment supports.
pub const MAX_GRID_LENGTH: u32 = 15;
/// Shortest permitted parking duration in minutes.
pub const MIN_DURATION_MIN: u32 = 10;
/// Longest permitted parking duration in minutes.
pub const MAX_DURATION_MIN: u32 = 300;

/// A startup parameter violated its precondition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("grid width must be 1..={MAX_GRID_WIDTH}, got {0}")]
    GridWidth(u32),
    #[error("grid length must be 1..={MAX_GRID_LENGTH}, got {0}")]
    GridLength(u32),
    #[error("duration bounds must lie in {MIN_DURATION_MIN}..={MAX_DURATION_MIN}, got {min}..={max}")]
    DurationBounds { min: u32, max: u32 },
    #[error("minimum duration {min} exceeds maximum duration {max}")]
    DurationOrder { min: u32, max: u32 },
    #[error("electric vehicle probability must be 0..=100, got {0}")]
    ElectricPercent(u32),
    #[error("accessible vehicle probability must be 0..=100, got {0}")]
    AccessiblePercent(u32),
    #[error("spawn interval must be nonzero")]
    SpawnInterval,
    #[error("duration tick interval must be nonzero")]
    DurationTick,
}

/// Startup parameters for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Grid width in bays.
    pub grid_width: u32,
    /// Grid length in bays.
    pub grid_length: u32,
    /// Minimum desired parking duration (minutes).
    pub min_duration: u32,
    /// Maximum desired parking duration (minutes).
    pub max_duration: u32,
    /// Probability (0..=100) that a spawned car is electric.
    pub electric_percent: u32,
    /// Probability (0..=100) that a spawned car needs accessible parking.
    pub accessible_percent: u32,
    /// Model tick: car spawn and admission polling cadence (milliseconds).
    /// Queue wait is measured in units of this interval.
    pub spawn_interval_ms: u64,
    /// Cadence of the parked-duration countdown (milliseconds). Each tick
    /// burns ten minutes of desired duration.
    pub duration_tick_ms: u64,
    /// Winner selection policy, fixed for the whole run.
    pub strategy: AllocationStrategy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_width: 10,
            grid_length: 10,
            min_duration: 10,
            max_duration: 60,
            electric_percent: 20,
            accessible_percent: 5,
            spawn_interval_ms: 1000,
            duration_tick_ms: 1000,
            strategy: AllocationStrategy::ClosestFirst,
        }
    }
}

impl SimConfig {
    /// Check every precondition, reporting the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width == 0 || self.grid_width > MAX_GRID_WIDTH {
            return Err(ConfigError::GridWidth(self.grid_width));
        }
        if self.grid_length == 0 || self.grid_length > MAX_GRID_LENGTH {
            return Err(ConfigError::GridLength(self.grid_length));
        }
        if self.min_duration < MIN_DURATION_MIN || self.max_duration > MAX_DURATION_MIN {
            return Err(ConfigError::DurationBounds {
                min: self.min_duration,
                max: self.max_duration,
            });
        }
        if self.min_duration > self.max_duration {
            return Err(ConfigError::DurationOrder {
                min: self.min_duration,
                max: self.max_duration,
            });
        }
        if self.electric_percent > 100 {
            return Err(ConfigError::ElectricPercent(self.electric_percent));
        }
        if self.accessible_percent > 100 {
            return Err(ConfigError::AccessiblePercent(self.accessible_percent));
        }
        if self.spawn_interval_ms == 0 {
            return Err(ConfigError::SpawnInterval);
        }
        if self.duration_tick_ms == 0 {
            return Err(ConfigError::DurationTick);
        }
        Ok(())
    }

    /// Total number of bays in the grid.
    pub fn capacity(&self) -> u32 {
        self.grid_width * self.grid_length
    }
}
