//! Outcome accounting: cumulative totals, the trip cost model, and the
//! display-sink boundary.
//!
//! The snapshot is mutated only by the metrics actor in response to
//! discrete events; nothing else holds a reference to it.

use serde::{Deserialize, Serialize};

use crate::bay::BayKind;
use crate::vehicle::CarProfile;

/// Litres in an imperial gallon.
pub const LITRES_PER_GALLON: f64 = 4.546;
/// Kilometres in a mile.
pub const KM_PER_MILE: f64 = 1.609;

/// Fuel burned (litres) driving to a bay and back out again.
///
/// Metres -> kilometres -> miles -> gallons at the car's economy -> litres,
/// doubled for the return leg.
pub fn fuel_for_trip(distance: u32, mpg: f64) -> f64 {
    ((((distance as f64 / 1000.0) / KM_PER_MILE) / mpg) * LITRES_PER_GALLON) * 2.0
}

/// CO2 produced (grams) driving to a bay and back out again.
pub fn emissions_for_trip(distance: u32, grams_per_km: f64) -> f64 {
    ((distance as f64 / 1000.0) * grams_per_km) * 2.0
}

/// Cumulative totals plus current utilization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total fuel burned, litres.
    pub fuel_litres: f64,
    /// Total CO2 produced, grams.
    pub emissions_grams: f64,
    /// Cars admitted to the simulation.
    pub cars_created: u64,
    /// Cars that successfully parked.
    pub cars_parked: u64,
    /// Total time cars spent waiting in the queue, in polling-interval
    /// milliseconds.
    pub queue_wait_ms: u64,
    /// Simulated time elapsed, milliseconds.
    pub elapsed_ms: u64,
    pub total_bays: u32,
    pub occupied_bays: u32,
    /// Occupied bays / total bays * 100.
    pub utilization: f64,
}

impl MetricsSnapshot {
    pub fn with_capacity(total_bays: u32) -> Self {
        Self {
            total_bays,
            ..Self::default()
        }
    }

    /// Account for one car taking a bay at `distance`.
    ///
    /// Fuel and emissions are skipped entirely for electric cars; the
    /// parked count and utilization always move.
    pub fn record_parked(&mut self, distance: u32, car: &CarProfile) {
        self.cars_parked += 1;
        self.occupied_bays += 1;
        if !car.is_electric() {
            self.fuel_litres += fuel_for_trip(distance, car.fuel_economy);
            self.emissions_grams += emissions_for_trip(distance, car.emissions_rate);
        }
        self.recompute_utilization();
    }

    /// Account for one car releasing its bay.
    pub fn record_departed(&mut self) {
        self.occupied_bays = self.occupied_bays.saturating_sub(1);
        self.recompute_utilization();
    }

    fn recompute_utilization(&mut self) {
        self.utilization = if self.total_bays == 0 {
            0.0
        } else {
            (self.occupied_bays as f64 / self.total_bays as f64) * 100.0
        };
    }
}

/// Boundary to the excluded display layer.
///
/// All notifications are fire-and-forget: implementations must return
/// quickly and must never block the core. The metrics actor is the only
/// caller.
pub trait DisplaySink: Send + Sync {
    fn on_bay_classified(&self, _id: &str, _kind: BayKind, _distance: u32) {}
    fn on_car_created(&self) {}
    fn on_cars_parked(&self, _count: u64) {}
    fn on_queue_wait_sample(&self, _wait_ms: u64) {}
    fn on_fuel_used(&self, _total_litres: f64) {}
    fn on_emissions(&self, _total_grams: f64) {}
    fn on_utilization(&self, _percent: f64) {}
    fn on_tick(&self, _elapsed_ms: u64) {}
}

/// Sink that drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DisplaySink for NullSink {}

/// Sink that traces every notification at debug level. Used by the CLI in
/// place of a graphical display.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DisplaySink for LogSink {
    fn on_bay_classified(&self, id: &str, kind: BayKind, distance: u32) {
        tracing::debug!(bay = %id, kind = kind.label(), distance, "bay classified");
    }

    fn on_cars_parked(&self, count: u64) {
        tracing::debug!(count, "cars parked");
    }

    fn on_fuel_used(&self, total_litres: f64) {
        tracing::debug!(litres = format!("{total_litres:.3}"), "fuel used");
    }

    fn on_emissions(&self, total_grams: f64) {
        tracing::debug!(grams = format!("{total_grams:.1}"), "emissions produced");
    }

    fn on_utilization(&self, percent: f64) {
        tracing::debug!(percent = format!("{percent:.1}"), "utilization");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::CarKind;

    const EPSILON: f64 = 1e-12;

    fn petrol_car(fuel_economy: f64, emissions_rate: f64) -> CarProfile {
        CarProfile {
            plate: "AB12CDE".to_string(),
            kind: CarKind::Standard,
            make_model: "Ford Focus".to_string(),
            fuel_economy,
            emissions_rate,
            duration_min: 30,
        }
    }

    #[test]
    fn fuel_cost_matches_reference_vector() {
        // 100 m at 50 mpg: metres -> km -> miles -> gallons -> litres, x2.
        let expected = (((100.0_f64 / 1000.0) / 1.609) / 50.0) * 4.546 * 2.0;
        assert!((fuel_for_trip(100, 50.0) - expected).abs() < EPSILON);
    }

    #[test]
    fn emissions_cost_matches_reference_vector() {
        // 100 m at 120 g/km, x2 for the return leg.
        let expected = ((100.0_f64 / 1000.0) * 120.0) * 2.0;
        assert!((emissions_for_trip(100, 120.0) - expected).abs() < EPSILON);
    }

    #[test]
    fn electric_car_contributes_zero_cost() {
        let mut snapshot = MetricsSnapshot::with_capacity(4);
        let ev = CarProfile {
            plate: "EV12ABC".to_string(),
            kind: CarKind::Electric,
            make_model: "EV".to_string(),
            fuel_economy: 0.0,
            emissions_rate: 0.0,
            duration_min: 30,
        };
        snapshot.record_parked(5000, &ev);

        assert_eq!(snapshot.fuel_litres, 0.0);
        assert_eq!(snapshot.emissions_grams, 0.0);
        assert_eq!(snapshot.cars_parked, 1);
    }

    #[test]
    fn costs_accumulate_across_cars() {
        let mut snapshot = MetricsSnapshot::with_capacity(4);
        snapshot.record_parked(100, &petrol_car(50.0, 120.0));
        snapshot.record_parked(100, &petrol_car(50.0, 120.0));

        let per_car = fuel_for_trip(100, 50.0);
        assert!((snapshot.fuel_litres - 2.0 * per_car).abs() < EPSILON);
        assert!((snapshot.emissions_grams - 2.0 * emissions_for_trip(100, 120.0)).abs() < EPSILON);
    }

    #[test]
    fn utilization_tracks_occupancy() {
        let mut snapshot = MetricsSnapshot::with_capacity(4);
        snapshot.record_parked(100, &petrol_car(50.0, 120.0));
        assert_eq!(snapshot.utilization, 25.0);

        snapshot.record_parked(100, &petrol_car(50.0, 120.0));
        assert_eq!(snapshot.utilization, 50.0);

        snapshot.record_departed();
        assert_eq!(snapshot.utilization, 25.0);
    }

    #[test]
    fn departure_never_underflows() {
        let mut snapshot = MetricsSnapshot::with_capacity(4);
        snapshot.record_departed();
        assert_eq!(snapshot.occupied_bays, 0);
        assert_eq!(snapshot.utilization, 0.0);
    }
}
