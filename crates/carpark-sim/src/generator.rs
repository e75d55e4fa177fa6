//! Vehicle and carpark layout generation.
//!
//! Everything random lives here, behind one seedable RNG, so runs are
//! reproducible with `--seed`. The kernel only ever sees the results:
//! unique plates, non-negative attributes, and fixed bay specs.

use std::collections::HashSet;

use rand::prelude::*;

use carpark_kernel::{BayKind, BaySpec, CarKind, CarProfile, SimConfig};

/// Average parking bay length in metres, the y-axis distance weight.
pub const BAY_LENGTH_M: f64 = 4.8;
/// Average parking bay width in metres, the x-axis distance weight.
pub const BAY_WIDTH_M: f64 = 2.8;

/// Chance a generated bay is an accessible space.
const ACCESSIBLE_BAY_CHANCE: f64 = 0.05;
/// Chance a non-accessible bay carries an EV charger.
const ELECTRIC_BAY_CHANCE: f64 = 0.2;

// DVLA plate format: memory tag (2 letters), age identifier (2 digits),
// then 3 random characters.
const TAG_FIRST: &[u8] = b"ABCDEFGHKLMNOPRSVWY";
const TAG_SECOND: &[u8] = b"ABCDEFGHJKLMNOPRSTUVWXY";
const PLATE_CHARS: &[u8] = b"ABCDEFGHIJKLMN0PQRSTUVWXYZ";

/// Per-model fuel economy (mpg) and CO2 (g/km) ranges, with cumulative
/// selection thresholds weighted by UK sales share.
struct ModelRange {
    cumulative: f64,
    name: &'static str,
    mpg: (f64, f64),
    co2: (f64, f64),
}

const MODEL_TABLE: [ModelRange; 10] = [
    ModelRange { cumulative: 0.153, name: "Ford Fiesta", mpg: (40.4, 65.7), co2: (112.0, 158.0) },
    ModelRange { cumulative: 0.269, name: "Volkswagen Golf", mpg: (32.8, 68.9), co2: (107.0, 195.0) },
    ModelRange { cumulative: 0.3803, name: "Ford Focus", mpg: (34.4, 62.8), co2: (117.0, 188.0) },
    ModelRange { cumulative: 0.4869, name: "Vauxhall Corsa", mpg: (48.7, 70.6), co2: (108.0, 134.0) },
    ModelRange { cumulative: 0.5925, name: "Mercedes A-Class", mpg: (31.4, 62.8), co2: (117.0, 207.0) },
    ModelRange { cumulative: 0.6958, name: "Nissan Qashqai", mpg: (39.8, 53.3), co2: (131.0, 182.0) },
    ModelRange { cumulative: 0.7777, name: "Ford Kuga", mpg: (41.5, 56.5), co2: (132.0, 161.0) },
    ModelRange { cumulative: 0.8587, name: "MINI", mpg: (34.0, 48.7), co2: (131.0, 189.0) },
    ModelRange { cumulative: 0.9323, name: "Volkswagen Polo", mpg: (39.8, 57.6), co2: (124.0, 160.0) },
    ModelRange { cumulative: 1.0, name: "Kia Sportage", mpg: (32.1, 53.3), co2: (138.0, 201.0) },
];

/// Weighted Manhattan distance from the entrance to a grid cell: axes
/// weighted by average bay dimensions, a zero result floored to 1, rounded,
/// then scaled by 10. Only straight-line travel, no diagonals.
pub fn bay_distance(entrance: (i64, i64), x: u32, y: u32) -> u32 {
    let dif_y = (entrance.1 - i64::from(y)) as f64 * BAY_LENGTH_M;
    let dif_x = (entrance.0 - i64::from(x)) as f64 * BAY_WIDTH_M;

    let mut distance = dif_y.abs() + dif_x.abs();
    if distance == 0.0 {
        distance = 1.0;
    }

    (distance.round() as u32) * 10
}

/// Place the entrance on a random edge of the grid. Returns (x, y).
fn place_entrance(width: u32, length: u32, rng: &mut StdRng) -> (i64, i64) {
    let dir_x = i64::from(rng.random_range(0..=width));
    let dir_y = i64::from(rng.random_range(0..=length));

    match rng.random_range(0..4u8) {
        // North edge
        0 => (dir_x, 0),
        // East edge
        1 => (i64::from(width), dir_y),
        // South edge
        2 => (dir_x, i64::from(length)),
        // West edge
        _ => (0, dir_y),
    }
}

/// Generate the full bay layout: one spec per grid cell, with a randomly
/// placed entrance and randomly drawn kinds.
pub fn generate_layout(config: &SimConfig, rng: &mut StdRng) -> Vec<BaySpec> {
    let entrance = place_entrance(config.grid_width, config.grid_length, rng);

    let mut bays = Vec::with_capacity(config.capacity() as usize);
    for y in 0..config.grid_length {
        for x in 0..config.grid_width {
            bays.push(BaySpec {
                id: format!("bay-{}:{}", y + 1, x + 1),
                kind: draw_bay_kind(rng),
                distance: bay_distance(entrance, x, y),
            });
        }
    }
    bays
}

fn draw_bay_kind(rng: &mut StdRng) -> BayKind {
    if rng.random::<f64>() <= ACCESSIBLE_BAY_CHANCE {
        BayKind::Accessible
    } else if rng.random::<f64>() <= ELECTRIC_BAY_CHANCE {
        BayKind::ElectricCharging
    } else {
        BayKind::Standard
    }
}

/// Generator of vehicle profiles: plate, kind, make/model, fuel economy,
/// emissions, and desired duration.
pub struct VehicleGenerator {
    rng: StdRng,
    min_duration: u32,
    max_duration: u32,
    electric_chance: f64,
    accessible_chance: f64,
    /// Every plate ever issued; collisions regenerate.
    plates: HashSet<String>,
}

impl VehicleGenerator {
    pub fn new(config: &SimConfig, rng: StdRng) -> Self {
        Self {
            rng,
            min_duration: config.min_duration,
            max_duration: config.max_duration,
            electric_chance: f64::from(config.electric_percent) / 100.0,
            accessible_chance: f64::from(config.accessible_percent) / 100.0,
            plates: HashSet::new(),
        }
    }

    /// Draw the next vehicle. The plate is unique across this generator's
    /// lifetime.
    pub fn next_profile(&mut self) -> CarProfile {
        let plate = self.unique_plate();
        let kind = self.draw_kind();
        let (make_model, fuel_economy, emissions_rate) = self.draw_spec(kind);

        CarProfile {
            plate,
            kind,
            make_model,
            fuel_economy,
            emissions_rate,
            duration_min: self.draw_duration(),
        }
    }

    /// Accessible need is checked first; electric only applies to the rest.
    fn draw_kind(&mut self) -> CarKind {
        if self.rng.random::<f64>() <= self.accessible_chance {
            CarKind::Accessible
        } else if self.rng.random::<f64>() <= self.electric_chance {
            CarKind::Electric
        } else {
            CarKind::Standard
        }
    }

    /// Desired duration in minutes, a multiple of ten within the
    /// configured bounds.
    fn draw_duration(&mut self) -> u32 {
        self.rng
            .random_range((self.min_duration / 10)..=(self.max_duration / 10))
            * 10
    }

    fn draw_spec(&mut self, kind: CarKind) -> (String, f64, f64) {
        if kind == CarKind::Electric {
            return ("EV".to_string(), 0.0, 0.0);
        }

        let pick = self.rng.random::<f64>();
        let model = MODEL_TABLE
            .iter()
            .find(|m| pick <= m.cumulative)
            .unwrap_or(&MODEL_TABLE[MODEL_TABLE.len() - 1]);

        let (min_mpg, max_mpg) = model.mpg;
        let (min_co2, max_co2) = model.co2;
        let mpg = (min_mpg + self.rng.random::<f64>() * (max_mpg - min_mpg)).round();
        let co2 = (min_co2 + self.rng.random::<f64>() * (max_co2 - min_co2)).round();

        (model.name.to_string(), mpg, co2)
    }

    fn unique_plate(&mut self) -> String {
        loop {
            let plate = self.plate();
            if self.plates.insert(plate.clone()) {
                return plate;
            }
        }
    }

    fn plate(&mut self) -> String {
        let tag_first = TAG_FIRST[self.rng.random_range(0..TAG_FIRST.len())] as char;
        let tag_second = TAG_SECOND[self.rng.random_range(0..TAG_SECOND.len())] as char;
        let age = self.age_identifier();
        let tail: String = (0..3)
            .map(|_| PLATE_CHARS[self.rng.random_range(0..PLATE_CHARS.len())] as char)
            .collect();

        format!("{tag_first}{tag_second}{age}{tail}")
    }

    /// Two-digit age identifier: 02..=20 or 51..=69.
    fn age_identifier(&mut self) -> String {
        let idx = self.rng.random_range(0..38u32);
        let n = if idx < 19 { 2 + idx } else { 51 + idx - 19 };
        format!("{n:02}")
    }
}
