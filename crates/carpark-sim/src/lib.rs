//! Carpark simulation harness: generation, the runner that owns the actor
//! runtime and the clock loop, and results collection.

pub mod bridge;
pub mod generator;
pub mod results;
pub mod runner;
