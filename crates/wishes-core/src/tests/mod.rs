//! Crate-level tests that drive whole engines.
//!
//! - `scenarios.rs`: pity, rate-up and reset behavior of complete logics
//! - `determinism.rs`: seeded reproducibility and snapshot round-trips
//! - `properties.rs`: property tests over random seeds and parameters
//! - `helpers.rs`: configuration builders and state accessors

mod helpers;
mod scenarios;

pub use helpers::*;
