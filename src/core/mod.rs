//! Shared foundation: ids, positions, errors, configuration, seeded RNG

pub mod config;
pub mod error;
pub mod rng;
pub mod types;
