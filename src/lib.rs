//! deepwarren: deterministic per-tick simulation core for a multiplayer
//! strategy game server.
//!
//! One call to [`simulation::tick::process_room_tick`] consumes an
//! immutable [`state::room::RoomSnapshot`] (objects, terrain, users and
//! the player intent batch) and produces a [`simulation::tick::TickOutcome`]:
//! sparse object patches, removals, inserts, per-user stats, cross-room
//! effects and a cosmetic event log. Nothing else mutates game state.
//!
//! Determinism is the core contract: identical snapshot in, identical
//! outcome out. All randomness is seeded per (tick, object), mid-tick ids
//! are derived rather than generated, and every map iteration that can
//! affect output order is sorted.

pub mod constants;
pub mod core;
pub mod engine;
pub mod intents;
pub mod mutation;
pub mod simulation;
pub mod state;
pub mod stats;

pub use crate::core::config::EngineConfig;
pub use crate::core::error::{EngineError, Result};
pub use crate::engine::{process_rooms, EngineOutcome};
pub use crate::simulation::tick::{apply_outcome, process_room_tick, TickOutcome};
pub use crate::state::room::RoomSnapshot;
