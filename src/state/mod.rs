//! Snapshot model: room objects, terrain, users, cosmetic events

pub mod events;
pub mod object;
pub mod room;
pub mod terrain;
