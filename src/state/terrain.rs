//! Room terrain: a dense 50×50 mask of plain/wall/swamp flags

use serde::{Deserialize, Serialize};

use crate::constants::{FATIGUE_COST_PLAIN, FATIGUE_COST_SWAMP};
use crate::core::types::{Position, ROOM_SIZE};

pub const TERRAIN_MASK_WALL: u8 = 1;
pub const TERRAIN_MASK_SWAMP: u8 = 2;

/// Immutable terrain grid for one room.
///
/// The wire form is the 2500-character digit string the storage layer keeps;
/// each digit is the mask byte for one tile, row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomTerrain {
    mask: Vec<u8>,
}

impl RoomTerrain {
    /// All-plain terrain, for tests
    pub fn open() -> Self {
        Self { mask: vec![0; (ROOM_SIZE as usize) * (ROOM_SIZE as usize)] }
    }

    pub fn from_digits(digits: &str) -> Option<Self> {
        if digits.len() != 2500 {
            return None;
        }
        let mask: Option<Vec<u8>> = digits.chars().map(|c| c.to_digit(10).map(|d| d as u8)).collect();
        Some(Self { mask: mask? })
    }

    fn at(&self, pos: Position) -> u8 {
        self.mask[pos.y as usize * ROOM_SIZE as usize + pos.x as usize]
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        self.at(pos) & TERRAIN_MASK_WALL != 0
    }

    pub fn is_swamp(&self, pos: Position) -> bool {
        self.at(pos) & TERRAIN_MASK_SWAMP != 0
    }

    pub fn set_wall(&mut self, pos: Position) {
        self.mask[pos.y as usize * ROOM_SIZE as usize + pos.x as usize] |= TERRAIN_MASK_WALL;
    }

    pub fn set_swamp(&mut self, pos: Position) {
        self.mask[pos.y as usize * ROOM_SIZE as usize + pos.x as usize] |= TERRAIN_MASK_SWAMP;
    }

    /// Fatigue cost per loaded body part, before roads; None for walls
    pub fn movement_cost(&self, pos: Position) -> Option<u32> {
        if self.is_wall(pos) {
            None
        } else if self.is_swamp(pos) {
            Some(FATIGUE_COST_SWAMP)
        } else {
            Some(FATIGUE_COST_PLAIN)
        }
    }
}

impl TryFrom<String> for RoomTerrain {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        RoomTerrain::from_digits(&s).ok_or_else(|| "terrain string must be 2500 digits".to_string())
    }
}

impl From<RoomTerrain> for String {
    fn from(t: RoomTerrain) -> String {
        t.mask.iter().map(|m| char::from(b'0' + m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_terrain_is_plain() {
        let t = RoomTerrain::open();
        let p = Position::new(25, 25);
        assert!(!t.is_wall(p));
        assert!(!t.is_swamp(p));
        assert_eq!(t.movement_cost(p), Some(FATIGUE_COST_PLAIN));
    }

    #[test]
    fn test_wall_and_swamp_flags() {
        let mut t = RoomTerrain::open();
        t.set_wall(Position::new(3, 4));
        t.set_swamp(Position::new(5, 6));
        assert!(t.is_wall(Position::new(3, 4)));
        assert_eq!(t.movement_cost(Position::new(3, 4)), None);
        assert_eq!(t.movement_cost(Position::new(5, 6)), Some(FATIGUE_COST_SWAMP));
    }

    #[test]
    fn test_digit_string_roundtrip() {
        let mut t = RoomTerrain::open();
        t.set_wall(Position::new(0, 0));
        t.set_swamp(Position::new(49, 49));
        let s: String = t.clone().into();
        assert_eq!(s.len(), 2500);
        let back = RoomTerrain::from_digits(&s).unwrap();
        assert!(back.is_wall(Position::new(0, 0)));
        assert!(back.is_swamp(Position::new(49, 49)));
    }
}
