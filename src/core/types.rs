//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Game tick counter (simulation time unit)
///
/// All cooldown/timer fields stored on room objects are absolute tick
/// numbers, never countdowns.
pub type Tick = u64;

/// Unique identifier for room objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    /// Fresh random id, for snapshot construction and tests
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id for objects created mid-tick (piles, tombstones,
    /// spawned creeps). Re-running a tick from the same snapshot must
    /// produce the same ids, so creation never draws from a random source.
    pub fn derive(game_time: Tick, tag: &str, salt: u64) -> Self {
        let hi = fnv1a(tag.as_bytes()) ^ game_time.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        let lo = fnv1a(&salt.to_le_bytes()) ^ game_time.rotate_left(32);
        Self(Uuid::from_u64_pair(hi, lo))
    }

    /// Stable 64-bit hash of this id, used for seeding per-object RNG streams
    pub fn hash64(&self) -> u64 {
        fnv1a(self.0.as_bytes())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Player (or NPC faction) account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// World-map coordinates of one room, parsed from names like "W12N34"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomName {
    pub x: i32,
    pub y: i32,
}

impl RoomName {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance in rooms, used by nuker/observer range checks
    pub fn range_to(&self, other: &RoomName) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy)
    }

    /// Parse a "W12N34" style name. West/south halves map to negative
    /// coordinates offset by one, so W0 is x = -1 and E0 is x = 0.
    pub fn parse(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let h = chars.next()?;
        let rest: String = chars.collect();
        let split = rest.find(|c: char| c == 'N' || c == 'S')?;
        let (xs, ys) = rest.split_at(split);
        let v = ys.chars().next()?;
        let xn: i32 = xs.parse().ok()?;
        let yn: i32 = ys[1..].parse().ok()?;
        let x = match h {
            'E' => xn,
            'W' => -xn - 1,
            _ => return None,
        };
        let y = match v {
            'N' => yn,
            'S' => -yn - 1,
            _ => return None,
        };
        Some(Self { x, y })
    }
}

impl std::fmt::Display for RoomName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (h, xn) = if self.x >= 0 { ('E', self.x) } else { ('W', -self.x - 1) };
        let (v, yn) = if self.y >= 0 { ('N', self.y) } else { ('S', -self.y - 1) };
        write!(f, "{}{}{}{}", h, xn, v, yn)
    }
}

/// Tile position inside one room, both axes in [0, 49]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: u8,
    pub y: u8,
}

pub const ROOM_SIZE: u8 = 50;

impl Position {
    pub fn new(x: u8, y: u8) -> Self {
        debug_assert!(x < ROOM_SIZE && y < ROOM_SIZE);
        Self { x, y }
    }

    /// Chebyshev distance, the range metric for nearly every adjacency check
    pub fn range_to(&self, other: &Position) -> u32 {
        let dx = (self.x as i32 - other.x as i32).unsigned_abs();
        let dy = (self.y as i32 - other.y as i32).unsigned_abs();
        dx.max(dy)
    }

    pub fn is_adjacent(&self, other: &Position) -> bool {
        self.range_to(other) <= 1
    }

    /// One step in the given direction; None when it would leave the room
    pub fn step(&self, dir: Direction) -> Option<Position> {
        let (dx, dy) = dir.offset();
        let x = self.x as i32 + dx;
        let y = self.y as i32 + dy;
        if (0..ROOM_SIZE as i32).contains(&x) && (0..ROOM_SIZE as i32).contains(&y) {
            Some(Position { x: x as u8, y: y as u8 })
        } else {
            None
        }
    }

    /// Arbitrary tile offset; None when it would leave the room
    pub fn offset(&self, dx: i32, dy: i32) -> Option<Position> {
        let x = self.x as i32 + dx;
        let y = self.y as i32 + dy;
        if (0..ROOM_SIZE as i32).contains(&x) && (0..ROOM_SIZE as i32).contains(&y) {
            Some(Position { x: x as u8, y: y as u8 })
        } else {
            None
        }
    }

    /// Direction of the single step that brings this position closest to
    /// the target. Returns None when already on the target tile.
    pub fn direction_to(&self, target: &Position) -> Option<Direction> {
        let dx = (target.x as i32 - self.x as i32).signum();
        let dy = (target.y as i32 - self.y as i32).signum();
        Direction::from_offset(dx, dy)
    }
}

/// The eight movement directions, clockwise from Top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    TopLeft,
}

impl Direction {
    /// All directions in the default spawn-placement scan order
    pub const ALL: [Direction; 8] = [
        Direction::Top,
        Direction::TopRight,
        Direction::Right,
        Direction::BottomRight,
        Direction::Bottom,
        Direction::BottomLeft,
        Direction::Left,
        Direction::TopLeft,
    ];

    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::Top => (0, -1),
            Direction::TopRight => (1, -1),
            Direction::Right => (1, 0),
            Direction::BottomRight => (1, 1),
            Direction::Bottom => (0, 1),
            Direction::BottomLeft => (-1, 1),
            Direction::Left => (-1, 0),
            Direction::TopLeft => (-1, -1),
        }
    }

    pub fn from_offset(dx: i32, dy: i32) -> Option<Direction> {
        match (dx.signum(), dy.signum()) {
            (0, -1) => Some(Direction::Top),
            (1, -1) => Some(Direction::TopRight),
            (1, 0) => Some(Direction::Right),
            (1, 1) => Some(Direction::BottomRight),
            (0, 1) => Some(Direction::Bottom),
            (-1, 1) => Some(Direction::BottomLeft),
            (-1, 0) => Some(Direction::Left),
            (-1, -1) => Some(Direction::TopLeft),
            _ => None,
        }
    }

    /// Wire encoding 1..8, clockwise from Top
    pub fn from_wire(n: u8) -> Option<Direction> {
        Direction::ALL.get(n.checked_sub(1)? as usize).copied()
    }
}
