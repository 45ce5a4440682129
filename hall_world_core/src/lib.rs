use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod doors;
pub mod explorer;
pub mod game;
pub mod grid;
pub mod hall;
pub mod random;
pub mod room_map;
pub mod transition;

/// Edge length of one square tile, in pixels.
pub const TILE_SIZE: i32 = 64;

/// Represents errors raised while parsing a `room_<row>_<col>` key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomKeyError {
    #[error("Room key '{0}' does not start with 'room_'")]
    MissingPrefix(String),
    #[error("Room key '{0}' is not of the form room_<row>_<col>")]
    Malformed(String),
}

/// Represents a room's coordinate in the room grid.
///
/// Rows grow downwards and columns grow to the right, both 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    pub row: usize,
    pub col: usize,
}

impl GridCoord {
    pub const fn new(row: usize, col: usize) -> Self {
        GridCoord { row, col }
    }

    /// Returns the coordinate one step away in `direction`, or `None` when the
    /// step would leave the non-negative quadrant. Upper bounds are the
    /// caller's concern.
    pub fn step(self, direction: Direction) -> Option<GridCoord> {
        let (dr, dc) = direction.offset();
        Some(GridCoord {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }

    /// Builds the external key for this room, e.g. `room_1_2`.
    pub fn room_key(&self) -> String {
        format!("room_{}_{}", self.row, self.col)
    }

    /// Parses a key produced by [`GridCoord::room_key`].
    ///
    /// Only the canonical spelling is accepted, so parsing and formatting are
    /// exact inverses.
    pub fn from_room_key(key: &str) -> Result<GridCoord, RoomKeyError> {
        let rest = key
            .strip_prefix("room_")
            .ok_or_else(|| RoomKeyError::MissingPrefix(key.to_string()))?;
        let malformed = || RoomKeyError::Malformed(key.to_string());
        let (row, col) = rest.split_once('_').ok_or_else(malformed)?;
        let coord = GridCoord {
            row: row.parse().map_err(|_| malformed())?,
            col: col.parse().map_err(|_| malformed())?,
        };
        if coord.room_key() != key {
            return Err(malformed());
        }
        Ok(coord)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl FromStr for GridCoord {
    type Err = RoomKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GridCoord::from_room_key(s)
    }
}

/// One of the four sides of a room a door can sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// The side facing this one across a shared edge.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// `(row, col)` delta of the neighbouring room in this direction.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in room-local pixel space. The origin is the top-left corner of
/// the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelPos {
    pub x: i32,
    pub y: i32,
}

impl PixelPos {
    pub const fn new(x: i32, y: i32) -> Self {
        PixelPos { x, y }
    }

    /// Squared euclidean distance, kept integral.
    pub fn distance_sq(&self, other: &PixelPos) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }
}

/// Axis-aligned rectangle in room-local pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        PixelRect { x, y, w, h }
    }

    /// A `size × size` square centred on `center`.
    pub fn centered(center: PixelPos, size: i32) -> Self {
        PixelRect {
            x: center.x - size / 2,
            y: center.y - size / 2,
            w: size,
            h: size,
        }
    }

    /// Strict overlap: rectangles that merely share an edge do not intersect.
    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    /// Whether `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &PixelRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.w <= self.x + self.w
            && other.y + other.h <= self.y + self.h
    }
}
