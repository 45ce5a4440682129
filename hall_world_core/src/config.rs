use serde::{Deserialize, Serialize};

use crate::{
    TILE_SIZE,
    hall::{MIN_ROOM_TILES, RoomDimensions},
    random::SeededRandom,
};

/// Represents configuration problems detected at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Rooms must be at least {min}x{min} tiles, got {width}x{height}", min = MIN_ROOM_TILES)]
    RoomTooSmall { width: usize, height: usize },
    #[error("Rooms of {width}x{height} tiles do not fit in pixel coordinates")]
    RoomTooLarge { width: usize, height: usize },
    #[error("The room grid must have at least one row and one column, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("A {rows}x{cols} room grid has too many rooms")]
    GridTooLarge { rows: usize, cols: usize },
    #[error("At least one floor type is required")]
    NoFloorTypes,
    #[error("At least one wall type is required")]
    NoWallTypes,
    #[error("The transition step must be positive")]
    ZeroTransitionStep,
    #[error("Player hitbox of {size}px must be positive and narrower than a {door}px door", door = TILE_SIZE)]
    InvalidPlayerHitbox { size: i32 },
    #[error("Entry offset of {entry_offset}px would re-trigger the door, minimum is {minimum}px")]
    EntryOffsetTooSmall { entry_offset: i32, minimum: i32 },
    #[error("Entry offset of {entry_offset}px overshoots the room, maximum is {maximum}px")]
    EntryOffsetTooLarge { entry_offset: i32, maximum: i32 },
    #[error("Invalid configuration JSON: {0}")]
    Parse(String),
}

/// Startup parameters for a world.
///
/// Missing JSON fields fall back to the defaults of [`WorldConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub grid_rows: usize,
    pub grid_cols: usize,
    /// Room width in tiles, shared by every room.
    pub room_width: usize,
    /// Room height in tiles, shared by every room.
    pub room_height: usize,
    pub floor_types: Vec<String>,
    pub wall_types: Vec<String>,
    pub ornaments: Vec<String>,
    /// Seed for reproducible worlds. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Pixels the slide advances per tick.
    pub transition_step: i32,
    /// Distance, in pixels, between the arrival door's anchor and the
    /// player's position after a transition.
    pub entry_offset: i32,
    /// Edge of the player's square hitbox, in pixels.
    pub player_hitbox: i32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            grid_rows: 4,
            grid_cols: 4,
            room_width: 20,
            room_height: 11,
            floor_types: vec!["grass".to_string(), "chess".to_string()],
            wall_types: vec!["brick".to_string(), "rock".to_string()],
            ornaments: vec!["baum_tile".to_string()],
            seed: None,
            transition_step: 20,
            entry_offset: 64,
            player_hitbox: 48,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<WorldConfig, ConfigError> {
        let config: WorldConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn dimensions(&self) -> Result<RoomDimensions, ConfigError> {
        RoomDimensions::new(self.room_width, self.room_height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_rows == 0 || self.grid_cols == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: self.grid_rows,
                cols: self.grid_cols,
            });
        }
        if self.grid_rows.checked_mul(self.grid_cols).is_none() {
            return Err(ConfigError::GridTooLarge {
                rows: self.grid_rows,
                cols: self.grid_cols,
            });
        }
        let dims = self.dimensions()?;
        if self.floor_types.is_empty() {
            return Err(ConfigError::NoFloorTypes);
        }
        if self.wall_types.is_empty() {
            return Err(ConfigError::NoWallTypes);
        }
        if self.transition_step <= 0 {
            return Err(ConfigError::ZeroTransitionStep);
        }
        if self.player_hitbox <= 0 || self.player_hitbox >= TILE_SIZE {
            return Err(ConfigError::InvalidPlayerHitbox {
                size: self.player_hitbox,
            });
        }

        self.check_entry_offset(dims)
    }

    /// Checks `entry_offset` against rooms of the given size.
    ///
    /// The arrival hitbox must clear the door tile and stay off the far wall.
    pub fn check_entry_offset(&self, dims: RoomDimensions) -> Result<(), ConfigError> {
        let half = self.player_hitbox / 2;
        let minimum = TILE_SIZE / 2 + half;
        if self.entry_offset < minimum {
            return Err(ConfigError::EntryOffsetTooSmall {
                entry_offset: self.entry_offset,
                minimum,
            });
        }
        let shortest = dims.pixel_width().min(dims.pixel_height());
        let maximum = shortest - TILE_SIZE - TILE_SIZE / 2 - half;
        if self.entry_offset > maximum {
            return Err(ConfigError::EntryOffsetTooLarge {
                entry_offset: self.entry_offset,
                maximum,
            });
        }
        Ok(())
    }

    /// Floor types with repeats removed, in first-seen order.
    pub fn floor_choices(&self) -> Vec<String> {
        distinct_names(&self.floor_types)
    }

    /// Wall types with repeats removed, in first-seen order.
    pub fn wall_choices(&self) -> Vec<String> {
        distinct_names(&self.wall_types)
    }

    /// The random source this configuration asks for.
    pub fn random_source(&self) -> SeededRandom {
        match self.seed {
            Some(seed) => SeededRandom::new(seed),
            None => SeededRandom::from_entropy(),
        }
    }
}

/// Drops repeated names so a uniform pick treats every name equally.
pub(crate) fn distinct_names(names: &[String]) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !distinct.contains(name) {
            distinct.push(name.clone());
        }
    }
    distinct
}
