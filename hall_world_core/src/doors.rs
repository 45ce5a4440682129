use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    Direction, GridCoord,
    grid::{Grid, GridError},
    random::RandomSource,
};

/// Represents errors raised while generating or validating a door grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("Door grid must have at least one row and one column, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("Door mismatch: {first} going {direction} disagrees with {second}")]
    InvariantViolation {
        first: GridCoord,
        second: GridCoord,
        direction: Direction,
    },
    #[error("Room {coord} has a {direction} door leading outside the grid")]
    DoorOutsideGrid {
        coord: GridCoord,
        direction: Direction,
    },
    #[error("Room {coord} has neighbours but no door")]
    SealedRoom { coord: GridCoord },
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Which sides of a room have a door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DoorFlags {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DoorFlags {
    pub fn get(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn set(&mut self, direction: Direction, open: bool) {
        match direction {
            Direction::Up => self.up = open,
            Direction::Down => self.down = open,
            Direction::Left => self.left = open,
            Direction::Right => self.right = open,
        }
    }

    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Open sides in `Direction::ALL` order.
    pub fn open_directions(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(move |d| self.get(*d))
    }
}

/// Door assignment for every room of the grid, before any cosmetics.
///
/// Neighbouring rooms always agree on their shared edge, and every room with
/// at least one neighbour has at least one door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorGrid {
    cells: Grid<DoorFlags>,
}

impl DoorGrid {
    /// Generates a door grid in a single row-major pass.
    ///
    /// `up` and `left` are inherited from neighbours that are already final;
    /// `right` and `down` are coin flips when the neighbour exists. A room
    /// left without any door is given one towards a random neighbour. When
    /// that door points backwards (`up`/`left`) the visited neighbour is
    /// patched in place; forward doors reach the next rooms through
    /// inheritance.
    pub fn generate(
        rows: usize,
        cols: usize,
        rng: &mut dyn RandomSource,
    ) -> Result<DoorGrid, GenerationError> {
        if rows == 0 || cols == 0 {
            return Err(GenerationError::EmptyGrid { rows, cols });
        }

        let mut cells: Grid<DoorFlags> = Grid::new(rows, cols);
        let mut forced = 0usize;

        for row in 0..rows {
            for col in 0..cols {
                let coord = GridCoord::new(row, col);
                let mut flags = DoorFlags::default();

                if let Some(above) = cells.neighbor(coord, Direction::Up) {
                    flags.up = cells[above].down;
                }
                if let Some(left) = cells.neighbor(coord, Direction::Left) {
                    flags.left = cells[left].right;
                }
                if cells.neighbor(coord, Direction::Right).is_some() {
                    flags.right = rng.next_bool();
                }
                if cells.neighbor(coord, Direction::Down).is_some() {
                    flags.down = rng.next_bool();
                }

                if !flags.any() {
                    // 1x1 grids have no candidates and stay sealed.
                    let candidates = cells.neighbor_directions(coord);
                    if !candidates.is_empty() {
                        let direction = candidates[rng.next_index(candidates.len())];
                        flags.set(direction, true);
                        if matches!(direction, Direction::Up | Direction::Left) {
                            if let Some(visited) = cells.neighbor(coord, direction) {
                                cells[visited].set(direction.opposite(), true);
                            }
                        }
                        trace!("Forced a {} door in room {}", direction, coord);
                        forced += 1;
                    }
                }

                cells.set(coord, flags)?;
            }
        }

        let grid = DoorGrid { cells };
        grid.validate()?;
        debug!(
            "Generated {}x{} door grid ({} forced doors)",
            rows, cols, forced
        );
        Ok(grid)
    }

    /// Wraps prepared flags (row-major) after validating them.
    pub fn from_flags(
        rows: usize,
        cols: usize,
        flags: Vec<DoorFlags>,
    ) -> Result<DoorGrid, GenerationError> {
        if rows == 0 || cols == 0 {
            return Err(GenerationError::EmptyGrid { rows, cols });
        }
        let grid = DoorGrid {
            cells: Grid::from_cells(rows, cols, flags)?,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Checks both door invariants in one pass.
    ///
    /// Every shared edge is checked once, from the room above or to the left.
    pub fn validate(&self) -> Result<(), GenerationError> {
        for (coord, flags) in self.cells.enumerate() {
            for direction in Direction::ALL {
                match self.cells.neighbor(coord, direction) {
                    None if flags.get(direction) => {
                        return Err(GenerationError::DoorOutsideGrid { coord, direction });
                    }
                    None => {}
                    Some(other) if matches!(direction, Direction::Right | Direction::Down) => {
                        if flags.get(direction) != self.cells[other].get(direction.opposite()) {
                            return Err(GenerationError::InvariantViolation {
                                first: coord,
                                second: other,
                                direction,
                            });
                        }
                    }
                    Some(_) => {}
                }
            }
            if !flags.any() && !self.cells.neighbor_directions(coord).is_empty() {
                return Err(GenerationError::SealedRoom { coord });
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.cells.rows()
    }

    pub fn cols(&self) -> usize {
        self.cells.cols()
    }

    pub fn get(&self, coord: GridCoord) -> Option<DoorFlags> {
        self.cells.get(coord).copied()
    }

    pub fn cells(&self) -> &Grid<DoorFlags> {
        &self.cells
    }

    pub fn enumerate(&self) -> impl Iterator<Item = (GridCoord, &DoorFlags)> {
        self.cells.enumerate()
    }
}
