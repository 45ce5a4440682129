use std::ops::Index;

use log::debug;

use crate::{
    Direction, GridCoord,
    config::{ConfigError, WorldConfig},
    doors::{DoorGrid, GenerationError},
    grid::{Grid, GridError},
    hall::{Hall, RoomDimensions},
    random::RandomSource,
};

/// Represents errors that abort map construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Every room of the world, generated once and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMap {
    dimensions: RoomDimensions,
    door_grid: DoorGrid,
    halls: Grid<Hall>,
}

impl RoomMap {
    /// Generates the door grid and then every hall, in row-major order.
    pub fn build(config: &WorldConfig, rng: &mut dyn RandomSource) -> Result<RoomMap, MapError> {
        config.validate()?;
        let door_grid = DoorGrid::generate(config.grid_rows, config.grid_cols, rng)?;
        Self::from_door_grid(door_grid, config, rng)
    }

    /// Generates halls for a prepared door grid. The grid's own size wins over
    /// `grid_rows`/`grid_cols` in `config`.
    ///
    /// Each hall draws its floor and wall texture independently from the
    /// distinct configured names, then runs its ornament pass.
    pub fn from_door_grid(
        door_grid: DoorGrid,
        config: &WorldConfig,
        rng: &mut dyn RandomSource,
    ) -> Result<RoomMap, MapError> {
        config.validate()?;
        door_grid.validate()?;
        let dimensions = config.dimensions()?;
        let (rows, cols) = (door_grid.rows(), door_grid.cols());
        let (floors, walls) = (config.floor_choices(), config.wall_choices());

        let halls = Grid::try_from_generator(rows, cols, |coord| -> Result<Hall, MapError> {
            let doors = door_grid
                .get(coord)
                .ok_or(GridError::OutOfBounds { coord, rows, cols })?;
            let floor = &floors[rng.next_index(floors.len())];
            let wall = &walls[rng.next_index(walls.len())];
            Ok(Hall::generate(
                dimensions,
                floor,
                wall,
                doors,
                &config.ornaments,
                &mut *rng,
            ))
        })?;

        let ornaments: usize = halls.iter().map(|hall| hall.ornaments().len()).sum();
        debug!(
            "Built {}x{} room map of {}x{} tile halls ({} ornaments)",
            rows,
            cols,
            dimensions.width(),
            dimensions.height(),
            ornaments
        );

        Ok(RoomMap {
            dimensions,
            door_grid,
            halls,
        })
    }

    pub fn rows(&self) -> usize {
        self.halls.rows()
    }

    pub fn cols(&self) -> usize {
        self.halls.cols()
    }

    pub fn len(&self) -> usize {
        self.halls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.halls.is_empty()
    }

    /// Size shared by every hall.
    pub fn dimensions(&self) -> RoomDimensions {
        self.dimensions
    }

    pub fn door_grid(&self) -> &DoorGrid {
        &self.door_grid
    }

    pub fn get(&self, coord: GridCoord) -> Option<&Hall> {
        self.halls.get(coord)
    }

    /// Looks a hall up by its `room_<row>_<col>` key.
    pub fn get_by_key(&self, key: &str) -> Option<&Hall> {
        let coord = GridCoord::from_room_key(key).ok()?;
        self.get(coord)
    }

    /// Coordinate of the room next to `coord`, if the map has one there.
    pub fn neighbor(&self, coord: GridCoord, direction: Direction) -> Option<GridCoord> {
        self.halls.neighbor(coord, direction)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, &Hall)> {
        self.halls.enumerate()
    }
}

/// Panics when `coord` is outside the map, like indexing a [`Grid`].
impl Index<GridCoord> for RoomMap {
    type Output = Hall;

    fn index(&self, coord: GridCoord) -> &Self::Output {
        &self.halls[coord]
    }
}
