use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::{Direction, GridCoord};

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Coordinate {coord} is out of bounds for a {rows}x{cols} grid")]
    OutOfBounds {
        coord: GridCoord,
        rows: usize,
        cols: usize,
    },
    #[error("Expected {expected} cells for the grid, found {found}")]
    CellCount { expected: usize, found: usize },
}

/// A generic 2D grid addressed by [`GridCoord`].
///
/// Stores elements of type `T` in a flat vector using row-major order, so a
/// single forward pass over `iter()` visits rooms in the same order the door
/// generator does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`.
    pub fn new(rows: usize, cols: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = rows.checked_mul(cols).expect("Grid size overflow");
        Grid {
            rows,
            cols,
            cells: vec![T::default(); size],
        }
    }

    /// Creates a new grid, calling `f` once per cell in row-major order.
    ///
    /// Errors from `f` abort construction and are returned unchanged.
    pub fn try_from_generator<F, E>(rows: usize, cols: usize, mut f: F) -> Result<Self, E>
    where
        F: FnMut(GridCoord) -> Result<T, E>,
    {
        let mut cells = Vec::with_capacity(rows.saturating_mul(cols));
        for row in 0..rows {
            for col in 0..cols {
                cells.push(f(GridCoord { row, col })?);
            }
        }
        Ok(Grid { rows, cols, cells })
    }

    /// Wraps an existing row-major vector of cells.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<T>) -> Result<Self, GridError> {
        let expected = rows.checked_mul(cols).unwrap_or(usize::MAX);
        if cells.len() != expected {
            return Err(GridError::CellCount {
                expected,
                found: cells.len(),
            });
        }
        Ok(Grid { rows, cols, cells })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Converts a coordinate to a flat vector index, or `None` if out of bounds.
    #[inline]
    pub fn coord_to_index(&self, coord: GridCoord) -> Option<usize> {
        if self.is_valid(coord) {
            Some(coord.row * self.cols + coord.col)
        } else {
            None
        }
    }

    #[inline]
    pub fn is_valid(&self, coord: GridCoord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    /// The in-bounds neighbour of `coord` in `direction`, if any.
    pub fn neighbor(&self, coord: GridCoord, direction: Direction) -> Option<GridCoord> {
        coord.step(direction).filter(|next| self.is_valid(*next))
    }

    /// Directions from `coord` that lead to another cell of this grid.
    pub fn neighbor_directions(&self, coord: GridCoord) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|direction| self.neighbor(coord, *direction).is_some())
            .collect()
    }

    pub fn get(&self, coord: GridCoord) -> Option<&T> {
        self.cells.get(self.coord_to_index(coord)?)
    }

    /// Sets the value of the cell at `coord`.
    pub fn set(&mut self, coord: GridCoord, value: T) -> Result<(), GridError> {
        let index = self.coord_to_index(coord).ok_or(GridError::OutOfBounds {
            coord,
            rows: self.rows,
            cols: self.cols,
        })?;
        self.cells[index] = value;
        Ok(())
    }

    /// Returns an iterator over the cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Returns an iterator that yields `(coord, &T)` for each cell.
    pub fn enumerate(&self) -> impl Iterator<Item = (GridCoord, &T)> {
        let cols = self.cols;
        self.cells.iter().enumerate().map(move |(index, cell)| {
            (
                GridCoord {
                    row: index / cols,
                    col: index % cols,
                },
                cell,
            )
        })
    }
}

impl<T> Index<GridCoord> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, coord: GridCoord) -> &Self::Output {
        match self.coord_to_index(coord) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index {} out of bounds for a {}x{} grid",
                coord, self.rows, self.cols
            ),
        }
    }
}

impl<T> IndexMut<GridCoord> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, coord: GridCoord) -> &mut Self::Output {
        let (rows, cols) = (self.rows, self.cols);
        match self.coord_to_index(coord) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index {} out of bounds for a {}x{} grid",
                coord, rows, cols
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_layout() {
        let grid: Grid<usize> =
            Grid::try_from_generator::<_, ()>(2, 3, |c| Ok(c.row * 10 + c.col)).unwrap();
        assert_eq!(grid.iter().copied().collect::<Vec<_>>(), [0, 1, 2, 10, 11, 12]);
        assert_eq!(grid.enumerate().nth(4), Some((GridCoord::new(1, 1), &11)));
        assert_eq!(grid[GridCoord::new(1, 2)], 12);
    }

    #[test]
    fn neighbors_respect_bounds() {
        let grid: Grid<u8> = Grid::new(2, 2);
        let corner = GridCoord::new(1, 1);
        assert_eq!(grid.neighbor(corner, Direction::Down), None);
        assert_eq!(grid.neighbor(corner, Direction::Up), Some(GridCoord::new(0, 1)));
        assert_eq!(
            grid.neighbor_directions(GridCoord::new(0, 0)),
            vec![Direction::Down, Direction::Right]
        );
    }

    #[test]
    fn set_out_of_bounds_is_an_error() {
        let mut grid: Grid<u8> = Grid::new(1, 1);
        assert!(grid.set(GridCoord::new(0, 0), 7).is_ok());
        assert_eq!(
            grid.set(GridCoord::new(0, 1), 7),
            Err(GridError::OutOfBounds {
                coord: GridCoord::new(0, 1),
                rows: 1,
                cols: 1
            })
        );
    }

    #[test]
    fn from_cells_checks_length() {
        assert!(Grid::from_cells(2, 2, vec![0u8; 4]).is_ok());
        assert_eq!(
            Grid::from_cells(2, 2, vec![0u8; 3]),
            Err(GridError::CellCount {
                expected: 4,
                found: 3
            })
        );
    }
}
