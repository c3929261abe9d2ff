//! Occupancy grid maps and the free-space index used for placement.
//!
//! A map and its index are always handled together as a [`MapSnapshot`] so
//! nobody can pair an index with a grid it was not built from.

mod free_space;
mod grid;

pub use free_space::FreeSpaceIndex;
pub use grid::{CellState, FREE_CELL, OCCUPIED_CELL, OccupancyGrid, UNKNOWN_CELL};

/// A grid together with the free-space index built from it
#[derive(Debug, Clone)]
pub struct MapSnapshot {
    grid: OccupancyGrid,
    free_space: FreeSpaceIndex,
}

impl MapSnapshot {
    /// Takes ownership of a grid and indexes its free cells
    pub fn new(grid: OccupancyGrid) -> Self {
        let free_space = FreeSpaceIndex::build(&grid);
        MapSnapshot { grid, free_space }
    }

    /// The grid
    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Free cells of [`Self::grid`]
    pub fn free_space(&self) -> &FreeSpaceIndex {
        &self.free_space
    }
}
