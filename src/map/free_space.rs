// src/map/free_space.rs

// Precomputed list of free cells of one grid, sampled uniformly by the
// placement code. Built once per map version and never patched.

use super::grid::{CellState, OccupancyGrid};

/// Free cells of a grid as (row, col), in row-major order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreeSpaceIndex {
    cells: Vec<(usize, usize)>,
}

impl FreeSpaceIndex {
    /// Collects every free cell of `grid`. Empty if the grid has none.
    pub fn build(grid: &OccupancyGrid) -> Self {
        let width = grid.width();
        let cells = grid
            .data()
            .iter()
            .enumerate()
            .filter(|(_, value)| CellState::from_raw(**value) == CellState::Free)
            .map(|(i, _)| (i / width, i % width))
            .collect();

        FreeSpaceIndex { cells }
    }

    /// Number of free cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when nothing can be placed on the map
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The i-th free cell
    pub fn get(&self, i: usize) -> Option<(usize, usize)> {
        self.cells.get(i).copied()
    }

    /// Whether (row, col) is one of the indexed cells
    pub fn contains(&self, row: usize, col: usize) -> bool {
        // row-major order keeps the tuples sorted
        self.cells.binary_search(&(row, col)).is_ok()
    }

    /// Iterates the cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().copied()
    }
}
