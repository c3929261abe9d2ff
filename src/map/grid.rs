// src/map/grid.rs

// Occupancy grid as delivered by the map server: a row-major raster of i8
// cells using the nav_msgs convention (0 free, negative unknown, 1..=100
// occupied). A grid is never mutated after construction; a new map replaces
// it wholesale.

use nalgebra::Vector2;

use crate::error::MapError;
use crate::pose::Pose2D;

/// Raw value of a free cell
pub const FREE_CELL: i8 = 0;
/// Raw value written for occupied cells by `from_ascii`
pub const OCCUPIED_CELL: i8 = 100;
/// Raw value of an unknown cell
pub const UNKNOWN_CELL: i8 = -1;

// Tolerance for world -> cell conversion of points sitting exactly on a cell corner
const CELL_EPSILON: f64 = 1e-6;

/// Interpreted state of one grid cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellState {
    /// Known to be traversable
    Free,
    /// Known obstacle
    Occupied,
    /// Never observed
    Unknown,
}

impl CellState {
    /// Classifies a raw cell value. Only exactly zero counts as free.
    pub fn from_raw(value: i8) -> Self {
        match value {
            FREE_CELL => CellState::Free,
            v if v < 0 => CellState::Unknown,
            _ => CellState::Occupied,
        }
    }
}

/// 2D occupancy grid
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancyGrid {
    width: usize,
    height: usize,
    resolution: f64, // Meters per cell
    origin: Pose2D,  // World pose of cell (0, 0); rotation is not applied
    data: Vec<i8>,
}

impl OccupancyGrid {
    /// Creates a grid, checking the raster size and resolution
    pub fn new(
        width: usize,
        height: usize,
        resolution: f64,
        origin: Pose2D,
        data: Vec<i8>,
    ) -> Result<Self, MapError> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(MapError::InvalidResolution(resolution));
        }
        let expected = width * height;
        if data.len() != expected {
            return Err(MapError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(OccupancyGrid {
            width,
            height,
            resolution,
            origin,
            data,
        })
    }

    /// Builds a grid from text rows: `.` free, `#` occupied, `?` unknown.
    /// The first string is row 0.
    pub fn from_ascii(resolution: f64, origin: Pose2D, rows: &[&str]) -> Result<Self, MapError> {
        let width = rows.first().map_or(0, |r| r.chars().count());
        let mut data = Vec::with_capacity(width * rows.len());

        for (row, line) in rows.iter().enumerate() {
            let actual = line.chars().count();
            if actual != width {
                return Err(MapError::RaggedRow {
                    row,
                    expected: width,
                    actual,
                });
            }
            for symbol in line.chars() {
                data.push(match symbol {
                    '.' => FREE_CELL,
                    '#' => OCCUPIED_CELL,
                    '?' => UNKNOWN_CELL,
                    other => return Err(MapError::UnknownSymbol(other)),
                });
            }
        }

        OccupancyGrid::new(width, rows.len(), resolution, origin, data)
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.height
    }

    /// Meters per cell
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// World pose of cell (0, 0)
    pub fn origin(&self) -> Pose2D {
        self.origin
    }

    /// Raw row-major cells
    pub fn data(&self) -> &[i8] {
        &self.data
    }

    /// State of the cell at (row, col), `None` outside the grid
    pub fn cell(&self, row: usize, col: usize) -> Option<CellState> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data
            .get(row * self.width + col)
            .map(|v| CellState::from_raw(*v))
    }

    /// True if (row, col) is inside the grid and free
    pub fn is_free(&self, row: usize, col: usize) -> bool {
        self.cell(row, col) == Some(CellState::Free)
    }

    /// World coordinates of a cell: origin + (col, row) * resolution
    pub fn cell_to_world(&self, row: usize, col: usize) -> Vector2<f64> {
        self.origin.position() + Vector2::new(col as f64, row as f64) * self.resolution
    }

    /// Cell containing a world point, `None` outside the grid
    pub fn world_to_cell(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let col = ((x - self.origin.x) / self.resolution + CELL_EPSILON).floor();
        let row = ((y - self.origin.y) / self.resolution + CELL_EPSILON).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        (row < self.height && col < self.width).then_some((row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, CellState::Free)]
    #[case(-1, CellState::Unknown)]
    #[case(-128, CellState::Unknown)]
    #[case(1, CellState::Occupied)]
    #[case(100, CellState::Occupied)]
    fn test_cell_state_from_raw(#[case] raw: i8, #[case] expected: CellState) {
        assert_eq!(CellState::from_raw(raw), expected);
    }

    #[test]
    fn test_new_rejects_bad_size_and_resolution() {
        let origin = Pose2D::default();
        assert_eq!(
            OccupancyGrid::new(3, 2, 0.5, origin, vec![0; 5]),
            Err(MapError::SizeMismatch {
                expected: 6,
                actual: 5
            })
        );
        assert_eq!(
            OccupancyGrid::new(1, 1, 0.0, origin, vec![0]),
            Err(MapError::InvalidResolution(0.0))
        );
    }

    #[test]
    fn test_from_ascii_layout() {
        let grid = OccupancyGrid::from_ascii(1.0, Pose2D::default(), &[".#", "?."]).unwrap();
        assert_eq!((grid.width(), grid.height()), (2, 2));
        assert_eq!(grid.cell(0, 0), Some(CellState::Free));
        assert_eq!(grid.cell(0, 1), Some(CellState::Occupied));
        assert_eq!(grid.cell(1, 0), Some(CellState::Unknown));
        assert!(grid.is_free(1, 1));
        assert_eq!(grid.cell(2, 0), None);

        assert!(matches!(
            OccupancyGrid::from_ascii(1.0, Pose2D::default(), &["..", "."]),
            Err(MapError::RaggedRow { row: 1, .. })
        ));
        assert_eq!(
            OccupancyGrid::from_ascii(1.0, Pose2D::default(), &["x"]),
            Err(MapError::UnknownSymbol('x'))
        );
    }

    #[test]
    fn test_cell_world_conversion() {
        let origin = Pose2D::new(-2.0, 1.0, 0.0);
        let grid = OccupancyGrid::new(4, 3, 0.05, origin, vec![0; 12]).unwrap();

        let world = grid.cell_to_world(2, 3);
        assert!((world.x - (-2.0 + 3.0 * 0.05)).abs() < 1e-12);
        assert!((world.y - (1.0 + 2.0 * 0.05)).abs() < 1e-12);

        // Cell corners map back to their own cell
        for row in 0..3 {
            for col in 0..4 {
                let p = grid.cell_to_world(row, col);
                assert_eq!(grid.world_to_cell(p.x, p.y), Some((row, col)));
            }
        }
        assert_eq!(grid.world_to_cell(-2.5, 1.0), None);
        assert_eq!(grid.world_to_cell(-2.0, 1.0 + 3.0 * 0.05), None);
    }
}
