//! The background activity grid.
//!
//! A 7x52 matrix of activity levels in `0..=4` supplied once per engine run
//! (a contribution-style heat map). It never changes during a round and only
//! feeds the steering heuristic's exploration term.

use lightgrid_types::{GRID_HEIGHT, GRID_WIDTH, Position};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::grid;

/// Largest accepted activity level.
pub const MAX_ACTIVITY: u8 = 4;

/// Immutable activity matrix, row-major (`rows[y][x]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct ActivityGrid {
    cells: [[u8; GRID_WIDTH]; GRID_HEIGHT],
}

impl ActivityGrid {
    /// A grid with no recorded activity anywhere.
    pub const fn empty() -> Self {
        Self {
            cells: [[0; GRID_WIDTH]; GRID_HEIGHT],
        }
    }

    /// Build a grid from externally supplied rows.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the matrix is not exactly 7 rows of 52
    /// columns or any value exceeds [`MAX_ACTIVITY`].
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, WorldError> {
        if rows.len() != GRID_HEIGHT {
            return Err(WorldError::RowCount {
                expected: GRID_HEIGHT,
                actual: rows.len(),
            });
        }

        let mut cells = [[0; GRID_WIDTH]; GRID_HEIGHT];
        for (y, (source, target)) in rows.iter().zip(cells.iter_mut()).enumerate() {
            if source.len() != GRID_WIDTH {
                return Err(WorldError::ColumnCount {
                    row: y,
                    expected: GRID_WIDTH,
                    actual: source.len(),
                });
            }
            for (x, (&value, slot)) in source.iter().zip(target.iter_mut()).enumerate() {
                if value > MAX_ACTIVITY {
                    return Err(WorldError::ValueOutOfRange {
                        x,
                        y,
                        value,
                        max: MAX_ACTIVITY,
                    });
                }
                *slot = value;
            }
        }

        Ok(Self { cells })
    }

    /// Activity level at `p`. Out-of-range positions read as 0.
    pub fn level_at(&self, p: Position) -> u8 {
        grid::cell(p)
            .and_then(|(x, y)| self.cells.get(y).and_then(|row| row.get(x)))
            .copied()
            .unwrap_or(0)
    }

    /// Copy the grid out as row vectors.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells.iter().map(|row| row.to_vec()).collect()
    }
}

impl Default for ActivityGrid {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<Vec<Vec<u8>>> for ActivityGrid {
    type Error = WorldError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

impl From<ActivityGrid> for Vec<Vec<u8>> {
    fn from(grid: ActivityGrid) -> Self {
        grid.to_rows()
    }
}
