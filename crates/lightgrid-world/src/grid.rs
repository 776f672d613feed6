//! Coordinate helpers shared by the activity and trail grids.

use lightgrid_types::{GRID_HEIGHT, GRID_WIDTH, Position};

/// Whether `p` lies inside the 52x7 grid.
pub fn in_bounds(p: Position) -> bool {
    cell(p).is_some()
}

/// Convert a position to `(column, row)` indices, or `None` when out of range.
pub fn cell(p: Position) -> Option<(usize, usize)> {
    let x = usize::try_from(p.x).ok()?;
    let y = usize::try_from(p.y).ok()?;
    (x < GRID_WIDTH && y < GRID_HEIGHT).then_some((x, y))
}

/// Minimum distance from `p` to any of the four grid boundaries.
///
/// Returns 0 for positions outside the grid.
pub fn edge_distance(p: Position) -> usize {
    let Some((x, y)) = cell(p) else {
        return 0;
    };
    let right = GRID_WIDTH.saturating_sub(1).saturating_sub(x);
    let bottom = GRID_HEIGHT.saturating_sub(1).saturating_sub(y);
    x.min(right).min(y).min(bottom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_in_bounds() {
        assert!(in_bounds(Position::new(0, 0)));
        assert!(in_bounds(Position::new(51, 6)));
        assert!(!in_bounds(Position::new(52, 0)));
        assert!(!in_bounds(Position::new(0, 7)));
        assert!(!in_bounds(Position::new(-1, 3)));
    }

    #[test]
    fn edge_distance_is_nearest_border() {
        assert_eq!(edge_distance(Position::new(0, 3)), 0);
        assert_eq!(edge_distance(Position::new(10, 3)), 3);
        assert_eq!(edge_distance(Position::new(50, 3)), 1);
        assert_eq!(edge_distance(Position::new(20, 1)), 1);
        assert_eq!(edge_distance(Position::new(-4, 3)), 0);
    }
}
