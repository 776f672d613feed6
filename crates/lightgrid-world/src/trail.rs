//! The trail (occupancy) grid.
//!
//! Every cell a cycle leaves behind is stamped with that cycle's id. Cells
//! are write-once within a round: the first cycle to mark a cell owns it and
//! later writes are ignored. Only [`TrailGrid::reset`] clears them.

use lightgrid_types::{AgentId, GRID_HEIGHT, GRID_WIDTH, Position};
use tracing::trace;

use crate::grid;

/// Mutable 7x52 occupancy matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailGrid {
    /// `0` = empty, otherwise the owning cycle id.
    cells: [[u8; GRID_WIDTH]; GRID_HEIGHT],
    /// Number of non-zero cells.
    written: usize,
}

impl TrailGrid {
    /// An empty trail grid.
    pub const fn new() -> Self {
        Self {
            cells: [[0; GRID_WIDTH]; GRID_HEIGHT],
            written: 0,
        }
    }

    /// Whether `p` lies inside the grid.
    pub fn in_bounds(p: Position) -> bool {
        grid::in_bounds(p)
    }

    /// Fail-closed blocking predicate.
    ///
    /// Out-of-range positions are always blocked; in-range positions are
    /// blocked once any cycle has marked them.
    pub fn is_blocked(&self, p: Position) -> bool {
        grid::cell(p)
            .and_then(|(x, y)| self.cells.get(y).and_then(|row| row.get(x)))
            .is_none_or(|&v| v != 0)
    }

    /// Stamp `p` with `agent`. Returns `true` if the cell was written.
    ///
    /// No-op (returns `false`) when the cell is out of range or already
    /// owned.
    pub fn mark_occupied(&mut self, p: Position, agent: AgentId) -> bool {
        let Some(slot) = grid::cell(p)
            .and_then(|(x, y)| self.cells.get_mut(y).and_then(|row| row.get_mut(x)))
        else {
            return false;
        };
        if *slot != 0 {
            trace!(%p, owner = *slot, %agent, "Trail cell already owned");
            return false;
        }
        *slot = agent.get();
        self.written = self.written.saturating_add(1);
        true
    }

    /// Owner of the cell at `p`, if any.
    pub fn owner(&self, p: Position) -> Option<AgentId> {
        grid::cell(p)
            .and_then(|(x, y)| self.cells.get(y).and_then(|row| row.get(x)))
            .and_then(|&v| AgentId::new(v))
    }

    /// Number of cells written since the last reset.
    pub const fn cells_written(&self) -> usize {
        self.written
    }

    /// Zero the whole grid.
    pub const fn reset(&mut self) {
        self.cells = [[0; GRID_WIDTH]; GRID_HEIGHT];
        self.written = 0;
    }

    /// Copy the grid out as row vectors for snapshots.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells.iter().map(|row| row.to_vec()).collect()
    }
}

impl Default for TrailGrid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(raw: u8) -> AgentId {
        AgentId::new(raw).unwrap()
    }

    #[test]
    fn empty_grid_blocks_only_out_of_range() {
        let trail = TrailGrid::new();
        assert!(!trail.is_blocked(Position::new(0, 0)));
        assert!(!trail.is_blocked(Position::new(51, 6)));
        assert!(trail.is_blocked(Position::new(-1, 0)));
        assert!(trail.is_blocked(Position::new(52, 0)));
        assert!(trail.is_blocked(Position::new(0, 7)));
        assert!(trail.is_blocked(Position::new(i32::MIN, i32::MAX)));
    }

    #[test]
    fn first_writer_wins() {
        let mut trail = TrailGrid::new();
        let p = Position::new(10, 3);
        assert!(trail.mark_occupied(p, id(1)));
        assert!(!trail.mark_occupied(p, id(2)));
        assert_eq!(trail.owner(p), Some(id(1)));
        assert!(trail.is_blocked(p));
        assert_eq!(trail.cells_written(), 1);
    }

    #[test]
    fn out_of_range_mark_is_ignored() {
        let mut trail = TrailGrid::new();
        assert!(!trail.mark_occupied(Position::new(60, 2), id(1)));
        assert_eq!(trail.cells_written(), 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut trail = TrailGrid::new();
        for x in 0..5 {
            let _ = trail.mark_occupied(Position::new(x, 0), id(3));
        }
        assert_eq!(trail.cells_written(), 5);
        trail.reset();
        assert_eq!(trail.cells_written(), 0);
        assert!(trail.to_rows().iter().flatten().all(|&v| v == 0));
    }

    #[test]
    fn rows_have_grid_shape() {
        let rows = TrailGrid::new().to_rows();
        assert_eq!(rows.len(), GRID_HEIGHT);
        assert!(rows.iter().all(|r| r.len() == GRID_WIDTH));
    }
}
