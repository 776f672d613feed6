//! The arena: the activity grid and trail grid a round is played on.

use lightgrid_types::{AgentId, Position};

use crate::activity::ActivityGrid;
use crate::trail::TrailGrid;

/// Static background plus the mutable trail for the current round.
#[derive(Debug, Clone, Default)]
pub struct Arena {
    activity: ActivityGrid,
    trail: TrailGrid,
}

impl Arena {
    /// Create an arena over `activity` with an empty trail.
    pub const fn new(activity: ActivityGrid) -> Self {
        Self {
            activity,
            trail: TrailGrid::new(),
        }
    }

    /// The background activity grid.
    pub const fn activity(&self) -> &ActivityGrid {
        &self.activity
    }

    /// The trail grid.
    pub const fn trail(&self) -> &TrailGrid {
        &self.trail
    }

    /// Whether `p` lies inside the grid. Every arena has the same shape.
    pub fn in_bounds(p: Position) -> bool {
        TrailGrid::in_bounds(p)
    }

    /// See [`TrailGrid::is_blocked`].
    pub fn is_blocked(&self, p: Position) -> bool {
        self.trail.is_blocked(p)
    }

    /// See [`TrailGrid::mark_occupied`].
    pub fn mark_occupied(&mut self, p: Position, agent: AgentId) -> bool {
        self.trail.mark_occupied(p, agent)
    }

    /// Activity level at `p` (0 when out of range).
    pub fn activity_at(&self, p: Position) -> u8 {
        self.activity.level_at(p)
    }

    /// Clear the trail. The activity grid is kept.
    pub const fn reset(&mut self) {
        self.trail.reset();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn reset_keeps_activity() {
        let mut rows = vec![vec![0_u8; 52]; 7];
        rows[1][1] = 3;
        let mut arena = Arena::new(ActivityGrid::from_rows(&rows).unwrap());
        let p = Position::new(1, 1);
        assert!(arena.mark_occupied(p, AgentId::new(1).unwrap()));
        assert!(arena.is_blocked(p));
        arena.reset();
        assert!(!arena.is_blocked(p));
        assert_eq!(arena.activity_at(p), 3);
    }

    #[test]
    fn out_of_bounds_cells_are_blocked() {
        let arena = Arena::default();
        for p in [Position::new(-1, 0), Position::new(52, 3), Position::new(0, 7)] {
            assert!(!Arena::in_bounds(p));
            assert!(arena.is_blocked(p));
        }
        assert!(Arena::in_bounds(Position::new(51, 6)));
        assert!(!arena.is_blocked(Position::new(51, 6)));
    }
}
