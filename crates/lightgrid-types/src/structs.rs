//! Core value types and read-only snapshot structs.
//!
//! Snapshot types are what the rendering side consumes once per frame. They
//! are plain data, cloned out of the simulation, and exported to `TypeScript`
//! through `ts-rs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Heading, RoundPhase};
use crate::ids::{AgentId, RoundId};

/// Number of columns in the activity and trail grids (weeks).
pub const GRID_WIDTH: usize = 52;

/// Number of rows in the activity and trail grids (days).
pub const GRID_HEIGHT: usize = 7;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A grid coordinate.
///
/// Coordinates are signed so that neighbours of edge cells can be
/// represented; such positions are simply out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Column, `0..GRID_WIDTH` when in bounds.
    pub x: i32,
    /// Row, `0..GRID_HEIGHT` when in bounds.
    pub y: i32,
}

impl Position {
    /// Create a position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent position one step along `heading`.
    pub const fn step(self, heading: Heading) -> Self {
        self.step_by(heading, 1)
    }

    /// The position `distance` steps along `heading`.
    pub const fn step_by(self, heading: Heading, distance: i32) -> Self {
        let (dx, dy) = heading.delta();
        Self {
            x: self.x.saturating_add(dx.saturating_mul(distance)),
            y: self.y.saturating_add(dy.saturating_mul(distance)),
        }
    }

    /// Chebyshev (king-move) distance between two positions.
    pub const fn chebyshev(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Emitted when a cycle dies, either by running into a blocked cell or by
/// being stopped at the end of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CollisionEvent {
    /// The cycle that stopped.
    pub agent_id: AgentId,
    /// Where the cycle was when it stopped.
    pub position: Position,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Render-facing view of a single cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CycleView {
    /// Cycle identifier.
    pub id: AgentId,
    /// Current position.
    pub position: Position,
    /// Current heading.
    pub heading: Heading,
    /// Display color as a `#rrggbb` string.
    pub color: String,
    /// Whether the cycle is still moving.
    pub alive: bool,
}

/// Full read-only copy of the simulation state for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimulationSnapshot {
    /// Identifier of the current round.
    pub round_id: RoundId,
    /// 1-based round counter since the engine started.
    pub round: u64,
    /// Wall-clock time the current round started.
    pub round_started_at: DateTime<Utc>,
    /// Lifecycle state.
    pub phase: RoundPhase,
    /// Current score.
    pub score: u64,
    /// Milliseconds of play elapsed in this round.
    pub elapsed_ms: u64,
    /// Current tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Ticks applied in this round.
    pub tick: u64,
    /// Every cycle of the round, dead ones included.
    pub cycles: Vec<CycleView>,
    /// Trail grid rows (`GRID_HEIGHT` rows of `GRID_WIDTH` cells); `0` is empty,
    /// any other value is the owning cycle id.
    pub trail: Vec<Vec<u8>>,
}

impl SimulationSnapshot {
    /// Number of cycles still alive in this snapshot.
    pub fn alive_count(&self) -> usize {
        self.cycles.iter().filter(|c| c.alive).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_one_cell() {
        let p = Position::new(3, 3);
        assert_eq!(p.step(Heading::Up), Position::new(3, 2));
        assert_eq!(p.step(Heading::Down), Position::new(3, 4));
        assert_eq!(p.step(Heading::Left), Position::new(2, 3));
        assert_eq!(p.step(Heading::Right), Position::new(4, 3));
        assert_eq!(p.step_by(Heading::Right, 4), Position::new(7, 3));
    }

    #[test]
    fn step_off_the_edge_goes_negative() {
        let p = Position::new(0, 0);
        assert_eq!(p.step(Heading::Left), Position::new(-1, 0));
    }

    #[test]
    fn chebyshev_takes_the_larger_axis() {
        let a = Position::new(1, 1);
        assert_eq!(a.chebyshev(Position::new(3, 2)), 2);
        assert_eq!(a.chebyshev(a), 0);
        assert_eq!(a.chebyshev(Position::new(-1, 4)), 3);
    }
}
