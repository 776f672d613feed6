//! Enumeration types for the Lightgrid simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Heading
// ---------------------------------------------------------------------------

/// One of the four cardinal directions a light cycle can travel.
///
/// `Up` decreases `y` (row 0 is the top of the grid), `Left` decreases `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Heading {
    /// Towards row 0.
    Up,
    /// Towards the last row.
    Down,
    /// Towards column 0.
    Left,
    /// Towards the last column.
    Right,
}

impl Heading {
    /// All headings in the fixed evaluation order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Unit step `(dx, dy)` for this heading.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// The heading pointing the other way.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Whether `other` would be a U-turn from `self`.
    pub const fn is_reverse_of(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Up, Self::Down)
                | (Self::Down, Self::Up)
                | (Self::Left, Self::Right)
                | (Self::Right, Self::Left)
        )
    }
}

// ---------------------------------------------------------------------------
// Round phase
// ---------------------------------------------------------------------------

/// Lifecycle state of the current round.
///
/// The machine loops forever: `Playing` until at most one cycle survives,
/// then `Restarting` for a fixed delay, then a fresh `Playing` round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum RoundPhase {
    /// Cycles are moving.
    Playing,
    /// The round is over and waiting out the restart delay.
    Restarting,
}
