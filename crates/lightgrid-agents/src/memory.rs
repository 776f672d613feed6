//! Bounded FIFO of recently visited positions.
//!
//! Each cycle remembers the last [`MEMORY_CAPACITY`] cells it left. The
//! steering heuristic uses the memory to penalise doubling back into
//! territory it has just travelled through.

use std::collections::VecDeque;

use lightgrid_types::Position;
use serde::{Deserialize, Serialize};

/// Number of positions a cycle remembers.
pub const MEMORY_CAPACITY: usize = 20;

/// Fixed-capacity position history, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionMemory {
    entries: VecDeque<Position>,
    capacity: usize,
}

impl PositionMemory {
    /// Create an empty memory holding [`MEMORY_CAPACITY`] positions.
    pub fn new() -> Self {
        Self::with_capacity(MEMORY_CAPACITY)
    }

    /// Create an empty memory with a custom capacity (at least 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a position, evicting the oldest when full.
    pub fn push(&mut self, position: Position) {
        while self.entries.len() >= self.capacity {
            let _ = self.entries.pop_front();
        }
        self.entries.push_back(position);
    }

    /// Number of remembered positions within Chebyshev distance `radius` of
    /// `center`.
    pub fn count_within(&self, center: Position, radius: u32) -> usize {
        self.entries
            .iter()
            .filter(|p| p.chebyshev(center) <= radius)
            .count()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.entries.iter()
    }

    /// Most recently remembered position.
    pub fn latest(&self) -> Option<Position> {
        self.entries.back().copied()
    }

    /// Number of remembered positions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been remembered yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of positions kept.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for PositionMemory {
    fn default() -> Self {
        Self::new()
    }
}
