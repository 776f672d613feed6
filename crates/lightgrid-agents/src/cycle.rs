//! Per-cycle mutable state.
//!
//! A [`Cycle`] is created at round start, mutated once per tick while alive,
//! and kept around after it dies so the renderer can still draw it. Dead
//! cycles are never moved again.

use lightgrid_types::{AgentId, CycleView, Heading, Position};
use tracing::debug;

use crate::memory::PositionMemory;

/// One light cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    id: AgentId,
    position: Position,
    heading: Heading,
    alive: bool,
    memory: PositionMemory,
    /// Ticks since the heading last changed.
    ticks_since_turn: u64,
    color: &'static str,
}

impl Cycle {
    /// Create a live cycle at `position` facing `heading`.
    pub fn new(id: AgentId, position: Position, heading: Heading, color: &'static str) -> Self {
        Self {
            id,
            position,
            heading,
            alive: true,
            memory: PositionMemory::new(),
            ticks_since_turn: 0,
            color,
        }
    }

    /// Cycle identifier.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Current cell.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Current heading.
    pub const fn heading(&self) -> Heading {
        self.heading
    }

    /// Whether the cycle is still moving.
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Recently visited cells.
    pub const fn memory(&self) -> &PositionMemory {
        &self.memory
    }

    /// Ticks since the last heading change.
    pub const fn ticks_since_turn(&self) -> u64 {
        self.ticks_since_turn
    }

    /// Display color.
    pub const fn color(&self) -> &'static str {
        self.color
    }

    /// Apply a steering decision. Returns `true` if the heading changed.
    ///
    /// A change resets the ticks-since-turn counter; keeping the heading
    /// increments it. Dead cycles ignore the call.
    pub fn steer(&mut self, heading: Heading) -> bool {
        if !self.alive {
            return false;
        }
        if heading == self.heading {
            self.ticks_since_turn = self.ticks_since_turn.saturating_add(1);
            false
        } else {
            self.heading = heading;
            self.ticks_since_turn = 0;
            true
        }
    }

    /// The cell the cycle will enter next tick on its current heading.
    pub const fn next_position(&self) -> Position {
        self.position.step(self.heading)
    }

    /// Remember the current cell and move to `next`. Dead cycles ignore the
    /// call.
    pub fn advance_to(&mut self, next: Position) {
        if !self.alive {
            return;
        }
        self.memory.push(self.position);
        self.position = next;
    }

    /// Stop the cycle for good. Returns `false` if it was already dead.
    pub fn kill(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        debug!(agent_id = %self.id, position = %self.position, "Cycle stopped");
        true
    }

    /// Render-facing view of this cycle.
    pub fn view(&self) -> CycleView {
        CycleView {
            id: self.id,
            position: self.position,
            heading: self.heading,
            color: self.color.to_owned(),
            alive: self.alive,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cycle() -> Cycle {
        Cycle::new(AgentId::new(1).unwrap(), Position::new(5, 1), Heading::Right, "#00f0ff")
    }

    #[test]
    fn steering_tracks_turn_counter() {
        let mut c = cycle();
        assert!(!c.steer(Heading::Right));
        assert!(!c.steer(Heading::Right));
        assert_eq!(c.ticks_since_turn(), 2);
        assert!(c.steer(Heading::Down));
        assert_eq!(c.ticks_since_turn(), 0);
        assert_eq!(c.heading(), Heading::Down);
    }

    #[test]
    fn advance_remembers_previous_cell() {
        let mut c = cycle();
        let next = c.next_position();
        c.advance_to(next);
        assert_eq!(c.position(), Position::new(6, 1));
        assert_eq!(c.memory().latest(), Some(Position::new(5, 1)));
    }

    #[test]
    fn dead_cycles_are_frozen() {
        let mut c = cycle();
        assert!(c.kill());
        assert!(!c.kill());
        c.advance_to(Position::new(9, 9));
        assert!(!c.steer(Heading::Up));
        assert_eq!(c.position(), Position::new(5, 1));
        assert_eq!(c.heading(), Heading::Right);
        assert!(!c.view().alive);
    }
}
