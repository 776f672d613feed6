//! Fixed spawn table and round-start cycle creation.
//!
//! Every round starts with the same four cycles at the same four cells.
//! Only the initial heading is random, drawn from the injected RNG.

use lightgrid_types::{AgentId, Heading, Position};
use rand::Rng;
use tracing::debug;

use crate::cycle::Cycle;

/// A slot in the spawn table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPoint {
    /// Raw cycle id (non-zero).
    pub id: u8,
    /// Spawn cell.
    pub position: Position,
    /// Display color.
    pub color: &'static str,
}

/// The four spawn slots, in processing order.
pub const SPAWN_POINTS: [SpawnPoint; 4] = [
    SpawnPoint {
        id: 1,
        position: Position::new(5, 1),
        color: "#00f0ff",
    },
    SpawnPoint {
        id: 2,
        position: Position::new(46, 1),
        color: "#ff2bd6",
    },
    SpawnPoint {
        id: 3,
        position: Position::new(5, 5),
        color: "#ffe600",
    },
    SpawnPoint {
        id: 4,
        position: Position::new(46, 5),
        color: "#39ff14",
    },
];

/// Draw a uniformly random heading.
pub fn random_heading(rng: &mut impl Rng) -> Heading {
    match rng.random_range(0_u8..4) {
        0 => Heading::Up,
        1 => Heading::Down,
        2 => Heading::Left,
        _ => Heading::Right,
    }
}

/// Create the cycles for a fresh round, one per spawn point, in table order.
pub fn spawn_cycles(rng: &mut impl Rng) -> Vec<Cycle> {
    SPAWN_POINTS
        .iter()
        .filter_map(|point| {
            let id = AgentId::new(point.id)?;
            let heading = random_heading(rng);
            debug!(agent_id = %id, position = %point.position, ?heading, "Cycle spawned");
            Some(Cycle::new(id, point.position, heading, point.color))
        })
        .collect()
}
