//! Type-safe identifiers for cycles and rounds.
//!
//! Cycle identifiers are small non-zero integers because they are written
//! directly into the trail grid, where `0` means "empty". Round identifiers
//! use UUID v7 (time-ordered) so observers can tell rounds apart across
//! engine restarts.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Identifier of a light cycle. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct AgentId(u8);

impl AgentId {
    /// Create an identifier, returning `None` for the reserved value `0`.
    pub const fn new(raw: u8) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    /// Return the raw value stored in the trail grid.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "cycle-{}", self.0)
    }
}

/// Unique identifier for one round (spawn to restart).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoundId(pub Uuid);

impl RoundId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for RoundId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RoundId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RoundId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}
