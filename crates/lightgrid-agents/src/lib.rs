//! Light cycle state and lifecycle for the Lightgrid simulation.
//!
//! This crate contains everything that operates on a single cycle without
//! looking at the grid: movement, heading bookkeeping, the bounded position
//! memory, and the fixed spawn table used at the start of every round.
//!
//! # Modules
//!
//! - [`cycle`] -- The [`Cycle`] state machine (alive, moving, stopped).
//! - [`memory`] -- Bounded FIFO of visited positions ([`PositionMemory`]).
//! - [`spawn`] -- Spawn table and seeded round-start creation.

pub mod cycle;
pub mod memory;
pub mod spawn;

// Re-export primary types at crate root for convenience.
pub use cycle::Cycle;
pub use memory::{MEMORY_CAPACITY, PositionMemory};
pub use spawn::{SPAWN_POINTS, SpawnPoint, random_heading, spawn_cycles};
