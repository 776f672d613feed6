//! Grids for the Lightgrid simulation.
//!
//! This crate models the playing field: the static activity heat map that
//! colours the background, and the trail grid that records every cell a
//! cycle has driven through in the current round.
//!
//! # Modules
//!
//! - [`activity`] -- Validated, immutable 7x52 activity matrix.
//! - [`arena`] -- Activity plus trail for one round.
//! - [`error`] -- Construction errors for external grid input.
//! - [`grid`] -- Coordinate and bounds helpers.
//! - [`trail`] -- Write-once occupancy grid with the fail-closed blocking
//!   predicate used by every safety check.

pub mod activity;
pub mod arena;
pub mod error;
pub mod grid;
pub mod trail;

// Re-export primary types at crate root.
pub use activity::{ActivityGrid, MAX_ACTIVITY};
pub use arena::Arena;
pub use error::WorldError;
pub use trail::TrailGrid;
