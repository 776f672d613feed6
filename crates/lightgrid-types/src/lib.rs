//! Shared type definitions for the Lightgrid simulation.
//!
//! This crate is the single source of truth for the values that cross crate
//! boundaries: identifiers, headings, positions, collision events and the
//! per-frame snapshot. Types defined here flow downstream to `TypeScript` via
//! `ts-rs` for the renderer.
//!
//! # Modules
//!
//! - [`ids`] -- Cycle and round identifiers
//! - [`enums`] -- Headings and the round phase
//! - [`structs`] -- Positions, events and snapshot types

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Heading, RoundPhase};
pub use ids::{AgentId, RoundId};
pub use structs::{
    CollisionEvent, CycleView, GRID_HEIGHT, GRID_WIDTH, Position, SimulationSnapshot,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. The files are written to the `bindings/`
        // directory relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::RoundId::export_all();

        let _ = crate::enums::Heading::export_all();
        let _ = crate::enums::RoundPhase::export_all();

        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::CollisionEvent::export_all();
        let _ = crate::structs::CycleView::export_all();
        let _ = crate::structs::SimulationSnapshot::export_all();
    }
}
