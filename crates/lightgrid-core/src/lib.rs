//! Simulation clock, steering, tick cycle and orchestration for Lightgrid.
//!
//! This crate owns the per-frame loop that drives the light-cycle arena:
//! speed-gated ticks, heuristic steering for every cycle, and the
//! `Playing` / `Restarting` round lifecycle.
//!
//! # Modules
//!
//! - [`clock`] -- Round clock with tick gating and the speed ramp.
//! - [`config`] -- Configuration loading from `lightgrid-config.yaml` into
//!   strongly-typed structs.
//! - [`decision`] -- [`SteeringPolicy`] trait, [`HeuristicPolicy`] and
//!   [`StraightLinePolicy`].
//! - [`features`] -- Per-candidate feature extraction.
//! - [`operator`] -- Shared pause/resume/stop/speed controls.
//! - [`round`] -- Round bookkeeping and the score formula.
//! - [`runner`] -- Async frame loop with operator controls.
//! - [`tick`] -- Owned simulation state, tick and frame processing.
//!
//! [`SteeringPolicy`]: decision::SteeringPolicy
//! [`HeuristicPolicy`]: decision::HeuristicPolicy
//! [`StraightLinePolicy`]: decision::StraightLinePolicy

pub mod clock;
pub mod config;
pub mod decision;
pub mod features;
pub mod operator;
pub mod round;
pub mod runner;
pub mod tick;
