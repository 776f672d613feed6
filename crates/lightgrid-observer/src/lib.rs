//! Observer API server for the Lightgrid simulation.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/frames`) streaming every frame that
//!   changed the simulation via [`tokio::sync::broadcast`]
//! - **REST endpoints** for the latest snapshot, cycles, trail grid and
//!   recent collisions
//! - **Operator REST endpoints** for runtime control (pause, resume,
//!   speed, status, stop)
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! The engine owns the simulation. After each frame its callback pushes a
//! [`FrameBroadcast`] onto the channel and folds it into the shared
//! [`ObserverSnapshot`]. REST handlers only read that snapshot, so a slow
//! client can never stall the frame loop.

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::{AppState, CollisionRecord, FrameBroadcast, ObserverSnapshot};
