//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket` + operator) into a single
//! [`Router`] with CORS and request tracing enabled.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::operator;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/frames` -- `WebSocket` frame stream
/// - `GET /api/snapshot` -- latest simulation snapshot
/// - `GET /api/cycles` -- list cycles
/// - `GET /api/cycles/{id}` -- single cycle
/// - `GET /api/trail` -- trail grid
/// - `GET /api/collisions` -- recent collisions
/// - `POST /api/operator/{pause,resume,speed,stop}` and
///   `GET /api/operator/status` -- operator controls
///
/// CORS allows any origin so a locally served renderer can connect.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/frames", get(ws::ws_frames))
        // REST API
        .route("/api/snapshot", get(handlers::get_snapshot))
        .route("/api/cycles", get(handlers::list_cycles))
        .route("/api/cycles/{id}", get(handlers::get_cycle))
        .route("/api/trail", get(handlers::get_trail))
        .route("/api/collisions", get(handlers::list_collisions))
        // Operator
        .route("/api/operator/pause", post(operator::pause))
        .route("/api/operator/resume", post(operator::resume))
        .route("/api/operator/speed", post(operator::set_speed))
        .route("/api/operator/status", get(operator::status))
        .route("/api/operator/stop", post(operator::stop))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
