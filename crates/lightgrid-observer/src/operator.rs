//! Operator REST API handlers for runtime simulation control.
//!
//! These endpoints are separate from the read-only observer API. They give
//! the operator one-way command authority over the frame loop.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/operator/pause` | Pause the frame loop |
//! | `POST` | `/api/operator/resume` | Resume the frame loop |
//! | `POST` | `/api/operator/speed` | Set frame interval (ms) |
//! | `GET` | `/api/operator/status` | Current run status |
//! | `POST` | `/api/operator/stop` | Trigger clean shutdown |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use lightgrid_core::operator::{MIN_FRAME_INTERVAL_MS, OperatorState, SimulationStatus};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/operator/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SetSpeedRequest {
    /// New frame interval in milliseconds (minimum 10).
    pub frame_interval_ms: u64,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    /// Whether the operation succeeded.
    ok: bool,
    /// Human-readable message.
    message: String,
}

fn operator(state: &AppState) -> Result<&Arc<OperatorState>, ObserverError> {
    state
        .operator_state
        .as_ref()
        .ok_or_else(|| ObserverError::Unavailable("operator state not available".to_owned()))
}

// ---------------------------------------------------------------------------
// POST /api/operator/pause
// ---------------------------------------------------------------------------

/// Pause the frame loop. Round time stops advancing while paused.
pub async fn pause(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.pause();

    Ok(Json(OperatorResponse {
        ok: true,
        message: "Simulation paused".to_owned(),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/operator/resume
// ---------------------------------------------------------------------------

/// Resume the frame loop after a pause.
pub async fn resume(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.resume();

    Ok(Json(OperatorResponse {
        ok: true,
        message: "Simulation resumed".to_owned(),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/operator/speed
// ---------------------------------------------------------------------------

/// Change the frame interval at runtime. Takes effect on the next sleep.
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetSpeedRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let operator = operator(&state)?;

    let prev = operator
        .set_frame_interval_ms(body.frame_interval_ms)
        .ok_or_else(|| {
            ObserverError::InvalidRequest(format!(
                "frame_interval_ms must be at least {MIN_FRAME_INTERVAL_MS}"
            ))
        })?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "message": format!("Frame interval changed from {}ms to {}ms", prev, body.frame_interval_ms),
        "previous_interval_ms": prev,
        "new_interval_ms": body.frame_interval_ms,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/operator/status
// ---------------------------------------------------------------------------

/// Return the current run status: round, tick, pause state, speed and
/// bounds.
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let operator = operator(&state)?;

    let (round, tick, cycles_alive) = {
        let snapshot = state.snapshot.read().await;
        snapshot.simulation.as_ref().map_or((0, 0, 0), |s| {
            (
                s.round,
                s.tick,
                u64::try_from(s.alive_count()).unwrap_or(u64::MAX),
            )
        })
    };

    let status = SimulationStatus {
        round,
        tick,
        paused: operator.is_paused(),
        stop_requested: operator.is_stop_requested(),
        frame_interval_ms: operator.frame_interval_ms(),
        rounds_completed: operator.rounds_completed(),
        max_rounds: operator.max_rounds(),
        cycles_alive,
        elapsed_seconds: operator.elapsed_seconds(),
        end_reason: operator.end_reason().await,
        started_at: operator.started_at().to_rfc3339(),
    };

    Ok(Json(status))
}

// ---------------------------------------------------------------------------
// POST /api/operator/stop
// ---------------------------------------------------------------------------

/// Trigger a clean stop. The frame loop exits before its next frame; the
/// HTTP server keeps serving the final snapshot.
pub async fn stop(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.request_stop();

    Ok(Json(OperatorResponse {
        ok: true,
        message: "Stop requested -- simulation will end before the next frame".to_owned(),
    }))
}
