//! REST API endpoint handlers for the Observer server.
//!
//! All handlers read from the in-memory [`ObserverSnapshot`] via the
//! shared [`AppState`]; none of them touch simulation state.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/snapshot` | Latest full simulation snapshot |
//! | `GET` | `/api/cycles` | List cycles (`?status=alive\|dead\|all`) |
//! | `GET` | `/api/cycles/{id}` | Single cycle |
//! | `GET` | `/api/trail` | Trail grid rows |
//! | `GET` | `/api/collisions` | Recent collisions, newest first |
//!
//! [`ObserverSnapshot`]: crate::state::ObserverSnapshot

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use lightgrid_types::{AgentId, GRID_HEIGHT, GRID_WIDTH, SimulationSnapshot};

use crate::error::ObserverError;
use crate::state::{AppState, MAX_COLLISIONS};

/// Collisions returned when no `limit` is given.
const DEFAULT_COLLISION_LIMIT: usize = 50;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/cycles` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct CyclesQuery {
    /// Filter by alive/dead/all status. Accepted values: `alive`, `dead`, `all`.
    pub status: Option<String>,
}

/// Query parameters for the `GET /api/collisions` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct CollisionsQuery {
    /// Only collisions from this round.
    pub round: Option<u64>,
    /// Maximum number of records to return (default 50).
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the current round and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    let frames = snapshot.frames;
    let (round, phase, score, tick, alive) = snapshot.simulation.as_ref().map_or_else(
        || (0, String::from("WAITING"), 0, 0, 0),
        |s| {
            (
                s.round,
                format!("{:?}", s.phase).to_uppercase(),
                s.score,
                s.tick,
                s.alive_count(),
            )
        },
    );
    let collisions = snapshot.collisions.len();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Lightgrid Observer</title>
    <style>
        body {{
            background: #05070d;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #00f0ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #0d1117;
            border: 1px solid #1f6feb;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #00f0ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #ff2bd6; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        li::before {{ content: "GET "; color: #39ff14; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Lightgrid Observer</h1>
    <p class="subtitle">Light-cycle arena monitor</p>

    <div>
        <div class="metric">
            <div class="label">Round</div>
            <div class="value">{round}</div>
        </div>
        <div class="metric">
            <div class="label">Phase</div>
            <div class="value">{phase}</div>
        </div>
        <div class="metric">
            <div class="label">Score</div>
            <div class="value">{score}</div>
        </div>
        <div class="metric">
            <div class="label">Tick</div>
            <div class="value">{tick}</div>
        </div>
        <div class="metric">
            <div class="label">Alive</div>
            <div class="value">{alive}</div>
        </div>
        <div class="metric">
            <div class="label">Collisions</div>
            <div class="value">{collisions}</div>
        </div>
        <div class="metric">
            <div class="label">Frames</div>
            <div class="value">{frames}</div>
        </div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/snapshot">/api/snapshot</a> -- Full simulation snapshot</li>
        <li><a href="/api/cycles">/api/cycles</a> -- List cycles (?status=alive)</li>
        <li><a href="/api/cycles/1">/api/cycles/:id</a> -- Single cycle</li>
        <li><a href="/api/trail">/api/trail</a> -- Trail grid</li>
        <li><a href="/api/collisions">/api/collisions</a> -- Recent collisions (?round=N&amp;limit=N)</li>
        <li><a href="/api/operator/status">/api/operator/status</a> -- Operator status</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li style="list-style:none;"><code>ws://host:port/ws/frames</code> -- Live frame stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/snapshot
// ---------------------------------------------------------------------------

/// Return the latest full simulation snapshot.
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SimulationSnapshot>, ObserverError> {
    let snapshot = state.snapshot.read().await;
    snapshot
        .simulation
        .clone()
        .map(Json)
        .ok_or_else(no_frame_yet)
}

// ---------------------------------------------------------------------------
// GET /api/cycles
// ---------------------------------------------------------------------------

/// List the cycles of the current round.
///
/// # Query Parameters
///
/// - `status`: `alive` | `dead` | `all` (default: `all`)
pub async fn list_cycles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CyclesQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let snapshot = state.snapshot.read().await;
    let sim = snapshot.simulation.as_ref().ok_or_else(no_frame_yet)?;

    let filter = params.status.as_deref().unwrap_or("all");
    let cycles: Vec<_> = sim
        .cycles
        .iter()
        .filter(|c| match filter {
            "alive" => c.alive,
            "dead" => !c.alive,
            _ => true,
        })
        .collect();

    Ok(Json(serde_json::json!({
        "round": sim.round,
        "count": cycles.len(),
        "cycles": cycles,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/cycles/{id}
// ---------------------------------------------------------------------------

/// Return a single cycle by its numeric id.
pub async fn get_cycle(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let id = parse_agent_id(&id_str)?;
    let snapshot = state.snapshot.read().await;
    let sim = snapshot.simulation.as_ref().ok_or_else(no_frame_yet)?;

    let cycle = sim
        .cycles
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| ObserverError::NotFound(id.to_string()))?;

    Ok(Json(serde_json::json!({
        "round": sim.round,
        "cycle": cycle,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/trail
// ---------------------------------------------------------------------------

/// Return the trail grid. `0` is an empty cell, any other value the id of
/// the cycle that owns it.
pub async fn get_trail(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let snapshot = state.snapshot.read().await;
    let sim = snapshot.simulation.as_ref().ok_or_else(no_frame_yet)?;

    let cells_written = sim.trail.iter().flatten().filter(|&&v| v != 0).count();

    Ok(Json(serde_json::json!({
        "round": sim.round,
        "width": GRID_WIDTH,
        "height": GRID_HEIGHT,
        "cells_written": cells_written,
        "rows": sim.trail,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/collisions
// ---------------------------------------------------------------------------

/// Return recent collisions, newest first.
///
/// # Query Parameters
///
/// - `round`: only this round
/// - `limit`: maximum records (default 50, capped at the retained history)
pub async fn list_collisions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CollisionsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_COLLISION_LIMIT)
        .min(MAX_COLLISIONS);

    let snapshot = state.snapshot.read().await;
    let collisions: Vec<_> = snapshot
        .collisions
        .iter()
        .rev()
        .filter(|c| params.round.is_none_or(|r| c.round == r))
        .take(limit)
        .collect();

    Ok(Json(serde_json::json!({
        "count": collisions.len(),
        "collisions": collisions,
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a cycle id from a path segment.
fn parse_agent_id(s: &str) -> Result<AgentId, ObserverError> {
    s.parse::<u8>()
        .ok()
        .and_then(AgentId::new)
        .ok_or_else(|| ObserverError::InvalidRequest(format!("invalid cycle id: {s}")))
}

fn no_frame_yet() -> ObserverError {
    ObserverError::Unavailable("no frame published yet".to_owned())
}
