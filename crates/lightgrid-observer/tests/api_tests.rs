//! Integration tests for the Observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, missing_docs)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use lightgrid_core::config::SimulationBoundsConfig;
use lightgrid_core::operator::OperatorState;
use lightgrid_observer::router::build_router;
use lightgrid_observer::state::{
    AppState, CollisionRecord, FrameBroadcast, MAX_COLLISIONS, ObserverSnapshot,
};
use lightgrid_observer::ws::catch_up_frame;
use lightgrid_types::{
    AgentId, CollisionEvent, CycleView, GRID_HEIGHT, GRID_WIDTH, Heading, Position, RoundId,
    RoundPhase, SimulationSnapshot,
};
use serde_json::Value;
use tower::ServiceExt;

fn cycle(id: u8, x: i32, y: i32, alive: bool) -> CycleView {
    CycleView {
        id: AgentId::new(id).unwrap(),
        position: Position::new(x, y),
        heading: Heading::Right,
        color: String::from("#00f0ff"),
        alive,
    }
}

fn make_snapshot(round: u64, tick: u64) -> SimulationSnapshot {
    let mut trail = vec![vec![0_u8; GRID_WIDTH]; GRID_HEIGHT];
    trail[1][5] = 1;
    trail[1][6] = 1;
    trail[5][40] = 2;

    SimulationSnapshot {
        round_id: RoundId::new(),
        round,
        round_started_at: Utc::now(),
        phase: RoundPhase::Playing,
        score: 27,
        elapsed_ms: 1_200,
        tick_interval_ms: 150,
        tick,
        cycles: vec![
            cycle(1, 7, 1, true),
            cycle(2, 39, 5, false),
            cycle(3, 10, 5, true),
            cycle(4, 44, 1, true),
        ],
        trail,
    }
}

fn crash(id: u8, x: i32, y: i32) -> CollisionEvent {
    CollisionEvent {
        agent_id: AgentId::new(id).unwrap(),
        position: Position::new(x, y),
    }
}

fn frame(round: u64, tick: u64, collisions: Vec<CollisionEvent>) -> FrameBroadcast {
    FrameBroadcast {
        snapshot: make_snapshot(round, tick),
        collisions,
        round_ended: false,
        round_restarted: false,
    }
}

/// State with one recorded frame holding one collision.
async fn make_test_state() -> Arc<AppState> {
    let state = Arc::new(AppState::new());
    state
        .snapshot
        .write()
        .await
        .record(&frame(1, 8, vec![crash(2, 39, 5)]));
    state
}

fn make_operator_state() -> (Arc<AppState>, Arc<OperatorState>) {
    let operator = Arc::new(OperatorState::new(
        16,
        &SimulationBoundsConfig { max_rounds: 5 },
    ));
    (
        Arc::new(AppState::with_operator(Arc::clone(&operator))),
        operator,
    )
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let response = build_router(state)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn post(state: Arc<AppState>, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(json) => Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::post(uri).body(Body::empty()).unwrap(),
    };
    let response = build_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// =========================================================================
// Read-only endpoints
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let state = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_snapshot_before_first_frame_is_unavailable() {
    let (status, json) = get(Arc::new(AppState::new()), "/api/snapshot").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], 503);
}

#[tokio::test]
async fn test_get_snapshot() {
    let (status, json) = get(make_test_state().await, "/api/snapshot").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["round"], 1);
    assert_eq!(json["tick"], 8);
    assert_eq!(json["phase"], "PLAYING");
    assert_eq!(json["cycles"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_list_cycles() {
    let (status, json) = get(make_test_state().await, "/api/cycles").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 4);
    assert_eq!(json["cycles"][0]["heading"], "RIGHT");
}

#[tokio::test]
async fn test_list_cycles_filter_alive() {
    let (status, json) = get(make_test_state().await, "/api/cycles?status=alive").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);
}

#[tokio::test]
async fn test_list_cycles_filter_dead() {
    let (_, json) = get(make_test_state().await, "/api/cycles?status=dead").await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["cycles"][0]["id"], 2);
}

#[tokio::test]
async fn test_get_cycle_by_id() {
    let (status, json) = get(make_test_state().await, "/api/cycles/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cycle"]["position"]["x"], 10);
    assert_eq!(json["cycle"]["position"]["y"], 5);
}

#[tokio::test]
async fn test_get_cycle_not_found() {
    let (status, _) = get(make_test_state().await, "/api/cycles/9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_cycle_invalid_id() {
    for bad in ["0", "abc", "300"] {
        let (status, _) = get(make_test_state().await, &format!("/api/cycles/{bad}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "id {bad}");
    }
}

#[tokio::test]
async fn test_get_trail() {
    let (status, json) = get(make_test_state().await, "/api/trail").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["width"], GRID_WIDTH);
    assert_eq!(json["height"], GRID_HEIGHT);
    assert_eq!(json["cells_written"], 3);
    assert_eq!(json["rows"][5][40], 2);
}

#[tokio::test]
async fn test_list_collisions() {
    let (status, json) = get(make_test_state().await, "/api/collisions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["collisions"][0]["agent_id"], 2);
    assert_eq!(json["collisions"][0]["round"], 1);
    assert_eq!(json["collisions"][0]["tick"], 8);
}

#[tokio::test]
async fn test_list_collisions_newest_first_with_filters() {
    let state = make_test_state().await;
    {
        let mut snapshot = state.snapshot.write().await;
        snapshot.record(&frame(1, 9, vec![crash(1, 8, 1), crash(3, 11, 5)]));
        snapshot.record(&frame(2, 4, vec![crash(4, 45, 1)]));
    }

    let (_, json) = get(Arc::clone(&state), "/api/collisions?limit=2").await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["collisions"][0]["round"], 2);
    assert_eq!(json["collisions"][1]["agent_id"], 3);

    let (_, json) = get(state, "/api/collisions?round=1").await;
    assert_eq!(json["count"], 3);
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let state = make_test_state().await;
    let response = build_router(state)
        .oneshot(
            Request::get("/api/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =========================================================================
// Snapshot bookkeeping and broadcast
// =========================================================================

#[test]
fn test_collision_history_is_capped() {
    let mut snapshot = ObserverSnapshot::default();
    for tick in 0..300 {
        snapshot.record(&frame(1, tick, vec![crash(1, 0, 0)]));
    }
    assert_eq!(snapshot.collisions.len(), MAX_COLLISIONS);
    assert_eq!(snapshot.frames, 300);
    // Oldest entries were dropped.
    assert_eq!(snapshot.collisions.front().unwrap().tick, 100);
}

#[test]
fn test_apply_keeps_each_collision_tagged_with_its_own_tick() {
    let mut snapshot = ObserverSnapshot::default();
    let early = frame(2, 5, vec![crash(1, 3, 0)]);
    let late = frame(2, 9, vec![crash(3, 12, 6), crash(4, 51, 2)]);
    let deferred: Vec<_> = CollisionRecord::from_frame(&early)
        .chain(CollisionRecord::from_frame(&late))
        .collect();

    snapshot.apply(late.snapshot.clone(), deferred, 2);

    assert_eq!(snapshot.frames, 2);
    assert_eq!(snapshot.simulation.as_ref().unwrap().tick, 9);
    let ticks: Vec<_> = snapshot.collisions.iter().map(|c| c.tick).collect();
    assert_eq!(ticks, vec![5, 9, 9]);
}

#[tokio::test]
async fn test_catch_up_frame_mirrors_latest_snapshot() {
    assert!(catch_up_frame(&ObserverSnapshot::default()).is_none());

    let state = make_test_state().await;
    let guard = state.snapshot.read().await;
    let initial = catch_up_frame(&guard).unwrap();
    assert_eq!(&initial.snapshot, guard.simulation.as_ref().unwrap());
    assert_eq!(initial.snapshot.tick, 8);
    // Collisions were already delivered with their own frame.
    assert!(initial.collisions.is_empty());
    assert!(!initial.round_ended);
    assert!(!initial.round_restarted);
}

#[tokio::test]
async fn test_broadcast_channel() {
    let state = AppState::new();
    assert_eq!(state.broadcast(&frame(1, 1, Vec::new())), 0);

    let mut rx = state.subscribe();
    let sent = frame(3, 12, vec![crash(4, 20, 3)]);
    assert_eq!(state.broadcast(&sent), 1);

    let received = rx.recv().await.unwrap();
    assert_eq!(received, sent);
}

// =========================================================================
// Operator endpoints
// =========================================================================

#[tokio::test]
async fn test_operator_routes_without_operator_are_unavailable() {
    let (status, _) = post(make_test_state().await, "/api/operator/pause", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (status, _) = get(make_test_state().await, "/api/operator/status").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_pause_and_resume() {
    let (state, operator) = make_operator_state();

    let (status, json) = post(Arc::clone(&state), "/api/operator/pause", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert!(operator.is_paused());

    let (status, _) = post(state, "/api/operator/resume", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!operator.is_paused());
}

#[tokio::test]
async fn test_set_speed() {
    let (state, operator) = make_operator_state();
    let (status, json) = post(
        state,
        "/api/operator/speed",
        Some(serde_json::json!({ "frame_interval_ms": 40 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["previous_interval_ms"], 16);
    assert_eq!(json["new_interval_ms"], 40);
    assert_eq!(operator.frame_interval_ms(), 40);
}

#[tokio::test]
async fn test_set_speed_below_minimum_is_rejected() {
    let (state, operator) = make_operator_state();
    let (status, _) = post(
        state,
        "/api/operator/speed",
        Some(serde_json::json!({ "frame_interval_ms": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(operator.frame_interval_ms(), 16);
}

#[tokio::test]
async fn test_status_reflects_latest_frame() {
    let (state, _operator) = make_operator_state();
    state
        .snapshot
        .write()
        .await
        .record(&frame(2, 30, Vec::new()));

    let (status, json) = get(state, "/api/operator/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["round"], 2);
    assert_eq!(json["tick"], 30);
    assert_eq!(json["cycles_alive"], 3);
    assert_eq!(json["max_rounds"], 5);
    assert_eq!(json["paused"], false);
    assert!(json["end_reason"].is_null());
}

#[tokio::test]
async fn test_stop() {
    let (state, operator) = make_operator_state();
    let (status, _) = post(state, "/api/operator/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(operator.is_stop_requested());
}
