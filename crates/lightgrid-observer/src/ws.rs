//! `WebSocket` stream of simulation frames.
//!
//! `GET /ws/frames` upgrades to a socket that first receives a catch-up
//! frame built from the latest recorded snapshot, then one JSON
//! [`FrameBroadcast`] per frame that changed the simulation. A renderer that
//! connects mid-round can draw the arena immediately instead of waiting
//! for the next tick.
//!
//! Every client reads the same broadcast channel. A client that falls
//! behind loses the oldest frames; the engine never waits on it.

use std::ops::ControlFlow;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::{AppState, FrameBroadcast, ObserverSnapshot};

/// Upgrade to a `WebSocket` and stream frames.
///
/// # Route
///
/// `GET /ws/frames`
pub async fn ws_frames(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_frames(socket, state))
}

/// The frame a freshly connected client starts from, if any frame has been
/// recorded yet. It carries no collisions and no round transition.
pub fn catch_up_frame(snapshot: &ObserverSnapshot) -> Option<FrameBroadcast> {
    snapshot.simulation.clone().map(|snapshot| FrameBroadcast {
        snapshot,
        collisions: Vec::new(),
        round_ended: false,
        round_restarted: false,
    })
}

async fn stream_frames(mut socket: WebSocket, state: Arc<AppState>) {
    // Subscribe before reading the snapshot so nothing falls in between.
    let mut rx = state.subscribe();
    let initial = catch_up_frame(&*state.snapshot.read().await);
    debug!(catch_up = initial.is_some(), "WebSocket client connected");

    let mut sent: u64 = 0;
    let mut lagged: u64 = 0;

    if let Some(frame) = initial {
        if send_frame(&mut socket, &frame).await.is_break() {
            return;
        }
        sent = sent.saturating_add(1);
    }

    loop {
        let flow = tokio::select! {
            received = rx.recv() => match received {
                Ok(frame) => {
                    let flow = send_frame(&mut socket, &frame).await;
                    if flow.is_continue() {
                        sent = sent.saturating_add(1);
                    }
                    flow
                }
                Err(RecvError::Lagged(n)) => {
                    lagged = lagged.saturating_add(n);
                    debug!(skipped = n, "WebSocket client lagged behind the frame stream");
                    ControlFlow::Continue(())
                }
                Err(RecvError::Closed) => ControlFlow::Break(()),
            },
            incoming = socket.recv() => handle_client_message(&mut socket, incoming).await,
        };
        if flow.is_break() {
            break;
        }
    }

    debug!(sent, lagged, "WebSocket client disconnected");
}

/// Serialize and send one frame. Breaks when the client is gone.
async fn send_frame(socket: &mut WebSocket, frame: &FrameBroadcast) -> ControlFlow<()> {
    let json = match serde_json::to_string(frame) {
        Ok(json) => json,
        Err(e) => {
            warn!(
                round = frame.snapshot.round,
                tick = frame.snapshot.tick,
                "Failed to serialize frame: {e}"
            );
            return ControlFlow::Continue(());
        }
    };
    if socket.send(Message::Text(json.into())).await.is_err() {
        return ControlFlow::Break(());
    }
    ControlFlow::Continue(())
}

/// React to something the client sent. The stream is one-way, so only
/// pings and closes matter.
async fn handle_client_message(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, axum::Error>>,
) -> ControlFlow<()> {
    match incoming {
        Some(Ok(Message::Ping(data))) => {
            if socket.send(Message::Pong(data)).await.is_err() {
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        }
        Some(Ok(Message::Close(_))) | None => ControlFlow::Break(()),
        Some(Err(e)) => {
            debug!("WebSocket receive error: {e}");
            ControlFlow::Break(())
        }
        Some(Ok(_)) => ControlFlow::Continue(()),
    }
}
