//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the broadcast channel for frame updates and the
//! in-memory [`ObserverSnapshot`] that the REST endpoints serve. The engine
//! writes both from its frame callback; handlers only ever read.

use std::collections::VecDeque;
use std::sync::Arc;

use lightgrid_core::operator::OperatorState;
use lightgrid_types::{CollisionEvent, SimulationSnapshot};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};

/// Capacity of the broadcast channel for frame updates.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// Maximum number of collision records kept for `GET /api/collisions`.
pub const MAX_COLLISIONS: usize = 200;

/// JSON message pushed over the `WebSocket` for every frame that changed
/// the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameBroadcast {
    /// Full state after the frame.
    pub snapshot: SimulationSnapshot,
    /// Cycles that stopped during the frame.
    pub collisions: Vec<CollisionEvent>,
    /// Whether the round ended on this frame.
    pub round_ended: bool,
    /// Whether a new round began on this frame.
    pub round_restarted: bool,
}

/// A collision with the round and tick it happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionRecord {
    /// Round number.
    pub round: u64,
    /// Tick within the round.
    pub tick: u64,
    /// The collision itself.
    #[serde(flatten)]
    pub event: CollisionEvent,
}

/// In-memory state served by the REST endpoints.
#[derive(Debug, Clone, Default)]
pub struct ObserverSnapshot {
    /// Latest simulation snapshot, `None` until the first frame lands.
    pub simulation: Option<SimulationSnapshot>,
    /// Recent collisions, oldest first, capped at [`MAX_COLLISIONS`].
    pub collisions: VecDeque<CollisionRecord>,
    /// Frames recorded since startup.
    pub frames: u64,
}

impl ObserverSnapshot {
    /// Fold one frame into the snapshot.
    pub fn record(&mut self, frame: &FrameBroadcast) {
        let records = CollisionRecord::from_frame(frame);
        self.apply(frame.snapshot.clone(), records, 1);
    }

    /// Replace the simulation state and append collisions that were
    /// raised by `frames` frames, possibly older than `simulation`.
    pub fn apply(
        &mut self,
        simulation: SimulationSnapshot,
        collisions: impl IntoIterator<Item = CollisionRecord>,
        frames: u64,
    ) {
        for record in collisions {
            if self.collisions.len() >= MAX_COLLISIONS {
                let _ = self.collisions.pop_front();
            }
            self.collisions.push_back(record);
        }
        self.simulation = Some(simulation);
        self.frames = self.frames.saturating_add(frames);
    }
}

impl CollisionRecord {
    /// Tag every collision of `frame` with the frame's round and tick.
    pub fn from_frame(frame: &FrameBroadcast) -> impl Iterator<Item = Self> + '_ {
        frame.collisions.iter().map(|event| Self {
            round: frame.snapshot.round,
            tick: frame.snapshot.tick,
            event: *event,
        })
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for frame messages.
    pub tx: broadcast::Sender<FrameBroadcast>,
    /// The current observer snapshot (updated each frame).
    pub snapshot: Arc<RwLock<ObserverSnapshot>>,
    /// Shared operator control state (present when the simulation is running).
    pub operator_state: Option<Arc<OperatorState>>,
}

impl AppState {
    /// Create a new application state with an empty snapshot.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            snapshot: Arc::new(RwLock::new(ObserverSnapshot::default())),
            operator_state: None,
        }
    }

    /// Create a new application state with operator control state attached.
    pub fn with_operator(operator: Arc<OperatorState>) -> Self {
        Self {
            operator_state: Some(operator),
            ..Self::new()
        }
    }

    /// Subscribe to the frame broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<FrameBroadcast> {
        self.tx.subscribe()
    }

    /// Publish a frame to all connected clients.
    ///
    /// Returns the number of receivers that got the message; 0 when no
    /// client is connected.
    pub fn broadcast(&self, frame: &FrameBroadcast) -> usize {
        self.tx.send(frame.clone()).unwrap_or(0)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
