//! Frame callback that feeds the Observer API.
//!
//! After every frame that changed the simulation, this callback pushes a
//! [`FrameBroadcast`] to connected `WebSocket` clients and folds it into
//! the shared [`ObserverSnapshot`](lightgrid_observer::ObserverSnapshot).
//!
//! The snapshot lock is only ever tried, never awaited. Frames that find it
//! held by a REST reader stay pending and are folded in on a later frame,
//! idle ones included, so a round's final phase and collisions are not lost.

use std::sync::Arc;

use lightgrid_core::runner::FrameCallback;
use lightgrid_core::tick::{FrameOutcome, SimulationState};
use lightgrid_observer::state::MAX_COLLISIONS;
use lightgrid_observer::{AppState, CollisionRecord, FrameBroadcast};
use tracing::debug;

/// Callback that bridges the frame loop to the Observer API.
pub struct ObserverCallback {
    state: Arc<AppState>,
    /// Latest frame not yet folded into the snapshot.
    pending: Option<FrameBroadcast>,
    pending_collisions: Vec<CollisionRecord>,
    pending_frames: u64,
    skipped: u64,
}

impl ObserverCallback {
    /// Create a new observer callback backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            pending: None,
            pending_collisions: Vec::new(),
            pending_frames: 0,
            skipped: 0,
        }
    }

    /// Attempts to update the snapshot that found the lock busy.
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Whether frames are waiting to be folded into the snapshot.
    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn buffer(&mut self, frame: FrameBroadcast) {
        self.pending_collisions.extend(CollisionRecord::from_frame(&frame));
        if self.pending_collisions.len() > MAX_COLLISIONS {
            let excess = self.pending_collisions.len().saturating_sub(MAX_COLLISIONS);
            let _ = self.pending_collisions.drain(..excess);
        }
        self.pending_frames = self.pending_frames.saturating_add(1);
        self.pending = Some(frame);
    }

    fn flush(&mut self) {
        if self.pending.is_none() {
            return;
        }
        let Ok(mut snap) = self.state.snapshot.try_write() else {
            self.skipped = self.skipped.saturating_add(1);
            debug!(
                pending_frames = self.pending_frames,
                "Snapshot busy, update deferred"
            );
            return;
        };
        if let Some(frame) = self.pending.take() {
            snap.apply(
                frame.snapshot,
                self.pending_collisions.drain(..),
                self.pending_frames,
            );
        }
        self.pending_frames = 0;
    }
}

impl FrameCallback for ObserverCallback {
    fn on_frame(&mut self, outcome: &FrameOutcome, sim: &SimulationState) {
        // Idle frames between ticks carry nothing new, but may still owe
        // the snapshot a deferred update.
        if outcome.tick.is_some() || outcome.round_restarted {
            let frame = FrameBroadcast {
                snapshot: sim.snapshot(),
                collisions: outcome.collisions().to_vec(),
                round_ended: outcome.round_ended(),
                round_restarted: outcome.round_restarted,
            };

            let receivers = self.state.broadcast(&frame);
            debug!(
                round = frame.snapshot.round,
                tick = frame.snapshot.tick,
                receivers,
                "Frame broadcast sent"
            );
            self.buffer(frame);
        }

        self.flush();
    }
}
