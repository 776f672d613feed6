//! Frame loop runner with operator controls.
//!
//! [`run_simulation`] drives [`advance_frame`] on a fixed frame interval
//! with support for:
//!
//! - **Bounded runs**: stop after `max_rounds` rounds have ended
//! - **Pause/resume**: the loop sleeps until resumed; paused time does not
//!   count towards round time
//! - **Variable frame speed**: frame interval adjustable at runtime
//! - **Operator stop**: clean stop via the observer API
//!
//! Timestamps handed to the simulation are milliseconds since the loop
//! started, so the state should be created with `now_ms = 0` right before
//! the call.

use std::sync::Arc;

use lightgrid_types::SimulationSnapshot;
use rand::RngCore;
use tokio::time::{Duration, Instant};
use tracing::{info, warn};

use crate::decision::SteeringPolicy;
use crate::operator::{OperatorState, SimulationEndReason};
use crate::tick::{FrameOutcome, SimulationState, advance_frame};

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// Rounds that reached the end of play.
    pub rounds_completed: u64,
    /// Ticks applied across all rounds.
    pub total_ticks: u64,
    /// Frames processed.
    pub total_frames: u64,
    /// State at the moment the loop stopped.
    pub final_snapshot: SimulationSnapshot,
}

/// Callback invoked after each frame.
///
/// Implementations use this to publish snapshots and collision events to
/// the observer.
pub trait FrameCallback: Send {
    /// Called after every frame, whether or not a tick ran.
    fn on_frame(&mut self, outcome: &FrameOutcome, state: &SimulationState);
}

/// A no-op frame callback for testing.
pub struct NoOpCallback;

impl FrameCallback for NoOpCallback {
    fn on_frame(&mut self, _outcome: &FrameOutcome, _state: &SimulationState) {}
}

/// Monotonic millisecond source that excludes paused time.
struct LoopClock {
    epoch: Instant,
    paused: Duration,
}

impl LoopClock {
    fn start() -> Self {
        Self {
            epoch: Instant::now(),
            paused: Duration::ZERO,
        }
    }

    fn add_pause(&mut self, pause: Duration) {
        self.paused = self.paused.saturating_add(pause);
    }

    fn now_ms(&self) -> u64 {
        let running = self.epoch.elapsed().saturating_sub(self.paused);
        u64::try_from(running.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Run the frame loop until a termination condition is met.
///
/// # Arguments
///
/// * `state` - Owned simulation context
/// * `policy` - Steering policy for every cycle
/// * `rng` - Random source for spawns and steering draws
/// * `operator` - Shared operator control state
/// * `callback` - Called after each frame for observer updates
pub async fn run_simulation<R: RngCore>(
    state: &mut SimulationState,
    policy: &dyn SteeringPolicy,
    rng: &mut R,
    operator: &Arc<OperatorState>,
    callback: &mut dyn FrameCallback,
) -> SimulationResult {
    let mut clock = LoopClock::start();
    let mut total_ticks: u64 = 0;
    let mut total_frames: u64 = 0;

    info!(
        max_rounds = operator.max_rounds(),
        frame_interval_ms = operator.frame_interval_ms(),
        "Simulation starting"
    );

    let end_reason = loop {
        // --- Pause ---
        if operator.is_paused() {
            info!("Simulation paused, waiting for resume...");
            let paused_at = Instant::now();
            operator.wait_if_paused().await;
            clock.add_pause(paused_at.elapsed());
            info!("Simulation resumed");
        }

        // --- Stop request ---
        if operator.is_stop_requested() {
            info!("Operator stop requested");
            break SimulationEndReason::OperatorStop;
        }

        // --- Frame ---
        let outcome = advance_frame(state, policy, &mut *rng, clock.now_ms());
        total_frames = total_frames.saturating_add(1);
        if outcome.tick.is_some() {
            total_ticks = total_ticks.saturating_add(1);
        }

        callback.on_frame(&outcome, state);

        // --- Round limit ---
        if outcome.round_ended() {
            let completed = operator.record_round_completed();
            if operator.round_limit_reached() {
                info!(
                    rounds_completed = completed,
                    max_rounds = operator.max_rounds(),
                    "Round limit reached"
                );
                break SimulationEndReason::MaxRoundsReached;
            }
        }

        // --- Sleep until the next frame ---
        let interval_ms = operator.frame_interval_ms();
        tokio::time::sleep(Duration::from_millis(interval_ms)).await;
    };

    operator.set_end_reason(end_reason).await;

    SimulationResult {
        end_reason,
        rounds_completed: operator.rounds_completed(),
        total_ticks,
        total_frames,
        final_snapshot: state.snapshot(),
    }
}

/// Log the simulation end sequence.
///
/// Called after [`run_simulation`] returns. The observer keeps serving
/// the final snapshot afterwards.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        rounds_completed = result.rounds_completed,
        total_ticks = result.total_ticks,
        total_frames = result.total_frames,
        "Simulation ended"
    );

    if result.total_ticks == 0 {
        warn!("Simulation ended with no ticks executed");
    } else {
        let snap = &result.final_snapshot;
        info!(
            round = snap.round,
            tick = snap.tick,
            phase = ?snap.phase,
            score = snap.score,
            alive = snap.alive_count(),
            "Final frame"
        );
    }
}
