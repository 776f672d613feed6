//! Operator control state for runtime simulation management.
//!
//! Shared between the frame loop and the observer's operator endpoints.
//! The operator can pause and resume the loop, change the frame interval,
//! and request a clean stop without restarting the process.
//!
//! Control flags are atomics so the frame loop reads them without taking a
//! lock; only the end reason sits behind a mutex.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::SimulationBoundsConfig;

/// Smallest frame interval the operator may set.
pub const MIN_FRAME_INTERVAL_MS: u64 = 10;

/// Reason why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationEndReason {
    /// Reached the configured `max_rounds` limit.
    MaxRoundsReached,
    /// An operator issued a stop command.
    OperatorStop,
}

/// Shared operator control state.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether the frame loop is paused.
    paused: AtomicBool,

    /// Wakes the frame loop on resume.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Sleep between frames (runtime-adjustable).
    frame_interval_ms: AtomicU64,

    /// Rounds completed so far.
    rounds_completed: AtomicU64,

    /// Wall-clock time the run started.
    started_at: DateTime<Utc>,

    /// Maximum completed rounds (0 = unlimited).
    max_rounds: u64,

    /// Reason the simulation ended, if it has.
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Create operator state for a run.
    pub fn new(frame_interval_ms: u64, bounds: &SimulationBoundsConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            frame_interval_ms: AtomicU64::new(frame_interval_ms.max(MIN_FRAME_INTERVAL_MS)),
            rounds_completed: AtomicU64::new(0),
            started_at: Utc::now(),
            max_rounds: bounds.max_rounds,
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the simulation is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the frame loop.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the frame loop and wake it.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the simulation is no longer paused. Returns immediately
    /// if not paused.
    pub async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::Acquire) {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean simulation stop. Also wakes a paused loop so it can
    /// observe the request.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record the reason the simulation ended.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// The reason the simulation ended, if it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        *self.end_reason.lock().await
    }

    // -----------------------------------------------------------------------
    // Frame speed
    // -----------------------------------------------------------------------

    /// Current frame interval in milliseconds.
    pub fn frame_interval_ms(&self) -> u64 {
        self.frame_interval_ms.load(Ordering::Acquire)
    }

    /// Set the frame interval. Returns the previous value, or `None` if
    /// `ms` is below [`MIN_FRAME_INTERVAL_MS`].
    pub fn set_frame_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_FRAME_INTERVAL_MS {
            return None;
        }
        Some(self.frame_interval_ms.swap(ms, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Count a finished round. Returns the new total.
    pub fn record_round_completed(&self) -> u64 {
        self.rounds_completed
            .fetch_add(1, Ordering::AcqRel)
            .saturating_add(1)
    }

    /// Rounds finished so far.
    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed.load(Ordering::Acquire)
    }

    /// Whether `max_rounds > 0` and at least that many rounds finished.
    pub fn round_limit_reached(&self) -> bool {
        self.max_rounds > 0 && self.rounds_completed() >= self.max_rounds
    }

    /// Configured maximum rounds (0 = unlimited).
    pub const fn max_rounds(&self) -> u64 {
        self.max_rounds
    }

    /// Wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Seconds since the run started.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}

/// JSON-serializable operator view of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStatus {
    /// Current round number.
    pub round: u64,
    /// Tick within the current round.
    pub tick: u64,
    /// Whether the frame loop is paused.
    pub paused: bool,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Current frame interval in milliseconds.
    pub frame_interval_ms: u64,
    /// Rounds finished so far.
    pub rounds_completed: u64,
    /// Configured maximum rounds (0 = unlimited).
    pub max_rounds: u64,
    /// Cycles currently alive.
    pub cycles_alive: u64,
    /// Seconds since the run started.
    pub elapsed_seconds: u64,
    /// The reason the simulation ended, if applicable.
    pub end_reason: Option<SimulationEndReason>,
    /// RFC 3339 timestamp of when the run started.
    pub started_at: String,
}
