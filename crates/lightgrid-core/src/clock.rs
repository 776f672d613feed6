//! Simulation clock: tick gating and the speed ramp.
//!
//! The clock never reads wall-clock time itself. The driver passes a
//! monotonic millisecond timestamp into every call, which keeps the clock
//! deterministic under test.
//!
//! # Speed ramp
//!
//! The tick interval starts at `initial_interval_ms` and shrinks by
//! `speed_step_ms` for every full `speed_step_every_ms` of round time,
//! never dropping below `min_interval_ms`.

use crate::config::ClockConfig;

/// Errors that can occur when constructing a clock.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Invalid timing configuration (e.g. zero speed-step period).
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Round-scoped tick clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationClock {
    config: ClockConfig,
    /// Timestamp the current round started.
    round_started_ms: u64,
    /// Timestamp of the last applied tick (or round start).
    last_tick_ms: u64,
    /// Ticks applied in the current round.
    ticks: u64,
}

impl SimulationClock {
    /// Create a clock whose first round starts at `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the speed-step period or
    /// the minimum interval is zero, or the minimum exceeds the initial
    /// interval.
    pub fn new(config: ClockConfig, now_ms: u64) -> Result<Self, ClockError> {
        if config.speed_step_every_ms == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "speed_step_every_ms must be at least 1".to_owned(),
            });
        }
        if config.min_interval_ms == 0 || config.min_interval_ms > config.initial_interval_ms {
            return Err(ClockError::InvalidConfig {
                reason: format!(
                    "min_interval_ms ({}) must be in 1..={}",
                    config.min_interval_ms, config.initial_interval_ms
                ),
            });
        }
        Ok(Self {
            config,
            round_started_ms: now_ms,
            last_tick_ms: now_ms,
            ticks: 0,
        })
    }

    /// Milliseconds since the round started.
    pub const fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.round_started_ms)
    }

    /// Tick interval for a round that has been running `elapsed_ms`.
    pub fn interval_for_elapsed(&self, elapsed_ms: u64) -> u64 {
        let steps = elapsed_ms
            .checked_div(self.config.speed_step_every_ms)
            .unwrap_or(0);
        let reduction = steps.saturating_mul(self.config.speed_step_ms);
        self.config
            .initial_interval_ms
            .saturating_sub(reduction)
            .max(self.config.min_interval_ms)
    }

    /// Current tick interval at `now_ms`.
    pub fn interval_ms(&self, now_ms: u64) -> u64 {
        self.interval_for_elapsed(self.elapsed_ms(now_ms))
    }

    /// Whether enough time has passed since the last tick to apply another.
    pub fn tick_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_tick_ms) >= self.interval_ms(now_ms)
    }

    /// Record that a tick was applied at `now_ms`. Returns the new tick count.
    pub const fn record_tick(&mut self, now_ms: u64) -> u64 {
        self.last_tick_ms = now_ms;
        self.ticks = self.ticks.saturating_add(1);
        self.ticks
    }

    /// Ticks applied in the current round.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Timestamp the current round started.
    pub const fn round_started_ms(&self) -> u64 {
        self.round_started_ms
    }

    /// Whether the restart delay has passed since `ended_ms`.
    pub const fn restart_due(&self, ended_ms: u64, now_ms: u64) -> bool {
        now_ms.saturating_sub(ended_ms) >= self.config.restart_delay_ms
    }

    /// Restart the clock for a new round beginning at `now_ms`.
    pub const fn reset(&mut self, now_ms: u64) {
        self.round_started_ms = now_ms;
        self.last_tick_ms = now_ms;
        self.ticks = 0;
    }

    /// The timing configuration.
    pub const fn config(&self) -> &ClockConfig {
        &self.config
    }
}
