//! Round bookkeeping and the score formula.
//!
//! A [`Round`] holds the lifecycle state and the derived numbers the
//! renderer shows (score, elapsed time). It never owns grid or cycle state;
//! the transitions that touch those live in [`crate::tick`].

use chrono::{DateTime, Utc};
use lightgrid_types::{RoundId, RoundPhase};

/// Points per full second survived.
pub const POINTS_PER_SECOND: u64 = 10;

/// Points per cycle still alive.
pub const POINTS_PER_ALIVE_CYCLE: u64 = 5;

/// Score for a round: `survival_seconds * 10 + alive * 5 + trail_cells`,
/// where `survival_seconds` is `elapsed_ms / 1000` rounded down.
pub fn compute_score(elapsed_ms: u64, alive: usize, trail_cells: usize) -> u64 {
    let seconds = elapsed_ms / 1000;
    let alive = u64::try_from(alive).unwrap_or(u64::MAX);
    let trail = u64::try_from(trail_cells).unwrap_or(u64::MAX);
    seconds
        .saturating_mul(POINTS_PER_SECOND)
        .saturating_add(alive.saturating_mul(POINTS_PER_ALIVE_CYCLE))
        .saturating_add(trail)
}

/// One play-through, from spawn to at most one survivor plus the restart
/// delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    id: RoundId,
    number: u64,
    phase: RoundPhase,
    started_at: DateTime<Utc>,
    /// Driver timestamp at which the round entered `Restarting`.
    ended_ms: Option<u64>,
    score: u64,
    /// Play time as of the last applied tick.
    elapsed_ms: u64,
}

impl Round {
    /// The first round of a run.
    pub fn first() -> Self {
        Self::numbered(1)
    }

    /// The round that follows this one.
    pub fn successor(&self) -> Self {
        Self::numbered(self.number.saturating_add(1))
    }

    fn numbered(number: u64) -> Self {
        Self {
            id: RoundId::new(),
            number,
            phase: RoundPhase::Playing,
            started_at: Utc::now(),
            ended_ms: None,
            score: 0,
            elapsed_ms: 0,
        }
    }

    /// Unique id of this round.
    pub const fn id(&self) -> RoundId {
        self.id
    }

    /// 1-based round counter.
    pub const fn number(&self) -> u64 {
        self.number
    }

    /// Lifecycle state.
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Timestamp the round ended, if it has.
    pub const fn ended_ms(&self) -> Option<u64> {
        self.ended_ms
    }

    /// Current score.
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Play time as of the last tick. Frozen while restarting.
    pub const fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Whether cycles are moving.
    pub const fn is_playing(&self) -> bool {
        matches!(self.phase, RoundPhase::Playing)
    }

    /// Record the post-tick numbers.
    pub(crate) const fn record(&mut self, elapsed_ms: u64, score: u64) {
        self.elapsed_ms = elapsed_ms;
        self.score = score;
    }

    /// Switch to `Restarting`. Returns `false` if already there.
    pub(crate) const fn finish(&mut self, now_ms: u64) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.phase = RoundPhase::Restarting;
        self.ended_ms = Some(now_ms);
        true
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::first()
    }
}
