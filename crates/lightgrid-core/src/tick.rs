//! Tick and frame processing: the loop body that drives a round.
//!
//! A *frame* is one call from the driver with a monotonic timestamp. What a
//! frame does depends on the round phase:
//!
//! - **Playing** -- if the clock says a tick is due, run one tick: every
//!   alive cycle, in spawn order, asks the [`SteeringPolicy`] for a heading,
//!   then either dies (blocked next cell) or writes its current cell to the
//!   trail and moves. Afterwards the score is recomputed, and if at most one
//!   cycle is left the round ends: survivors are stopped and the phase
//!   becomes `Restarting`.
//! - **Restarting** -- nothing moves. Once the restart delay has passed the
//!   round is rebuilt from scratch: trail cleared, cycles respawned with
//!   fresh headings, clock and score reset.
//!
//! Cycles are processed one after another inside a tick, so a cycle later
//! in the order already sees the trail cells written by earlier cycles in
//! the same tick. Two cycles can also end a tick on the same cell; that
//! cell is claimed by whichever of them leaves it first.

use lightgrid_agents::{Cycle, spawn_cycles};
use lightgrid_types::{CollisionEvent, RoundPhase, SimulationSnapshot};
use lightgrid_world::{ActivityGrid, Arena};
use rand::{Rng, RngCore};
use tracing::{debug, info};

use crate::clock::{ClockError, SimulationClock};
use crate::config::ClockConfig;
use crate::decision::SteeringPolicy;
use crate::round::{Round, compute_score};

/// A round ends once this many cycles or fewer are alive after a tick.
pub const ROUND_END_ALIVE_THRESHOLD: usize = 1;

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// Round the tick belongs to.
    pub round: u64,
    /// Tick number within the round (1-based).
    pub tick: u64,
    /// Cycles that died this tick, in processing order. Includes survivors
    /// stopped because the round ended.
    pub collisions: Vec<CollisionEvent>,
    /// Alive cycles after movement, before any end-of-round stop.
    pub alive: usize,
    /// Trail cells written so far this round.
    pub trail_cells: usize,
    /// Play time at this tick.
    pub elapsed_ms: u64,
    /// Score after this tick.
    pub score: u64,
    /// Whether this tick ended the round.
    pub round_ended: bool,
}

/// What a single frame did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOutcome {
    /// The tick that ran, if one was due.
    pub tick: Option<TickSummary>,
    /// Whether a new round began on this frame.
    pub round_restarted: bool,
    /// Phase after the frame.
    pub phase: RoundPhase,
}

impl FrameOutcome {
    /// Collision events raised during this frame.
    pub fn collisions(&self) -> &[CollisionEvent] {
        self.tick.as_ref().map_or(&[], |t| t.collisions.as_slice())
    }

    /// Whether the round ended on this frame.
    pub fn round_ended(&self) -> bool {
        self.tick.as_ref().is_some_and(|t| t.round_ended)
    }
}

/// The owned simulation context.
///
/// Holds everything round-scoped. Nothing outside the tick functions in
/// this module mutates it; observers work from [`SimulationState::snapshot`].
#[derive(Debug, Clone)]
pub struct SimulationState {
    arena: Arena,
    cycles: Vec<Cycle>,
    round: Round,
    clock: SimulationClock,
}

impl SimulationState {
    /// Start the first round at `now_ms`.
    pub fn new<R: Rng>(
        activity: ActivityGrid,
        clock: ClockConfig,
        rng: &mut R,
        now_ms: u64,
    ) -> Result<Self, ClockError> {
        let clock = SimulationClock::new(clock, now_ms)?;
        let state = Self {
            arena: Arena::new(activity),
            cycles: spawn_cycles(rng),
            round: Round::first(),
            clock,
        };
        info!(
            round = state.round.number(),
            round_id = %state.round.id(),
            cycles = state.cycles.len(),
            "Round started"
        );
        Ok(state)
    }

    /// Activity and trail grids.
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Every cycle of the current round, dead ones included.
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// Current round.
    pub const fn round(&self) -> &Round {
        &self.round
    }

    /// Round clock.
    pub const fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Lifecycle state.
    pub const fn phase(&self) -> RoundPhase {
        self.round.phase()
    }

    /// Number of cycles still alive.
    pub fn alive_count(&self) -> usize {
        self.cycles.iter().filter(|c| c.is_alive()).count()
    }

    /// Read-only copy for rendering.
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            round_id: self.round.id(),
            round: self.round.number(),
            round_started_at: self.round.started_at(),
            phase: self.round.phase(),
            score: self.round.score(),
            elapsed_ms: self.round.elapsed_ms(),
            tick_interval_ms: self.clock.interval_for_elapsed(self.round.elapsed_ms()),
            tick: self.clock.ticks(),
            cycles: self.cycles.iter().map(Cycle::view).collect(),
            trail: self.arena.trail().to_rows(),
        }
    }
}

/// Execute one tick: move every alive cycle, rescore, and end the round if
/// at most one cycle is left.
///
/// The clock is not consulted; callers that want speed gating go through
/// [`advance_frame`]. A tick on a round that is already restarting does
/// nothing and returns `None`.
pub fn run_tick<R: RngCore>(
    state: &mut SimulationState,
    policy: &dyn SteeringPolicy,
    rng: &mut R,
    now_ms: u64,
) -> Option<TickSummary> {
    if !state.round.is_playing() {
        return None;
    }

    let SimulationState {
        arena,
        cycles,
        round,
        clock,
    } = state;

    let tick = clock.record_tick(now_ms);
    let mut collisions = Vec::new();

    for cycle in cycles.iter_mut().filter(|c| c.is_alive()) {
        let heading = policy.choose_heading(cycle, arena, &mut *rng);
        let _ = cycle.steer(heading);
        let next = cycle.next_position();

        if arena.is_blocked(next) {
            let _ = cycle.kill();
            debug!(
                round = round.number(),
                tick,
                agent_id = %cycle.id(),
                position = %cycle.position(),
                "Cycle crashed"
            );
            collisions.push(CollisionEvent {
                agent_id: cycle.id(),
                position: cycle.position(),
            });
        } else {
            let _ = arena.mark_occupied(cycle.position(), cycle.id());
            cycle.advance_to(next);
        }
    }

    let alive = cycles.iter().filter(|c| c.is_alive()).count();
    let trail_cells = arena.trail().cells_written();
    let elapsed_ms = clock.elapsed_ms(now_ms);
    let score = compute_score(elapsed_ms, alive, trail_cells);
    round.record(elapsed_ms, score);

    debug!(
        round = round.number(),
        tick,
        alive,
        trail_cells,
        score,
        "Tick applied"
    );

    let round_ended = alive <= ROUND_END_ALIVE_THRESHOLD;
    if round_ended {
        for cycle in cycles.iter_mut().filter(|c| c.is_alive()) {
            let _ = cycle.kill();
            collisions.push(CollisionEvent {
                agent_id: cycle.id(),
                position: cycle.position(),
            });
        }
        let _ = round.finish(now_ms);
        info!(
            round = round.number(),
            ticks = tick,
            score,
            elapsed_ms,
            survivor = alive == 1,
            "Round ended"
        );
    }

    Some(TickSummary {
        round: round.number(),
        tick,
        collisions,
        alive,
        trail_cells,
        elapsed_ms,
        score,
        round_ended,
    })
}

/// Rebuild every round-scoped piece of state and start the next round at
/// `now_ms`.
pub fn restart_round<R: Rng>(state: &mut SimulationState, rng: &mut R, now_ms: u64) {
    state.arena.reset();
    state.cycles = spawn_cycles(rng);
    state.clock.reset(now_ms);
    state.round = state.round.successor();
    info!(
        round = state.round.number(),
        round_id = %state.round.id(),
        "Round started"
    );
}

/// Process one frame at `now_ms`.
pub fn advance_frame<R: RngCore>(
    state: &mut SimulationState,
    policy: &dyn SteeringPolicy,
    rng: &mut R,
    now_ms: u64,
) -> FrameOutcome {
    match state.round.phase() {
        RoundPhase::Playing => {
            let tick = if state.clock.tick_due(now_ms) {
                run_tick(state, policy, &mut *rng, now_ms)
            } else {
                None
            };
            FrameOutcome {
                tick,
                round_restarted: false,
                phase: state.round.phase(),
            }
        }
        RoundPhase::Restarting => {
            let due = state
                .round
                .ended_ms()
                .is_none_or(|ended| state.clock.restart_due(ended, now_ms));
            if due {
                restart_round(state, rng, now_ms);
            }
            FrameOutcome {
                tick: None,
                round_restarted: due,
                phase: state.round.phase(),
            }
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]
mod tests {
    use lightgrid_agents::SPAWN_POINTS;
    use lightgrid_types::{AgentId, Heading};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::decision::{HeuristicPolicy, StraightLinePolicy};

    fn make_state(seed: u64) -> (SimulationState, SmallRng) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let state =
            SimulationState::new(ActivityGrid::empty(), ClockConfig::default(), &mut rng, 0)
                .unwrap();
        (state, rng)
    }

    /// Policy that always answers with one fixed heading.
    struct Fixed(Heading);

    impl SteeringPolicy for Fixed {
        fn choose_heading(&self, _: &Cycle, _: &Arena, _: &mut dyn RngCore) -> Heading {
            self.0
        }
    }

    #[test]
    fn new_state_spawns_four_cycles_at_spawn_points() {
        let (state, _) = make_state(1);
        assert_eq!(state.phase(), RoundPhase::Playing);
        assert_eq!(state.alive_count(), 4);
        for (cycle, point) in state.cycles().iter().zip(SPAWN_POINTS.iter()) {
            assert_eq!(cycle.position(), point.position);
            assert_eq!(cycle.id().get(), point.id);
        }
        assert_eq!(state.arena().trail().cells_written(), 0);
    }

    #[test]
    fn tick_moves_and_writes_previous_cell() {
        let (mut state, mut rng) = make_state(1);
        let before: Vec<_> = state.cycles().iter().map(Cycle::position).collect();
        let summary = run_tick(&mut state, &StraightLinePolicy, &mut rng, 150).unwrap();
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.trail_cells, 4);
        for (cycle, old) in state.cycles().iter().zip(before) {
            assert_ne!(cycle.position(), old);
            assert_eq!(state.arena().trail().owner(old), Some(cycle.id()));
            assert_eq!(cycle.memory().latest(), Some(old));
        }
    }

    #[test]
    fn blocked_move_kills_without_moving_or_writing() {
        let (mut state, mut rng) = make_state(1);
        // Spawn rows are 1 and 5: driving up twice puts rows-1 cycles
        // against the top border.
        let _ = run_tick(&mut state, &Fixed(Heading::Up), &mut rng, 150);
        let at_border: Vec<_> = state.cycles().iter().map(Cycle::position).collect();
        let summary = run_tick(&mut state, &Fixed(Heading::Up), &mut rng, 300).unwrap();

        let crashed: Vec<_> = summary.collisions.iter().map(|c| c.agent_id.get()).collect();
        assert!(crashed.contains(&1) && crashed.contains(&2));
        for event in &summary.collisions {
            let idx = usize::from(event.agent_id.get() - 1);
            assert_eq!(event.position, at_border[idx]);
        }
        // Cycles 1 and 2 died at y=0 without writing (x, 0).
        assert_eq!(state.arena().trail().owner(at_border[0]), None);
        assert_eq!(state.arena().trail().owner(at_border[1]), None);
    }

    #[test]
    fn round_ends_when_one_or_fewer_remain() {
        let (mut state, mut rng) = make_state(1);
        let _ = run_tick(&mut state, &Fixed(Heading::Up), &mut rng, 150);
        let _ = run_tick(&mut state, &Fixed(Heading::Up), &mut rng, 300);
        // Cycles 3 and 4 started on row 5 and are still driving up.
        assert_eq!(state.alive_count(), 2);
        assert_eq!(state.phase(), RoundPhase::Playing);

        let mut now = 300;
        let summary = loop {
            now += 150;
            let s = run_tick(&mut state, &Fixed(Heading::Up), &mut rng, now).unwrap();
            if s.round_ended {
                break s;
            }
        };
        assert_eq!(state.phase(), RoundPhase::Restarting);
        assert_eq!(state.alive_count(), 0);
        assert!(summary.alive <= 1);
        assert_eq!(state.round().ended_ms(), Some(now));
        // Nothing moves while restarting.
        assert!(run_tick(&mut state, &Fixed(Heading::Up), &mut rng, now + 150).is_none());
    }

    #[test]
    fn boxed_in_cycle_dies_in_place() {
        let (mut state, mut rng) = make_state(3);
        let spawn = state.cycles()[0].position();
        let heading = state.cycles()[0].heading();
        let wall = AgentId::new(9).unwrap();
        for h in [Heading::Up, Heading::Down, Heading::Left, Heading::Right] {
            assert!(state.arena.mark_occupied(spawn.step(h), wall));
        }

        let summary = run_tick(&mut state, &HeuristicPolicy::default(), &mut rng, 150).unwrap();

        let cycle = &state.cycles()[0];
        assert!(!cycle.is_alive());
        assert_eq!(cycle.position(), spawn);
        assert_eq!(cycle.heading(), heading);
        assert!(summary.collisions.contains(&CollisionEvent {
            agent_id: cycle.id(),
            position: spawn,
        }));
        assert_eq!(state.arena().trail().owner(spawn), None);
        // The other three were never near it.
        assert_eq!(summary.alive, 3);
        assert!(!summary.round_ended);
    }

    /// Sends cycle 2 right and everyone else left.
    struct TowardWalls;

    impl SteeringPolicy for TowardWalls {
        fn choose_heading(&self, cycle: &Cycle, _: &Arena, _: &mut dyn RngCore) -> Heading {
            if cycle.id().get() == 2 { Heading::Right } else { Heading::Left }
        }
    }

    #[test]
    fn last_survivor_is_stopped_and_reported() {
        let (mut state, mut rng) = make_state(1);
        // Cycles 1, 2 and 3 are five cells from a side wall and crash on
        // tick 6; cycle 4 heads into open space from x=46.
        let mut last = None;
        for i in 1..=6 {
            last = run_tick(&mut state, &TowardWalls, &mut rng, i * 150);
        }
        let summary = last.unwrap();
        assert!(summary.round_ended);
        assert_eq!(summary.alive, 1);
        assert_eq!(state.phase(), RoundPhase::Restarting);

        let ids: Vec<u8> = summary.collisions.iter().map(|c| c.agent_id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        let survivor = summary.collisions.last().unwrap();
        assert_eq!(survivor.position, lightgrid_types::Position::new(40, 5));
    }

    #[test]
    fn frames_respect_tick_interval() {
        let (mut state, mut rng) = make_state(5);
        let policy = HeuristicPolicy::default();
        assert!(advance_frame(&mut state, &policy, &mut rng, 16).tick.is_none());
        assert!(advance_frame(&mut state, &policy, &mut rng, 149).tick.is_none());
        assert!(advance_frame(&mut state, &policy, &mut rng, 150).tick.is_some());
        assert!(advance_frame(&mut state, &policy, &mut rng, 160).tick.is_none());
        assert!(advance_frame(&mut state, &policy, &mut rng, 300).tick.is_some());
    }

    #[test]
    fn restart_after_delay_resets_everything() {
        let (mut state, mut rng) = make_state(9);
        let policy = Fixed(Heading::Up);
        let mut now = 0;
        while state.phase() == RoundPhase::Playing {
            now += 150;
            let _ = advance_frame(&mut state, &policy, &mut rng, now);
        }
        let ended = now;
        let first_id = state.round().id();
        assert!(state.arena().trail().cells_written() > 0);

        let waiting = advance_frame(&mut state, &policy, &mut rng, ended + 999);
        assert!(!waiting.round_restarted);
        assert_eq!(waiting.phase, RoundPhase::Restarting);

        let restarted = advance_frame(&mut state, &policy, &mut rng, ended + 1_000);
        assert!(restarted.round_restarted);
        assert_eq!(restarted.phase, RoundPhase::Playing);
        assert_eq!(state.round().number(), 2);
        assert_ne!(state.round().id(), first_id);
        assert_eq!(state.round().score(), 0);
        assert_eq!(state.clock().ticks(), 0);
        assert_eq!(state.alive_count(), 4);
        assert!(state.arena().trail().to_rows().iter().flatten().all(|&v| v == 0));
        for (cycle, point) in state.cycles().iter().zip(SPAWN_POINTS.iter()) {
            assert_eq!(cycle.position(), point.position);
        }
    }

    #[test]
    fn snapshot_reflects_state() {
        let (mut state, mut rng) = make_state(2);
        let _ = run_tick(&mut state, &StraightLinePolicy, &mut rng, 150);
        let snap = state.snapshot();
        assert_eq!(snap.round, 1);
        assert_eq!(snap.tick, 1);
        assert_eq!(snap.phase, RoundPhase::Playing);
        assert_eq!(snap.cycles.len(), 4);
        assert_eq!(snap.alive_count(), 4);
        assert_eq!(snap.score, compute_score(150, 4, 4));
        assert_eq!(snap.tick_interval_ms, 150);
        assert_eq!(snap.trail.len(), 7);
        assert!(snap.trail.iter().all(|row| row.len() == 52));
    }
}
