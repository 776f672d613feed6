//! Steering policies.
//!
//! Once per tick, before a cycle moves, the engine asks a
//! [`SteeringPolicy`] for the cycle's next heading. The trait abstracts how
//! that choice is made so the tick cycle can be driven by the stochastic
//! [`HeuristicPolicy`] in production and by the fully deterministic
//! [`StraightLinePolicy`] in tests.
//!
//! # Heuristic steering
//!
//! 1. Build the candidate set: every heading except the reverse of the
//!    current one whose adjacent cell is free.
//! 2. If the set is empty the cycle is boxed in; it keeps its heading and
//!    dies on the move.
//! 3. Score each candidate as the weighted sum of its [`Features`].
//! 4. Sort candidates by descending score (stable, so ties keep the fixed
//!    `Up, Down, Left, Right` order) and turn scores into probabilities with
//!    a temperature-scaled softmax.
//! 5. Draw `r` in `[0, 1)` and take the first candidate whose cumulative
//!    probability exceeds `r`, falling back to the last one.

use lightgrid_agents::Cycle;
use lightgrid_types::Heading;
use lightgrid_world::Arena;
use rand::{Rng, RngCore};
use tracing::trace;

use crate::config::{FeatureWeights, PolicyConfig};
use crate::features::{Features, candidate_headings, extract_features};

/// A source of steering decisions.
///
/// Implementations must only ever return the current heading or one of the
/// candidates produced by [`candidate_headings`]; in particular they never
/// reverse a cycle onto its own trail.
pub trait SteeringPolicy: Send + Sync {
    /// Choose the heading `cycle` should take this tick.
    fn choose_heading(&self, cycle: &Cycle, arena: &Arena, rng: &mut dyn RngCore) -> Heading;
}

/// A candidate heading with its measurements, score and softmax weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredHeading {
    /// The candidate.
    pub heading: Heading,
    /// Measurements for the candidate.
    pub features: Features,
    /// Weighted feature sum.
    pub score: f64,
    /// Selection probability after the softmax.
    pub probability: f64,
}

/// Weighted-feature steering with softmax sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicPolicy {
    lookahead: u32,
    temperature: f64,
    weights: FeatureWeights,
}

impl HeuristicPolicy {
    /// Build a policy from configuration.
    pub const fn new(config: &PolicyConfig) -> Self {
        Self {
            lookahead: config.lookahead,
            temperature: config.temperature,
            weights: config.weights,
        }
    }

    /// Score every candidate for `cycle`, best first, with selection
    /// probabilities attached. Empty when the cycle is boxed in.
    pub fn evaluate(&self, cycle: &Cycle, arena: &Arena) -> Vec<ScoredHeading> {
        let mut scored: Vec<ScoredHeading> = candidate_headings(cycle, arena)
            .into_iter()
            .map(|heading| {
                let features = extract_features(cycle, arena, heading, self.lookahead);
                ScoredHeading {
                    heading,
                    features,
                    score: score(&features, &self.weights),
                    probability: 0.0,
                }
            })
            .collect();

        // `sort_by` is stable: equal scores keep candidate order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        let scores: Vec<f64> = scored.iter().map(|s| s.score).collect();
        for (entry, p) in scored.iter_mut().zip(softmax(&scores, self.temperature)) {
            entry.probability = p;
        }
        scored
    }
}

impl Default for HeuristicPolicy {
    fn default() -> Self {
        Self::new(&PolicyConfig::default())
    }
}

impl SteeringPolicy for HeuristicPolicy {
    fn choose_heading(&self, cycle: &Cycle, arena: &Arena, rng: &mut dyn RngCore) -> Heading {
        let scored = self.evaluate(cycle, arena);
        if scored.is_empty() {
            trace!(agent_id = %cycle.id(), "No free heading, holding course");
            return cycle.heading();
        }

        let draw: f64 = rng.random();
        let probabilities: Vec<f64> = scored.iter().map(|s| s.probability).collect();
        let chosen = select_index(&probabilities, draw)
            .and_then(|i| scored.get(i))
            .map_or_else(|| cycle.heading(), |s| s.heading);

        trace!(
            agent_id = %cycle.id(),
            candidates = scored.len(),
            draw,
            heading = ?chosen,
            "Heading chosen"
        );
        chosen
    }
}

/// Keep going straight while the next cell is free; otherwise take the
/// first free candidate. Never random.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLinePolicy;

impl StraightLinePolicy {
    /// Create a new straight-line policy.
    pub const fn new() -> Self {
        Self
    }
}

impl SteeringPolicy for StraightLinePolicy {
    fn choose_heading(&self, cycle: &Cycle, arena: &Arena, _rng: &mut dyn RngCore) -> Heading {
        let candidates = candidate_headings(cycle, arena);
        if candidates.contains(&cycle.heading()) {
            return cycle.heading();
        }
        candidates.first().copied().unwrap_or_else(|| cycle.heading())
    }
}

/// Weighted sum of the features.
pub fn score(features: &Features, weights: &FeatureWeights) -> f64 {
    let terms = [
        (f64::from(features.safety_distance), weights.safety_distance),
        (f64::from(features.open_space), weights.open_space),
        (f64::from(features.edge_distance), weights.edge_distance),
        (f64::from(features.path_diversity), weights.path_diversity),
        (flag(features.continuity), weights.continuity),
        (flag(features.exploration), weights.exploration),
        (flag(features.avoidance), weights.avoidance),
        (f64::from(features.future_options), weights.future_options),
    ];
    terms
        .iter()
        .fold(0.0, |acc, &(value, weight)| value.mul_add(weight, acc))
}

/// Temperature-scaled softmax. The maximum is subtracted before
/// exponentiating so large scores cannot overflow.
///
/// Returns an empty vector for empty input, and a uniform distribution if
/// the scores are not finite.
pub fn softmax(scores: &[f64], temperature: f64) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores
        .iter()
        .map(|s| ((s - max) / temperature).exp())
        .collect();
    let sum: f64 = exps.iter().sum();

    if !sum.is_finite() || sum <= 0.0 {
        let n = f64::from(u32::try_from(scores.len()).unwrap_or(u32::MAX));
        return vec![n.recip(); scores.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the first entry whose cumulative probability exceeds `draw`.
/// Falls back to the last index when rounding leaves `draw` uncovered.
/// `None` only for an empty slice.
pub fn select_index(probabilities: &[f64], draw: f64) -> Option<usize> {
    let mut cumulative = 0.0;
    for (i, p) in probabilities.iter().enumerate() {
        cumulative += p;
        if draw < cumulative {
            return Some(i);
        }
    }
    probabilities.len().checked_sub(1)
}

fn flag(value: bool) -> f64 {
    f64::from(u8::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use lightgrid_types::{AgentId, Position};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn cycle_at(x: i32, y: i32, heading: Heading) -> Cycle {
        Cycle::new(AgentId::new(1).unwrap(), Position::new(x, y), heading, "#00f0ff")
    }

    fn wall(arena: &mut Arena, cells: &[(i32, i32)]) {
        let owner = AgentId::new(9).unwrap();
        for &(x, y) in cells {
            let _ = arena.mark_occupied(Position::new(x, y), owner);
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn score_uses_every_weight() {
        let weights = FeatureWeights::default();
        let features = Features {
            safety_distance: 10,
            open_space: 25,
            edge_distance: 3,
            path_diversity: 10,
            continuity: true,
            exploration: true,
            avoidance: false,
            future_options: 3,
        };
        // 150 + 200 + 15 + 30 + 2 + 4 + 0 + 18
        assert!(close(score(&features, &weights), 419.0));

        let blocked = Features {
            avoidance: true,
            ..Features::default()
        };
        assert!(close(score(&blocked, &weights), -20.0));
    }

    #[test]
    fn softmax_sums_to_one_and_keeps_order() {
        let p = softmax(&[3.0, 2.0, 1.0], 0.5);
        assert_eq!(p.len(), 3);
        assert!(close(p.iter().sum(), 1.0));
        assert!(p[0] > p[1] && p[1] > p[2]);
    }

    #[test]
    fn softmax_handles_large_scores() {
        let p = softmax(&[419.0, 418.0, -20.0], 0.5);
        assert!(p.iter().all(|v| v.is_finite()));
        assert!(close(p.iter().sum(), 1.0));
    }

    #[test]
    fn softmax_equal_scores_are_uniform() {
        let p = softmax(&[7.0, 7.0, 7.0, 7.0], 0.5);
        assert!(p.iter().all(|&v| close(v, 0.25)));
    }

    #[test]
    fn softmax_empty_input() {
        assert!(softmax(&[], 0.5).is_empty());
    }

    #[test]
    fn select_index_walks_cumulative_probability() {
        let p = [0.5, 0.3, 0.2];
        assert_eq!(select_index(&p, 0.0), Some(0));
        assert_eq!(select_index(&p, 0.49), Some(0));
        assert_eq!(select_index(&p, 0.5), Some(1));
        assert_eq!(select_index(&p, 0.95), Some(2));
        assert_eq!(select_index(&p, 1.0), Some(2));
        assert_eq!(select_index(&[], 0.3), None);
    }

    #[test]
    fn boxed_in_cycle_keeps_heading() {
        let mut arena = Arena::default();
        wall(&mut arena, &[(20, 2), (20, 4), (21, 3)]);
        let cycle = cycle_at(20, 3, Heading::Right);
        let policy = HeuristicPolicy::default();
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(policy.evaluate(&cycle, &arena).is_empty());
        assert_eq!(policy.choose_heading(&cycle, &arena, &mut rng), Heading::Right);
        assert_eq!(
            StraightLinePolicy::new().choose_heading(&cycle, &arena, &mut rng),
            Heading::Right
        );
    }

    #[test]
    fn never_reverses() {
        let arena = Arena::default();
        let policy = HeuristicPolicy::default();
        let mut rng = SmallRng::seed_from_u64(3);
        for heading in Heading::ALL {
            let cycle = cycle_at(25, 3, heading);
            for _ in 0..200 {
                let chosen = policy.choose_heading(&cycle, &arena, &mut rng);
                assert!(!chosen.is_reverse_of(heading));
            }
        }
    }

    #[test]
    fn evaluate_is_sorted_and_normalised() {
        let arena = Arena::default();
        let cycle = cycle_at(25, 0, Heading::Right);
        let scored = HeuristicPolicy::default().evaluate(&cycle, &arena);
        // Up leaves the grid, Left is the reverse.
        assert_eq!(scored.len(), 2);
        assert!(scored.windows(2).all(|w| w[0].score >= w[1].score));
        let total: f64 = scored.iter().map(|s| s.probability).sum();
        assert!(close(total, 1.0));
    }

    #[test]
    fn dead_end_is_practically_never_taken() {
        let mut arena = Arena::default();
        // Right leads into a one-cell pocket.
        wall(&mut arena, &[(22, 3), (21, 2), (21, 4)]);
        let cycle = cycle_at(20, 3, Heading::Right);
        let policy = HeuristicPolicy::default();
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..500 {
            assert_ne!(
                policy.choose_heading(&cycle, &arena, &mut rng),
                Heading::Right
            );
        }
    }

    #[test]
    fn seeded_choices_are_reproducible() {
        let arena = Arena::default();
        let cycle = cycle_at(25, 3, Heading::Up);
        let policy = HeuristicPolicy::default();
        let mut a = SmallRng::seed_from_u64(42);
        let mut b = SmallRng::seed_from_u64(42);
        for _ in 0..100 {
            assert_eq!(
                policy.choose_heading(&cycle, &arena, &mut a),
                policy.choose_heading(&cycle, &arena, &mut b)
            );
        }
    }

    #[test]
    fn straight_line_turns_only_when_blocked() {
        let mut arena = Arena::default();
        let cycle = cycle_at(20, 3, Heading::Right);
        let mut rng = SmallRng::seed_from_u64(0);
        let policy = StraightLinePolicy::new();
        assert_eq!(policy.choose_heading(&cycle, &arena, &mut rng), Heading::Right);
        wall(&mut arena, &[(21, 3)]);
        assert_eq!(policy.choose_heading(&cycle, &arena, &mut rng), Heading::Up);
    }
}
