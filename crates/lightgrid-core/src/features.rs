//! Feature extraction for the steering heuristic.
//!
//! For one cycle and one candidate heading, [`extract_features`] measures
//! the cell the cycle would enter next (`n`) against the arena. All
//! measurements are bounded counts over the fixed-size grid, so extraction
//! is cheap enough to run for every candidate of every cycle every tick.
//!
//! | Feature | Meaning |
//! |---|---|
//! | `safety_distance` | clear run along the heading, capped at the lookahead |
//! | `open_space` | free cells within Chebyshev radius 2 of `n` |
//! | `edge_distance` | distance from `n` to the nearest border |
//! | `path_diversity` | `max(0, 10 - k)`, `k` = remembered cells near `n` |
//! | `continuity` | candidate keeps the current heading |
//! | `exploration` | activity at `n` is 0 or 1 |
//! | `avoidance` | `n` is blocked |
//! | `future_options` | onward moves from `n`, excluding the way back |

use lightgrid_agents::Cycle;
use lightgrid_types::{Heading, Position};
use lightgrid_world::{Arena, grid};

/// Radius of the open-space neighbourhood around the next cell.
pub const OPEN_SPACE_RADIUS: i32 = 2;

/// Radius within which remembered cells count as a revisit.
pub const REVISIT_RADIUS: u32 = 2;

/// Diversity score when no remembered cell is nearby.
pub const PATH_DIVERSITY_MAX: u32 = 10;

/// Activity levels at or below this count as unexplored.
pub const FRESH_ACTIVITY_MAX: u8 = 1;

/// Measurements for one candidate heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Features {
    /// Consecutive unblocked cells ahead, starting at the next cell.
    pub safety_distance: u32,
    /// Unblocked cells in the 5x5 square around the next cell.
    pub open_space: u32,
    /// Distance from the next cell to the nearest grid border.
    pub edge_distance: u32,
    /// Penalty-inverted count of nearby remembered cells.
    pub path_diversity: u32,
    /// Candidate equals the current heading.
    pub continuity: bool,
    /// The next cell has little or no recorded activity.
    pub exploration: bool,
    /// The next cell is blocked.
    pub avoidance: bool,
    /// Unblocked onward moves from the next cell.
    pub future_options: u32,
}

/// Headings the cycle may take this tick: never the reverse of its current
/// heading, and only those whose adjacent cell is free. Returned in the
/// fixed `Up, Down, Left, Right` order.
pub fn candidate_headings(cycle: &Cycle, arena: &Arena) -> Vec<Heading> {
    let current = cycle.heading();
    let here = cycle.position();
    Heading::ALL
        .into_iter()
        .filter(|h| !h.is_reverse_of(current))
        .filter(|&h| !arena.is_blocked(here.step(h)))
        .collect()
}

/// Measure `heading` for `cycle`.
pub fn extract_features(cycle: &Cycle, arena: &Arena, heading: Heading, lookahead: u32) -> Features {
    let here = cycle.position();
    let next = here.step(heading);

    Features {
        safety_distance: safety_distance(arena, here, heading, lookahead),
        open_space: open_space(arena, next),
        edge_distance: to_u32(grid::edge_distance(next)),
        path_diversity: PATH_DIVERSITY_MAX
            .saturating_sub(to_u32(cycle.memory().count_within(next, REVISIT_RADIUS))),
        continuity: heading == cycle.heading(),
        exploration: arena.activity_at(next) <= FRESH_ACTIVITY_MAX,
        avoidance: arena.is_blocked(next),
        future_options: future_options(arena, next, heading),
    }
}

/// Count consecutive free cells from `from` along `heading`, up to `lookahead`.
fn safety_distance(arena: &Arena, from: Position, heading: Heading, lookahead: u32) -> u32 {
    let mut cursor = from;
    let mut clear = 0;
    while clear < lookahead {
        cursor = cursor.step(heading);
        if arena.is_blocked(cursor) {
            break;
        }
        clear = clear.saturating_add(1);
    }
    clear
}

fn open_space(arena: &Arena, center: Position) -> u32 {
    let mut free = 0_u32;
    for dy in -OPEN_SPACE_RADIUS..=OPEN_SPACE_RADIUS {
        for dx in -OPEN_SPACE_RADIUS..=OPEN_SPACE_RADIUS {
            let p = Position::new(center.x.saturating_add(dx), center.y.saturating_add(dy));
            if !arena.is_blocked(p) {
                free = free.saturating_add(1);
            }
        }
    }
    free
}

fn future_options(arena: &Arena, from: Position, heading: Heading) -> u32 {
    let count = Heading::ALL
        .into_iter()
        .filter(|h| !h.is_reverse_of(heading))
        .filter(|&h| !arena.is_blocked(from.step(h)))
        .count();
    to_u32(count)
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use lightgrid_types::AgentId;
    use lightgrid_world::ActivityGrid;

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

    #[test]
    fn reverse_is_never_a_candidate() {
        let arena = Arena::default();
        let cycle = cycle_at(20, 3, Heading::Right);
        let candidates = candidate_headings(&cycle, &arena);
        assert_eq!(candidates, vec![Heading::Up, Heading::Down, Heading::Right]);
    }

    #[test]
    fn blocked_neighbours_are_dropped() {
        let mut arena = Arena::default();
        wall(&mut arena, &[(20, 2), (21, 3)]);
        let cycle = cycle_at(20, 3, Heading::Right);
        assert_eq!(candidate_headings(&cycle, &arena), vec![Heading::Down]);
    }

    #[test]
    fn border_cells_drop_outward_moves() {
        let arena = Arena::default();
        let cycle = cycle_at(0, 0, Heading::Up);
        assert_eq!(candidate_headings(&cycle, &arena), vec![Heading::Right]);
    }

    #[test]
    fn safety_distance_caps_at_lookahead() {
        let arena = Arena::default();
        let cycle = cycle_at(5, 3, Heading::Right);
        let f = extract_features(&cycle, &arena, Heading::Right, 10);
        assert_eq!(f.safety_distance, 10);
    }

    #[test]
    fn safety_distance_stops_at_wall() {
        let mut arena = Arena::default();
        wall(&mut arena, &[(9, 3)]);
        let cycle = cycle_at(5, 3, Heading::Right);
        let f = extract_features(&cycle, &arena, Heading::Right, 10);
        // (6,3) (7,3) (8,3) are clear, (9,3) is blocked.
        assert_eq!(f.safety_distance, 3);
    }

    #[test]
    fn safety_distance_stops_at_border() {
        let arena = Arena::default();
        let cycle = cycle_at(10, 2, Heading::Up);
        let f = extract_features(&cycle, &arena, Heading::Up, 10);
        assert_eq!(f.safety_distance, 2);
    }

    #[test]
    fn open_space_counts_in_bounds_free_cells() {
        let arena = Arena::default();
        // Next cell (20,3): full 5x5 square is inside the grid.
        let f = extract_features(&cycle_at(19, 3, Heading::Right), &arena, Heading::Right, 10);
        assert_eq!(f.open_space, 25);
        // Next cell (1,0): columns -1..=3, rows -2..=2 -> 4 columns x 3 rows in bounds.
        let f = extract_features(&cycle_at(2, 0, Heading::Left), &arena, Heading::Left, 10);
        assert_eq!(f.open_space, 12);
    }

    #[test]
    fn edge_distance_and_continuity() {
        let arena = Arena::default();
        let cycle = cycle_at(10, 3, Heading::Right);
        let straight = extract_features(&cycle, &arena, Heading::Right, 10);
        let turn = extract_features(&cycle, &arena, Heading::Up, 10);
        assert_eq!(straight.edge_distance, 3);
        assert_eq!(turn.edge_distance, 2);
        assert!(straight.continuity);
        assert!(!turn.continuity);
    }

    #[test]
    fn path_diversity_penalises_recent_cells() {
        let arena = Arena::default();
        let mut cycle = cycle_at(10, 3, Heading::Right);
        assert_eq!(
            extract_features(&cycle, &arena, Heading::Right, 10).path_diversity,
            10
        );
        for _ in 0..4 {
            let next = cycle.next_position();
            cycle.advance_to(next);
        }
        // Cycle at (14,3); memory holds (10..=13, 3). Next cell (15,3)
        // is within radius 2 of (13,3) only.
        let f = extract_features(&cycle, &arena, Heading::Right, 10);
        assert_eq!(f.path_diversity, 9);
        // Up to (14,2): within radius 2 of (12,3) and (13,3).
        let f = extract_features(&cycle, &arena, Heading::Up, 10);
        assert_eq!(f.path_diversity, 8);
    }

    #[test]
    fn path_diversity_saturates_at_zero() {
        let arena = Arena::default();
        let mut cycle = cycle_at(20, 3, Heading::Right);
        // Loop around a small block so every remembered cell stays near the head.
        let route = [
            (21, 3),
            (22, 3),
            (22, 4),
            (21, 4),
            (20, 4),
            (19, 4),
            (19, 3),
            (19, 2),
            (20, 2),
            (21, 2),
            (22, 2),
            (21, 3),
        ];
        for (x, y) in route {
            cycle.advance_to(Position::new(x, y));
        }
        // Next cell (21,2): all twelve remembered cells are within radius 2.
        let f = extract_features(&cycle, &arena, Heading::Up, 10);
        assert_eq!(f.path_diversity, 0);
    }

    #[test]
    fn exploration_reads_activity() {
        let mut rows = vec![vec![0_u8; 52]; 7];
        rows[3][11] = 3;
        rows[2][10] = 1;
        let arena = Arena::new(ActivityGrid::from_rows(&rows).unwrap());
        let cycle = cycle_at(10, 3, Heading::Right);
        assert!(!extract_features(&cycle, &arena, Heading::Right, 10).exploration);
        assert!(extract_features(&cycle, &arena, Heading::Up, 10).exploration);
    }

    #[test]
    fn future_options_excludes_way_back() {
        let mut arena = Arena::default();
        let cycle = cycle_at(10, 3, Heading::Right);
        assert_eq!(
            extract_features(&cycle, &arena, Heading::Right, 10).future_options,
            3
        );
        wall(&mut arena, &[(12, 3), (11, 2)]);
        let f = extract_features(&cycle, &arena, Heading::Right, 10);
        assert_eq!(f.future_options, 1);
        assert!(!f.avoidance);
    }

    #[test]
    fn avoidance_flags_blocked_next_cell() {
        let mut arena = Arena::default();
        wall(&mut arena, &[(11, 3)]);
        let cycle = cycle_at(10, 3, Heading::Right);
        assert!(extract_features(&cycle, &arena, Heading::Right, 10).avoidance);
    }
}
