/// Gold-bag gravity and nugget pickup.
///
/// Bags are resolved bottom row first. A bag whose support was removed by
/// the bag beneath it in the same pass sees the vacated cell as open and
/// follows it down, so stacked bags fall together.
///
/// Per bag:
///   - cell below open (tunnel or the digger) → fall one row; landing on
///     the digger crushes it
///   - blocked (or at the bottom edge):
///       falling, distance > 1  → break: +25, bag gone, 1–3 nuggets
///       falling, distance ≤ 1  → land softly
///       resting                → distance reset

use log::debug;

use super::entity::{EntityId, GoldBag, GoldNugget, IdAllocator};
use super::grid::{Grid, Pos};
use super::rng::{self, RandomSource};
use super::rules::{BAG_BREAK_POINTS, GOLD_NUGGET_VALUE, NUGGETS_MAX, NUGGETS_MIN};
use super::tile::Tile;

/// Nugget scatter offsets around a broken bag: center, left, right, up.
const NUGGET_OFFSETS: [(i32, i32); 4] = [(0, 0), (-1, 0), (1, 0), (0, -1)];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BagOutcome {
    /// Moved down one row. `started` is true on the first row of a fall.
    Fell { id: EntityId, to: Pos, started: bool },
    /// Came to rest after a short fall.
    Landed { id: EntityId, at: Pos },
    /// Broke apart after a long fall.
    Broke { id: EntityId, at: Pos, nuggets: Vec<Pos> },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GravityReport {
    pub outcomes: Vec<BagOutcome>,
    pub points: u32,
    pub digger_crushed: bool,
}

/// Advance every bag by one tick. `digger` is `None` while the digger is
/// off the board (respawning), in which case nothing can be crushed.
pub fn resolve_bags(
    grid: &mut Grid,
    bags: &mut Vec<GoldBag>,
    nuggets: &mut Vec<GoldNugget>,
    digger: Option<Pos>,
    ids: &mut IdAllocator,
    rng: &mut dyn RandomSource,
) -> GravityReport {
    let mut report = GravityReport::default();

    // Bottom-most first; stable, so equal rows keep registry order.
    let mut order: Vec<usize> = (0..bags.len()).collect();
    order.sort_by(|&a, &b| bags[b].pos.y.cmp(&bags[a].pos.y));

    let mut broken: Vec<EntityId> = Vec::new();

    for idx in order {
        let bag = &mut bags[idx];
        let here = bag.pos;
        let below = grid
            .offset(here, 0, 1)
            .filter(|&p| grid.get(p).is_some_and(Tile::is_hollow));

        if let Some(to) = below {
            if digger == Some(to) {
                debug!("bag {} crushed the digger at ({}, {})", bag.id, to.x, to.y);
                report.digger_crushed = true;
            }
            if grid.get(here) == Some(Tile::Gold) {
                grid.set_tile(here, Tile::Tunnel);
            }
            grid.set_tile(to, Tile::Gold);
            let started = !bag.is_falling;
            bag.pos = to;
            bag.is_falling = true;
            bag.fall_distance += 1;
            report.outcomes.push(BagOutcome::Fell { id: bag.id, to, started });
            continue;
        }

        // Blocked by a solid cell or the bottom edge.
        if !bag.is_falling {
            bag.fall_distance = 0;
            continue;
        }

        if bag.fall_distance > 1 {
            debug!("bag {} broke after {} rows at ({}, {})", bag.id, bag.fall_distance, here.x, here.y);
            let id = bag.id;
            broken.push(id);
            report.points += BAG_BREAK_POINTS;
            if grid.get(here) == Some(Tile::Gold) {
                grid.set_tile(here, Tile::Tunnel);
            }
            let spots = scatter_nuggets(grid, here, rng);
            for &p in &spots {
                nuggets.push(GoldNugget { id: ids.next_id(), pos: p, value: GOLD_NUGGET_VALUE });
            }
            if digger == Some(here) {
                report.digger_crushed = true;
            }
            report.outcomes.push(BagOutcome::Broke { id, at: here, nuggets: spots });
        } else {
            bag.settle();
            grid.set_tile(here, Tile::Gold);
            report.outcomes.push(BagOutcome::Landed { id: bag.id, at: here });
        }
    }

    if !broken.is_empty() {
        bags.retain(|b| !broken.contains(&b.id));
    }

    report
}

/// Pick 1–3 distinct tunnel cells around `at` for nuggets.
/// Fewer are placed when fewer candidates are open.
fn scatter_nuggets(grid: &Grid, at: Pos, rng: &mut dyn RandomSource) -> Vec<Pos> {
    let target = NUGGETS_MIN + rng.below(NUGGETS_MAX - NUGGETS_MIN + 1);
    let mut offsets = NUGGET_OFFSETS;
    rng::shuffle(rng, &mut offsets);

    let mut placed = Vec::with_capacity(target);
    for (dx, dy) in offsets {
        if placed.len() >= target {
            break;
        }
        if let Some(p) = grid.offset(at, dx, dy) {
            if grid.get(p) == Some(Tile::Tunnel) {
                placed.push(p);
            }
        }
    }
    placed
}

/// Remove and return every nugget lying at `digger`.
pub fn collect_nuggets(nuggets: &mut Vec<GoldNugget>, digger: Pos) -> Vec<GoldNugget> {
    let (taken, kept): (Vec<_>, Vec<_>) = nuggets.drain(..).partition(|n| n.pos == digger);
    *nuggets = kept;
    taken
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rng::testing::ScriptedRandom;

    /// Bags are read from '$' cells in the diagram.
    fn setup(rows: &[&str]) -> (Grid, Vec<GoldBag>) {
        let grid = Grid::from_rows(rows);
        let bags = grid
            .positions_of(Tile::Gold)
            .into_iter()
            .enumerate()
            .map(|(i, p)| GoldBag::new(i as EntityId, p))
            .collect();
        (grid, bags)
    }

    fn run(grid: &mut Grid, bags: &mut Vec<GoldBag>, digger: Option<Pos>, rng: &mut ScriptedRandom) -> (GravityReport, Vec<GoldNugget>) {
        let mut nuggets = Vec::new();
        let mut ids = IdAllocator::starting_at(100);
        let r = resolve_bags(grid, bags, &mut nuggets, digger, &mut ids, rng);
        (r, nuggets)
    }

    // ── Falling ──

    #[test]
    fn bag_over_tunnel_falls_one_row() {
        let (mut g, mut bags) = setup(&[
            "#$#",
            "#.#",
            "#.#",
            "###",
        ]);
        let mut rng = ScriptedRandom::new();
        let (r, _) = run(&mut g, &mut bags, None, &mut rng);
        assert_eq!(bags[0].pos, Pos::new(1, 1));
        assert!(bags[0].is_falling);
        assert_eq!(bags[0].fall_distance, 1);
        assert_eq!(g.get(Pos::new(1, 0)), Some(Tile::Tunnel));
        assert_eq!(g.get(Pos::new(1, 1)), Some(Tile::Gold));
        assert_eq!(r.outcomes, vec![BagOutcome::Fell { id: 0, to: Pos::new(1, 1), started: true }]);
    }

    #[test]
    fn fall_distance_increments_each_tick() {
        let (mut g, mut bags) = setup(&[
            "$",
            ".",
            ".",
            ".",
            "#",
        ]);
        let mut rng = ScriptedRandom::new();
        for expected in 1..=3 {
            run(&mut g, &mut bags, None, &mut rng);
            assert_eq!(bags[0].fall_distance, expected);
            assert!(bags[0].is_falling);
        }
    }

    #[test]
    fn resting_bag_on_dirt_stays() {
        let (mut g, mut bags) = setup(&[
            ".$.",
            "###",
        ]);
        let mut rng = ScriptedRandom::new();
        let (r, _) = run(&mut g, &mut bags, None, &mut rng);
        assert_eq!(bags[0].pos, Pos::new(1, 0));
        assert!(!bags[0].is_falling);
        assert_eq!(bags[0].fall_distance, 0);
        assert!(r.outcomes.is_empty());
    }

    #[test]
    fn cherry_below_blocks_fall() {
        let (mut g, mut bags) = setup(&[
            "$",
            "C",
        ]);
        let mut rng = ScriptedRandom::new();
        run(&mut g, &mut bags, None, &mut rng);
        assert_eq!(bags[0].pos, Pos::new(0, 0));
    }

    // ── Landing / breaking ──

    #[test]
    fn short_fall_lands_softly() {
        let (mut g, mut bags) = setup(&[
            "$",
            "#",
        ]);
        bags[0].is_falling = true;
        bags[0].fall_distance = 1;
        let mut rng = ScriptedRandom::new();
        let (r, _) = run(&mut g, &mut bags, None, &mut rng);
        assert_eq!(bags.len(), 1);
        assert!(!bags[0].is_falling);
        assert_eq!(bags[0].fall_distance, 0);
        assert_eq!(g.get(Pos::new(0, 0)), Some(Tile::Gold));
        assert_eq!(r.outcomes, vec![BagOutcome::Landed { id: 0, at: Pos::new(0, 0) }]);
        assert_eq!(r.points, 0);
    }

    #[test]
    fn long_fall_breaks_into_nuggets() {
        let (mut g, mut bags) = setup(&[
            "...",
            ".$.",
            "###",
        ]);
        bags[0].is_falling = true;
        bags[0].fall_distance = 2;
        // target = 1 + 2 = 3 nuggets; identity shuffle: picks i each step → j = i
        let mut rng = ScriptedRandom::with_picks(&[2, 3, 2, 1]);
        let (r, nuggets) = run(&mut g, &mut bags, None, &mut rng);

        assert!(bags.is_empty());
        assert_eq!(r.points, 25);
        assert_eq!(g.get(Pos::new(1, 1)), Some(Tile::Tunnel));
        assert_eq!(nuggets.len(), 3);
        let spots: Vec<Pos> = nuggets.iter().map(|n| n.pos).collect();
        assert_eq!(spots, vec![Pos::new(1, 1), Pos::new(0, 1), Pos::new(2, 1)]);
        assert!(nuggets.iter().all(|n| n.value == 250));
        assert_eq!(nuggets[0].id, 100);
    }

    #[test]
    fn nuggets_only_on_tunnel_cells() {
        let (mut g, mut bags) = setup(&[
            "###",
            "#$#",
            "###",
        ]);
        bags[0].is_falling = true;
        bags[0].fall_distance = 3;
        let mut rng = ScriptedRandom::with_picks(&[2]); // ask for 3
        let (_, nuggets) = run(&mut g, &mut bags, None, &mut rng);
        // Only the bag's own (now cleared) cell is open
        assert_eq!(nuggets.len(), 1);
        assert_eq!(nuggets[0].pos, Pos::new(1, 1));
    }

    #[test]
    fn bag_at_bottom_edge_breaks_after_long_fall() {
        let (mut g, mut bags) = setup(&[
            "...",
            ".$.",
        ]);
        bags[0].is_falling = true;
        bags[0].fall_distance = 4;
        let mut rng = ScriptedRandom::new(); // one nugget
        let (r, nuggets) = run(&mut g, &mut bags, None, &mut rng);
        assert!(bags.is_empty());
        assert_eq!(r.points, 25);
        assert_eq!(nuggets.len(), 1);
    }

    #[test]
    fn bag_at_bottom_edge_lands_after_short_fall() {
        let (mut g, mut bags) = setup(&[
            ".",
            "$",
        ]);
        bags[0].is_falling = true;
        bags[0].fall_distance = 1;
        let mut rng = ScriptedRandom::new();
        run(&mut g, &mut bags, None, &mut rng);
        assert_eq!(bags.len(), 1);
        assert!(!bags[0].is_falling);
    }

    // ── Digger interactions ──

    #[test]
    fn falling_onto_digger_crushes() {
        let (mut g, mut bags) = setup(&[
            "$",
            "D",
            "#",
        ]);
        let mut rng = ScriptedRandom::new();
        let (r, _) = run(&mut g, &mut bags, Some(Pos::new(0, 1)), &mut rng);
        assert!(r.digger_crushed);
        assert_eq!(bags[0].pos, Pos::new(0, 1));
        assert_eq!(g.get(Pos::new(0, 1)), Some(Tile::Gold));
    }

    #[test]
    fn breaking_on_digger_cell_crushes() {
        let (mut g, mut bags) = setup(&[
            "$",
            "#",
        ]);
        bags[0].is_falling = true;
        bags[0].fall_distance = 2;
        let mut rng = ScriptedRandom::new();
        let (r, _) = run(&mut g, &mut bags, Some(Pos::new(0, 0)), &mut rng);
        assert!(r.digger_crushed);
    }

    #[test]
    fn absent_digger_is_never_crushed() {
        let (mut g, mut bags) = setup(&[
            "$",
            ".",
        ]);
        let mut rng = ScriptedRandom::new();
        let (r, _) = run(&mut g, &mut bags, None, &mut rng);
        assert!(!r.digger_crushed);
    }

    // ── Ordering ──

    #[test]
    fn stacked_bags_fall_together() {
        let (mut g, mut bags) = setup(&[
            "$",
            "$",
            ".",
            "#",
        ]);
        let mut rng = ScriptedRandom::new();
        run(&mut g, &mut bags, None, &mut rng);
        let mut ys: Vec<usize> = bags.iter().map(|b| b.pos.y).collect();
        ys.sort();
        assert_eq!(ys, vec![1, 2]);
        assert_eq!(g.count(Tile::Gold), 2);
        assert_eq!(g.get(Pos::new(0, 0)), Some(Tile::Tunnel));
    }

    #[test]
    fn gold_tiles_match_bags_after_resolution() {
        let (mut g, mut bags) = setup(&[
            "$.$.$",
            "..#..",
            "#.#.#",
            ".....",
            "#####",
        ]);
        let mut rng = ScriptedRandom::new();
        for _ in 0..5 {
            run(&mut g, &mut bags, None, &mut rng);
            let mut tiles = g.positions_of(Tile::Gold);
            let mut at: Vec<Pos> = bags.iter().map(|b| b.pos).collect();
            tiles.sort();
            at.sort();
            assert_eq!(tiles, at);
        }
    }

    // ── Nuggets ──

    #[test]
    fn collect_nuggets_takes_only_digger_cell() {
        let mut nuggets = vec![
            GoldNugget { id: 1, pos: Pos::new(1, 1), value: 250 },
            GoldNugget { id: 2, pos: Pos::new(2, 1), value: 250 },
            GoldNugget { id: 3, pos: Pos::new(1, 1), value: 250 },
        ];
        let taken = collect_nuggets(&mut nuggets, Pos::new(1, 1));
        assert_eq!(taken.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(nuggets.len(), 1);
        assert_eq!(nuggets[0].id, 2);
    }
}
