/// Level layouts and the procedural generator.
///
/// A `LevelGenerator` produces a `LevelLayout` for a level number; the
/// simulation validates it and builds a `GameState` on top of it.
///
/// ## Procedural layout (W×H = 30×20)
///
///   - all dirt; digger at (1, 1)
///   - tunnels at (1,2) (2,1) (2,2) plus 2·level random tunnels
///     in x∈[3,W−3) y∈[3,H−3)
///   - 6 + 2·(level−1) emeralds in x∈[5,W−5) y∈[3,H−3), on dirt
///   - 4 + (level−1)/2 bags in x∈[6,W−6) y∈[4,H−4), on dirt;
///     every even-indexed bag gets a tunnel dug beneath it
///   - Nobbins at (W−2,1) facing left and (1,H−2) facing up, each with a
///     tunnel on its cell and the next one toward the edge
///   - level/2 extra enemies in x∈[5,W−5) y∈[5,H−5), Hobbin with
///     probability 0.1·level, never on an emerald or bag
///   - up to two portal pairs on distinct tunnel cells
///
/// ## Diagram legend (tests)
///   '#' = Dirt     '.' = Tunnel   'E' = Emerald
///   '$' = Bag      'D' = Digger   'C' = Cherry

use std::ops::Range;

use log::{error, warn};

use crate::domain::entity::{Enemy, GoldBag, IdAllocator, Portal, PortalColor};
use crate::domain::grid::{Direction, Grid, Pos, GRID_HEIGHT, GRID_WIDTH};
use crate::domain::rng::{self, RandomSource};
use crate::domain::rules::{self, START_POS};
use crate::domain::tile::Tile;
use crate::error::SimError;

const BASE_TUNNELS: [Pos; 3] = [Pos::new(1, 2), Pos::new(2, 1), Pos::new(2, 2)];
const PORTAL_PAIRS: usize = 2;
const HOBBIN_CHANCE_PER_LEVEL: f64 = 0.1;
/// Placement retries per requested item before giving up on it.
const PLACEMENT_ATTEMPTS: usize = 40;

/// Everything a level starts with.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelLayout {
    pub grid: Grid,
    pub start: Pos,
    pub bags: Vec<GoldBag>,
    pub emeralds: Vec<Pos>,
    pub enemies: Vec<Enemy>,
    pub portals: Vec<Portal>,
    pub cherry_spawn_time: u32,
    /// Id source positioned after every id the layout used.
    pub ids: IdAllocator,
}

pub trait LevelGenerator {
    fn generate(&self, level: u32, rng: &mut dyn RandomSource) -> LevelLayout;
}

// ══════════════════════════════════════════════════════════════
// Validation
// ══════════════════════════════════════════════════════════════

impl LevelLayout {
    /// Check the tile ↔ registry mirrors a fresh level must satisfy.
    pub fn validate(&self) -> Result<(), SimError> {
        let g = &self.grid;
        let in_bounds = |p: Pos| p.x < g.width() && p.y < g.height();

        let diggers = g.positions_of(Tile::Digger);
        if diggers != [self.start] {
            return Err(SimError::InvalidLayout(format!(
                "expected one digger tile at ({}, {}), found {}",
                self.start.x, self.start.y, diggers.len(),
            )));
        }

        for b in &self.bags {
            if g.get(b.pos) != Some(Tile::Gold) {
                return Err(SimError::InvalidLayout(format!("bag {} at ({}, {}) is not on gold", b.id, b.pos.x, b.pos.y)));
            }
        }
        if g.count(Tile::Gold) != self.bags.len() {
            return Err(SimError::InvalidLayout("gold tiles without a bag".into()));
        }

        for &e in &self.emeralds {
            if g.get(e) != Some(Tile::Emerald) {
                return Err(SimError::InvalidLayout(format!("emerald at ({}, {}) has no tile", e.x, e.y)));
            }
        }
        if g.count(Tile::Emerald) != self.emeralds.len() {
            return Err(SimError::InvalidLayout("emerald tiles missing from the list".into()));
        }

        if let Some(e) = self.enemies.iter().find(|e| !in_bounds(e.pos)) {
            return Err(SimError::InvalidLayout(format!("enemy {} out of bounds", e.id)));
        }
        if self.portals.iter().any(|p| !in_bounds(p.entry) || !in_bounds(p.exit)) {
            return Err(SimError::InvalidLayout("portal out of bounds".into()));
        }
        Ok(())
    }
}

/// Generate and validate the layout for `level`. An invalid layout is
/// logged and still used once its digger tile is in place.
pub fn build_level(generator: &dyn LevelGenerator, level: u32, rng: &mut dyn RandomSource) -> LevelLayout {
    let mut layout = generator.generate(level, rng);
    if let Err(e) = layout.validate() {
        error!("level {level}: {e}");
        if layout.grid.get(layout.start) != Some(Tile::Digger) {
            layout.grid.set_tile(layout.start, Tile::Digger);
        }
    }
    layout
}

// ══════════════════════════════════════════════════════════════
// Procedural generator
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default)]
pub struct ProceduralGenerator;

impl LevelGenerator for ProceduralGenerator {
    fn generate(&self, level: u32, rng: &mut dyn RandomSource) -> LevelLayout {
        let level = level.max(1);
        let (w, h) = (GRID_WIDTH, GRID_HEIGHT);
        let mut grid = Grid::default();
        let mut ids = IdAllocator::starting_at(1);

        grid.set_tile(START_POS, Tile::Digger);

        // ── Tunnels ──
        for p in BASE_TUNNELS {
            grid.set_tile(p, Tile::Tunnel);
        }
        for _ in 0..level * 2 {
            let p = random_cell(rng, 3..w - 3, 3..h - 3);
            grid.set_tile(p, Tile::Tunnel);
        }

        // ── Emeralds ──
        let emerald_count = 6 + 2 * (level as usize - 1);
        let emeralds = place_on_dirt(&mut grid, rng, emerald_count, 5..w - 5, 3..h - 3, Tile::Emerald);
        if emeralds.len() < emerald_count {
            warn!("level {level}: placed {} of {emerald_count} emeralds", emeralds.len());
        }

        // ── Bags ──
        let bag_count = 4 + (level as usize - 1) / 2;
        let bag_cells = place_on_dirt(&mut grid, rng, bag_count, 6..w - 6, 4..h - 4, Tile::Gold);
        for (i, &p) in bag_cells.iter().enumerate() {
            if i % 2 == 0 {
                if let Some(below) = grid.offset(p, 0, 1) {
                    if grid.get(below) == Some(Tile::Dirt) {
                        grid.set_tile(below, Tile::Tunnel);
                    }
                }
            }
        }
        let bags = bag_cells.into_iter().map(|p| GoldBag::new(ids.next_id(), p)).collect();

        // ── Enemies ──
        let transform = rules::transform_time_for_level(level);
        let mut enemies = vec![
            Enemy::nobbin(ids.next_id(), Pos::new(w - 2, 1), Direction::Left, transform),
            Enemy::nobbin(ids.next_id(), Pos::new(1, h - 2), Direction::Up, transform),
        ];
        for p in [Pos::new(w - 2, 1), Pos::new(w - 1, 1), Pos::new(1, h - 2), Pos::new(1, h - 1)] {
            grid.set_tile(p, Tile::Tunnel);
        }

        let hobbin_chance = HOBBIN_CHANCE_PER_LEVEL * level as f64;
        for _ in 0..level / 2 {
            let spot = (0..PLACEMENT_ATTEMPTS)
                .map(|_| random_cell(rng, 5..w - 5, 5..h - 5))
                .find(|&p| {
                    !matches!(grid.get(p), Some(Tile::Emerald | Tile::Gold))
                        && !enemies.iter().any(|e| e.pos == p)
                });
            let Some(p) = spot else {
                warn!("level {level}: no room for an extra enemy");
                continue;
            };
            let dir = rng::pick(rng, &Direction::ALL).unwrap_or(Direction::Up);
            let enemy = if rng.chance(hobbin_chance) {
                Enemy::hobbin(ids.next_id(), p, dir)
            } else {
                Enemy::nobbin(ids.next_id(), p, dir, transform)
            };
            grid.set_tile(p, Tile::Tunnel);
            enemies.push(enemy);
        }

        let portals = place_portals(&grid, rng);

        LevelLayout {
            grid,
            start: START_POS,
            bags,
            emeralds,
            enemies,
            portals,
            cherry_spawn_time: rules::cherry_countdown(rng),
            ids,
        }
    }
}

fn random_cell(rng: &mut dyn RandomSource, xs: Range<usize>, ys: Range<usize>) -> Pos {
    let x = rng.range(xs.start as u32, xs.end as u32) as usize;
    let y = rng.range(ys.start as u32, ys.end as u32) as usize;
    Pos::new(x, y)
}

/// Turn up to `count` random dirt cells of the region into `tile`.
fn place_on_dirt(
    grid: &mut Grid,
    rng: &mut dyn RandomSource,
    count: usize,
    xs: Range<usize>,
    ys: Range<usize>,
    tile: Tile,
) -> Vec<Pos> {
    let mut placed = Vec::with_capacity(count);
    let mut attempts = count * PLACEMENT_ATTEMPTS;
    while placed.len() < count && attempts > 0 {
        attempts -= 1;
        let p = random_cell(rng, xs.clone(), ys.clone());
        if grid.get(p) == Some(Tile::Dirt) {
            grid.set_tile(p, tile);
            placed.push(p);
        }
    }
    placed
}

/// Up to two bidirectional pairs on distinct tunnel cells. A pair is
/// skipped when fewer than two free tunnels remain.
fn place_portals(grid: &Grid, rng: &mut dyn RandomSource) -> Vec<Portal> {
    let mut free = grid.positions_of(Tile::Tunnel);
    let mut portals = Vec::new();
    for color in PortalColor::CYCLE.into_iter().take(PORTAL_PAIRS) {
        if free.len() < 2 {
            warn!("not enough tunnel cells for a {color:?} portal pair");
            break;
        }
        let entry = free.swap_remove(rng.below(free.len()));
        let exit = free.swap_remove(rng.below(free.len()));
        portals.push(Portal { entry, exit, color });
    }
    portals
}

// ══════════════════════════════════════════════════════════════
// Diagram layouts (tests)
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
impl LevelLayout {
    /// Layout read from glyph rows: '$' cells become bags, 'E' cells
    /// emeralds, the 'D' cell the start. No enemies or portals.
    pub fn from_rows(rows: &[&str]) -> Self {
        let grid = Grid::from_rows(rows);
        let mut ids = IdAllocator::starting_at(1);
        let bags = grid.positions_of(Tile::Gold).into_iter().map(|p| GoldBag::new(ids.next_id(), p)).collect();
        let emeralds = grid.positions_of(Tile::Emerald);
        let start = grid.positions_of(Tile::Digger).first().copied().unwrap_or(START_POS);
        LevelLayout {
            grid,
            start,
            bags,
            emeralds,
            enemies: Vec::new(),
            portals: Vec::new(),
            cherry_spawn_time: rules::CHERRY_SPAWN_MAX,
            ids,
        }
    }
}

/// Hands out clones of one layout regardless of level.
#[cfg(test)]
pub struct FixedLayout(pub LevelLayout);

#[cfg(test)]
impl LevelGenerator for FixedLayout {
    fn generate(&self, _level: u32, _rng: &mut dyn RandomSource) -> LevelLayout {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::EnemyKind;
    use crate::domain::rng::PcgRandom;

    fn generate(level: u32, seed: u64) -> LevelLayout {
        ProceduralGenerator.generate(level, &mut PcgRandom::seeded(seed))
    }

    #[test]
    fn generated_levels_validate() {
        for level in 1..=8 {
            for seed in 0..10 {
                let layout = generate(level, seed);
                assert_eq!(layout.validate(), Ok(()), "level {level} seed {seed}");
            }
        }
    }

    #[test]
    fn counts_scale_with_level() {
        for level in 1..=6u32 {
            let layout = generate(level, 99);
            assert_eq!(layout.emeralds.len(), 6 + 2 * (level as usize - 1));
            assert_eq!(layout.bags.len(), 4 + (level as usize - 1) / 2);
            assert_eq!(layout.enemies.len(), 2 + level as usize / 2);
        }
    }

    #[test]
    fn digger_starts_top_left_with_base_tunnels() {
        let layout = generate(1, 3);
        assert_eq!(layout.start, Pos::new(1, 1));
        assert_eq!(layout.grid.get(Pos::new(1, 1)), Some(Tile::Digger));
        for p in BASE_TUNNELS {
            // A bag or emerald never lands this close to the corner
            assert_eq!(layout.grid.get(p), Some(Tile::Tunnel));
        }
    }

    #[test]
    fn corner_nobbins_have_room() {
        let layout = generate(3, 5);
        let first = &layout.enemies[0];
        let second = &layout.enemies[1];
        assert_eq!((first.pos, first.direction), (Pos::new(28, 1), Some(Direction::Left)));
        assert_eq!((second.pos, second.direction), (Pos::new(1, 18), Some(Direction::Up)));
        assert_eq!(first.kind, EnemyKind::Nobbin);
        assert_eq!(first.transform_timer, 45);
        assert_eq!(layout.grid.get(Pos::new(29, 1)), Some(Tile::Tunnel));
        assert_eq!(layout.grid.get(Pos::new(1, 19)), Some(Tile::Tunnel));
    }

    #[test]
    fn portals_sit_on_distinct_tunnels() {
        let layout = generate(2, 11);
        assert_eq!(layout.portals.len(), 2);
        let mut ends: Vec<Pos> = layout.portals.iter().flat_map(|p| [p.entry, p.exit]).collect();
        for &p in &ends {
            assert_eq!(layout.grid.get(p), Some(Tile::Tunnel));
        }
        ends.sort();
        ends.dedup();
        assert_eq!(ends.len(), 4);
        assert_eq!(layout.portals[0].color, PortalColor::Blue);
        assert_eq!(layout.portals[1].color, PortalColor::Orange);
    }

    #[test]
    fn portals_skipped_without_tunnels() {
        let grid = Grid::from_rows(&["D.##"]);
        let mut rng = PcgRandom::seeded(1);
        assert!(place_portals(&grid, &mut rng).is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let layout = generate(6, 21);
        let mut ids: Vec<u32> = layout.bags.iter().map(|b| b.id).chain(layout.enemies.iter().map(|e| e.id)).collect();
        let n = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), n);
        let mut alloc = layout.ids;
        assert!(alloc.next_id() > *ids.last().unwrap());
    }

    #[test]
    fn same_seed_same_layout() {
        assert_eq!(generate(4, 1234), generate(4, 1234));
    }

    #[test]
    fn cherry_countdown_in_range() {
        let layout = generate(1, 8);
        assert!((80..200).contains(&layout.cherry_spawn_time));
    }

    #[test]
    fn validate_rejects_orphan_gold() {
        let mut layout = LevelLayout::from_rows(&["D.$"]);
        layout.bags.clear();
        assert!(matches!(layout.validate(), Err(SimError::InvalidLayout(_))));
    }

    #[test]
    fn validate_rejects_missing_digger() {
        let mut layout = LevelLayout::from_rows(&["D.E"]);
        layout.grid.set_tile(Pos::new(0, 0), Tile::Tunnel);
        assert!(layout.validate().is_err());
    }

    #[test]
    fn build_level_repairs_missing_digger() {
        let mut layout = LevelLayout::from_rows(&["D.E"]);
        layout.grid.set_tile(Pos::new(0, 0), Tile::Tunnel);
        let gen = FixedLayout(layout);
        let built = build_level(&gen, 1, &mut PcgRandom::seeded(0));
        assert_eq!(built.grid.get(Pos::new(0, 0)), Some(Tile::Digger));
    }
}
