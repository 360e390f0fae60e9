/// Fireball travel and enemy hits.
///
/// Each fireball advances one cell along its fixed direction:
///   - off the grid, into dirt, or into a bag → fizzles
///   - onto an enemy → both removed, +ENEMY_POINTS
///   - otherwise → moves
///
/// An enemy hit by one fireball is gone before the next fireball moves,
/// so two shots never score the same enemy.

use log::debug;

use super::entity::{Enemy, EntityId, Fireball};
use super::grid::{Grid, Pos};
use super::rules::ENEMY_POINTS;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hit {
    pub fireball: EntityId,
    pub enemy: EntityId,
    pub at: Pos,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CombatReport {
    pub hits: Vec<Hit>,
    pub fizzled: Vec<EntityId>,
    pub points: u32,
}

pub fn resolve_fireballs(
    grid: &Grid,
    fireballs: &mut Vec<Fireball>,
    enemies: &mut Vec<Enemy>,
) -> CombatReport {
    let mut report = CombatReport::default();
    let mut spent: Vec<EntityId> = Vec::new();

    for fb in fireballs.iter_mut() {
        let dest = match grid.neighbor(fb.pos, fb.direction) {
            Some(p) => p,
            None => {
                spent.push(fb.id);
                report.fizzled.push(fb.id);
                continue;
            }
        };

        if grid.get(dest).is_some_and(|t| t.stops_fireball()) {
            spent.push(fb.id);
            report.fizzled.push(fb.id);
            continue;
        }

        if let Some(i) = enemies.iter().position(|e| e.pos == dest) {
            let enemy = enemies.remove(i);
            debug!("fireball {} hit enemy {} at ({}, {})", fb.id, enemy.id, dest.x, dest.y);
            spent.push(fb.id);
            report.points += ENEMY_POINTS;
            report.hits.push(Hit { fireball: fb.id, enemy: enemy.id, at: dest });
            continue;
        }

        fb.pos = dest;
    }

    if !spent.is_empty() {
        fireballs.retain(|f| !spent.contains(&f.id));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Direction;

    fn fireball(id: EntityId, x: usize, y: usize, dir: Direction) -> Fireball {
        Fireball { id, pos: Pos::new(x, y), direction: dir }
    }

    fn nobbin(id: EntityId, x: usize, y: usize) -> Enemy {
        Enemy::nobbin(id, Pos::new(x, y), Direction::Up, 50)
    }

    #[test]
    fn fireball_travels_through_tunnel() {
        let g = Grid::from_rows(&["......"]);
        let mut fbs = vec![fireball(1, 0, 0, Direction::Right)];
        let mut enemies = vec![];
        for x in 1..=3 {
            let r = resolve_fireballs(&g, &mut fbs, &mut enemies);
            assert!(r.hits.is_empty());
            assert_eq!(fbs[0].pos, Pos::new(x, 0));
        }
    }

    #[test]
    fn fireball_fizzles_on_dirt_gold_and_edge() {
        let g = Grid::from_rows(&[".#.$."]);
        let mut fbs = vec![
            fireball(1, 0, 0, Direction::Right), // into dirt
            fireball(2, 2, 0, Direction::Right), // into gold
            fireball(3, 4, 0, Direction::Right), // off the edge
        ];
        let mut enemies = vec![];
        let r = resolve_fireballs(&g, &mut fbs, &mut enemies);
        assert!(fbs.is_empty());
        assert_eq!(r.fizzled, vec![1, 2, 3]);
        assert_eq!(r.points, 0);
    }

    #[test]
    fn fireball_passes_over_emeralds() {
        let g = Grid::from_rows(&[".E."]);
        let mut fbs = vec![fireball(1, 0, 0, Direction::Right)];
        resolve_fireballs(&g, &mut fbs, &mut vec![]);
        assert_eq!(fbs[0].pos, Pos::new(1, 0));
    }

    #[test]
    fn fireball_kills_enemy() {
        let g = Grid::from_rows(&["...."]);
        let mut fbs = vec![fireball(1, 1, 0, Direction::Right)];
        let mut enemies = vec![nobbin(7, 2, 0), nobbin(8, 3, 0)];
        let r = resolve_fireballs(&g, &mut fbs, &mut enemies);
        assert!(fbs.is_empty());
        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].id, 8);
        assert_eq!(r.points, 250);
        assert_eq!(r.hits, vec![Hit { fireball: 1, enemy: 7, at: Pos::new(2, 0) }]);
    }

    #[test]
    fn two_fireballs_do_not_score_one_enemy_twice() {
        let g = Grid::from_rows(&[
            ".....",
            ".....",
            ".....",
        ]);
        let mut fbs = vec![
            fireball(1, 1, 1, Direction::Right),
            fireball(2, 2, 0, Direction::Down),
        ];
        let mut enemies = vec![nobbin(5, 2, 1)];
        let r = resolve_fireballs(&g, &mut fbs, &mut enemies);
        assert_eq!(r.points, 250);
        assert!(enemies.is_empty());
        // The second fireball finds the cell empty and moves on
        assert_eq!(fbs.len(), 1);
        assert_eq!(fbs[0].id, 2);
        assert_eq!(fbs[0].pos, Pos::new(2, 1));
    }
}
