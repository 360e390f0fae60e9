/// Enemy AI: per-kind movement policy plus digger contact.
///
/// Two policies:
///   1. **Nobbin**: keeps walking its current direction; re-rolls a random
///      direction when blocked.
///   2. **Hobbin**: 75% of ticks re-aims along the dominant axis toward the
///      digger, otherwise keeps going; same blocked rule.
///
/// Neither digs: only tunnel and cherry cells (and the digger's own cell,
/// which is a contact) are walkable. A destination clamped back onto the
/// enemy's own cell by the grid edge counts as blocked.
///
/// Contact:
///   - walking into the digger: power mode → repelled (no move);
///     otherwise the digger dies and the enemy stays put
///   - after everyone moved, any enemy sharing the digger's cell:
///     power mode → eaten (+400); otherwise the digger dies
///
/// Once the digger is dead, remaining enemies freeze for the tick.

use log::debug;

use super::entity::{Enemy, EnemyKind, EntityId};
use super::grid::{Direction, Grid, Pos};
use super::rng::{self, RandomSource};
use super::rules::{HOBBIN_CHASE_CHANCE, POWER_MODE_ENEMY_POINTS};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AiReport {
    pub transformed: Vec<EntityId>,
    pub repelled: Vec<EntityId>,
    pub eaten: Vec<(EntityId, Pos)>,
    pub points: u32,
    pub digger_killed: bool,
}

/// Direction that closes the larger of the two axis gaps toward `target`.
/// Ties go vertical.
pub fn aim_at(from: Pos, target: Pos) -> Direction {
    let (dx, dy) = from.delta_to(target);
    if dx.abs() > dy.abs() {
        if dx > 0 { Direction::Right } else { Direction::Left }
    } else if dy > 0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

fn random_direction(rng: &mut dyn RandomSource) -> Direction {
    rng::pick(rng, &Direction::ALL).unwrap_or(Direction::Up)
}

/// The direction an enemy tries this tick.
fn intended_direction(enemy: &Enemy, digger: Pos, rng: &mut dyn RandomSource) -> Option<Direction> {
    match enemy.kind {
        EnemyKind::Nobbin => enemy.direction,
        EnemyKind::Hobbin => {
            if rng.chance(HOBBIN_CHASE_CHANCE) {
                Some(aim_at(enemy.pos, digger))
            } else {
                enemy.direction
            }
        }
    }
}

/// Move every enemy one step. `enemies` only holds survivors of this
/// tick's fireballs.
pub fn resolve_enemies(
    grid: &Grid,
    enemies: &mut Vec<Enemy>,
    digger: Pos,
    power_mode: bool,
    rng: &mut dyn RandomSource,
) -> AiReport {
    let mut report = AiReport::default();

    for enemy in enemies.iter_mut() {
        if report.digger_killed {
            break;
        }

        if enemy.tick_transform() {
            debug!("nobbin {} became a hobbin", enemy.id);
            report.transformed.push(enemy.id);
        }

        let dir = intended_direction(enemy, digger, rng);
        let dest = dir.map(|d| grid.clamped_neighbor(enemy.pos, d));
        let open = match dest {
            Some(p) if p != enemy.pos => grid.get(p).is_some_and(|t| t.is_walkable()),
            _ => false,
        };

        let dest = match (open, dest) {
            (true, Some(p)) => p,
            _ => {
                enemy.direction = Some(random_direction(rng));
                continue;
            }
        };

        if dest == digger {
            if power_mode {
                report.repelled.push(enemy.id);
            } else {
                debug!("enemy {} caught the digger at ({}, {})", enemy.id, dest.x, dest.y);
                report.digger_killed = true;
            }
            continue;
        }

        enemy.pos = dest;
        enemy.direction = dir;
    }

    // Contact sweep: covers enemies the digger walked into between ticks.
    let mut eaten_ids: Vec<EntityId> = Vec::new();
    for enemy in enemies.iter() {
        if enemy.pos != digger {
            continue;
        }
        if power_mode {
            debug!("digger ate enemy {}", enemy.id);
            eaten_ids.push(enemy.id);
            report.eaten.push((enemy.id, enemy.pos));
            report.points += POWER_MODE_ENEMY_POINTS;
        } else {
            report.digger_killed = true;
        }
    }
    if !eaten_ids.is_empty() {
        enemies.retain(|e| !eaten_ids.contains(&e.id));
    }

    report
}
