/// The tick function: advances a Playing snapshot by one fixed interval.
///
/// Processing order:
///   1. Counters (fireball cooldown, power mode) count down
///   2. Cherry countdown / placement
///   3. Cherry pickup
///   4. Level-complete check (short-circuits the rest)
///   5. Bag gravity, then nugget pickup
///   6. Fireballs
///   7. Enemies (skipped if a bag already killed the digger)
///   8. Death resolution
///
/// Resolvers work on the new snapshot in place; `prev` is only cloned.

use log::{debug, info, trace};

use crate::domain::ai;
use crate::domain::combat;
use crate::domain::grid::Direction;
use crate::domain::physics::{self, BagOutcome};
use crate::domain::rng::{self, RandomSource};
use crate::domain::rules::{self, LEVEL_COMPLETE_BONUS, LEVEL_TRANSITION_TIME};
use crate::domain::tile::Tile;

use super::event::GameEvent;
use super::world::{Cherry, Digger, GameState, Phase};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn tick(prev: &GameState, rng: &mut dyn RandomSource) -> (GameState, Vec<GameEvent>) {
    if let Err(e) = prev.ensure_live() {
        trace!("tick skipped: {e}");
        return (prev.clone(), Vec::new());
    }

    let mut s = prev.clone();
    let mut events = Vec::new();
    s.tick += 1;
    s.fireball_cooldown = s.fireball_cooldown.saturating_sub(1);
    s.power_mode = s.power_mode.saturating_sub(1);

    resolve_cherry_timer(&mut s, rng, &mut events);
    s.pick_up_cherry(rng, &mut events);

    if s.emeralds.is_empty() {
        complete_level(&mut s, &mut events);
        return (s, events);
    }

    let mut killed = resolve_bags(&mut s, rng, &mut events);
    s.pick_up_nuggets(&mut events);
    resolve_fireballs(&mut s, &mut events);
    if !killed {
        killed = resolve_enemies(&mut s, rng, &mut events);
    }
    if killed {
        kill_digger(&mut s, rng, &mut events);
    }

    (s, events)
}

// ══════════════════════════════════════════════════════════════
// Cherry
// ══════════════════════════════════════════════════════════════

fn resolve_cherry_timer(s: &mut GameState, rng: &mut dyn RandomSource, events: &mut Vec<GameEvent>) {
    if s.cherry.is_active() {
        return;
    }
    s.cherry.spawn_time = s.cherry.spawn_time.saturating_sub(1);
    if s.cherry.spawn_time > 0 {
        return;
    }

    let candidates: Vec<_> = s
        .grid
        .positions_of(Tile::Tunnel)
        .into_iter()
        .filter(|&p| p != s.digger.pos && s.enemy_at(p).is_none())
        .collect();

    match rng::pick(rng, &candidates) {
        Some(at) => {
            s.grid.set_tile(at, Tile::Cherry);
            s.cherry.pos = Some(at);
            debug!("cherry placed at ({}, {})", at.x, at.y);
            events.push(GameEvent::CherrySpawned { at });
        }
        None => {
            s.cherry.spawn_time = rules::cherry_countdown(rng);
            debug!("no room for a cherry, retrying in {} ticks", s.cherry.spawn_time);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Level complete
// ══════════════════════════════════════════════════════════════

fn complete_level(s: &mut GameState, events: &mut Vec<GameEvent>) {
    s.score = s.score.saturating_add(LEVEL_COMPLETE_BONUS);
    s.phase = Phase::LevelCompleting;
    s.transition_timer = LEVEL_TRANSITION_TIME;
    info!("level {} complete, score {}", s.level, s.score);
    events.push(GameEvent::LevelComplete { level: s.level, bonus: LEVEL_COMPLETE_BONUS });
}

// ══════════════════════════════════════════════════════════════
// Bags
// ══════════════════════════════════════════════════════════════

/// Returns true if a bag crushed the digger.
fn resolve_bags(s: &mut GameState, rng: &mut dyn RandomSource, events: &mut Vec<GameEvent>) -> bool {
    let digger = s.digger_on_board();
    let report = physics::resolve_bags(&mut s.grid, &mut s.bags, &mut s.nuggets, digger, &mut s.ids, rng);
    s.score = s.score.saturating_add(report.points);
    for outcome in report.outcomes {
        events.push(match outcome {
            BagOutcome::Fell { id, to, started } => GameEvent::BagFell { id, to, started },
            BagOutcome::Landed { id, at } => GameEvent::BagLanded { id, at },
            BagOutcome::Broke { id, at, nuggets } => GameEvent::BagBroke { id, at, nuggets: nuggets.len() },
        });
    }
    report.digger_crushed
}

// ══════════════════════════════════════════════════════════════
// Fireballs
// ══════════════════════════════════════════════════════════════

fn resolve_fireballs(s: &mut GameState, events: &mut Vec<GameEvent>) {
    let report = combat::resolve_fireballs(&s.grid, &mut s.fireballs, &mut s.enemies);
    s.score = s.score.saturating_add(report.points);
    for hit in report.hits {
        events.push(GameEvent::EnemyKilled { id: hit.enemy, at: hit.at });
    }
    for id in report.fizzled {
        events.push(GameEvent::FireballFizzled { id });
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

/// Returns true if an enemy killed the digger.
fn resolve_enemies(s: &mut GameState, rng: &mut dyn RandomSource, events: &mut Vec<GameEvent>) -> bool {
    let power = s.is_power_mode();
    let report = ai::resolve_enemies(&s.grid, &mut s.enemies, s.digger.pos, power, rng);
    s.score = s.score.saturating_add(report.points);
    for id in report.transformed {
        events.push(GameEvent::EnemyTransformed { id });
    }
    for (id, at) in report.eaten {
        events.push(GameEvent::EnemyEaten { id, at });
    }
    report.digger_killed
}

// ══════════════════════════════════════════════════════════════
// Death
// ══════════════════════════════════════════════════════════════

/// Apply a death on top of this tick's results. Score and entity changes
/// stand; the digger's own state is reset.
fn kill_digger(s: &mut GameState, rng: &mut dyn RandomSource, events: &mut Vec<GameEvent>) {
    let at = s.digger.pos;
    s.lives = s.lives.saturating_sub(1);
    s.fireballs.clear();
    s.fireball_cooldown = 0;
    s.emerald_streak = 0;
    s.power_mode = 0;
    events.push(GameEvent::DiggerDied { at, lives_left: s.lives });

    if s.lives == 0 {
        // Board stays as it was at the moment of death.
        s.phase = Phase::GameOver;
        info!("game over at level {} with {} points", s.level, s.score);
        events.push(GameEvent::GameOver { score: s.score });
        return;
    }

    info!("digger died at ({}, {}), {} lives left", at.x, at.y, s.lives);
    if s.grid.get(at) == Some(Tile::Digger) {
        s.grid.set_tile(at, Tile::Tunnel);
    }
    clear_start(s, rng);
    s.digger = Digger { pos: s.start, facing: Direction::Right };
    s.phase = Phase::Respawning;
}

/// Empty the start cell for the respawn, dropping whatever registry entry
/// mirrored its tile.
fn clear_start(s: &mut GameState, rng: &mut dyn RandomSource) {
    let start = s.start;
    match s.grid.get(start) {
        Some(Tile::Gold) => s.bags.retain(|b| b.pos != start),
        Some(Tile::Emerald) => s.emeralds.retain(|&e| e != start),
        Some(Tile::Cherry) => s.cherry = Cherry::waiting(rules::cherry_countdown(rng)),
        _ => {}
    }
    s.grid.set_tile(start, Tile::Tunnel);
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;
    use crate::domain::rng::PcgRandom;
    use crate::sim::control;
    use crate::sim::level::{LevelGenerator, ProceduralGenerator};
    use crate::sim::transition;

    fn apply(s: &GameState, cmd: u8, rng: &mut PcgRandom) -> GameState {
        match cmd {
            0 => control::move_digger(s, Direction::Up, rng).0,
            1 => control::move_digger(s, Direction::Down, rng).0,
            2 => control::move_digger(s, Direction::Left, rng).0,
            3 => control::move_digger(s, Direction::Right, rng).0,
            4 => control::fire(s).0,
            5 => transition::finish_respawn(s).0,
            _ => tick(s, rng).0,
        }
    }

    proptest! {
        #[test]
        fn random_play_keeps_board_consistent(
            seed in any::<u64>(),
            level in 1u32..6,
            cmds in prop::collection::vec(0u8..10, 1..300),
        ) {
            let mut rng = PcgRandom::seeded(seed);
            let layout = ProceduralGenerator.generate(level, &mut rng);
            let mut s = GameState::from_layout(layout, level, 0, 3);
            for cmd in cmds {
                let next = apply(&s, cmd, &mut rng);
                prop_assert!(next.invariant_violations().is_empty(), "{:?}", next.invariant_violations());
                prop_assert!(next.score >= s.score);
                prop_assert!(next.lives <= s.lives);
                s = next;
            }
        }

        #[test]
        fn frozen_phases_ignore_ticks(seed in any::<u64>(), phase in 0u8..4) {
            let mut rng = PcgRandom::seeded(seed);
            let mut s = GameState::first_level(ProceduralGenerator.generate(1, &mut rng));
            match phase {
                0 => s.phase = Phase::Respawning,
                1 => s.phase = Phase::LevelCompleting,
                2 => s.phase = Phase::GameOver,
                _ => s.paused = true,
            }
            let (next, events) = tick(&s, &mut rng);
            prop_assert_eq!(next, s);
            prop_assert!(events.is_empty());
        }
    }
}
