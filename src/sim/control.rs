/// Digger controller: the input entry points applied between ticks.
///
/// ## Move truth table (target cell one step in `dir`)
///
/// ┌──────────────────────┬──────────────────────────────────────────┐
/// │ Target               │ Result                                   │
/// ├──────────────────────┼──────────────────────────────────────────┤
/// │ off the grid         │ facing only                              │
/// │ Dirt / Tunnel        │ move (dig), streak reset                 │
/// │ Cherry               │ move, streak reset, cherry collected     │
/// │ Emerald              │ move, streak + 1, 25 × 2^(streak−1)      │
/// │ Gold, horizontal,    │ bag pushed one cell, digger steps in     │
/// │   tunnel beyond      │                                          │
/// │ Gold otherwise       │ facing only                              │
/// │ anything else        │ facing only, streak reset                │
/// └──────────────────────┴──────────────────────────────────────────┘
///
/// After any move: nuggets under the digger are collected, and landing on
/// a portal endpoint sends the digger to the partner endpoint (unless a
/// bag sits there).
///
/// Every entry point rejects input unless the game is unpaused and
/// Playing; a rejected call returns the snapshot unchanged.

use log::{debug, trace};

use crate::domain::entity::Fireball;
use crate::domain::grid::{Direction, Pos};
use crate::domain::rng::RandomSource;
use crate::domain::rules::{self, FIREBALL_COOLDOWN};
use crate::domain::tile::Tile;
use crate::error::SimError;

use super::event::GameEvent;
use super::world::GameState;

/// Move (or turn) the digger one cell.
pub fn move_digger(prev: &GameState, dir: Direction, rng: &mut dyn RandomSource) -> (GameState, Vec<GameEvent>) {
    if let Err(e) = prev.ensure_live() {
        trace!("move {dir:?} ignored: {e}");
        return (prev.clone(), Vec::new());
    }

    let mut s = prev.clone();
    let mut events = Vec::new();
    s.digger.facing = dir;

    let from = s.digger.pos;
    let Some(to) = s.grid.neighbor(from, dir) else {
        return (s, events);
    };

    match s.grid.get(to) {
        Some(t) if t.is_diggable() => {
            s.emerald_streak = 0;
            step_to(&mut s, to);
        }
        Some(Tile::Emerald) => {
            step_to(&mut s, to);
            s.emeralds.retain(|&e| e != to);
            s.emerald_streak += 1;
            let points = rules::emerald_points(s.emerald_streak);
            s.score = s.score.saturating_add(points);
            debug!("emerald at ({}, {}), streak {}, +{points}", to.x, to.y, s.emerald_streak);
            events.push(GameEvent::EmeraldCollected { at: to, streak: s.emerald_streak, points });
        }
        Some(Tile::Gold) => {
            if !push_bag(&mut s, to, dir, &mut events) {
                return (s, events);
            }
            step_to(&mut s, to);
        }
        _ => {
            s.emerald_streak = 0;
            return (s, events);
        }
    }

    s.pick_up_cherry(rng, &mut events);
    s.pick_up_nuggets(&mut events);
    teleport(&mut s, rng, &mut events);

    (s, events)
}

/// Launch a fireball into the cell ahead of the digger.
/// The cooldown restarts whether or not a fireball could be placed.
pub fn fire(prev: &GameState) -> (GameState, Vec<GameEvent>) {
    if let Err(e) = prev.ensure_live().and_then(|_| cooled_down(prev)) {
        trace!("fire ignored: {e}");
        return (prev.clone(), Vec::new());
    }

    let mut s = prev.clone();
    let mut events = Vec::new();
    s.fireball_cooldown = FIREBALL_COOLDOWN;

    let facing = s.digger.facing;
    let ahead = s
        .grid
        .neighbor(s.digger.pos, facing)
        .filter(|&p| s.grid.get(p).is_some_and(Tile::is_launchable));
    if let Some(at) = ahead {
        let id = s.ids.next_id();
        s.fireballs.push(Fireball { id, pos: at, direction: facing });
        debug!("fireball {id} launched {facing:?} from ({}, {})", at.x, at.y);
        events.push(GameEvent::FireballFired { id, at, direction: facing });
    }
    (s, events)
}

/// Flip the pause flag. Allowed in every phase except game over.
pub fn toggle_pause(prev: &GameState) -> (GameState, Vec<GameEvent>) {
    if prev.is_game_over() {
        trace!("pause ignored: {}", SimError::InvalidTransition("game is over"));
        return (prev.clone(), Vec::new());
    }
    let mut s = prev.clone();
    s.paused = !s.paused;
    let event = if s.paused { GameEvent::Paused } else { GameEvent::Resumed };
    (s, vec![event])
}

fn cooled_down(s: &GameState) -> Result<(), SimError> {
    if s.fireball_cooldown > 0 {
        Err(SimError::InvalidTransition("fireball cooling down"))
    } else {
        Ok(())
    }
}

fn step_to(s: &mut GameState, to: Pos) {
    let from = s.digger.pos;
    if s.grid.get(from) == Some(Tile::Digger) {
        s.grid.set_tile(from, Tile::Tunnel);
    }
    s.grid.set_tile(to, Tile::Digger);
    s.digger.pos = to;
}

/// Push the bag at `at` one cell along `dir`. Only sideways pushes into a
/// tunnel succeed; the pushed bag comes to rest.
fn push_bag(s: &mut GameState, at: Pos, dir: Direction, events: &mut Vec<GameEvent>) -> bool {
    if !dir.is_horizontal() {
        return false;
    }
    let Some(beyond) = s.grid.neighbor(at, dir) else {
        return false;
    };
    if s.grid.get(beyond) != Some(Tile::Tunnel) {
        return false;
    }
    let Some(bag) = s.bags.iter_mut().find(|b| b.pos == at) else {
        return false;
    };
    bag.pos = beyond;
    bag.settle();
    let id = bag.id;
    s.grid.set_tile(beyond, Tile::Gold);
    events.push(GameEvent::BagPushed { id, from: at, to: beyond });
    true
}

fn teleport(s: &mut GameState, rng: &mut dyn RandomSource, events: &mut Vec<GameEvent>) {
    let from = s.digger.pos;
    let Some(to) = s.portals.iter().find_map(|p| p.partner_of(from)) else {
        return;
    };
    if s.grid.get(to) == Some(Tile::Gold) {
        debug!("portal exit ({}, {}) blocked by a bag", to.x, to.y);
        return;
    }
    step_to(s, to);
    debug!("teleported ({}, {}) → ({}, {})", from.x, from.y, to.x, to.y);
    events.push(GameEvent::Teleported { from, to });
    s.pick_up_cherry(rng, events);
    s.pick_up_nuggets(events);
}
