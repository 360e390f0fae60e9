/// Phase transitions driven by timers rather than by the tick:
/// respawn completion, the level-transition countdown, and a fresh game.

use log::{info, trace};

use crate::domain::rng::RandomSource;
use crate::domain::tile::Tile;
use crate::error::SimError;

use super::event::GameEvent;
use super::level::{self, LevelGenerator};
use super::world::{GameState, Phase};

/// End the respawn delay: the digger reappears at the start cell.
/// Runs whether or not the game is paused.
pub fn finish_respawn(prev: &GameState) -> (GameState, Vec<GameEvent>) {
    if !prev.is_respawning() {
        trace!("respawn finish ignored: {}", SimError::InvalidTransition("digger is not respawning"));
        return (prev.clone(), Vec::new());
    }
    let mut s = prev.clone();
    let at = s.digger.pos;
    if s.grid.get(at) == Some(Tile::Tunnel) {
        s.grid.set_tile(at, Tile::Digger);
    }
    s.phase = Phase::Playing;
    info!("digger respawned at ({}, {})", at.x, at.y);
    (s, vec![GameEvent::Respawned { at }])
}

/// One tick of the level-transition countdown. When it runs out the next
/// level is generated; score and lives carry over, per-level counters reset.
pub fn advance_level_transition(
    prev: &GameState,
    generator: &dyn LevelGenerator,
    rng: &mut dyn RandomSource,
) -> (GameState, Vec<GameEvent>) {
    if !prev.is_level_completing() || prev.paused {
        trace!("transition tick ignored: {}", SimError::InvalidTransition("no level transition running"));
        return (prev.clone(), Vec::new());
    }

    let timer = prev.transition_timer.saturating_sub(1);
    if timer > 0 {
        let mut s = prev.clone();
        s.transition_timer = timer;
        return (s, Vec::new());
    }

    let next_level = prev.level + 1;
    let layout = level::build_level(generator, next_level, rng);
    let s = GameState::from_layout(layout, next_level, prev.score, prev.lives);
    info!("level {next_level} started");
    (s, vec![GameEvent::LevelStarted { level: next_level }])
}

/// A fresh game: level 1, full lives, no score.
pub fn new_game(generator: &dyn LevelGenerator, rng: &mut dyn RandomSource) -> (GameState, Vec<GameEvent>) {
    let layout = level::build_level(generator, 1, rng);
    let s = GameState::first_level(layout);
    info!("new game");
    (s, vec![GameEvent::LevelStarted { level: 1 }])
}
