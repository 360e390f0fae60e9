/// GameState: one complete snapshot of a running game.
///
/// ## Snapshot discipline
///
/// Transitions never mutate the snapshot they are handed. Each one clones
/// the previous state, works on the copy and returns it with its events:
///
///     (prev: &GameState, input) → (GameState, Vec<GameEvent>)
///
/// ## Tile ↔ registry mirrors
///
///   - each `Gold` tile ↔ exactly one bag at that position
///   - each entry of `emeralds` ↔ an `Emerald` tile
///   - at most one `Digger` tile, at `digger.pos`, and none while
///     respawning or after a crushing game over
///   - active cherry ↔ `Cherry` tile
///
/// ## Phase
///
///   Playing ──emeralds gone──→ LevelCompleting ──30 ticks──→ Playing (level+1)
///   Playing ──death──→ Respawning ──delay──→ Playing
///   any ──last life lost──→ GameOver
///
/// `paused` is orthogonal to the phase and freezes ticks and input.

use crate::domain::entity::{Enemy, Fireball, GoldBag, GoldNugget, IdAllocator, Portal};
use crate::domain::grid::{Direction, Grid, Pos};
use crate::domain::physics;
use crate::domain::rng::RandomSource;
use crate::domain::rules::{self, CHERRY_POINTS, INITIAL_LIVES, POWER_MODE_DURATION};
use crate::domain::tile::Tile;
use crate::error::SimError;

use super::event::GameEvent;
use super::level::LevelLayout;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Respawning,
    LevelCompleting,
    GameOver,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Digger {
    pub pos: Pos,
    pub facing: Direction,
}

/// The bonus cherry. `pos` is `Some` exactly while the cherry is on the
/// board; `spawn_time` counts down only while it is not.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cherry {
    pub pos: Option<Pos>,
    pub spawn_time: u32,
}

impl Cherry {
    pub fn waiting(spawn_time: u32) -> Self {
        Cherry { pos: None, spawn_time }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.pos.is_some()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    // ── Terrain ──
    pub grid: Grid,

    // ── Entities ──
    pub digger: Digger,
    pub bags: Vec<GoldBag>,
    pub nuggets: Vec<GoldNugget>,
    pub emeralds: Vec<Pos>,
    pub enemies: Vec<Enemy>,
    pub fireballs: Vec<Fireball>,
    pub cherry: Cherry,
    pub portals: Vec<Portal>,

    // ── Meta ──
    pub phase: Phase,
    pub paused: bool,
    pub score: u32,
    pub lives: u32,
    pub level: u32,
    pub tick: u64,

    // ── Counters (ticks) ──
    pub fireball_cooldown: u32,
    pub emerald_streak: u32,
    pub transition_timer: u32,
    pub power_mode: u32,

    // ── Spawn ──
    /// Where the digger starts the level and reappears after a death.
    pub start: Pos,
    pub ids: IdAllocator,
}

// ── Construction ──

impl GameState {
    /// A fresh Playing state on `layout`. Per-level counters start at zero.
    pub fn from_layout(layout: LevelLayout, level: u32, score: u32, lives: u32) -> Self {
        GameState {
            grid: layout.grid,
            digger: Digger { pos: layout.start, facing: Direction::Right },
            bags: layout.bags,
            nuggets: Vec::new(),
            emeralds: layout.emeralds,
            enemies: layout.enemies,
            fireballs: Vec::new(),
            cherry: Cherry::waiting(layout.cherry_spawn_time),
            portals: layout.portals,
            phase: Phase::Playing,
            paused: false,
            score,
            lives,
            level,
            tick: 0,
            fireball_cooldown: 0,
            emerald_streak: 0,
            transition_timer: 0,
            power_mode: 0,
            start: layout.start,
            ids: layout.ids,
        }
    }

    /// Level 1 with full lives and no score.
    pub fn first_level(layout: LevelLayout) -> Self {
        GameState::from_layout(layout, 1, 0, INITIAL_LIVES)
    }
}

// ── Phase queries ──

impl GameState {
    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    #[inline]
    pub fn is_respawning(&self) -> bool {
        self.phase == Phase::Respawning
    }

    #[inline]
    pub fn is_level_completing(&self) -> bool {
        self.phase == Phase::LevelCompleting
    }

    #[inline]
    pub fn is_power_mode(&self) -> bool {
        self.power_mode > 0
    }

    /// Ticks and digger input only apply to an unpaused Playing state.
    pub fn ensure_live(&self) -> Result<(), SimError> {
        if self.paused {
            return Err(SimError::InvalidTransition("game is paused"));
        }
        match self.phase {
            Phase::Playing => Ok(()),
            Phase::Respawning => Err(SimError::InvalidTransition("digger is respawning")),
            Phase::LevelCompleting => Err(SimError::InvalidTransition("level is completing")),
            Phase::GameOver => Err(SimError::InvalidTransition("game is over")),
        }
    }

    /// The digger's cell while it can be touched by bags and enemies.
    pub fn digger_on_board(&self) -> Option<Pos> {
        match self.phase {
            Phase::Playing | Phase::LevelCompleting => Some(self.digger.pos),
            Phase::Respawning | Phase::GameOver => None,
        }
    }

    pub fn enemy_at(&self, pos: Pos) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.pos == pos)
    }

    pub fn portal_at(&self, pos: Pos) -> Option<&Portal> {
        self.portals.iter().find(|p| p.touches(pos))
    }
}

// ── Pickups shared by the controller and the tick ──

impl GameState {
    /// Collect every nugget under the digger.
    pub(crate) fn pick_up_nuggets(&mut self, events: &mut Vec<GameEvent>) {
        for n in physics::collect_nuggets(&mut self.nuggets, self.digger.pos) {
            self.score = self.score.saturating_add(n.value);
            events.push(GameEvent::NuggetCollected { id: n.id, at: n.pos, value: n.value });
        }
    }

    /// Collect the cherry if it is active under the digger: +500, power
    /// mode, fresh countdown. A no-op otherwise, so callers may check freely.
    pub(crate) fn pick_up_cherry(&mut self, rng: &mut dyn RandomSource, events: &mut Vec<GameEvent>) {
        let Some(at) = self.cherry.pos else { return };
        if at != self.digger.pos {
            return;
        }
        if self.grid.get(at) == Some(Tile::Cherry) {
            self.grid.set_tile(at, Tile::Tunnel);
        }
        self.cherry = Cherry::waiting(rules::cherry_countdown(rng));
        self.score = self.score.saturating_add(CHERRY_POINTS);
        self.power_mode = POWER_MODE_DURATION;
        log::info!("cherry collected at ({}, {}), power mode on", at.x, at.y);
        events.push(GameEvent::CherryCollected { at });
        events.push(GameEvent::PowerModeStarted { ticks: POWER_MODE_DURATION });
    }
}

// ── Invariant checks (tests) ──

#[cfg(test)]
impl GameState {
    /// Every broken tile ↔ registry mirror, as readable messages.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut out = Vec::new();

        let diggers = self.grid.positions_of(Tile::Digger);
        if diggers.len() > 1 {
            out.push(format!("{} digger tiles", diggers.len()));
        }
        if let Some(&p) = diggers.first() {
            if p != self.digger.pos {
                out.push(format!("digger tile at {p:?} but digger at {:?}", self.digger.pos));
            }
        }

        let mut gold = self.grid.positions_of(Tile::Gold);
        let mut bags: Vec<Pos> = self.bags.iter().map(|b| b.pos).collect();
        gold.sort();
        bags.sort();
        if gold != bags {
            out.push(format!("gold tiles {gold:?} != bags {bags:?}"));
        }

        let mut emerald_tiles = self.grid.positions_of(Tile::Emerald);
        let mut emeralds = self.emeralds.clone();
        emerald_tiles.sort();
        emeralds.sort();
        if emerald_tiles != emeralds {
            out.push(format!("emerald tiles {emerald_tiles:?} != emeralds {emeralds:?}"));
        }

        for b in &self.bags {
            if !b.is_falling && b.fall_distance != 0 {
                out.push(format!("resting bag {} has fall distance {}", b.id, b.fall_distance));
            }
        }

        out
    }
}
