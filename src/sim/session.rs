/// Single-threaded scheduler: owns the current snapshot and serializes
/// input commands with the timer-driven transitions.
///
/// Timers:
///   - physics tick: fixed period; drives `step::tick` while Playing and the
///     level-transition countdown while LevelCompleting
///   - respawn: one-shot real-time delay, armed when the digger dies
///
/// Every timer records the session epoch at scheduling time. `reset` bumps
/// the epoch, so a pending firing from the previous game is dropped instead
/// of touching the fresh one.

use std::time::{Duration, Instant};

use log::{debug, info, trace};

use crate::config::TimingConfig;
use crate::domain::grid::Direction;
use crate::domain::rng::RandomSource;

use super::control;
use super::event::GameEvent;
use super::level::LevelGenerator;
use super::step;
use super::transition;
use super::world::{GameState, Phase};

/// Discrete player input, already decoded from the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Fire,
    TogglePause,
    Restart,
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    due: Instant,
    epoch: u64,
}

pub struct Session {
    state: GameState,
    generator: Box<dyn LevelGenerator>,
    rng: Box<dyn RandomSource>,
    tick_rate: Duration,
    respawn_delay: Duration,
    epoch: u64,
    tick_timer: Timer,
    respawn_timer: Option<Timer>,
}

impl Session {
    pub fn new(
        generator: Box<dyn LevelGenerator>,
        mut rng: Box<dyn RandomSource>,
        timing: TimingConfig,
        now: Instant,
    ) -> Self {
        let (state, _) = transition::new_game(generator.as_ref(), rng.as_mut());
        Session {
            state,
            generator,
            rng,
            tick_rate: timing.tick_rate,
            respawn_delay: timing.respawn_delay,
            epoch: 0,
            tick_timer: Timer { due: now + timing.tick_rate, epoch: 0 },
            respawn_timer: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Apply one input command between ticks.
    pub fn handle(&mut self, cmd: Command, now: Instant) -> Vec<GameEvent> {
        trace!("command {cmd:?}");
        let (next, events) = match cmd {
            Command::Move(dir) => control::move_digger(&self.state, dir, self.rng.as_mut()),
            Command::Fire => control::fire(&self.state),
            Command::TogglePause => control::toggle_pause(&self.state),
            Command::Restart => return self.reset(now),
        };
        self.commit(next, now);
        events
    }

    /// Fire whichever timers are due at `now`. At most one physics tick
    /// runs per call; a late frame does not replay missed ticks.
    pub fn update(&mut self, now: Instant) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if let Some(timer) = self.respawn_timer {
            if now >= timer.due {
                self.respawn_timer = None;
                if timer.epoch == self.epoch && self.state.is_respawning() {
                    let (next, ev) = transition::finish_respawn(&self.state);
                    events.extend(ev);
                    self.commit(next, now);
                } else {
                    debug!("stale respawn timer dropped (epoch {})", timer.epoch);
                }
            }
        }

        if now >= self.tick_timer.due {
            let fired = self.tick_timer;
            self.tick_timer = Timer { due: now + self.tick_rate, epoch: self.epoch };
            if fired.epoch == self.epoch && !self.state.paused {
                let (next, ev) = match self.state.phase {
                    Phase::Playing => step::tick(&self.state, self.rng.as_mut()),
                    Phase::LevelCompleting => transition::advance_level_transition(
                        &self.state,
                        self.generator.as_ref(),
                        self.rng.as_mut(),
                    ),
                    Phase::Respawning | Phase::GameOver => (self.state.clone(), Vec::new()),
                };
                events.extend(ev);
                self.commit(next, now);
            }
        }

        events
    }

    /// Start a fresh game and invalidate every pending timer.
    pub fn reset(&mut self, now: Instant) -> Vec<GameEvent> {
        self.epoch += 1;
        self.respawn_timer = None;
        self.tick_timer = Timer { due: now + self.tick_rate, epoch: self.epoch };
        let (state, events) = transition::new_game(self.generator.as_ref(), self.rng.as_mut());
        info!("session reset (epoch {})", self.epoch);
        self.state = state;
        events
    }

    fn commit(&mut self, next: GameState, now: Instant) {
        let died = next.is_respawning() && !self.state.is_respawning();
        self.state = next;
        if died {
            debug!("respawn scheduled in {:?}", self.respawn_delay);
            self.respawn_timer = Some(Timer { due: now + self.respawn_delay, epoch: self.epoch });
        }
    }
}
