/// Rule constants and scoring formulas.
///
/// ## Scoring table
///
/// ┌──────────────────────────────┬──────────────────────────┐
/// │ Event                        │ Points                   │
/// ├──────────────────────────────┼──────────────────────────┤
/// │ Emerald (streak n ≥ 1)       │ 25 × 2^(n−1)             │
/// │ Bag breaks                   │ 25                       │
/// │ Gold nugget                  │ 250 (nugget value)       │
/// │ Enemy hit by fireball        │ 250                      │
/// │ Enemy eaten in power mode    │ 400                      │
/// │ Cherry                       │ 500                      │
/// │ Level complete               │ 1000                     │
/// └──────────────────────────────┴──────────────────────────┘
///
/// ## Timers (ticks unless noted)
///
/// ┌──────────────────────────────┬──────────────────────────┐
/// │ Timer                        │ Duration                 │
/// ├──────────────────────────────┼──────────────────────────┤
/// │ Tick period                  │ 150 ms                   │
/// │ Respawn delay                │ 1500 ms (real time)      │
/// │ Fireball cooldown            │ 3                        │
/// │ Power mode                   │ 60                       │
/// │ Level transition             │ 30                       │
/// │ Cherry countdown             │ uniform in [80, 200)     │
/// │ Nobbin → Hobbin              │ 60 − 5 × level           │
/// └──────────────────────────────┴──────────────────────────┘

use super::grid::Pos;
use super::rng::RandomSource;

pub const TICK_RATE_MS: u64 = 150;
pub const RESPAWN_DELAY_MS: u64 = 1500;

pub const INITIAL_LIVES: u32 = 3;
pub const START_POS: Pos = Pos::new(1, 1);

pub const FIREBALL_COOLDOWN: u32 = 3;
pub const ENEMY_POINTS: u32 = 250;
pub const POWER_MODE_ENEMY_POINTS: u32 = 400;
pub const HOBBIN_TRANSFORM_TIME: i32 = 60;

pub const EMERALD_BASE_POINTS: u32 = 25;
pub const EMERALD_STREAK_MULTIPLIER: u32 = 2;

pub const BAG_BREAK_POINTS: u32 = 25;
pub const GOLD_NUGGET_VALUE: u32 = 250;
pub const NUGGETS_MIN: usize = 1;
pub const NUGGETS_MAX: usize = 3;

pub const LEVEL_TRANSITION_TIME: u32 = 30;
pub const LEVEL_COMPLETE_BONUS: u32 = 1000;

pub const POWER_MODE_DURATION: u32 = 60;
pub const CHERRY_POINTS: u32 = 500;
pub const CHERRY_SPAWN_MIN: u32 = 80;
pub const CHERRY_SPAWN_MAX: u32 = 200;

/// Probability that a Hobbin re-aims at the digger on a given tick.
pub const HOBBIN_CHASE_CHANCE: f64 = 0.75;

/// Points for the `streak`-th consecutive emerald (streak ≥ 1).
/// Saturates instead of overflowing on absurd streaks.
pub fn emerald_points(streak: u32) -> u32 {
    let exp = streak.saturating_sub(1);
    EMERALD_STREAK_MULTIPLIER
        .checked_pow(exp)
        .and_then(|m| m.checked_mul(EMERALD_BASE_POINTS))
        .unwrap_or(u32::MAX)
}

/// A fresh cherry countdown in `[CHERRY_SPAWN_MIN, CHERRY_SPAWN_MAX)`.
pub fn cherry_countdown(rng: &mut dyn RandomSource) -> u32 {
    rng.range(CHERRY_SPAWN_MIN, CHERRY_SPAWN_MAX)
}

/// Nobbin transformation timer for a level. Deep levels go negative,
/// which means "transforms on the first tick".
pub fn transform_time_for_level(level: u32) -> i32 {
    HOBBIN_TRANSFORM_TIME - (level as i32).saturating_mul(5)
}
