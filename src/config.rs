/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// ```toml
/// [timing]
/// tick_rate_ms = 150
/// respawn_delay_ms = 1500
///
/// [game]
/// seed = 12345          # omit for a time-derived seed
///
/// [log]
/// file = "digger.log"
/// level = "info"
/// ```
///
/// Rule constants (points, durations in ticks) are fixed and not read here.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::rules::{RESPAWN_DELAY_MS, TICK_RATE_MS};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    /// Fixed RNG seed; `None` derives one from the clock.
    pub seed: Option<u64>,
    pub log: LogConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    pub tick_rate: Duration,
    pub respawn_delay: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
    pub file: PathBuf,
    /// `env_logger` filter spec; `RUST_LOG` wins when set.
    pub level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_respawn_delay")]
    respawn_delay_ms: u64,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGame {
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_level")]
    level: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { TICK_RATE_MS }
fn default_respawn_delay() -> u64 { RESPAWN_DELAY_MS }
fn default_log_file() -> String { "digger.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            respawn_delay_ms: default_respawn_delay(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        GameConfig::from_toml(load_toml(&candidate_dirs()))
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        // A zero tick rate would spin the loop; clamp to 1 ms.
        let tick_ms = cfg.timing.tick_rate_ms.max(1);
        GameConfig {
            timing: TimingConfig {
                tick_rate: Duration::from_millis(tick_ms),
                respawn_delay: Duration::from_millis(cfg.timing.respawn_delay_ms),
            },
            seed: cfg.game.seed,
            log: LogConfig {
                file: PathBuf::from(cfg.log.file),
                level: cfg.log.level,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG config (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG config home (~/.config/digger)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".config/digger");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
/// Runs before the logger exists, so problems go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text),
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Warning: config.toml parse error: {e}");
            eprintln!("Using default settings.");
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(text: &str) -> GameConfig {
        GameConfig::from_toml(parse_toml(text))
    }

    #[test]
    fn empty_file_gives_defaults() {
        let c = config("");
        assert_eq!(c.timing.tick_rate, Duration::from_millis(150));
        assert_eq!(c.timing.respawn_delay, Duration::from_millis(1500));
        assert_eq!(c.seed, None);
        assert_eq!(c.log.file, PathBuf::from("digger.log"));
        assert_eq!(c.log.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let c = config(
            r#"
            [timing]
            tick_rate_ms = 100

            [game]
            seed = 42
            "#,
        );
        assert_eq!(c.timing.tick_rate, Duration::from_millis(100));
        assert_eq!(c.timing.respawn_delay, Duration::from_millis(1500));
        assert_eq!(c.seed, Some(42));
        assert_eq!(c.log.level, "info");
    }

    #[test]
    fn log_section_is_read() {
        let c = config(
            r#"
            [log]
            file = "/tmp/d.log"
            level = "debug"
            "#,
        );
        assert_eq!(c.log.file, PathBuf::from("/tmp/d.log"));
        assert_eq!(c.log.level, "debug");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let c = config("[timing\ntick_rate_ms = ");
        assert_eq!(c.timing.tick_rate, Duration::from_millis(TICK_RATE_MS));
        assert_eq!(c.seed, None);
    }

    #[test]
    fn zero_tick_rate_is_clamped() {
        let c = config("[timing]\ntick_rate_ms = 0");
        assert_eq!(c.timing.tick_rate, Duration::from_millis(1));
    }
}
