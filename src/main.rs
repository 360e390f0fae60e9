/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};

use config::{GameConfig, LogConfig};
use domain::rng::PcgRandom;
use sim::level::ProceduralGenerator;
use sim::session::Session;
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();
    init_logging(&config.log);

    let seed = config.seed.unwrap_or_else(clock_seed);
    info!("starting with seed {seed}, tick {:?}", config.timing.tick_rate);

    let mut session = Session::new(
        Box::new(ProceduralGenerator),
        Box::new(PcgRandom::seeded(seed)),
        config.timing,
        Instant::now(),
    );

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut session, &mut renderer);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    let s = session.state();
    println!();
    println!("Thanks for playing Digger!");
    println!("Final Score: {}  (level {})", s.score, s.level);
}

fn game_loop(session: &mut Session, renderer: &mut Renderer) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = InputState::new();

    loop {
        input.drain_events();
        if input.quit {
            info!("quit requested");
            break;
        }

        let now = Instant::now();
        let mut events = Vec::new();
        for &cmd in &input.commands {
            events.extend(session.handle(cmd, now));
        }
        events.extend(session.update(now));
        for event in &events {
            debug!("{event:?}");
        }

        renderer.render(session.state())?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Log records go to a file; the terminal belongs to the renderer.
/// `RUST_LOG` overrides the configured level.
fn init_logging(cfg: &LogConfig) {
    let file = match File::create(&cfg.file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {e}", cfg.file.display());
            return;
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cfg.level.as_str()))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .init();
    if std::env::var_os("RUST_LOG").is_some() {
        warn!("RUST_LOG set; configured level {:?} ignored", cfg.level);
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5eed)
}
