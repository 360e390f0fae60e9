/// Keyboard decoding.
///
/// Drains every pending terminal event once per frame and turns key
/// presses into session commands. Auto-repeat counts as a press, so a
/// held arrow keeps the digger moving at the terminal's repeat rate.
///
///   Arrows / WASD   move
///   F / Z           fire
///   Space / P       pause
///   R               restart (any time)
///   Q / Esc / ^C    quit

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::grid::Direction;
use crate::sim::session::Command;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Command(Command),
    Quit,
}

pub struct InputState {
    /// Commands decoded during the most recent drain, in arrival order.
    pub commands: Vec<Command>,
    pub quit: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            commands: Vec::with_capacity(8),
            quit: false,
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call this once per frame, before the session update.
    pub fn drain_events(&mut self) {
        self.commands.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.push_key(key);
            }
        }
    }

    fn push_key(&mut self, key: KeyEvent) {
        match decode(key) {
            Some(Action::Command(cmd)) => self.commands.push(cmd),
            Some(Action::Quit) => self.quit = true,
            None => {}
        }
    }
}

/// Map one key event to an action. Releases are ignored.
pub fn decode(key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::Quit),
            _ => None,
        };
    }

    let cmd = match key.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Command::Move(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Command::Move(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Command::Move(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Command::Move(Direction::Right),
        KeyCode::Char('f') | KeyCode::Char('F') | KeyCode::Char('z') | KeyCode::Char('Z') => Command::Fire,
        KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => Command::TogglePause,
        KeyCode::Char('r') | KeyCode::Char('R') => Command::Restart,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Some(Action::Quit),
        _ => return None,
    };
    Some(Action::Command(cmd))
}
