/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer only reads the snapshot; it never feeds back into the game.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{EnemyKind, PortalColor};
use crate::domain::grid::{Direction, Pos};
use crate::domain::tile::Tile;
use crate::sim::world::{GameState, Phase};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Glyphs ──

/// What occupies a board cell, topmost layer first:
/// digger, enemy, fireball, nugget, portal, then the terrain tile.
fn glyph_at(s: &GameState, pos: Pos) -> (char, Color) {
    if s.digger_on_board() == Some(pos) {
        let ch = match s.digger.facing {
            Direction::Up => '^',
            Direction::Down => 'v',
            Direction::Left => '<',
            Direction::Right => '>',
        };
        let fg = if s.is_power_mode() { Color::Rgb { r: 255, g: 80, b: 200 } } else { Color::Rgb { r: 80, g: 255, b: 80 } };
        return (ch, fg);
    }
    if let Some(e) = s.enemy_at(pos) {
        return match e.kind {
            EnemyKind::Nobbin => ('N', Color::Rgb { r: 255, g: 160, b: 60 }),
            EnemyKind::Hobbin => ('H', Color::Rgb { r: 255, g: 60, b: 60 }),
        };
    }
    if s.fireballs.iter().any(|f| f.pos == pos) {
        return ('*', Color::Rgb { r: 255, g: 120, b: 0 });
    }
    if s.nuggets.iter().any(|n| n.pos == pos) {
        return ('%', Color::Rgb { r: 255, g: 220, b: 50 });
    }
    if let Some(p) = s.portal_at(pos) {
        if s.grid.get(pos) == Some(Tile::Tunnel) {
            return ('O', portal_color(p.color));
        }
    }

    match s.grid.get(pos) {
        Some(Tile::Dirt) => ('░', Color::Rgb { r: 120, g: 80, b: 40 }),
        Some(Tile::Tunnel) | None => (' ', Color::White),
        Some(Tile::Emerald) => ('E', Color::Rgb { r: 0, g: 230, b: 120 }),
        Some(Tile::Gold) => ('$', Color::Rgb { r: 255, g: 200, b: 0 }),
        Some(Tile::Cherry) => ('C', Color::Rgb { r: 230, g: 30, b: 60 }),
        // A Digger tile with no digger on it: draw as the tile glyph
        Some(Tile::Digger) => (Tile::Digger.glyph(), Color::DarkGrey),
    }
}

fn portal_color(c: PortalColor) -> Color {
    match c {
        PortalColor::Blue => Color::Rgb { r: 60, g: 120, b: 255 },
        PortalColor::Orange => Color::Rgb { r: 255, g: 140, b: 0 },
        PortalColor::Green => Color::Rgb { r: 60, g: 220, b: 60 },
        PortalColor::Purple => Color::Rgb { r: 180, g: 80, b: 255 },
    }
}

fn hud_line(s: &GameState) -> String {
    let power = if s.is_power_mode() { format!("  POWER {:>2}", s.power_mode) } else { String::new() };
    format!(
        " Level {:<2}  Score {:<7}  Lives {}  Emeralds {:<2}{} ",
        s.level, s.score, s.lives, s.emeralds.len(), power,
    )
}

// ── Renderer ──

/// Each board cell spans two terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, state: &GameState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(state.phase) {
            self.back.cells.fill(Cell::INVALID);
            self.last_phase = Some(state.phase);
        }

        self.front.clear();
        self.compose_game(state);

        match state.phase {
            Phase::GameOver => self.compose_banner(state, &["GAME OVER", "R: Play Again   Q: Quit"], Color::Rgb { r: 255, g: 60, b: 60 }),
            Phase::LevelCompleting => self.compose_banner(state, &["LEVEL COMPLETE"], Color::Rgb { r: 80, g: 255, b: 80 }),
            Phase::Respawning => self.compose_banner(state, &["OUCH!"], Color::Rgb { r: 255, g: 160, b: 60 }),
            Phase::Playing => {}
        }
        if state.paused {
            self.compose_banner(state, &["PAUSED", "Space: Resume"], Color::Rgb { r: 255, g: 220, b: 50 });
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, s: &GameState) {
        let hud_bg = Color::Rgb { r: 20, g: 20, b: 60 };
        self.front.fill_row(HUD_ROW, hud_bg);
        self.front.put_str(0, HUD_ROW, &hud_line(s), Color::White, hud_bg);

        for (y, row) in s.grid.rows().enumerate() {
            for x in 0..row.len() {
                let (ch, fg) = glyph_at(s, Pos::new(x, y));
                let col = x * CELL_W;
                // Dirt fills both columns; everything else is a glyph plus a gap
                let second = if ch == '░' { ch } else { ' ' };
                self.front.set(col, MAP_ROW + y, Cell::new(ch, fg, Color::Reset));
                self.front.set(col + 1, MAP_ROW + y, Cell::new(second, fg, Color::Reset));
            }
        }

        let help_row = MAP_ROW + s.grid.height() + 1;
        let help = " Arrows/WASD: Move  F: Fire  Space: Pause  R: Restart  Q: Quit";
        self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
    }

    /// A boxed message centered over the board.
    fn compose_banner(&mut self, s: &GameState, lines: &[&str], fg: Color) {
        let bg = Color::Rgb { r: 40, g: 40, b: 40 };
        let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
        let board_cols = s.grid.width() * CELL_W;
        let box_x = board_cols.saturating_sub(inner) / 2;
        let box_y = MAP_ROW + s.grid.height().saturating_sub(lines.len() + 2) / 2;

        for dy in 0..lines.len() + 2 {
            for dx in 0..inner {
                self.front.set(box_x + dx, box_y + dy, Cell::new(' ', fg, bg));
            }
        }
        for (i, line) in lines.iter().enumerate() {
            let pad = (inner - line.chars().count()) / 2;
            self.front.put_str(box_x + pad, box_y + 1 + i, line, fg, bg);
        }
    }
}
