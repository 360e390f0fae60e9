/// The tile grid: a fixed W×H array of `Tile`.
///
/// The grid answers "what is at (x, y)" and nothing more. Boundary policy
/// (what happens at the edge) belongs to the caller, so reads outside the
/// grid are an error and writes outside it are a debug assertion.

use super::tile::Tile;
use crate::error::SimError;

pub const GRID_WIDTH: usize = 30;
pub const GRID_HEIGHT: usize = 20;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }

    /// Signed offset from `self` to `other`: (dx, dy).
    pub fn delta_to(self, other: Pos) -> (i32, i32) {
        (other.x as i32 - self.x as i32, other.y as i32 - self.y as i32)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid {
    tiles: Vec<Vec<Tile>>,
    width: usize,
    height: usize,
}

impl Grid {
    /// A grid of the given size filled with one tile.
    pub fn filled(width: usize, height: usize, tile: Tile) -> Self {
        Grid { tiles: vec![vec![tile; width]; height], width, height }
    }

    /// Build a grid from glyph rows (see `Tile::from_glyph`).
    /// Unknown glyphs become `Tunnel`; short rows are padded with `Dirt`.
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Grid::filled(width, height, Tile::Dirt);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                grid.tiles[y][x] = Tile::from_glyph(ch).unwrap_or(Tile::Tunnel);
            }
        }
        grid
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Query the tile at `pos`.
    #[inline]
    pub fn tile_at(&self, pos: Pos) -> Result<Tile, SimError> {
        if pos.x < self.width && pos.y < self.height {
            Ok(self.tiles[pos.y][pos.x])
        } else {
            Err(SimError::OutOfBounds { x: pos.x as i64, y: pos.y as i64 })
        }
    }

    /// Like `tile_at`, for callers that treat "outside" as "nothing here".
    #[inline]
    pub fn get(&self, pos: Pos) -> Option<Tile> {
        self.tile_at(pos).ok()
    }

    /// Overwrite the tile at `pos`.
    #[inline]
    pub fn set_tile(&mut self, pos: Pos, tile: Tile) {
        debug_assert!(
            pos.x < self.width && pos.y < self.height,
            "set_tile out of bounds: ({}, {})", pos.x, pos.y,
        );
        if pos.x < self.width && pos.y < self.height {
            self.tiles[pos.y][pos.x] = tile;
        }
    }

    /// The in-bounds cell one step from `pos` in `dir`, if any.
    pub fn neighbor(&self, pos: Pos, dir: Direction) -> Option<Pos> {
        let (dx, dy) = dir.offset();
        self.offset(pos, dx, dy)
    }

    /// The cell at `pos + (dx, dy)`, if in bounds.
    pub fn offset(&self, pos: Pos, dx: i32, dy: i32) -> Option<Pos> {
        let nx = pos.x as i64 + dx as i64;
        let ny = pos.y as i64 + dy as i64;
        if self.contains(nx, ny) {
            Some(Pos::new(nx as usize, ny as usize))
        } else {
            None
        }
    }

    /// One step from `pos` in `dir`, clamped to the grid edge.
    /// At the edge this returns `pos` itself.
    pub fn clamped_neighbor(&self, pos: Pos, dir: Direction) -> Pos {
        self.neighbor(pos, dir).unwrap_or(pos)
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().flatten().filter(|&&t| t == tile).count()
    }

    /// All positions holding `tile`, in row-major order.
    pub fn positions_of(&self, tile: Tile) -> Vec<Pos> {
        let mut out = Vec::new();
        for (y, row) in self.tiles.iter().enumerate() {
            for (x, &t) in row.iter().enumerate() {
                if t == tile {
                    out.push(Pos::new(x, y));
                }
            }
        }
        out
    }

    /// Rows of glyphs, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> + '_ {
        self.tiles.iter().map(|r| r.as_slice())
    }
}

impl Default for Grid {
    fn default() -> Self {
        Grid::filled(GRID_WIDTH, GRID_HEIGHT, Tile::Dirt)
    }
}
