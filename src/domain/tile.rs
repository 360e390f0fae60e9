/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Tile {
    Dirt,    // Diggable, blocks enemies, bags and fireballs
    Tunnel,  // Open space
    Emerald, // Pickup target (mirrors the emerald list)
    Gold,    // Gold bag (mirrors the bag list)
    Digger,  // The digger's cell
    Cherry,  // Active bonus cherry
}

impl Tile {
    /// Can the digger step onto this tile without pushing or collecting?
    pub fn is_diggable(self) -> bool {
        matches!(self, Tile::Dirt | Tile::Tunnel | Tile::Cherry)
    }

    /// Can an enemy walk onto this tile? The digger's own cell counts:
    /// walking into it is a contact, resolved by the AI.
    pub fn is_walkable(self) -> bool {
        matches!(self, Tile::Tunnel | Tile::Cherry | Tile::Digger)
    }

    /// Can a falling bag drop into this tile? A bag dropping onto the
    /// digger's cell crushes it.
    pub fn is_hollow(self) -> bool {
        matches!(self, Tile::Tunnel | Tile::Digger)
    }

    /// Does this tile stop a fireball?
    pub fn stops_fireball(self) -> bool {
        matches!(self, Tile::Dirt | Tile::Gold)
    }

    /// Can a fireball be launched into this tile?
    pub fn is_launchable(self) -> bool {
        matches!(self, Tile::Tunnel | Tile::Cherry)
    }

    /// Glyph used by ASCII diagrams (tests) and the terminal renderer.
    pub fn glyph(self) -> char {
        match self {
            Tile::Dirt => '#',
            Tile::Tunnel => '.',
            Tile::Emerald => 'E',
            Tile::Gold => '$',
            Tile::Digger => 'D',
            Tile::Cherry => 'C',
        }
    }

    #[cfg(test)]
    pub fn from_glyph(ch: char) -> Option<Tile> {
        match ch {
            '#' => Some(Tile::Dirt),
            '.' | ' ' => Some(Tile::Tunnel),
            'E' => Some(Tile::Emerald),
            '$' => Some(Tile::Gold),
            'D' => Some(Tile::Digger),
            'C' => Some(Tile::Cherry),
            _ => None,
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Dirt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digger_cell_is_walkable_and_hollow() {
        assert!(Tile::Digger.is_walkable());
        assert!(Tile::Digger.is_hollow());
        assert!(!Tile::Digger.is_diggable());
    }

    #[test]
    fn cherry_blocks_bags_but_not_enemies() {
        assert!(Tile::Cherry.is_walkable());
        assert!(!Tile::Cherry.is_hollow());
    }

    #[test]
    fn emerald_does_not_stop_fireballs() {
        assert!(!Tile::Emerald.stops_fireball());
        assert!(Tile::Dirt.stops_fireball());
        assert!(Tile::Gold.stops_fireball());
    }

    #[test]
    fn glyphs_round_trip() {
        for t in [Tile::Dirt, Tile::Tunnel, Tile::Emerald, Tile::Gold, Tile::Digger, Tile::Cherry] {
            assert_eq!(Tile::from_glyph(t.glyph()), Some(t));
        }
    }
}
