/// Entities: gold bags, nuggets, emeralds, enemies, fireballs, portals.
/// Each carries an identity so registries can be diffed across snapshots;
/// positions are looked up by linear scan (levels hold a few dozen entities).

use super::grid::{Direction, Pos};

pub type EntityId = u32;

/// Monotonic id source. Lives in the snapshot so ids stay unique across
/// every entity a level ever creates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdAllocator {
    next: EntityId,
}

impl IdAllocator {
    pub fn starting_at(next: EntityId) -> Self {
        IdAllocator { next }
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoldBag {
    pub id: EntityId,
    pub pos: Pos,
    pub is_falling: bool,
    pub fall_distance: u32,
}

impl GoldBag {
    pub fn new(id: EntityId, pos: Pos) -> Self {
        GoldBag { id, pos, is_falling: false, fall_distance: 0 }
    }

    /// Bring the bag to rest: not falling, no accumulated distance.
    pub fn settle(&mut self) {
        self.is_falling = false;
        self.fall_distance = 0;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoldNugget {
    pub id: EntityId,
    pub pos: Pos,
    pub value: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyKind {
    Nobbin,
    Hobbin,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enemy {
    pub id: EntityId,
    pub pos: Pos,
    pub kind: EnemyKind,
    /// `None` = standing still until blocked or re-aimed.
    pub direction: Option<Direction>,
    /// Ticks until a Nobbin becomes a Hobbin. Irrelevant once Hobbin.
    pub transform_timer: i32,
}

impl Enemy {
    pub fn nobbin(id: EntityId, pos: Pos, direction: Direction, transform_timer: i32) -> Self {
        Enemy { id, pos, kind: EnemyKind::Nobbin, direction: Some(direction), transform_timer }
    }

    pub fn hobbin(id: EntityId, pos: Pos, direction: Direction) -> Self {
        Enemy { id, pos, kind: EnemyKind::Hobbin, direction: Some(direction), transform_timer: 0 }
    }

    /// Advance the transformation timer by one tick.
    /// Returns true if this tick turned a Nobbin into a Hobbin.
    pub fn tick_transform(&mut self) -> bool {
        if self.kind != EnemyKind::Nobbin {
            return false;
        }
        self.transform_timer -= 1;
        if self.transform_timer <= 0 {
            self.kind = EnemyKind::Hobbin;
            return true;
        }
        false
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fireball {
    pub id: EntityId,
    pub pos: Pos,
    pub direction: Direction,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PortalColor {
    Blue,
    Orange,
    Green,
    Purple,
}

impl PortalColor {
    pub const CYCLE: [PortalColor; 4] =
        [PortalColor::Blue, PortalColor::Orange, PortalColor::Green, PortalColor::Purple];
}

/// A bidirectional teleport pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Portal {
    pub entry: Pos,
    pub exit: Pos,
    pub color: PortalColor,
}

impl Portal {
    /// Where stepping onto `pos` sends you, if `pos` is one of the endpoints.
    pub fn partner_of(&self, pos: Pos) -> Option<Pos> {
        if pos == self.entry {
            Some(self.exit)
        } else if pos == self.exit {
            Some(self.entry)
        } else {
            None
        }
    }

    pub fn touches(&self, pos: Pos) -> bool {
        pos == self.entry || pos == self.exit
    }
}
