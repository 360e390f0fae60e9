/// Events emitted by every state transition.
/// The driver logs them and presentation may key effects on them;
/// the simulation never reads them back.

use crate::domain::entity::EntityId;
use crate::domain::grid::{Direction, Pos};

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(dead_code)]
pub enum GameEvent {
    EmeraldCollected { at: Pos, streak: u32, points: u32 },
    CherrySpawned { at: Pos },
    CherryCollected { at: Pos },
    PowerModeStarted { ticks: u32 },
    BagFell { id: EntityId, to: Pos, started: bool },
    BagLanded { id: EntityId, at: Pos },
    BagBroke { id: EntityId, at: Pos, nuggets: usize },
    BagPushed { id: EntityId, from: Pos, to: Pos },
    NuggetCollected { id: EntityId, at: Pos, value: u32 },
    EnemyKilled { id: EntityId, at: Pos },
    EnemyEaten { id: EntityId, at: Pos },
    EnemyTransformed { id: EntityId },
    FireballFired { id: EntityId, at: Pos, direction: Direction },
    FireballFizzled { id: EntityId },
    Teleported { from: Pos, to: Pos },
    DiggerDied { at: Pos, lives_left: u32 },
    Respawned { at: Pos },
    GameOver { score: u32 },
    LevelComplete { level: u32, bonus: u32 },
    LevelStarted { level: u32 },
    Paused,
    Resumed,
}
