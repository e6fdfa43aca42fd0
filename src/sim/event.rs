/// Events emitted during a simulation step.
/// The renderer uses the cell-level ones to repaint; everything is logged.

use crate::domain::entity::{GridPos, PickupKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PlayerMoved { from: GridPos, to: GridPos },
    /// A cell lost its occupant and needs its background tile redrawn.
    CellVacated { at: GridPos },
    /// Move refused; the player only turned.
    Bumped { at: GridPos },
    LifeLost { enemy: usize, lives_left: u32 },
    PickupCollected { slot: usize, kind: PickupKind, at: GridPos },
    Teleported { vehicle: usize, from: GridPos, to: GridPos },
    ExitReached,
    EnemyKilled { enemy: usize, at: GridPos },
    BoomerangThrown { at: GridPos },
    BoomerangReturned,
    PickupSpawned { slot: usize, kind: PickupKind, at: GridPos },
    SpawnSkipped { attempts: u32 },
    TimeUp,
}

impl GameEvent {
    /// Cell whose background must be repainted, if any.
    pub fn vacated_cell(&self) -> Option<GridPos> {
        match self {
            GameEvent::CellVacated { at } => Some(*at),
            GameEvent::PlayerMoved { from, .. } => Some(*from),
            GameEvent::Teleported { from, .. } => Some(*from),
            GameEvent::EnemyKilled { at, .. } => Some(*at),
            GameEvent::PickupCollected { at, .. } => Some(*at),
            _ => None,
        }
    }
}
