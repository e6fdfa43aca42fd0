/// Entities: Player, Enemy, Pickup, Vehicle, ExitGate.
/// Plain records. Nothing here is ever removed from its container;
/// "gone" is always `exists == false`.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct GridPos {
    pub x: usize,
    pub y: usize,
}

impl GridPos {
    pub const fn new(x: usize, y: usize) -> Self {
        GridPos { x, y }
    }
}

/// Horizontal heading shared by enemies, the boomerang and the player's
/// facing when not climbing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn flipped(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }

    pub fn dx(self) -> i32 {
        match self {
            Facing::Left => -1,
            Facing::Right => 1,
        }
    }
}

/// Player presentation mode: which way it faces, or on a ladder.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Left,
    Right,
    Climbing,
}

impl Mode {
    /// Horizontal facing, or None while climbing.
    pub fn facing(self) -> Option<Facing> {
        match self {
            Mode::Left => Some(Facing::Left),
            Mode::Right => Some(Facing::Right),
            Mode::Climbing => None,
        }
    }
}

/// Requested movement direction for one frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
            MoveDir::Up => (0, -1),
            MoveDir::Down => (0, 1),
        }
    }

    /// Mode the player shows after attempting this direction.
    pub fn mode(self) -> Mode {
        match self {
            MoveDir::Left => Mode::Left,
            MoveDir::Right => Mode::Right,
            MoveDir::Up | MoveDir::Down => Mode::Climbing,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub pos: GridPos,
    pub mode: Mode,
    pub speed: usize,
    /// Suppresses enemy damage and vehicle use until the next successful move.
    pub immune: bool,
    pub coins_grabbed: u32,
    pub has_boomerang: bool,
    pub anim_frame: bool,
}

impl Player {
    pub fn new(pos: GridPos) -> Self {
        Player {
            pos,
            mode: Mode::Right,
            speed: 1,
            immune: false,
            coins_grabbed: 0,
            has_boomerang: false,
            anim_frame: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enemy {
    pub pos: GridPos,
    pub direction: Facing,
    pub speed: usize,
    /// Flying enemies ignore tile validity but still respect map edges.
    pub flying: bool,
    pub exists: bool,
    pub anim_frame: bool,
}

impl Enemy {
    pub fn new(pos: GridPos, direction: Facing, flying: bool) -> Self {
        Enemy {
            pos,
            direction,
            speed: 1,
            flying,
            exists: true,
            anim_frame: false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PickupKind {
    Health,
    Point,
    BoomerangGrant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pickup {
    pub pos: GridPos,
    pub kind: PickupKind,
    pub exists: bool,
}

impl Pickup {
    pub fn new(pos: GridPos, kind: PickupKind) -> Self {
        Pickup { pos, kind, exists: true }
    }
}

/// One-shot teleport link. `start` always leads to `finish`;
/// `finish` leads back only when `bidirectional`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vehicle {
    pub start: GridPos,
    pub finish: GridPos,
    pub bidirectional: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExitGate {
    pub pos: GridPos,
    pub exists: bool,
}

impl ExitGate {
    pub fn new(pos: GridPos) -> Self {
        ExitGate { pos, exists: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_flip_roundtrips() {
        assert_eq!(Facing::Left.flipped(), Facing::Right);
        assert_eq!(Facing::Right.flipped().flipped(), Facing::Right);
    }

    #[test]
    fn vertical_moves_mean_climbing() {
        assert_eq!(MoveDir::Up.mode(), Mode::Climbing);
        assert_eq!(MoveDir::Down.mode(), Mode::Climbing);
        assert_eq!(MoveDir::Left.mode(), Mode::Left);
        assert_eq!(Mode::Climbing.facing(), None);
        assert_eq!(Mode::Right.facing(), Some(Facing::Right));
    }

    #[test]
    fn fresh_player_defaults() {
        let p = Player::new(GridPos::new(2, 16));
        assert_eq!(p.speed, 1);
        assert!(!p.immune);
        assert!(!p.has_boomerang);
        assert_eq!(p.mode, Mode::Right);
    }
}
