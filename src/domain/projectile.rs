/// Boomerang projectile.
///
/// Lifecycle: Idle → Thrown → (Returned | Idle).
///
/// Per tick, in order:
///   1. Step one cell in the current heading (held at the map edge)
///   2. Kill every live enemy on the new cell; reverse on a kill
///   3. Reverse when sitting on the edge cell and heading outward
///   4. Caught if the new cell is the player's cell
///   5. Advance the 3-frame spin animation when it moved

use super::entity::{Enemy, Facing, GridPos, Player};

pub const SPIN_FRAMES: u8 = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Boomerang {
    pub pos: GridPos,
    pub direction: Facing,
    pub exists: bool,
    pub tiles_per_second: u32,
    pub frame: u8,
    /// Set on the tick it strikes an enemy, cleared at the start of the next.
    pub hit: bool,
}

/// What one projectile tick did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoomerangTick {
    pub from: Option<GridPos>,
    pub killed: Vec<usize>,
    pub returned: bool,
}

impl Boomerang {
    pub fn new(tiles_per_second: u32) -> Self {
        Boomerang {
            pos: GridPos::default(),
            direction: Facing::Right,
            exists: false,
            tiles_per_second: tiles_per_second.max(1),
            frame: 0,
            hit: false,
        }
    }

    /// Tick interval in milliseconds.
    pub fn interval_ms(&self) -> u64 {
        1000 / u64::from(self.tiles_per_second.max(1))
    }

    /// Throw from the player's cell in the player's facing.
    /// Returns false (nothing happens) while climbing, without a boomerang,
    /// or when one is already in flight.
    pub fn launch(&mut self, player: &mut Player) -> bool {
        if !player.has_boomerang || self.exists {
            return false;
        }
        let facing = match player.mode.facing() {
            Some(f) => f,
            None => return false,
        };
        self.pos = player.pos;
        self.direction = facing;
        self.exists = true;
        self.hit = false;
        self.frame = 0;
        player.has_boomerang = false;
        true
    }

    /// Advance one tick. No-op when not in flight.
    pub fn advance(&mut self, width: usize, enemies: &mut [Enemy], player: &mut Player) -> BoomerangTick {
        let mut out = BoomerangTick::default();
        if !self.exists {
            return out;
        }
        self.hit = false;

        let from = self.pos;
        let last = width.saturating_sub(1);
        match self.direction {
            Facing::Left if self.pos.x > 0 => self.pos.x -= 1,
            Facing::Right if self.pos.x < last => self.pos.x += 1,
            _ => {}
        }

        for (i, enemy) in enemies.iter_mut().enumerate() {
            if enemy.exists && enemy.pos == self.pos {
                enemy.exists = false;
                self.hit = true;
                self.direction = self.direction.flipped();
                out.killed.push(i);
            }
        }

        if (self.pos.x == 0 && self.direction == Facing::Left)
            || (self.pos.x >= last && self.direction == Facing::Right)
        {
            self.direction = self.direction.flipped();
        }

        if self.pos == player.pos {
            self.exists = false;
            player.has_boomerang = true;
            out.returned = true;
        }

        if self.pos != from {
            self.frame = (self.frame + 1) % SPIN_FRAMES;
            out.from = Some(from);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Mode;
    use proptest::prelude::*;

    fn armed_player(x: usize, y: usize, mode: Mode) -> Player {
        let mut p = Player::new(GridPos::new(x, y));
        p.has_boomerang = true;
        p.mode = mode;
        p
    }

    #[test]
    fn launch_requires_boomerang_and_facing() {
        let mut b = Boomerang::new(2);
        let mut climbing = armed_player(5, 5, Mode::Climbing);
        assert!(!b.launch(&mut climbing));
        assert!(climbing.has_boomerang);

        let mut unarmed = Player::new(GridPos::new(5, 5));
        assert!(!b.launch(&mut unarmed));

        let mut p = armed_player(5, 5, Mode::Left);
        assert!(b.launch(&mut p));
        assert!(b.exists);
        assert!(!p.has_boomerang);
        assert_eq!(b.pos, GridPos::new(5, 5));
        assert_eq!(b.direction, Facing::Left);
    }

    #[test]
    fn kill_reverses_and_flags_hit() {
        let mut b = Boomerang::new(2);
        let mut p = armed_player(5, 5, Mode::Right);
        b.launch(&mut p);
        let mut enemies = vec![Enemy::new(GridPos::new(8, 5), Facing::Left, false)];

        b.advance(20, &mut enemies, &mut p); // 6
        b.advance(20, &mut enemies, &mut p); // 7
        assert!(!b.hit);
        let tick = b.advance(20, &mut enemies, &mut p); // 8
        assert_eq!(b.pos, GridPos::new(8, 5));
        assert_eq!(tick.killed, vec![0]);
        assert!(!enemies[0].exists);
        assert!(b.hit);
        assert_eq!(b.direction, Facing::Left);

        b.advance(20, &mut enemies, &mut p);
        assert!(!b.hit, "hit is transient");
    }

    #[test]
    fn returns_to_stationary_player() {
        let mut b = Boomerang::new(2);
        let mut p = armed_player(2, 0, Mode::Right);
        b.launch(&mut p);
        let mut enemies: Vec<Enemy> = vec![];
        let mut ticks = 0;
        while b.exists && ticks < 100 {
            b.advance(5, &mut enemies, &mut p);
            ticks += 1;
        }
        // 3 → 4 (edge, flips) → 3 → 2 (caught)
        assert_eq!(ticks, 4);
        assert!(!b.exists);
        assert!(p.has_boomerang);
    }

    #[test]
    fn animation_cycles_three_frames() {
        let mut b = Boomerang::new(2);
        let mut p = armed_player(0, 0, Mode::Right);
        p.pos = GridPos::new(0, 1); // off the flight row so it never returns
        b.launch(&mut p);
        b.pos = GridPos::new(0, 0);
        let mut frames = vec![];
        for _ in 0..4 {
            b.advance(10, &mut [], &mut p);
            frames.push(b.frame);
        }
        assert_eq!(frames, vec![1, 2, 0, 1]);
    }

    #[test]
    fn interval_from_rate() {
        assert_eq!(Boomerang::new(2).interval_ms(), 500);
        assert_eq!(Boomerang::new(0).interval_ms(), 1000);
    }

    proptest! {
        #[test]
        fn thrown_boomerang_comes_back_or_kills(
            width in 2usize..30,
            px in 0usize..30,
            right in any::<bool>(),
            enemy_x in proptest::option::of(0usize..30),
        ) {
            let px = px % width;
            let mode = if right { Mode::Right } else { Mode::Left };
            let mut p = armed_player(px, 3, mode);
            let mut enemies: Vec<Enemy> = enemy_x
                .map(|x| Enemy::new(GridPos::new(x % width, 3), Facing::Left, false))
                .into_iter()
                .collect();
            let mut b = Boomerang::new(2);
            prop_assert!(b.launch(&mut p));

            let mut killed = false;
            for _ in 0..(4 * width + 4) {
                if !b.exists { break; }
                let t = b.advance(width, &mut enemies, &mut p);
                prop_assert!(b.pos.x < width);
                if !t.killed.is_empty() {
                    killed = true;
                }
            }
            prop_assert!(!b.exists, "boomerang still flying");
            prop_assert!(p.has_boomerang);
            if killed {
                prop_assert!(enemies.iter().all(|e| !e.exists));
            }
        }
    }
}
