/// Enemy AI: timer-gated horizontal patrol.
///
/// No pathfinding and no awareness of the player: each tick an enemy
/// tries one step in its heading and turns around instead when blocked.
///
///   Ground enemy → the target cell must pass the validity predicate.
///   Flying enemy → the target column must lie inside the map.
///
/// A blocked enemy flips heading and stays put for that tick.

use super::entity::{Enemy, GridPos};
use super::rules;
use super::tile::TileMap;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PatrolOutcome {
    Stepped { from: GridPos },
    Turned,
    Idle,
}

/// Advance one enemy by one patrol tick.
pub fn patrol_step(map: &TileMap, enemy: &mut Enemy) -> PatrolOutcome {
    if !enemy.exists {
        return PatrolOutcome::Idle;
    }

    let nx = enemy.pos.x as i32 + enemy.direction.dx() * enemy.speed as i32;
    let ny = enemy.pos.y as i32;

    let allowed = if enemy.flying {
        nx >= 0 && (nx as usize) < map.width()
    } else {
        rules::is_valid_signed(map, nx, ny)
    };

    if !allowed {
        enemy.direction = enemy.direction.flipped();
        return PatrolOutcome::Turned;
    }

    let from = enemy.pos;
    enemy.pos.x = nx as usize;
    PatrolOutcome::Stepped { from }
}

/// One patrol tick for every live enemy, in container order.
pub fn patrol_all(map: &TileMap, enemies: &mut [Enemy]) -> Vec<(usize, PatrolOutcome)> {
    enemies
        .iter_mut()
        .enumerate()
        .filter(|(_, e)| e.exists)
        .map(|(i, e)| (i, patrol_step(map, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Facing;

    fn map(rows: &[&str]) -> TileMap {
        TileMap::from_rows(rows)
    }

    #[test]
    fn ground_enemy_walks_platform() {
        let m = map(&[
            "     ",
            "=====",
        ]);
        let mut e = Enemy::new(GridPos::new(2, 0), Facing::Left, false);
        assert_eq!(patrol_step(&m, &mut e), PatrolOutcome::Stepped { from: GridPos::new(2, 0) });
        assert_eq!(e.pos, GridPos::new(1, 0));
    }

    #[test]
    fn ground_enemy_turns_at_map_edge() {
        // 20×20 map with a floor under row 12.
        let mut rows = vec!["                    "; 20];
        rows[13] = "====================";
        let m = TileMap::from_rows(&rows);
        let mut e = Enemy::new(GridPos::new(10, 12), Facing::Left, false);
        for _ in 0..10 {
            patrol_step(&m, &mut e);
        }
        assert_eq!(e.pos, GridPos::new(0, 12));
        assert_eq!(e.direction, Facing::Left);

        assert_eq!(patrol_step(&m, &mut e), PatrolOutcome::Turned);
        assert_eq!(e.direction, Facing::Right);
        assert_eq!(e.pos, GridPos::new(0, 12));
    }

    #[test]
    fn ground_enemy_turns_at_platform_end() {
        let m = map(&[
            "     ",
            "===  ",
        ]);
        let mut e = Enemy::new(GridPos::new(2, 0), Facing::Right, false);
        assert_eq!(patrol_step(&m, &mut e), PatrolOutcome::Turned);
        assert_eq!(e.pos, GridPos::new(2, 0));
        assert_eq!(e.direction, Facing::Left);
        assert!(matches!(patrol_step(&m, &mut e), PatrolOutcome::Stepped { .. }));
        assert_eq!(e.pos, GridPos::new(1, 0));
    }

    #[test]
    fn flying_enemy_ignores_tiles_but_not_edges() {
        let m = map(&[
            "    ",
            "    ",
            "====",
        ]);
        let mut e = Enemy::new(GridPos::new(2, 0), Facing::Right, true);
        assert!(matches!(patrol_step(&m, &mut e), PatrolOutcome::Stepped { .. }));
        assert_eq!(e.pos, GridPos::new(3, 0));
        assert_eq!(patrol_step(&m, &mut e), PatrolOutcome::Turned);
        assert_eq!(e.direction, Facing::Left);
        assert_eq!(e.pos, GridPos::new(3, 0));
    }

    #[test]
    fn dead_enemies_stay_put() {
        let m = map(&["   ", "==="]);
        let mut enemies = vec![
            Enemy::new(GridPos::new(1, 0), Facing::Left, false),
            Enemy::new(GridPos::new(2, 0), Facing::Left, false),
        ];
        enemies[0].exists = false;
        let moved = patrol_all(&m, &mut enemies);
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].0, 1);
        assert_eq!(enemies[0].pos, GridPos::new(1, 0));
        assert_eq!(enemies[1].pos, GridPos::new(1, 0));
    }
}
