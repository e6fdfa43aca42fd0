/// Cell validity and player movement: truth-table driven.
///
/// Pure functions over the tile map. These encode "where may the player
/// stand" and apply a single voluntary move.
///
/// ## Validity Truth Table
///
/// Evaluated top to bottom, first matching row wins.
/// ┌──────────────────────────────────────────┬─────────┬──────────────────────┐
/// │ Condition                                 │ Valid?  │ Notes                │
/// ├──────────────────────────────────────────┼─────────┼──────────────────────┤
/// │ (x, y) outside the map                    │ NO      │ never leaves grid    │
/// │ tile(x, y) = Ladder                       │ YES     │ on a ladder          │
/// │ y = height - 1                            │ NO      │ nothing below        │
/// │ tile(x, y+1) = Platform                   │ YES     │ standing on top      │
/// │ tile(x, y) = Platform ∧ tile(x, y+1) = Ladder │ YES │ ladder mouth         │
/// │ Otherwise                                 │ NO      │ open air             │
/// └──────────────────────────────────────────┴─────────┴──────────────────────┘
///
/// ## Move Resolution
///
/// Candidate = position shifted by `speed` in the requested direction,
/// clamped to `[0, width-1] × [0, height-1]`.
/// ┌───────────────────────────────┬──────────┬──────────┬──────────┐
/// │ Candidate                      │ Position │ Mode     │ Immunity │
/// ├───────────────────────────────┼──────────┼──────────┼──────────┤
/// │ valid, differs from current    │ updated  │ updated  │ cleared  │
/// │ invalid                        │ kept     │ updated  │ kept     │
/// │ same as current (edge clamp)   │ kept     │ updated  │ kept     │
/// └───────────────────────────────┴──────────┴──────────┴──────────┘

use super::entity::{GridPos, MoveDir, Player};
use super::tile::{TileKind, TileMap};

/// Can the player occupy (x, y)? See truth table above.
pub fn is_valid(map: &TileMap, x: usize, y: usize) -> bool {
    if x >= map.width() || y >= map.height() {
        return false;
    }
    let here = map.tile_at(x, y);
    if here.is_ladder() {
        return true;
    }
    if y + 1 >= map.height() {
        return false;
    }
    let below = map.tile_at(x, y + 1);
    if below.is_platform() {
        return true;
    }
    here == TileKind::Platform && below == TileKind::Ladder
}

/// Signed-coordinate variant: anything off the grid is invalid.
pub fn is_valid_signed(map: &TileMap, x: i32, y: i32) -> bool {
    map.in_bounds(x, y) && is_valid(map, x as usize, y as usize)
}

/// Target cell for a move, clamped to the map.
pub fn candidate(map: &TileMap, from: GridPos, dir: MoveDir, speed: usize) -> GridPos {
    let (dx, dy) = dir.delta();
    let step = speed as i64;
    let max_x = map.width().saturating_sub(1) as i64;
    let max_y = map.height().saturating_sub(1) as i64;
    let nx = (from.x as i64 + dx as i64 * step).clamp(0, max_x);
    let ny = (from.y as i64 + dy as i64 * step).clamp(0, max_y);
    GridPos::new(nx as usize, ny as usize)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    /// Position changed; `from` needs its background redrawn.
    Moved { from: GridPos },
    /// Position unchanged; the player still turned to face `dir`.
    Blocked,
}

/// Apply one voluntary move to the player. See truth table above.
pub fn resolve_move(map: &TileMap, player: &mut Player, dir: MoveDir) -> MoveOutcome {
    let from = player.pos;
    let target = candidate(map, from, dir, player.speed);
    player.mode = dir.mode();

    if target == from || !is_valid(map, target.x, target.y) {
        return MoveOutcome::Blocked;
    }

    player.pos = target;
    player.immune = false;
    MoveOutcome::Moved { from }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Mode;
    use proptest::prelude::*;

    /// Legend: '=' Platform, 'H' Ladder, ' ' Empty.
    fn map(rows: &[&str]) -> TileMap {
        TileMap::from_rows(rows)
    }

    // ── Validity ──

    #[test]
    fn ladder_always_valid() {
        let m = map(&[
            " H ",
            " H ",
        ]);
        assert!(is_valid(&m, 1, 0));
        assert!(is_valid(&m, 1, 1)); // ladder on bottom row still valid
    }

    #[test]
    fn bottom_row_invalid_without_ladder() {
        let m = map(&[
            "   ",
            "===",
        ]);
        assert!(!is_valid(&m, 0, 1));
    }

    #[test]
    fn standing_on_platform_valid() {
        let m = map(&[
            "   ",
            "===",
        ]);
        assert!(is_valid(&m, 0, 0));
        assert!(is_valid(&m, 2, 0));
    }

    #[test]
    fn open_air_invalid() {
        let m = map(&[
            "   ",
            "   ",
            "===",
        ]);
        assert!(!is_valid(&m, 1, 0));
        assert!(is_valid(&m, 1, 1));
    }

    #[test]
    fn platform_over_ladder_mouth_valid() {
        let m = map(&[
            "   ",
            "=H=",
            " H ",
            "===",
        ]);
        // (1,1) is a ladder itself
        assert!(is_valid(&m, 1, 1));
        let m2 = map(&[
            "   ",
            "===",
            " H ",
            "===",
        ]);
        // platform cell directly atop the ladder's top rung
        assert!(is_valid(&m2, 1, 1));
        // neighbouring platform cell has empty below
        assert!(!is_valid(&m2, 0, 1));
    }

    #[test]
    fn out_of_range_invalid() {
        let m = map(&["   ", "==="]);
        assert!(!is_valid(&m, 3, 0));
        assert!(!is_valid_signed(&m, -1, 0));
        assert!(is_valid_signed(&m, 0, 0));
    }

    // ── Candidate computation ──

    #[test]
    fn candidate_clamps_to_edges() {
        let m = map(&["   ", "==="]);
        assert_eq!(candidate(&m, GridPos::new(0, 0), MoveDir::Left, 1), GridPos::new(0, 0));
        assert_eq!(candidate(&m, GridPos::new(2, 0), MoveDir::Right, 1), GridPos::new(2, 0));
        assert_eq!(candidate(&m, GridPos::new(0, 0), MoveDir::Right, 5), GridPos::new(2, 0));
        assert_eq!(candidate(&m, GridPos::new(1, 1), MoveDir::Down, 1), GridPos::new(1, 1));
    }

    // ── Move resolution ──

    #[test]
    fn move_right_on_platform() {
        // 26 rows so that row 24 stands on the platform row 25.
        let mut rows = vec!["          "; 25];
        rows.push("==========");
        let m = TileMap::from_rows(&rows);
        let mut p = Player::new(GridPos::new(3, 24));
        p.immune = true;
        p.mode = Mode::Left;

        let out = resolve_move(&m, &mut p, MoveDir::Right);
        assert_eq!(out, MoveOutcome::Moved { from: GridPos::new(3, 24) });
        assert_eq!(p.pos, GridPos::new(4, 24));
        assert_eq!(p.mode, Mode::Right);
        assert!(!p.immune);
    }

    #[test]
    fn blocked_move_still_turns() {
        let m = map(&[
            "   ",
            "   ",
            "===",
        ]);
        let mut p = Player::new(GridPos::new(1, 1));
        p.immune = true;
        let out = resolve_move(&m, &mut p, MoveDir::Up);
        assert_eq!(out, MoveOutcome::Blocked);
        assert_eq!(p.pos, GridPos::new(1, 1));
        assert_eq!(p.mode, Mode::Climbing);
        assert!(p.immune, "immunity only clears on a successful move");

        let out = resolve_move(&m, &mut p, MoveDir::Left);
        assert_eq!(out, MoveOutcome::Moved { from: GridPos::new(1, 1) });
        assert_eq!(p.mode, Mode::Left);
    }

    #[test]
    fn edge_clamp_is_not_a_move() {
        let m = map(&["   ", "==="]);
        let mut p = Player::new(GridPos::new(0, 0));
        p.immune = true;
        assert_eq!(resolve_move(&m, &mut p, MoveDir::Left), MoveOutcome::Blocked);
        assert_eq!(p.mode, Mode::Left);
        assert!(p.immune);
    }

    #[test]
    fn climb_ladder_to_upper_floor() {
        let m = map(&[
            "     ",
            "=====",
            "  H  ",
            "=====",
        ]);
        let mut p = Player::new(GridPos::new(2, 2));
        assert!(matches!(resolve_move(&m, &mut p, MoveDir::Up), MoveOutcome::Moved { .. }));
        assert_eq!(p.pos, GridPos::new(2, 1));
        assert!(matches!(resolve_move(&m, &mut p, MoveDir::Up), MoveOutcome::Moved { .. }));
        assert_eq!(p.pos, GridPos::new(2, 0));
        // can't climb into the sky
        assert_eq!(resolve_move(&m, &mut p, MoveDir::Up), MoveOutcome::Blocked);
        // walk off along the upper floor
        assert!(matches!(resolve_move(&m, &mut p, MoveDir::Right), MoveOutcome::Moved { .. }));
        assert_eq!(p.pos, GridPos::new(3, 0));
    }

    fn arb_map() -> impl Strategy<Value = TileMap> {
        (2usize..8, 2usize..8).prop_flat_map(|(w, h)| {
            prop::collection::vec(
                prop_oneof![Just(TileKind::Empty), Just(TileKind::Platform), Just(TileKind::Ladder)],
                w * h,
            )
            .prop_map(move |tiles| TileMap::new(w, h, tiles).unwrap_or_else(|| TileMap::from_rows(&["="])))
        })
    }

    fn arb_dir() -> impl Strategy<Value = MoveDir> {
        prop_oneof![
            Just(MoveDir::Left),
            Just(MoveDir::Right),
            Just(MoveDir::Up),
            Just(MoveDir::Down),
        ]
    }

    proptest! {
        #[test]
        fn successful_moves_land_on_valid_cells(
            m in arb_map(),
            sx in 0usize..8,
            sy in 0usize..8,
            dirs in prop::collection::vec(arb_dir(), 0..40),
        ) {
            let start = GridPos::new(sx % m.width(), sy % m.height());
            let mut p = Player::new(start);
            for d in dirs {
                let out = resolve_move(&m, &mut p, d);
                prop_assert!(p.pos.x < m.width() && p.pos.y < m.height());
                if let MoveOutcome::Moved { .. } = out {
                    prop_assert!(is_valid(&m, p.pos.x, p.pos.y));
                    prop_assert!(!p.immune);
                }
            }
        }
    }
}
