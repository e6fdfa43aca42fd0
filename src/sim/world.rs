/// Session: the complete mutable state of a stage being played.
///
/// ## Template vs. live state
///
/// A `StageTemplate` is never mutated. Loading a stage copies its map and
/// entities into the session; restart and advance both rebuild from a
/// template, so nothing here needs an "undo".
///
/// ## Carried across stages
///
///   lives, coins, remaining time   → carried (snapshotted in `StageEntry`)
///   player position, enemies, packs, vehicles, boomerang, exit → rebuilt
///
/// Score is never stored; it is derived from the carried values.

use rand_pcg::Pcg32;

use crate::config::GameConfig;
use crate::domain::entity::{Enemy, ExitGate, MoveDir, Pickup, Player, Vehicle};
use crate::domain::projectile::Boomerang;
use crate::domain::tile::TileMap;
use super::clock::Timer;
use super::level::StageTemplate;

/// Points per remaining life and per coin.
pub const LIFE_BONUS: i64 = 250_000;
pub const COIN_BONUS: i64 = 250_000;

/// Values recorded when a stage was entered; restart returns to them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageEntry {
    pub lives: u32,
    pub coins: u32,
    pub time: i64,
}

impl StageEntry {
    pub fn fresh(config: &GameConfig) -> Self {
        StageEntry {
            lives: config.rules.starting_lives,
            coins: 0,
            time: config.rules.stage_time,
        }
    }
}

/// Timer-gated subsystems, each with its own reference timestamp.
#[derive(Clone, Debug)]
pub struct Timers {
    pub enemy_move: Timer,
    pub sprite_toggle: Timer,
    pub boomerang: Timer,
    pub pack_spawn: Timer,
    pub move_repeat: Timer,
}

impl Timers {
    fn new(config: &GameConfig, boomerang_ms: u64, now: u64) -> Self {
        let t = &config.timing;
        Timers {
            enemy_move: Timer::new(t.enemy_move_ms, now),
            sprite_toggle: Timer::new(t.sprite_toggle_ms, now),
            boomerang: Timer::new(boomerang_ms, now),
            pack_spawn: Timer::new(t.pack_spawn_ms, now),
            move_repeat: Timer::new(t.move_repeat_ms, now),
        }
    }

    fn shift(&mut self, by_ms: u64) {
        self.enemy_move.shift(by_ms);
        self.sprite_toggle.shift(by_ms);
        self.boomerang.shift(by_ms);
        self.pack_spawn.shift(by_ms);
        self.move_repeat.shift(by_ms);
    }
}

pub struct Session {
    // ── Stage ──
    pub stage_index: usize,
    pub stage_name: String,
    pub map: TileMap,

    // ── Entities ──
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub pickups: Vec<Pickup>,
    pub vehicles: Vec<Vehicle>,
    pub boomerang: Boomerang,
    pub exit: ExitGate,

    // ── Carried ──
    pub lives: u32,
    /// Remaining time in milliseconds.
    pub time: i64,
    pub entry: StageEntry,

    // ── Outcome flags ──
    pub win: bool,
    pub lose: bool,

    // ── Timing ──
    pub timers: Timers,
    pub last_frame_ms: u64,
    /// Direction of the last move attempt while it stays held.
    pub held_dir: Option<MoveDir>,
    pub move_repeat_ms: u64,

    // ── Rules ──
    pub max_lives: u32,
    pub pickup_capacity: usize,
    pub spawn_max_attempts: u32,
    pub rng: Pcg32,
}

// ── Construction ──

impl Session {
    pub fn new(
        template: &StageTemplate,
        stage_index: usize,
        entry: StageEntry,
        config: &GameConfig,
        rng: Pcg32,
        now: u64,
    ) -> Self {
        let boomerang = Boomerang::new(config.timing.boomerang_tiles_per_second);
        let boomerang_ms = boomerang.interval_ms();
        let mut session = Session {
            stage_index,
            stage_name: String::new(),
            map: template.map.clone(),
            player: Player::new(template.player_start),
            enemies: vec![],
            pickups: vec![],
            vehicles: vec![],
            boomerang,
            exit: ExitGate::new(template.exit),
            lives: entry.lives,
            time: entry.time,
            entry,
            win: false,
            lose: false,
            timers: Timers::new(config, boomerang_ms, now),
            last_frame_ms: now,
            held_dir: None,
            move_repeat_ms: config.timing.move_repeat_ms,
            max_lives: config.rules.max_lives,
            pickup_capacity: config.rules.pickup_capacity,
            spawn_max_attempts: config.rules.spawn_max_attempts,
            rng,
        };
        session.load(template, stage_index, entry, now);
        session
    }

    /// Replace all per-stage state from `template`, restoring `entry`.
    fn load(&mut self, template: &StageTemplate, stage_index: usize, entry: StageEntry, now: u64) {
        self.stage_index = stage_index;
        self.stage_name = template.name.clone();
        self.map = template.map.clone();

        self.player = Player::new(template.player_start);
        self.player.coins_grabbed = entry.coins;
        self.enemies = template.enemies.clone();
        self.pickups = template.pickups.clone();
        self.pickups.truncate(self.pickup_capacity);
        self.vehicles = template.vehicles.clone();
        self.boomerang = Boomerang::new(self.boomerang.tiles_per_second);
        self.exit = ExitGate::new(template.exit);

        self.lives = entry.lives;
        self.time = entry.time;
        self.entry = entry;
        self.win = false;
        self.lose = false;

        let t = &mut self.timers;
        for timer in [
            &mut t.enemy_move,
            &mut t.sprite_toggle,
            &mut t.boomerang,
            &mut t.pack_spawn,
            &mut t.move_repeat,
        ] {
            timer.rearm(now);
        }
        self.last_frame_ms = now;
        self.held_dir = None;
    }

    /// Rebuild the current stage and return to the values it was entered with.
    pub fn restart(&mut self, template: &StageTemplate, now: u64) {
        let entry = self.entry;
        self.load(template, self.stage_index, entry, now);
    }

    /// Move on to another stage, carrying lives, coins and time.
    pub fn advance(&mut self, template: &StageTemplate, stage_index: usize, now: u64) {
        let entry = self.carried();
        self.load(template, stage_index, entry, now);
    }

    /// Continue after a pause: the paused span is neither charged to the
    /// countdown nor counted towards any timer.
    pub fn resume(&mut self, now: u64) {
        let paused_for = now.saturating_sub(self.last_frame_ms);
        self.timers.shift(paused_for);
        self.last_frame_ms = now;
    }
}

// ── Derived values ──

impl Session {
    /// Current carried values.
    pub fn carried(&self) -> StageEntry {
        StageEntry {
            lives: self.lives,
            coins: self.player.coins_grabbed,
            time: self.time,
        }
    }

    pub fn score(&self) -> i64 {
        self.time + LIFE_BONUS * i64::from(self.lives) + COIN_BONUS * i64::from(self.player.coins_grabbed)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sim::level::{parse_stage, StageTemplate};
    use rand::SeedableRng;

    pub(crate) fn template(text: &str) -> StageTemplate {
        parse_stage(text).unwrap()
    }

    pub(crate) fn session(text: &str) -> Session {
        let cfg = GameConfig::default();
        Session::new(&template(text), 0, StageEntry::fresh(&cfg), &cfg, Pcg32::seed_from_u64(1), 0)
    }

    #[test]
    fn fresh_session_values() {
        let s = session("# T\nP $X\n====\n");
        assert_eq!(s.lives, 4);
        assert_eq!(s.time, 1_000_000);
        assert_eq!(s.stage_name, "T");
        assert_eq!(s.pickups.len(), 1);
        assert!(!s.win && !s.lose);
        assert_eq!(s.score(), 1_000_000 + 4 * 250_000);
    }

    #[test]
    fn score_counts_coins() {
        let mut s = session("P X\n===\n");
        s.player.coins_grabbed = 3;
        s.lives = 1;
        s.time = 500;
        assert_eq!(s.score(), 500 + 250_000 + 750_000);
    }

    #[test]
    fn restart_restores_entry_values() {
        let t = template("P<X\n===\n");
        let mut s = session("P<X\n===\n");
        s.lives = 1;
        s.time = 10;
        s.player.coins_grabbed = 2;
        s.enemies[0].exists = false;
        s.player.pos.x = 2;
        s.restart(&t, 100);
        assert_eq!(s.lives, 4);
        assert_eq!(s.time, 1_000_000);
        assert_eq!(s.player.coins_grabbed, 0);
        assert!(s.enemies[0].exists);
        assert_eq!(s.player.pos.x, 0);
        assert_eq!(s.last_frame_ms, 100);
    }

    #[test]
    fn advance_carries_lives_coins_time() {
        let next = template("# Next\nX P\n===\n");
        let mut s = session("P X\n===\n");
        s.lives = 2;
        s.time = 1234;
        s.player.coins_grabbed = 5;
        s.win = true;
        s.advance(&next, 1, 50);
        assert_eq!(s.stage_index, 1);
        assert_eq!(s.stage_name, "Next");
        assert_eq!(s.lives, 2);
        assert_eq!(s.time, 1234);
        assert_eq!(s.player.coins_grabbed, 5);
        assert!(!s.win);
        assert_eq!(s.entry, StageEntry { lives: 2, coins: 5, time: 1234 });

        s.lives = 1;
        s.restart(&next, 60);
        assert_eq!(s.lives, 2, "restart returns to the values the stage began with");
    }

    #[test]
    fn resume_skips_paused_span() {
        let mut s = session("P X\n===\n");
        s.last_frame_ms = 1000;
        s.timers.enemy_move.last_ms = 500;
        s.resume(6000);
        assert_eq!(s.last_frame_ms, 6000);
        assert_eq!(s.timers.enemy_move.last_ms, 5500);
    }
}
