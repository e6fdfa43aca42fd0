/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing, unreadable or incomplete.

use log::{info, warn};
use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub rules: RulesConfig,
    pub gamepad: GamepadConfig,
    pub stages_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub frame_sleep_ms: u64,
    pub move_repeat_ms: u64,     // 0 = one move per press
    pub enemy_move_ms: u64,
    pub sprite_toggle_ms: u64,
    pub boomerang_tiles_per_second: u32,
    pub pack_spawn_ms: u64,
    pub banner_ms: u64,
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub starting_lives: u32,
    pub max_lives: u32,
    pub stage_time: i64,
    pub pickup_capacity: usize,
    pub spawn_max_attempts: u32,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub throw: Vec<String>,
    pub pause: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_sleep")]
    frame_sleep_ms: u64,
    #[serde(default = "default_move_repeat")]
    move_repeat_ms: u64,
    #[serde(default = "default_enemy_move")]
    enemy_move_ms: u64,
    #[serde(default = "default_sprite_toggle")]
    sprite_toggle_ms: u64,
    #[serde(default = "default_boomerang_tps")]
    boomerang_tiles_per_second: u32,
    #[serde(default = "default_pack_spawn")]
    pack_spawn_ms: u64,
    #[serde(default = "default_banner")]
    banner_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_starting_lives")]
    starting_lives: u32,
    #[serde(default = "default_max_lives")]
    max_lives: u32,
    #[serde(default = "default_stage_time")]
    stage_time: i64,
    #[serde(default = "default_pickup_capacity")]
    pickup_capacity: usize,
    #[serde(default = "default_spawn_attempts")]
    spawn_max_attempts: u32,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_throw")]
    throw: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_stages_dir")]
    stages_dir: String,
}

// ── Defaults ──

fn default_frame_sleep() -> u64 { 5 }
fn default_move_repeat() -> u64 { 150 }
fn default_enemy_move() -> u64 { 1000 }
fn default_sprite_toggle() -> u64 { 500 }
fn default_boomerang_tps() -> u32 { 2 }
fn default_pack_spawn() -> u64 { 10_000 }
fn default_banner() -> u64 { 1500 }

fn default_starting_lives() -> u32 { 4 }
fn default_max_lives() -> u32 { 4 }
fn default_stage_time() -> i64 { 1_000_000 }  // ms, shared across all stages
fn default_pickup_capacity() -> usize { 30 }
fn default_spawn_attempts() -> u32 { 500 }

fn default_throw() -> Vec<String> { vec!["A".into()] }
fn default_pause() -> Vec<String> { vec!["Start".into()] }
fn default_stages_dir() -> String { "stages".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_sleep_ms: default_frame_sleep(),
            move_repeat_ms: default_move_repeat(),
            enemy_move_ms: default_enemy_move(),
            sprite_toggle_ms: default_sprite_toggle(),
            boomerang_tiles_per_second: default_boomerang_tps(),
            pack_spawn_ms: default_pack_spawn(),
            banner_ms: default_banner(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            starting_lives: default_starting_lives(),
            max_lives: default_max_lives(),
            stage_time: default_stage_time(),
            pickup_capacity: default_pickup_capacity(),
            spawn_max_attempts: default_spawn_attempts(),
            seed: None,
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            throw: default_throw(),
            pause: default_pause(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            stages_dir: default_stages_dir(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly. Missing keys take their defaults.
    #[cfg(test)]
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(cfg, &[]))
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let stages_dir_str = &toml_cfg.general.stages_dir;
        let stages_dir = if PathBuf::from(stages_dir_str).is_absolute() {
            PathBuf::from(stages_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(stages_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(stages_dir_str))
        };

        let rules = &toml_cfg.rules;
        let mut max_lives = rules.max_lives.max(1);
        if rules.starting_lives > max_lives {
            warn!(
                "config: starting_lives {} exceeds max_lives {}; raising the cap",
                rules.starting_lives, max_lives
            );
            max_lives = rules.starting_lives;
        }

        GameConfig {
            timing: TimingConfig {
                frame_sleep_ms: toml_cfg.timing.frame_sleep_ms,
                move_repeat_ms: toml_cfg.timing.move_repeat_ms,
                enemy_move_ms: toml_cfg.timing.enemy_move_ms,
                sprite_toggle_ms: toml_cfg.timing.sprite_toggle_ms,
                boomerang_tiles_per_second: toml_cfg.timing.boomerang_tiles_per_second.max(1),
                pack_spawn_ms: toml_cfg.timing.pack_spawn_ms,
                banner_ms: toml_cfg.timing.banner_ms,
            },
            rules: RulesConfig {
                starting_lives: rules.starting_lives.max(1),
                max_lives,
                stage_time: rules.stage_time,
                pickup_capacity: rules.pickup_capacity,
                spawn_max_attempts: rules.spawn_max_attempts.max(1),
                seed: rules.seed,
            },
            gamepad: GamepadConfig {
                throw: toml_cfg.gamepad.throw,
                pause: toml_cfg.gamepad.pause,
            },
            stages_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
pub fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    info!("config: loaded {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    warn!("config: {} parse error: {e}; using defaults", path.display());
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                warn!("config: could not read {}: {e}", path.display());
            }
        }
    }
    TomlConfig::default()
}
