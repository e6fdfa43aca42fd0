/// Stage templates: static per-stage data copied into a live session.
///
/// ## Sources (priority order):
///   1. `stages/` directory (individual `.txt` files, sorted by file name)
///   2. Built-in embedded stages
///
/// ## Stage format (`.txt`):
///   Line 1: `# Stage Name`
///   Optional: `@ two-way 1 3` (vehicle ids that also run finish → start)
///   Lines: map rows, all the same width
///
/// ## Legend:
///   ' ' = Empty                  '=' = Platform
///   'H' = Ladder                 'P' = Player start
///   'X' = Exit                   '+' = Health pack
///   '<' / '>' = Ground enemy heading left / right
///   '{' / '}' = Flying enemy heading left / right
///   '$' = Coin                   'B' = Boomerang pack
///   '1'..'9' = Vehicle start     'a'..'i' = Matching vehicle finish
///
/// Entity markers stand on an Empty tile.

use std::path::Path;

use log::{info, warn};
use thiserror::Error;

use crate::domain::entity::{Enemy, Facing, GridPos, Pickup, PickupKind, Vehicle};
use crate::domain::tile::{TileKind, TileMap};

/// Per-kind entity limit for a single stage.
pub const STAGE_CAPACITY: usize = 30;

const VEHICLE_STARTS: &str = "123456789";
const VEHICLE_FINISHES: &str = "abcdefghi";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageTemplate {
    pub name: String,
    pub map: TileMap,
    pub player_start: GridPos,
    pub exit: GridPos,
    pub enemies: Vec<Enemy>,
    pub pickups: Vec<Pickup>,
    pub vehicles: Vec<Vehicle>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StageError {
    #[error("stage has no map rows")]
    Empty,
    #[error("row {row} is {found} cells wide, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("unknown glyph {glyph:?} at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: usize, y: usize },
    #[error("no player start 'P'")]
    MissingPlayer,
    #[error("second player start at ({x}, {y})")]
    DuplicatePlayer { x: usize, y: usize },
    #[error("no exit 'X'")]
    MissingExit,
    #[error("second exit at ({x}, {y})")]
    DuplicateExit { x: usize, y: usize },
    #[error("vehicle {id} is missing its {missing} endpoint")]
    UnpairedVehicle { id: usize, missing: &'static str },
    #[error("vehicle {id} endpoint placed twice")]
    DuplicateVehicleEndpoint { id: usize },
    #[error("two-way list names unknown vehicle {id:?}")]
    UnknownTwoWay { id: String },
    #[error("unrecognised directive {line:?}")]
    BadDirective { line: String },
    #[error("more than {capacity} {what}")]
    OverCapacity { what: &'static str, capacity: usize },
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Stages from `dir` if it holds at least one valid file, else the
/// embedded set.
pub fn load_stages(dir: &Path) -> Vec<StageTemplate> {
    if dir.is_dir() {
        let mut found = load_from_directory(dir);
        if !found.is_empty() {
            found.sort_by(|a, b| a.0.cmp(&b.0));
            info!("stages: {} loaded from {}", found.len(), dir.display());
            return found.into_iter().map(|(_, t)| t).collect();
        }
        warn!("stages: no valid stage files in {}; using built-in stages", dir.display());
    }
    embedded_stages()
}

/// Parse a single stage from text content.
pub fn parse_stage(content: &str) -> Result<StageTemplate, StageError> {
    let mut name = String::new();
    let mut two_way: Vec<String> = vec![];
    let mut rows: Vec<&str> = vec![];

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if rows.is_empty() && line.starts_with('#') {
            if name.is_empty() {
                name = line[1..].trim().to_string();
            }
        } else if rows.is_empty() && line.starts_with('@') {
            let mut words = line[1..].split_whitespace();
            match words.next() {
                Some("two-way") => two_way.extend(words.map(str::to_string)),
                _ => return Err(StageError::BadDirective { line: line.to_string() }),
            }
        } else {
            rows.push(line);
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    if name.is_empty() {
        name = "Unnamed Stage".to_string();
    }

    build_template(name, &two_way, &rows)
}

// ══════════════════════════════════════════════════════════════
// Template construction
// ══════════════════════════════════════════════════════════════

fn build_template(name: String, two_way: &[String], rows: &[&str]) -> Result<StageTemplate, StageError> {
    if rows.is_empty() {
        return Err(StageError::Empty);
    }
    let width = rows[0].chars().count();
    if width == 0 {
        return Err(StageError::Empty);
    }
    let height = rows.len();

    let mut tiles = Vec::with_capacity(width * height);
    let mut player = None;
    let mut exit = None;
    let mut enemies = vec![];
    let mut pickups = vec![];
    let mut starts: [Option<GridPos>; 9] = [None; 9];
    let mut finishes: [Option<GridPos>; 9] = [None; 9];

    for (y, row) in rows.iter().enumerate() {
        let found = row.chars().count();
        if found != width {
            return Err(StageError::Ragged { row: y, expected: width, found });
        }
        for (x, ch) in row.chars().enumerate() {
            if let Some(kind) = TileKind::from_glyph(ch) {
                tiles.push(kind);
                continue;
            }
            tiles.push(TileKind::Empty);
            let at = GridPos::new(x, y);
            match ch {
                'P' => {
                    if player.replace(at).is_some() {
                        return Err(StageError::DuplicatePlayer { x, y });
                    }
                }
                'X' => {
                    if exit.replace(at).is_some() {
                        return Err(StageError::DuplicateExit { x, y });
                    }
                }
                '<' => enemies.push(Enemy::new(at, Facing::Left, false)),
                '>' => enemies.push(Enemy::new(at, Facing::Right, false)),
                '{' => enemies.push(Enemy::new(at, Facing::Left, true)),
                '}' => enemies.push(Enemy::new(at, Facing::Right, true)),
                '+' => pickups.push(Pickup::new(at, PickupKind::Health)),
                '$' => pickups.push(Pickup::new(at, PickupKind::Point)),
                'B' => pickups.push(Pickup::new(at, PickupKind::BoomerangGrant)),
                c => {
                    let (slot, id) = if let Some(i) = VEHICLE_STARTS.find(c) {
                        (&mut starts[i], i + 1)
                    } else if let Some(i) = VEHICLE_FINISHES.find(c) {
                        (&mut finishes[i], i + 1)
                    } else {
                        return Err(StageError::UnknownGlyph { glyph: c, x, y });
                    };
                    if slot.replace(at).is_some() {
                        return Err(StageError::DuplicateVehicleEndpoint { id });
                    }
                }
            }
        }
    }

    let player_start = player.ok_or(StageError::MissingPlayer)?;
    let exit = exit.ok_or(StageError::MissingExit)?;

    if enemies.len() > STAGE_CAPACITY {
        return Err(StageError::OverCapacity { what: "enemies", capacity: STAGE_CAPACITY });
    }
    if pickups.len() > STAGE_CAPACITY {
        return Err(StageError::OverCapacity { what: "pickups", capacity: STAGE_CAPACITY });
    }

    // ── Vehicles: pair endpoints by id, then apply the two-way list ──
    let mut bidirectional = [false; 9];
    for id in two_way {
        let idx = id
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=9).contains(n) && starts[n - 1].is_some())
            .ok_or_else(|| StageError::UnknownTwoWay { id: id.clone() })?;
        bidirectional[idx - 1] = true;
    }

    let mut vehicles = vec![];
    for i in 0..9 {
        match (starts[i], finishes[i]) {
            (Some(start), Some(finish)) => vehicles.push(Vehicle {
                start,
                finish,
                bidirectional: bidirectional[i],
            }),
            (Some(_), None) => return Err(StageError::UnpairedVehicle { id: i + 1, missing: "finish" }),
            (None, Some(_)) => return Err(StageError::UnpairedVehicle { id: i + 1, missing: "start" }),
            (None, None) => {}
        }
    }

    let map = TileMap::new(width, height, tiles).ok_or(StageError::Empty)?;

    Ok(StageTemplate {
        name,
        map,
        player_start,
        exit,
        enemies,
        pickups,
        vehicles,
    })
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<(String, StageTemplate)> {
    let mut results = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!("stages: cannot read {}: {e}", dir.display());
            return results;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().map_or(false, |e| e == "txt") {
            continue;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!("stages: cannot read {}: {e}", path.display());
                continue;
            }
        };
        match parse_stage(&content) {
            Ok(template) => {
                let filename = path.file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string();
                results.push((filename, template));
            }
            Err(e) => warn!("stages: skipping {}: {e}", path.display()),
        }
    }

    results
}

// ══════════════════════════════════════════════════════════════
// Embedded stages
// ══════════════════════════════════════════════════════════════

pub fn embedded_stages() -> Vec<StageTemplate> {
    let defs: [(&str, &[&str], &[&str]); 3] = [
        ("Stage 1 - Jungle Floor", &["2"], &[
            "   H X  H           ",
            "   H====H=          ",
            " 1 H    H           ",
            "====    H           ",
            "   $H   H           ",
            "Ha =H====           ",
            "H== H         +H    ",
            "H2  H     =====H====",
            "======         H    ",
            "               H    ",
            "               H    ",
            "               H    ",
            " b    H   <    H    ",
            "======H=============",
            "      H             ",
            "      H             ",
            "  P   H          H  ",
            "=================H==",
            "               < H B",
            "====================",
        ]),
        ("Stage 2 - Canopy", &["2"], &[
            "                    ",
            "                    ",
            "     H            Xa",
            "   ==H==============",
            "     H    {         ",
            "     H              ",
            "b +  H          H   ",
            "================H=  ",
            "                H   ",
            "                H   ",
            "   H    >       HH 1",
            "  =H=============H==",
            "   H             H  ",
            "   H             H  ",
            "2  H     H     < H$ ",
            "=========H==  ======",
            "         H          ",
            "         H          ",
            " P    B  H  <       ",
            "====================",
        ]),
        ("Stage 3 - Summit", &["1"], &[
            "       H  X   b     ",
            "      =H=======     ",
            "       H            ",
            "1      H  H         ",
            "==========H=        ",
            "          H {       ",
            "        H H    <   $",
            "       =H===========",
            "   }    H           ",
            " +  2   H  H        ",
            "===========H=       ",
            "           H        ",
            "      H    H   <   a",
            "    ==H=============",
            "      H             ",
            "$     H  >    H     ",
            "==============H=    ",
            "              H     ",
            "   <          H  BP ",
            "====================",
        ]),
    ];

    let mut stages = vec![];
    for (name, two_way, rows) in defs {
        let two_way: Vec<String> = two_way.iter().map(|s| s.to_string()).collect();
        match build_template(name.to_string(), &two_way, rows) {
            Ok(t) => stages.push(t),
            Err(e) => warn!("stages: built-in {name:?} rejected: {e}"),
        }
    }
    stages
}
