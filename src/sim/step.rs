/// The step function: advances a playing session by one frame.
///
/// Processing order:
///   1. Player movement (fresh press or held auto-repeat)
///   2. Collision resolver: enemies → pickups → vehicles → exit
///   3. Sprite toggle            (sprite_toggle timer)
///   4. Enemy patrol             (enemy_move timer)
///   5. Boomerang throw + flight (boomerang timer)
///   6. Pickup spawner           (pack_spawn timer)
///   7. Countdown
///
/// Collisions run every frame, moved or not, so an enemy that patrols onto
/// a standing player is caught on the following frame.

use log::{debug, info, warn};

use crate::domain::ai::{self, PatrolOutcome};
use crate::domain::buttons::{Button, FrameInput};
use crate::domain::entity::PickupKind;
use crate::domain::rules::{self, MoveOutcome};
use super::event::GameEvent;
use super::spawn::{self, SpawnOutcome};
use super::world::Session;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(session: &mut Session, input: &FrameInput, throw: Button, now: u64) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    if session.win || session.lose {
        return events;
    }

    resolve_player_movement(session, input, now, &mut events);
    resolve_collisions(session, &mut events);
    resolve_animation(session, now);
    resolve_enemy_patrol(session, now, &mut events);
    resolve_throw(session, input, throw, now, &mut events);
    resolve_boomerang(session, now, &mut events);
    resolve_spawner(session, now, &mut events);
    resolve_countdown(session, now, &mut events);

    for e in &events {
        debug!("event: {e:?}");
    }
    events
}

// ══════════════════════════════════════════════════════════════
// Player movement
// ══════════════════════════════════════════════════════════════

/// One attempt per fresh press; while the same direction stays held,
/// another attempt every `move_repeat_ms` (never, when that is 0).
fn resolve_player_movement(session: &mut Session, input: &FrameInput, now: u64, events: &mut Vec<GameEvent>) {
    let dir = match input.held.direction() {
        Some(d) => d,
        None => {
            session.held_dir = None;
            return;
        }
    };

    let fresh = session.held_dir != Some(dir) || input.pressed.direction() == Some(dir);
    let attempt = if fresh {
        session.timers.move_repeat.rearm(now);
        true
    } else {
        session.move_repeat_ms > 0 && session.timers.move_repeat.fire(now)
    };
    session.held_dir = Some(dir);
    if !attempt {
        return;
    }

    let from = session.player.pos;
    match rules::resolve_move(&session.map, &mut session.player, dir) {
        MoveOutcome::Moved { from } => {
            events.push(GameEvent::PlayerMoved { from, to: session.player.pos });
        }
        MoveOutcome::Blocked => events.push(GameEvent::Bumped { at: from }),
    }
}

// ══════════════════════════════════════════════════════════════
// Collision resolver
// ══════════════════════════════════════════════════════════════

fn resolve_collisions(session: &mut Session, events: &mut Vec<GameEvent>) {
    resolve_enemy_contact(session, events);
    resolve_pickups(session, events);
    resolve_vehicles(session, events);
    resolve_exit(session, events);
}

/// Every live enemy on the player's cell costs a life; no dedup.
fn resolve_enemy_contact(session: &mut Session, events: &mut Vec<GameEvent>) {
    if session.player.immune {
        return;
    }
    let at = session.player.pos;
    for (i, enemy) in session.enemies.iter().enumerate() {
        if !enemy.exists || enemy.pos != at {
            continue;
        }
        session.lives = session.lives.saturating_sub(1);
        session.player.immune = true;
        info!("life lost to enemy {i} at ({}, {}); {} left", at.x, at.y, session.lives);
        events.push(GameEvent::LifeLost { enemy: i, lives_left: session.lives });
        if session.lives == 0 {
            session.lose = true;
        }
    }
}

fn resolve_pickups(session: &mut Session, events: &mut Vec<GameEvent>) {
    let at = session.player.pos;
    for (slot, pickup) in session.pickups.iter_mut().enumerate() {
        if !pickup.exists || pickup.pos != at {
            continue;
        }
        match pickup.kind {
            PickupKind::Health => session.lives = (session.lives + 1).min(session.max_lives),
            PickupKind::Point => session.player.coins_grabbed += 1,
            PickupKind::BoomerangGrant => session.player.has_boomerang = true,
        }
        pickup.exists = false;
        events.push(GameEvent::PickupCollected { slot, kind: pickup.kind, at });
    }
}

/// Each vehicle re-reads the player position, so a finish that sits on
/// another vehicle's start chains within the same frame.
fn resolve_vehicles(session: &mut Session, events: &mut Vec<GameEvent>) {
    if session.player.immune {
        return;
    }
    for (i, v) in session.vehicles.iter().enumerate() {
        let from = session.player.pos;
        let to = if from == v.start {
            v.finish
        } else if v.bidirectional && from == v.finish {
            v.start
        } else {
            continue;
        };
        session.player.pos = to;
        session.player.immune = true;
        events.push(GameEvent::Teleported { vehicle: i, from, to });
    }
}

fn resolve_exit(session: &mut Session, events: &mut Vec<GameEvent>) {
    if session.exit.exists && session.player.pos == session.exit.pos {
        session.win = true;
        session.exit.exists = false;
        events.push(GameEvent::ExitReached);
    }
}

// ══════════════════════════════════════════════════════════════
// Timed subsystems
// ══════════════════════════════════════════════════════════════

fn resolve_animation(session: &mut Session, now: u64) {
    if !session.timers.sprite_toggle.fire(now) {
        return;
    }
    session.player.anim_frame = !session.player.anim_frame;
    for e in session.enemies.iter_mut().filter(|e| e.exists) {
        e.anim_frame = !e.anim_frame;
    }
}

fn resolve_enemy_patrol(session: &mut Session, now: u64, events: &mut Vec<GameEvent>) {
    if !session.timers.enemy_move.fire(now) {
        return;
    }
    for (_, outcome) in ai::patrol_all(&session.map, &mut session.enemies) {
        if let PatrolOutcome::Stepped { from } = outcome {
            events.push(GameEvent::CellVacated { at: from });
        }
    }
}

fn resolve_throw(session: &mut Session, input: &FrameInput, throw: Button, now: u64, events: &mut Vec<GameEvent>) {
    if !input.was_pressed(throw) {
        return;
    }
    if session.boomerang.launch(&mut session.player) {
        // first flight tick is one full interval after the throw
        session.timers.boomerang.rearm(now);
        events.push(GameEvent::BoomerangThrown { at: session.boomerang.pos });
    }
}

fn resolve_boomerang(session: &mut Session, now: u64, events: &mut Vec<GameEvent>) {
    if !session.boomerang.exists {
        session.timers.boomerang.rearm(now);
        return;
    }
    if !session.timers.boomerang.fire(now) {
        return;
    }
    let width = session.map.width();
    let tick = session.boomerang.advance(width, &mut session.enemies, &mut session.player);
    if let Some(from) = tick.from {
        events.push(GameEvent::CellVacated { at: from });
    }
    for i in tick.killed {
        events.push(GameEvent::EnemyKilled { enemy: i, at: session.boomerang.pos });
    }
    if tick.returned {
        events.push(GameEvent::BoomerangReturned);
    }
}

fn resolve_spawner(session: &mut Session, now: u64, events: &mut Vec<GameEvent>) {
    if !session.timers.pack_spawn.fire(now) {
        return;
    }
    let outcome = spawn::try_spawn(
        &session.map,
        &mut session.pickups,
        session.pickup_capacity,
        session.spawn_max_attempts,
        &mut session.rng,
    );
    match outcome {
        SpawnOutcome::Spawned { slot, kind, at } => {
            events.push(GameEvent::PickupSpawned { slot, kind, at });
        }
        SpawnOutcome::Full => {}
        SpawnOutcome::Starved { attempts } => {
            warn!("spawner: no free cell after {attempts} attempts; skipping this cycle");
            events.push(GameEvent::SpawnSkipped { attempts });
        }
    }
}

fn resolve_countdown(session: &mut Session, now: u64, events: &mut Vec<GameEvent>) {
    let elapsed = now.saturating_sub(session.last_frame_ms);
    session.last_frame_ms = now;
    session.time -= elapsed as i64;
    if session.time <= 0 {
        session.time = 0;
        session.lose = true;
        info!("time up");
        events.push(GameEvent::TimeUp);
    }
}
