/// Keyboard input tracker.
///
/// Tracks which keys are currently held down and folds them into the
/// 16-slot controller snapshot the simulation reads:
///   - held keys    → `FrameInput::held`   (movement, auto-repeat)
///   - fresh keys   → `FrameInput::pressed` (menus, pause, throw)
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::buttons::{Button, Buttons, FrameInput};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Keyboard layout → controller slot.
pub fn key_to_button(code: KeyCode) -> Option<Button> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Button::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Button::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Button::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Button::Right),
        KeyCode::Char(' ')
        | KeyCode::Enter
        | KeyCode::Char('z')
        | KeyCode::Char('Z')
        | KeyCode::Char('j')
        | KeyCode::Char('J') => Some(Button::A),
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Esc => Some(Button::Start),
        _ => None,
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation runs.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // rely on timeout-based expiry instead
            }
            _ => {
                let was_held = self.is_held_at(key.code, at);
                self.last_active.insert(key.code, at);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Current keyboard contribution to the controller snapshot.
    pub fn frame(&self) -> FrameInput {
        let now = Instant::now();
        let mut held = Buttons::none();
        for code in self.last_active.keys() {
            if let Some(b) = key_to_button(*code) {
                if self.is_held_at(*code, now) {
                    held.set(b, true);
                }
            }
        }
        let mut pressed = Buttons::none();
        for code in &self.fresh_presses {
            if let Some(b) = key_to_button(*code) {
                pressed.set(b, true);
                held.set(b, true);
            }
        }
        FrameInput { held, pressed }
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active.get(&code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    #[test]
    fn layout_covers_both_hands() {
        assert_eq!(key_to_button(KeyCode::Right), Some(Button::Right));
        assert_eq!(key_to_button(KeyCode::Char('a')), Some(Button::Left));
        assert_eq!(key_to_button(KeyCode::Char(' ')), Some(Button::A));
        assert_eq!(key_to_button(KeyCode::Enter), Some(Button::A));
        assert_eq!(key_to_button(KeyCode::Esc), Some(Button::Start));
        assert_eq!(key_to_button(KeyCode::Char('q')), None);
    }

    #[test]
    fn first_press_is_fresh_repeat_is_not() {
        let mut input = InputState::new();
        let t = Instant::now();
        input.record(key(KeyCode::Right, KeyEventKind::Press), t);
        let f = input.frame();
        assert!(f.held.is_down(Button::Right));
        assert!(f.was_pressed(Button::Right));

        input.fresh_presses.clear();
        input.record(key(KeyCode::Right, KeyEventKind::Repeat), t);
        let f = input.frame();
        assert!(f.held.is_down(Button::Right));
        assert!(!f.was_pressed(Button::Right));
    }

    #[test]
    fn release_honored_only_with_enhancement() {
        let mut input = InputState::new();
        let t = Instant::now();
        input.record(key(KeyCode::Char('z'), KeyEventKind::Press), t);
        input.record(key(KeyCode::Char('z'), KeyEventKind::Release), t);
        input.fresh_presses.clear();
        assert!(input.frame().held.is_down(Button::A));

        input.honor_release = true;
        input.record(key(KeyCode::Char('z'), KeyEventKind::Release), t);
        assert!(!input.frame().held.is_down(Button::A));
    }

    #[test]
    fn ctrl_c_detected() {
        let mut input = InputState::new();
        let ev = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        input.record(ev, Instant::now());
        assert!(input.ctrl_c_pressed());
    }
}
