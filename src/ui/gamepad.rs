/// Gamepad input tracker using gilrs.
///
/// Physical buttons are named by their face position (South = A, East = B,
/// West = X, North = Y). Action mapping is loaded from config.toml via
/// `load_button_config()`. Default mapping:
///   D-pad / Left Stick    →  Up / Down / Left / Right
///   A (South)             →  A     (throw, confirm)
///   Start                 →  Start (pause)

#[cfg(feature = "gamepad")]
use gilrs::{Axis, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::buttons::{Button, Buttons, FrameInput};

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

#[cfg(feature = "gamepad")]
fn from_gilrs(btn: gilrs::Button) -> Option<Button> {
    use gilrs::Button as G;
    match btn {
        G::South => Some(Button::A),
        G::East => Some(Button::B),
        G::West => Some(Button::X),
        G::North => Some(Button::Y),
        G::LeftTrigger => Some(Button::L),
        G::RightTrigger => Some(Button::R),
        G::Start => Some(Button::Start),
        G::Select => Some(Button::Select),
        G::DPadUp => Some(Button::Up),
        G::DPadDown => Some(Button::Down),
        G::DPadLeft => Some(Button::Left),
        G::DPadRight => Some(Button::Right),
        _ => None,
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    throw: Vec<Button>,
    pause: Vec<Button>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            throw: vec![Button::A],
            pause: vec![Button::Start],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Physical buttons currently down (D-pad included).
    physical: Buttons,
    /// Physical buttons pressed since the last update, kept even if
    /// released again before the frame was read.
    latched: Buttons,

    stick_x: f32,
    stick_y: f32,

    /// Logical held state from the previous update, for stick edges.
    prev_held: Buttons,
    current: FrameInput,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    log::warn!("gamepad support unavailable: {e}");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            physical: Buttons::none(),
            latched: Buttons::none(),
            stick_x: 0.0,
            stick_y: 0.0,
            prev_held: Buttons::none(),
            current: FrameInput::default(),
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Unknown names are skipped; an
    /// action left with no valid names keeps its default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Button> {
            names
                .iter()
                .filter_map(|s| {
                    let b = Button::from_name(s);
                    if b.is_none() {
                        log::warn!("config: unknown gamepad button {s:?}");
                    }
                    b
                })
                .collect()
        }
        let map = &mut self.action_map;
        let throw = parse_list(&cfg.throw);
        if !throw.is_empty() { map.throw = throw; }
        let pause = parse_list(&cfg.pause);
        if !pause.is_empty() { map.pause = pause; }
    }

    pub fn update(&mut self) {
        self.latched = Buttons::none();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();

        self.compose();
    }

    fn compose(&mut self) {
        let held = self.logical(self.physical, true);
        let mut frame = FrameInput::from_snapshots(self.prev_held, held);
        frame.pressed = frame.pressed.merge(self.logical(self.latched, false));
        frame.held = frame.held.merge(frame.pressed);
        self.prev_held = held;
        self.current = frame;
    }

    /// Gamepad contribution to this frame's controller snapshot.
    pub fn frame(&self) -> FrameInput {
        self.current
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    if let Some(b) = from_gilrs(btn) {
                        self.physical.set(b, true);
                        self.latched.set(b, true);
                    }
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    if let Some(b) = from_gilrs(btn) {
                        self.physical.set(b, false);
                    }
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    // ── Internal ──

    /// Physical state → logical slots: directions pass through, the
    /// stick adds to them, and action lists drive A and Start.
    fn logical(&self, physical: Buttons, with_stick: bool) -> Buttons {
        let mut out = Buttons::none();
        for dir in [Button::Up, Button::Down, Button::Left, Button::Right] {
            out.set(dir, physical.is_down(dir));
        }
        if with_stick {
            if self.stick_x < -STICK_DEADZONE { out.set(Button::Left, true); }
            if self.stick_x > STICK_DEADZONE { out.set(Button::Right, true); }
            if self.stick_y > STICK_DEADZONE { out.set(Button::Up, true); }
            if self.stick_y < -STICK_DEADZONE { out.set(Button::Down, true); }
        }
        if self.action_map.throw.iter().any(|&b| physical.is_down(b)) {
            out.set(Button::A, true);
        }
        if self.action_map.pause.iter().any(|&b| physical.is_down(b)) {
            out.set(Button::Start, true);
        }
        out
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.physical = Buttons::none();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad() -> GamepadState {
        let mut g = GamepadState::new();
        g.physical = Buttons::none();
        g
    }

    #[test]
    fn stick_past_deadzone_moves() {
        let mut g = pad();
        g.stick_x = 0.8;
        g.compose();
        assert!(g.frame().held.is_down(Button::Right));
        assert!(g.frame().was_pressed(Button::Right));

        g.compose();
        assert!(g.frame().held.is_down(Button::Right));
        assert!(!g.frame().was_pressed(Button::Right), "only the crossing is an edge");

        g.stick_x = 0.1;
        g.compose();
        assert!(!g.frame().held.is_down(Button::Right));
    }

    #[test]
    fn remapped_throw_button() {
        let mut g = pad();
        g.load_button_config(&GamepadConfig {
            throw: vec!["B".into(), "bogus".into()],
            pause: vec![],
        });
        let held = g.logical(Buttons::none().with(Button::B).with(Button::Start), false);
        assert!(held.is_down(Button::A));
        assert!(held.is_down(Button::Start), "empty list keeps the default");
        assert!(!g.logical(Buttons::none().with(Button::A), false).is_down(Button::A));
    }

    #[test]
    fn tap_between_updates_still_counts() {
        let mut g = pad();
        g.latched = Buttons::none().with(Button::Start);
        g.compose();
        assert!(g.frame().was_pressed(Button::Start));
        assert!(g.frame().held.is_down(Button::Start));
    }
}
