/// Controller snapshot: 16 fixed button slots in SNES shift-register order.
///
/// The hardware side reports lines active-low (`0` = pressed); everything
/// past `from_raw_lines` works with plain `true = pressed`.
///
/// Frame input separates what is held (continuous movement) from what was
/// freshly pressed this frame (menus, pause, throw).

use super::entity::MoveDir;

pub const BUTTON_SLOTS: usize = 16;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Button {
    B = 0,
    Y = 1,
    Select = 2,
    Start = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
    A = 8,
    X = 9,
    L = 10,
    R = 11,
}

impl Button {
    #[inline]
    pub fn slot(self) -> usize {
        self as usize
    }

    /// Parse a config-file button name.
    pub fn from_name(s: &str) -> Option<Button> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Button::A),
            "B" | "EAST" => Some(Button::B),
            "X" | "WEST" => Some(Button::X),
            "Y" | "NORTH" => Some(Button::Y),
            "L" | "L1" | "LB" => Some(Button::L),
            "R" | "R1" | "RB" => Some(Button::R),
            "START" => Some(Button::Start),
            "SELECT" | "BACK" => Some(Button::Select),
            "UP" => Some(Button::Up),
            "DOWN" => Some(Button::Down),
            "LEFT" => Some(Button::Left),
            "RIGHT" => Some(Button::Right),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Buttons([bool; BUTTON_SLOTS]);

impl Buttons {
    pub fn none() -> Self {
        Buttons::default()
    }

    /// Decode active-low controller lines (0 = pressed, non-zero = released).
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn from_raw_lines(lines: [u8; BUTTON_SLOTS]) -> Self {
        let mut b = Buttons::default();
        for (slot, &line) in lines.iter().enumerate() {
            b.0[slot] = line == 0;
        }
        b
    }

    pub fn with(mut self, button: Button) -> Self {
        self.0[button.slot()] = true;
        self
    }

    pub fn set(&mut self, button: Button, down: bool) {
        self.0[button.slot()] = down;
    }

    #[inline]
    pub fn is_down(&self, button: Button) -> bool {
        self.0[button.slot()]
    }

    /// Slot-wise OR, for merging keyboard and gamepad.
    pub fn merge(self, other: Buttons) -> Buttons {
        let mut out = self;
        for (slot, down) in other.0.iter().enumerate() {
            out.0[slot] |= *down;
        }
        out
    }

    /// Held direction with dispatch priority Right > Left > Up > Down.
    pub fn direction(&self) -> Option<MoveDir> {
        if self.is_down(Button::Right) {
            Some(MoveDir::Right)
        } else if self.is_down(Button::Left) {
            Some(MoveDir::Left)
        } else if self.is_down(Button::Up) {
            Some(MoveDir::Up)
        } else if self.is_down(Button::Down) {
            Some(MoveDir::Down)
        } else {
            None
        }
    }
}

/// One frame of input: held state plus rising edges since the last frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FrameInput {
    pub held: Buttons,
    pub pressed: Buttons,
}

impl FrameInput {
    /// Derive edges from the previous frame's held snapshot.
    pub fn from_snapshots(prev: Buttons, now: Buttons) -> Self {
        let mut pressed = Buttons::default();
        for slot in 0..BUTTON_SLOTS {
            pressed.0[slot] = now.0[slot] && !prev.0[slot];
        }
        FrameInput { held: now, pressed }
    }

    /// A button that is both held and fresh.
    #[cfg(test)]
    pub fn press(button: Button) -> Self {
        let b = Buttons::none().with(button);
        FrameInput { held: b, pressed: b }
    }

    pub fn was_pressed(&self, button: Button) -> bool {
        self.pressed.is_down(button)
    }

    /// Combine two input sources (keyboard + gamepad).
    pub fn merge(self, other: FrameInput) -> FrameInput {
        FrameInput {
            held: self.held.merge(other.held),
            pressed: self.pressed.merge(other.pressed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_lines_are_active_low() {
        let mut lines = [1u8; BUTTON_SLOTS];
        lines[Button::Start.slot()] = 0;
        lines[Button::A.slot()] = 0;
        let b = Buttons::from_raw_lines(lines);
        assert!(b.is_down(Button::Start));
        assert!(b.is_down(Button::A));
        assert!(!b.is_down(Button::Up));
    }

    #[test]
    fn direction_priority_right_first() {
        let all = Buttons::none()
            .with(Button::Up)
            .with(Button::Down)
            .with(Button::Left)
            .with(Button::Right);
        assert_eq!(all.direction(), Some(MoveDir::Right));

        let no_right = Buttons::none().with(Button::Up).with(Button::Left);
        assert_eq!(no_right.direction(), Some(MoveDir::Left));

        let vertical = Buttons::none().with(Button::Down).with(Button::Up);
        assert_eq!(vertical.direction(), Some(MoveDir::Up));

        assert_eq!(Buttons::none().direction(), None);
    }

    #[test]
    fn edges_only_on_rising() {
        let prev = Buttons::none().with(Button::A);
        let now = Buttons::none().with(Button::A).with(Button::Start);
        let f = FrameInput::from_snapshots(prev, now);
        assert!(f.was_pressed(Button::Start));
        assert!(!f.was_pressed(Button::A));
        assert!(f.held.is_down(Button::A));
    }

    #[test]
    fn button_names_parse() {
        assert_eq!(Button::from_name("start"), Some(Button::Start));
        assert_eq!(Button::from_name("South"), Some(Button::A));
        assert_eq!(Button::from_name("L1"), Some(Button::L));
        assert_eq!(Button::from_name("nope"), None);
    }
}
