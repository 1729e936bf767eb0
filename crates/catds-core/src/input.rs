//! Logical handheld input: twelve buttons plus the bottom-screen touch panel.

use serde::{Deserialize, Serialize};

use crate::screen::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Button ordering follows the console's key register layout (A first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    A = 0,
    B = 1,
    Select = 2,
    Start = 3,
    Right = 4,
    Left = 5,
    Up = 6,
    Down = 7,
    R = 8,
    L = 9,
    X = 10,
    Y = 11,
}

impl Button {
    pub const ALL: [Self; 12] = [
        Self::A,
        Self::B,
        Self::Select,
        Self::Start,
        Self::Right,
        Self::Left,
        Self::Up,
        Self::Down,
        Self::R,
        Self::L,
        Self::X,
        Self::Y,
    ];

    #[inline]
    pub const fn bit(self) -> u16 {
        1u16 << (self as u16)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::Select => "SELECT",
            Self::Start => "START",
            Self::Right => "RIGHT",
            Self::Left => "LEFT",
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::R => "R",
            Self::L => "L",
            Self::X => "X",
            Self::Y => "Y",
        }
    }
}

/// A point on the bottom (touch) screen in native pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
}

impl TouchPoint {
    /// Returns `None` when the point falls outside the touch screen.
    pub fn new(x: u16, y: u16) -> Option<Self> {
        ((x as usize) < SCREEN_WIDTH && (y as usize) < SCREEN_HEIGHT).then_some(Self { x, y })
    }
}

/// Currently held buttons and the active touch point, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    held: u16,
    touch: Option<TouchPoint>,
}

impl InputState {
    pub fn press(&mut self, button: Button) {
        self.held |= button.bit();
    }

    pub fn release(&mut self, button: Button) {
        self.held &= !button.bit();
    }

    pub fn is_held(&self, button: Button) -> bool {
        self.held & button.bit() != 0
    }

    /// Bitmask of held buttons, one bit per [`Button`] discriminant.
    pub fn held_mask(&self) -> u16 {
        self.held
    }

    pub fn held(&self) -> impl Iterator<Item = Button> + '_ {
        Button::ALL.into_iter().filter(|b| self.is_held(*b))
    }

    pub fn touch(&self) -> Option<TouchPoint> {
        self.touch
    }

    pub fn set_touch(&mut self, point: TouchPoint) {
        self.touch = Some(point);
    }

    pub fn clear_touch(&mut self) {
        self.touch = None;
    }

    pub fn release_all(&mut self) {
        self.held = 0;
        self.touch = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release_toggle_single_bit() {
        let mut input = InputState::default();
        input.press(Button::Start);
        input.press(Button::L);
        assert!(input.is_held(Button::Start));
        assert_eq!(input.held_mask(), Button::Start.bit() | Button::L.bit());

        input.release(Button::Start);
        assert!(!input.is_held(Button::Start));
        assert_eq!(input.held().collect::<Vec<_>>(), vec![Button::L]);
    }

    #[test]
    fn touch_point_rejects_out_of_bounds() {
        assert!(TouchPoint::new(255, 191).is_some());
        assert!(TouchPoint::new(256, 0).is_none());
        assert!(TouchPoint::new(0, 192).is_none());
    }

    #[test]
    fn release_all_clears_touch() {
        let mut input = InputState::default();
        input.press(Button::A);
        input.set_touch(TouchPoint { x: 10, y: 20 });
        input.release_all();
        assert_eq!(input, InputState::default());
    }
}
