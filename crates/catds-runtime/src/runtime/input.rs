//! Keyboard and touch edges from the UI thread, applied straight to the core.
//!
//! Nothing is queued: each edge updates the held-input state and pushes the
//! whole state to the core under the core lock. Whatever is held when the
//! frame pump next takes that lock is what the frame sees, so a press and
//! release landing between two frames collapse to "released".

use std::collections::HashMap;

use catds_core::{Button, InputState, TouchPoint};

use crate::present::ScreenScale;

use super::handle::RuntimeHandle;

/// Maps UI key names to console buttons.
#[derive(Debug, Clone)]
pub struct KeyMap {
    map: HashMap<String, Button>,
}

impl KeyMap {
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn bind(&mut self, key: impl Into<String>, button: Button) {
        self.map.insert(key.into(), button);
    }

    pub fn get(&self, key: &str) -> Option<Button> {
        self.map.get(key).copied()
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, Button)> + '_ {
        self.map.iter().map(|(key, button)| (key.as_str(), *button))
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        let mut map = Self::empty();
        for (key, button) in [
            ("z", Button::A),
            ("x", Button::B),
            ("a", Button::Y),
            ("s", Button::X),
            ("q", Button::L),
            ("w", Button::R),
            ("Return", Button::Start),
            ("BackSpace", Button::Select),
            ("Up", Button::Up),
            ("Down", Button::Down),
            ("Left", Button::Left),
            ("Right", Button::Right),
        ] {
            map.bind(key, button);
        }
        map
    }
}

/// Converts a position on the scaled bottom screen to a native touch point.
///
/// Positions outside the screen are dropped rather than clamped.
pub fn map_touch(x: f32, y: f32, scale: ScreenScale) -> Option<TouchPoint> {
    let factor = scale.factor() as f32;
    let (tx, ty) = ((x / factor).floor(), (y / factor).floor());
    if !(tx >= 0.0 && ty >= 0.0 && tx <= u16::MAX as f32 && ty <= u16::MAX as f32) {
        return None;
    }
    TouchPoint::new(tx as u16, ty as u16)
}

pub struct InputRouter {
    handle: RuntimeHandle,
    key_map: KeyMap,
}

impl InputRouter {
    pub(crate) fn new(handle: RuntimeHandle, key_map: KeyMap) -> Self {
        Self { handle, key_map }
    }

    pub fn key_map(&self) -> &KeyMap {
        &self.key_map
    }

    /// Returns `true` when the key is bound to a button.
    pub fn key_press(&self, key: &str) -> bool {
        if let Some(button) = self.key_map.get(key) {
            self.button_press(button);
            true
        } else {
            false
        }
    }

    pub fn key_release(&self, key: &str) -> bool {
        if let Some(button) = self.key_map.get(key) {
            self.button_release(button);
            true
        } else {
            false
        }
    }

    pub fn button_press(&self, button: Button) {
        self.update(true, |input| input.press(button));
    }

    pub fn button_release(&self, button: Button) {
        self.update(false, |input| input.release(button));
    }

    /// Touch press or drag at a position on the scaled bottom screen.
    ///
    /// Returns `false` (leaving touch state untouched) when the position is
    /// outside the screen.
    pub fn touch(&self, x: f32, y: f32, scale: ScreenScale) -> bool {
        let Some(point) = map_touch(x, y, scale) else {
            return false;
        };
        self.update(true, |input| input.set_touch(point));
        true
    }

    /// Clears touch state unconditionally.
    pub fn touch_release(&self) {
        self.update(false, InputState::clear_touch);
    }

    pub fn input_state(&self) -> InputState {
        self.handle.inner().core.lock().input
    }

    /// Presses need a session; releases always go through so nothing stays
    /// stuck across a close.
    fn update(&self, press: bool, edit: impl FnOnce(&mut InputState)) {
        let inner = self.handle.inner();
        let mut cell = inner.core.lock();
        if press && !inner.state.has_session() {
            return;
        }
        edit(&mut cell.input);
        let input = cell.input;
        cell.core.apply_input(&input);
    }
}
