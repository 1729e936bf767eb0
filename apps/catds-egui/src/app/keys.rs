//! Keyboard handling: application shortcuts first, then console buttons.

use std::borrow::Cow;

use eframe::egui;
use egui::{Context as EguiContext, Key, Modifiers};

use super::{
    CatdsApp,
    dialogs::{pick_rom_dialog, pick_state_dialog, save_screenshot_dialog, save_state_dialog},
    menu::AppCommand,
};

pub(super) const SHORTCUTS: &[(&str, &str)] = &[
    ("Ctrl+O", "Open ROM"),
    ("Ctrl+R", "Reset"),
    ("F5", "Save state"),
    ("F7", "Load state"),
    ("F8", "Pause"),
    ("F9", "Run"),
    ("F12", "Screenshot"),
    (".", "Frame advance"),
];

/// X11-style keysym name for `key`, the vocabulary the key map is written in.
fn keysym(key: Key) -> Option<Cow<'static, str>> {
    let name = match key {
        Key::Enter => "Return",
        Key::Backspace => "BackSpace",
        Key::ArrowUp => "Up",
        Key::ArrowDown => "Down",
        Key::ArrowLeft => "Left",
        Key::ArrowRight => "Right",
        Key::Space => "space",
        Key::Tab => "Tab",
        other => {
            let name = other.name();
            if name.len() == 1 && name.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Some(Cow::Owned(name.to_ascii_lowercase()));
            }
            return None;
        }
    };
    Some(Cow::Borrowed(name))
}

impl CatdsApp {
    pub(super) fn handle_shortcuts(&mut self, ctx: &EguiContext) -> AppCommand {
        let mut cmd = AppCommand::default();
        if ctx.wants_keyboard_input() {
            return cmd;
        }

        let pressed =
            |modifiers: Modifiers, key: Key| ctx.input_mut(|i| i.consume_key(modifiers, key));
        let has_rom = self.has_rom();

        if pressed(Modifiers::COMMAND, Key::O) {
            cmd.load_rom = pick_rom_dialog();
        }
        if pressed(Modifiers::COMMAND, Key::R) && has_rom {
            cmd.reset = true;
        }
        if pressed(Modifiers::NONE, Key::F5) && has_rom {
            cmd.save_state = save_state_dialog();
        }
        if pressed(Modifiers::NONE, Key::F7) && has_rom {
            cmd.load_state = pick_state_dialog();
        }
        if pressed(Modifiers::NONE, Key::F8) && has_rom {
            cmd.pause = true;
        }
        if pressed(Modifiers::NONE, Key::F9) && has_rom {
            cmd.run = true;
        }
        if pressed(Modifiers::NONE, Key::F12) && has_rom {
            cmd.screenshot = save_screenshot_dialog(&self.screenshot_name());
        }
        if pressed(Modifiers::NONE, Key::Period) && has_rom {
            cmd.step = true;
        }
        cmd
    }

    /// Forwards key edges to the input router. Repeats are dropped; only the
    /// first press and the release matter.
    pub(super) fn route_keys(&mut self, ctx: &EguiContext) {
        let focused = ctx.input(|i| i.focused);
        if !focused {
            // Releases are lost while unfocused, so drop everything once.
            if self.window_focused {
                for (name, _) in self.input.key_map().bindings() {
                    self.input.key_release(name);
                }
            }
            self.window_focused = false;
            return;
        }
        self.window_focused = true;
        if ctx.wants_keyboard_input() {
            return;
        }

        let edges: Vec<(Key, bool)> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed,
                        repeat: false,
                        modifiers,
                        ..
                    } if !modifiers.command || !*pressed => Some((*key, *pressed)),
                    _ => None,
                })
                .collect()
        });

        for (key, pressed) in edges {
            let Some(name) = keysym(key) else {
                continue;
            };
            let routed = if pressed {
                self.input.key_press(&name)
            } else {
                self.input.key_release(&name)
            };
            if routed {
                tracing::trace!(key = %name, pressed, "key routed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keysyms_match_key_map_names() {
        assert_eq!(keysym(Key::Enter).as_deref(), Some("Return"));
        assert_eq!(keysym(Key::Backspace).as_deref(), Some("BackSpace"));
        assert_eq!(keysym(Key::ArrowLeft).as_deref(), Some("Left"));
        assert_eq!(keysym(Key::Z).as_deref(), Some("z"));
        assert_eq!(keysym(Key::F5), None);
    }
}
