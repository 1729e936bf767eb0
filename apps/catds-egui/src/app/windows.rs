use eframe::egui;
use egui::{Color32, Context as EguiContext, RichText};

use super::{CatdsApp, keys::SHORTCUTS};

impl CatdsApp {
    pub(super) fn draw_status_bar(&self, ctx: &EguiContext) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(self.run_state.label()).monospace().strong());
                ui.separator();
                if self.has_rom() {
                    ui.label(format!("FPS: {:.1}", self.fps));
                } else {
                    ui.label("FPS: --");
                }
                ui.separator();
                ui.label(format!("Frame: {}", self.frame_counter));

                if let Some(error) = &self.last_error {
                    ui.separator();
                    ui.label(RichText::new(error).color(Color32::LIGHT_RED));
                } else if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });
    }

    pub(super) fn show_error_dialog(&mut self, ctx: &EguiContext) {
        let Some(message) = self.error_dialog.clone() else {
            return;
        };

        let mut open = true;
        let mut close_requested =
            ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Escape));
        egui::Window::new("Error")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message.as_str());
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.button("Copy").clicked() {
                        ui.ctx().copy_text(message.clone());
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("OK").clicked() {
                            close_requested = true;
                        }
                    });
                });
            });

        if !open || close_requested {
            self.error_dialog = None;
        }
    }

    pub(super) fn show_about(&mut self, ctx: &EguiContext) {
        egui::Window::new("About")
            .open(&mut self.show_about)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading(super::APP_TITLE);
                ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                ui.add_space(6.0);
                ui.label("A desktop shell for a dual-screen handheld emulation core.");
            });
    }

    pub(super) fn show_shortcuts(&mut self, ctx: &EguiContext) {
        let key_map = self.input.key_map();
        egui::Window::new("Keyboard Shortcuts")
            .open(&mut self.show_shortcuts)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("shortcut_grid").striped(true).show(ui, |ui| {
                    for (keys, action) in SHORTCUTS {
                        ui.monospace(*keys);
                        ui.label(*action);
                        ui.end_row();
                    }
                });
                ui.separator();
                let mut bindings: Vec<_> = key_map.bindings().collect();
                bindings.sort_by_key(|(_, button)| *button as u8);
                egui::Grid::new("button_grid").striped(true).show(ui, |ui| {
                    for (key, button) in bindings {
                        ui.monospace(key);
                        ui.label(button.name());
                        ui.end_row();
                    }
                });
            });
    }
}
