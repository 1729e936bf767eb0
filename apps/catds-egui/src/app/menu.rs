use std::path::PathBuf;

use catds_runtime::{RunState, ScreenScale};
use eframe::egui;
use egui::{Context as EguiContext, MenuBar, TextWrapMode};

use super::{
    CatdsApp,
    dialogs::{pick_rom_dialog, pick_state_dialog, save_screenshot_dialog, save_state_dialog},
};

#[derive(Default)]
pub(super) struct AppCommand {
    pub load_rom: Option<PathBuf>,
    pub close: bool,
    pub run: bool,
    pub pause: bool,
    pub step: bool,
    pub reset: bool,
    pub save_state: Option<PathBuf>,
    pub load_state: Option<PathBuf>,
    pub screenshot: Option<PathBuf>,
    pub scale: Option<ScreenScale>,
    pub quit: bool,
}

impl AppCommand {
    pub(super) fn merge(&mut self, other: AppCommand) {
        self.load_rom = other.load_rom.or(self.load_rom.take());
        self.close |= other.close;
        self.run |= other.run;
        self.pause |= other.pause;
        self.step |= other.step;
        self.reset |= other.reset;
        self.save_state = other.save_state.or(self.save_state.take());
        self.load_state = other.load_state.or(self.load_state.take());
        self.screenshot = other.screenshot.or(self.screenshot.take());
        self.scale = other.scale.or(self.scale);
        self.quit |= other.quit;
    }
}

impl CatdsApp {
    pub(super) fn draw_menu(&mut self, ctx: &EguiContext) -> AppCommand {
        let mut cmd = AppCommand::default();
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            MenuBar::new().ui(ui, |ui| self.menu_contents(ui, &mut cmd));
        });
        cmd
    }

    fn menu_contents(&mut self, ui: &mut egui::Ui, cmd: &mut AppCommand) {
        let has_rom = self.has_rom();

        ui.menu_button("File", |ui| {
            ui.style_mut().wrap_mode = Some(TextWrapMode::Extend);

            if ui.button("Open ROM…").clicked() {
                cmd.load_rom = pick_rom_dialog();
                ui.close();
            }
            if ui
                .add_enabled(has_rom, egui::Button::new("Close ROM"))
                .clicked()
            {
                cmd.close = true;
                ui.close();
            }
            ui.separator();
            if ui
                .add_enabled(has_rom, egui::Button::new("Save State…"))
                .clicked()
            {
                cmd.save_state = save_state_dialog();
                ui.close();
            }
            if ui
                .add_enabled(has_rom, egui::Button::new("Load State…"))
                .clicked()
            {
                cmd.load_state = pick_state_dialog();
                ui.close();
            }
            if ui
                .add_enabled(has_rom, egui::Button::new("Screenshot…"))
                .clicked()
            {
                cmd.screenshot = save_screenshot_dialog(&self.screenshot_name());
                ui.close();
            }
            ui.separator();
            if ui.button("Quit").clicked() {
                cmd.quit = true;
                ui.close();
            }
        });

        ui.menu_button("Emulation", |ui| {
            ui.style_mut().wrap_mode = Some(TextWrapMode::Extend);

            let running = self.run_state == RunState::Running;
            if ui
                .add_enabled(has_rom && !running, egui::Button::new("Run"))
                .clicked()
            {
                cmd.run = true;
                ui.close();
            }
            if ui
                .add_enabled(running, egui::Button::new("Pause"))
                .clicked()
            {
                cmd.pause = true;
                ui.close();
            }
            if ui
                .add_enabled(has_rom, egui::Button::new("Frame Advance"))
                .clicked()
            {
                cmd.step = true;
                ui.close();
            }
            ui.separator();
            if ui
                .add_enabled(has_rom, egui::Button::new("Reset"))
                .clicked()
            {
                cmd.reset = true;
                ui.close();
            }
        });

        ui.menu_button("View", |ui| {
            ui.style_mut().wrap_mode = Some(TextWrapMode::Extend);

            let current = self.presenter.scale();
            for scale in ScreenScale::ALL {
                let label = format!("{}x", scale.factor());
                if ui.selectable_label(current == scale, label).clicked() {
                    cmd.scale = Some(scale);
                    ui.close();
                }
            }
            ui.separator();
            if ui.button("Reset Window Size").clicked() {
                cmd.scale = Some(ScreenScale::default());
                ui.close();
            }
        });

        ui.menu_button("Help", |ui| {
            ui.style_mut().wrap_mode = Some(TextWrapMode::Extend);

            if ui.button("Keyboard Shortcuts").clicked() {
                self.show_shortcuts = true;
                ui.close();
            }
            if ui.button("About").clicked() {
                self.show_about = true;
                ui.close();
            }
        });
    }
}
