use eframe::egui;
use egui::{Align2, Color32, Context as EguiContext, FontId, Rect, Sense, TextureHandle, Vec2};

use super::CatdsApp;

impl CatdsApp {
    pub(super) fn draw_main_view(&mut self, ctx: &EguiContext) {
        let scale = self.presenter.scale();
        let (width, height) = scale.screen_size();
        let screen_size = Vec2::new(width as f32, height as f32);
        let placeholder = !self.has_rom();

        egui::CentralPanel::default()
            .frame(egui::Frame::central_panel(ctx.style().as_ref()).inner_margin(0))
            .show(ctx, |ui| {
                let area = ui.available_rect_before_wrap();
                ui.painter().rect_filled(area, 0.0, Color32::BLACK);

                let stack = Rect::from_center_size(
                    area.center(),
                    Vec2::new(screen_size.x, screen_size.y * 2.0),
                );
                let top_rect = Rect::from_min_size(stack.min, screen_size);
                let bottom_rect =
                    Rect::from_min_size(stack.min + Vec2::new(0.0, screen_size.y), screen_size);

                paint_screen(
                    ui,
                    self.textures.top.as_ref(),
                    top_rect,
                    placeholder.then_some("TOP"),
                );
                paint_screen(
                    ui,
                    self.textures.bottom.as_ref(),
                    bottom_rect,
                    placeholder.then_some("BOTTOM"),
                );

                let response = ui.interact(bottom_rect, ui.id().with("touch"), Sense::drag());
                self.handle_touch(&response, bottom_rect);
            });
    }

    /// Press and drag feed the touch point; letting go anywhere releases it.
    fn handle_touch(&mut self, response: &egui::Response, rect: Rect) {
        let held = response.is_pointer_button_down_on();
        match response.interact_pointer_pos() {
            Some(pos) if held => {
                let local = pos - rect.min;
                let scale = self.presenter.scale();
                if self.input.touch(local.x, local.y, scale) {
                    self.touching = true;
                }
            }
            _ => {
                if self.touching {
                    self.input.touch_release();
                    self.touching = false;
                }
            }
        }
    }
}

fn paint_screen(ui: &egui::Ui, texture: Option<&TextureHandle>, rect: Rect, label: Option<&str>) {
    let painter = ui.painter();
    if let Some(tex) = texture {
        painter.image(
            tex.id(),
            rect,
            Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            Color32::WHITE,
        );
    }
    if let Some(label) = label {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            label,
            FontId::monospace(24.0),
            Color32::from_gray(96),
        );
    }
}
