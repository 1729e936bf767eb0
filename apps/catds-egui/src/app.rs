use std::{
    path::{Path, PathBuf},
    time::Instant,
};

mod dialogs;
mod keys;
mod main_view;
mod menu;
mod windows;

use anyhow::{Result, anyhow};
use catds_runtime::{
    InputRouter, KeyMap, PresentationScheduler, RunState, Runtime, RuntimeEvent, RuntimeHandle,
    ScaledScreens, ScreenScale, StateFormat,
};
use eframe::egui;
use egui::{ColorImage, Context as EguiContext, TextureHandle, TextureOptions, Vec2, Visuals};

use self::menu::AppCommand;

pub const APP_TITLE: &str = "Cat's EMU DS";

/// Menu bar plus status bar.
const CHROME_HEIGHT: f32 = 56.0;

/// Inner window size that fits both screens at `scale`.
pub fn window_size(scale: ScreenScale) -> Vec2 {
    let (width, height) = scale.screen_size();
    Vec2::new(width as f32, (height * 2) as f32 + CHROME_HEIGHT)
}

pub struct AppConfig {
    pub rom_path: Option<PathBuf>,
    pub scale: ScreenScale,
}

#[derive(Default)]
struct ScreenTextures {
    top: Option<TextureHandle>,
    bottom: Option<TextureHandle>,
}

pub struct CatdsApp {
    runtime: Runtime,
    runtime_handle: RuntimeHandle,
    presenter: PresentationScheduler,
    input: InputRouter,
    textures: ScreenTextures,
    /// Touch is held on the bottom screen.
    touching: bool,
    window_focused: bool,
    run_state: RunState,
    rom_name: Option<String>,
    frame_counter: u64,
    fps: f32,
    status: Option<String>,
    last_error: Option<String>,
    title: String,
    error_dialog: Option<String>,
    show_about: bool,
    show_shortcuts: bool,
}

impl CatdsApp {
    pub fn new(cc: &eframe::CreationContext<'_>, runtime: Runtime, config: AppConfig) -> Self {
        cc.egui_ctx.set_visuals(Visuals::dark());

        let runtime_handle = runtime.handle();
        let presenter = PresentationScheduler::new(runtime_handle.clone(), config.scale);
        let input = runtime_handle.input_router(KeyMap::default());

        let mut app = Self {
            runtime,
            runtime_handle,
            presenter,
            input,
            textures: ScreenTextures::default(),
            touching: false,
            window_focused: true,
            run_state: RunState::Stopped,
            rom_name: None,
            frame_counter: 0,
            fps: 0.0,
            status: None,
            last_error: None,
            title: APP_TITLE.to_string(),
            error_dialog: None,
            show_about: false,
            show_shortcuts: false,
        };

        if let Some(path) = config.rom_path
            && let Err(err) = app.load_rom(&path)
        {
            app.error_dialog = Some(format!("Failed to load ROM:\n{err}"));
        }

        app
    }

    fn has_rom(&self) -> bool {
        self.run_state != RunState::Stopped
    }

    fn load_rom(&mut self, path: &Path) -> Result<()> {
        self.runtime_handle.load_rom(path)?;
        self.touching = false;
        self.presenter.reset_fps();
        self.sync_session();
        Ok(())
    }

    fn close_rom(&mut self) {
        self.runtime_handle.close();
        self.touching = false;
        self.sync_session();
    }

    fn save_state(&mut self, path: &Path) -> Result<()> {
        self.runtime_handle.save_state(path)?;
        self.status = Some(format!(
            "Saved {} to {}",
            StateFormat::from_path(path).label(),
            path.display()
        ));
        Ok(())
    }

    fn load_state(&mut self, path: &Path) -> Result<()> {
        self.runtime_handle.load_state(path)?;
        self.status = Some(format!(
            "Loaded {} from {}",
            StateFormat::from_path(path).label(),
            path.display()
        ));
        Ok(())
    }

    fn screenshot(&mut self, path: &Path) -> Result<()> {
        self.runtime_handle.screenshot(path)?;
        self.status = Some(format!("Screenshot saved to {}", path.display()));
        Ok(())
    }

    fn set_scale(&mut self, ctx: &EguiContext, scale: ScreenScale) {
        self.presenter.set_scale(scale);
        ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(window_size(scale)));
    }

    /// Default file name for a screenshot of the current frame.
    fn screenshot_name(&self) -> String {
        let stem = self
            .rom_name
            .as_deref()
            .and_then(|name| Path::new(name).file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "catds".to_string());
        format!("{stem}_{:06}.png", self.frame_counter)
    }

    /// Pulls the session view the menus and status bar render from.
    fn sync_session(&mut self) {
        match self.runtime_handle.session() {
            Some(session) => {
                self.run_state = session.run_state;
                self.rom_name = Some(session.rom_name());
                self.last_error = session.last_error;
            }
            None => {
                self.run_state = RunState::Stopped;
                self.rom_name = None;
                self.last_error = None;
            }
        }
    }

    fn process_events(&mut self) {
        while let Some(event) = self.runtime_handle.try_recv_event() {
            match event {
                RuntimeEvent::RomLoaded { path } => {
                    self.status = Some(format!("Loaded {}", path.display()));
                }
                RuntimeEvent::RomClosed => self.status = Some("ROM closed".to_string()),
                RuntimeEvent::Reset => self.status = Some("Reset".to_string()),
                RuntimeEvent::CoreFault { error } => {
                    tracing::error!("{error}");
                    self.status = Some(format!("Emulation paused: {error}"));
                }
                RuntimeEvent::StateSaved { .. }
                | RuntimeEvent::StateLoaded { .. }
                | RuntimeEvent::ScreenshotSaved { .. } => {}
            }
        }
    }

    fn update_textures(
        ctx: &EguiContext,
        textures: &mut ScreenTextures,
        screens: &ScaledScreens,
    ) -> Result<()> {
        let size = [screens.width, screens.height];
        let expected = screens.width * screens.height * 4;
        if screens.top.len() != expected || screens.bottom.len() != expected {
            return Err(anyhow!(
                "scaled screen is {}/{} bytes, expected {expected}",
                screens.top.len(),
                screens.bottom.len()
            ));
        }

        for (slot, name, pixels) in [
            (&mut textures.top, "screen_top", &screens.top),
            (&mut textures.bottom, "screen_bottom", &screens.bottom),
        ] {
            let image = ColorImage::from_rgba_unmultiplied(size, pixels);
            match slot {
                Some(tex) => tex.set(image, TextureOptions::NEAREST),
                None => *slot = Some(ctx.load_texture(name, image, TextureOptions::NEAREST)),
            }
        }
        Ok(())
    }

    fn update_title(&mut self, ctx: &EguiContext) {
        let title = match &self.rom_name {
            Some(name) => format!("{APP_TITLE} - {name}"),
            None => APP_TITLE.to_string(),
        };
        if title != self.title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.title = title;
        }
    }

    fn report(&mut self, context: &str, result: Result<()>) {
        if let Err(err) = result {
            tracing::warn!("{context}: {err}");
            self.error_dialog = Some(format!("{context}:\n{err}"));
        }
    }

    fn handle_app_command(&mut self, ctx: &EguiContext, cmd: AppCommand) {
        if let Some(path) = cmd.load_rom {
            let result = self.load_rom(&path);
            self.report("Load failed", result);
        }
        if cmd.close {
            self.close_rom();
        }
        if cmd.run {
            let result = self.runtime_handle.run().map_err(Into::into);
            self.report("Run failed", result);
        }
        if cmd.pause {
            let result = self.runtime_handle.pause().map_err(Into::into);
            self.report("Pause failed", result);
        }
        if cmd.step {
            let result = self.runtime_handle.step().map(|_| ()).map_err(Into::into);
            self.report("Frame advance failed", result);
        }
        if cmd.reset {
            let result = self.runtime_handle.reset().map_err(Into::into);
            self.report("Reset failed", result);
        }
        if let Some(path) = cmd.save_state {
            let result = self.save_state(&path);
            self.report("Save state failed", result);
        }
        if let Some(path) = cmd.load_state {
            let result = self.load_state(&path);
            self.report("Load state failed", result);
        }
        if let Some(path) = cmd.screenshot {
            let result = self.screenshot(&path);
            self.report("Screenshot failed", result);
        }
        if let Some(scale) = cmd.scale {
            self.set_scale(ctx, scale);
        }
        if cmd.quit {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        self.sync_session();
    }
}

impl eframe::App for CatdsApp {
    fn update(&mut self, ctx: &EguiContext, _: &mut eframe::Frame) {
        // 1. Runtime notifications
        self.process_events();
        self.sync_session();

        // 2. Pull the latest frame
        let textures = &mut self.textures;
        let tick = self.presenter.present(Instant::now(), |screens| {
            Self::update_textures(ctx, textures, screens)
        });
        self.frame_counter = tick.frame_counter;
        if tick.fps_updated {
            self.fps = tick.fps;
        }
        if let Some(next) = tick.next_tick {
            ctx.request_repaint_after(next);
        }

        // 3. Input
        let mut cmd = self.handle_shortcuts(ctx);
        self.route_keys(ctx);

        // 4. Draw UI
        cmd.merge(self.draw_menu(ctx));
        self.handle_app_command(ctx, cmd);
        self.update_title(ctx);

        self.draw_status_bar(ctx);
        self.draw_main_view(ctx);
        self.show_error_dialog(ctx);
        self.show_about(ctx);
        self.show_shortcuts(ctx);
    }
}

impl Drop for CatdsApp {
    fn drop(&mut self) {
        self.presenter.cancel();
        self.runtime.shutdown();
    }
}
