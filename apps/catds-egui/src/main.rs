mod app;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use app::{AppConfig, CatdsApp, window_size};
use catds_core::PatternCore;
use catds_runtime::{Runtime, RuntimeConfig, ScreenScale};
use clap::Parser;
use eframe::egui;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_LOG_FILTER: &str = "catds=info";

/// Cat's EMU DS desktop shell
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ROM to load at startup
    rom: Option<PathBuf>,

    /// Integer display scale
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=3))]
    scale: u32,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let Some(path) = log_file else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .context("failed to install log subscriber")?;
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("invalid log file path: {}", path.display()))?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install log subscriber")?;
    Ok(Some(guard))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(args.log_file.as_deref())?;
    let scale = ScreenScale::from_factor(args.scale)?;

    let runtime = Runtime::start(PatternCore::new(), RuntimeConfig::default());

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(app::APP_TITLE)
            .with_inner_size(window_size(scale)),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    let config = AppConfig {
        rom_path: args.rom,
        scale,
    };

    eframe::run_native(
        app::APP_TITLE,
        native_options,
        Box::new(|cc| Ok(Box::new(CatdsApp::new(cc, runtime, config)))),
    )
    .map_err(|e| anyhow!("eframe failed: {e}"))?;

    tracing::info!("exiting");
    Ok(())
}
