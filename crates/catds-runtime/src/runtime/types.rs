use std::{path::Path, path::PathBuf, time::Duration};

/// Nominal emulation period (60 Hz).
pub const FRAME_DURATION_60HZ: Duration = Duration::from_nanos(16_666_667);
/// How long the frame pump waits between control checks while idle.
pub const IDLE_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    pub frame_duration: Duration,
    pub idle_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frame_duration: FRAME_DURATION_60HZ,
            idle_interval: IDLE_INTERVAL,
        }
    }
}

/// Notifications emitted by the runtime for the UI to surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    RomLoaded { path: PathBuf },
    RomClosed,
    Reset,
    /// The core failed while advancing; the session was forced into Paused.
    CoreFault { error: String },
    StateSaved { path: PathBuf },
    StateLoaded { path: PathBuf },
    ScreenshotSaved { path: PathBuf },
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    #[error("no ROM loaded")]
    NoSession,
    #[error("failed to load ROM: {path}: {error}")]
    LoadRomFailed { path: PathBuf, error: String },
    #[error("emulation fault: {error}")]
    CoreFault { error: String },
    #[error("failed to save state: {path}: {error}")]
    SaveStateFailed { path: PathBuf, error: String },
    #[error("failed to load state: {path}: {error}")]
    LoadStateFailed { path: PathBuf, error: String },
    #[error("failed to write screenshot: {path}: {error}")]
    ScreenshotFailed { path: PathBuf, error: String },
    #[error("failed to start frame pump: {error}")]
    PumpStartFailed { error: String },
    #[error("unsupported screen scale {factor}x (expected 1, 2 or 3)")]
    InvalidScale { factor: u32 },
    #[error("runtime has been shut down")]
    ShutDown,
}

/// Save-state file convention, chosen by extension.
///
/// Both formats are opaque core blobs and pass through byte for byte; the
/// distinction only matters for file dialogs and status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFormat {
    /// The shell's own `.cds` convention.
    Native,
    /// The engine's native `.dst` convention.
    Core,
}

impl StateFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("dst") => Self::Core,
            _ => Self::Native,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Native => "cds",
            Self::Core => "dst",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Native => "Cat's EMU DS State",
            Self::Core => "DeSmuME State",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_format_follows_extension() {
        assert_eq!(StateFormat::from_path(Path::new("a.dst")), StateFormat::Core);
        assert_eq!(StateFormat::from_path(Path::new("a.DST")), StateFormat::Core);
        assert_eq!(StateFormat::from_path(Path::new("a.cds")), StateFormat::Native);
        assert_eq!(StateFormat::from_path(Path::new("a")), StateFormat::Native);
    }
}
