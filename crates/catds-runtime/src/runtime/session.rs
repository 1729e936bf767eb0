use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Stopped,
    Paused,
    Running,
}

impl RunState {
    /// Upper-case indicator text for status displays.
    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "STOPPED",
            Self::Paused => "PAUSED",
            Self::Running => "RUNNING",
        }
    }
}

/// Runtime state of the loaded ROM, as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub rom_path: PathBuf,
    pub frame_counter: u64,
    pub run_state: RunState,
    pub last_error: Option<String>,
}

impl Session {
    pub fn rom_name(&self) -> String {
        self.rom_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.rom_path.display().to_string())
    }
}

/// The mutable part of a session kept under the session lock.
///
/// The frame counter lives in an atomic so the frame pump and readers never
/// take this lock per frame.
#[derive(Debug)]
pub(crate) struct SessionSlot {
    pub(crate) rom_path: PathBuf,
    pub(crate) run_state: RunState,
    pub(crate) last_error: Option<String>,
}

impl SessionSlot {
    pub(crate) fn new(rom_path: &Path) -> Self {
        Self {
            rom_path: rom_path.to_path_buf(),
            run_state: RunState::Paused,
            last_error: None,
        }
    }

    pub(crate) fn to_session(&self, frame_counter: u64) -> Session {
        Session {
            rom_path: self.rom_path.clone(),
            frame_counter,
            run_state: self.run_state,
            last_error: self.last_error.clone(),
        }
    }
}
