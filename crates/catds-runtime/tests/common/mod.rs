#![allow(dead_code)]

use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use catds_core::{Button, CoreError, EmuCore, InputState, screen};
use catds_runtime::{Runtime, RuntimeConfig, RuntimeHandle};
use parking_lot::Mutex;
use tempfile::TempDir;

/// Knobs and observations shared between a test and its [`ScriptedCore`].
#[derive(Default)]
pub struct CoreTap {
    /// Next `advance_frame` calls fail while set.
    pub fault: AtomicBool,
    /// Next `load_rom` calls fail while set.
    pub reject_load: AtomicBool,
    /// Input state seen by each successful advance, in order.
    pub advanced_inputs: Mutex<Vec<InputState>>,
    /// Every state passed to `apply_input`.
    pub applied_inputs: Mutex<Vec<InputState>>,
    pub loaded: Mutex<Option<PathBuf>>,
    pub advances: AtomicU64,
    pub resets: AtomicU64,
    pub destroyed: AtomicBool,
}

/// A core whose framebuffer is filled with the low byte of its internal frame
/// number, so any torn or stale frame is easy to spot.
///
/// Its state blob also carries the held buttons, the way real cores snapshot
/// their key latch.
pub struct ScriptedCore {
    tap: Arc<CoreTap>,
    loaded: bool,
    frame: u64,
    input: InputState,
}

impl ScriptedCore {
    pub fn new() -> (Self, Arc<CoreTap>) {
        let tap = Arc::new(CoreTap::default());
        (
            Self {
                tap: Arc::clone(&tap),
                loaded: false,
                frame: 0,
                input: InputState::default(),
            },
            tap,
        )
    }
}

impl EmuCore for ScriptedCore {
    fn load_rom(&mut self, path: &Path) -> Result<(), CoreError> {
        if self.tap.reject_load.load(Ordering::Acquire) {
            return Err(CoreError::InvalidRom {
                reason: "rejected by test".to_string(),
            });
        }
        self.loaded = true;
        self.frame = 0;
        *self.tap.loaded.lock() = Some(path.to_path_buf());
        Ok(())
    }

    fn unload_rom(&mut self) {
        self.loaded = false;
        self.frame = 0;
        *self.tap.loaded.lock() = None;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn advance_frame(&mut self) -> Result<(), CoreError> {
        if !self.loaded {
            return Err(CoreError::NotLoaded);
        }
        if self.tap.fault.load(Ordering::Acquire) {
            return Err(CoreError::Fault("injected fault".to_string()));
        }
        self.frame += 1;
        self.tap.advances.fetch_add(1, Ordering::AcqRel);
        self.tap.advanced_inputs.lock().push(self.input);
        Ok(())
    }

    fn read_framebuffer(&self, dst: &mut [u8]) {
        if self.loaded {
            dst.fill(self.frame as u8);
        } else {
            screen::fill_placeholder(dst);
        }
    }

    fn apply_input(&mut self, input: &InputState) {
        self.input = *input;
        self.tap.applied_inputs.lock().push(*input);
    }

    fn save_state(&mut self, sink: &mut dyn Write) -> Result<(), CoreError> {
        if !self.loaded {
            return Err(CoreError::NotLoaded);
        }
        sink.write_all(b"SCRP")?;
        sink.write_all(&self.frame.to_le_bytes())?;
        sink.write_all(&self.input.held_mask().to_le_bytes())?;
        Ok(())
    }

    fn load_state(&mut self, source: &mut dyn Read) -> Result<(), CoreError> {
        let mut buf = [0u8; 14];
        source
            .read_exact(&mut buf)
            .map_err(|e| CoreError::InvalidState(e.to_string()))?;
        if &buf[..4] != b"SCRP" {
            return Err(CoreError::InvalidState("bad magic".to_string()));
        }
        let mut frame = [0u8; 8];
        frame.copy_from_slice(&buf[4..12]);
        self.frame = u64::from_le_bytes(frame);

        let held = u16::from_le_bytes([buf[12], buf[13]]);
        let mut input = InputState::default();
        for button in Button::ALL {
            if held & button.bit() != 0 {
                input.press(button);
            }
        }
        self.input = input;
        Ok(())
    }

    fn reset(&mut self) {
        self.frame = 0;
        self.tap.resets.fetch_add(1, Ordering::AcqRel);
    }

    fn destroy(&mut self) {
        self.tap.destroyed.store(true, Ordering::Release);
    }
}

/// A runtime over a fresh [`ScriptedCore`] plus a scratch directory holding
/// a dummy ROM file.
pub struct Harness {
    pub runtime: Runtime,
    pub handle: RuntimeHandle,
    pub tap: Arc<CoreTap>,
    pub dir: TempDir,
    pub rom: PathBuf,
}

impl Harness {
    pub fn new() -> Result<Self> {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Result<Self> {
        let (core, tap) = ScriptedCore::new();
        let runtime = Runtime::start(core, config);
        let handle = runtime.handle();
        let dir = tempfile::tempdir().context("creating scratch dir")?;
        let rom = dir.path().join("game.nds");
        std::fs::write(&rom, b"not really a rom").context("writing dummy ROM")?;
        Ok(Self {
            runtime,
            handle,
            tap,
            dir,
            rom,
        })
    }

    pub fn loaded() -> Result<Self> {
        let harness = Self::new()?;
        harness.handle.load_rom(&harness.rom)?;
        Ok(harness)
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Polls `cond` until it holds or `timeout` elapses.
pub fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}
