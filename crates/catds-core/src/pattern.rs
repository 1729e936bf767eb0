//! Stand-in engine that renders a diagnostic pattern instead of emulating hardware.
//!
//! The pattern makes the pipeline observable end to end: the top screen
//! scrolls once per emulated frame, a row of indicators mirrors the held
//! buttons, and the bottom screen draws a crosshair at the touch point.

use std::{
    fs,
    io::{ErrorKind, Read, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::{
    emu_core::EmuCore,
    error::CoreError,
    input::{Button, InputState},
    screen::{BYTES_PER_PIXEL, FRAME_BYTES, SCREEN_BYTES, SCREEN_HEIGHT, SCREEN_WIDTH},
};

const STATE_VERSION: u16 = 2;
const INDICATOR_SIZE: usize = 12;
const INDICATOR_GAP: usize = 4;
const INDICATOR_TOP: usize = SCREEN_HEIGHT - INDICATOR_SIZE - 8;

const LIT: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
const UNLIT: [u8; 4] = [0x30, 0x36, 0x3D, 0xFF];
const GRID: [u8; 4] = [0x16, 0x21, 0x3E, 0xFF];
const PANEL: [u8; 4] = [0x0D, 0x11, 0x17, 0xFF];
const CROSSHAIR: [u8; 4] = [0xE9, 0x45, 0x60, 0xFF];

#[derive(Debug, Clone, Copy)]
struct LoadedRom {
    hash: [u8; 20],
    seed: u8,
}

#[derive(Debug, Serialize, Deserialize)]
struct PatternSnapshot {
    version: u16,
    rom_hash: [u8; 20],
    frame: u64,
}

#[derive(Debug)]
pub struct PatternCore {
    rom: Option<LoadedRom>,
    frame: u64,
    input: InputState,
    framebuffer: Box<[u8]>,
}

impl Default for PatternCore {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternCore {
    pub fn new() -> Self {
        let mut framebuffer = vec![0u8; FRAME_BYTES].into_boxed_slice();
        crate::screen::fill_placeholder(&mut framebuffer);
        Self {
            rom: None,
            frame: 0,
            input: InputState::default(),
            framebuffer,
        }
    }

    /// Frames executed since the last load or reset.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    fn render(&mut self) {
        let Some(rom) = self.rom else {
            crate::screen::fill_placeholder(&mut self.framebuffer);
            return;
        };

        let (top, bottom) = self.framebuffer.split_at_mut(SCREEN_BYTES);
        let shift = self.frame as usize;

        for (i, px) in top.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            let x = i % SCREEN_WIDTH;
            let y = i / SCREEN_WIDTH;
            px.copy_from_slice(&[
                (x + shift) as u8,
                (y as u8).wrapping_add(rom.seed),
                ((x + y) / 2) as u8,
                0xFF,
            ]);
        }

        for (slot, button) in Button::ALL.into_iter().enumerate() {
            let color = if self.input.is_held(button) { LIT } else { UNLIT };
            let left = INDICATOR_GAP + slot * (INDICATOR_SIZE + INDICATOR_GAP);
            fill_rect(top, left, INDICATOR_TOP, INDICATOR_SIZE, INDICATOR_SIZE, color);
        }

        for (i, px) in bottom.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            let x = i % SCREEN_WIDTH;
            let y = i / SCREEN_WIDTH;
            let color = if x % 16 == 0 || y % 16 == 0 { GRID } else { PANEL };
            px.copy_from_slice(&color);
        }

        if let Some(touch) = self.input.touch() {
            let (tx, ty) = (touch.x as usize, touch.y as usize);
            fill_rect(bottom, 0, ty, SCREEN_WIDTH, 1, CROSSHAIR);
            fill_rect(bottom, tx, 0, 1, SCREEN_HEIGHT, CROSSHAIR);
        }
    }
}

fn fill_rect(screen: &mut [u8], left: usize, top: usize, w: usize, h: usize, color: [u8; 4]) {
    for y in top..(top + h).min(SCREEN_HEIGHT) {
        for x in left..(left + w).min(SCREEN_WIDTH) {
            let offset = (y * SCREEN_WIDTH + x) * BYTES_PER_PIXEL;
            screen[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&color);
        }
    }
}

impl EmuCore for PatternCore {
    fn load_rom(&mut self, path: &Path) -> Result<(), CoreError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(CoreError::RomNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(err) => return Err(err.into()),
        };
        if bytes.is_empty() {
            return Err(CoreError::InvalidRom {
                reason: "image is empty".to_string(),
            });
        }

        let mut hasher = Sha1::new();
        hasher.update(&bytes);
        let hash: [u8; 20] = hasher.finalize().into();

        self.rom = Some(LoadedRom {
            hash,
            seed: hash[0],
        });
        self.frame = 0;
        self.input = InputState::default();
        self.render();
        tracing::debug!(path = %path.display(), len = bytes.len(), "pattern core loaded ROM");
        Ok(())
    }

    fn unload_rom(&mut self) {
        self.rom = None;
        self.frame = 0;
        self.input = InputState::default();
        self.render();
    }

    fn is_loaded(&self) -> bool {
        self.rom.is_some()
    }

    fn advance_frame(&mut self) -> Result<(), CoreError> {
        if self.rom.is_none() {
            return Err(CoreError::NotLoaded);
        }
        self.frame += 1;
        self.render();
        Ok(())
    }

    fn read_framebuffer(&self, dst: &mut [u8]) {
        debug_assert_eq!(dst.len(), FRAME_BYTES);
        let len = dst.len().min(self.framebuffer.len());
        dst[..len].copy_from_slice(&self.framebuffer[..len]);
    }

    fn apply_input(&mut self, input: &InputState) {
        self.input = *input;
    }

    fn save_state(&mut self, sink: &mut dyn Write) -> Result<(), CoreError> {
        let rom = self.rom.ok_or(CoreError::NotLoaded)?;
        let snapshot = PatternSnapshot {
            version: STATE_VERSION,
            rom_hash: rom.hash,
            frame: self.frame,
        };
        let bytes =
            postcard::to_stdvec(&snapshot).map_err(|e| CoreError::InvalidState(e.to_string()))?;
        sink.write_all(&bytes)?;
        Ok(())
    }

    fn load_state(&mut self, source: &mut dyn Read) -> Result<(), CoreError> {
        let rom = self.rom.ok_or(CoreError::NotLoaded)?;
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        let snapshot: PatternSnapshot =
            postcard::from_bytes(&bytes).map_err(|e| CoreError::InvalidState(e.to_string()))?;
        if snapshot.version != STATE_VERSION {
            return Err(CoreError::InvalidState(format!(
                "unsupported state version {}",
                snapshot.version
            )));
        }
        if snapshot.rom_hash != rom.hash {
            return Err(CoreError::RomMismatch);
        }

        // Held buttons belong to the host, not to the snapshot.
        self.frame = snapshot.frame;
        self.render();
        Ok(())
    }

    fn reset(&mut self) {
        self.frame = 0;
        self.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::TouchPoint;

    fn write_rom(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    fn loaded_core(dir: &tempfile::TempDir) -> PatternCore {
        let rom = write_rom(dir, "game.nds", b"catds pattern rom");
        let mut core = PatternCore::new();
        core.load_rom(&rom).unwrap();
        core
    }

    #[test]
    fn advance_without_rom_faults() {
        let mut core = PatternCore::new();
        assert!(matches!(core.advance_frame(), Err(CoreError::NotLoaded)));
    }

    #[test]
    fn missing_rom_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = PatternCore::new();
        let err = core.load_rom(&dir.path().join("nope.nds")).unwrap_err();
        assert!(matches!(err, CoreError::RomNotFound { .. }));
        assert!(!core.is_loaded());
    }

    #[test]
    fn empty_rom_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let rom = write_rom(&dir, "empty.nds", b"");
        let mut core = PatternCore::new();
        assert!(matches!(
            core.load_rom(&rom),
            Err(CoreError::InvalidRom { .. })
        ));
    }

    #[test]
    fn placeholder_without_rom() {
        let core = PatternCore::new();
        let mut fb = vec![0u8; FRAME_BYTES];
        core.read_framebuffer(&mut fb);
        assert!(fb.chunks_exact(4).all(|px| px == [0, 0, 0, 0xFF]));
    }

    #[test]
    fn frames_change_the_top_screen() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = loaded_core(&dir);
        let mut before = vec![0u8; FRAME_BYTES];
        core.read_framebuffer(&mut before);
        core.advance_frame().unwrap();
        let mut after = vec![0u8; FRAME_BYTES];
        core.read_framebuffer(&mut after);
        assert_ne!(before[..SCREEN_BYTES], after[..SCREEN_BYTES]);
        assert_eq!(core.frame(), 1);
    }

    #[test]
    fn touch_draws_crosshair_on_bottom_screen() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = loaded_core(&dir);
        let mut input = InputState::default();
        input.set_touch(TouchPoint { x: 100, y: 50 });
        core.apply_input(&input);
        core.advance_frame().unwrap();

        let mut fb = vec![0u8; FRAME_BYTES];
        core.read_framebuffer(&mut fb);
        let offset = SCREEN_BYTES + (50 * SCREEN_WIDTH + 100) * BYTES_PER_PIXEL;
        assert_eq!(fb[offset..offset + 4], CROSSHAIR);
    }

    #[test]
    fn state_restores_frame_but_keeps_live_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = loaded_core(&dir);
        let mut input = InputState::default();
        input.press(Button::X);
        core.apply_input(&input);
        for _ in 0..5 {
            core.advance_frame().unwrap();
        }

        let mut blob = Vec::new();
        core.save_state(&mut blob).unwrap();

        core.reset();
        core.apply_input(&InputState::default());
        assert_eq!(core.frame(), 0);

        core.load_state(&mut blob.as_slice()).unwrap();
        assert_eq!(core.frame(), 5);
        assert!(!core.input().is_held(Button::X));
    }

    #[test]
    fn state_from_another_rom_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = loaded_core(&dir);
        let mut blob = Vec::new();
        core.save_state(&mut blob).unwrap();

        let other = write_rom(&dir, "other.nds", b"a different image");
        core.load_rom(&other).unwrap();
        assert!(matches!(
            core.load_state(&mut blob.as_slice()),
            Err(CoreError::RomMismatch)
        ));
    }

    #[test]
    fn garbage_state_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = loaded_core(&dir);
        let mut garbage: &[u8] = &[0xFF, 0xFF, 0xFF];
        assert!(matches!(
            core.load_state(&mut garbage),
            Err(CoreError::InvalidState(_))
        ));
    }
}
