use std::{
    io::{Read, Write},
    path::Path,
};

use crate::{error::CoreError, input::InputState};

/// Narrow capability interface to an emulation engine.
///
/// Implementations own no threads and assume no internal synchronization: the
/// runtime calls every method from one thread at a time, serialized by its
/// core lock. Frame pacing, pause state and frame counting all live outside
/// the engine.
pub trait EmuCore: Send {
    /// Loads a ROM image, replacing whatever was loaded before.
    ///
    /// On failure the previously loaded ROM (if any) must stay usable.
    fn load_rom(&mut self, path: &Path) -> Result<(), CoreError>;

    /// Drops the loaded ROM. Subsequent frames read back as the placeholder.
    fn unload_rom(&mut self);

    fn is_loaded(&self) -> bool;

    /// Executes exactly one emulated frame.
    fn advance_frame(&mut self) -> Result<(), CoreError>;

    /// Copies the most recently rendered frame into `dst`
    /// ([`FRAME_BYTES`](crate::screen::FRAME_BYTES) long, RGBA8888, top screen
    /// first). Never blocks on emulation progress; writes the placeholder when
    /// nothing is loaded.
    fn read_framebuffer(&self, dst: &mut [u8]);

    /// Applies the complete current input state. Idempotent, never queued.
    fn apply_input(&mut self, input: &InputState);

    /// Writes an opaque state blob.
    fn save_state(&mut self, sink: &mut dyn Write) -> Result<(), CoreError>;

    /// Restores an opaque state blob produced by [`save_state`](Self::save_state).
    fn load_state(&mut self, source: &mut dyn Read) -> Result<(), CoreError>;

    /// Power-cycles the loaded ROM.
    fn reset(&mut self);

    /// Releases engine resources. Called once, after the frame pump has exited.
    fn destroy(&mut self) {}
}
