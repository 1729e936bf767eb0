//! Capability interface between the catds shell and an emulation engine.
//!
//! The shell never looks inside the engine: it advances frames, reads the
//! composed framebuffer, pushes input and moves opaque state blobs around.
//! [`EmuCore`] is that boundary. [`PatternCore`] is a stand-in engine that
//! renders a diagnostic pattern so the shell can run without a real one.

pub mod emu_core;
pub mod error;
pub mod input;
pub mod pattern;
pub mod screen;

pub use emu_core::EmuCore;
pub use error::CoreError;
pub use input::{Button, InputState, TouchPoint};
pub use pattern::PatternCore;
