//! Display geometry shared by the core and every consumer of its framebuffer.
//!
//! The framebuffer is two 256x192 screens stacked vertically (top screen
//! first), packed as RGBA8888 with opaque alpha.

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 192;
pub const SCREEN_COUNT: usize = 2;
pub const BYTES_PER_PIXEL: usize = 4;

/// Height of the stacked framebuffer (both screens).
pub const FRAME_HEIGHT: usize = SCREEN_HEIGHT * SCREEN_COUNT;

/// Bytes in a single screen region.
pub const SCREEN_BYTES: usize = SCREEN_WIDTH * SCREEN_HEIGHT * BYTES_PER_PIXEL;

/// Bytes in the full stacked framebuffer.
pub const FRAME_BYTES: usize = SCREEN_BYTES * SCREEN_COUNT;

/// Fills `dst` with opaque black, the placeholder shown when nothing is loaded.
pub fn fill_placeholder(dst: &mut [u8]) {
    for px in dst.chunks_exact_mut(BYTES_PER_PIXEL) {
        px.copy_from_slice(&[0, 0, 0, 0xFF]);
    }
}
