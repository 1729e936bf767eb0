//! Tear-free handoff of the composed framebuffer from the emulation thread.
//!
//! Two planes alternate as front/back. The producer renders into the back
//! plane and then publishes its index; readers copy out of the published front
//! plane. Each plane sits behind its own lock, so a reader copying one plane
//! never overlaps a write into it, and the producer never waits on anything
//! but a short memcpy.

use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use catds_core::screen::{self, FRAME_BYTES, SCREEN_BYTES};
use parking_lot::Mutex;

/// Immutable copy of one composed frame plus the frame counter it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSnapshot {
    pixels: Arc<[u8]>,
    frame: u64,
}

impl FrameSnapshot {
    pub fn placeholder() -> Self {
        let mut pixels = vec![0u8; FRAME_BYTES];
        screen::fill_placeholder(&mut pixels);
        Self {
            pixels: pixels.into(),
            frame: 0,
        }
    }

    /// Both screens, top first, RGBA8888.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn top(&self) -> &[u8] {
        &self.pixels[..SCREEN_BYTES]
    }

    pub fn bottom(&self) -> &[u8] {
        &self.pixels[SCREEN_BYTES..]
    }
}

#[derive(Debug)]
struct Plane {
    pixels: Box<[u8]>,
    frame: u64,
}

impl Plane {
    fn placeholder() -> Self {
        let mut pixels = vec![0u8; FRAME_BYTES].into_boxed_slice();
        screen::fill_placeholder(&mut pixels);
        Self { pixels, frame: 0 }
    }
}

/// Double-buffered frame publication point.
///
/// Publication must be serialized by the caller (the runtime only publishes
/// while holding its core lock). Reads may happen from any thread.
#[derive(Debug)]
pub struct FrameHandle {
    planes: [Mutex<Plane>; 2],
    front_index: AtomicUsize,
    /// Bumped after every publication so readers can skip unchanged frames.
    present_seq: AtomicU64,
}

impl Default for FrameHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameHandle {
    pub fn new() -> Self {
        Self {
            planes: [Mutex::new(Plane::placeholder()), Mutex::new(Plane::placeholder())],
            front_index: AtomicUsize::new(0),
            present_seq: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn front_index(&self) -> usize {
        self.front_index.load(Ordering::Acquire)
    }

    #[inline]
    pub fn present_seq(&self) -> u64 {
        self.present_seq.load(Ordering::Acquire)
    }

    /// Renders a frame into the back plane via `render` and publishes it.
    pub(crate) fn publish(&self, frame: u64, render: impl FnOnce(&mut [u8])) {
        let back = 1 - self.front_index();
        {
            let mut plane = self.planes[back].lock();
            render(&mut plane.pixels);
            plane.frame = frame;
        }
        self.front_index.store(back, Ordering::Release);
        // Increment after publishing the front index.
        self.present_seq.fetch_add(1, Ordering::Release);
    }

    /// Publishes the placeholder frame.
    pub(crate) fn clear(&self) {
        self.publish(0, screen::fill_placeholder);
    }

    /// Copies the current front plane into `dst` and returns its frame counter.
    ///
    /// Returns `None` without copying if `dst` is not exactly one frame long.
    pub fn copy_front(&self, dst: &mut [u8]) -> Option<u64> {
        if dst.len() != FRAME_BYTES {
            return None;
        }
        let plane = self.planes[self.front_index()].lock();
        dst.copy_from_slice(&plane.pixels);
        Some(plane.frame)
    }

    /// Allocates an immutable copy of the current front plane.
    pub fn snapshot(&self) -> FrameSnapshot {
        let plane = self.planes[self.front_index()].lock();
        FrameSnapshot {
            pixels: Arc::from(&plane.pixels[..]),
            frame: plane.frame,
        }
    }
}
