//! UI-side presentation: polls the published frame at a fixed cadence, splits
//! and scales it, and keeps the FPS readout.

use std::{
    fmt::Display,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use catds_core::screen::{BYTES_PER_PIXEL, FRAME_BYTES, SCREEN_BYTES, SCREEN_HEIGHT, SCREEN_WIDTH};

use crate::runtime::{RuntimeError, RuntimeHandle};

/// Presentation tick period.
pub const PRESENT_PERIOD: Duration = Duration::from_millis(16);
/// FPS is recomputed once this much wall time has passed.
pub const FPS_WINDOW: Duration = Duration::from_secs(1);

/// Integer display scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenScale {
    X1,
    #[default]
    X2,
    X3,
}

impl ScreenScale {
    pub const ALL: [Self; 3] = [Self::X1, Self::X2, Self::X3];

    pub const fn factor(self) -> usize {
        match self {
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X3 => 3,
        }
    }

    pub fn from_factor(factor: u32) -> Result<Self, RuntimeError> {
        match factor {
            1 => Ok(Self::X1),
            2 => Ok(Self::X2),
            3 => Ok(Self::X3),
            _ => Err(RuntimeError::InvalidScale { factor }),
        }
    }

    /// Size of one scaled screen in pixels.
    pub const fn screen_size(self) -> (usize, usize) {
        (SCREEN_WIDTH * self.factor(), SCREEN_HEIGHT * self.factor())
    }
}

/// Rolling frames-per-second accumulator.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frames: u64,
    last_sample: Instant,
    rate: f32,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            frames: 0,
            last_sample: now,
            rate: 0.0,
        }
    }

    pub fn record(&mut self, frames: u64) {
        self.frames = self.frames.saturating_add(frames);
    }

    /// Recomputes the rate once a full window has elapsed and starts a new
    /// window. Returns the new rate when it was recomputed.
    pub fn sample(&mut self, now: Instant) -> Option<f32> {
        let elapsed = now.saturating_duration_since(self.last_sample);
        if elapsed < FPS_WINDOW {
            return None;
        }
        self.rate = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.last_sample = now;
        Some(self.rate)
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }
}

/// Nearest-neighbor integer upscale of an RGBA image into `dst`.
pub fn scale_nearest(src: &[u8], width: usize, height: usize, factor: usize, dst: &mut Vec<u8>) {
    debug_assert_eq!(src.len(), width * height * BYTES_PER_PIXEL);
    let row_bytes = width * factor * BYTES_PER_PIXEL;
    dst.clear();
    dst.reserve(row_bytes * height * factor);

    for row in src.chunks_exact(width * BYTES_PER_PIXEL) {
        let start = dst.len();
        for px in row.chunks_exact(BYTES_PER_PIXEL) {
            for _ in 0..factor {
                dst.extend_from_slice(px);
            }
        }
        for _ in 1..factor {
            dst.extend_from_within(start..start + row_bytes);
        }
    }
}

/// Both screens at the current scale, RGBA8888.
#[derive(Debug, Clone, Default)]
pub struct ScaledScreens {
    pub top: Vec<u8>,
    pub bottom: Vec<u8>,
    /// Width of one screen.
    pub width: usize,
    /// Height of one screen.
    pub height: usize,
}

impl ScaledScreens {
    fn fill(&mut self, frame: &[u8], scale: ScreenScale) {
        let factor = scale.factor();
        let (top, bottom) = frame.split_at(SCREEN_BYTES);
        scale_nearest(top, SCREEN_WIDTH, SCREEN_HEIGHT, factor, &mut self.top);
        scale_nearest(bottom, SCREEN_WIDTH, SCREEN_HEIGHT, factor, &mut self.bottom);
        (self.width, self.height) = scale.screen_size();
    }
}

/// What one presentation tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// A new frame was copied and scaled.
    pub redraw: bool,
    pub frame_counter: u64,
    pub fps: f32,
    /// `fps` was recomputed on this tick.
    pub fps_updated: bool,
    /// When to tick again; `None` once cancelled.
    pub next_tick: Option<Duration>,
}

/// Fixed-cadence reader of the published frame.
///
/// Never blocks the frame pump beyond a single plane copy. The owner drives
/// it from its own repaint timer and re-arms for `next_tick` until cancelled.
pub struct PresentationScheduler {
    handle: RuntimeHandle,
    scale: ScreenScale,
    period: Duration,
    fps: FpsCounter,
    last_present_seq: Option<u64>,
    last_frame_seq: u64,
    native: Vec<u8>,
    screens: ScaledScreens,
    cancelled: Arc<AtomicBool>,
}

impl PresentationScheduler {
    pub fn new(handle: RuntimeHandle, scale: ScreenScale) -> Self {
        let last_frame_seq = handle.frame_seq();
        Self {
            handle,
            scale,
            period: PRESENT_PERIOD,
            fps: FpsCounter::new(Instant::now()),
            last_present_seq: None,
            last_frame_seq,
            native: vec![0; FRAME_BYTES],
            screens: ScaledScreens::default(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn scale(&self) -> ScreenScale {
        self.scale
    }

    /// Changes the scale; the next tick redraws even if no frame arrived.
    pub fn set_scale(&mut self, scale: ScreenScale) {
        if self.scale != scale {
            self.scale = scale;
            self.last_present_seq = None;
        }
    }

    pub fn screens(&self) -> &ScaledScreens {
        &self.screens
    }

    pub fn fps(&self) -> f32 {
        self.fps.rate()
    }

    /// Restarts the FPS window, e.g. after a new ROM is loaded.
    pub fn reset_fps(&mut self) {
        self.last_frame_seq = self.handle.frame_seq();
        self.fps.reset(Instant::now());
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Shared cancellation flag for whoever tears the UI down.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn tick(&mut self, now: Instant) -> Tick {
        let frame_counter = self.handle.frame_counter();
        if self.is_cancelled() {
            return Tick {
                redraw: false,
                frame_counter,
                fps: self.fps.rate(),
                fps_updated: false,
                next_tick: None,
            };
        }

        let present_seq = self.handle.frames().present_seq();
        let redraw = self.last_present_seq != Some(present_seq) && self.refresh(present_seq);

        let frame_seq = self.handle.frame_seq();
        self.fps.record(frame_seq.saturating_sub(self.last_frame_seq));
        self.last_frame_seq = frame_seq;
        let fps_updated = self.fps.sample(now).is_some();

        Tick {
            redraw,
            frame_counter,
            fps: self.fps.rate(),
            fps_updated,
            next_tick: Some(self.period),
        }
    }

    /// Runs a tick and hands freshly scaled screens to `render`. Render
    /// failures are logged and the tick carries on.
    pub fn present<E: Display>(
        &mut self,
        now: Instant,
        render: impl FnOnce(&ScaledScreens) -> Result<(), E>,
    ) -> Tick {
        let tick = self.tick(now);
        if tick.redraw
            && let Err(error) = render(&self.screens)
        {
            tracing::warn!(%error, "failed to present frame");
        }
        tick
    }

    fn refresh(&mut self, present_seq: u64) -> bool {
        if self.handle.frames().copy_front(&mut self.native).is_none() {
            tracing::warn!(len = self.native.len(), "frame buffer size mismatch");
            return false;
        }
        self.screens.fill(&self.native, self.scale);
        self.last_present_seq = Some(present_seq);
        true
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn scale_factor_round_trips() {
        for scale in ScreenScale::ALL {
            assert_eq!(ScreenScale::from_factor(scale.factor() as u32).unwrap(), scale);
        }
        assert!(matches!(
            ScreenScale::from_factor(4),
            Err(RuntimeError::InvalidScale { factor: 4 })
        ));
        assert_eq!(ScreenScale::default(), ScreenScale::X2);
    }

    #[test]
    fn fps_waits_for_a_full_window() {
        let start = Instant::now();
        let mut fps = FpsCounter::new(start);
        fps.record(30);
        assert_eq!(fps.sample(start + Duration::from_millis(500)), None);
        fps.record(30);
        let rate = fps.sample(start + Duration::from_secs(1)).unwrap();
        assert!((rate - 60.0).abs() < 0.01);
        assert_eq!(fps.sample(start + Duration::from_millis(1500)), None);
        assert!((fps.rate() - 60.0).abs() < 0.01);
    }

    #[test]
    fn scale_duplicates_pixels() {
        let src = [1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];
        let mut dst = Vec::new();
        scale_nearest(&src, 2, 2, 2, &mut dst);
        let px: Vec<u8> = dst.chunks_exact(4).map(|p| p[0]).collect();
        assert_eq!(px, [1, 1, 2, 2, 1, 1, 2, 2, 3, 3, 4, 4, 3, 3, 4, 4]);
    }

    proptest! {
        #[test]
        fn scaled_pixel_matches_source(
            width in 1usize..12,
            height in 1usize..12,
            factor in 1usize..4,
            seed in any::<u8>(),
        ) {
            let src: Vec<u8> = (0..width * height * BYTES_PER_PIXEL)
                .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
                .collect();
            let mut dst = Vec::new();
            scale_nearest(&src, width, height, factor, &mut dst);
            prop_assert_eq!(dst.len(), src.len() * factor * factor);

            let scaled_width = width * factor;
            for y in 0..height * factor {
                for x in 0..scaled_width {
                    let d = (y * scaled_width + x) * BYTES_PER_PIXEL;
                    let s = ((y / factor) * width + x / factor) * BYTES_PER_PIXEL;
                    prop_assert_eq!(&dst[d..d + 4], &src[s..s + 4]);
                }
            }
        }
    }
}
