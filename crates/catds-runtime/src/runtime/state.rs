use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use super::session::SessionSlot;

/// Flags written by the session controller and observed by the frame pump.
///
/// `paused` is true whenever `running` is false.
pub(crate) struct ControlState {
    /// Frame pump loop should stay alive.
    pub(crate) running: AtomicBool,
    /// Frame advancement is suppressed.
    pub(crate) paused: AtomicBool,
    /// Teardown has begun; the pump must not be (re)started.
    pub(crate) request_stop: AtomicBool,
}

impl ControlState {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            paused: AtomicBool::new(true),
            request_stop: AtomicBool::new(false),
        }
    }

    #[inline]
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }
}

pub(crate) struct RuntimeState {
    pub(crate) control: ControlState,
    /// Frames since the session was loaded or reset.
    pub(crate) frame_counter: AtomicU64,
    /// Monotonic count of emulated frames, never reset. Used for FPS sampling.
    pub(crate) frame_seq: AtomicU64,
    pub(crate) session: Mutex<Option<SessionSlot>>,
}

impl RuntimeState {
    pub(crate) fn new() -> Self {
        Self {
            control: ControlState::new(),
            frame_counter: AtomicU64::new(0),
            frame_seq: AtomicU64::new(0),
            session: Mutex::new(None),
        }
    }

    pub(crate) fn has_session(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Whether the frame pump may advance right now.
    pub(crate) fn should_advance(&self) -> bool {
        self.control.is_running() && !self.control.is_paused() && self.has_session()
    }
}
