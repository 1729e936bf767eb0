use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::RecvTimeoutError;

use super::handle::RuntimeInner;

enum Advance {
    /// A frame ran and was published.
    Ran,
    /// Control state changed while waiting for the core lock; nothing ran.
    Skipped,
    /// The core faulted; the session is now Paused.
    Faulted,
}

/// The frame pump: advances the core once per frame period on its own thread.
pub(crate) struct Runner {
    inner: Arc<RuntimeInner>,
    frame_duration: Duration,
    idle_interval: Duration,
}

impl Runner {
    pub(crate) fn new(inner: Arc<RuntimeInner>) -> Self {
        let config = inner.config;
        Self {
            inner,
            frame_duration: config.frame_duration,
            idle_interval: config.idle_interval,
        }
    }

    pub(crate) fn run(&mut self) {
        while self.inner.state.control.is_running() {
            if !self.inner.state.should_advance() {
                self.idle_wait();
                continue;
            }

            let start = Instant::now();
            match self.step_frame() {
                Advance::Ran => {}
                Advance::Skipped | Advance::Faulted => continue,
            }

            // Overruns start the next frame immediately. There is no catch-up,
            // so a slow core lowers the frame rate instead of bursting.
            self.wait_until(start + self.frame_duration);
        }
        tracing::debug!("frame pump exiting");
    }

    fn step_frame(&mut self) -> Advance {
        let mut cell = self.inner.core.lock();
        // A pause, close or shutdown may have landed while we waited for the lock.
        if !self.inner.state.should_advance() {
            return Advance::Skipped;
        }
        match self.inner.advance_locked(&mut cell) {
            Ok(_) => Advance::Ran,
            Err(err) => {
                self.inner.record_fault(&err);
                Advance::Faulted
            }
        }
    }

    /// Blocks for one idle interval or until the controller signals a change.
    fn idle_wait(&self) {
        match self.inner.wake_rx.recv_timeout(self.idle_interval) {
            Ok(()) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => thread::sleep(self.idle_interval),
        }
    }

    /// Sleeps until `deadline`, returning early if advancement is stopped
    /// so pause and shutdown are observed without waiting out the frame.
    fn wait_until(&self, deadline: Instant) {
        loop {
            let now = Instant::now();
            if now >= deadline {
                return;
            }

            match self.inner.wake_rx.recv_timeout(deadline - now) {
                Ok(()) => {
                    if !self.inner.state.should_advance() {
                        return;
                    }
                }
                Err(RecvTimeoutError::Timeout) => return,
                Err(RecvTimeoutError::Disconnected) => {
                    thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    return;
                }
            }
        }
    }
}
