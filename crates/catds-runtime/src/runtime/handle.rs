use std::{
    path::Path,
    sync::{Arc, atomic::Ordering},
    thread::{self, JoinHandle},
};

use catds_core::{CoreError, EmuCore, InputState};
use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded, unbounded};
use parking_lot::Mutex;

use super::{
    frame::{FrameHandle, FrameSnapshot},
    input::{InputRouter, KeyMap},
    runner::Runner,
    screenshot,
    session::{RunState, Session, SessionSlot},
    state::RuntimeState,
    types::{RuntimeConfig, RuntimeError, RuntimeEvent},
};

/// The engine plus the input state last applied to it.
///
/// Both sit behind one lock so input edges never interleave with a frame.
pub(crate) struct CoreCell {
    pub(crate) core: Box<dyn EmuCore>,
    pub(crate) input: InputState,
}

pub(crate) struct RuntimeInner {
    pub(crate) config: RuntimeConfig,
    pub(crate) state: RuntimeState,
    pub(crate) core: Mutex<CoreCell>,
    pub(crate) frames: FrameHandle,
    wake_tx: Sender<()>,
    pub(crate) wake_rx: Receiver<()>,
    events_tx: Sender<RuntimeEvent>,
    events_rx: Receiver<RuntimeEvent>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl RuntimeInner {
    /// Nudges an idle frame pump to re-check control state.
    ///
    /// The wake channel holds at most one token, so bursts of control changes
    /// coalesce into a single wakeup.
    pub(crate) fn wake(&self) {
        let _ = self.wake_tx.try_send(());
    }

    pub(crate) fn emit(&self, event: RuntimeEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Runs one frame on `cell`, bumps the counters and publishes the result.
    ///
    /// Callers hold the core lock, which serializes frame publication.
    pub(crate) fn advance_locked(&self, cell: &mut CoreCell) -> Result<u64, CoreError> {
        cell.core.advance_frame()?;
        let frame = self.state.frame_counter.fetch_add(1, Ordering::AcqRel) + 1;
        self.state.frame_seq.fetch_add(1, Ordering::Relaxed);
        let core = &cell.core;
        self.frames.publish(frame, |dst| core.read_framebuffer(dst));
        Ok(frame)
    }

    /// Forces the session into Paused and records the fault.
    pub(crate) fn record_fault(&self, err: &CoreError) -> RuntimeError {
        let error = err.to_string();
        {
            // Same lock as `run()`, so the flag and the run state flip together.
            let mut session = self.state.session.lock();
            self.state.control.set_paused(true);
            if let Some(slot) = session.as_mut() {
                slot.run_state = RunState::Paused;
                slot.last_error = Some(error.clone());
            }
        }
        tracing::warn!(%error, "core fault; session paused");
        self.emit(RuntimeEvent::CoreFault {
            error: error.clone(),
        });
        RuntimeError::CoreFault { error }
    }

    fn ensure_pump(self: &Arc<Self>) -> Result<(), RuntimeError> {
        let mut pump = self.pump.lock();
        if self.state.control.request_stop.load(Ordering::Acquire) {
            return Err(RuntimeError::ShutDown);
        }
        if pump.is_some() {
            return Ok(());
        }

        self.state.control.running.store(true, Ordering::Release);
        let inner = Arc::clone(self);
        let join = thread::Builder::new()
            .name("catds-frame-pump".to_string())
            .spawn(move || Runner::new(inner).run())
            .map_err(|e| {
                self.state.control.running.store(false, Ordering::Release);
                RuntimeError::PumpStartFailed {
                    error: e.to_string(),
                }
            })?;
        *pump = Some(join);
        tracing::debug!("frame pump started");
        Ok(())
    }

    fn shutdown(&self) {
        let control = &self.state.control;
        if control.request_stop.swap(true, Ordering::AcqRel) {
            return;
        }
        control.set_paused(true);
        control.running.store(false, Ordering::Release);
        self.wake();

        let join = self.pump.lock().take();
        if let Some(join) = join {
            if join.join().is_err() {
                tracing::error!("frame pump panicked");
            }
            tracing::debug!("frame pump joined");
        }

        // The pump has exited, so nothing can touch the core after this.
        let mut cell = self.core.lock();
        cell.core.destroy();
        *self.state.session.lock() = None;
    }
}

/// Owns the emulation runtime. Dropping it stops the frame pump and destroys
/// the core.
pub struct Runtime {
    handle: RuntimeHandle,
}

/// Session controller: a cheap, clonable handle to the runtime.
#[derive(Clone)]
pub struct RuntimeHandle {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// Takes ownership of `core`. The frame pump starts with the first
    /// successful ROM load and is reused for every later one.
    pub fn start(core: impl EmuCore + 'static, config: RuntimeConfig) -> Self {
        let (wake_tx, wake_rx) = bounded::<()>(1);
        let (events_tx, events_rx) = unbounded::<RuntimeEvent>();

        let inner = Arc::new(RuntimeInner {
            config,
            state: RuntimeState::new(),
            core: Mutex::new(CoreCell {
                core: Box::new(core),
                input: InputState::default(),
            }),
            frames: FrameHandle::new(),
            wake_tx,
            wake_rx,
            events_tx,
            events_rx,
            pump: Mutex::new(None),
        });

        Self {
            handle: RuntimeHandle { inner },
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Stops the frame pump, waits for it to exit and destroys the core.
    /// Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        self.handle.inner.shutdown();
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl RuntimeHandle {
    pub(crate) fn inner(&self) -> &Arc<RuntimeInner> {
        &self.inner
    }

    pub fn frames(&self) -> &FrameHandle {
        &self.inner.frames
    }

    /// Copy of the most recently published frame.
    pub fn snapshot(&self) -> FrameSnapshot {
        self.inner.frames.snapshot()
    }

    pub fn frame_counter(&self) -> u64 {
        self.inner.state.frame_counter.load(Ordering::Acquire)
    }

    /// Total frames emulated since startup; unaffected by load or reset.
    pub fn frame_seq(&self) -> u64 {
        self.inner.state.frame_seq.load(Ordering::Relaxed)
    }

    pub fn paused(&self) -> bool {
        self.inner.state.control.is_paused()
    }

    pub fn run_state(&self) -> RunState {
        self.inner
            .state
            .session
            .lock()
            .as_ref()
            .map_or(RunState::Stopped, |slot| slot.run_state)
    }

    pub fn session(&self) -> Option<Session> {
        let session = self.inner.state.session.lock();
        session
            .as_ref()
            .map(|slot| slot.to_session(self.frame_counter()))
    }

    /// Whether the frame pump thread is alive.
    pub fn pump_alive(&self) -> bool {
        self.inner
            .pump
            .lock()
            .as_ref()
            .is_some_and(|join| !join.is_finished())
    }

    pub fn try_recv_event(&self) -> Option<RuntimeEvent> {
        match self.inner.events_rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn input_router(&self, key_map: KeyMap) -> InputRouter {
        InputRouter::new(self.clone(), key_map)
    }

    /// Loads a ROM and leaves the new session Paused.
    ///
    /// The frame pump is quiesced first. On failure the previous session, if
    /// any, is left as it was.
    pub fn load_rom(&self, path: impl AsRef<Path>) -> Result<(), RuntimeError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(RuntimeError::LoadRomFailed {
                path: path.to_path_buf(),
                error: "file not found".to_string(),
            });
        }
        if self.inner.state.control.request_stop.load(Ordering::Acquire) {
            return Err(RuntimeError::ShutDown);
        }

        let control = &self.inner.state.control;
        let was_paused = control.paused.swap(true, Ordering::AcqRel);

        {
            // Taking the core lock waits out any frame already in flight.
            let mut cell = self.inner.core.lock();
            if let Err(err) = cell.core.load_rom(path) {
                control.set_paused(was_paused);
                self.inner.wake();
                return Err(RuntimeError::LoadRomFailed {
                    path: path.to_path_buf(),
                    error: err.to_string(),
                });
            }

            cell.input.release_all();
            let input = cell.input;
            cell.core.apply_input(&input);

            *self.inner.state.session.lock() = Some(SessionSlot::new(path));
            self.inner.state.frame_counter.store(0, Ordering::Release);
            let core = &cell.core;
            self.inner
                .frames
                .publish(0, |dst| core.read_framebuffer(dst));
        }

        if let Err(err) = self.inner.ensure_pump() {
            // No pump means the session could never run.
            self.close();
            return Err(err);
        }
        tracing::info!(path = %path.display(), "ROM loaded");
        self.inner.emit(RuntimeEvent::RomLoaded {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Ends the session. Valid in any state; a no-op when already Stopped.
    pub fn close(&self) {
        let mut cell = self.inner.core.lock();
        self.inner.state.control.set_paused(true);
        if self.inner.state.session.lock().take().is_none() {
            return;
        }

        cell.core.unload_rom();
        cell.input.release_all();
        let input = cell.input;
        cell.core.apply_input(&input);
        self.inner.state.frame_counter.store(0, Ordering::Release);
        self.inner.frames.clear();
        drop(cell);

        tracing::info!("ROM closed");
        self.inner.emit(RuntimeEvent::RomClosed);
    }

    pub fn run(&self) -> Result<(), RuntimeError> {
        {
            let mut session = self.inner.state.session.lock();
            let slot = session.as_mut().ok_or(RuntimeError::NoSession)?;
            slot.run_state = RunState::Running;
            slot.last_error = None;
            self.inner.state.control.set_paused(false);
        }
        self.inner.wake();
        Ok(())
    }

    pub fn pause(&self) -> Result<(), RuntimeError> {
        {
            let mut session = self.inner.state.session.lock();
            let slot = session.as_mut().ok_or(RuntimeError::NoSession)?;
            self.inner.state.control.set_paused(true);
            slot.run_state = RunState::Paused;
        }
        self.inner.wake();
        Ok(())
    }

    /// Advances exactly one frame on the calling thread and leaves the
    /// session Paused. Returns the new frame counter.
    pub fn step(&self) -> Result<u64, RuntimeError> {
        let mut cell = self.inner.core.lock();
        {
            let mut session = self.inner.state.session.lock();
            let slot = session.as_mut().ok_or(RuntimeError::NoSession)?;
            self.inner.state.control.set_paused(true);
            slot.run_state = RunState::Paused;
        }

        match self.inner.advance_locked(&mut cell) {
            Ok(frame) => {
                if let Some(slot) = self.inner.state.session.lock().as_mut() {
                    slot.last_error = None;
                }
                Ok(frame)
            }
            Err(err) => Err(self.inner.record_fault(&err)),
        }
    }

    /// Power-cycles the core and zeroes the frame counter. The run state is
    /// left as it was.
    pub fn reset(&self) -> Result<(), RuntimeError> {
        let mut cell = self.inner.core.lock();
        {
            let mut session = self.inner.state.session.lock();
            let slot = session.as_mut().ok_or(RuntimeError::NoSession)?;
            slot.last_error = None;
        }

        cell.core.reset();
        self.inner.state.frame_counter.store(0, Ordering::Release);
        let core = &cell.core;
        self.inner
            .frames
            .publish(0, |dst| core.read_framebuffer(dst));
        drop(cell);

        tracing::info!("core reset");
        self.inner.emit(RuntimeEvent::Reset);
        Ok(())
    }

    /// Writes the core's state blob to `path` unmodified.
    pub fn save_state(&self, path: impl AsRef<Path>) -> Result<(), RuntimeError> {
        let path = path.as_ref();
        let failed = |error: String| RuntimeError::SaveStateFailed {
            path: path.to_path_buf(),
            error,
        };

        let mut blob = Vec::new();
        {
            let mut cell = self.inner.core.lock();
            if !self.inner.state.has_session() {
                return Err(RuntimeError::NoSession);
            }
            cell.core
                .save_state(&mut blob)
                .map_err(|e| failed(e.to_string()))?;
        }
        std::fs::write(path, &blob).map_err(|e| failed(e.to_string()))?;

        tracing::info!(path = %path.display(), len = blob.len(), "state saved");
        self.inner.emit(RuntimeEvent::StateSaved {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Hands the bytes at `path` to the core unmodified.
    pub fn load_state(&self, path: impl AsRef<Path>) -> Result<(), RuntimeError> {
        let path = path.as_ref();
        let failed = |error: String| RuntimeError::LoadStateFailed {
            path: path.to_path_buf(),
            error,
        };

        if !self.inner.state.has_session() {
            return Err(RuntimeError::NoSession);
        }
        let blob = std::fs::read(path).map_err(|e| failed(e.to_string()))?;

        {
            let mut cell = self.inner.core.lock();
            if !self.inner.state.has_session() {
                return Err(RuntimeError::NoSession);
            }
            cell.core
                .load_state(&mut blob.as_slice())
                .map_err(|e| failed(e.to_string()))?;
            // Held input is whatever the router has now, not what was saved.
            let input = cell.input;
            cell.core.apply_input(&input);
            let frame = self.frame_counter();
            let core = &cell.core;
            self.inner
                .frames
                .publish(frame, |dst| core.read_framebuffer(dst));
        }

        tracing::info!(path = %path.display(), "state loaded");
        self.inner.emit(RuntimeEvent::StateLoaded {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Encodes the currently published frame as a PNG at native resolution.
    pub fn screenshot(&self, path: impl AsRef<Path>) -> Result<(), RuntimeError> {
        let path = path.as_ref();
        if !self.inner.state.has_session() {
            return Err(RuntimeError::NoSession);
        }

        let snapshot = self.snapshot();
        screenshot::write_png(path, &snapshot).map_err(|e| RuntimeError::ScreenshotFailed {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        tracing::info!(path = %path.display(), frame = snapshot.frame(), "screenshot saved");
        self.inner.emit(RuntimeEvent::ScreenshotSaved {
            path: path.to_path_buf(),
        });
        Ok(())
    }
}
