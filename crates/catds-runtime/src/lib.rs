pub mod present;
pub mod runtime;

pub use present::{FpsCounter, PresentationScheduler, ScaledScreens, ScreenScale, Tick};
pub use runtime::{
    FrameHandle, FrameSnapshot, InputRouter, KeyMap, RunState, Runtime, RuntimeConfig,
    RuntimeError, RuntimeEvent, RuntimeHandle, Session, StateFormat,
};
