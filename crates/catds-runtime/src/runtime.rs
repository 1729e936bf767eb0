mod frame;
mod handle;
mod input;
mod runner;
mod screenshot;
mod session;
mod state;
mod types;

pub use frame::{FrameHandle, FrameSnapshot};
pub use handle::{Runtime, RuntimeHandle};
pub use input::{InputRouter, KeyMap, map_touch};
pub use screenshot::write_png;
pub use session::{RunState, Session};
pub use types::{
    FRAME_DURATION_60HZ, IDLE_INTERVAL, RuntimeConfig, RuntimeError, RuntimeEvent, StateFormat,
};
