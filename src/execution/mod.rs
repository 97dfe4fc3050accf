//! Backend dispatch and the per-frame execution loop.

pub mod executor;
pub mod frame_loop;

pub use executor::Executor;
pub use frame_loop::{
    ControlHandle, FpsHandle, FrameLoop, FrameObserver, FrameStatus, FrameUpdate, LoopStats,
    SkipReason,
};
