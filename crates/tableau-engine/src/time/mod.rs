//! Time subsystem.
//!
//! Frame timing without coupling to the runtime:
//! - one `FrameClock` per window
//! - `tick()` once per presented frame to obtain `FrameTime`
//!
//! Scene code reads `FrameTime::now` for wall-clock windows (click debounce,
//! tweens) and `FrameTime::elapsed` for animation time.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
