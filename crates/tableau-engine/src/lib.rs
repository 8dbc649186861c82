//! Tableau engine crate.
//!
//! Platform + GPU runtime pieces used by the scene layer: window loop, device,
//! input, frame timing, offscreen targets, pixel readback and the shared
//! texture cache.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
pub mod paint;
pub mod texture;
