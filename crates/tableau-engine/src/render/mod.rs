//! GPU rendering subsystem.
//!
//! Each renderer owns its GPU resources (pipelines, buffers, bind groups) and
//! creates them lazily on first use. Shared pieces live here:
//! - `RenderCtx`/`RenderTarget`: what a renderer needs for one pass
//! - `quad`: unit-quad geometry and blend state
//! - `ShaderCache`: named WGSL programs compiled once per device
//! - `RenderTexture`: offscreen color targets
//! - `PixelReadback`: GPU→CPU single-pixel copies
//!
//! Convention: targets use a top-left origin, +Y down; vertex shaders convert
//! target fractions to NDC.

mod ctx;
pub mod quad;
mod readback;
mod shader_cache;
mod target;

pub use ctx::{RenderCtx, RenderTarget};
pub use readback::{PixelReadback, ReadbackMode};
pub use shader_cache::{ShaderCache, ShaderError};
pub use target::RenderTexture;
