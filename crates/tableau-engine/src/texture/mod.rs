//! Texture storage shared across scenes.
//!
//! Decoded images live on the CPU as [`Bitmap`]s (the software pick surface
//! samples them directly) and are uploaded to the GPU on demand. The cache
//! outlives scene swaps; scenes only hold [`TextureId`]s into it.

mod bitmap;
mod cache;

pub use bitmap::{Bitmap, TextureError};
pub use cache::{GpuTexture, TextureCache, TextureId};
