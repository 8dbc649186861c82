//! wgpu back-end: the GPU pick surface and the display renderer.

mod pick_surface;
mod programs;
mod renderer;

pub use pick_surface::GpuPickSurface;
pub use programs::{COMPOSITE_PROGRAM, LAYER_PROGRAM, MASK_PROGRAM, register_programs};
pub use renderer::SceneRenderer;

/// Format of mask and probe targets; read back byte-exact.
pub const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Format of the intermediate scene color target.
pub const SCENE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
