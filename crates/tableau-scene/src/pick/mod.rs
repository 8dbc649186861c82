//! The mask pass, readback and occlusion probe behind one trait.
//!
//! [`crate::hit::HitTester`] only talks to a [`PickSurface`]; the wgpu version
//! lives in [`crate::gpu`], and [`SoftPickSurface`] rasterizes the same quads
//! on the CPU.

mod soft;

use tableau_engine::texture::{TextureCache, TextureId};

use crate::color_key::ColorKey;
use crate::quad::{LayerQuad, QuadTransform};

pub use soft::{PickStats, SoftPickSurface};

/// Mask texels with alpha at or above this are written with the item's key.
pub const MASK_ALPHA_THRESHOLD: f32 = 0.5;

/// Pixel in the pick target, top-left origin.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelPos {
    pub x: u32,
    pub y: u32,
}

impl PixelPos {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Clamps into a `width × height` target.
    pub fn clamped(self, width: u32, height: u32) -> Self {
        Self {
            x: self.x.min(width.saturating_sub(1)),
            y: self.y.min(height.saturating_sub(1)),
        }
    }
}

/// One item mask in the mask pass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MaskDraw {
    pub texture: Option<TextureId>,
    pub transform: QuadTransform,
    pub key: ColorKey,
}

/// Offscreen target used for hit testing.
pub trait PickSurface {
    fn size(&self) -> (u32, u32);

    /// Reallocates targets. Previous contents are lost.
    fn resize(&mut self, width: u32, height: u32);

    /// Clears the mask target to [`ColorKey::NONE`] and draws every mask
    /// filled with its key.
    fn render_masks(&mut self, textures: &TextureCache, masks: &[MaskDraw]);

    /// Key at `at` in the last mask pass. Coordinates are clamped.
    fn read_mask(&mut self, at: PixelPos) -> ColorKey;

    /// Alpha of `layer` alone at `at`, opacity included.
    fn probe_alpha(&mut self, textures: &TextureCache, layer: &LayerQuad, at: PixelPos) -> f32;

    /// Frees targets; the next `resize` or render re-creates them.
    fn release(&mut self);
}
