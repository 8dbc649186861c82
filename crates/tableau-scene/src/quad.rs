//! Draw descriptions for full-target layer quads.
//!
//! A quad covers the whole target, scaled about its center and translated by
//! an offset given as a fraction of the target size (+Y down). The GPU
//! shaders and the software pick surface share this mapping.

use bytemuck::{Pod, Zeroable};
use tableau_engine::coords::Vec2;
use tableau_engine::texture::TextureId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuadTransform {
    pub offset: Vec2,
    pub scale: f32,
}

impl QuadTransform {
    pub const IDENTITY: Self = Self {
        offset: Vec2::zero(),
        scale: 1.0,
    };

    pub fn new(offset: Vec2, scale: f32) -> Self {
        Self { offset, scale }
    }

    /// Texture uv under target fraction `p`. May fall outside `[0, 1]`.
    pub fn uv_at(&self, p: Vec2) -> Vec2 {
        (p - Vec2::splat(0.5) - self.offset) / self.scale + Vec2::splat(0.5)
    }

    /// Uniform-ready `[offset.x, offset.y, scale, 0]`.
    pub fn to_array(&self) -> [f32; 4] {
        [self.offset.x, self.offset.y, self.scale, 0.0]
    }
}

impl Default for QuadTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Everything needed to draw or probe one layer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerQuad {
    /// `None` renders fully transparent.
    pub texture: Option<TextureId>,
    pub transform: QuadTransform,
    pub opacity: f32,
    pub dark_strength: f32,
    pub blur_samples: u32,
    /// Horizontal uv scroll, added before wrapping.
    pub uv_scroll: f32,
    /// Wrap u instead of clipping it.
    pub wrap_x: bool,
}

impl LayerQuad {
    /// Texture uv under `p`, or `None` where the quad is transparent.
    pub fn sample_uv(&self, p: Vec2) -> Option<Vec2> {
        let mut uv = self.transform.uv_at(p);
        uv.x += self.uv_scroll;
        if self.wrap_x {
            uv.x = uv.x.rem_euclid(1.0);
        }
        let inside = (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y);
        inside.then_some(uv)
    }
}

/// Per-draw uniform block shared by the mask and layer programs.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct QuadUniforms {
    /// offset.xy, scale, unused
    pub transform: [f32; 4],
    /// mask: key rgb + alpha threshold; layer: opacity, dark, scroll, wrap
    pub params: [f32; 4],
    /// texel size (1/w, 1/h), blur samples, unused
    pub extra: [f32; 4],
}

impl QuadUniforms {
    pub fn for_layer(quad: &LayerQuad, texel: Vec2) -> Self {
        Self {
            transform: quad.transform.to_array(),
            params: [
                quad.opacity,
                quad.dark_strength,
                quad.uv_scroll,
                if quad.wrap_x { 1.0 } else { 0.0 },
            ],
            extra: [texel.x, texel.y, quad.blur_samples as f32, 0.0],
        }
    }

    pub fn for_mask(transform: QuadTransform, key: [f32; 3], threshold: f32) -> Self {
        Self {
            transform: transform.to_array(),
            params: [key[0], key[1], key[2], threshold],
            extra: [0.0; 4],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(transform: QuadTransform) -> LayerQuad {
        LayerQuad {
            texture: None,
            transform,
            opacity: 1.0,
            dark_strength: 0.0,
            blur_samples: 0,
            uv_scroll: 0.0,
            wrap_x: false,
        }
    }

    #[test]
    fn identity_maps_fraction_to_uv() {
        let uv = QuadTransform::IDENTITY.uv_at(Vec2::new(0.25, 0.75));
        assert!(uv.max_abs_diff(Vec2::new(0.25, 0.75)) < 1e-6);
    }

    #[test]
    fn scale_grows_about_center() {
        let t = QuadTransform::new(Vec2::zero(), 2.0);
        assert!(t.uv_at(Vec2::splat(0.5)).max_abs_diff(Vec2::splat(0.5)) < 1e-6);
        assert!(t.uv_at(Vec2::zero()).max_abs_diff(Vec2::splat(0.25)) < 1e-6);
    }

    #[test]
    fn offset_moves_content_with_it() {
        // Content shifted right by 0.1: the target pixel at 0.6 sees uv 0.5.
        let t = QuadTransform::new(Vec2::new(0.1, 0.0), 1.0);
        assert!((t.uv_at(Vec2::new(0.6, 0.5)).x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn clipped_outside_unless_wrapping() {
        let mut q = quad(QuadTransform::new(Vec2::new(0.5, 0.0), 1.0));
        assert_eq!(q.sample_uv(Vec2::new(0.2, 0.5)), None);

        q.wrap_x = true;
        let uv = q.sample_uv(Vec2::new(0.2, 0.5)).unwrap();
        assert!((uv.x - 0.7).abs() < 1e-5);
    }

    #[test]
    fn scroll_shifts_u() {
        let mut q = quad(QuadTransform::IDENTITY);
        q.uv_scroll = 0.25;
        q.wrap_x = true;
        let uv = q.sample_uv(Vec2::new(0.9, 0.5)).unwrap();
        assert!((uv.x - 0.15).abs() < 1e-5);
    }
}
