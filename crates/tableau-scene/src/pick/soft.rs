use tableau_engine::coords::Vec2;
use tableau_engine::texture::TextureCache;

use crate::color_key::ColorKey;
use crate::quad::LayerQuad;

use super::{MASK_ALPHA_THRESHOLD, MaskDraw, PickSurface, PixelPos};

/// Counters for the expensive operations of a pick surface.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct PickStats {
    pub mask_passes: u32,
    pub mask_reads: u32,
    pub probes: u32,
}

/// CPU rasterizer with the same sampling rules as the GPU programs.
///
/// Nearest-texel sampling at pixel centers; masks are written where their
/// alpha reaches [`MASK_ALPHA_THRESHOLD`].
#[derive(Debug, Default)]
pub struct SoftPickSurface {
    width: u32,
    height: u32,
    keys: Vec<ColorKey>,
    stats: PickStats,
}

impl SoftPickSurface {
    pub fn new(width: u32, height: u32) -> Self {
        let mut surface = Self::default();
        surface.resize(width, height);
        surface
    }

    pub fn stats(&self) -> PickStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = PickStats::default();
    }

    fn center(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) / self.width as f32,
            (y as f32 + 0.5) / self.height as f32,
        )
    }
}

impl PickSurface for SoftPickSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.keys = vec![ColorKey::NONE; self.width as usize * self.height as usize];
    }

    fn render_masks(&mut self, textures: &TextureCache, masks: &[MaskDraw]) {
        self.stats.mask_passes += 1;
        if self.keys.is_empty() {
            self.resize(self.width, self.height);
        }
        self.keys.fill(ColorKey::NONE);

        for mask in masks {
            let Some(bitmap) = mask.texture.and_then(|id| textures.bitmap(id)) else {
                continue;
            };
            for y in 0..self.height {
                for x in 0..self.width {
                    let uv = mask.transform.uv_at(self.center(x, y));
                    if !(0.0..=1.0).contains(&uv.x) || !(0.0..=1.0).contains(&uv.y) {
                        continue;
                    }
                    let alpha = bitmap.sample_nearest(uv)[3] as f32 / 255.0;
                    if alpha >= MASK_ALPHA_THRESHOLD {
                        self.keys[(y * self.width + x) as usize] = mask.key;
                    }
                }
            }
        }
    }

    fn read_mask(&mut self, at: PixelPos) -> ColorKey {
        self.stats.mask_reads += 1;
        let at = at.clamped(self.width, self.height);
        self.keys
            .get((at.y * self.width + at.x) as usize)
            .copied()
            .unwrap_or(ColorKey::NONE)
    }

    fn probe_alpha(&mut self, textures: &TextureCache, layer: &LayerQuad, at: PixelPos) -> f32 {
        self.stats.probes += 1;
        let at = at.clamped(self.width, self.height);
        let Some(bitmap) = layer.texture.and_then(|id| textures.bitmap(id)) else {
            return 0.0;
        };
        match layer.sample_uv(self.center(at.x, at.y)) {
            Some(uv) => bitmap.sample_nearest(uv)[3] as f32 / 255.0 * layer.opacity,
            None => 0.0,
        }
    }

    fn release(&mut self) {
        self.keys = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use tableau_engine::texture::Bitmap;

    use super::*;
    use crate::quad::QuadTransform;

    /// 4×4 mask covering the left half.
    fn left_half(textures: &mut TextureCache) -> MaskDraw {
        let id = textures.insert(
            "left",
            Bitmap::from_fn(4, 4, |x, _| if x < 2 { [255, 255, 255, 255] } else { [0; 4] }),
        );
        MaskDraw {
            texture: Some(id),
            transform: QuadTransform::IDENTITY,
            key: ColorKey::new(10, 20, 30),
        }
    }

    #[test]
    fn masks_write_keys_where_covered() {
        let mut textures = TextureCache::new();
        let mask = left_half(&mut textures);
        let mut surface = SoftPickSurface::new(8, 8);

        surface.render_masks(&textures, &[mask]);
        assert_eq!(surface.read_mask(PixelPos::new(1, 4)), ColorKey::new(10, 20, 30));
        assert_eq!(surface.read_mask(PixelPos::new(6, 4)), ColorKey::NONE);
    }

    #[test]
    fn half_alpha_mask_texels_count() {
        let mut textures = TextureCache::new();
        let id = textures.insert("soft", Bitmap::solid(2, 2, [0, 0, 0, 128]));
        let low = textures.insert("faint", Bitmap::solid(2, 2, [0, 0, 0, 127]));
        let mut surface = SoftPickSurface::new(2, 2);

        let draw = |texture| MaskDraw {
            texture: Some(texture),
            transform: QuadTransform::IDENTITY,
            key: ColorKey::new(1, 1, 1),
        };
        surface.render_masks(&textures, &[draw(id)]);
        assert_eq!(surface.read_mask(PixelPos::new(0, 0)), ColorKey::new(1, 1, 1));
        surface.render_masks(&textures, &[draw(low)]);
        assert_eq!(surface.read_mask(PixelPos::new(0, 0)), ColorKey::NONE);
    }

    #[test]
    fn reads_clamp_out_of_range_pixels() {
        let mut textures = TextureCache::new();
        let mask = left_half(&mut textures);
        let mut surface = SoftPickSurface::new(8, 8);
        surface.render_masks(&textures, &[mask]);

        assert_eq!(surface.read_mask(PixelPos::new(0, 999)), ColorKey::new(10, 20, 30));
        assert_eq!(surface.read_mask(PixelPos::new(999, 0)), ColorKey::NONE);
    }

    #[test]
    fn probe_scales_by_opacity_and_clips() {
        let mut textures = TextureCache::new();
        let id = textures.insert("fog", Bitmap::solid(2, 2, [255, 255, 255, 255]));
        let mut surface = SoftPickSurface::new(4, 4);
        let mut layer = LayerQuad {
            texture: Some(id),
            transform: QuadTransform::IDENTITY,
            opacity: 0.5,
            dark_strength: 0.0,
            blur_samples: 0,
            uv_scroll: 0.0,
            wrap_x: false,
        };

        let a = surface.probe_alpha(&textures, &layer, PixelPos::new(1, 1));
        assert!((a - 0.5).abs() < 1e-6);

        layer.transform = QuadTransform::new(tableau_engine::coords::Vec2::new(0.9, 0.0), 1.0);
        assert_eq!(surface.probe_alpha(&textures, &layer, PixelPos::new(0, 0)), 0.0);
        assert_eq!(surface.stats().probes, 2);
    }

    #[test]
    fn release_then_render_reallocates() {
        let mut textures = TextureCache::new();
        let mask = left_half(&mut textures);
        let mut surface = SoftPickSurface::new(4, 4);
        surface.release();
        assert_eq!(surface.read_mask(PixelPos::new(0, 0)), ColorKey::NONE);

        surface.render_masks(&textures, &[mask]);
        assert_eq!(surface.read_mask(PixelPos::new(0, 0)), ColorKey::new(10, 20, 30));
    }
}
