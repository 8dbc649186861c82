use tableau_engine::coords::{Rect, Vec2};

use crate::pick::PixelPos;

/// Pointer position in the spaces the scene needs.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerSample {
    /// Pick-target pixel, zoom removed.
    pub pixel: PixelPos,
    /// `[-1, 1]` on both axes, +Y up.
    pub normalized: Vec2,
}

impl PointerSample {
    /// Position on the canvas as a top-left target fraction in `[0, 1]`;
    /// the focus [`super::Scene::zoom_in`] expects.
    pub fn canvas_fraction(&self) -> Vec2 {
        Vec2::new((self.normalized.x + 1.0) * 0.5, (1.0 - self.normalized.y) * 0.5)
    }
}

/// Maps a client-space point into pick-target pixels and normalized space.
///
/// `pan` is a fraction of the target; zoom is undone about the target center
/// so picks line up with the unzoomed mask pass.
pub fn map_pointer(canvas: Rect, client: Vec2, target: (u32, u32), zoom: f32, pan: Vec2) -> PointerSample {
    let frac = canvas.fraction_of(client);
    let size = Vec2::new(target.0 as f32, target.1 as f32);
    let center = size * 0.5;
    let zoom = if zoom > 0.0 { zoom } else { 1.0 };

    let px = center + (frac.mul_elem(size) - center - pan.mul_elem(size)) / zoom;
    let pixel = PixelPos::new(
        px.x.floor().clamp(0.0, size.x - 1.0) as u32,
        px.y.floor().clamp(0.0, size.y - 1.0) as u32,
    );

    PointerSample {
        pixel,
        normalized: Vec2::new(frac.x * 2.0 - 1.0, -(frac.y * 2.0 - 1.0)),
    }
}

/// Aspect correction for parallax: keeps motion proportional to the
/// artwork when the viewport is not at the design aspect.
pub fn parallax_fit(viewport_w: f32, viewport_h: f32, design_aspect: f32) -> Vec2 {
    if viewport_w <= 0.0 || viewport_h <= 0.0 {
        return Vec2::splat(1.0);
    }
    let screen = viewport_w.min(viewport_h);
    Vec2::new(screen * design_aspect / viewport_w, screen / viewport_h)
}

/// Pan that keeps `focus` (target fraction) fixed while zooming.
pub fn zoom_pan(focus: Vec2, zoom: f32) -> Vec2 {
    (Vec2::splat(0.5) - focus) * (zoom - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: Rect = Rect::new(100.0, 50.0, 800.0, 450.0);

    #[test]
    fn maps_center_and_corners() {
        let s = map_pointer(CANVAS, Vec2::new(500.0, 275.0), (1024, 576), 1.0, Vec2::zero());
        assert_eq!(s.pixel, PixelPos::new(512, 288));
        assert_eq!(s.normalized, Vec2::zero());

        let tl = map_pointer(CANVAS, Vec2::new(100.0, 50.0), (1024, 576), 1.0, Vec2::zero());
        assert_eq!(tl.pixel, PixelPos::new(0, 0));
        assert_eq!(tl.normalized, Vec2::new(-1.0, 1.0));
    }

    #[test]
    fn outside_canvas_clamps() {
        let s = map_pointer(CANVAS, Vec2::new(5000.0, 5000.0), (1024, 576), 1.0, Vec2::zero());
        assert_eq!(s.pixel, PixelPos::new(1023, 575));
        assert_eq!(s.normalized, Vec2::new(1.0, -1.0));
    }

    #[test]
    fn zoom_pulls_toward_center() {
        // Right edge at 2x zoom sees the pixel three quarters across.
        let s = map_pointer(CANVAS, Vec2::new(899.0, 275.0), (1000, 500), 2.0, Vec2::zero());
        assert!((748..=750).contains(&s.pixel.x), "{:?}", s.pixel);
        assert_eq!(s.pixel.y, 250);
    }

    #[test]
    fn zoom_pan_fixes_focus() {
        let focus = Vec2::new(0.2, 0.7);
        let zoom = 1.5;
        let pan = zoom_pan(focus, zoom);
        // The displayed point at `focus` still maps onto `focus`.
        let content = Vec2::splat(0.5) + (focus - Vec2::splat(0.5) - pan) / zoom;
        assert!(content.max_abs_diff(focus) < 1e-6);
    }

    #[test]
    fn canvas_fraction_zooms_toward_pointer() {
        let canvas = Rect::new(0.0, 0.0, 1600.0, 900.0);
        let s = map_pointer(canvas, Vec2::new(400.0, 225.0), (1024, 576), 1.0, Vec2::zero());
        let focus = s.canvas_fraction();
        assert!(focus.max_abs_diff(Vec2::new(0.25, 0.25)) < 1e-6);
        assert!(zoom_pan(focus, 1.5).max_abs_diff(Vec2::new(0.125, 0.125)) < 1e-6);

        let corner = map_pointer(CANVAS, Vec2::new(100.0, 50.0), (1024, 576), 1.0, Vec2::zero());
        assert_eq!(corner.canvas_fraction(), Vec2::zero());
    }

    #[test]
    fn fit_is_identity_at_design_aspect() {
        let fit = parallax_fit(1920.0, 1080.0, 1920.0 / 1080.0);
        assert!(fit.max_abs_diff(Vec2::splat(1.0)) < 1e-6);
        let tall = parallax_fit(1080.0, 1920.0, 1920.0 / 1080.0);
        assert!(tall.x > 1.0);
    }
}
