use super::Vec2;

/// Axis-aligned rectangle in logical pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let (x, w) = if self.size.x < 0.0 {
            (self.origin.x + self.size.x, -self.size.x)
        } else {
            (self.origin.x, self.size.x)
        };
        let (y, h) = if self.size.y < 0.0 {
            (self.origin.y + self.size.y, -self.size.y)
        } else {
            (self.origin.y, self.size.y)
        };
        Rect::new(x, y, w, h)
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let r = self.normalized();
        let max = r.max();
        p.x >= r.origin.x && p.y >= r.origin.y && p.x < max.x && p.y < max.y
    }

    /// Position of `p` relative to the rect, as a fraction of its size,
    /// clamped to `[0, 1]` on both axes. Empty rects map everything to 0.
    #[inline]
    pub fn fraction_of(self, p: Vec2) -> Vec2 {
        let r = self.normalized();
        if r.is_empty() {
            return Vec2::zero();
        }
        Vec2::new(
            ((p.x - r.origin.x) / r.size.x).clamp(0.0, 1.0),
            ((p.y - r.origin.y) / r.size.y).clamp(0.0, 1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── normalized ────────────────────────────────────────────────────────

    #[test]
    fn normalized_positive_is_identity() {
        let rect = r(1.0, 2.0, 10.0, 20.0);
        assert_eq!(rect.normalized(), rect);
    }

    #[test]
    fn normalized_negative_extents() {
        let n = r(10.0, 10.0, -4.0, -3.0).normalized();
        assert_eq!(n, r(6.0, 7.0, 4.0, 3.0));
    }

    // ── contains ──────────────────────────────────────────────────────────

    #[test]
    fn contains_is_half_open() {
        let rect = r(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(Vec2::new(0.0, 0.0)));
        assert!(rect.contains(Vec2::new(5.0, 5.0)));
        assert!(!rect.contains(Vec2::new(10.0, 10.0)));
        assert!(!rect.contains(Vec2::new(-1.0, 5.0)));
    }

    // ── fraction_of ───────────────────────────────────────────────────────

    #[test]
    fn fraction_of_maps_offset_rect() {
        let rect = r(100.0, 50.0, 200.0, 100.0);
        assert_eq!(rect.fraction_of(Vec2::new(200.0, 75.0)), Vec2::new(0.5, 0.25));
    }

    #[test]
    fn fraction_of_clamps_outside_points() {
        let rect = r(0.0, 0.0, 10.0, 10.0);
        assert_eq!(rect.fraction_of(Vec2::new(-5.0, 50.0)), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn fraction_of_empty_rect_is_zero() {
        assert_eq!(r(0.0, 0.0, 0.0, 10.0).fraction_of(Vec2::new(3.0, 3.0)), Vec2::zero());
    }
}
