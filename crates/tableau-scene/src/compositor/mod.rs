//! Final pass state: blur ramp, darkening, exclusion and highlight.
//!
//! The compositor itself holds no GPU resources. It owns the tweened blur
//! parameters and turns them into a [`CompositeParams`] block each frame;
//! [`crate::gpu::SceneRenderer`] runs the actual pass.

use std::f32::consts::TAU;
use std::time::{Duration, Instant};

use bytemuck::{Pod, Zeroable};
use tableau_engine::coords::Vec2;

use crate::color_key::ColorKey;
use crate::config::HighlightStyle;
use crate::tween::{Easing, Tweened};

/// Uniform block of the composite program.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CompositeParams {
    /// Excluded key rgb, 1 when set.
    pub excluded: [f32; 4],
    /// Picked key rgb, 1 when set.
    pub picked: [f32; 4],
    /// Highlight rgb (straight), current tint strength.
    pub highlight: [f32; 4],
    /// Blur samples, dark strength, texel size.
    pub blur: [f32; 4],
    /// Zoom, pan x, pan y (fractions of the target), unused.
    pub view: [f32; 4],
}

/// Per-frame view inputs for [`Compositor::params`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CompositeView {
    pub picked: ColorKey,
    /// Seconds on the highlight glow clock.
    pub glow_time: f32,
    pub zoom: f32,
    pub pan: Vec2,
    /// `1 / target size`.
    pub texel: Vec2,
}

pub struct Compositor {
    samples: Tweened,
    dark: Tweened,
    excluded: Option<ColorKey>,
    highlight: HighlightStyle,
    glow_period: f32,

    target_samples: u32,
    target_dark: f32,
    duration: Duration,
    blurred: bool,
}

impl Compositor {
    pub fn new(
        target_samples: u32,
        target_dark: f32,
        duration: Duration,
        highlight: HighlightStyle,
        glow_period: Duration,
    ) -> Self {
        Self {
            samples: Tweened::new(0.0),
            dark: Tweened::new(0.0),
            excluded: None,
            highlight,
            glow_period: glow_period.as_secs_f32().max(f32::EPSILON),
            target_samples,
            target_dark,
            duration,
            blurred: false,
        }
    }

    pub fn is_blurred(&self) -> bool {
        self.blurred
    }

    /// Ramps samples and darkening to their targets, or back to 0.
    pub fn toggle_blur(&mut self, enabled: bool, now: Instant) {
        self.blurred = enabled;
        let (samples, dark) = if enabled {
            (self.target_samples as f32, self.target_dark)
        } else {
            (0.0, 0.0)
        };
        self.samples
            .animate_to(samples, self.duration, Easing::QuadraticOut, now);
        self.dark.animate_to(dark, self.duration, Easing::QuadraticOut, now);
    }

    /// Keeps pixels of `key` crisp and undarkened.
    pub fn exclude(&mut self, key: ColorKey) {
        self.excluded = (!key.is_none()).then_some(key);
    }

    pub fn include(&mut self) {
        self.excluded = None;
    }

    pub fn excluded(&self) -> Option<ColorKey> {
        self.excluded
    }

    pub fn advance(&mut self, now: Instant) {
        self.samples.advance(now);
        self.dark.advance(now);
    }

    /// Stops both ramps where they are.
    pub fn cancel(&mut self) {
        self.samples.cancel();
        self.dark.cancel();
    }

    /// Current blur tap count; 0 disables the blur.
    pub fn sample_count(&self) -> u32 {
        self.samples.value().round().max(0.0) as u32
    }

    pub fn dark_strength(&self) -> f32 {
        self.dark.value()
    }

    /// True if a pixel with mask `key` skips blur and darkening.
    pub fn blur_bypassed(&self, key: ColorKey) -> bool {
        !key.is_none() && self.excluded == Some(key)
    }

    /// Tint strength at `glow_time`: oscillates between the selected and
    /// shimmer opacities.
    pub fn highlight_strength(&self, glow_time: f32) -> f32 {
        let wave = 0.5 - 0.5 * (glow_time / self.glow_period * TAU).cos();
        let HighlightStyle {
            selected_opacity: lo,
            shimmer_opacity: hi,
            ..
        } = self.highlight;
        lo + (hi - lo) * wave
    }

    pub fn params(&self, view: &CompositeView) -> CompositeParams {
        let flag = |set: bool| if set { 1.0 } else { 0.0 };
        let excluded = self.excluded.unwrap_or(ColorKey::NONE);
        let [er, eg, eb] = excluded.to_unit();
        let [pr, pg, pb] = view.picked.to_unit();
        let (hr, hg, hb, _) = self.highlight.color.to_straight();

        CompositeParams {
            excluded: [er, eg, eb, flag(self.excluded.is_some())],
            picked: [pr, pg, pb, flag(!view.picked.is_none())],
            highlight: [hr, hg, hb, self.highlight_strength(view.glow_time)],
            blur: [
                self.sample_count() as f32,
                self.dark_strength(),
                view.texel.x,
                view.texel.y,
            ],
            view: [view.zoom, view.pan.x, view.pan.y, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compositor() -> Compositor {
        Compositor::new(
            30,
            0.8,
            Duration::from_millis(400),
            HighlightStyle::default(),
            Duration::from_secs(4),
        )
    }

    fn view() -> CompositeView {
        CompositeView {
            picked: ColorKey::NONE,
            glow_time: 0.0,
            zoom: 1.0,
            pan: Vec2::zero(),
            texel: Vec2::splat(1.0 / 512.0),
        }
    }

    #[test]
    fn toggle_blur_ramps_over_duration() {
        let t0 = Instant::now();
        let mut c = compositor();
        c.toggle_blur(true, t0);

        c.advance(t0 + Duration::from_millis(100));
        assert!(c.sample_count() > 0 && c.sample_count() < 30);

        c.advance(t0 + Duration::from_millis(400));
        assert_eq!(c.sample_count(), 30);
        assert!((c.dark_strength() - 0.8).abs() < 1e-6);

        c.toggle_blur(false, t0 + Duration::from_millis(400));
        c.advance(t0 + Duration::from_millis(800));
        assert_eq!(c.sample_count(), 0);
        assert_eq!(c.dark_strength(), 0.0);
    }

    #[test]
    fn only_excluded_key_bypasses() {
        let mut c = compositor();
        let key = ColorKey::new(1, 2, 3);
        assert!(!c.blur_bypassed(key));

        c.exclude(key);
        assert!(c.blur_bypassed(key));
        assert!(!c.blur_bypassed(ColorKey::new(3, 2, 1)));
        assert!(!c.blur_bypassed(ColorKey::NONE));

        c.include();
        assert!(!c.blur_bypassed(key));
    }

    #[test]
    fn excluding_none_clears() {
        let mut c = compositor();
        c.exclude(ColorKey::new(1, 1, 1));
        c.exclude(ColorKey::NONE);
        assert_eq!(c.excluded(), None);
    }

    #[test]
    fn highlight_oscillates_between_opacities() {
        let c = compositor();
        assert!((c.highlight_strength(0.0) - 0.4).abs() < 1e-5);
        assert!((c.highlight_strength(2.0) - 0.8).abs() < 1e-5);
    }

    #[test]
    fn params_flag_set_keys() {
        let mut c = compositor();
        c.exclude(ColorKey::new(255, 0, 0));
        let p = c.params(&CompositeView {
            picked: ColorKey::new(0, 255, 0),
            ..view()
        });
        assert_eq!(p.excluded, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(p.picked, [0.0, 1.0, 0.0, 1.0]);

        let idle = compositor().params(&view());
        assert_eq!(idle.excluded[3], 0.0);
        assert_eq!(idle.picked[3], 0.0);
    }
}
