//! One visual stratum of a scene.
//!
//! A layer owns its texture selection (base, variant or animated state), its
//! tweened scalars, and the offset it derives each frame from parallax and
//! idle drift. It never touches the GPU: [`Layer::quad`] describes what to
//! draw and [`Layer::test_occlusion`] takes the alpha probe as a closure.

mod animated;

use std::time::{Duration, Instant};

use rand::Rng;
use tableau_engine::coords::Vec2;
use tableau_engine::texture::TextureId;

use crate::definition::{AnimateShiftDef, LayerDef};
use crate::drift::{DriftPhase, IdleDrift};
use crate::quad::{LayerQuad, QuadTransform};
use crate::tween::{Easing, TweenStatus, Tweened};

pub use animated::AnimatedTexture;

/// Probe alpha above which a non-opaque layer counts as covering a pixel.
pub const OCCLUSION_ALPHA: f32 = 0.001;

/// Offset change that triggers a `texture_shift` report.
const SHIFT_EPSILON: f32 = 1e-4;

/// Per-frame inputs shared by every layer.
#[derive(Debug, Copy, Clone)]
pub struct LayerFrame {
    pub now: Instant,
    pub dt: f32,
    /// Normalized pointer, `[-1, 1]`, +Y up.
    pub cursor: Vec2,
    /// Aspect correction relative to the design aspect.
    pub fit: Vec2,
    pub drift: DriftPhase,
    /// Scene-wide horizontal slide added to every layer's uv scroll.
    pub slide: f32,
    /// False forces parallax and drift offsets to zero.
    pub shift_enabled: bool,
}

#[derive(Debug, Clone)]
struct Variant {
    name: String,
    texture: Option<TextureId>,
}

#[derive(Debug, Copy, Clone)]
struct Scroll {
    speed: f32,
    is_left: bool,
    u: f32,
}

impl Scroll {
    fn from_def(def: &AnimateShiftDef) -> Option<Self> {
        def.enabled.then_some(Self {
            speed: def.speed,
            is_left: def.is_left,
            u: 0.0,
        })
    }
}

pub struct Layer {
    name: String,
    render_order: i32,
    opaque: bool,
    parallax: f32,
    scale: f32,

    base_texture: Option<TextureId>,
    variants: Vec<Variant>,
    variant: Option<usize>,
    animated: Option<AnimatedTexture>,

    drift: Option<IdleDrift>,
    scroll: Option<Scroll>,
    slide: f32,
    offset: Vec2,
    reported_offset: Vec2,

    opacity: Tweened,
    dark_strength: Tweened,
    blur_samples: Tweened,

    disposed: bool,
}

impl Layer {
    /// Builds a layer from its definition. `resolve` maps texture names to
    /// cache ids; missing textures render transparent.
    pub fn from_def(
        def: &LayerDef,
        scale: f32,
        mut resolve: impl FnMut(&str) -> Option<TextureId>,
        rng: &mut impl Rng,
    ) -> Self {
        let base_texture = resolve(&def.texture);
        let variants = def
            .variants
            .iter()
            .map(|v| Variant {
                name: v.name.clone(),
                texture: resolve(&v.texture),
            })
            .collect();
        let animated = AnimatedTexture::new(&def.states, &mut resolve, rng);
        let drift = (def.idle_drift > 0.0).then(|| IdleDrift::new(def.idle_drift, rng));
        let samples = if def.blurred { def.samples as f32 } else { 0.0 };

        Self {
            name: def.texture.clone(),
            render_order: def.render_order,
            opaque: def.opaque,
            parallax: def.parallax,
            scale,
            base_texture,
            variants,
            variant: None,
            animated,
            drift,
            scroll: def.animate_shift.as_ref().and_then(Scroll::from_def),
            slide: 0.0,
            offset: Vec2::zero(),
            reported_offset: Vec2::zero(),
            opacity: Tweened::new(if def.hidden { 0.0 } else { 1.0 }),
            dark_strength: Tweened::new(0.0),
            blur_samples: Tweened::new(samples),
            disposed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render_order(&self) -> i32 {
        self.render_order
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn opacity(&self) -> f32 {
        self.opacity.value()
    }

    pub fn dark_strength(&self) -> f32 {
        self.dark_strength.value()
    }

    pub fn blur_samples(&self) -> u32 {
        self.blur_samples.value().round().max(0.0) as u32
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Texture drawn this frame: variant, then animated state, then base.
    pub fn texture(&self) -> Option<TextureId> {
        if self.disposed {
            return None;
        }
        if let Some(i) = self.variant {
            return self.variants[i].texture;
        }
        match &self.animated {
            Some(anim) => anim.texture(),
            None => self.base_texture,
        }
    }

    pub fn animated(&self) -> Option<&AnimatedTexture> {
        self.animated.as_ref()
    }

    /// Drawn at all this frame.
    pub fn is_visible(&self) -> bool {
        !self.disposed && self.opacity.value() > 0.0 && self.texture().is_some()
    }

    /// Per-frame update: tweens, animated state, scroll, drift and parallax.
    ///
    /// Returns the new offset when it moved by more than `1e-4` since the
    /// last report.
    pub fn update(&mut self, frame: &LayerFrame, rng: &mut impl Rng) -> Option<Vec2> {
        if self.disposed {
            return None;
        }

        self.advance_tweens(frame.now);

        if let Some(anim) = self.animated.as_mut() {
            anim.advance(frame.dt, rng);
        }

        let drift = match self.drift.as_mut() {
            Some(d) => d.advance(frame.drift, rng),
            None => 0.0,
        };

        self.slide = frame.slide;
        let parallax = match self.scroll.as_mut() {
            Some(scroll) => {
                let step = scroll.speed * frame.dt * 60.0;
                scroll.u = (scroll.u + if scroll.is_left { -step } else { step }).rem_euclid(1.0);
                Vec2::zero()
            }
            None => Vec2::new(
                -frame.cursor.x * self.parallax * frame.fit.x,
                frame.cursor.y * self.parallax * frame.fit.y,
            ),
        };

        self.offset = if frame.shift_enabled {
            parallax + Vec2::new(drift, -drift)
        } else {
            Vec2::zero()
        };

        if self.offset.max_abs_diff(self.reported_offset) > SHIFT_EPSILON {
            self.reported_offset = self.offset;
            return Some(self.offset);
        }
        None
    }

    /// Advances the opacity, dark and blur tweens. Returns the opacity status.
    pub fn advance_tweens(&mut self, now: Instant) -> TweenStatus {
        self.dark_strength.advance(now);
        self.blur_samples.advance(now);
        self.opacity.advance(now)
    }

    pub fn set_opacity(&mut self, value: f32, duration: Duration, now: Instant) {
        if self.disposed {
            return;
        }
        self.opacity
            .animate_to(value.clamp(0.0, 1.0), duration, Easing::QuadraticOut, now);
    }

    pub fn set_dark_strength(&mut self, value: f32, duration: Duration, now: Instant) {
        if self.disposed {
            return;
        }
        self.dark_strength
            .animate_to(value.clamp(0.0, 1.0), duration, Easing::QuadraticOut, now);
    }

    /// Tweens the blur tap count; the value is rounded to whole taps.
    pub fn set_blur_samples(&mut self, value: f32, duration: Duration, now: Instant) {
        if self.disposed {
            return;
        }
        self.blur_samples
            .animate_to(value.round().max(0.0), duration, Easing::QuadraticOut, now);
    }

    /// Fades to 0 (hidden) or 1.
    pub fn set_hidden(&mut self, hidden: bool, duration: Duration, now: Instant) {
        self.set_opacity(if hidden { 0.0 } else { 1.0 }, duration, now);
    }

    /// Switches to a named variant; `"default"` restores the base texture.
    pub fn set_variant(&mut self, name: &str) -> bool {
        if name == "default" {
            self.variant = None;
            return true;
        }
        match self.variants.iter().position(|v| v.name == name) {
            Some(i) => {
                self.variant = Some(i);
                true
            }
            None => {
                log::warn!("layer '{}': unknown variant '{name}'", self.name);
                false
            }
        }
    }

    /// True if this layer hides a farther item at the probed pixel.
    ///
    /// Only layers nearer than `item_order` and currently visible count.
    /// Opaque layers occlude without probing; others ask `probe` for their
    /// alpha at the pixel.
    pub fn test_occlusion(&self, item_order: i32, probe: impl FnOnce(&LayerQuad) -> f32) -> bool {
        if self.render_order <= item_order || !self.is_visible() {
            return false;
        }
        if self.opaque {
            return true;
        }
        probe(&self.quad()) > OCCLUSION_ALPHA
    }

    pub fn transform(&self) -> QuadTransform {
        QuadTransform::new(self.offset, self.scale)
    }

    pub fn quad(&self) -> LayerQuad {
        let scroll_u = self.scroll.map_or(0.0, |s| s.u);
        LayerQuad {
            texture: self.texture(),
            transform: self.transform(),
            opacity: if self.disposed { 0.0 } else { self.opacity.value() },
            dark_strength: self.dark_strength.value(),
            blur_samples: self.blur_samples(),
            uv_scroll: scroll_u + self.slide,
            wrap_x: self.scroll.is_some() || self.slide != 0.0,
        }
    }

    /// Cancels every tween, then drops texture state. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.opacity.cancel();
        self.dark_strength.cancel();
        self.blur_samples.cancel();

        self.animated = None;
        self.drift = None;
        self.variants.clear();
        self.variant = None;
        self.base_texture = None;
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::definition::VariantDef;

    fn def(order: i32, opaque: bool) -> LayerDef {
        LayerDef {
            texture: format!("layer{order}"),
            render_order: order,
            opaque,
            parallax: 0.1,
            idle_drift: 0.0,
            hidden: false,
            blurred: false,
            samples: 0,
            variants: vec![],
            animate_shift: None,
            states: vec![],
        }
    }

    fn tex(i: u32) -> Option<TextureId> {
        let mut cache = tableau_engine::texture::TextureCache::new();
        let mut id = None;
        for n in 0..=i {
            id = Some(cache.insert(format!("t{n}"), tableau_engine::texture::Bitmap::solid(1, 1, [0; 4])));
        }
        id
    }

    fn layer(d: &LayerDef) -> Layer {
        let mut rng = StdRng::seed_from_u64(1);
        Layer::from_def(d, 1.0, |_| tex(0), &mut rng)
    }

    fn frame(cursor: Vec2) -> LayerFrame {
        LayerFrame {
            now: Instant::now(),
            dt: 1.0 / 60.0,
            cursor,
            fit: Vec2::splat(1.0),
            drift: DriftPhase::at(0.0),
            slide: 0.0,
            shift_enabled: true,
        }
    }

    // ── parallax ──────────────────────────────────────────────────────────

    #[test]
    fn parallax_moves_against_pointer() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut l = layer(&def(0, false));
        let moved = l.update(&frame(Vec2::new(1.0, 1.0)), &mut rng);
        assert_eq!(moved, Some(Vec2::new(-0.1, 0.1)));

        // Same input again: no new report.
        assert_eq!(l.update(&frame(Vec2::new(1.0, 1.0)), &mut rng), None);
    }

    #[test]
    fn shift_disabled_zeroes_offset() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut l = layer(&def(0, false));
        let mut f = frame(Vec2::new(1.0, 0.0));
        f.shift_enabled = false;
        l.update(&f, &mut rng);
        assert_eq!(l.offset(), Vec2::zero());
    }

    #[test]
    fn scrolling_layer_wraps_u() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut d = def(0, false);
        d.animate_shift = Some(AnimateShiftDef {
            enabled: true,
            is_left: true,
            speed: 0.01,
        });
        let mut l = layer(&d);
        l.update(&frame(Vec2::new(1.0, 0.0)), &mut rng);

        let q = l.quad();
        assert!(q.wrap_x);
        assert!((q.uv_scroll - 0.99).abs() < 1e-4);
        assert_eq!(l.offset(), Vec2::zero());
    }

    // ── tweens ────────────────────────────────────────────────────────────

    #[test]
    fn opacity_converges_and_stops_occluding() {
        let t0 = Instant::now();
        let mut l = layer(&def(1, true));
        assert!(l.test_occlusion(0, |_| 1.0));

        l.set_opacity(0.0, Duration::from_millis(400), t0);
        l.advance_tweens(t0 + Duration::from_millis(200));
        assert!(l.opacity() > 0.0);

        assert_eq!(l.advance_tweens(t0 + Duration::from_millis(400)), TweenStatus::Finished);
        assert_eq!(l.opacity(), 0.0);
        assert!(!l.test_occlusion(0, |_| 1.0));
    }

    #[test]
    fn blur_samples_round() {
        let mut l = layer(&def(0, false));
        l.set_blur_samples(7.6, Duration::ZERO, Instant::now());
        assert_eq!(l.blur_samples(), 8);
    }

    // ── occlusion ─────────────────────────────────────────────────────────

    #[test]
    fn occlusion_requires_nearer_layer() {
        let l = layer(&def(2, true));
        assert!(l.test_occlusion(1, |_| 0.0));
        assert!(!l.test_occlusion(2, |_| 1.0));
        assert!(!l.test_occlusion(3, |_| 1.0));
    }

    #[test]
    fn opaque_layer_skips_probe() {
        let l = layer(&def(1, true));
        assert!(l.test_occlusion(0, |_| panic!("opaque layers must not probe")));
    }

    #[test]
    fn translucent_layer_uses_probe_threshold() {
        let l = layer(&def(1, false));
        assert!(!l.test_occlusion(0, |_| 0.0005));
        assert!(l.test_occlusion(0, |_| 0.5));
    }

    #[test]
    fn missing_texture_never_occludes() {
        let mut rng = StdRng::seed_from_u64(1);
        let l = Layer::from_def(&def(1, true), 1.0, |_| None, &mut rng);
        assert!(!l.test_occlusion(0, |_| 1.0));
    }

    // ── variants & dispose ────────────────────────────────────────────────

    #[test]
    fn variants_switch_and_restore() {
        let mut d = def(0, false);
        d.variants.push(VariantDef {
            name: "night".into(),
            texture: "night".into(),
        });
        let mut rng = StdRng::seed_from_u64(1);
        let mut l = Layer::from_def(&d, 1.0, |n| if n == "night" { tex(1) } else { tex(0) }, &mut rng);

        assert!(l.set_variant("night"));
        assert_eq!(l.texture(), tex(1));
        assert!(!l.set_variant("dawn"));
        assert_eq!(l.texture(), tex(1));
        assert!(l.set_variant("default"));
        assert_eq!(l.texture(), tex(0));
    }

    #[test]
    fn dispose_is_idempotent_and_cancels_tweens() {
        let t0 = Instant::now();
        let mut l = layer(&def(1, true));
        l.set_opacity(0.0, Duration::from_millis(400), t0);
        l.dispose();
        l.dispose();

        assert!(l.is_disposed());
        assert_eq!(l.advance_tweens(t0 + Duration::from_secs(1)), TweenStatus::Idle);
        assert_eq!(l.quad().texture, None);
        assert!(!l.test_occlusion(0, |_| 1.0));
    }
}
