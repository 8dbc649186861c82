//! Color-keyed picking with occlusion and click debounce.

use std::time::{Duration, Instant};

use tableau_engine::texture::TextureCache;

use crate::color_key::ColorKey;
use crate::layer::Layer;
use crate::pick::{MaskDraw, PickSurface, PixelPos};
use crate::registry::{ItemId, ItemRegistry};

/// Outcome of one pick.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Pick {
    /// Resolved, unoccluded item.
    pub item: Option<ItemId>,
    /// Key of `item`, or [`ColorKey::NONE`].
    pub key: ColorKey,
    /// Render order of the layer that hid an otherwise matching item.
    pub occluded_by: Option<i32>,
}

impl Pick {
    pub const NONE: Pick = Pick {
        item: None,
        key: ColorKey::NONE,
        occluded_by: None,
    };

    pub fn is_hit(&self) -> bool {
        self.item.is_some()
    }
}

/// Resolves the item under the pointer once per frame.
#[derive(Debug, Clone)]
pub struct HitTester {
    debounce: Duration,
    last_click: Option<Instant>,
}

impl HitTester {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_click: None,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// True while `now` is inside the window after the last confirmed click.
    pub fn in_debounce(&self, now: Instant) -> bool {
        self.last_click
            .is_some_and(|t| now.saturating_duration_since(t) < self.debounce)
    }

    pub fn record_click(&mut self, now: Instant) {
        self.last_click = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_click = None;
    }

    /// Runs the mask pass, reads the key at `at` and checks occlusion.
    ///
    /// `layers` must be sorted by ascending render order. Opaque layers are
    /// checked first since they need no readback; translucent ones are then
    /// probed nearest-first until one covers the pixel.
    ///
    /// Returns `None` inside the debounce window; no GPU work is done then.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve<S: PickSurface + ?Sized>(
        &self,
        surface: &mut S,
        textures: &TextureCache,
        registry: &ItemRegistry,
        layers: &[Layer],
        masks: &[MaskDraw],
        at: PixelPos,
        now: Instant,
    ) -> Option<Pick> {
        if self.in_debounce(now) {
            return None;
        }

        surface.render_masks(textures, masks);
        let key = surface.read_mask(at);

        let Some((id, item)) = registry.resolve(key).and_then(|id| Some((id, registry.get(id)?)))
        else {
            return Some(Pick::NONE);
        };

        let opaque = layers.iter().filter(|l| l.is_opaque());
        let translucent = layers.iter().rev().filter(|l| !l.is_opaque());
        let occluder = opaque.chain(translucent).find(|layer| {
            layer.test_occlusion(item.render_order, |quad| surface.probe_alpha(textures, quad, at))
        });

        Some(match occluder {
            Some(layer) => Pick {
                occluded_by: Some(layer.render_order()),
                ..Pick::NONE
            },
            None => Pick {
                item: Some(id),
                key,
                occluded_by: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tableau_engine::texture::Bitmap;

    use super::*;
    use crate::definition::{ItemDef, LayerDef};
    use crate::pick::SoftPickSurface;
    use crate::quad::QuadTransform;

    struct Fixture {
        textures: TextureCache,
        registry: ItemRegistry,
        layers: Vec<Layer>,
        masks: Vec<MaskDraw>,
        surface: SoftPickSurface,
    }

    fn layer_def(order: i32, texture: &str, opaque: bool) -> LayerDef {
        LayerDef {
            texture: texture.into(),
            render_order: order,
            opaque,
            parallax: 0.0,
            idle_drift: 0.0,
            hidden: false,
            blurred: false,
            samples: 0,
            variants: vec![],
            animate_shift: None,
            states: vec![],
        }
    }

    /// Item "I" (order 0) on the left half; layer 1 covers the left half
    /// with `cover_alpha`.
    fn fixture(cover_alpha: u8, opaque: bool) -> Fixture {
        let mut textures = TextureCache::new();
        textures.insert("bg", Bitmap::solid(4, 4, [50, 50, 50, 255]));
        textures.insert(
            "cover",
            Bitmap::from_fn(4, 4, |x, _| if x < 2 { [0, 0, 0, cover_alpha] } else { [0; 4] }),
        );
        let mask = textures.insert(
            "i_mask",
            Bitmap::from_fn(4, 4, |x, _| if x < 2 { [255; 4] } else { [0; 4] }),
        );

        let registry = ItemRegistry::from_defs(
            &[ItemDef {
                name: "I".into(),
                color: ColorKey::new(200, 0, 0),
                mask: "i_mask".into(),
                render_order: 0,
                description: "item".into(),
            }],
            |n| textures.lookup(n),
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        let layers = vec![
            Layer::from_def(&layer_def(0, "bg", false), 1.0, |n| textures.lookup(n), &mut rng),
            Layer::from_def(&layer_def(1, "cover", opaque), 1.0, |n| textures.lookup(n), &mut rng),
        ];
        let masks = vec![MaskDraw {
            texture: Some(mask),
            transform: QuadTransform::IDENTITY,
            key: ColorKey::new(200, 0, 0),
        }];

        Fixture {
            textures,
            registry,
            layers,
            masks,
            surface: SoftPickSurface::new(8, 8),
        }
    }

    impl Fixture {
        fn pick(&mut self, tester: &HitTester, at: PixelPos, now: Instant) -> Option<Pick> {
            tester.resolve(
                &mut self.surface,
                &self.textures,
                &self.registry,
                &self.layers,
                &self.masks,
                at,
                now,
            )
        }
    }

    // ── resolution ────────────────────────────────────────────────────────

    #[test]
    fn empty_pixel_is_no_hit() {
        let mut fx = fixture(0, false);
        let tester = HitTester::new(Duration::from_millis(375));
        assert_eq!(fx.pick(&tester, PixelPos::new(7, 4), Instant::now()), Some(Pick::NONE));
    }

    #[test]
    fn transparent_cover_lets_item_through() {
        let mut fx = fixture(0, false);
        let tester = HitTester::new(Duration::from_millis(375));
        let pick = fx.pick(&tester, PixelPos::new(1, 4), Instant::now()).unwrap();
        assert!(pick.is_hit());
        assert_eq!(pick.key, ColorKey::new(200, 0, 0));
        assert_eq!(fx.surface.stats().probes, 1);
    }

    #[test]
    fn translucent_cover_occludes() {
        let mut fx = fixture(40, false);
        let tester = HitTester::new(Duration::from_millis(375));
        let pick = fx.pick(&tester, PixelPos::new(1, 4), Instant::now()).unwrap();
        assert!(!pick.is_hit());
        assert_eq!(pick.occluded_by, Some(1));
    }

    #[test]
    fn opaque_cover_occludes_without_probe() {
        // Fully transparent texels, but flagged opaque.
        let mut fx = fixture(0, true);
        let tester = HitTester::new(Duration::from_millis(375));
        let pick = fx.pick(&tester, PixelPos::new(1, 4), Instant::now()).unwrap();
        assert_eq!(pick.occluded_by, Some(1));
        assert_eq!(fx.surface.stats().probes, 0);
    }

    #[test]
    fn repeated_picks_are_stable() {
        let mut fx = fixture(0, false);
        let tester = HitTester::new(Duration::from_millis(375));
        let now = Instant::now();
        let first = fx.pick(&tester, PixelPos::new(1, 2), now);
        for _ in 0..10 {
            assert_eq!(fx.pick(&tester, PixelPos::new(1, 2), now), first);
        }
    }

    // ── debounce ──────────────────────────────────────────────────────────

    #[test]
    fn debounce_window_skips_picking() {
        let mut fx = fixture(0, false);
        let mut tester = HitTester::new(Duration::from_millis(375));
        let t0 = Instant::now();
        tester.record_click(t0);

        assert!(tester.in_debounce(t0 + Duration::from_millis(374)));
        assert_eq!(fx.pick(&tester, PixelPos::new(1, 4), t0 + Duration::from_millis(100)), None);
        assert_eq!(fx.surface.stats().mask_passes, 0);

        assert!(!tester.in_debounce(t0 + Duration::from_millis(375)));
        assert!(fx.pick(&tester, PixelPos::new(1, 4), t0 + Duration::from_millis(400)).is_some());

        tester.reset();
        assert!(!tester.in_debounce(t0));
    }
}
