//! Scene orchestration: layers, items, hit testing, compositing and input.

mod clickable;
mod events;
mod pointer;

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tableau_engine::coords::{Rect, Vec2, Viewport};
use tableau_engine::texture::{TextureCache, TextureId};
use tableau_engine::time::FrameTime;

use crate::compositor::{CompositeParams, CompositeView, Compositor};
use crate::config::{SceneConfig, SceneSettings};
use crate::definition::SceneDefinition;
use crate::drift::DriftClock;
use crate::error::SceneError;
use crate::hit::{HitTester, Pick};
use crate::layer::{Layer, LayerFrame};
use crate::pick::{MaskDraw, PickSurface};
use crate::quad::{LayerQuad, QuadTransform};
use crate::registry::{InteractiveItem, ItemRegistry};
use crate::tween::{Easing, TweenStatus, Tweened};

pub use clickable::{ClickState, Clickability};
pub use events::{CursorHint, SceneEvent};
pub use pointer::{PointerSample, map_pointer, parallax_fit, zoom_pan};

/// wgpu's default `max_texture_dimension_2d`.
pub const MAX_TARGET_DIMENSION: u32 = 8192;

/// Everything the renderer needs for one displayed frame.
#[derive(Debug, Clone)]
pub struct SceneFrame {
    /// Back to front.
    pub layers: Vec<LayerQuad>,
    pub masks: Vec<MaskDraw>,
    pub params: CompositeParams,
    pub target: (u32, u32),
}

#[derive(Debug, Copy, Clone)]
struct Glow {
    started_at: f32,
    offset: f32,
}

/// One interactive tableau.
///
/// Frame-driven and single-threaded: the host forwards input, calls
/// [`Scene::render`] once per frame and drains [`SceneEvent`]s afterwards.
pub struct Scene<S: PickSurface> {
    config: SceneConfig,
    settings: SceneSettings,
    surface: S,
    rng: StdRng,

    layers: Vec<Layer>,
    registry: ItemRegistry,
    hit: HitTester,
    compositor: Compositor,
    clickability: Clickability,

    viewport: Viewport,
    canvas: Rect,
    pointer: Option<PointerSample>,
    client: Option<Vec2>,
    cursor: Vec2,

    pick: Pick,
    last_pick_at: Option<Instant>,
    drift: DriftClock,
    slide: Tweened,
    zoom: Tweened,
    zoom_focus: Vec2,
    glow: Option<Glow>,
    show_hover_description: bool,

    events: Vec<SceneEvent>,
    loaded: bool,
    disposed: bool,
}

impl<S: PickSurface> Scene<S> {
    pub fn new(config: SceneConfig, surface: S) -> Self {
        Self::with_rng(config, surface, StdRng::from_entropy())
    }

    /// Deterministic drift and animated-state choices.
    pub fn with_seed(config: SceneConfig, surface: S, seed: u64) -> Self {
        Self::with_rng(config, surface, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SceneConfig, surface: S, rng: StdRng) -> Self {
        let compositor = Compositor::new(
            config.blur_samples,
            config.blur_dark_strength,
            config.blur_duration,
            config.highlight,
            config.glow_period,
        );
        Self {
            hit: HitTester::new(config.click_debounce),
            drift: DriftClock::new(config.drift_period.as_secs_f32()),
            compositor,
            settings: SceneSettings::default(),
            surface,
            rng,
            layers: Vec::new(),
            registry: ItemRegistry::default(),
            clickability: Clickability::default(),
            viewport: Viewport::new(1.0, 1.0),
            canvas: Rect::new(0.0, 0.0, 1.0, 1.0),
            pointer: None,
            client: None,
            cursor: Vec2::zero(),
            pick: Pick::NONE,
            last_pick_at: None,
            slide: Tweened::new(0.0),
            zoom: Tweened::new(1.0),
            zoom_focus: Vec2::splat(0.5),
            glow: None,
            show_hover_description: true,
            events: Vec::new(),
            loaded: false,
            disposed: false,
            config,
        }
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    /// Replaces the current scene. Per-scene state is dropped first; the
    /// texture cache is shared and left alone.
    pub fn set_scene_data(&mut self, def: &SceneDefinition, textures: &TextureCache) -> Result<(), SceneError> {
        def.validate()?;
        self.teardown();

        let mut missing = HashSet::new();
        let mut resolve = |name: &str| -> Option<TextureId> {
            let id = textures.lookup(name);
            if id.is_none() && missing.insert(name.to_string()) {
                log::warn!("texture '{name}' is missing; drawing it transparent");
            }
            id
        };

        let registry = ItemRegistry::from_defs(&def.items, &mut resolve)?;
        let scale = 1.0 + def.scale_addon;
        let mut layers: Vec<Layer> = def
            .layers
            .iter()
            .map(|l| Layer::from_def(l, scale, &mut resolve, &mut self.rng))
            .collect();
        layers.sort_by_key(Layer::render_order);

        self.layers = layers;
        self.registry = registry;
        self.drift.reset();
        self.slide.set(0.0);
        self.zoom.set(1.0);
        self.zoom_focus = Vec2::splat(0.5);
        self.hit.reset();
        self.compositor.include();
        self.last_pick_at = None;
        self.clickability.set_transitioning(false);

        let (w, h) = self.target_size();
        self.surface.resize(w, h);
        self.refresh_pointer();
        self.loaded = true;
        self.disposed = false;

        log::debug!(
            "scene loaded: {} layers, {} items, pick target {w}x{h}",
            self.layers.len(),
            self.registry.len()
        );
        Ok(())
    }

    /// Cancels every tween, then frees layers and pick targets. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.teardown();
        self.compositor.cancel();
        self.pointer = None;
        self.client = None;
        self.disposed = true;
        log::debug!("scene disposed");
    }

    fn teardown(&mut self) {
        self.slide.cancel();
        self.zoom.cancel();
        for layer in &mut self.layers {
            layer.dispose();
        }
        self.layers.clear();
        self.registry = ItemRegistry::default();
        self.set_pick(Pick::NONE);
        self.surface.release();
        self.loaded = false;
    }

    /// Updates the viewport and the client-space rect of the canvas.
    pub fn resize(&mut self, viewport: Viewport, canvas: Rect) {
        self.viewport = viewport;
        self.canvas = canvas;
        if self.loaded {
            let (w, h) = self.target_size();
            self.surface.resize(w, h);
        }
        self.refresh_pointer();
    }

    /// Pick target size: viewport aspect, longer side at the configured
    /// width and never above [`MAX_TARGET_DIMENSION`].
    pub fn target_size(&self) -> (u32, u32) {
        let long = self.config.target_width.clamp(1, MAX_TARGET_DIMENSION) as f32;
        let aspect = self.viewport.aspect();
        let (w, h) = if aspect >= 1.0 {
            (long, long / aspect)
        } else {
            (long * aspect, long)
        };
        (w.round().max(1.0) as u32, h.round().max(1.0) as u32)
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Advances animations and, when clickable, re-resolves the pick.
    ///
    /// `enabled = false` clears the pick and resets the highlight clock.
    pub fn render(&mut self, textures: &TextureCache, time: &FrameTime, enabled: bool) {
        if self.disposed || !self.loaded {
            return;
        }
        let now = time.now;

        self.compositor.advance(now);
        if self.zoom.advance(now) != TweenStatus::Idle {
            self.refresh_pointer();
        }
        if self.slide.advance(now) == TweenStatus::Finished {
            self.set_transitioning(false);
        }

        if !enabled {
            self.glow = None;
            self.set_pick(Pick::NONE);
            return;
        }
        let period = self.config.glow_period.as_secs_f32().max(f32::EPSILON);
        if self.glow.is_none() {
            self.glow = Some(Glow {
                started_at: time.elapsed,
                offset: time.elapsed % period + 1.0,
            });
        }

        let target = self.pointer.map_or(Vec2::zero(), |p| p.normalized);
        self.cursor = self
            .cursor
            .lerp(target, self.config.pointer_smoothing.clamp(0.0, 1.0));

        let frame = LayerFrame {
            now,
            dt: time.dt,
            cursor: self.cursor,
            fit: parallax_fit(self.viewport.width, self.viewport.height, self.config.design_aspect),
            drift: self.drift.tick(time.dt),
            slide: self.slide.value(),
            shift_enabled: self.settings.scene_shift_enabled,
        };
        for layer in &mut self.layers {
            if let Some(offset) = layer.update(&frame, &mut self.rng) {
                self.events.push(SceneEvent::TextureShift {
                    render_order: layer.render_order(),
                    offset,
                });
            }
        }

        if !self.clickability.is_active() {
            return;
        }
        let Some(pointer) = self.pointer else {
            self.set_pick(Pick::NONE);
            return;
        };
        if let Some(last) = self.last_pick_at {
            if now.saturating_duration_since(last) < self.config.pick_interval {
                return;
            }
        }

        let masks = self.mask_draws();
        let resolved = self.hit.resolve(
            &mut self.surface,
            textures,
            &self.registry,
            &self.layers,
            &masks,
            pointer.pixel,
            now,
        );
        self.last_pick_at = Some(now);
        if let Some(pick) = resolved {
            self.set_pick(pick);
        }
    }

    /// Mask draws for every item, moving with the layer of the same order.
    pub fn mask_draws(&self) -> Vec<MaskDraw> {
        self.registry
            .iter()
            .map(|(_, item)| MaskDraw {
                texture: item.mask,
                transform: self.transform_for(item.render_order),
                key: item.key,
            })
            .collect()
    }

    fn transform_for(&self, render_order: i32) -> QuadTransform {
        self.layers
            .iter()
            .find(|l| l.render_order() == render_order)
            .map(Layer::transform)
            .unwrap_or_else(|| {
                let scale = self.layers.first().map_or(1.0, |l| l.transform().scale);
                QuadTransform::new(Vec2::zero(), scale)
            })
    }

    /// Snapshot for the display pass.
    pub fn frame_view(&self, elapsed: f32) -> SceneFrame {
        let target = self.target_size();
        let view = CompositeView {
            picked: self.pick.key,
            glow_time: self.glow_time(elapsed),
            zoom: self.zoom(),
            pan: self.pan(),
            texel: Vec2::new(1.0 / target.0 as f32, 1.0 / target.1 as f32),
        };
        SceneFrame {
            layers: self.layers.iter().map(Layer::quad).collect(),
            masks: self.mask_draws(),
            params: self.compositor.params(&view),
            target,
        }
    }

    /// Seconds on the highlight clock; 0 before the first enabled frame.
    pub fn glow_time(&self, elapsed: f32) -> f32 {
        self.glow
            .map_or(0.0, |g| g.offset + (elapsed - g.started_at).max(0.0))
    }

    // ── input ─────────────────────────────────────────────────────────────

    /// Records a pointer position in client coordinates.
    pub fn on_pointer_move(&mut self, client: Vec2) {
        self.client = Some(client);
        self.refresh_pointer();
    }

    pub fn on_pointer_leave(&mut self) {
        self.client = None;
        self.pointer = None;
    }

    /// Resolves a click against the current pick.
    ///
    /// Swallowed while suspended or inside the debounce window. A click on
    /// an item emits its name, clears the pick and starts the debounce.
    pub fn on_pointer_click(&mut self, client: Vec2, now: Instant) {
        self.on_pointer_move(client);
        if self.disposed || !self.clickability.is_active() || self.hit.in_debounce(now) {
            log::debug!("click ignored");
            return;
        }

        match self.picked_item().map(|item| item.name.clone()) {
            Some(name) => {
                self.events.push(SceneEvent::SceneClick(Some(name)));
                self.set_pick(Pick::NONE);
                self.hit.record_click(now);
            }
            None => self.events.push(SceneEvent::SceneClick(None)),
        }
    }

    fn refresh_pointer(&mut self) {
        self.pointer = self.client.map(|client| {
            map_pointer(self.canvas, client, self.target_size(), self.zoom(), self.pan())
        });
    }

    /// Host modal signal: `false` suspends picking and clears the pick.
    pub fn set_clickable(&mut self, clickable: bool) {
        if let Some(state) = self.clickability.set_modal_open(!clickable) {
            self.on_click_state(state);
        }
    }

    fn set_transitioning(&mut self, transitioning: bool) {
        if let Some(state) = self.clickability.set_transitioning(transitioning) {
            self.on_click_state(state);
        }
    }

    fn on_click_state(&mut self, state: ClickState) {
        log::debug!("scene clickability: {state:?}");
        if state == ClickState::Suspended {
            self.set_pick(Pick::NONE);
        }
    }

    /// Stores `pick`, emitting hover events if the item changed.
    fn set_pick(&mut self, pick: Pick) {
        let changed = pick.item != self.pick.item;
        self.pick = pick;
        if !changed {
            return;
        }

        let item = pick.item.and_then(|id| self.registry.get(id));
        self.events
            .push(SceneEvent::HoverItem(item.map(|i| i.name.clone())));
        if self.show_hover_description {
            let description = item
                .map(|i| i.description.clone())
                .filter(|d| !d.is_empty());
            self.events.push(SceneEvent::HoverDescription(description));
        }
    }

    // ── effects ───────────────────────────────────────────────────────────

    /// Blurs and darkens everything except the excluded item.
    /// Enabling is ignored while blur is turned off in the settings.
    pub fn toggle_blur(&mut self, enabled: bool, now: Instant) {
        if enabled && !self.settings.blur_enabled {
            return;
        }
        self.compositor.toggle_blur(enabled, now);
    }

    /// Fades the layer with texture `name` out. Returns false if unknown.
    pub fn hide_item(&mut self, name: &str, instant: bool, now: Instant) -> bool {
        self.set_layer_hidden(name, true, instant, now)
    }

    pub fn show_item(&mut self, name: &str, instant: bool, now: Instant) -> bool {
        self.set_layer_hidden(name, false, instant, now)
    }

    fn set_layer_hidden(&mut self, name: &str, hidden: bool, instant: bool, now: Instant) -> bool {
        let duration = if instant {
            Duration::ZERO
        } else {
            self.config.fade_duration
        };
        match self.layer_mut(name) {
            Some(layer) => {
                layer.set_hidden(hidden, duration, now);
                true
            }
            None => false,
        }
    }

    /// Keeps the item (by name or mask name) crisp while the rest blurs.
    pub fn exclude_item(&mut self, name: &str) -> bool {
        match self.registry.by_name(name).and_then(|id| self.registry.get(id)) {
            Some(item) => {
                self.compositor.exclude(item.key);
                true
            }
            None => {
                log::warn!("exclude_item: unknown item '{name}'");
                false
            }
        }
    }

    pub fn include_item(&mut self) {
        self.compositor.include();
    }

    pub fn set_layer_variant(&mut self, layer: &str, variant: &str) -> bool {
        self.layer_mut(layer).is_some_and(|l| l.set_variant(variant))
    }

    /// Slides the panorama one full width left or right. Picking is
    /// suspended until the slide lands.
    pub fn shift_image(&mut self, is_left: bool, now: Instant) {
        let step = if is_left { -1.0 } else { 1.0 };
        self.slide.animate_to(
            self.slide.target() + step,
            self.config.shift_duration,
            Easing::QuadraticInOut,
            now,
        );
        self.set_transitioning(true);
    }

    /// Zooms the displayed frame toward `focus` (target fraction).
    pub fn zoom_in(&mut self, focus: Vec2, now: Instant) {
        self.zoom_focus = focus.clamp(0.0, 1.0);
        self.zoom.animate_to(
            self.config.zoom_factor,
            self.config.zoom_duration,
            Easing::QuarticOut,
            now,
        );
    }

    pub fn reset_zoom(&mut self, now: Instant) {
        self.zoom
            .animate_to(1.0, self.config.zoom_duration, Easing::QuarticOut, now);
    }

    pub fn set_show_hover_description(&mut self, show: bool) {
        self.show_hover_description = show;
    }

    /// Applies new settings; turning blur off also ramps it down.
    pub fn update_settings(&mut self, settings: SceneSettings, now: Instant) {
        self.settings = settings;
        if !settings.blur_enabled && self.compositor.is_blurred() {
            self.compositor.toggle_blur(false, now);
        }
    }

    // ── queries ───────────────────────────────────────────────────────────

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    /// Active and hovering an item.
    pub fn can_click(&self) -> bool {
        self.clickability.is_active() && self.pick.is_hit()
    }

    pub fn cursor_hint(&self) -> CursorHint {
        if self.can_click() {
            CursorHint::Pointer
        } else {
            CursorHint::Default
        }
    }

    pub fn click_state(&self) -> ClickState {
        self.clickability.state()
    }

    pub fn pick(&self) -> Pick {
        self.pick
    }

    pub fn picked_item(&self) -> Option<&InteractiveItem> {
        self.pick.item.and_then(|id| self.registry.get(id))
    }

    pub fn pointer(&self) -> Option<PointerSample> {
        self.pointer
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        let found = self.layers.iter_mut().find(|l| l.name() == name);
        if found.is_none() {
            log::warn!("unknown layer '{name}'");
        }
        found
    }

    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn zoom(&self) -> f32 {
        self.zoom.value()
    }

    /// Current pan as a fraction of the target.
    pub fn pan(&self) -> Vec2 {
        zoom_pan(self.zoom_focus, self.zoom.value())
    }

    pub fn slide(&self) -> f32 {
        self.slide.value()
    }

    pub fn settings(&self) -> SceneSettings {
        self.settings
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}
