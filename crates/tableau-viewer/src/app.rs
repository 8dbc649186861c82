use std::time::Instant;

use tableau_engine::coords::{Rect, Vec2, Viewport};
use tableau_engine::core::{App, AppControl, FrameCtx};
use tableau_engine::input::{InputEvent, Key, MouseButton};
use tableau_engine::paint::Color;
use tableau_engine::render::ReadbackMode;
use tableau_engine::texture::TextureCache;
use tableau_engine::window::{CursorIcon, RuntimeCtx};
use tableau_scene::gpu::{GpuPickSurface, SceneRenderer};
use tableau_scene::scene::PointerSample;
use tableau_scene::{CursorHint, Scene, SceneConfig, SceneDefinition, SceneEvent};

/// Hosts one scene in the window and plays the part of the surrounding UI:
/// clicking an item opens a "modal" that blurs everything else until Escape.
pub struct ViewerApp {
    title: String,
    definition: SceneDefinition,
    config: SceneConfig,
    textures: TextureCache,
    readback: ReadbackMode,

    scene: Option<Scene<GpuPickSurface>>,
    renderer: SceneRenderer,
    viewport: Viewport,

    /// Item whose modal is open.
    focused: Option<String>,
    /// Layer texture hidden with `H`.
    hidden: Option<String>,
    zoomed: bool,
    show_description: bool,
    cursor: CursorHint,
}

impl ViewerApp {
    pub fn new(
        title: String,
        definition: SceneDefinition,
        config: SceneConfig,
        textures: TextureCache,
        readback: ReadbackMode,
    ) -> Self {
        Self {
            title,
            definition,
            config,
            textures,
            readback,
            scene: None,
            renderer: SceneRenderer::new(),
            viewport: Viewport::new(1.0, 1.0),
            focused: None,
            hidden: None,
            zoomed: false,
            show_description: true,
            cursor: CursorHint::Default,
        }
    }

    /// The pick surface needs the device, which only exists once the first
    /// frame runs.
    fn ensure_scene(&mut self, ctx: &FrameCtx<'_, '_>) -> bool {
        if self.scene.is_some() {
            return true;
        }

        let surface = GpuPickSurface::new(ctx.gpu.device(), ctx.gpu.queue(), self.readback);
        let mut scene = Scene::new(self.config.clone(), surface);
        scene.resize(self.viewport, canvas_rect(self.viewport));
        if let Err(e) = scene.set_scene_data(&self.definition, &self.textures) {
            log::error!("scene rejected: {e}");
            return false;
        }

        log::info!(
            "scene ready on {}: {} layers, {} items",
            ctx.gpu.adapter_info().name,
            scene.layers().len(),
            scene.registry().len()
        );
        self.scene = Some(scene);
        true
    }

    fn handle_input(&mut self, ctx: &FrameCtx<'_, '_>) -> AppControl {
        let now = ctx.time.now;
        let Some(scene) = self.scene.as_mut() else { return AppControl::Continue };

        for ev in &ctx.input_frame.events {
            match ev {
                InputEvent::PointerMoved(m) => scene.on_pointer_move(Vec2::new(m.x, m.y)),
                InputEvent::PointerLeft => scene.on_pointer_leave(),
                _ => {}
            }
        }
        for click in ctx.input_frame.releases(MouseButton::Left) {
            scene.on_pointer_click(Vec2::new(click.x, click.y), now);
        }

        let pressed = |key: Key| ctx.input_frame.keys_pressed.contains(&key);

        if pressed(Key::Escape) {
            if self.focused.take().is_none() {
                return AppControl::Exit;
            }
            scene.toggle_blur(false, now);
            scene.include_item();
            scene.set_clickable(true);
        }
        if pressed(Key::ArrowLeft) {
            scene.shift_image(true, now);
        }
        if pressed(Key::ArrowRight) {
            scene.shift_image(false, now);
        }
        if pressed(Key::Z) {
            self.zoomed = !self.zoomed;
            if self.zoomed {
                let focus = zoom_focus(scene.pointer());
                scene.zoom_in(focus, now);
            } else {
                scene.reset_zoom(now);
            }
        }
        if pressed(Key::D) {
            self.show_description = !self.show_description;
            scene.set_show_hover_description(self.show_description);
        }
        if pressed(Key::B) {
            let mut settings = scene.settings();
            settings.blur_enabled = !settings.blur_enabled;
            scene.update_settings(settings, now);
            log::info!("blur {}", if settings.blur_enabled { "on" } else { "off" });
        }
        if pressed(Key::S) {
            let mut settings = scene.settings();
            settings.scene_shift_enabled = !settings.scene_shift_enabled;
            scene.update_settings(settings, now);
            log::info!("scene shift {}", if settings.scene_shift_enabled { "on" } else { "off" });
        }
        if pressed(Key::H) {
            toggle_hidden(scene, &mut self.hidden, now);
        }

        AppControl::Continue
    }

    fn dispatch_events(&mut self, runtime: &mut RuntimeCtx, now: Instant) {
        let Some(scene) = self.scene.as_mut() else { return };

        for ev in scene.drain_events() {
            match &ev {
                SceneEvent::TextureShift { .. } => log::trace!("{}: {ev:?}", ev.name()),
                _ => log::info!("{}: {ev:?}", ev.name()),
            }

            if let SceneEvent::HoverItem(item) = &ev {
                runtime.set_title(match item {
                    Some(name) => format!("{} · {name}", self.title),
                    None => self.title.clone(),
                });
            }
            if let SceneEvent::SceneClick(Some(name)) = ev {
                scene.exclude_item(&name);
                scene.toggle_blur(true, now);
                scene.set_clickable(false);
                self.focused = Some(name);
            }
        }
    }
}

/// Hides the topmost non-opaque layer, or shows the one hidden last.
fn toggle_hidden(scene: &mut Scene<GpuPickSurface>, hidden: &mut Option<String>, now: Instant) {
    if let Some(name) = hidden.take() {
        scene.show_item(&name, false, now);
        return;
    }
    let Some(name) = scene
        .layers()
        .iter()
        .rev()
        .find(|l| !l.is_opaque())
        .map(|l| l.name().to_string())
    else {
        return;
    };
    if scene.hide_item(&name, false, now) {
        *hidden = Some(name);
    }
}

/// Zoom toward the pointer, or the middle when it is outside the window.
fn zoom_focus(pointer: Option<PointerSample>) -> Vec2 {
    pointer.map_or(Vec2::splat(0.5), |p| p.canvas_fraction())
}

fn canvas_rect(viewport: Viewport) -> Rect {
    Rect::new(0.0, 0.0, viewport.width, viewport.height)
}

impl App for ViewerApp {
    fn on_resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Some(scene) = self.scene.as_mut() {
            scene.resize(viewport, canvas_rect(viewport));
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if !self.ensure_scene(ctx) {
            return AppControl::Exit;
        }
        if self.handle_input(ctx) == AppControl::Exit {
            return AppControl::Exit;
        }

        self.textures.upload_pending(ctx.gpu.device(), ctx.gpu.queue());

        let time = ctx.time;
        let Some(scene) = self.scene.as_mut() else { return AppControl::Continue };
        scene.render(&self.textures, &time, true);

        let hint = scene.cursor_hint();
        if hint != self.cursor {
            self.cursor = hint;
            ctx.window.set_cursor(match hint {
                CursorHint::Default => CursorIcon::Default,
                CursorHint::Pointer => CursorIcon::Pointer,
            });
        }

        let frame = scene.frame_view(time.elapsed);
        self.dispatch_events(ctx.runtime, time.now);

        let renderer = &mut self.renderer;
        let textures = &self.textures;
        ctx.render(Color::from_straight(0.0, 0.0, 0.0, 1.0), |rctx, target| {
            renderer.render(rctx, target, textures, &frame);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tableau_scene::scene::map_pointer;

    #[test]
    fn zoom_focus_follows_pointer() {
        let viewport = Viewport::new(1600.0, 900.0);
        let sample = map_pointer(canvas_rect(viewport), Vec2::new(400.0, 225.0), (1024, 576), 1.0, Vec2::zero());
        assert!(zoom_focus(Some(sample)).max_abs_diff(Vec2::new(0.25, 0.25)) < 1e-6);
        assert_eq!(zoom_focus(None), Vec2::splat(0.5));
    }
}
