use tableau_engine::coords::Vec2;
use tableau_engine::render::quad::QuadBuffers;
use tableau_engine::render::{RenderCtx, RenderTarget, RenderTexture, ShaderCache};
use tableau_engine::texture::TextureCache;

use crate::pick::MASK_ALPHA_THRESHOLD;
use crate::quad::QuadUniforms;
use crate::scene::SceneFrame;

use super::programs::{CompositeProgram, QuadDraw, QuadProgram, register_programs};
use super::{PICK_FORMAT, SCENE_FORMAT};

/// Draws a [`SceneFrame`] to the window surface.
///
/// Layers are drawn back to front into an offscreen color target and item
/// masks into a mask target of the same size; the composite pass then
/// applies zoom, blur, darkening, exclusion and highlight on the way to the
/// surface. GPU resources are created lazily and rebuilt when the surface
/// format or target size changes.
#[derive(Default)]
pub struct SceneRenderer {
    shaders: Option<ShaderCache>,
    quad: Option<QuadBuffers>,

    layer_program: Option<QuadProgram>,
    mask_program: Option<QuadProgram>,
    composite: Option<CompositeProgram>,

    scene_target: Option<RenderTexture>,
    mask_target: Option<RenderTexture>,

    warned_program: bool,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        textures: &TextureCache,
        frame: &SceneFrame,
    ) {
        self.ensure_programs(ctx);
        self.ensure_targets(ctx, frame.target);

        let Some(quad) = self.quad.as_ref() else { return };
        let Some(layer_program) = self.layer_program.as_mut() else { return };
        let Some(mask_program) = self.mask_program.as_mut() else { return };
        let Some(composite) = self.composite.as_ref() else { return };
        let Some(scene_target) = self.scene_target.as_ref() else { return };
        let Some(mask_target) = self.mask_target.as_ref() else { return };

        let texel = Vec2::new(1.0 / frame.target.0 as f32, 1.0 / frame.target.1 as f32);
        let layer_draws: Vec<QuadDraw<'_>> = frame
            .layers
            .iter()
            .filter(|layer| layer.opacity > 0.0)
            .filter_map(|layer| {
                let gpu = textures.gpu(layer.texture?)?;
                Some(QuadDraw {
                    uniforms: QuadUniforms::for_layer(layer, texel),
                    view: &gpu.view,
                })
            })
            .collect();
        let mask_draws: Vec<QuadDraw<'_>> = frame
            .masks
            .iter()
            .filter_map(|mask| {
                let gpu = textures.gpu(mask.texture?)?;
                Some(QuadDraw {
                    uniforms: QuadUniforms::for_mask(mask.transform, mask.key.to_unit(), MASK_ALPHA_THRESHOLD),
                    view: &gpu.view,
                })
            })
            .collect();

        layer_program.draw(
            ctx.device,
            ctx.queue,
            target.encoder,
            scene_target.view(),
            Some(wgpu::Color::TRANSPARENT),
            quad,
            &layer_draws,
        );
        mask_program.draw(
            ctx.device,
            ctx.queue,
            target.encoder,
            mask_target.view(),
            Some(wgpu::Color::TRANSPARENT),
            quad,
            &mask_draws,
        );
        composite.draw(
            ctx.device,
            ctx.queue,
            target.encoder,
            target.color_view,
            quad,
            scene_target.view(),
            mask_target.view(),
            &frame.params,
        );
    }

    fn ensure_programs(&mut self, ctx: &RenderCtx<'_>) {
        let ready = self.layer_program.is_some()
            && self.mask_program.is_some()
            && self
                .composite
                .as_ref()
                .is_some_and(|c| c.format() == ctx.surface_format);
        if ready {
            return;
        }

        let shaders = self.shaders.get_or_insert_with(|| {
            let mut cache = ShaderCache::new();
            register_programs(&mut cache);
            cache
        });
        if self.quad.is_none() {
            self.quad = Some(QuadBuffers::new(ctx.device, "tableau scene"));
        }

        let built = QuadProgram::layer(ctx.device, shaders, SCENE_FORMAT).and_then(|layer| {
            let mask = QuadProgram::mask(ctx.device, shaders, PICK_FORMAT)?;
            let composite = CompositeProgram::new(ctx.device, shaders, ctx.surface_format)?;
            Ok((layer, mask, composite))
        });
        match built {
            Ok((layer, mask, composite)) => {
                self.layer_program = Some(layer);
                self.mask_program = Some(mask);
                self.composite = Some(composite);
                log::debug!("scene renderer ready for {:?}", ctx.surface_format);
            }
            Err(e) => {
                if !self.warned_program {
                    log::warn!("scene renderer disabled: {e}");
                    self.warned_program = true;
                }
            }
        }
    }

    fn ensure_targets(&mut self, ctx: &RenderCtx<'_>, (width, height): (u32, u32)) {
        let matches = |t: &Option<RenderTexture>| t.as_ref().is_some_and(|t| t.size() == (width.max(1), height.max(1)));
        if matches(&self.scene_target) && matches(&self.mask_target) {
            return;
        }
        self.scene_target = Some(RenderTexture::new(
            ctx.device,
            "tableau scene target",
            width,
            height,
            SCENE_FORMAT,
        ));
        self.mask_target = Some(RenderTexture::new(
            ctx.device,
            "tableau display mask target",
            width,
            height,
            PICK_FORMAT,
        ));
    }

    /// Drops the offscreen targets; they are re-created on the next frame.
    pub fn release(&mut self) {
        self.scene_target = None;
        self.mask_target = None;
    }
}
