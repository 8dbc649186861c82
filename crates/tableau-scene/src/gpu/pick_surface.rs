use tableau_engine::coords::Vec2;
use tableau_engine::render::quad::QuadBuffers;
use tableau_engine::render::{PixelReadback, ReadbackMode, RenderTexture, ShaderCache};
use tableau_engine::texture::TextureCache;

use crate::color_key::ColorKey;
use crate::pick::{MASK_ALPHA_THRESHOLD, MaskDraw, PickSurface, PixelPos};
use crate::quad::{LayerQuad, QuadUniforms};

use super::PICK_FORMAT;
use super::programs::{QuadDraw, QuadProgram, register_programs};

/// [`PickSurface`] backed by offscreen wgpu targets.
///
/// The mask target is read with the configured [`ReadbackMode`]; occlusion
/// probes always block, since a stale probe would belong to another layer.
/// Textures must already be uploaded ([`TextureCache::upload_pending`]);
/// ones without a GPU copy are skipped.
pub struct GpuPickSurface {
    device: wgpu::Device,
    queue: wgpu::Queue,
    shaders: ShaderCache,
    quad: QuadBuffers,

    mask_program: Option<QuadProgram>,
    probe_program: Option<QuadProgram>,
    mask_target: Option<RenderTexture>,
    probe_target: Option<RenderTexture>,
    mask_readback: PixelReadback,
    probe_readback: PixelReadback,

    width: u32,
    height: u32,
    warned_program: bool,
}

impl GpuPickSurface {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, mode: ReadbackMode) -> Self {
        let mut shaders = ShaderCache::new();
        register_programs(&mut shaders);

        Self {
            device: device.clone(),
            queue: queue.clone(),
            shaders,
            quad: QuadBuffers::new(device, "tableau pick"),
            mask_program: None,
            probe_program: None,
            mask_target: None,
            probe_target: None,
            mask_readback: PixelReadback::new(device, "tableau mask readback", mode),
            probe_readback: PixelReadback::new(device, "tableau probe readback", ReadbackMode::Blocking),
            width: 1,
            height: 1,
            warned_program: false,
        }
    }

    fn ensure_programs(&mut self) {
        if self.mask_program.is_some() && self.probe_program.is_some() {
            return;
        }
        let built = QuadProgram::mask(&self.device, &mut self.shaders, PICK_FORMAT).and_then(|mask| {
            let probe = QuadProgram::layer(&self.device, &mut self.shaders, PICK_FORMAT)?;
            Ok((mask, probe))
        });
        match built {
            Ok((mask, probe)) => {
                self.mask_program = Some(mask);
                self.probe_program = Some(probe);
                log::debug!("pick surface programs ready");
            }
            Err(e) => {
                if !self.warned_program {
                    log::warn!("pick surface disabled: {e}");
                    self.warned_program = true;
                }
            }
        }
    }

    fn ensure_targets(&mut self) {
        if self.mask_target.is_none() {
            self.mask_target = Some(RenderTexture::new(
                &self.device,
                "tableau mask target",
                self.width,
                self.height,
                PICK_FORMAT,
            ));
        }
        if self.probe_target.is_none() {
            self.probe_target = Some(RenderTexture::new(
                &self.device,
                "tableau probe target",
                self.width,
                self.height,
                PICK_FORMAT,
            ));
        }
    }

    fn texel_size(&self) -> Vec2 {
        Vec2::new(1.0 / self.width as f32, 1.0 / self.height as f32)
    }
}

impl PickSurface for GpuPickSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) && self.mask_target.is_some() {
            return;
        }
        self.width = width;
        self.height = height;
        self.mask_target = None;
        self.probe_target = None;
        self.ensure_targets();
    }

    fn render_masks(&mut self, textures: &TextureCache, masks: &[MaskDraw]) {
        self.ensure_programs();
        self.ensure_targets();
        let Some(program) = self.mask_program.as_mut() else { return };
        let Some(target) = self.mask_target.as_ref() else { return };

        let draws: Vec<QuadDraw<'_>> = masks
            .iter()
            .filter_map(|mask| {
                let gpu = textures.gpu(mask.texture?)?;
                Some(QuadDraw {
                    uniforms: QuadUniforms::for_mask(mask.transform, mask.key.to_unit(), MASK_ALPHA_THRESHOLD),
                    view: &gpu.view,
                })
            })
            .collect();

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tableau mask encoder"),
        });
        program.draw(
            &self.device,
            &self.queue,
            &mut encoder,
            target.view(),
            Some(wgpu::Color::TRANSPARENT),
            &self.quad,
            &draws,
        );
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn read_mask(&mut self, at: PixelPos) -> ColorKey {
        let Some(target) = self.mask_target.as_ref() else {
            return ColorKey::NONE;
        };
        let at = at.clamped(self.width, self.height);
        let texel = self
            .mask_readback
            .read(&self.device, &self.queue, target.texture(), at.x, at.y);
        ColorKey::from_texel(texel)
    }

    fn probe_alpha(&mut self, textures: &TextureCache, layer: &LayerQuad, at: PixelPos) -> f32 {
        let Some(gpu) = layer.texture.and_then(|id| textures.gpu(id)) else {
            return 0.0;
        };
        self.ensure_programs();
        self.ensure_targets();
        let texel = self.texel_size();
        let Some(program) = self.probe_program.as_mut() else { return 0.0 };
        let Some(target) = self.probe_target.as_ref() else { return 0.0 };

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tableau probe encoder"),
        });
        program.draw(
            &self.device,
            &self.queue,
            &mut encoder,
            target.view(),
            Some(wgpu::Color::TRANSPARENT),
            &self.quad,
            &[QuadDraw {
                uniforms: QuadUniforms::for_layer(layer, texel),
                view: &gpu.view,
            }],
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let at = at.clamped(self.width, self.height);
        let rgba = self
            .probe_readback
            .read(&self.device, &self.queue, target.texture(), at.x, at.y);
        rgba[3] as f32 / 255.0
    }

    fn release(&mut self) {
        self.mask_target = None;
        self.probe_target = None;
    }
}
