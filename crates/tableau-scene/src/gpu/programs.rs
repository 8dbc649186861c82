use tableau_engine::render::quad::{
    QuadBuffers, QuadVertex, premul_alpha_blend, quad_primitive, sampler_layout_entry,
    texture_layout_entry, uniform_layout_entry,
};
use tableau_engine::render::{ShaderCache, ShaderError};

use crate::compositor::CompositeParams;
use crate::quad::QuadUniforms;

pub const MASK_PROGRAM: &str = "mask";
pub const LAYER_PROGRAM: &str = "layer";
pub const COMPOSITE_PROGRAM: &str = "composite";

/// Registers every scene program with `cache`.
pub fn register_programs(cache: &mut ShaderCache) {
    cache.register(MASK_PROGRAM, include_str!("shaders/mask.wgsl"));
    cache.register(LAYER_PROGRAM, include_str!("shaders/layer.wgsl"));
    cache.register(COMPOSITE_PROGRAM, include_str!("shaders/composite.wgsl"));
}

fn sampler(device: &wgpu::Device, label: &str, filter: wgpu::FilterMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

fn pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    bgl: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} pipeline layout")),
        bind_group_layouts: &[bgl],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{label} pipeline")),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[QuadVertex::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: quad_primitive(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// One textured full-target quad per draw.
pub struct QuadDraw<'a> {
    pub uniforms: QuadUniforms,
    pub view: &'a wgpu::TextureView,
}

/// Pipeline for the "mask" and "layer" programs: uniforms, texture, sampler.
///
/// Each draw gets its own uniform buffer so several draws can share one
/// submission; buffers are kept and reused across frames.
pub struct QuadProgram {
    label: String,
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniforms: Vec<wgpu::Buffer>,
}

impl QuadProgram {
    /// Mask pass: nearest sampling, no blending.
    pub fn mask(device: &wgpu::Device, shaders: &mut ShaderCache, format: wgpu::TextureFormat) -> Result<Self, ShaderError> {
        Self::new(device, shaders, MASK_PROGRAM, format, None, wgpu::FilterMode::Nearest)
    }

    /// Layer pass: linear sampling, premultiplied blending.
    pub fn layer(device: &wgpu::Device, shaders: &mut ShaderCache, format: wgpu::TextureFormat) -> Result<Self, ShaderError> {
        Self::new(
            device,
            shaders,
            LAYER_PROGRAM,
            format,
            Some(premul_alpha_blend()),
            wgpu::FilterMode::Linear,
        )
    }

    fn new(
        device: &wgpu::Device,
        shaders: &mut ShaderCache,
        program: &str,
        format: wgpu::TextureFormat,
        blend: Option<wgpu::BlendState>,
        filter: wgpu::FilterMode,
    ) -> Result<Self, ShaderError> {
        let label = format!("tableau {program}");
        let shader = shaders.module(device, program)?;
        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} bgl")),
            entries: &[
                uniform_layout_entry::<QuadUniforms>(0),
                texture_layout_entry(1),
                sampler_layout_entry(2),
            ],
        });
        let pipeline = pipeline(device, &label, &shader, &bgl, format, blend);
        let sampler = sampler(device, &format!("{label} sampler"), filter);

        Ok(Self {
            label,
            format,
            pipeline,
            bgl,
            sampler,
            uniforms: Vec::new(),
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    fn ensure_uniforms(&mut self, device: &wgpu::Device, count: usize) {
        while self.uniforms.len() < count {
            self.uniforms.push(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{} ubo {}", self.label, self.uniforms.len())),
                size: std::mem::size_of::<QuadUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }
    }

    /// Records one pass into `view`, clearing it first when `clear` is set.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        clear: Option<wgpu::Color>,
        quad: &QuadBuffers,
        draws: &[QuadDraw<'_>],
    ) {
        self.ensure_uniforms(device, draws.len());

        let bind_groups: Vec<wgpu::BindGroup> = draws
            .iter()
            .zip(&self.uniforms)
            .map(|(draw, ubo)| {
                queue.write_buffer(ubo, 0, bytemuck::bytes_of(&draw.uniforms));
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{} bind group", self.label)),
                    layout: &self.bgl,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: ubo.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(draw.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                    ],
                })
            })
            .collect();

        let load = match clear {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&format!("{} pass", self.label)),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        quad.bind(&mut rpass);
        for bind_group in &bind_groups {
            rpass.set_bind_group(0, bind_group, &[]);
            rpass.draw_indexed(0..6, 0, 0..1);
        }
    }
}

/// Pipeline for the "composite" program.
pub struct CompositeProgram {
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    ubo: wgpu::Buffer,
}

impl CompositeProgram {
    pub fn new(device: &wgpu::Device, shaders: &mut ShaderCache, format: wgpu::TextureFormat) -> Result<Self, ShaderError> {
        let shader = shaders.module(device, COMPOSITE_PROGRAM)?;
        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tableau composite bgl"),
            entries: &[
                uniform_layout_entry::<CompositeParams>(0),
                texture_layout_entry(1),
                texture_layout_entry(2),
                sampler_layout_entry(3),
            ],
        });
        let pipeline = pipeline(device, "tableau composite", &shader, &bgl, format, None);
        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tableau composite ubo"),
            size: std::mem::size_of::<CompositeParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            format,
            pipeline,
            bgl,
            sampler: sampler(device, "tableau composite sampler", wgpu::FilterMode::Linear),
            ubo,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        quad: &QuadBuffers,
        scene: &wgpu::TextureView,
        mask: &wgpu::TextureView,
        params: &CompositeParams,
    ) {
        queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(params));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tableau composite bind group"),
            layout: &self.bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(scene),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(mask),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tableau composite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        quad.bind(&mut rpass);
        rpass.draw_indexed(0..6, 0, 0..1);
    }
}
