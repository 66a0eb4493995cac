//! wgpu rasterizer for the forest [`RenderGraph`].
//!
//! Per frame: key-light shadow map, instanced scene into an HDR target with
//! depth, then bright-pass, light shafts, bloom blur and the composite onto
//! the swapchain. Both hosts drive the same `Renderer`; only the surface
//! target differs.

mod helpers;
mod meshes;
mod post;
mod targets;
pub mod uniforms;

use forest_core::RenderGraph;
use meshes::{InstanceBuffers, MeshCache};
use post::{PostBindGroups, PostResources};
use targets::RenderTargets;
use uniforms::{PostUniforms, SceneUniforms};

pub static SCENE_WGSL: &str = include_str!("../shaders/scene.wgsl");
pub static POST_WGSL: &str = include_str!("../shaders/post.wgsl");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PassKind {
    Opaque,
    Translucent,
    Additive,
}

struct DrawItem {
    label: &'static str,
    mesh: u64,
    kind: PassKind,
    casts_shadow: bool,
}

struct ScenePipelines {
    opaque: wgpu::RenderPipeline,
    translucent: wgpu::RenderPipeline,
    additive: wgpu::RenderPipeline,
    shadow: wgpu::RenderPipeline,
}

const ADDITIVE_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

fn make_scene_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    blend: wgpu::BlendState,
    depth_write: bool,
) -> wgpu::RenderPipeline {
    let buffers = meshes::vertex_layouts();
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        // planes, discs and fronds are seen from both sides
        primitive: wgpu::PrimitiveState {
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: helpers::DEPTH_FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: helpers::HDR_FORMAT,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        cache: None,
        multiview: None,
    })
}

fn make_shadow_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    let buffers = meshes::vertex_layouts();
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("shadow_pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_shadow"),
            buffers: &buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: helpers::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: None,
        cache: None,
        multiview: None,
    })
}

pub struct Renderer<'a> {
    surface: wgpu::Surface<'a>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    scene_uniform_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    shadow_bind_group: wgpu::BindGroup,
    _shadow_tex: wgpu::Texture,
    shadow_view: wgpu::TextureView,
    pipelines: ScenePipelines,
    meshes: MeshCache,
    instances: InstanceBuffers,
    draws: Vec<DrawItem>,

    targets: RenderTargets,
    linear_sampler: wgpu::Sampler,
    post: PostResources,
    post_groups: PostBindGroups,

    width: u32,
    height: u32,
}

impl<'a> Renderer<'a> {
    /// `target` is a canvas on the web and a window on desktop.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'a>>,
        width: u32,
        height: u32,
        shadow_map_size: u32,
    ) -> anyhow::Result<Self> {
        let width = width.max(1);
        let height = height.max(1);
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(target)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No WebGPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    // Use default limits on web to avoid passing unknown fields to older WebGPU impls
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!(format!("request_device error: {:?}", e)))?;
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8UnormSrgb | wgpu::TextureFormat::Rgba8UnormSrgb
                )
            })
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("surface {}x{} {:?}", width, height, format);

        let targets = RenderTargets::new(&device, width, height);

        // Scene: uniforms in group 0, key-light shadow map in group 1
        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_WGSL.into()),
        });
        let scene_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bgl"),
            entries: &[helpers::uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });
        let shadow_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_bgl"),
            entries: &[
                helpers::texture_entry(0, wgpu::TextureSampleType::Depth),
                helpers::sampler_entry(1, wgpu::SamplerBindingType::Comparison),
            ],
        });
        let scene_uniform_buffer = helpers::uniform_buffer::<SceneUniforms>(&device, "scene_uniforms");
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bg"),
            layout: &scene_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_uniform_buffer.as_entire_binding(),
            }],
        });
        let shadow_size = shadow_map_size.clamp(256, device.limits().max_texture_dimension_2d);
        let (shadow_tex, shadow_view) =
            helpers::create_depth_texture(&device, "shadow_map", shadow_size, shadow_size);
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_bg"),
            layout: &shadow_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&shadow_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shadow_sampler),
                },
            ],
        });
        let scene_pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pl"),
            bind_group_layouts: &[&scene_bgl, &shadow_bgl],
            push_constant_ranges: &[],
        });
        let shadow_pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow_pl"),
            bind_group_layouts: &[&scene_bgl],
            push_constant_ranges: &[],
        });
        let pipelines = ScenePipelines {
            opaque: make_scene_pipeline(
                &device,
                "scene_opaque",
                &scene_pl,
                &scene_shader,
                wgpu::BlendState::ALPHA_BLENDING,
                true,
            ),
            translucent: make_scene_pipeline(
                &device,
                "scene_translucent",
                &scene_pl,
                &scene_shader,
                wgpu::BlendState::ALPHA_BLENDING,
                false,
            ),
            additive: make_scene_pipeline(&device, "scene_additive", &scene_pl, &scene_shader, ADDITIVE_BLEND, false),
            shadow: make_shadow_pipeline(&device, &shadow_pl, &scene_shader),
        };

        // Post shader + pipelines
        let post_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post_shader"),
            source: wgpu::ShaderSource::Wgsl(POST_WGSL.into()),
        });
        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("linear_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let post = post::create_post_resources(&device, &post_shader, format);
        let post_groups = PostBindGroups::new(&device, &post, &targets, &linear_sampler);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            scene_uniform_buffer,
            scene_bind_group,
            shadow_bind_group,
            _shadow_tex: shadow_tex,
            shadow_view,
            pipelines,
            meshes: MeshCache::default(),
            instances: InstanceBuffers::default(),
            draws: Vec::new(),
            targets,
            linear_sampler,
            post,
            post_groups,
            width,
            height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn resize_if_needed(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.targets.recreate(&self.device, width, height);
            self.post_groups = PostBindGroups::new(&self.device, &self.post, &self.targets, &self.linear_sampler);
        }
    }

    /// Reconfigure after `SurfaceError::Lost`.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Upload meshes and instance data, and sort batches into passes.
    fn prepare(&mut self, graph: &RenderGraph<'_>) {
        self.draws.clear();
        for batch in graph.batches {
            let mesh = self.meshes.ensure(&self.device, &batch.shape);
            self.instances
                .write(&self.device, &self.queue, batch.label, &batch.instances);
            let kind = if batch.material.additive {
                PassKind::Additive
            } else if batch.material.opacity < 1.0 {
                PassKind::Translucent
            } else {
                PassKind::Opaque
            };
            self.draws.push(DrawItem {
                label: batch.label,
                mesh,
                kind,
                casts_shadow: kind == PassKind::Opaque && !batch.material.unlit,
            });
        }
        // stable: batches keep their scene order within a pass
        self.draws.sort_by_key(|d| d.kind as u8);
    }

    fn draw_items<'p>(&self, pass: &mut wgpu::RenderPass<'p>, filter: impl Fn(&DrawItem) -> bool) {
        for item in self.draws.iter().filter(|d| filter(d)) {
            let (Some(mesh), Some(inst)) = (self.meshes.get(item.mesh), self.instances.get(item.label)) else {
                continue;
            };
            if inst.count == 0 {
                continue;
            }
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_vertex_buffer(1, inst.buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..inst.count);
        }
    }

    pub fn render(&mut self, graph: &RenderGraph<'_>) -> Result<(), wgpu::SurfaceError> {
        self.prepare(graph);

        let scene_u = SceneUniforms::from_graph(graph);
        self.queue
            .write_buffer(&self.scene_uniform_buffer, 0, bytemuck::bytes_of(&scene_u));
        let full = PostUniforms::from_graph(graph, (self.width, self.height));
        let half = full.at_size(self.targets.bloom_size());
        self.queue
            .write_buffer(&self.post.bright_ub, 0, bytemuck::bytes_of(&half));
        self.queue
            .write_buffer(&self.post.shafts_ub, 0, bytemuck::bytes_of(&half));
        self.queue.write_buffer(
            &self.post.blur_h_ub,
            0,
            bytemuck::bytes_of(&half.with_blur_dir([1.0, 0.0])),
        );
        self.queue.write_buffer(
            &self.post.blur_v_ub,
            0,
            bytemuck::bytes_of(&half.with_blur_dir([0.0, 1.0])),
        );
        self.queue
            .write_buffer(&self.post.composite_ub, 0, bytemuck::bytes_of(&full));

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame"),
            });

        {
            let mut shadow = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if graph.lights.key.casts_shadow {
                shadow.set_pipeline(&self.pipelines.shadow);
                shadow.set_bind_group(0, &self.scene_bind_group, &[]);
                self.draw_items(&mut shadow, |d| d.casts_shadow);
            }
        }

        {
            let bg = graph.lights.background;
            let [r, g, b] = bg.map(|c| forest_core::material::srgb_to_linear(c) as f64);
            let mut scene = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.hdr_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            scene.set_bind_group(0, &self.scene_bind_group, &[]);
            scene.set_bind_group(1, &self.shadow_bind_group, &[]);
            for (kind, pipeline) in [
                (PassKind::Opaque, &self.pipelines.opaque),
                (PassKind::Translucent, &self.pipelines.translucent),
                (PassKind::Additive, &self.pipelines.additive),
            ] {
                scene.set_pipeline(pipeline);
                self.draw_items(&mut scene, |d| d.kind == kind);
            }
        }

        let black = wgpu::Color::BLACK;
        let g = &self.post_groups;
        post::blit(&mut encoder, "bright", &self.targets.bloom_a_view, black, &self.post.bright_pipeline, &[&g.bright]);
        post::blit(&mut encoder, "shafts", &self.targets.shafts_view, black, &self.post.shafts_pipeline, &[&g.shafts]);
        post::blit(&mut encoder, "blur_h", &self.targets.bloom_b_view, black, &self.post.blur_pipeline, &[&g.blur_h]);
        post::blit(&mut encoder, "blur_v", &self.targets.bloom_a_view, black, &self.post.blur_pipeline, &[&g.blur_v]);
        post::blit(
            &mut encoder,
            "composite",
            &view,
            black,
            &self.post.composite_pipeline,
            &[&g.composite, &g.bloom_only, &g.shafts_depth],
        );

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Distinct meshes uploaded so far.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}
