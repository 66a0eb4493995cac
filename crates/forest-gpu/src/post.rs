//! Fullscreen passes after the scene: bright-pass, light shafts, separable
//! bloom blur, and the composite that applies depth of field, ACES, grain and
//! vignette on the way to the swapchain.

use super::helpers::{self, HDR_FORMAT};
use super::targets::RenderTargets;
use super::uniforms::PostUniforms;
use wgpu;

pub(crate) struct PostResources {
    pub(crate) bgl0: wgpu::BindGroupLayout, // tex+sampler+uniform
    pub(crate) bgl1: wgpu::BindGroupLayout, // tex+sampler
    pub(crate) bgl2: wgpu::BindGroupLayout, // shafts tex + scene depth
    pub(crate) bright_ub: wgpu::Buffer,
    pub(crate) shafts_ub: wgpu::Buffer,
    pub(crate) blur_h_ub: wgpu::Buffer,
    pub(crate) blur_v_ub: wgpu::Buffer,
    pub(crate) composite_ub: wgpu::Buffer,
    pub(crate) bright_pipeline: wgpu::RenderPipeline,
    pub(crate) shafts_pipeline: wgpu::RenderPipeline,
    pub(crate) blur_pipeline: wgpu::RenderPipeline,
    pub(crate) composite_pipeline: wgpu::RenderPipeline,
}

pub(crate) fn create_post_resources(
    device: &wgpu::Device,
    post_shader: &wgpu::ShaderModule,
    swap_format: wgpu::TextureFormat,
) -> PostResources {
    let float = wgpu::TextureSampleType::Float { filterable: true };
    let bgl0 = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("post_bgl0"),
        entries: &[
            helpers::texture_entry(0, float),
            helpers::sampler_entry(1, wgpu::SamplerBindingType::Filtering),
            helpers::uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
        ],
    });
    let bgl1 = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("post_bgl1"),
        entries: &[
            helpers::texture_entry(0, float),
            helpers::sampler_entry(1, wgpu::SamplerBindingType::Filtering),
        ],
    });
    let bgl2 = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("post_bgl2"),
        entries: &[
            helpers::texture_entry(0, float),
            helpers::texture_entry(1, wgpu::TextureSampleType::Depth),
        ],
    });
    let pl_single = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pl_post_0"),
        bind_group_layouts: &[&bgl0],
        push_constant_ranges: &[],
    });
    let pl_composite = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pl_post_comp"),
        bind_group_layouts: &[&bgl0, &bgl1, &bgl2],
        push_constant_ranges: &[],
    });
    let single = |label: &str, entry: &str| {
        helpers::make_post_pipeline(device, label, &pl_single, post_shader, entry, HDR_FORMAT, None)
    };

    PostResources {
        bright_ub: helpers::uniform_buffer::<PostUniforms>(device, "post_bright_uniforms"),
        shafts_ub: helpers::uniform_buffer::<PostUniforms>(device, "post_shafts_uniforms"),
        blur_h_ub: helpers::uniform_buffer::<PostUniforms>(device, "post_blur_h_uniforms"),
        blur_v_ub: helpers::uniform_buffer::<PostUniforms>(device, "post_blur_v_uniforms"),
        composite_ub: helpers::uniform_buffer::<PostUniforms>(device, "post_composite_uniforms"),
        bright_pipeline: single("bright_pipeline", "fs_bright"),
        shafts_pipeline: single("shafts_pipeline", "fs_shafts"),
        blur_pipeline: single("blur_pipeline", "fs_blur"),
        composite_pipeline: helpers::make_post_pipeline(
            device,
            "composite_pipeline",
            &pl_composite,
            post_shader,
            "fs_composite",
            swap_format,
            Some(wgpu::BlendState::REPLACE),
        ),
        bgl0,
        bgl1,
        bgl2,
    }
}

/// Bind groups that reference the size-dependent targets.
pub(crate) struct PostBindGroups {
    pub(crate) bright: wgpu::BindGroup,
    pub(crate) shafts: wgpu::BindGroup,
    pub(crate) blur_h: wgpu::BindGroup,
    pub(crate) blur_v: wgpu::BindGroup,
    pub(crate) composite: wgpu::BindGroup,
    pub(crate) bloom_only: wgpu::BindGroup,
    pub(crate) shafts_depth: wgpu::BindGroup,
}

impl PostBindGroups {
    pub(crate) fn new(
        device: &wgpu::Device,
        post: &PostResources,
        targets: &RenderTargets,
        sampler: &wgpu::Sampler,
    ) -> Self {
        let source = |label: &str, view: &wgpu::TextureView, ub: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &post.bgl0,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: ub.as_entire_binding(),
                    },
                ],
            })
        };
        Self {
            bright: source("bg_bright", &targets.hdr_view, &post.bright_ub),
            // shafts radiate from the bright-pass, not the raw scene
            shafts: source("bg_shafts", &targets.bloom_a_view, &post.shafts_ub),
            blur_h: source("bg_blur_h", &targets.bloom_a_view, &post.blur_h_ub),
            blur_v: source("bg_blur_v", &targets.bloom_b_view, &post.blur_v_ub),
            composite: source("bg_composite", &targets.hdr_view, &post.composite_ub),
            bloom_only: device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("bg_bloom_a_only"),
                layout: &post.bgl1,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&targets.bloom_a_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            }),
            shafts_depth: device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("bg_shafts_depth"),
                layout: &post.bgl2,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&targets.shafts_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&targets.depth_view),
                    },
                ],
            }),
        }
    }
}

pub(crate) fn blit(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    clear: wgpu::Color,
    pipeline: &wgpu::RenderPipeline,
    groups: &[&wgpu::BindGroup],
) {
    let mut r = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    r.set_pipeline(pipeline);
    for (i, group) in groups.iter().enumerate() {
        r.set_bind_group(i as u32, *group, &[]);
    }
    r.draw(0..3, 0..1);
}
