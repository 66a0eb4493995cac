//! CPU-side uniform blocks. Everything is packed as `vec4`s so the WGSL
//! layout needs no implicit padding.

use forest_core::lighting::{LightRig, SpotLight};
use forest_core::material::srgb_to_linear;
use forest_core::{PostChain, PostStage, RenderGraph, ShaftAnchor};
use glam::{Mat4, Vec3};

const SHADOW_NEAR: f32 = 0.5;

fn linear(c: [f32; 3], scale: f32) -> [f32; 3] {
    c.map(|v| srgb_to_linear(v) * scale)
}

fn pack(v: [f32; 3], w: f32) -> [f32; 4] {
    [v[0], v[1], v[2], w]
}

/// Perspective frustum of the key spot light, used for its shadow map.
pub fn key_light_view_projection(key: &SpotLight) -> Mat4 {
    let proj = Mat4::perspective_rh(2.0 * key.angle, 1.0, SHADOW_NEAR, key.distance.max(SHADOW_NEAR + 1.0));
    let view = Mat4::look_at_rh(key.position, key.target, Vec3::Y);
    proj * view
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    /// camera position, elapsed seconds
    pub eye: [f32; 4],
    pub ambient: [f32; 4],
    /// position, cosine of the outer cone
    pub key_position: [f32; 4],
    /// unit direction, cosine of the inner cone
    pub key_direction: [f32; 4],
    /// color × intensity, cutoff distance
    pub key_color: [f32; 4],
    /// unit direction toward the light
    pub fill_direction: [f32; 4],
    pub fill_color: [f32; 4],
    pub sky: [f32; 4],
    pub ground: [f32; 4],
    /// color, near
    pub fog: [f32; 4],
    /// far, shadow map texel size, shadows enabled, unused
    pub fog_far: [f32; 4],
}

impl SceneUniforms {
    pub fn from_lights(view_proj: Mat4, eye: Vec3, elapsed: f32, rig: &LightRig) -> Self {
        let key = &rig.key;
        let key_dir = (key.target - key.position).normalize_or_zero();
        let fill_dir = (rig.fill.position - rig.fill.target).normalize_or_zero();
        let (sky, ground) = rig.environment_tint();
        let shadow_texel = 1.0 / key.shadow_map_size.max(1) as f32;
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_view_proj: key_light_view_projection(key).to_cols_array_2d(),
            eye: pack(eye.to_array(), elapsed),
            ambient: pack(linear(rig.ambient.color, rig.ambient.intensity), 0.0),
            key_position: pack(key.position.to_array(), key.angle.cos()),
            key_direction: pack(key_dir.to_array(), (key.angle * (1.0 - key.penumbra)).cos()),
            key_color: pack(linear(key.color, key.intensity), key.distance),
            fill_direction: pack(fill_dir.to_array(), 0.0),
            fill_color: pack(linear(rig.fill.color, rig.fill.intensity), 0.0),
            sky: pack(sky, rig.environment_yaw),
            ground: pack(ground, 0.0),
            fog: pack(linear(rig.fog.color, 1.0), rig.fog.near),
            fog_far: [
                rig.fog.far,
                shadow_texel,
                if key.casts_shadow { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }

    pub fn from_graph(graph: &RenderGraph<'_>) -> Self {
        Self::from_lights(
            graph.camera.view_projection(),
            graph.camera.eye,
            graph.elapsed,
            graph.lights,
        )
    }
}

/// Shared by every post pass; each pass owns its own buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PostUniforms {
    /// width, height, time, shaft samples
    pub frame: [f32; 4],
    /// blur direction, bloom threshold, bloom smoothing
    pub blur: [f32; 4],
    /// anchor uv, visibility, density
    pub shaft: [f32; 4],
    /// decay, weight, exposure, clamp
    pub shaft_tail: [f32; 4],
    /// bloom intensity, focus distance, focal length, bokeh scale
    pub lens: [f32; 4],
    /// grain opacity, grain premultiply, vignette offset, vignette darkness
    pub screen: [f32; 4],
    /// near, far, dof reference height, shaft blur flag
    pub clip: [f32; 4],
}

impl PostUniforms {
    /// Flatten the chain parameters. Stages missing from the chain are
    /// neutralised rather than skipped, so the pass graph stays fixed.
    pub fn from_chain(
        chain: &PostChain,
        anchor: ShaftAnchor,
        size: (u32, u32),
        time: f32,
        clip: (f32, f32),
    ) -> Self {
        let mut u = Self {
            frame: [size.0 as f32, size.1 as f32, time, 0.0],
            shaft: [anchor.uv.x, anchor.uv.y, 0.0, 0.0],
            clip: [clip.0, clip.1, size.1 as f32, 0.0],
            // unreachable threshold
            blur: [0.0, 0.0, 1e9, 0.0],
            ..Default::default()
        };
        for stage in chain.stages() {
            match *stage {
                PostStage::LightShafts {
                    samples,
                    density,
                    decay,
                    weight,
                    exposure,
                    clamp_max,
                    blur,
                } => {
                    u.frame[3] = samples as f32;
                    u.shaft[2] = anchor.visibility;
                    u.shaft[3] = density;
                    u.shaft_tail = [decay, weight, exposure, clamp_max];
                    u.clip[3] = if blur { 1.0 } else { 0.0 };
                }
                PostStage::Bloom {
                    threshold,
                    smoothing,
                    intensity,
                } => {
                    u.blur[2] = threshold;
                    u.blur[3] = smoothing;
                    u.lens[0] = intensity;
                }
                PostStage::DepthOfField {
                    focus_distance,
                    focal_length,
                    bokeh_scale,
                    resolution_height,
                } => {
                    u.lens[1] = focus_distance;
                    u.lens[2] = focal_length;
                    u.lens[3] = bokeh_scale;
                    u.clip[2] = resolution_height as f32;
                }
                PostStage::Grain {
                    opacity,
                    premultiply,
                    ..
                } => {
                    u.screen[0] = opacity;
                    u.screen[1] = if premultiply { 1.0 } else { 0.0 };
                }
                PostStage::Vignette { offset, darkness } => {
                    u.screen[2] = offset;
                    u.screen[3] = darkness;
                }
            }
        }
        u
    }

    pub fn from_graph(graph: &RenderGraph<'_>, size: (u32, u32)) -> Self {
        Self::from_chain(
            graph.post,
            graph.shaft_anchor,
            size,
            graph.elapsed,
            (graph.camera.znear, graph.camera.zfar),
        )
    }

    pub fn with_blur_dir(mut self, dir: [f32; 2]) -> Self {
        self.blur[0] = dir[0];
        self.blur[1] = dir[1];
        self
    }

    /// Same parameters with the resolution of a smaller target.
    pub fn at_size(mut self, size: (u32, u32)) -> Self {
        self.frame[0] = size.0 as f32;
        self.frame[1] = size.1 as f32;
        self
    }
}
