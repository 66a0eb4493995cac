use super::helpers::{self, HDR_FORMAT};
use wgpu;

/// Offscreen targets sized to the surface.
///
/// - `hdr_*` hold the lit scene in Rgba16Float, before tonemapping.
/// - `depth_*` is the scene depth, read again by the depth-of-field pass.
/// - `bloom_*` are half-res ping-pong buffers for bright-pass and blur.
/// - `shafts_*` is the half-res radial light-shaft accumulation.
pub(crate) struct RenderTargets {
    pub(crate) hdr_tex: wgpu::Texture,
    pub(crate) hdr_view: wgpu::TextureView,
    #[allow(dead_code)]
    pub(crate) depth_tex: wgpu::Texture,
    pub(crate) depth_view: wgpu::TextureView,
    pub(crate) bloom_a: wgpu::Texture,
    pub(crate) bloom_a_view: wgpu::TextureView,
    pub(crate) bloom_b: wgpu::Texture,
    pub(crate) bloom_b_view: wgpu::TextureView,
    #[allow(dead_code)]
    pub(crate) shafts: wgpu::Texture,
    pub(crate) shafts_view: wgpu::TextureView,
}

const OFFSCREEN_USAGE: wgpu::TextureUsages =
    wgpu::TextureUsages::RENDER_ATTACHMENT.union(wgpu::TextureUsages::TEXTURE_BINDING);

impl RenderTargets {
    pub(crate) fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (hdr_tex, hdr_view) =
            helpers::create_color_texture(device, "hdr_tex", width, height, HDR_FORMAT, OFFSCREEN_USAGE);
        let (depth_tex, depth_view) = helpers::create_depth_texture(device, "scene_depth", width, height);
        let (bw, bh) = half(width, height);
        let (bloom_a, bloom_a_view) =
            helpers::create_color_texture(device, "bloom_a", bw, bh, HDR_FORMAT, OFFSCREEN_USAGE);
        let (bloom_b, bloom_b_view) =
            helpers::create_color_texture(device, "bloom_b", bw, bh, HDR_FORMAT, OFFSCREEN_USAGE);
        let (shafts, shafts_view) =
            helpers::create_color_texture(device, "shafts", bw, bh, HDR_FORMAT, OFFSCREEN_USAGE);
        Self {
            hdr_tex,
            hdr_view,
            depth_tex,
            depth_view,
            bloom_a,
            bloom_a_view,
            bloom_b,
            bloom_b_view,
            shafts,
            shafts_view,
        }
    }

    pub(crate) fn recreate(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        *self = Self::new(device, width, height);
        log::debug!(
            "render targets {}x{} (half {}x{})",
            self.hdr_tex.width(),
            self.hdr_tex.height(),
            self.bloom_a.width(),
            self.bloom_a.height()
        );
    }

    pub(crate) fn bloom_size(&self) -> (u32, u32) {
        (self.bloom_b.width(), self.bloom_b.height())
    }
}

fn half(width: u32, height: u32) -> (u32, u32) {
    ((width.max(1) / 2).max(1), (height.max(1) / 2).max(1))
}
