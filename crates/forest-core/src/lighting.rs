//! Static light rig and the fixed post-process chain.
//!
//! Nothing here changes at runtime except the per-frame light-shaft anchor,
//! which follows the sun through the moving camera.

use crate::error::ConfigError;
use crate::material::{parse_hex_color, srgb_to_linear};
use glam::{Mat4, Vec2, Vec3, Vec4};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub target: Vec3,
    pub angle: f32,
    pub penumbra: f32,
    pub intensity: f32,
    pub color: [f32; 3],
    pub distance: f32,
    pub casts_shadow: bool,
    pub shadow_map_size: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub target: Vec3,
    pub intensity: f32,
    pub color: [f32; 3],
    pub casts_shadow: bool,
}

/// Emissive sphere the light shafts radiate from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunDisc {
    pub position: Vec3,
    pub radius: f32,
    pub color: [f32; 3],
    pub opacity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightformerShape {
    Ring,
    Rect,
}

/// Emissive card seen only through environment reflections.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lightformer {
    pub form: LightformerShape,
    pub intensity: f32,
    pub color: [f32; 3],
    pub position: Vec3,
    pub scale: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactShadow {
    pub opacity: f32,
    pub scale: f32,
    pub blur: f32,
    pub far: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub color: [f32; 3],
    pub near: f32,
    pub far: f32,
}

impl Fog {
    /// Linear fog factor in `[0, 1]` at view distance `d`.
    pub fn factor(&self, d: f32) -> f32 {
        ((d - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LightRig {
    pub ambient: AmbientLight,
    pub key: SpotLight,
    pub fill: DirectionalLight,
    pub sun: SunDisc,
    pub environment: Vec<Lightformer>,
    pub environment_yaw: f32,
    pub contact_shadow: ContactShadow,
    pub fog: Fog,
    pub background: [f32; 3],
}

impl LightRig {
    pub fn forest() -> Result<Self, ConfigError> {
        Ok(Self {
            ambient: AmbientLight {
                color: parse_hex_color("#38220f")?,
                intensity: 0.22,
            },
            key: SpotLight {
                position: Vec3::new(4.0, 11.0, 6.0),
                target: Vec3::ZERO,
                angle: 0.52,
                penumbra: 0.8,
                intensity: 2.1,
                color: parse_hex_color("#f1c27d")?,
                distance: 60.0,
                casts_shadow: true,
                shadow_map_size: 2048,
            },
            fill: DirectionalLight {
                position: Vec3::new(-4.5, 6.0, -3.0),
                target: Vec3::ZERO,
                intensity: 0.6,
                color: parse_hex_color("#96663c")?,
                casts_shadow: true,
            },
            sun: SunDisc {
                position: Vec3::new(-1.8, 9.2, -5.0),
                radius: 1.4,
                color: parse_hex_color("#f8e0a3")?,
                opacity: 0.95,
            },
            environment: vec![
                Lightformer {
                    form: LightformerShape::Ring,
                    intensity: 3.0,
                    color: parse_hex_color("#f8c76c")?,
                    position: Vec3::new(0.0, 5.0, -15.0),
                    scale: Vec2::splat(20.0),
                },
                Lightformer {
                    form: LightformerShape::Rect,
                    intensity: 2.0,
                    color: parse_hex_color("#140c08")?,
                    position: Vec3::new(0.0, -5.0, 0.0),
                    scale: Vec2::new(30.0, 10.0),
                },
            ],
            environment_yaw: std::f32::consts::FRAC_PI_2,
            contact_shadow: ContactShadow {
                opacity: 0.42,
                scale: 12.0,
                blur: 2.8,
                far: 8.0,
            },
            fog: Fog {
                color: parse_hex_color(crate::constants::FOG_COLOR)?,
                near: crate::constants::FOG_RANGE.0,
                far: crate::constants::FOG_RANGE.1,
            },
            background: parse_hex_color(crate::constants::BACKGROUND_COLOR)?,
        })
    }

    /// Linear-space sky and ground colors approximating the lightformers.
    pub fn environment_tint(&self) -> ([f32; 3], [f32; 3]) {
        let mut sky = [0.0; 3];
        let mut ground = [0.0; 3];
        for lf in &self.environment {
            let target = if lf.position.y >= 0.0 { &mut sky } else { &mut ground };
            for (c, s) in target.iter_mut().zip(lf.color) {
                *c += srgb_to_linear(s) * lf.intensity;
            }
        }
        (sky, ground)
    }
}

/// Where a stage reads its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageSpace {
    /// Pre-tonemap HDR image.
    Linear,
    /// Final display-referred image.
    Screen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    Screen,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PostStage {
    LightShafts {
        samples: u32,
        density: f32,
        decay: f32,
        weight: f32,
        exposure: f32,
        clamp_max: f32,
        blur: bool,
    },
    Bloom {
        threshold: f32,
        smoothing: f32,
        intensity: f32,
    },
    DepthOfField {
        focus_distance: f32,
        focal_length: f32,
        bokeh_scale: f32,
        resolution_height: u32,
    },
    Grain {
        opacity: f32,
        blend: BlendMode,
        premultiply: bool,
    },
    Vignette {
        offset: f32,
        darkness: f32,
    },
}

impl PostStage {
    pub fn name(&self) -> &'static str {
        match self {
            PostStage::LightShafts { .. } => "light_shafts",
            PostStage::Bloom { .. } => "bloom",
            PostStage::DepthOfField { .. } => "depth_of_field",
            PostStage::Grain { .. } => "grain",
            PostStage::Vignette { .. } => "vignette",
        }
    }

    pub fn space(&self) -> StageSpace {
        match self {
            PostStage::LightShafts { .. } | PostStage::Bloom { .. } | PostStage::DepthOfField { .. } => {
                StageSpace::Linear
            }
            PostStage::Grain { .. } | PostStage::Vignette { .. } => StageSpace::Screen,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToneMapping {
    AcesFilmic,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PostChain {
    stages: Vec<PostStage>,
    pub tone_mapping: ToneMapping,
}

impl PostChain {
    /// The order is fixed: shafts, bloom, depth of field, grain, vignette.
    pub fn forest() -> Self {
        Self {
            stages: vec![
                PostStage::LightShafts {
                    samples: 120,
                    density: 0.96,
                    decay: 0.96,
                    weight: 0.4,
                    exposure: 0.62,
                    clamp_max: 1.0,
                    blur: true,
                },
                PostStage::Bloom {
                    threshold: 0.7,
                    smoothing: 0.6,
                    intensity: 1.3,
                },
                PostStage::DepthOfField {
                    focus_distance: 0.012,
                    focal_length: 0.018,
                    bokeh_scale: 7.0,
                    resolution_height: 960,
                },
                PostStage::Grain {
                    opacity: 0.12,
                    blend: BlendMode::Screen,
                    premultiply: true,
                },
                PostStage::Vignette {
                    offset: 0.42,
                    darkness: 1.15,
                },
            ],
            tone_mapping: ToneMapping::AcesFilmic,
        }
    }

    /// Builds a chain after checking no linear stage follows a screen pass.
    pub fn new(stages: Vec<PostStage>) -> Result<Self, ConfigError> {
        let chain = Self {
            stages,
            tone_mapping: ToneMapping::AcesFilmic,
        };
        chain.validate()?;
        Ok(chain)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen_screen = false;
        for stage in &self.stages {
            match stage.space() {
                StageSpace::Screen => seen_screen = true,
                StageSpace::Linear if seen_screen => {
                    return Err(ConfigError::PostOrder {
                        stage: stage.name(),
                    })
                }
                StageSpace::Linear => {}
            }
        }
        Ok(())
    }

    pub fn stages(&self) -> &[PostStage] {
        &self.stages
    }

    pub fn light_shafts(&self) -> Option<&PostStage> {
        self.stages
            .iter()
            .find(|s| matches!(s, PostStage::LightShafts { .. }))
    }

    pub fn bloom(&self) -> Option<&PostStage> {
        self.stages.iter().find(|s| matches!(s, PostStage::Bloom { .. }))
    }

    pub fn depth_of_field(&self) -> Option<&PostStage> {
        self.stages
            .iter()
            .find(|s| matches!(s, PostStage::DepthOfField { .. }))
    }

    pub fn grain(&self) -> Option<&PostStage> {
        self.stages.iter().find(|s| matches!(s, PostStage::Grain { .. }))
    }

    pub fn vignette(&self) -> Option<&PostStage> {
        self.stages
            .iter()
            .find(|s| matches!(s, PostStage::Vignette { .. }))
    }
}

/// Screen-space origin of the light shafts for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShaftAnchor {
    /// Texture coordinates, origin top-left.
    pub uv: Vec2,
    /// 0 when the sun is behind the camera, 1 anywhere inside the view.
    pub visibility: f32,
}

/// Project a world point through `view_proj` into a shaft anchor.
pub fn project_anchor(view_proj: Mat4, world: Vec3) -> ShaftAnchor {
    let clip = view_proj * Vec4::new(world.x, world.y, world.z, 1.0);
    if clip.w <= 1e-5 {
        return ShaftAnchor {
            uv: Vec2::splat(0.5),
            visibility: 0.0,
        };
    }
    let ndc = clip.truncate() / clip.w;
    let uv = Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
    // the framing keeps the sun just above the frame; fade over four screens
    let outside = (ndc.x.abs().max(ndc.y.abs()) - 1.0).max(0.0);
    ShaftAnchor {
        uv,
        visibility: (1.0 - outside * 0.25).clamp(0.0, 1.0),
    }
}
