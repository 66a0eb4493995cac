//! The assembled tableau and its per-frame update.
//!
//! All draw batches live in one arena; animators keep the index of the batch
//! they own and overwrite it during `update`. The renderer only sees the
//! arena after the update for that frame has finished.

use crate::camera::{Camera, CameraPose, DollyCamera};
use crate::config::SceneConfig;
use crate::constants::*;
use crate::dust::DustField;
use crate::error::ConfigError;
use crate::foliage::{Canopy, FrondBed, TrunkArray};
use crate::geometry::Shape;
use crate::instance::{DrawBatch, Transform};
use crate::lighting::{project_anchor, LightRig, PostChain, ShaftAnchor};
use crate::material::Material;
use crate::rig::{assemble_avian, assemble_character, tableau_figures, Rig, WingAnimator};
use crate::sampler::Sampler;
use glam::Vec3;
use std::f32::consts::FRAC_PI_2;
use std::ops::Range;

/// Everything the rasterizer needs for one frame.
pub struct RenderGraph<'a> {
    pub camera: Camera,
    pub batches: &'a [DrawBatch],
    pub lights: &'a LightRig,
    pub post: &'a PostChain,
    pub shaft_anchor: ShaftAnchor,
    pub elapsed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PopulationCounts {
    pub foliage: usize,
    pub dust: usize,
    pub trunks: usize,
    pub fronds: usize,
}

struct PlacedRig {
    rig: Rig,
    batches: Range<usize>,
}

pub struct ForestScene {
    batches: Vec<DrawBatch>,
    canopy: Canopy,
    canopy_batch: usize,
    fronds: FrondBed,
    frond_batch: usize,
    trunks: TrunkArray,
    dust: DustField,
    dust_batch: usize,
    rigs: Vec<PlacedRig>,
    avian: usize,
    wings: WingAnimator,
    camera: DollyCamera,
    pose: CameraPose,
    aspect: f32,
    lights: LightRig,
    post: PostChain,
    elapsed: f32,
}

impl ForestScene {
    pub fn new(config: SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sampler = Sampler::new(config.seed);
        let radius = config.forest_radius;

        let canopy = Canopy::new(sampler.canopy(&config.canopy, radius)?);
        let fronds = FrondBed::new(sampler.fronds(&config.fronds)?);
        let trunks = TrunkArray::new(sampler.trunks(&config.trunks)?);
        let dust = DustField::new(
            sampler.dust(&config.dust, radius)?,
            config.dust.bounds,
            sampler.recycle_stream(),
        )?;
        let lights = LightRig::forest()?;
        let post = PostChain::forest();
        post.validate()?;

        let mut batches = ground_batches(radius, &lights)?;

        let canopy_batch = batches.len();
        batches.push(canopy.build_batch(
            Material::standard(CANOPY_BASE_COLOR, 0.6, 0.05)?
                .with_opacity(0.95)
                .double_sided(),
        ));
        let (bark, crowns) = trunks.build_batches(
            Material::standard(TRUNK_COLOR, 0.85, 0.06)?,
            Material::standard(CROWN_COLOR, 0.7, 0.05)?,
        );
        batches.push(bark);
        batches.push(crowns);
        let frond_batch = batches.len();
        batches.push(fronds.build_batch(
            Material::standard(FROND_COLOR, 0.65, 0.05)?.double_sided(),
        ));

        let mut rigs = Vec::new();
        for (name, params) in tableau_figures() {
            rigs.push(place_rig(assemble_character(name, &params)?, &mut batches));
        }
        let avian = rigs.len();
        rigs.push(place_rig(assemble_avian()?, &mut batches));

        let dust_batch = batches.len();
        batches.push(dust.build_batch(
            DUST_MOTE_SIZE,
            Material::emissive(DUST_COLOR, DUST_OPACITY)?.additive(),
        ));

        let camera = DollyCamera::default();
        let pose = camera.pose(0.0);
        log::info!(
            "forest scene: {} leaves, {} motes, {} trunks, {} fronds, {} figures, {} batches (seed {:?})",
            canopy.len(),
            dust.len(),
            trunks.len(),
            fronds.len(),
            rigs.len(),
            batches.len(),
            config.seed
        );
        Ok(Self {
            batches,
            canopy,
            canopy_batch,
            fronds,
            frond_batch,
            trunks,
            dust,
            dust_batch,
            rigs,
            avian,
            wings: WingAnimator::default(),
            camera,
            pose,
            aspect: 16.0 / 9.0,
            lights,
            post,
            elapsed: 0.0,
        })
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Advance every animator to `elapsed` and publish the frame.
    pub fn update(&mut self, elapsed: f32, dt: f32) -> RenderGraph<'_> {
        self.elapsed = elapsed;
        self.canopy
            .animate(elapsed, &mut self.batches[self.canopy_batch]);
        self.fronds
            .animate(elapsed, &mut self.batches[self.frond_batch]);

        self.dust.step(dt);
        self.dust.publish(&mut self.batches[self.dust_batch]);

        if let Some(placed) = self.rigs.get_mut(self.avian) {
            self.wings.apply(&mut placed.rig, elapsed);
            placed
                .rig
                .write_batches(&mut self.batches[placed.batches.clone()]);
        }

        self.pose = self.camera.advance(elapsed, dt);
        self.frame()
    }

    /// The most recently published frame.
    pub fn frame(&self) -> RenderGraph<'_> {
        let camera = Camera::new(self.pose, self.aspect);
        let shaft_anchor = project_anchor(camera.view_projection(), self.lights.sun.position);
        RenderGraph {
            camera,
            batches: &self.batches,
            lights: &self.lights,
            post: &self.post,
            shaft_anchor,
            elapsed: self.elapsed,
        }
    }

    pub fn counts(&self) -> PopulationCounts {
        PopulationCounts {
            foliage: self.canopy.len(),
            dust: self.dust.len(),
            trunks: self.trunks.len(),
            fronds: self.fronds.len(),
        }
    }

    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    pub fn batch(&self, label: &str) -> Option<&DrawBatch> {
        self.batches.iter().find(|b| b.label == label)
    }

    pub fn canopy(&self) -> &Canopy {
        &self.canopy
    }

    pub fn dust(&self) -> &DustField {
        &self.dust
    }

    pub fn fronds(&self) -> &FrondBed {
        &self.fronds
    }

    pub fn trunks(&self) -> &TrunkArray {
        &self.trunks
    }

    pub fn rigs(&self) -> impl Iterator<Item = &Rig> {
        self.rigs.iter().map(|p| &p.rig)
    }

    pub fn camera(&self) -> &DollyCamera {
        &self.camera
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }
}

fn place_rig(rig: Rig, batches: &mut Vec<DrawBatch>) -> PlacedRig {
    let start = batches.len();
    batches.extend(rig.build_batches());
    PlacedRig {
        batches: start..batches.len(),
        rig,
    }
}

/// Floor, clearing, worn ring, aura and the sun disc.
fn ground_batches(radius: f32, lights: &LightRig) -> Result<Vec<DrawBatch>, ConfigError> {
    let flat = |y: f32| Transform::at(Vec3::new(0.0, y, 0.0)).rotated(Vec3::new(-FRAC_PI_2, 0.0, 0.0));
    let sun = &lights.sun;
    Ok(vec![
        DrawBatch::new(
            "floor",
            Shape::Circle { radius },
            Material::standard("#130d09", 0.95, 0.02)?,
        )
        .with_instance(flat(-0.02).to_matrix()),
        DrawBatch::new(
            "clearing",
            Shape::Circle { radius: 6.0 },
            Material::standard("#2d1f13", 0.85, 0.04)?,
        )
        .with_instance(flat(0.01).to_matrix()),
        DrawBatch::new(
            "worn_ring",
            Shape::Ring {
                inner: 6.0,
                outer: 10.0,
            },
            Material::standard("#3d2a1a", 0.9, 0.05)?.with_opacity(0.65),
        )
        .with_instance(flat(0.05).to_matrix()),
        DrawBatch::new(
            "sun",
            Shape::Sphere { radius: sun.radius },
            Material::emissive_rgb(sun.color, sun.opacity),
        )
        .with_instance(Transform::at(sun.position).to_matrix()),
        DrawBatch::new(
            "aura",
            Shape::Circle { radius: 3.4 },
            Material::emissive("#f0c981", 0.25)?.additive(),
        )
        .with_instance(
            Transform::at(Vec3::new(0.1, 0.6, 0.0))
                .rotated(Vec3::new(-FRAC_PI_2, 0.0, 0.0))
                .to_matrix(),
        ),
    ])
}
