//! Canopy, frond and trunk populations.
//!
//! Each animated population keeps its immutable samples and rewrites every
//! instance of its batch once per frame. Motion is a handful of phase-shifted
//! sines per instance; nothing is simulated.

use crate::constants::*;
use crate::geometry::Shape;
use crate::instance::{DrawBatch, Transform};
use crate::material::{srgb_to_linear, Material};
use crate::sampler::{FrondPlacement, InstanceSample, TrunkPlacement};
use glam::Vec3;
use std::f32::consts::FRAC_PI_2;

pub struct Canopy {
    samples: Vec<InstanceSample>,
}

impl Canopy {
    pub fn new(samples: Vec<InstanceSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[InstanceSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Pose of one leaf card at elapsed time `t`.
    pub fn leaf_transform(s: &InstanceSample, t: f32) -> Transform {
        let ph = s.phase;
        let [ax, ay, az] = LEAF_DRIFT_AMPLITUDE;
        let [fx, fy, fz] = LEAF_DRIFT_FREQUENCY;
        let drift = Vec3::new(
            (t * fx + ph).sin() * ax,
            (t * fy + ph * 2.0).cos() * ay,
            (t * fz + ph).cos() * az,
        );
        let sway = (t * LEAF_SWAY_FREQUENCY + ph).sin() * LEAF_SWAY_AMPLITUDE;
        Transform::at(s.position + drift)
            .rotated(Vec3::new(
                -FRAC_PI_2 + sway * LEAF_SWAY_TILT,
                s.rotation_seed + sway * LEAF_SWAY_YAW,
                (t * fx + ph).sin() * LEAF_ROLL_AMPLITUDE,
            ))
            .scaled(Vec3::new(s.scale, s.scale * LEAF_STRETCH_Y, s.scale))
    }

    /// Leaf tint is the material color times the leaf's palette pick, in
    /// linear space.
    pub fn build_batch(&self, material: Material) -> DrawBatch {
        let base = material.linear_color();
        let mut batch = DrawBatch::new(
            "canopy",
            Shape::Plane {
                width: LEAF_SIZE.0,
                height: LEAF_SIZE.1,
            },
            material,
        );
        for s in &self.samples {
            let leaf = s.color.map(srgb_to_linear);
            let tint = [base[0] * leaf[0], base[1] * leaf[1], base[2] * leaf[2]];
            batch.push_tinted(Self::leaf_transform(s, 0.0).to_matrix(), tint);
        }
        batch
    }

    /// Rewrites every instance; tints and material scalars stay as built.
    pub fn animate(&self, t: f32, batch: &mut DrawBatch) {
        for (raw, s) in batch.instances.iter_mut().zip(&self.samples) {
            raw.set_model(Self::leaf_transform(s, t).to_matrix());
        }
    }
}

pub struct FrondBed {
    placements: Vec<FrondPlacement>,
}

impl FrondBed {
    pub fn new(placements: Vec<FrondPlacement>) -> Self {
        Self { placements }
    }

    pub fn placements(&self) -> &[FrondPlacement] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn sway(p: &FrondPlacement, t: f32) -> f32 {
        (t * FROND_SWAY_FREQUENCY + p.phase).sin() * FROND_SWAY_AMPLITUDE
    }

    pub fn frond_transform(p: &FrondPlacement, t: f32) -> Transform {
        let mut rotation = p.rotation;
        rotation.z += Self::sway(p, t);
        Transform::at(p.position)
            .rotated(rotation)
            .scaled(Vec3::splat(p.scale))
    }

    pub fn build_batch(&self, material: Material) -> DrawBatch {
        let mut batch = DrawBatch::new(
            "fronds",
            Shape::Plane {
                width: FROND_SIZE.0,
                height: FROND_SIZE.1,
            },
            material,
        );
        for p in &self.placements {
            batch.push(Self::frond_transform(p, 0.0).to_matrix());
        }
        batch
    }

    pub fn animate(&self, t: f32, batch: &mut DrawBatch) {
        for (raw, p) in batch.instances.iter_mut().zip(&self.placements) {
            raw.set_model(Self::frond_transform(p, t).to_matrix());
        }
    }
}

/// Static ring of trunks with a crown sphere on each.
pub struct TrunkArray {
    placements: Vec<TrunkPlacement>,
}

impl TrunkArray {
    pub fn new(placements: Vec<TrunkPlacement>) -> Self {
        Self { placements }
    }

    pub fn placements(&self) -> &[TrunkPlacement] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Trunk cylinders are unit height, stretched to twice their scale.
    pub fn trunk_transform(p: &TrunkPlacement) -> Transform {
        Transform::at(p.position)
            .rotated(Vec3::new(0.0, p.rotation, 0.0))
            .scaled(Vec3::new(1.0, p.scale * 2.0, 1.0))
    }

    pub fn crown_position(p: &TrunkPlacement) -> Vec3 {
        p.position + Vec3::Y * (p.scale * CROWN_HEIGHT_FACTOR)
    }

    pub fn build_batches(&self, bark: Material, crown: Material) -> (DrawBatch, DrawBatch) {
        let mut trunks = DrawBatch::new(
            "trunks",
            Shape::Cylinder {
                top: TRUNK_RADII.0,
                bottom: TRUNK_RADII.1,
                height: 1.0,
                segments: 12,
            },
            bark,
        );
        let mut crowns = DrawBatch::new(
            "crowns",
            Shape::Sphere {
                radius: CROWN_RADIUS,
            },
            crown,
        );
        for p in &self.placements {
            trunks.push(Self::trunk_transform(p).to_matrix());
            crowns.push(Transform::at(Self::crown_position(p)).to_matrix());
        }
        (trunks, crowns)
    }
}
