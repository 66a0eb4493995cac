//! Hierarchical figures built from primitives.
//!
//! A rig is a flat list of parts where each part may name an earlier part as
//! its parent. Parts are addressed by name; the only per-frame mutation is
//! the avian wing pose.

use crate::constants::*;
use crate::error::ConfigError;
use crate::geometry::Shape;
use crate::instance::{DrawBatch, Transform};
use crate::material::Material;
use fnv::FnvHashMap;
use glam::{Mat4, Vec3};
use smallvec::SmallVec;
use std::f32::consts::{FRAC_PI_2, PI};

#[derive(Clone, Debug)]
pub struct RigPart {
    pub name: &'static str,
    pub parent: Option<usize>,
    pub shape: Option<Shape>, // None for grouping nodes
    pub material: Option<Material>,
    pub local: Transform,
}

#[derive(Clone, Debug)]
pub struct Rig {
    pub name: &'static str,
    pub root: Transform,
    parts: SmallVec<[RigPart; 10]>,
    index: FnvHashMap<&'static str, usize>,
}

impl Rig {
    pub fn new(name: &'static str, root: Transform) -> Self {
        Self {
            name,
            root,
            parts: SmallVec::new(),
            index: FnvHashMap::default(),
        }
    }

    /// Append a part. A named parent must already be in the rig.
    pub fn add(
        &mut self,
        name: &'static str,
        parent: Option<&'static str>,
        shape: Option<Shape>,
        material: Option<Material>,
        local: Transform,
    ) -> Result<usize, ConfigError> {
        let parent = match parent {
            Some(p) => Some(self.index.get(p).copied().ok_or(ConfigError::UnknownRigParent {
                rig: self.name,
                part: name,
                parent: p,
            })?),
            None => None,
        };
        let idx = self.parts.len();
        self.parts.push(RigPart {
            name,
            parent,
            shape,
            material,
            local,
        });
        self.index.insert(name, idx);
        Ok(idx)
    }

    fn mesh(
        &mut self,
        name: &'static str,
        shape: Shape,
        material: Material,
        local: Transform,
    ) -> Result<usize, ConfigError> {
        self.add(name, None, Some(shape), Some(material), local)
    }

    fn child_mesh(
        &mut self,
        parent: &'static str,
        name: &'static str,
        shape: Shape,
        material: Material,
        local: Transform,
    ) -> Result<usize, ConfigError> {
        self.add(name, Some(parent), Some(shape), Some(material), local)
    }

    pub fn parts(&self) -> &[RigPart] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&RigPart> {
        self.index.get(name).map(|&i| &self.parts[i])
    }

    pub fn part_mut(&mut self, name: &str) -> Option<&mut RigPart> {
        let i = *self.index.get(name)?;
        self.parts.get_mut(i)
    }

    /// Number of parts that produce geometry.
    pub fn mesh_count(&self) -> usize {
        self.parts.iter().filter(|p| p.shape.is_some()).count()
    }

    /// Root * ancestors * local for part `idx`, or `None` past the end.
    pub fn world_matrix(&self, idx: usize) -> Option<Mat4> {
        let part = self.parts.get(idx)?;
        let mut m = part.local.to_matrix();
        let mut parent = part.parent;
        while let Some(p) = parent.and_then(|p| self.parts.get(p)) {
            m = p.local.to_matrix() * m;
            parent = p.parent;
        }
        Some(self.root.to_matrix() * m)
    }

    pub fn world_position(&self, name: &str) -> Option<Vec3> {
        let idx = *self.index.get(name)?;
        Some(self.world_matrix(idx)?.w_axis.truncate())
    }

    /// One single-instance batch per mesh part, in part order.
    pub fn build_batches(&self) -> Vec<DrawBatch> {
        self.parts
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let shape = p.shape.clone()?;
                let material = p.material?;
                let model = self.world_matrix(i)?;
                Some(DrawBatch::new(p.name, shape, material).with_instance(model))
            })
            .collect()
    }

    /// Refresh transforms of batches previously built by `build_batches`.
    pub fn write_batches(&self, batches: &mut [DrawBatch]) {
        let meshes = self
            .parts
            .iter()
            .enumerate()
            .filter(|(_, p)| p.shape.is_some());
        for ((i, _), batch) in meshes.zip(batches.iter_mut()) {
            if let (Some(raw), Some(model)) = (batch.instances.first_mut(), self.world_matrix(i)) {
                raw.set_model(model);
            }
        }
    }
}

/// Pose and palette of one humanoid figure.
#[derive(Clone, Debug)]
pub struct CharacterParams {
    pub position: Vec3,
    pub rotation: Vec3,
    pub robe: &'static str,
    pub accent: &'static str,
    pub skin: &'static str,
    pub kneeling: bool,
    pub holds_bow: bool,
}

pub fn assemble_character(name: &'static str, p: &CharacterParams) -> Result<Rig, ConfigError> {
    let robe = Material::standard(p.robe, 0.55, 0.08)?;
    let lower_robe = Material::standard(p.robe, 0.6, 0.05)?;
    let accent = Material::standard(p.accent, 0.4, 0.35)?;
    let skin = Material::standard(p.skin, 0.45, 0.0)?;

    let torso_h = if p.kneeling { 1.1 } else { 1.45 };
    let knee = if p.kneeling { -0.55 } else { 0.0 };
    let arm_z = if p.kneeling { -0.2 } else { 0.08 };

    let mut rig = Rig::new(name, Transform::at(p.position).rotated(p.rotation));
    rig.mesh(
        "torso",
        Shape::Capsule {
            radius: 0.33,
            length: 0.8,
        },
        robe,
        Transform::at(Vec3::new(0.0, torso_h, 0.0)),
    )?;
    rig.mesh(
        "head",
        Shape::Sphere { radius: 0.28 },
        skin,
        Transform::at(Vec3::new(0.0, torso_h + 0.65, 0.02)),
    )?;
    rig.mesh(
        "accent",
        Shape::Torus {
            radius: 0.5,
            tube: 0.08,
        },
        accent,
        Transform::at(Vec3::new(0.0, torso_h + 0.25, 0.35)).rotated(Vec3::new(FRAC_PI_2, 0.0, 0.0)),
    )?;
    rig.mesh(
        "robe",
        Shape::Cylinder {
            top: 0.32,
            bottom: 0.55,
            height: if p.kneeling { 1.5 } else { 2.3 },
            segments: 16,
        },
        lower_robe,
        Transform::at(Vec3::new(0.0, 0.4 + knee, if p.kneeling { -0.35 } else { 0.0 }))
            .rotated(Vec3::new(PI / 2.2, 0.0, 0.0)),
    )?;
    let arm = Shape::Cylinder {
        top: 0.08,
        bottom: 0.12,
        height: 0.65,
        segments: 12,
    };
    for (label, side) in [("arm_left", -1.0_f32), ("arm_right", 1.0)] {
        rig.mesh(
            label,
            arm.clone(),
            skin,
            Transform::at(Vec3::new(0.38 * side, torso_h + 0.32, arm_z))
                .rotated(Vec3::new(PI / 1.4, 0.4 * side, side * PI / 2.3)),
        )?;
    }
    if p.holds_bow {
        attach_bow(&mut rig, torso_h)?;
    }
    Ok(rig)
}

fn attach_bow(rig: &mut Rig, torso_h: f32) -> Result<(), ConfigError> {
    let wood = Material::standard("#c97a32", 0.4, 0.3)?;
    let string = Material::standard("#f9f1d5", 1.0, 0.0)?;
    rig.add(
        "bow",
        None,
        None,
        None,
        Transform::at(Vec3::new(0.52, torso_h + 0.38, 0.18))
            .rotated(Vec3::new(PI / 2.1, 0.2, FRAC_PI_2)),
    )?;
    rig.child_mesh(
        "bow",
        "bow_limb",
        Shape::Tube {
            points: vec![
                Vec3::new(0.0, -0.5, 0.0),
                Vec3::new(0.25, 0.0, 0.1),
                Vec3::new(0.0, 0.5, 0.0),
            ],
            radius: 0.025,
            segments: 24,
        },
        wood,
        Transform::default(),
    )?;
    rig.child_mesh(
        "bow",
        "bow_string",
        Shape::Cylinder {
            top: 0.01,
            bottom: 0.01,
            height: 1.02,
            segments: 6,
        },
        string,
        Transform::default(),
    )?;
    Ok(())
}

pub const AVIAN_POSITION: [f32; 3] = [-1.2, 0.52, 0.0];
pub const AVIAN_YAW: f32 = PI / 8.0;

pub fn assemble_avian() -> Result<Rig, ConfigError> {
    let plumage = Material::standard("#6b4638", 0.6, 0.1)?;
    let beak = Material::standard("#cb9355", 0.35, 0.25)?;
    let neck = Material::standard("#7a543f", 0.6, 0.0)?;
    let wing = Material::standard("#4e3226", 0.65, 0.05)?.double_sided();
    let leg = Material::standard("#5f3e2f", 0.5, 0.0)?;

    let root = Transform::at(Vec3::from(AVIAN_POSITION)).rotated(Vec3::new(0.0, AVIAN_YAW, 0.0));
    let mut rig = Rig::new("jatayu", root);
    rig.mesh("body", Shape::Sphere { radius: 0.38 }, plumage, Transform::default())?;
    rig.mesh(
        "beak",
        Shape::Cone {
            radius: 0.18,
            height: 0.45,
        },
        beak,
        Transform::at(Vec3::new(0.0, 0.12, 0.42)),
    )?;
    rig.mesh(
        "neck",
        Shape::Cylinder {
            top: 0.18,
            bottom: 0.32,
            height: 0.7,
            segments: 12,
        },
        neck,
        Transform::at(Vec3::new(0.0, 0.4, 0.15)).rotated(Vec3::new(PI / 2.2, 0.0, 0.0)),
    )?;
    let wings = WingAnimator::default();
    let (left, right) = wings.angles(0.0);
    let wing_shape = Shape::Plane {
        width: 1.6,
        height: 0.6,
    };
    rig.mesh(
        "wing_left",
        wing_shape.clone(),
        wing,
        Transform::at(Vec3::new(0.32, 0.3, 0.2)).rotated(Vec3::new(0.0, 0.0, left)),
    )?;
    rig.mesh(
        "wing_right",
        wing_shape,
        wing,
        Transform::at(Vec3::new(-0.32, 0.3, 0.2)).rotated(Vec3::new(0.0, 0.0, right)),
    )?;
    let leg_shape = Shape::Cylinder {
        top: 0.04,
        bottom: 0.12,
        height: 0.58,
        segments: 8,
    };
    for (label, side) in [("leg_left", 1.0_f32), ("leg_right", -1.0)] {
        rig.mesh(
            label,
            leg_shape.clone(),
            leg,
            Transform::at(Vec3::new(0.15 * side, -0.35, 0.1))
                .rotated(Vec3::new(FRAC_PI_2, 0.0, side * PI / 3.0)),
        )?;
    }
    Ok(rig)
}

/// Mirrored flapping: `base ± amplitude·sin(t·frequency)`.
#[derive(Clone, Copy, Debug)]
pub struct WingAnimator {
    pub base: f32,
    pub amplitude: f32,
    pub frequency: f32,
}

impl Default for WingAnimator {
    fn default() -> Self {
        Self {
            base: WING_BASE_ANGLE,
            amplitude: WING_FLAP_AMPLITUDE,
            frequency: WING_FLAP_FREQUENCY,
        }
    }
}

impl WingAnimator {
    /// (left, right) roll angles at time `t`.
    pub fn angles(&self, t: f32) -> (f32, f32) {
        let flap = (t * self.frequency).sin() * self.amplitude;
        (self.base + flap, -self.base - flap)
    }

    pub fn apply(&self, rig: &mut Rig, t: f32) {
        let (left, right) = self.angles(t);
        if let Some(p) = rig.part_mut("wing_left") {
            p.local.rotation.z = left;
        }
        if let Some(p) = rig.part_mut("wing_right") {
            p.local.rotation.z = right;
        }
    }
}

/// The three kneeling figures gathered around the aura.
pub fn tableau_figures() -> Vec<(&'static str, CharacterParams)> {
    vec![
        (
            "rama",
            CharacterParams {
                position: Vec3::new(0.8, 0.1, 0.4),
                rotation: Vec3::new(0.0, -PI / 4.0, 0.0),
                robe: "#2f3e6b",
                accent: "#d7c478",
                skin: "#f3cfa4",
                kneeling: true,
                holds_bow: true,
            },
        ),
        (
            "companion",
            CharacterParams {
                position: Vec3::new(1.8, 0.12, -0.15),
                rotation: Vec3::new(0.0, -PI / 3.4, 0.0),
                robe: "#7f3e2f",
                accent: "#f2d48a",
                skin: "#cfad85",
                kneeling: true,
                holds_bow: false,
            },
        ),
        (
            "elder",
            CharacterParams {
                position: Vec3::new(2.45, 0.18, 0.9),
                rotation: Vec3::new(0.0, -PI / 18.0, 0.0),
                robe: "#49683b",
                accent: "#d8b77a",
                skin: "#b88656",
                kneeling: true,
                holds_bow: false,
            },
        ),
    ]
}
