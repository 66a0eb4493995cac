//! Packed per-instance data and the draw batches that own it.

use crate::geometry::Shape;
use crate::material::Material;
use glam::{EulerRot, Mat4, Quat, Vec3};

/// Translation, XYZ euler rotation and scale, composed as T * R * S.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn rotated(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

/// GPU layout of one instance: column-major model matrix, linear RGBA tint,
/// then roughness, metalness, an unlit flag and a double-sided flag.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub surface: [f32; 4],
}

impl InstanceRaw {
    pub fn new(model: Mat4, tint: [f32; 3], material: &Material) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color: [tint[0], tint[1], tint[2], material.opacity],
            surface: [
                material.roughness,
                material.metalness,
                if material.unlit { 1.0 } else { 0.0 },
                if material.double_sided { 1.0 } else { 0.0 },
            ],
        }
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.model[3][0], self.model[3][1], self.model[3][2])
    }

    pub fn set_model(&mut self, model: Mat4) {
        self.model = model.to_cols_array_2d();
    }
}

/// One mesh + material drawn with a contiguous instance range.
#[derive(Clone, Debug)]
pub struct DrawBatch {
    pub label: &'static str,
    pub shape: Shape,
    pub material: Material,
    pub instances: Vec<InstanceRaw>,
}

impl DrawBatch {
    pub fn new(label: &'static str, shape: Shape, material: Material) -> Self {
        Self {
            label,
            shape,
            material,
            instances: Vec::new(),
        }
    }

    /// Appends an instance tinted with the batch material color.
    pub fn push(&mut self, model: Mat4) {
        let tint = self.material.linear_color();
        self.push_tinted(model, tint);
    }

    pub fn push_tinted(&mut self, model: Mat4, linear_tint: [f32; 3]) {
        let raw = InstanceRaw::new(model, linear_tint, &self.material);
        self.instances.push(raw);
    }

    pub fn with_instance(mut self, model: Mat4) -> Self {
        self.push(model);
        self
    }
}
