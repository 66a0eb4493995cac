//! Camera description and the opening dolly move.
//!
//! These types intentionally avoid referencing platform-specific APIs; both
//! frontends build their view and projection matrices from them.

use crate::constants::*;
use glam::{Mat4, Vec3};

/// Simple right-handed camera description with perspective projection.
#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(pose: CameraPose, aspect: f32) -> Self {
        Self {
            eye: pose.position,
            target: pose.target,
            up: Vec3::Y,
            aspect,
            fovy_radians: CAMERA_FOV_DEGREES.to_radians(),
            znear: CAMERA_NEAR,
            zfar: CAMERA_FAR,
        }
    }

    /// Compute the clip-space projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }
    /// Compute the view matrix that transforms world to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

/// Eased dolly from a wide establishing pose to the figures, with a slow
/// vertical breathing term layered on top.
#[derive(Clone, Debug)]
pub struct DollyCamera {
    pub start: Vec3,
    pub end: Vec3,
    pub look_at: Vec3,
    pub rate: f32,
    pub bob_amplitude: f32,
    pub bob_frequency: f32,
    progress: f32,
}

impl Default for DollyCamera {
    fn default() -> Self {
        Self {
            start: Vec3::from(CAMERA_START),
            end: Vec3::from(CAMERA_END),
            look_at: camera_look_at(),
            rate: CAMERA_RATE,
            bob_amplitude: CAMERA_BOB_AMPLITUDE,
            bob_frequency: CAMERA_BOB_FREQUENCY,
            progress: 0.0,
        }
    }
}

#[inline]
pub fn ease_out_cubic(p: f32) -> f32 {
    1.0 - (1.0 - p).powi(3)
}

impl DollyCamera {
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_settled(&self) -> bool {
        self.progress >= 1.0
    }

    /// Seconds from the first frame until the dolly settles.
    pub fn travel_time(&self) -> f32 {
        1.0 / self.rate
    }

    /// Advance by `dt` (negative steps count as zero) and return the pose for
    /// elapsed time `t`.
    pub fn advance(&mut self, t: f32, dt: f32) -> CameraPose {
        if dt.is_finite() && dt > 0.0 {
            self.progress = (self.progress + dt * self.rate).min(1.0);
        }
        self.pose(t)
    }

    pub fn pose(&self, t: f32) -> CameraPose {
        let eased = ease_out_cubic(self.progress);
        let mut position = if self.progress >= 1.0 {
            self.end
        } else {
            self.start.lerp(self.end, eased)
        };
        position.y += (t * self.bob_frequency).sin() * self.bob_amplitude;
        CameraPose {
            position,
            target: self.look_at,
        }
    }
}
