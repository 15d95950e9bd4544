use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_6;

/// Fixed look-at camera with a perspective lens.
///
/// The camera never moves: both matrices are computed once at setup and
/// uploaded before the first frame. Aspect ratio is supplied by the caller
/// from the drawable surface size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LookAtCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for LookAtCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 3.0, 7.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: FRAC_PI_6,
            near: 0.5,
            far: 10.0,
        }
    }
}

impl LookAtCamera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Perspective projection with `[0, 1]` clip depth.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}
