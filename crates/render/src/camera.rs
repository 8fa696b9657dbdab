use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

const MIN_DISTANCE: f32 = 1.0;
const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Perspective camera orbiting a target point.
///
/// Camera motion lives outside the simulation: moving the camera never
/// touches body state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Radians per pixel of pointer drag.
    pub sensitivity: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(-200.0, 130.0, 0.0),
            target: Vec3::ZERO,
            fov_degrees: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            sensitivity: 0.005,
        }
    }
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3) -> Self {
        Self {
            eye,
            target,
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or(Vec3::NEG_Z)
    }

    pub fn distance(&self) -> f32 {
        self.eye.distance(self.target)
    }

    /// Update the aspect ratio after a viewport resize. Zero-sized viewports
    /// are ignored.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Rotate the eye around the target by a pointer drag in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        let offset = self.eye - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }
        let mut yaw = offset.z.atan2(offset.x);
        let mut pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();
        yaw += dx * self.sensitivity;
        pitch = (pitch + dy * self.sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
        self.eye = self.target
            + radius * Vec3::new(pitch.cos() * yaw.cos(), pitch.sin(), pitch.cos() * yaw.sin());
    }

    /// Scale the eye distance by `factor`; values below one move closer.
    pub fn zoom(&mut self, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let offset = self.eye - self.target;
        let radius = (offset.length() * factor).clamp(MIN_DISTANCE, self.far * 0.5);
        self.eye = self.target + offset.normalize_or(Vec3::X) * radius;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
