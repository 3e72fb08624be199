use std::f32::consts::{FRAC_PI_2, PI};

use bevy::math::{Vec2, Vec3};
use sv_model::{CameraPose, PX};

/// Camera distance at zoom 1, in scene units.
pub const BASE_DISTANCE: f32 = 3.2;
/// Look-at point: roughly mid-torso of a model standing on Y=0.
pub const ORBIT_TARGET_PX: f32 = 18.0;

const DRAG_SENSITIVITY: f32 = 0.008;
/// Exponential decay rate of the spin, per second.
const DAMPING: f32 = 6.0;
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.05;

/// Drag-to-orbit camera with inertia.
///
/// The model faces -Z, so yaw starts at PI to put the camera in front of it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    yaw: f32,
    pitch: f32,
    distance: f32,
    target: Vec3,
    velocity: Vec2,
}

impl OrbitControls {
    pub fn new(zoom: f32) -> Self {
        Self {
            yaw: PI,
            pitch: 0.12,
            distance: BASE_DISTANCE / zoom,
            target: Vec3::new(0.0, ORBIT_TARGET_PX * PX, 0.0),
            velocity: Vec2::ZERO,
        }
    }

    /// Feeds a pointer drag in pixels. Takes effect over the next frames.
    pub fn drag(&mut self, delta: Vec2) {
        self.velocity += delta * DRAG_SENSITIVITY * DAMPING;
    }

    pub fn is_settled(&self) -> bool {
        self.velocity.length_squared() < 1e-8
    }

    /// Integrates the pending spin and returns the camera for this frame.
    pub fn update(&mut self, dt: f32) -> CameraPose {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.yaw -= self.velocity.x * dt;
        self.pitch = (self.pitch + self.velocity.y * dt).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.velocity *= (-DAMPING * dt).exp();
        if self.is_settled() {
            self.velocity = Vec2::ZERO;
        }
        self.pose()
    }

    pub fn pose(&self) -> CameraPose {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let offset = Vec3::new(sin_yaw * cos_pitch, sin_pitch, cos_yaw * cos_pitch) * self.distance;
        CameraPose {
            eye: self.target + offset,
            target: self.target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_front_of_the_model() {
        let pose = OrbitControls::new(1.0).pose();
        assert!(pose.eye.z < 0.0);
        assert!(((pose.eye - pose.target).length() - BASE_DISTANCE).abs() < 1e-4);
    }

    #[test]
    fn zoom_moves_the_camera_closer() {
        let near = OrbitControls::new(2.0).pose();
        assert!(((near.eye - near.target).length() - BASE_DISTANCE / 2.0).abs() < 1e-4);
    }

    #[test]
    fn drag_spins_then_settles() {
        let mut controls = OrbitControls::new(1.0);
        let start = controls.pose().eye;
        controls.drag(Vec2::new(120.0, 0.0));
        let first = controls.update(1.0 / 60.0).eye;
        assert_ne!(first, start);
        for _ in 0..600 {
            controls.update(1.0 / 60.0);
        }
        assert!(controls.is_settled());
        let rest = controls.pose().eye;
        assert_eq!(controls.update(1.0 / 60.0).eye, rest);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut controls = OrbitControls::new(1.0);
        controls.drag(Vec2::new(0.0, 1.0e6));
        for _ in 0..120 {
            controls.update(1.0 / 60.0);
        }
        let pose = controls.pose();
        assert!(pose.eye.y - pose.target.y < BASE_DISTANCE);
    }
}
