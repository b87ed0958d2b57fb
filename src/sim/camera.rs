//! Camera pose shared by the player rig and the car follow camera

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 10.0, 0.0),
            rotation: Quat::IDENTITY,
        }
    }
}

impl Camera {
    /// Yaw about Y then pitch about X (YXZ order)
    pub fn yaw_pitch(yaw: f32, pitch: f32) -> Quat {
        Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0)
    }

    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32) {
        self.rotation = Self::yaw_pitch(yaw, pitch);
    }

    /// Unit view direction (the camera looks down its local -Z)
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Aim at `target` without roll
    pub fn look_at(&mut self, target: Vec3) {
        let dir = (target - self.position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        let yaw = (-dir.x).atan2(-dir.z);
        let pitch = dir.y.clamp(-1.0, 1.0).asin();
        self.set_yaw_pitch(yaw, pitch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn zero_yaw_looks_down_negative_z() {
        let cam = Camera::default();
        assert!(close(cam.forward(), Vec3::NEG_Z));
    }

    #[test]
    fn positive_yaw_turns_left() {
        let mut cam = Camera::default();
        cam.set_yaw_pitch(std::f32::consts::FRAC_PI_2, 0.0);
        assert!(close(cam.forward(), Vec3::NEG_X));
    }

    #[test]
    fn positive_pitch_looks_up() {
        let mut cam = Camera::default();
        cam.set_yaw_pitch(0.0, 0.3);
        assert!(cam.forward().y > 0.0);
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let mut cam = Camera {
            position: Vec3::new(0.0, 3.0, -6.0),
            rotation: Quat::IDENTITY,
        };
        let target = Vec3::new(0.0, 0.8, 0.0);
        cam.look_at(target);
        let expected = (target - cam.position).normalize();
        assert!(close(cam.forward(), expected));
    }
}
