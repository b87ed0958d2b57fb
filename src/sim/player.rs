//! First-person player rig
//!
//! The body is an upright dynamic capsule the physics backend pushes around; the camera
//! sits on top of it. Horizontal velocity is written directly from the held
//! keys each frame, vertical velocity is left to gravity apart from jumps
//! and blast lift.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::camera::Camera;
use super::input::{Key, MoveFlags};
use super::physics::{BodyDesc, BodyHandle, BodyType, PhysicsBackend, RotationLock, Shape};
use super::state::{EventCursor, ModeFlags, WorldState};
use crate::horizontal;
use crate::tuning::PlayerTuning;

/// Limb angles and bob for the (normally hidden) character mesh
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerPose {
    /// Yaw the character faces (radians)
    pub facing: f32,
    pub walk_phase: f32,
    pub left_leg: f32,
    pub right_leg: f32,
    pub left_arm: f32,
    pub right_arm: f32,
    pub body_bob: f32,
}

#[derive(Debug, Clone)]
pub struct PlayerController {
    body: BodyHandle,
    flags: MoveFlags,
    yaw: f32,
    pitch: f32,
    grounded: bool,
    moving: bool,
    cursor: EventCursor,
    pose: PlayerPose,
    /// Where the body was when the player got into the car
    parked_at: Option<Vec3>,
}

impl PlayerController {
    pub fn spawn(world: &WorldState, physics: &mut dyn PhysicsBackend, tuning: &PlayerTuning) -> Self {
        let desc = BodyDesc::dynamic(
            Shape::Capsule {
                half_height: tuning.capsule_half_height,
                radius: tuning.capsule_radius,
            },
            Vec3::from_array(tuning.spawn),
        )
        .with_mass(tuning.mass)
        .with_linear_damping(tuning.linear_damping)
        .with_rotation_lock(RotationLock::Locked);

        Self {
            body: physics.create_body(desc),
            flags: MoveFlags::default(),
            yaw: 0.0,
            pitch: tuning.initial_pitch,
            grounded: false,
            moving: false,
            cursor: world.explosions.head(),
            pose: PlayerPose::default(),
            parked_at: None,
        }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn flags(&self) -> MoveFlags {
        self.flags
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn pose(&self) -> PlayerPose {
        self.pose
    }

    pub fn parked_at(&self) -> Option<Vec3> {
        self.parked_at
    }

    /// Key presses count only while playing on foot; releases while on foot
    pub fn key(&mut self, key: Key, down: bool, mode: ModeFlags) {
        if mode.driving || (down && !mode.playing) {
            return;
        }
        self.flags.set(key, down);
    }

    /// Apply a look delta in radians
    pub fn look(&mut self, dyaw: f32, dpitch: f32, mode: ModeFlags, tuning: &PlayerTuning) {
        if !mode.playing || mode.driving {
            return;
        }
        self.yaw -= dyaw;
        self.pitch = (self.pitch - dpitch).clamp(-tuning.pitch_limit, tuning.pitch_limit);
    }

    /// Spawn point and direction for a bomb thrown along the view ray
    pub fn throw_origin(camera: &Camera, tuning: &PlayerTuning) -> (Vec3, Vec3) {
        let dir = camera.forward().normalize_or_zero();
        (camera.position + dir * tuning.throw_offset, dir)
    }

    fn active(&self, mode: ModeFlags, physics: &dyn PhysicsBackend) -> bool {
        mode.playing && !mode.driving && physics.contains(self.body)
    }

    /// Sample ground contact, then apply unseen blasts. Each blast reaches
    /// this player at most once.
    pub fn apply_explosions(
        &mut self,
        world: &WorldState,
        physics: &mut dyn PhysicsBackend,
        tuning: &PlayerTuning,
    ) {
        if !self.active(world.mode, physics) {
            return;
        }
        let (Some(position), Some(vel)) = (physics.translation(self.body), physics.linvel(self.body))
        else {
            return;
        };
        self.grounded = vel.y.abs() < tuning.ground_epsilon;

        for event in world.explosions.drain_since(&mut self.cursor) {
            if let Some(impulse) = event.impulse_at(position) {
                let impulse = impulse * tuning.knockback_scale + Vec3::Y * tuning.knockback_lift;
                physics.apply_impulse(self.body, impulse);
                log::debug!("Player knocked back by explosion {}", event.id.0);
            }
        }
    }

    /// Locomotion, jump, walk cycle, camera
    pub fn integrate(
        &mut self,
        world: &WorldState,
        physics: &mut dyn PhysicsBackend,
        camera: &mut Camera,
        tuning: &PlayerTuning,
        dt: f32,
    ) {
        if !self.active(world.mode, physics) {
            return;
        }
        let Some(vel) = physics.linvel(self.body) else {
            return;
        };

        let speed = if self.flags.sprint {
            tuning.sprint_speed
        } else {
            tuning.walk_speed
        };
        let direction = self.move_direction();
        self.moving = direction != Vec3::ZERO;
        if self.moving {
            self.pose.facing = direction.x.atan2(direction.z);
        }

        let mut next = Vec3::new(direction.x * speed, vel.y, direction.z * speed);
        if self.flags.jump && self.grounded {
            next.y = tuning.jump_speed;
        }
        physics.set_linvel(self.body, next);

        self.animate(speed, tuning, dt);

        if let Some(pos) = physics.translation(self.body) {
            camera.position = pos + Vec3::Y * tuning.camera_height;
            camera.set_yaw_pitch(self.yaw, self.pitch);
        }
    }

    /// Unit horizontal direction from held keys in the camera yaw frame
    pub fn move_direction(&self) -> Vec3 {
        let mut local = Vec3::ZERO;
        if self.flags.forward {
            local.z -= 1.0;
        }
        if self.flags.backward {
            local.z += 1.0;
        }
        if self.flags.left {
            local.x -= 1.0;
        }
        if self.flags.right {
            local.x += 1.0;
        }
        if local == Vec3::ZERO {
            return Vec3::ZERO;
        }
        let world_dir = Quat::from_rotation_y(self.yaw) * local.normalize();
        horizontal(world_dir).normalize_or_zero()
    }

    fn animate(&mut self, speed: f32, tuning: &PlayerTuning, dt: f32) {
        if self.moving && self.grounded {
            self.pose.walk_phase += dt * (speed / tuning.walk_speed) * tuning.walk_cycle_rate;
            let phase = self.pose.walk_phase;
            let leg = phase.sin() * tuning.leg_swing;
            let arm = phase.sin() * tuning.arm_swing;
            self.pose.left_leg = -leg;
            self.pose.right_leg = leg;
            self.pose.left_arm = arm;
            self.pose.right_arm = -arm;
            self.pose.body_bob = (phase * 2.0).sin().abs() * tuning.body_bob;
        } else {
            let facing = self.pose.facing;
            self.pose = PlayerPose {
                facing,
                ..PlayerPose::default()
            };
        }
    }

    /// Park the body while the player drives
    pub fn enter_vehicle(&mut self, physics: &mut dyn PhysicsBackend) {
        if let Some(pos) = physics.translation(self.body) {
            self.parked_at = Some(pos);
        }
        physics.set_linvel(self.body, Vec3::ZERO);
        physics.set_body_type(self.body, BodyType::Kinematic);
        self.flags.clear();
    }

    /// Wake the body back up where it was parked
    pub fn exit_vehicle(&mut self, physics: &mut dyn PhysicsBackend) {
        physics.set_body_type(self.body, BodyType::Dynamic);
        if let Some(pos) = self.parked_at {
            physics.set_translation(self.body, pos);
        }
    }
}
