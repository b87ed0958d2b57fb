//! Arcade car
//!
//! The car keeps its own scalar `speed` and `heading` and writes them into
//! the body every frame. Vertical motion stays with the physics backend.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::camera::Camera;
use super::input::{Key, MoveFlags};
use super::physics::{BodyDesc, BodyHandle, PhysicsBackend, RotationLock, Shape};
use super::state::ModeFlags;
use crate::tuning::VehicleTuning;

/// Render-facing car transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleView {
    pub position: Vec3,
    pub rotation: Quat,
    pub speed: f32,
    pub heading: f32,
}

#[derive(Debug, Clone)]
pub struct VehicleController {
    body: BodyHandle,
    controls: MoveFlags,
    speed: f32,
    heading: f32,
}

/// One frame of longitudinal dynamics
pub fn advance_speed(speed: f32, throttle: f32, driving: bool, tuning: &VehicleTuning, dt: f32) -> f32 {
    if !driving {
        let coasted = speed * (1.0 - tuning.drag * tuning.passive_drag_factor * dt).max(0.0);
        return if coasted.abs() < tuning.passive_stop_threshold {
            0.0
        } else {
            coasted
        };
    }

    let speed = if throttle != 0.0 {
        let accel = if throttle > 0.0 {
            tuning.acceleration
        } else {
            tuning.acceleration * tuning.reverse_acceleration_factor
        };
        speed + throttle * accel * dt
    } else {
        let dragged = speed * (1.0 - tuning.drag * dt).max(0.0);
        if dragged.abs() < tuning.stop_threshold {
            0.0
        } else {
            dragged
        }
    };
    speed.clamp(-tuning.max_speed * tuning.reverse_speed_factor, tuning.max_speed)
}

/// One frame of steering. Steering scales with speed, flips in reverse and
/// is dead below `min_turn_speed`.
pub fn advance_heading(heading: f32, speed: f32, steer: f32, tuning: &VehicleTuning, dt: f32) -> f32 {
    if steer == 0.0 || speed.abs() <= tuning.min_turn_speed {
        return heading;
    }
    let speed_factor = (speed.abs() / tuning.max_speed).min(1.0);
    let sense = if speed >= 0.0 { 1.0 } else { -1.0 };
    heading + steer * tuning.turn_rate * dt * speed_factor * sense
}

impl VehicleController {
    pub fn spawn(physics: &mut dyn PhysicsBackend, tuning: &VehicleTuning) -> Self {
        let desc = BodyDesc::dynamic(
            Shape::Cuboid {
                half_extents: Vec3::from_array(tuning.half_extents),
            },
            Vec3::from_array(tuning.spawn),
        )
        .with_mass(tuning.mass)
        .with_linear_damping(tuning.linear_damping)
        .with_friction(tuning.friction)
        .with_rotation_lock(RotationLock::YawOnly);
        Self {
            body: physics.create_body(desc),
            controls: MoveFlags::default(),
            speed: 0.0,
            heading: 0.0,
        }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn controls(&self) -> MoveFlags {
        self.controls
    }

    /// Forward vector for the current heading
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.heading.sin(), 0.0, self.heading.cos())
    }

    /// Steering keys while someone is driving
    pub fn key(&mut self, key: Key, down: bool, mode: ModeFlags) {
        if !mode.driving || (down && !mode.playing) {
            return;
        }
        if matches!(key, Key::Forward | Key::Backward | Key::Left | Key::Right) {
            self.controls.set(key, down);
        }
    }

    pub fn clear_controls(&mut self) {
        self.controls.clear();
    }

    /// Whether the camera is close enough to climb in
    pub fn can_enter(&self, camera: &Camera, physics: &dyn PhysicsBackend, tuning: &VehicleTuning) -> bool {
        physics.translation(self.body).is_some_and(|pos| {
            let seat = pos + Vec3::Y * tuning.enter_height;
            camera.position.distance(seat) < tuning.enter_distance
        })
    }

    pub fn update(
        &mut self,
        physics: &mut dyn PhysicsBackend,
        camera: &mut Camera,
        driving: bool,
        tuning: &VehicleTuning,
        dt: f32,
    ) {
        let Some(vel) = physics.linvel(self.body) else {
            return;
        };

        self.speed = advance_speed(self.speed, self.controls.throttle(), driving, tuning, dt);
        if driving {
            self.heading = advance_heading(self.heading, self.speed, self.controls.steer(), tuning, dt);
        }

        let forward = self.forward();
        physics.set_linvel(
            self.body,
            Vec3::new(forward.x * self.speed, vel.y, forward.z * self.speed),
        );
        physics.set_rotation(self.body, Quat::from_axis_angle(Vec3::Y, self.heading));

        if driving {
            if let Some(pos) = physics.translation(self.body) {
                self.follow(camera, pos, tuning);
            }
        }
    }

    /// Chase camera behind and above the car, aimed just over the roof
    fn follow(&self, camera: &mut Camera, car: Vec3, tuning: &VehicleTuning) {
        let target = car + Vec3::Y * tuning.camera_target_height;
        let offset = Quat::from_axis_angle(Vec3::Y, self.heading) * Vec3::from_array(tuning.camera_offset);
        camera.position = Vec3::new(target.x - offset.x, target.y + offset.y, target.z - offset.z);
        camera.look_at(target);
    }

    pub fn view(&self, physics: &dyn PhysicsBackend) -> Option<VehicleView> {
        Some(VehicleView {
            position: physics.translation(self.body)?,
            rotation: physics.rotation(self.body)?,
            speed: self.speed,
            heading: self.heading,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::RapierPhysics;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn driving() -> ModeFlags {
        ModeFlags {
            playing: true,
            driving: true,
        }
    }

    #[test]
    fn full_throttle_reaches_top_speed_and_stops_there() {
        let tuning = VehicleTuning::default();
        let mut speed = 0.0;
        for _ in 0..120 {
            speed = advance_speed(speed, 1.0, true, &tuning, DT);
        }
        assert_eq!(speed, 18.0);
    }

    #[test]
    fn reverse_is_capped_at_half() {
        let tuning = VehicleTuning::default();
        let mut speed = 0.0;
        for _ in 0..300 {
            speed = advance_speed(speed, -1.0, true, &tuning, DT);
        }
        assert_eq!(speed, -9.0);
    }

    #[test]
    fn reverse_accelerates_slower() {
        let tuning = VehicleTuning::default();
        let fwd = advance_speed(0.0, 1.0, true, &tuning, DT);
        let rev = advance_speed(0.0, -1.0, true, &tuning, DT);
        assert!((rev.abs() - fwd * 0.6).abs() < 1e-6);
    }

    #[test]
    fn abandoned_car_coasts_to_rest() {
        let tuning = VehicleTuning::default();
        let mut speed = 10.0;
        let mut frames = 0;
        while speed != 0.0 {
            let next = advance_speed(speed, 0.0, false, &tuning, DT);
            assert!(next.abs() < speed.abs());
            speed = next;
            frames += 1;
            assert!(frames < 1000);
        }
        // Passive drag is half the driven drag, so coasting takes longer
        let mut driven = 10.0;
        let mut driven_frames = 0;
        while driven != 0.0 {
            driven = advance_speed(driven, 0.0, true, &tuning, DT);
            driven_frames += 1;
        }
        assert!(frames > driven_frames);
    }

    #[test]
    fn slow_speed_snaps_to_zero() {
        let tuning = VehicleTuning::default();
        assert_eq!(advance_speed(0.09, 0.0, true, &tuning, DT), 0.0);
        assert_eq!(advance_speed(0.04, 0.0, false, &tuning, DT), 0.0);
        assert!(advance_speed(0.09, 0.0, false, &tuning, DT) > 0.0);
    }

    #[test]
    fn long_frame_of_drag_stops_the_car() {
        let tuning = VehicleTuning::default();
        // Drag 4 over a quarter second leaves nothing
        assert_eq!(advance_speed(10.0, 0.0, true, &tuning, 0.25), 0.0);
    }

    #[test]
    fn steering_reverses_in_reverse_gear() {
        let tuning = VehicleTuning::default();
        let fwd = advance_heading(0.0, 9.0, 1.0, &tuning, DT);
        let rev = advance_heading(0.0, -9.0, 1.0, &tuning, DT);
        assert!(fwd > 0.0);
        assert!((fwd + rev).abs() < 1e-7);
        // Half of max speed turns at half rate
        assert!((fwd - 1.8 * DT * 0.5).abs() < 1e-6);
    }

    #[test]
    fn body_velocity_follows_heading() {
        let mut physics = RapierPhysics::new(Vec3::ZERO);
        let tuning = VehicleTuning::default();
        let mut car = VehicleController::spawn(&mut physics, &tuning);
        let mut camera = Camera::default();
        car.key(Key::Forward, true, driving());
        car.update(&mut physics, &mut camera, true, &tuning, DT);
        let v = physics.linvel(car.body()).unwrap();
        // Heading 0 drives along +Z
        assert!(v.x.abs() < 1e-6);
        assert!((v.z - 28.0 * DT).abs() < 1e-5);
    }

    #[test]
    fn follow_camera_sits_behind_the_car() {
        let mut physics = RapierPhysics::new(Vec3::ZERO);
        let tuning = VehicleTuning::default();
        let mut car = VehicleController::spawn(&mut physics, &tuning);
        let mut camera = Camera::default();
        car.update(&mut physics, &mut camera, true, &tuning, DT);
        let pos = physics.translation(car.body()).unwrap();
        let expected = pos + Vec3::new(0.0, 0.8 + 2.5, -6.0);
        assert!((camera.position - expected).length() < 1e-4);
        assert!(camera.forward().z > 0.0);
    }

    #[test]
    fn enter_range_is_measured_from_the_seat() {
        let mut physics = RapierPhysics::new(Vec3::ZERO);
        let tuning = VehicleTuning::default();
        let car = VehicleController::spawn(&mut physics, &tuning);
        let seat = Vec3::new(2.0, 1.5, -6.0);
        let near = Camera {
            position: seat + Vec3::X * 3.9,
            ..Camera::default()
        };
        let far = Camera {
            position: seat + Vec3::X * 4.0,
            ..Camera::default()
        };
        assert!(car.can_enter(&near, &physics, &tuning));
        assert!(!car.can_enter(&far, &physics, &tuning));
    }

    #[test]
    fn keys_ignored_on_foot() {
        let mut physics = RapierPhysics::new(Vec3::ZERO);
        let tuning = VehicleTuning::default();
        let mut car = VehicleController::spawn(&mut physics, &tuning);
        car.key(Key::Forward, true, ModeFlags { playing: true, driving: false });
        assert_eq!(car.controls(), MoveFlags::default());
        car.key(Key::Jump, true, driving());
        assert_eq!(car.controls(), MoveFlags::default());
    }

    proptest! {
        #[test]
        fn speed_stays_in_range(
            start in -9.0f32..18.0,
            inputs in prop::collection::vec((-1i8..=1, any::<bool>()), 1..200),
        ) {
            let tuning = VehicleTuning::default();
            let mut speed = start;
            for (throttle, driving) in inputs {
                speed = advance_speed(speed, throttle as f32, driving, &tuning, DT);
                prop_assert!((-9.0..=18.0).contains(&speed));
            }
        }

        #[test]
        fn no_turning_near_standstill(speed in -0.25f32..=0.25, steer in -1i8..=1, heading in -3.0f32..3.0) {
            let tuning = VehicleTuning::default();
            prop_assert_eq!(advance_heading(heading, speed, steer as f32, &tuning, DT), heading);
        }
    }
}
