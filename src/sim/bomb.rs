//! Bomb lifecycle
//!
//! `Flying → Armed → Detonating → Removed`. A bomb is Flying for the frame it
//! is thrown, Armed while its fuse burns, Detonating while the blast plays.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::physics::{BodyDesc, BodyHandle, PhysicsBackend, Shape};
use super::state::{Bomb, BombId, ExplosionId, WorldState};
use crate::tuning::BombTuning;

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BombPhase {
    /// Launched, initial velocity not yet observed by a frame
    Flying,
    /// Fuse burning
    Armed,
    /// Blast animation playing
    Detonating { timer: f32, explosion: ExplosionId },
    /// Removal requested
    Removed,
}

/// Render-facing look of a bomb this frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BombVisual {
    /// Fuse spark lit
    pub blink: bool,
    pub scale: f32,
    pub opacity: f32,
    pub light_intensity: f32,
}

/// Per-bomb controller
#[derive(Debug, Clone)]
pub struct BombController {
    pub id: BombId,
    body: BodyHandle,
    lifetime: f32,
    phase: BombPhase,
}

impl BombController {
    /// Create the bomb's body and launch it
    pub fn spawn(bomb: &Bomb, physics: &mut dyn PhysicsBackend, tuning: &BombTuning) -> Self {
        let desc = BodyDesc::dynamic(Shape::Ball { radius: tuning.radius }, bomb.position)
            .with_mass(tuning.mass)
            .with_gravity_scale(tuning.gravity_scale)
            .with_restitution(tuning.restitution)
            .with_linvel(bomb.direction * tuning.throw_speed);
        let body = physics.create_body(desc);
        Self {
            id: bomb.id.clone(),
            body,
            lifetime: 0.0,
            phase: BombPhase::Flying,
        }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn phase(&self) -> BombPhase {
        self.phase
    }

    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    /// Advance the fuse or the blast. Emits the explosion and requests
    /// removal through `world`.
    pub fn update(
        &mut self,
        world: &mut WorldState,
        physics: &dyn PhysicsBackend,
        tuning: &BombTuning,
        dt: f32,
    ) {
        if self.phase == BombPhase::Removed {
            return;
        }
        let Some(position) = physics.translation(self.body) else {
            return;
        };

        self.lifetime += dt;

        match self.phase {
            BombPhase::Flying | BombPhase::Armed => {
                self.phase = BombPhase::Armed;
                if self.lifetime >= tuning.fuse_time {
                    self.detonate(world, position, tuning);
                }
            }
            BombPhase::Detonating { timer, explosion } => {
                let timer = timer + dt;
                if timer > tuning.explosion_duration {
                    world.remove_bomb(&self.id);
                    self.phase = BombPhase::Removed;
                } else {
                    self.phase = BombPhase::Detonating { timer, explosion };
                }
            }
            BombPhase::Removed => {}
        }
    }

    /// Blast clock starts at zero and first advances on the next frame
    fn detonate(&mut self, world: &mut WorldState, position: Vec3, tuning: &BombTuning) {
        let explosion = world.trigger_explosion(position, tuning.blast_force, tuning.blast_radius);
        log::debug!(
            "{} detonated at ({:.2}, {:.2}, {:.2})",
            self.id.0,
            position.x,
            position.y,
            position.z
        );
        self.phase = BombPhase::Detonating {
            timer: 0.0,
            explosion,
        };
    }

    pub fn visual(&self, tuning: &BombTuning) -> BombVisual {
        let blast = |t: f32| BombVisual {
            blink: false,
            scale: (t * 10.0).min(tuning.max_explosion_scale),
            opacity: (1.0 - t * 2.0).clamp(0.0, 1.0),
            light_intensity: (10.0 * (1.0 - t * 2.0)).max(0.0),
        };
        match self.phase {
            BombPhase::Detonating { timer, .. } => blast(timer),
            BombPhase::Removed => blast(tuning.explosion_duration),
            BombPhase::Flying | BombPhase::Armed => BombVisual {
                blink: (self.lifetime * tuning.blink_rate).sin() > 0.0,
                scale: 1.0,
                opacity: 1.0,
                light_intensity: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::RapierPhysics;

    const DT: f32 = 1.0 / 60.0;

    fn setup() -> (WorldState, RapierPhysics, BombController, BombTuning) {
        let mut world = WorldState::new(1, 0.3);
        // No gravity: the bomb keeps flying so position checks are exact
        let mut physics = RapierPhysics::new(Vec3::ZERO);
        let tuning = BombTuning::default();
        world.throw_bomb(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Z);
        let bomb = world.bombs()[0].clone();
        let ctrl = BombController::spawn(&bomb, &mut physics, &tuning);
        (world, physics, ctrl, tuning)
    }

    #[test]
    fn launch_velocity_is_direction_times_throw_speed() {
        let (_, physics, ctrl, _) = setup();
        assert_eq!(physics.linvel(ctrl.body()), Some(Vec3::new(0.0, 0.0, -15.0)));
    }

    #[test]
    fn detonates_once_and_removes_after_animation() {
        let (mut world, mut physics, mut ctrl, tuning) = setup();
        let mut detonated_at = None;
        let mut removed_at = None;
        let mut t = 0.0f32;

        for _ in 0..(4.0 / DT) as usize {
            ctrl.update(&mut world, &physics, &tuning, DT);
            physics.step(DT);
            t += DT;
            if detonated_at.is_none() && matches!(ctrl.phase(), BombPhase::Detonating { .. }) {
                detonated_at = Some(t);
            }
            if removed_at.is_none() && ctrl.phase() == BombPhase::Removed {
                removed_at = Some(t);
            }
        }

        let detonated_at = detonated_at.expect("bomb never detonated");
        let removed_at = removed_at.expect("bomb never removed");
        assert!(detonated_at >= tuning.fuse_time);
        assert!(detonated_at < tuning.fuse_time + 2.0 * DT);
        assert!(removed_at >= tuning.fuse_time + tuning.explosion_duration);
        // One event, even though the bomb kept ticking
        assert_eq!(world.explosions.len(), 1);
        assert!(world.bombs().is_empty());
    }

    #[test]
    fn explosion_uses_body_position_at_detonation() {
        let (mut world, mut physics, mut ctrl, tuning) = setup();
        let mut expected = Vec3::ZERO;
        while matches!(ctrl.phase(), BombPhase::Flying | BombPhase::Armed) {
            expected = physics.translation(ctrl.body()).unwrap();
            ctrl.update(&mut world, &physics, &tuning, DT);
            physics.step(DT);
        }
        let event = world.explosions.events()[0];
        assert_eq!(event.position, expected);
        assert_eq!(event.force, 20.0);
        assert_eq!(event.radius, 8.0);
        assert!(event.position.z < -25.0);
    }

    #[test]
    fn missing_body_freezes_the_fuse() {
        let (mut world, mut physics, mut ctrl, tuning) = setup();
        physics.remove_body(ctrl.body());
        ctrl.update(&mut world, &physics, &tuning, 5.0);
        assert_eq!(ctrl.lifetime(), 0.0);
        assert!(world.explosions.is_empty());
    }

    #[test]
    fn blast_visual_grows_and_fades() {
        let (mut world, physics, mut ctrl, tuning) = setup();
        ctrl.update(&mut world, &physics, &tuning, 2.0);
        let start = ctrl.visual(&tuning);
        ctrl.update(&mut world, &physics, &tuning, 0.2);
        let mid = ctrl.visual(&tuning);
        assert_eq!(start.scale, 0.0);
        assert!((mid.scale - 2.0).abs() < 1e-5);
        assert!((mid.opacity - 0.6).abs() < 1e-5);
        ctrl.update(&mut world, &physics, &tuning, 0.2);
        assert_eq!(ctrl.visual(&tuning).scale, 3.0);
    }
}
