//! Data-driven gameplay balance
//!
//! Every number that shapes how the game feels lives here. Defaults match
//! the shipped game; a JSON override can replace any subset of fields.

use serde::{Deserialize, Serialize};

use crate::settings::ConfigError;

/// Player locomotion and knockback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub walk_speed: f32,
    pub sprint_speed: f32,
    /// Vertical launch speed when jumping
    pub jump_speed: f32,
    /// Camera height above the body center
    pub camera_height: f32,
    /// |vy| below this counts as standing on something
    pub ground_epsilon: f32,
    /// Pitch limit in radians (symmetric)
    pub pitch_limit: f32,
    pub initial_pitch: f32,
    pub spawn: [f32; 3],
    pub mass: f32,
    pub linear_damping: f32,
    /// Capsule cylinder half height; the body stands `half height + radius` tall
    pub capsule_half_height: f32,
    pub capsule_radius: f32,
    /// Blast impulse multiplier
    pub knockback_scale: f32,
    /// Extra upward impulse when caught in a blast
    pub knockback_lift: f32,
    /// Distance ahead of the camera where thrown bombs spawn
    pub throw_offset: f32,
    /// Walk cycle phase rate at walking speed (radians/s)
    pub walk_cycle_rate: f32,
    pub leg_swing: f32,
    pub arm_swing: f32,
    pub body_bob: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            walk_speed: 5.0,
            sprint_speed: 8.0,
            jump_speed: 8.0,
            camera_height: 0.5,
            ground_epsilon: 0.1,
            pitch_limit: std::f32::consts::FRAC_PI_3,
            initial_pitch: 0.3,
            spawn: [0.0, 10.0, 0.0],
            mass: 1.0,
            linear_damping: 0.5,
            capsule_half_height: 0.5,
            capsule_radius: 0.5,
            knockback_scale: 1.5,
            knockback_lift: 12.0,
            throw_offset: 1.5,
            walk_cycle_rate: 8.0,
            leg_swing: 0.6,
            arm_swing: 0.4,
            body_bob: 0.08,
        }
    }
}

/// Arcade car handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    pub acceleration: f32,
    /// Fraction of `acceleration` used when reversing
    pub reverse_acceleration_factor: f32,
    pub max_speed: f32,
    /// Fraction of `max_speed` allowed in reverse
    pub reverse_speed_factor: f32,
    pub drag: f32,
    /// Fraction of `drag` applied when nobody is driving
    pub passive_drag_factor: f32,
    /// Speeds below this snap to zero while coasting under throttle-free drag
    pub stop_threshold: f32,
    pub passive_stop_threshold: f32,
    pub turn_rate: f32,
    /// No steering below this speed
    pub min_turn_speed: f32,
    /// Maximum camera distance from the car for entering it
    pub enter_distance: f32,
    /// Height above the car origin used for the proximity check
    pub enter_height: f32,
    pub camera_offset: [f32; 3],
    pub camera_target_height: f32,
    pub spawn: [f32; 3],
    pub mass: f32,
    pub linear_damping: f32,
    /// Tyre grip against the ground
    pub friction: f32,
    pub half_extents: [f32; 3],
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            acceleration: 28.0,
            reverse_acceleration_factor: 0.6,
            max_speed: 18.0,
            reverse_speed_factor: 0.5,
            drag: 4.0,
            passive_drag_factor: 0.5,
            stop_threshold: 0.1,
            passive_stop_threshold: 0.05,
            turn_rate: 1.8,
            min_turn_speed: 0.25,
            enter_distance: 4.0,
            enter_height: 0.5,
            camera_offset: [0.0, 2.5, 6.0],
            camera_target_height: 0.8,
            spawn: [2.0, 1.0, -6.0],
            mass: 12.0,
            linear_damping: 0.4,
            friction: 2.0,
            half_extents: [0.9, 0.7, 1.7],
        }
    }
}

/// Bomb flight and blast
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BombTuning {
    pub throw_speed: f32,
    /// Seconds from throw to detonation
    pub fuse_time: f32,
    /// Seconds the explosion animation plays before removal
    pub explosion_duration: f32,
    pub blast_force: f32,
    pub blast_radius: f32,
    pub radius: f32,
    pub mass: f32,
    pub gravity_scale: f32,
    pub restitution: f32,
    pub blink_rate: f32,
    pub max_explosion_scale: f32,
}

impl Default for BombTuning {
    fn default() -> Self {
        Self {
            throw_speed: 15.0,
            fuse_time: 2.0,
            explosion_duration: 0.5,
            blast_force: 20.0,
            blast_radius: 8.0,
            radius: 0.3,
            mass: 0.5,
            gravity_scale: 1.5,
            restitution: 0.3,
            blink_rate: 10.0,
            max_explosion_scale: 3.0,
        }
    }
}

/// Block blast response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockTuning {
    /// Mass once promoted to a dynamic body
    pub dynamic_mass: f32,
    /// Extra upward impulse when caught in a blast
    pub blast_lift: f32,
}

impl Default for BlockTuning {
    fn default() -> Self {
        Self {
            dynamic_mass: 2.0,
            blast_lift: 5.0,
        }
    }
}

/// Complete tuning table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub vehicle: VehicleTuning,
    pub bomb: BombTuning,
    pub block: BlockTuning,
    /// Seconds explosion events stay queued after the latest emission
    pub explosion_window: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            vehicle: VehicleTuning::default(),
            bomb: BombTuning::default(),
            block: BlockTuning::default(),
            explosion_window: 0.3,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override on top of the defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply an optional override, falling back to the defaults when it
    /// does not parse
    pub fn load(json: Option<&str>) -> Self {
        let Some(json) = json else {
            return Self::default();
        };
        match Self::from_json(json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring tuning overrides: {}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_values() {
        let t = Tuning::default();
        assert_eq!(t.player.walk_speed, 5.0);
        assert_eq!(t.player.sprint_speed, 8.0);
        assert_eq!(t.vehicle.max_speed, 18.0);
        assert_eq!(t.bomb.fuse_time, 2.0);
        assert_eq!(t.bomb.blast_force, 20.0);
        assert_eq!(t.bomb.blast_radius, 8.0);
        assert!((t.explosion_window - 0.3).abs() < 1e-6);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let t = Tuning::from_json(r#"{ "bomb": { "fuse_time": 3.0 } }"#).unwrap();
        assert_eq!(t.bomb.fuse_time, 3.0);
        assert_eq!(t.bomb.blast_radius, 8.0);
        assert_eq!(t.player.jump_speed, 8.0);
        assert!((t.explosion_window - 0.3).abs() < 1e-6);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Tuning::from_json("{ bomb: ").is_err());
    }

    #[test]
    fn load_falls_back_to_defaults() {
        assert_eq!(Tuning::load(None).vehicle.max_speed, 18.0);
        assert_eq!(Tuning::load(Some("{ bomb: ")).bomb.fuse_time, 2.0);
        let t = Tuning::load(Some(r#"{ "vehicle": { "max_speed": 25.0 } }"#));
        assert_eq!(t.vehicle.max_speed, 25.0);
        assert_eq!(t.vehicle.acceleration, 28.0);
    }
}
