//! Voxel Craft - a first-person voxel sandbox
//!
//! Core modules:
//! - `sim`: Frame simulation (world state, entity controllers, physics seam)
//! - `platform`: Browser/native frame pacing
//! - `settings`: Persisted user preferences
//! - `tuning`: Data-driven gameplay constants

pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::{ConfigError, Settings};
pub use tuning::Tuning;

use glam::Vec3;

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World gravity (units/s² along Y)
    pub const GRAVITY: f32 = -20.0;

    /// Half extent of the ground slab along X and Z
    pub const GROUND_HALF_SIZE: f32 = 20.0;
    /// Ground slab thickness (top face sits at y = 0)
    pub const GROUND_THICKNESS: f32 = 1.0;

    /// Half extent of a voxel block
    pub const BLOCK_HALF_EXTENT: f32 = 0.5;
}

/// Horizontal (XZ) component of a vector
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Linear falloff of blast strength: 1 at the center, 0 at the radius
#[inline]
pub fn blast_falloff(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 || distance >= radius {
        0.0
    } else {
        1.0 - distance / radius
    }
}
