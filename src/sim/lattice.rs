//! Voxel lattice addressing and block materials

use std::fmt;

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Integer grid cell address of a voxel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LatticeCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl LatticeCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Neighbouring cell along a face normal
    pub fn offset(self, normal: IVec3) -> Self {
        Self::new(self.x + normal.x, self.y + normal.y, self.z + normal.z)
    }

    /// Cell center in world space
    pub fn center(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    /// Block id string ("x-y-z")
    pub fn id(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LatticeCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.x, self.y, self.z)
    }
}

/// Block materials, in palette order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    #[default]
    Grass,
    Dirt,
    Stone,
    Wood,
    Sand,
}

impl BlockType {
    /// Palette order used by the selection bar (keys 1-5)
    pub const PALETTE: [BlockType; 5] = [
        BlockType::Grass,
        BlockType::Dirt,
        BlockType::Stone,
        BlockType::Wood,
        BlockType::Sand,
    ];

    /// Palette slot (0-based)
    pub fn from_index(index: usize) -> Option<Self> {
        Self::PALETTE.get(index).copied()
    }

    /// Display name for the selection bar
    pub fn display_name(&self) -> &'static str {
        match self {
            BlockType::Grass => "Grass",
            BlockType::Dirt => "Dirt",
            BlockType::Stone => "Stone",
            BlockType::Wood => "Wood",
            BlockType::Sand => "Sand",
        }
    }

    /// Side color (hex RGB)
    pub fn color(&self) -> u32 {
        match self {
            BlockType::Grass => 0x6a9b3d,
            BlockType::Dirt => 0x8d6e63,
            BlockType::Stone => 0x757575,
            BlockType::Wood => 0xa1887f,
            BlockType::Sand => 0xfdd835,
        }
    }

    /// Top face color where it differs from the sides
    pub fn top_color(&self) -> Option<u32> {
        match self {
            BlockType::Grass => Some(0x7cb342),
            _ => None,
        }
    }
}
