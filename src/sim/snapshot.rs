//! Per-frame render snapshot
//!
//! Everything the page needs to draw a frame, serialized to JSON and handed
//! across the wasm boundary once per animation frame.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::bomb::BombVisual;
use super::camera::Camera;
use super::lattice::{BlockType, LatticeCoord};
use super::player::PlayerPose;
use super::state::{BlockKey, ModeFlags};
use super::vehicle::VehicleView;
use crate::Settings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockView {
    /// Unique per block; send it back in pointer hits
    pub key: BlockKey,
    /// "x-y-z" id of the cell the block was placed in
    pub id: String,
    pub coord: LatticeCoord,
    pub kind: BlockType,
    /// Side color (hex RGB)
    pub color: u32,
    pub top_color: Option<u32>,
    pub position: Vec3,
    pub rotation: Quat,
    pub dynamic: bool,
}

/// Selection bar slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub kind: BlockType,
    pub name: String,
    pub color: u32,
}

impl PaletteEntry {
    pub fn all() -> Vec<Self> {
        BlockType::PALETTE
            .iter()
            .map(|&kind| Self {
                kind,
                name: kind.display_name().to_string(),
                color: kind.color(),
            })
            .collect()
    }
}

/// User preferences the renderer applies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Vertical field of view (degrees)
    pub field_of_view: f32,
    pub show_help: bool,
}

impl From<&Settings> for ViewSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            field_of_view: settings.field_of_view,
            show_help: settings.show_help,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BombView {
    pub id: String,
    pub position: Vec3,
    pub visual: BombVisual,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub position: Vec3,
    pub pose: PlayerPose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub time: f64,
    pub mode: ModeFlags,
    pub selected_block_type: BlockType,
    /// Show the "press V" prompt
    pub can_enter_car: bool,
    pub camera: Camera,
    pub view: ViewSettings,
    pub palette: Vec<PaletteEntry>,
    pub player: Option<PlayerView>,
    pub car: Option<VehicleView>,
    pub blocks: Vec<BlockView>,
    pub bombs: Vec<BombView>,
}

impl FrameSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
