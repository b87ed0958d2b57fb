//! Input commands
//!
//! Browser callbacks translate DOM events into [`InputEvent`]s. The frame
//! drains them in arrival order before anything else runs.

use glam::IVec3;
use serde::{Deserialize, Serialize};

use super::lattice::{BlockType, LatticeCoord};
use super::state::BlockKey;

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
    Sprint,
    /// Enter/exit the car
    ToggleVehicle,
    /// Palette slot 0-4
    Select(u8),
}

impl Key {
    /// Map a `KeyboardEvent.code` value
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "KeyW" | "ArrowUp" => Some(Key::Forward),
            "KeyS" | "ArrowDown" => Some(Key::Backward),
            "KeyA" | "ArrowLeft" => Some(Key::Left),
            "KeyD" | "ArrowRight" => Some(Key::Right),
            "Space" => Some(Key::Jump),
            "ShiftLeft" => Some(Key::Sprint),
            "KeyV" => Some(Key::ToggleVehicle),
            "Digit1" => Some(Key::Select(0)),
            "Digit2" => Some(Key::Select(1)),
            "Digit3" => Some(Key::Select(2)),
            "Digit4" => Some(Key::Select(3)),
            "Digit5" => Some(Key::Select(4)),
            _ => None,
        }
    }

    /// Whether the browser default action should be suppressed
    pub fn prevents_default(&self) -> bool {
        matches!(self, Key::Jump | Key::ToggleVehicle)
    }
}

/// Held movement keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveFlags {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub sprint: bool,
}

impl MoveFlags {
    /// Update the flag bound to `key`; returns false for non-movement keys
    pub fn set(&mut self, key: Key, held: bool) -> bool {
        match key {
            Key::Forward => self.forward = held,
            Key::Backward => self.backward = held,
            Key::Left => self.left = held,
            Key::Right => self.right = held,
            Key::Jump => self.jump = held,
            Key::Sprint => self.sprint = held,
            _ => return false,
        }
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// +1 forward, -1 backward
    pub fn throttle(&self) -> f32 {
        axis(self.forward, self.backward)
    }

    /// +1 left, -1 right
    pub fn steer(&self) -> f32 {
        axis(self.left, self.right)
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    (positive as i32 - negative as i32) as f32
}

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    /// Left click: throw a bomb, break the targeted block
    Primary,
    /// Right click / context menu: place a block
    Secondary,
}

impl PointerButton {
    /// Map `MouseEvent.button`
    pub fn from_dom(button: i16) -> Option<Self> {
        match button {
            0 => Some(PointerButton::Primary),
            2 => Some(PointerButton::Secondary),
            _ => None,
        }
    }
}

/// Block under the crosshair as reported by the renderer's ray cast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHit {
    pub coord: LatticeCoord,
    /// Outward normal of the face that was hit
    pub normal: IVec3,
    /// Key of the block mesh that was hit, when the renderer knows it
    pub block: Option<BlockKey>,
}

impl BlockHit {
    pub fn cell(coord: LatticeCoord, normal: IVec3) -> Self {
        Self {
            coord,
            normal,
            block: None,
        }
    }

    /// Decode the `[x, y, z, nx, ny, nz]` or `[x, y, z, nx, ny, nz, key]`
    /// array the page sends; anything else is a miss
    pub fn from_slice(hit: &[i32]) -> Option<Self> {
        match *hit {
            [x, y, z, nx, ny, nz] => Some(Self::cell(LatticeCoord::new(x, y, z), IVec3::new(nx, ny, nz))),
            [x, y, z, nx, ny, nz, key] => Some(Self {
                block: u64::try_from(key).ok().map(BlockKey),
                ..Self::cell(LatticeCoord::new(x, y, z), IVec3::new(nx, ny, nz))
            }),
            _ => None,
        }
    }
}

/// One input occurrence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Pointer-locked movement in pixels
    MouseMove { dx: f32, dy: f32 },
    Pointer {
        button: PointerButton,
        hit: Option<BlockHit>,
    },
    PointerLock(bool),
    SelectBlockType(BlockType),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_keys_alias_wasd() {
        assert_eq!(Key::from_code("ArrowUp"), Key::from_code("KeyW"));
        assert_eq!(Key::from_code("ArrowLeft"), Some(Key::Left));
        assert_eq!(Key::from_code("KeyQ"), None);
        assert_eq!(Key::from_code("Digit3"), Some(Key::Select(2)));
    }

    #[test]
    fn hit_arrays() {
        assert_eq!(BlockHit::from_slice(&[]), None);
        let hit = BlockHit::from_slice(&[1, 2, 3, 0, 1, 0]).unwrap();
        assert_eq!(hit.coord, LatticeCoord::new(1, 2, 3));
        assert_eq!(hit.normal, IVec3::Y);
        assert_eq!(hit.block, None);
        let keyed = BlockHit::from_slice(&[1, 2, 3, 0, 1, 0, 42]).unwrap();
        assert_eq!(keyed.block, Some(BlockKey(42)));
        assert_eq!(BlockHit::from_slice(&[1, 2, 3, 0, 1, 0, -1]).unwrap().block, None);
    }

    #[test]
    fn axes() {
        let mut flags = MoveFlags::default();
        assert_eq!(flags.throttle(), 0.0);
        flags.set(Key::Forward, true);
        assert_eq!(flags.throttle(), 1.0);
        flags.set(Key::Backward, true);
        assert_eq!(flags.throttle(), 0.0);
        flags.set(Key::Right, true);
        assert_eq!(flags.steer(), -1.0);
        assert!(!flags.set(Key::ToggleVehicle, true));
        flags.clear();
        assert_eq!(flags, MoveFlags::default());
    }
}
