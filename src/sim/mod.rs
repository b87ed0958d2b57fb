//! Frame simulation
//!
//! All gameplay logic lives here, free of DOM and rendering concerns:
//! - Explicit `WorldState` passed to each controller
//! - Fixed per-frame update order (see [`tick`])
//! - Stable iteration order (lattice coordinate, block key, throw order, body handle)
//! - Physics behind the [`PhysicsBackend`] seam

pub mod block;
pub mod bomb;
pub mod camera;
pub mod input;
pub mod lattice;
pub mod layout;
pub mod physics;
pub mod player;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod vehicle;

pub use block::BlockController;
pub use bomb::{BombController, BombPhase, BombVisual};
pub use camera::Camera;
pub use input::{BlockHit, InputEvent, Key, MoveFlags, PointerButton};
pub use lattice::{BlockType, LatticeCoord};
pub use layout::generate_layout;
pub use physics::{BodyDesc, BodyHandle, BodyType, PhysicsBackend, RapierPhysics, RotationLock, Shape};
pub use player::{PlayerController, PlayerPose};
pub use snapshot::{BlockView, FrameSnapshot, PaletteEntry, ViewSettings};
pub use state::{
    Block, BlockKey, BlockPhase, Bomb, BombId, EventCursor, ExplosionEvent, ExplosionId, ExplosionQueue,
    ModeFlags, WorldState,
};
pub use tick::Game;
pub use vehicle::{VehicleController, VehicleView, advance_heading, advance_speed};
