//! Voxel blast response
//!
//! Every block starts as a fixed body. The first blast that reaches it turns
//! it into a dynamic body for good, and every blast in range pushes it away
//! from the center with a little lift.

use glam::Vec3;

use super::lattice::LatticeCoord;
use super::physics::{BodyDesc, BodyHandle, BodyType, PhysicsBackend, Shape};
use super::state::{Block, BlockKey, BlockPhase, EventCursor, WorldState};
use crate::consts::BLOCK_HALF_EXTENT;
use crate::tuning::BlockTuning;

/// Per-block controller
#[derive(Debug, Clone)]
pub struct BlockController {
    pub key: BlockKey,
    /// Cell the block was placed in
    pub coord: LatticeCoord,
    body: BodyHandle,
    phase: BlockPhase,
    /// Blasts older than this block's mount are not its business
    cursor: EventCursor,
}

impl BlockController {
    /// Body matches the record: fixed in its cell, or already loose
    pub fn spawn(
        block: &Block,
        world: &WorldState,
        physics: &mut dyn PhysicsBackend,
        tuning: &BlockTuning,
    ) -> Self {
        let shape = Shape::Cuboid {
            half_extents: Vec3::splat(BLOCK_HALF_EXTENT),
        };
        let center = block.coord.center();
        let desc = match block.phase {
            BlockPhase::Fixed => BodyDesc::fixed(shape, center),
            BlockPhase::Dynamic => BodyDesc::dynamic(shape, center).with_mass(tuning.dynamic_mass),
        };
        Self {
            key: block.key,
            coord: block.coord,
            body: physics.create_body(desc),
            phase: block.phase,
            cursor: world.explosions.head(),
        }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn phase(&self) -> BlockPhase {
        self.phase
    }

    /// Switch the body to dynamic for good and release the cell
    pub fn promote(
        &mut self,
        world: &mut WorldState,
        physics: &mut dyn PhysicsBackend,
        tuning: &BlockTuning,
    ) {
        if self.phase == BlockPhase::Dynamic {
            return;
        }
        self.phase = BlockPhase::Dynamic;
        physics.set_body_type(self.body, BodyType::Dynamic);
        physics.set_mass(self.body, tuning.dynamic_mass);
        if world.block(self.coord).is_some_and(|b| b.key == self.key) {
            world.make_block_dynamic(self.coord);
        }
        log::debug!("Block {} knocked loose", self.coord);
    }

    /// Apply every blast this block has not seen yet
    pub fn apply_explosions(
        &mut self,
        world: &mut WorldState,
        physics: &mut dyn PhysicsBackend,
        tuning: &BlockTuning,
    ) {
        let Some(position) = physics.translation(self.body) else {
            return;
        };
        let fresh = world.explosions.drain_since(&mut self.cursor);

        let mut total = Vec3::ZERO;
        let mut hit = false;
        for event in &fresh {
            if let Some(impulse) = event.impulse_at(position) {
                total += impulse + Vec3::Y * tuning.blast_lift;
                hit = true;
            }
        }
        if !hit {
            return;
        }

        self.promote(world, physics, tuning);
        physics.apply_impulse(self.body, total);
    }
}
