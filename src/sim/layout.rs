//! Course layout
//!
//! A fixed parkour course from the start platform at the origin out to the
//! victory platform around x = 74, plus a few side platforms. Pure data: the
//! same blocks come out every run.

use super::lattice::{BlockType, LatticeCoord};
use super::state::Block;

/// Accumulates blocks in placement order. Later blocks in the same cell
/// replace earlier ones when loaded into a world.
#[derive(Debug, Default)]
struct Course {
    blocks: Vec<Block>,
}

impl Course {
    fn block(&mut self, x: i32, y: i32, z: i32, kind: BlockType) {
        self.blocks.push(Block::new(LatticeCoord::new(x, y, z), kind));
    }

    /// `width × depth` slab with its minimum corner at (x, y, z)
    fn platform(&mut self, x: i32, y: i32, z: i32, width: i32, depth: i32, kind: BlockType) {
        for i in 0..width {
            for j in 0..depth {
                self.block(x + i, y, z + j, kind);
            }
        }
    }

    /// Wood trunk of `trunk + 1` blocks capped by a 3×3 canopy
    fn tree(&mut self, x: i32, y: i32, z: i32, trunk: i32) {
        for i in 0..=trunk {
            self.block(x, y + i, z, BlockType::Wood);
        }
        let canopy = y + trunk + 1;
        for i in -1..=1 {
            for j in -1..=1 {
                self.block(x + i, canopy, z + j, BlockType::Grass);
            }
        }
    }

    /// Stone column with a `top × top` grass cap
    fn pillar(&mut self, x: i32, y: i32, z: i32, height: i32, top: i32) {
        for i in 0..height {
            self.block(x, y + i, z, BlockType::Stone);
        }
        let half = top / 2;
        for i in 0..top {
            for j in 0..top {
                self.block(x + i - half, y + height, z + j - half, BlockType::Grass);
            }
        }
    }
}

/// Build the course
pub fn generate_layout() -> Vec<Block> {
    use BlockType::*;

    let mut c = Course::default();

    // Start
    c.platform(-3, 0, -3, 6, 6, Grass);

    // Stepping stones
    c.platform(4, 0, -1, 2, 2, Stone);
    c.platform(7, 1, -1, 2, 2, Stone);
    c.platform(10, 2, -1, 2, 2, Stone);

    // Tree hops
    c.tree(13, 2, 0, 3);
    c.tree(16, 3, 3, 4);
    c.tree(19, 4, 0, 5);

    c.platform(22, 5, -2, 4, 4, Wood);

    // Pillars
    c.pillar(27, 5, -1, 3, 1);
    c.pillar(29, 6, 2, 4, 1);
    c.pillar(31, 7, -2, 5, 1);
    c.pillar(33, 8, 1, 6, 1);

    // Rest area
    c.platform(36, 9, -2, 5, 5, Grass);

    // Staircase
    for i in 0..8 {
        c.platform(41 + i, 9 + i, -1, 2, 2, Stone);
    }

    // High platform
    c.platform(49, 17, -3, 6, 6, Grass);
    c.tree(51, 17, 0, 3);

    // Descent
    c.platform(56, 16, -1, 2, 2, Sand);
    c.platform(59, 14, 1, 2, 2, Sand);
    c.platform(62, 12, -1, 2, 2, Sand);
    c.platform(65, 10, 0, 3, 3, Sand);

    // Final climb
    c.tree(68, 10, 1, 6);
    c.tree(71, 12, -2, 8);

    // Victory platform
    c.platform(74, 13, -4, 7, 7, Wood);
    c.tree(75, 13, -3, 2);
    c.tree(79, 13, -2, 2);

    // Side exploration
    c.platform(-8, 2, 5, 3, 3, Stone);
    c.platform(-5, 4, 9, 2, 2, Stone);
    c.tree(-4, 4, 10, 3);

    // Challenge platforms
    c.platform(15, 8, 8, 2, 2, Dirt);
    c.platform(18, 10, 11, 2, 2, Dirt);
    c.platform(40, 15, 8, 3, 3, Wood);

    c.blocks
}
