//! World state and entity records
//!
//! `WorldState` is the single store every controller reads and mutates. The
//! controllers keep only per-body scratch state; records live here.

use std::collections::BTreeMap;

use glam::{IVec3, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::lattice::{BlockType, LatticeCoord};

/// Physics mode of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockPhase {
    /// Part of the static world
    #[default]
    Fixed,
    /// Knocked loose by a blast; never goes back
    Dynamic,
}

/// Identity of one placed block for the life of a world. A cell that is
/// emptied and refilled holds a block with a new key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BlockKey(pub u64);

/// A voxel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Assigned by [`WorldState`] on insertion
    pub key: BlockKey,
    /// Cell the block was placed in
    pub coord: LatticeCoord,
    pub kind: BlockType,
    pub phase: BlockPhase,
}

impl Block {
    pub fn new(coord: LatticeCoord, kind: BlockType) -> Self {
        Self {
            key: BlockKey::default(),
            coord,
            kind,
            phase: BlockPhase::Fixed,
        }
    }

    pub fn id(&self) -> String {
        self.coord.id()
    }

    pub fn is_dynamic(&self) -> bool {
        self.phase == BlockPhase::Dynamic
    }
}

/// Bomb identifier ("bomb-<ms>-<token>")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BombId(pub String);

/// A thrown bomb as recorded at throw time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bomb {
    pub id: BombId,
    pub position: Vec3,
    /// Unit throw direction
    pub direction: Vec3,
}

/// Monotonically increasing explosion id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExplosionId(pub u64);

/// A blast broadcast to everything in range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplosionEvent {
    pub id: ExplosionId,
    pub position: Vec3,
    pub force: f32,
    pub radius: f32,
}

impl ExplosionEvent {
    /// Impulse (before any lift) on something at `target`, or `None` when
    /// outside the radius. Magnitude is `force × (1 − d/r)`.
    pub fn impulse_at(&self, target: Vec3) -> Option<Vec3> {
        let offset = target - self.position;
        let distance = offset.length();
        if distance >= self.radius {
            return None;
        }
        let magnitude = self.force * crate::blast_falloff(distance, self.radius);
        Some(offset.normalize_or_zero() * magnitude)
    }
}

/// Smallest explosion id a consumer has not processed yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventCursor(pub u64);

/// Shared explosion queue.
///
/// Consumers read with a cursor so each event reaches each consumer at most
/// once. The time window only bounds how long events stay queued: the whole
/// queue is dropped `window` seconds after the latest emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplosionQueue {
    events: Vec<ExplosionEvent>,
    next_id: u64,
    clear_at: Option<f64>,
    window: f64,
}

impl ExplosionQueue {
    pub fn new(window: f32) -> Self {
        Self {
            events: Vec::new(),
            next_id: 0,
            clear_at: None,
            window: window as f64,
        }
    }

    pub fn emit(&mut self, position: Vec3, force: f32, radius: f32, now: f64) -> ExplosionId {
        let id = ExplosionId(self.next_id);
        self.next_id += 1;
        self.events.push(ExplosionEvent {
            id,
            position,
            force,
            radius,
        });
        // Re-arm the clear deadline
        self.clear_at = Some(now + self.window);
        id
    }

    /// Cursor positioned after every event emitted so far
    pub fn head(&self) -> EventCursor {
        EventCursor(self.next_id)
    }

    /// Events at or after `cursor`; advances the cursor past them
    pub fn drain_since(&self, cursor: &mut EventCursor) -> Vec<ExplosionEvent> {
        let fresh: Vec<ExplosionEvent> = self
            .events
            .iter()
            .filter(|e| e.id.0 >= cursor.0)
            .copied()
            .collect();
        *cursor = self.head();
        fresh
    }

    /// Drop the queue once its window has passed. Returns true if cleared.
    pub fn expire(&mut self, now: f64) -> bool {
        match self.clear_at {
            Some(deadline) if now >= deadline => {
                self.events.clear();
                self.clear_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn events(&self) -> &[ExplosionEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

/// Control regime flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModeFlags {
    /// Pointer lock engaged
    pub playing: bool,
    /// Player occupies the car
    pub driving: bool,
}

/// Complete world state
#[derive(Debug, Clone)]
pub struct WorldState {
    /// Bomb id tokens
    rng: Pcg32,
    /// Sim clock (seconds)
    pub time: f64,
    /// Blocks still in their cell, at most one per cell
    cells: BTreeMap<LatticeCoord, Block>,
    /// Knocked-loose blocks in promotion order. They no longer occupy a cell.
    loose: Vec<Block>,
    next_block_key: u64,
    /// Live bombs in throw order
    bombs: Vec<Bomb>,
    pub explosions: ExplosionQueue,
    pub mode: ModeFlags,
    pub selected_block_type: BlockType,
}

impl WorldState {
    pub fn new(seed: u64, explosion_window: f32) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            time: 0.0,
            cells: BTreeMap::new(),
            loose: Vec::new(),
            next_block_key: 0,
            bombs: Vec::new(),
            explosions: ExplosionQueue::new(explosion_window),
            mode: ModeFlags::default(),
            selected_block_type: BlockType::default(),
        }
    }

    // === Blocks ===

    /// Blocks in their cells (by coordinate), then loose blocks
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.cells.values().chain(self.loose.iter())
    }

    /// Block occupying `coord`, if any
    pub fn block(&self, coord: LatticeCoord) -> Option<&Block> {
        self.cells.get(&coord)
    }

    pub fn loose_blocks(&self) -> &[Block] {
        &self.loose
    }

    pub fn block_count(&self) -> usize {
        self.cells.len() + self.loose.len()
    }

    fn keyed(&mut self, mut block: Block) -> Block {
        block.key = BlockKey(self.next_block_key);
        self.next_block_key += 1;
        block
    }

    /// Place a block into an empty cell. Occupied cells are left alone.
    pub fn add_block(&mut self, coord: LatticeCoord, kind: BlockType) -> bool {
        if self.cells.contains_key(&coord) {
            log::debug!("Cell {} occupied, placement ignored", coord);
            return false;
        }
        let block = self.keyed(Block::new(coord, kind));
        self.cells.insert(coord, block);
        true
    }

    /// Place a block, replacing whatever was in the cell
    pub fn set_block(&mut self, coord: LatticeCoord, kind: BlockType) {
        let block = self.keyed(Block::new(coord, kind));
        self.cells.insert(coord, block);
    }

    /// Place the selected material next to `coord` along a face normal
    pub fn place_adjacent(&mut self, coord: LatticeCoord, normal: IVec3) -> Option<LatticeCoord> {
        let target = coord.offset(normal);
        let kind = self.selected_block_type;
        self.add_block(target, kind).then_some(target)
    }

    /// Remove the block occupying `coord`
    pub fn remove_block(&mut self, coord: LatticeCoord) -> Option<Block> {
        self.cells.remove(&coord)
    }

    /// Remove a block wherever it is, in its cell or loose
    pub fn remove_block_by_key(&mut self, key: BlockKey) -> Option<Block> {
        if let Some(i) = self.loose.iter().position(|b| b.key == key) {
            return Some(self.loose.remove(i));
        }
        let coord = self.cells.values().find(|b| b.key == key)?.coord;
        self.cells.remove(&coord)
    }

    /// Knock the block in `coord` loose: flag it dynamic and free its cell.
    /// One-way; returns the key of the block that was released.
    pub fn make_block_dynamic(&mut self, coord: LatticeCoord) -> Option<BlockKey> {
        let mut block = self.cells.remove(&coord)?;
        block.phase = BlockPhase::Dynamic;
        let key = block.key;
        self.loose.push(block);
        Some(key)
    }

    /// Replace every block (layout generation). Later blocks win shared cells.
    pub fn replace_blocks(&mut self, blocks: impl IntoIterator<Item = Block>) {
        self.cells.clear();
        self.loose.clear();
        for block in blocks {
            let block = self.keyed(block);
            if block.is_dynamic() {
                self.loose.push(block);
            } else {
                self.cells.insert(block.coord, block);
            }
        }
    }

    // === Bombs ===

    pub fn bombs(&self) -> &[Bomb] {
        &self.bombs
    }

    pub fn throw_bomb(&mut self, position: Vec3, direction: Vec3) -> BombId {
        let millis = (self.time * 1000.0) as u64;
        let token: u32 = self.rng.random();
        let id = BombId(format!("bomb-{}-{:08x}", millis, token));
        self.bombs.push(Bomb {
            id: id.clone(),
            position,
            direction: direction.normalize_or_zero(),
        });
        id
    }

    /// Remove a bomb by id. Removing an unknown id is a no-op.
    pub fn remove_bomb(&mut self, id: &BombId) -> bool {
        let before = self.bombs.len();
        self.bombs.retain(|b| &b.id != id);
        self.bombs.len() != before
    }

    // === Explosions ===

    pub fn trigger_explosion(&mut self, position: Vec3, force: f32, radius: f32) -> ExplosionId {
        let now = self.time;
        self.explosions.emit(position, force, radius, now)
    }

    // === Modes ===

    pub fn set_playing(&mut self, playing: bool) {
        if self.mode.playing != playing {
            log::info!("Playing: {}", playing);
        }
        self.mode.playing = playing;
    }

    pub fn enter_car(&mut self) {
        self.mode.driving = true;
    }

    pub fn exit_car(&mut self) {
        self.mode.driving = false;
    }

    pub fn set_selected_block_type(&mut self, kind: BlockType) {
        self.selected_block_type = kind;
    }
}
