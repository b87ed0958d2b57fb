//! Frame update
//!
//! [`Game`] owns the world, the physics backend and one controller per
//! entity, and advances them in a fixed order every frame:
//! input → mount/unmount → bombs → explosions (blocks, then player) →
//! car and player → physics step → explosion expiry.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use glam::Vec3;

use super::block::BlockController;
use super::bomb::BombController;
use super::camera::Camera;
use super::input::{BlockHit, InputEvent, Key, PointerButton};
use super::lattice::{BlockType, LatticeCoord};
use super::layout::generate_layout;
use super::physics::{BodyDesc, BodyHandle, PhysicsBackend, RapierPhysics, Shape};
use super::player::PlayerController;
use super::snapshot::{BlockView, BombView, FrameSnapshot, PaletteEntry, PlayerView, ViewSettings};
use super::state::{BlockKey, BlockPhase, WorldState};
use super::vehicle::VehicleController;
use crate::consts::*;
use crate::{Settings, Tuning};

/// A running session
pub struct Game<P: PhysicsBackend = RapierPhysics> {
    world: WorldState,
    physics: P,
    tuning: Tuning,
    settings: Settings,
    camera: Camera,
    ground: BodyHandle,
    player: PlayerController,
    vehicle: VehicleController,
    blocks: BTreeMap<BlockKey, BlockController>,
    /// Throw order
    bombs: Vec<BombController>,
    inputs: VecDeque<InputEvent>,
}

impl Game<RapierPhysics> {
    pub fn new(seed: u64, tuning: Tuning, settings: Settings) -> Self {
        Self::with_backend(seed, tuning, settings, RapierPhysics::default())
    }
}

impl<P: PhysicsBackend> Game<P> {
    /// Build the course, the ground, the player and the car
    pub fn with_backend(seed: u64, tuning: Tuning, settings: Settings, mut physics: P) -> Self {
        let mut world = WorldState::new(seed, tuning.explosion_window);
        world.replace_blocks(generate_layout());

        let ground = physics.create_body(BodyDesc::fixed(
            Shape::Cuboid {
                half_extents: Vec3::new(GROUND_HALF_SIZE, GROUND_THICKNESS * 0.5, GROUND_HALF_SIZE),
            },
            Vec3::new(0.0, -GROUND_THICKNESS * 0.5, 0.0),
        ));
        let player = PlayerController::spawn(&world, &mut physics, &tuning.player);
        let vehicle = VehicleController::spawn(&mut physics, &tuning.vehicle);

        let mut game = Self {
            world,
            physics,
            tuning,
            settings,
            camera: Camera::default(),
            ground,
            player,
            vehicle,
            blocks: BTreeMap::new(),
            bombs: Vec::new(),
            inputs: VecDeque::new(),
        };
        game.mount_entities();
        log::info!(
            "World built: seed {}, {} blocks",
            seed,
            game.world.block_count()
        );
        game
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// Direct world access for tools and scripted scenarios
    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn ground(&self) -> BodyHandle {
        self.ground
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn vehicle(&self) -> &VehicleController {
        &self.vehicle
    }

    pub fn block_controller(&self, key: BlockKey) -> Option<&BlockController> {
        self.blocks.get(&key)
    }

    /// Controller of the block occupying `coord`
    pub fn block_controller_at(&self, coord: LatticeCoord) -> Option<&BlockController> {
        self.world.block(coord).and_then(|b| self.blocks.get(&b.key))
    }

    pub fn bomb_controllers(&self) -> &[BombController] {
        &self.bombs
    }

    /// Queue an input for the next frame
    pub fn push_input(&mut self, event: InputEvent) {
        self.inputs.push_back(event);
    }

    /// Advance one frame
    pub fn tick(&mut self, dt: f32) {
        let dt = dt.clamp(0.0, self.settings.max_frame_dt);
        self.world.time += dt as f64;

        while let Some(event) = self.inputs.pop_front() {
            self.handle_input(event);
        }

        self.mount_entities();

        for bomb in &mut self.bombs {
            bomb.update(&mut self.world, &self.physics, &self.tuning.bomb, dt);
        }
        // Detonated bombs removed themselves from the world above
        self.mount_entities();

        for block in self.blocks.values_mut() {
            block.apply_explosions(&mut self.world, &mut self.physics, &self.tuning.block);
        }
        self.player
            .apply_explosions(&self.world, &mut self.physics, &self.tuning.player);

        let driving = self.world.mode.driving;
        self.vehicle.update(
            &mut self.physics,
            &mut self.camera,
            driving,
            &self.tuning.vehicle,
            dt,
        );
        self.player.integrate(
            &self.world,
            &mut self.physics,
            &mut self.camera,
            &self.tuning.player,
            dt,
        );

        self.physics.step(dt);

        if self.world.explosions.expire(self.world.time) {
            log::debug!("Explosion queue cleared at t={:.3}", self.world.time);
        }
    }

    // === Input ===

    fn handle_input(&mut self, event: InputEvent) {
        let mode = self.world.mode;
        match event {
            InputEvent::KeyDown(key) => self.key_down(key),
            InputEvent::KeyUp(key) => {
                self.player.key(key, false, mode);
                self.vehicle.key(key, false, mode);
            }
            InputEvent::MouseMove { dx, dy } => {
                let (yaw, pitch) = self.settings.look_delta(dx, dy);
                self.player.look(yaw, pitch, mode, &self.tuning.player);
            }
            InputEvent::Pointer { button, hit } => self.pointer(button, hit),
            InputEvent::PointerLock(locked) => {
                self.world.set_playing(locked);
                if !locked && mode.driving {
                    self.exit_car();
                }
            }
            InputEvent::SelectBlockType(kind) => self.world.set_selected_block_type(kind),
        }
    }

    fn key_down(&mut self, key: Key) {
        let mode = self.world.mode;
        if !mode.playing {
            return;
        }
        match key {
            Key::ToggleVehicle => {
                if mode.driving {
                    self.exit_car();
                } else if self
                    .vehicle
                    .can_enter(&self.camera, &self.physics, &self.tuning.vehicle)
                {
                    self.enter_car();
                }
            }
            Key::Select(slot) => {
                if let Some(kind) = BlockType::from_index(slot as usize) {
                    self.world.set_selected_block_type(kind);
                }
            }
            _ => {
                self.player.key(key, true, mode);
                self.vehicle.key(key, true, mode);
            }
        }
    }

    fn pointer(&mut self, button: PointerButton, hit: Option<BlockHit>) {
        if !self.world.mode.playing {
            return;
        }
        match button {
            PointerButton::Primary => {
                let (origin, direction) =
                    PlayerController::throw_origin(&self.camera, &self.tuning.player);
                let id = self.world.throw_bomb(origin, direction);
                log::debug!("Threw {}", id.0);
                let removed = match hit {
                    Some(BlockHit { block: Some(key), .. }) => self.world.remove_block_by_key(key),
                    Some(hit) => self.world.remove_block(hit.coord),
                    None => None,
                };
                if let Some(block) = removed {
                    log::debug!("Broke block {}", block.id());
                }
            }
            PointerButton::Secondary => {
                // Face normals are unit lattice axes
                if let Some(hit) = hit.filter(|h| h.normal.abs().element_sum() == 1) {
                    self.world.place_adjacent(hit.coord, hit.normal);
                }
            }
        }
    }

    fn enter_car(&mut self) {
        self.world.enter_car();
        self.player.enter_vehicle(&mut self.physics);
        log::info!("Entered car");
    }

    fn exit_car(&mut self) {
        self.world.exit_car();
        self.vehicle.clear_controls();
        self.player.exit_vehicle(&mut self.physics);
        log::info!("Exited car");
    }

    // === Controllers ===

    /// Mount a controller for every new block and bomb, unmount the gone
    fn mount_entities(&mut self) {
        self.sync_block_phases();
        let world = &self.world;
        let physics = &mut self.physics;

        let live: BTreeSet<BlockKey> = world.blocks().map(|b| b.key).collect();
        self.blocks.retain(|key, ctrl| {
            let keep = live.contains(key);
            if !keep {
                physics.remove_body(ctrl.body());
            }
            keep
        });
        for block in world.blocks() {
            if !self.blocks.contains_key(&block.key) {
                let ctrl = BlockController::spawn(block, world, physics, &self.tuning.block);
                self.blocks.insert(block.key, ctrl);
            }
        }

        self.bombs.retain(|ctrl| {
            let live = world.bombs().iter().any(|b| b.id == ctrl.id);
            if !live {
                physics.remove_body(ctrl.body());
            }
            live
        });
        for bomb in world.bombs() {
            if !self.bombs.iter().any(|c| c.id == bomb.id) {
                self.bombs
                    .push(BombController::spawn(bomb, physics, &self.tuning.bomb));
            }
        }
    }

    /// Promote controllers whose record was knocked loose from outside
    fn sync_block_phases(&mut self) {
        let flagged: Vec<BlockKey> = self
            .world
            .loose_blocks()
            .iter()
            .map(|b| b.key)
            .filter(|key| {
                self.blocks
                    .get(key)
                    .is_some_and(|ctrl| ctrl.phase() == BlockPhase::Fixed)
            })
            .collect();
        for key in flagged {
            if let Some(ctrl) = self.blocks.get_mut(&key) {
                ctrl.promote(&mut self.world, &mut self.physics, &self.tuning.block);
            }
        }
    }

    // === Output ===

    pub fn snapshot(&self) -> FrameSnapshot {
        let mode = self.world.mode;
        let blocks = self
            .world
            .blocks()
            .filter_map(|block| {
                let body = self.blocks.get(&block.key)?.body();
                Some(BlockView {
                    key: block.key,
                    id: block.id(),
                    coord: block.coord,
                    kind: block.kind,
                    color: block.kind.color(),
                    top_color: block.kind.top_color(),
                    position: self.physics.translation(body)?,
                    rotation: self.physics.rotation(body)?,
                    dynamic: block.is_dynamic(),
                })
            })
            .collect();
        let bombs = self
            .bombs
            .iter()
            .filter_map(|ctrl| {
                Some(BombView {
                    id: ctrl.id.0.clone(),
                    position: self.physics.translation(ctrl.body())?,
                    visual: ctrl.visual(&self.tuning.bomb),
                })
            })
            .collect();

        FrameSnapshot {
            time: self.world.time,
            mode,
            selected_block_type: self.world.selected_block_type,
            can_enter_car: mode.playing
                && !mode.driving
                && self
                    .vehicle
                    .can_enter(&self.camera, &self.physics, &self.tuning.vehicle),
            camera: self.camera,
            view: ViewSettings::from(&self.settings),
            palette: PaletteEntry::all(),
            player: self
                .physics
                .translation(self.player.body())
                .map(|position| PlayerView {
                    position,
                    pose: self.player.pose(),
                }),
            car: self.vehicle.view(&self.physics),
            blocks,
            bombs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    fn game() -> Game {
        Game::new(12345, Tuning::default(), Settings::default())
    }

    fn playing_game() -> Game {
        let mut g = game();
        g.push_input(InputEvent::PointerLock(true));
        g.tick(SIM_DT);
        g
    }

    fn run(g: &mut Game, seconds: f32) {
        for _ in 0..(seconds / SIM_DT).round() as usize {
            g.tick(SIM_DT);
        }
    }

    #[test]
    fn test_new_game_mounts_every_block() {
        let g = game();
        assert!(g.world().block_count() > 0);
        assert_eq!(g.blocks.len(), g.world().block_count());
        // Blocks + ground + player + car
        assert_eq!(g.physics().body_count(), g.world().block_count() + 3);
    }

    #[test]
    fn test_inputs_ignored_until_pointer_locked() {
        let mut g = game();
        g.push_input(InputEvent::KeyDown(Key::Forward));
        g.push_input(InputEvent::Pointer {
            button: PointerButton::Primary,
            hit: None,
        });
        g.tick(SIM_DT);
        assert!(!g.player().flags().forward);
        assert!(g.world().bombs().is_empty());
    }

    #[test]
    fn test_primary_click_throws_and_breaks() {
        let mut g = playing_game();
        let target = LatticeCoord::new(0, 0, 0);
        let key = g.world().block(target).unwrap().key;
        let before = g.world().block_count();
        g.push_input(InputEvent::Pointer {
            button: PointerButton::Primary,
            hit: Some(BlockHit::cell(target, IVec3::Y)),
        });
        g.tick(SIM_DT);
        assert!(g.world().block(target).is_none());
        assert_eq!(g.world().block_count(), before - 1);
        assert!(g.block_controller(key).is_none());
        assert_eq!(g.world().bombs().len(), 1);
        assert_eq!(g.bomb_controllers().len(), 1);
    }

    #[test]
    fn test_primary_click_breaks_loose_block_by_key() {
        let mut g = playing_game();
        let coord = LatticeCoord::new(27, 8, -1);
        let key = g.world().block(coord).unwrap().key;
        g.world_mut().trigger_explosion(coord.center() - Vec3::X * 4.0, 20.0, 8.0);
        g.tick(SIM_DT);
        assert!(g.world().block(coord).is_none());

        let count = g.world().block_count();
        g.push_input(InputEvent::Pointer {
            button: PointerButton::Primary,
            hit: Some(BlockHit {
                block: Some(key),
                ..BlockHit::cell(coord, IVec3::Y)
            }),
        });
        g.tick(SIM_DT);
        assert_eq!(g.world().block_count(), count - 1);
        assert!(g.world().loose_blocks().iter().all(|b| b.key != key));
        assert!(g.block_controller(key).is_none());
    }

    #[test]
    fn test_externally_loosened_block_gets_dynamic_body() {
        let mut g = game();
        let coord = LatticeCoord::new(0, 0, 0);
        let key = g.world_mut().make_block_dynamic(coord).unwrap();
        g.tick(SIM_DT);
        let ctrl = g.block_controller(key).unwrap();
        assert_eq!(ctrl.phase(), BlockPhase::Dynamic);
        assert_eq!(
            g.physics().body_type(ctrl.body()),
            Some(crate::sim::physics::BodyType::Dynamic)
        );
    }

    #[test]
    fn test_secondary_click_places_selected_type() {
        let mut g = playing_game();
        g.push_input(InputEvent::KeyDown(Key::Select(3)));
        let hit = BlockHit::cell(LatticeCoord::new(0, 0, 0), IVec3::Y);
        g.push_input(InputEvent::Pointer {
            button: PointerButton::Secondary,
            hit: Some(hit),
        });
        g.tick(SIM_DT);
        let placed = LatticeCoord::new(0, 1, 0);
        assert_eq!(g.world().block(placed).unwrap().kind, BlockType::Wood);
        assert!(g.block_controller_at(placed).is_some());

        // Same face again: the cell is taken
        let count = g.world().block_count();
        g.push_input(InputEvent::Pointer {
            button: PointerButton::Secondary,
            hit: Some(BlockHit::cell(LatticeCoord::new(0, 2, 0), IVec3::NEG_Y)),
        });
        g.tick(SIM_DT);
        assert_eq!(g.world().block_count(), count);
        assert_eq!(g.world().block(placed).unwrap().kind, BlockType::Wood);
    }

    #[test]
    fn test_diagonal_normal_is_rejected() {
        let mut g = playing_game();
        let count = g.world().block_count();
        g.push_input(InputEvent::Pointer {
            button: PointerButton::Secondary,
            hit: Some(BlockHit::cell(LatticeCoord::new(0, 0, 0), IVec3::new(1, 1, 0))),
        });
        g.tick(SIM_DT);
        assert_eq!(g.world().block_count(), count);
    }

    #[test]
    fn test_car_requires_proximity() {
        let mut g = playing_game();
        g.push_input(InputEvent::KeyDown(Key::ToggleVehicle));
        g.tick(SIM_DT);
        assert!(!g.world().mode.driving);

        // Walk the player next to the car
        let car = g.physics().translation(g.vehicle().body()).unwrap();
        let body = g.player().body();
        g.physics_mut().set_translation(body, car + Vec3::X * 2.0);
        g.tick(SIM_DT);
        g.push_input(InputEvent::KeyDown(Key::ToggleVehicle));
        g.tick(SIM_DT);
        assert!(g.world().mode.driving);

        g.push_input(InputEvent::KeyDown(Key::ToggleVehicle));
        g.tick(SIM_DT);
        assert!(!g.world().mode.driving);
    }

    #[test]
    fn test_losing_pointer_lock_leaves_car() {
        let mut g = playing_game();
        let car = g.physics().translation(g.vehicle().body()).unwrap();
        let body = g.player().body();
        g.physics_mut().set_translation(body, car + Vec3::X * 2.0);
        g.tick(SIM_DT);
        g.push_input(InputEvent::KeyDown(Key::ToggleVehicle));
        g.push_input(InputEvent::KeyDown(Key::Forward));
        g.tick(SIM_DT);
        assert!(g.world().mode.driving);
        assert!(g.vehicle().controls().forward);

        g.push_input(InputEvent::PointerLock(false));
        g.tick(SIM_DT);
        assert!(!g.world().mode.playing);
        assert!(!g.world().mode.driving);
        assert!(!g.vehicle().controls().forward);
    }

    #[test]
    fn test_explosion_queue_expires() {
        let mut g = playing_game();
        g.push_input(InputEvent::Pointer {
            button: PointerButton::Primary,
            hit: None,
        });
        run(&mut g, 2.1);
        assert_eq!(g.world().explosions.len(), 1);
        run(&mut g, 0.5);
        assert!(g.world().explosions.is_empty());
        // Bomb is gone once its blast has played out
        assert!(g.world().bombs().is_empty());
        assert!(g.bomb_controllers().is_empty());
    }

    #[test]
    fn test_frame_dt_is_clamped() {
        let mut g = game();
        g.tick(5.0);
        assert!((g.world().time - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic_replay() {
        let script = |g: &mut Game| {
            g.push_input(InputEvent::PointerLock(true));
            g.push_input(InputEvent::KeyDown(Key::Forward));
            g.push_input(InputEvent::MouseMove { dx: 40.0, dy: -10.0 });
            g.tick(SIM_DT);
            g.push_input(InputEvent::Pointer {
                button: PointerButton::Primary,
                hit: None,
            });
            run(g, 3.0);
        };
        let mut a = game();
        let mut b = game();
        script(&mut a);
        script(&mut b);
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_snapshot_serializes() {
        let g = playing_game();
        let json = g.snapshot().to_json().unwrap();
        assert!(json.contains("\"blocks\""));
        assert!(json.contains("\"0-0-0\""));
        assert!(json.contains("\"field_of_view\":75.0"));
        let snap = g.snapshot();
        assert_eq!(snap.palette.len(), 5);
        let grass = snap.blocks.iter().find(|b| b.id == "0-0-0").unwrap();
        assert_eq!(grass.top_color, Some(0x7cb342));
    }
}
