//! Voxel Craft entry point
//!
//! The browser build exposes a `VoxelCraft` handle to the page script, which
//! draws the snapshot it gets back each frame and ray casts clicks against
//! the blocks. The native build plays a short scripted session and logs it.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{KeyboardEvent, MouseEvent};

    use voxel_craft::consts::SIM_DT;
    use voxel_craft::platform::FrameClock;
    use voxel_craft::sim::{BlockHit, BlockType, Game, InputEvent, Key, PointerButton};
    use voxel_craft::{Settings, Tuning};

    struct Session {
        game: Game,
        clock: FrameClock,
    }

    impl Session {
        fn push(&mut self, event: InputEvent) {
            self.game.push_input(event);
        }
    }

    /// Handle held by the page script
    #[wasm_bindgen]
    pub struct VoxelCraft {
        session: Rc<RefCell<Session>>,
    }

    #[wasm_bindgen]
    impl VoxelCraft {
        /// `tuning` is an optional JSON override of the gameplay tables
        #[wasm_bindgen(constructor)]
        pub fn new(seed: f64, tuning: Option<String>) -> VoxelCraft {
            let settings = Settings::load();
            let clock = FrameClock::new(settings.max_frame_dt);
            let tuning = Tuning::load(tuning.as_deref());
            let game = Game::new(seed as u64, tuning, settings);
            log::info!("Game initialized with seed: {}", seed as u64);
            VoxelCraft {
                session: Rc::new(RefCell::new(Session { game, clock })),
            }
        }

        /// Returns true when the page should suppress the browser default
        pub fn key_down(&self, code: &str) -> bool {
            match Key::from_code(code) {
                Some(key) => {
                    self.session.borrow_mut().push(InputEvent::KeyDown(key));
                    key.prevents_default()
                }
                None => false,
            }
        }

        pub fn key_up(&self, code: &str) {
            if let Some(key) = Key::from_code(code) {
                self.session.borrow_mut().push(InputEvent::KeyUp(key));
            }
        }

        pub fn mouse_move(&self, dx: f32, dy: f32) {
            self.session.borrow_mut().push(InputEvent::MouseMove { dx, dy });
        }

        /// `hit` is empty for a miss, else `[x, y, z, nx, ny, nz]` with the
        /// block key appended when a block mesh was hit
        pub fn pointer(&self, button: i16, hit: &[i32]) {
            let Some(button) = PointerButton::from_dom(button) else {
                return;
            };
            let hit = BlockHit::from_slice(hit);
            self.session
                .borrow_mut()
                .push(InputEvent::Pointer { button, hit });
        }

        pub fn set_pointer_locked(&self, locked: bool) {
            self.session.borrow_mut().push(InputEvent::PointerLock(locked));
        }

        pub fn select_block_type(&self, index: usize) {
            if let Some(kind) = BlockType::from_index(index) {
                self.session.borrow_mut().push(InputEvent::SelectBlockType(kind));
            }
        }

        /// Replace and persist the user settings
        pub fn set_settings(&self, json: &str) -> Result<(), JsValue> {
            let settings = Settings::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
            settings.save();
            let mut session = self.session.borrow_mut();
            session.clock = FrameClock::new(settings.max_frame_dt);
            session.game.set_settings(settings);
            Ok(())
        }

        /// Run the fixed steps owed since the last animation frame and
        /// return the frame snapshot as JSON
        pub fn frame(&self, time_ms: f64) -> Result<String, JsValue> {
            let mut guard = self.session.borrow_mut();
            let session = &mut *guard;
            let dt = session.clock.delta_from_timestamp(time_ms);
            for _ in 0..session.clock.advance(dt) {
                session.game.tick(SIM_DT);
            }
            session
                .game
                .snapshot()
                .to_json()
                .map_err(|e| JsValue::from_str(&e.to_string()))
        }

        /// Install keyboard, mouse and pointer-lock listeners on the document
        pub fn attach(&self) -> Result<(), JsValue> {
            let document = web_sys::window()
                .and_then(|w| w.document())
                .ok_or_else(|| JsValue::from_str("no document"))?;

            // Keyboard
            {
                let session = self.session.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                    if let Some(key) = Key::from_code(&event.code()) {
                        if key.prevents_default() {
                            event.prevent_default();
                        }
                        session.borrow_mut().push(InputEvent::KeyDown(key));
                    }
                });
                document.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
                closure.forget();
            }
            {
                let session = self.session.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                    if let Some(key) = Key::from_code(&event.code()) {
                        session.borrow_mut().push(InputEvent::KeyUp(key));
                    }
                });
                document.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
                closure.forget();
            }

            // Mouse look
            {
                let session = self.session.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                    session.borrow_mut().push(InputEvent::MouseMove {
                        dx: event.movement_x() as f32,
                        dy: event.movement_y() as f32,
                    });
                });
                document.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())?;
                closure.forget();
            }

            // Right click places blocks, not menus
            {
                let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                    event.prevent_default();
                });
                document.add_event_listener_with_callback("contextmenu", closure.as_ref().unchecked_ref())?;
                closure.forget();
            }

            // Pointer lock
            {
                let session = self.session.clone();
                let doc = document.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                    let locked = doc.pointer_lock_element().is_some();
                    if locked {
                        log::info!("Pointer lock acquired");
                    } else {
                        log::info!("Pointer lock released");
                    }
                    session.borrow_mut().push(InputEvent::PointerLock(locked));
                });
                document.add_event_listener_with_callback(
                    "pointerlockchange",
                    closure.as_ref().unchecked_ref(),
                )?;
                closure.forget();
            }

            log::info!("Input listeners attached");
            Ok(())
        }
    }

    pub fn init() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"logger already initialized".into());
        }
        log::info!("Voxel Craft starting...");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::init();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Voxel Craft (native) starting...");
    log::info!("Native mode runs a headless session - serve the web build to play");
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use voxel_craft::consts::SIM_DT;
    use voxel_craft::platform::FrameClock;
    use voxel_craft::sim::{Game, InputEvent, Key, PointerButton};
    use voxel_craft::{Settings, Tuning};

    /// Simulate `seconds` of 60 Hz animation frames
    fn play(game: &mut Game, clock: &mut FrameClock, time_ms: &mut f64, seconds: f64) {
        let end = *time_ms + seconds * 1000.0;
        while *time_ms < end {
            *time_ms += 1000.0 / 60.0;
            let dt = clock.delta_from_timestamp(*time_ms);
            for _ in 0..clock.advance(dt) {
                game.tick(SIM_DT);
            }
        }
    }

    /// Optional tuning override file as the first argument
    fn tuning() -> Tuning {
        let Some(path) = std::env::args().nth(1) else {
            return Tuning::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => Tuning::load(Some(&json)),
            Err(e) => {
                log::warn!("Cannot read tuning file {}: {}", path, e);
                Tuning::default()
            }
        }
    }

    pub fn run() {
        let settings = Settings::load();
        let mut clock = FrameClock::new(settings.max_frame_dt);
        let mut game = Game::new(42, tuning(), settings);
        let mut now = 0.0;

        game.push_input(InputEvent::PointerLock(true));
        play(&mut game, &mut clock, &mut now, 1.0);
        log::info!("Landed at {:?}", game.camera().position);

        game.push_input(InputEvent::KeyDown(Key::Forward));
        game.push_input(InputEvent::KeyDown(Key::Sprint));
        play(&mut game, &mut clock, &mut now, 1.0);
        game.push_input(InputEvent::KeyUp(Key::Forward));
        game.push_input(InputEvent::KeyUp(Key::Sprint));
        log::info!("Sprinted to {:?}", game.camera().position);

        game.push_input(InputEvent::MouseMove { dx: 0.0, dy: 300.0 });
        game.push_input(InputEvent::Pointer {
            button: PointerButton::Primary,
            hit: None,
        });
        play(&mut game, &mut clock, &mut now, 3.0);

        let snapshot = game.snapshot();
        let loose = snapshot.blocks.iter().filter(|b| b.dynamic).count();
        log::info!(
            "Bomb went off: {} of {} blocks knocked loose, {} bombs live",
            loose,
            snapshot.blocks.len(),
            snapshot.bombs.len()
        );

        match snapshot.to_json() {
            Ok(json) => log::info!("Final snapshot: {} bytes", json.len()),
            Err(e) => log::error!("Snapshot failed to serialize: {}", e),
        }
    }
}
