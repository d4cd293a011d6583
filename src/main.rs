//! Physics Playground entry point
//!
//! Browser: requestAnimationFrame drives the sync loop and the keyboard is the
//! control surface. Native: a headless run on a simulated 60 Hz clock, or on
//! the wall clock with `--realtime`.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use physics_playground::audio::{HtmlHitSound, ImpactSound, SilentSound};
    use physics_playground::scene::MemoryScene;
    use physics_playground::{
        ControlAction, LoopControl, ManualClock, Sandbox, Settings, SyncLoop,
    };

    /// Everything the animation frame callback needs
    struct App {
        sandbox: Sandbox<MemoryScene, Box<dyn ImpactSound>>,
        sync: SyncLoop<ManualClock>,
    }

    fn hit_sound(settings: &Settings) -> Box<dyn ImpactSound> {
        match HtmlHitSound::new(&settings.hit_sound_url) {
            Ok(sound) => Box::new(sound),
            Err(e) => {
                log::warn!("Hit sound unavailable ({}), running silent", e);
                Box::new(SilentSound::default())
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {e}").into());
        }

        log::info!("Physics Playground starting...");

        let mut settings = Settings::load();
        // Write back the sanitized values so stored settings stay loadable
        settings.save();
        if settings.seed == 0 {
            settings.seed = js_sys::Date::now() as u64;
        }
        let sandbox = match Sandbox::from_settings(&settings, MemoryScene::new(), hit_sound(&settings)) {
            Ok(sandbox) => sandbox,
            Err(e) => {
                log::error!("Failed to build sandbox: {}", e);
                return;
            }
        };
        let sync = SyncLoop::with_step(
            ManualClock::new(),
            settings.fixed_delta,
            settings.max_substeps,
        );
        let app = Rc::new(RefCell::new(App { sandbox, sync }));

        setup_keyboard(app.clone());
        request_animation_frame(app);
    }

    fn setup_keyboard(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let action = match event.key().as_str() {
                "r" | "R" => ControlAction::Reset,
                "s" | "S" => ControlAction::CreateSphere,
                "b" | "B" => ControlAction::CreateBox,
                _ => return,
            };
            // Applied at the start of the next tick
            app.borrow_mut().sandbox.queue(action);
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            frame(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(app: Rc<RefCell<App>>, time: f64) {
        let control = {
            let mut guard = app.borrow_mut();
            let App { sandbox, sync } = &mut *guard;
            // rAF timestamps are milliseconds
            sync.clock_mut().set(time / 1000.0);
            sync.tick(sandbox)
        };

        if control == LoopControl::Continue {
            request_animation_frame(app);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    web_app::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Physics Playground (native, headless) starting...");

    let mut settings_path = None;
    let mut realtime = false;
    for arg in std::env::args().skip(1) {
        if arg == "--realtime" {
            realtime = true;
        } else {
            settings_path = Some(arg);
        }
    }

    if let Err(e) = headless::run(settings_path, realtime) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::time::Duration;

    use physics_playground::audio::{ImpactSound, SilentSound};
    use physics_playground::scene::{MemoryScene, SceneGraph};
    use physics_playground::sync::SystemClock;
    use physics_playground::{Clock, ControlAction, ManualClock, Sandbox, Settings, SyncLoop};

    /// Seconds to run
    const RUN_SECONDS: u32 = 5;
    const FRAMES_PER_SECOND: u32 = 60;

    pub fn run(settings_path: Option<String>, realtime: bool) -> physics_playground::Result<()> {
        let settings = match settings_path {
            Some(path) => Settings::load_from(path)?,
            None => Settings::default(),
        };

        let mut sandbox = Sandbox::from_settings(&settings, MemoryScene::new(), SilentSound::default())?;
        for action in [
            ControlAction::CreateSphere,
            ControlAction::CreateBox,
            ControlAction::CreateSphere,
            ControlAction::CreateBox,
        ] {
            sandbox.queue(action);
        }

        let frames = RUN_SECONDS * FRAMES_PER_SECOND;
        let frame = 1.0 / f64::from(FRAMES_PER_SECOND);
        let sounds = if realtime {
            log::info!("Running on the wall clock");
            let mut sync =
                SyncLoop::with_step(SystemClock::new(), settings.fixed_delta, settings.max_substeps);
            drive(&mut sync, &mut sandbox, frames, |_| {
                std::thread::sleep(Duration::from_secs_f64(frame))
            })
        } else {
            let mut sync =
                SyncLoop::with_step(ManualClock::new(), settings.fixed_delta, settings.max_substeps);
            drive(&mut sync, &mut sandbox, frames, |clock| clock.advance(frame))
        };

        log::info!(
            "Simulated {:.2}s in {} steps, {} impact sounds",
            sandbox.world().time(),
            sandbox.world().steps(),
            sounds
        );
        for entity in sandbox.pool().iter() {
            if let Some(t) = sandbox.scene().transform(entity.proxy) {
                log::info!(
                    "{:?}: position {:.3?}, sleeping {:?}",
                    entity.body,
                    t.position,
                    sandbox.world().is_sleeping(entity.body)
                );
            }
        }
        Ok(())
    }

    /// Tick `frames` times, calling `wait` between ticks; returns sounds played
    fn drive<C: Clock, S: SceneGraph, A: ImpactSound>(
        sync: &mut SyncLoop<C>,
        sandbox: &mut Sandbox<S, A>,
        frames: u32,
        mut wait: impl FnMut(&mut C),
    ) -> usize {
        let mut sounds = 0;
        sync.tick(sandbox);
        for _ in 0..frames {
            wait(sync.clock_mut());
            sync.tick(sandbox);
            sounds += sync.last_report().sounds;
        }
        sync.stop();
        sounds
    }
}
