//! Relay Player WASM - browser binding for the relay player core
//!
//! Drives an `HTMLVideoElement` directly, through the browser's native HLS
//! support, or through the page's hls.js.
//!
//! ## Usage
//!
//! ```javascript
//! import init, { RelayPlayer } from '@relay-player/wasm';
//!
//! await init();
//! const player = new RelayPlayer(document.querySelector('video'));
//! player.onStatus((message, isError) => { status.textContent = message; });
//! player.installUnloadTeardown();
//! player.playInput(input.value);
//! ```

use relay_player_core::{PlayerConfig, SessionController};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use web_sys::HtmlVideoElement;

mod hls;
mod surface;

pub use hls::{HlsEngine, HlsFactory};
pub use surface::VideoSurface;

type Controller = SessionController<VideoSurface, HlsFactory>;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"[Relay Player WASM] Initialized".into());
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Player bound to one video element
#[wasm_bindgen]
pub struct RelayPlayer {
    controller: Rc<RefCell<Controller>>,
    unload: Option<Closure<dyn FnMut()>>,
}

#[wasm_bindgen]
impl RelayPlayer {
    /// Create a player; `config_json` is an optional `PlayerConfig` document
    #[wasm_bindgen(constructor)]
    pub fn new(video: HtmlVideoElement, config_json: Option<String>) -> Result<RelayPlayer, JsError> {
        let config = match config_json {
            Some(json) => PlayerConfig::from_json_str(&json)?,
            None => PlayerConfig::default(),
        };

        let pump: hls::PumpHook = Rc::new(RefCell::new(None));
        let controller = Rc::new(RefCell::new(SessionController::new(
            config,
            VideoSurface::new(video),
            HlsFactory::new(pump.clone()),
        )));
        *pump.borrow_mut() = Some(schedule_pump(Rc::downgrade(&controller)));

        Ok(RelayPlayer { controller, unload: None })
    }

    /// Play a stream URL
    pub fn play(&self, url: &str) -> bool {
        self.controller.borrow_mut().start_session(url).is_some()
    }

    /// Play user-entered text
    #[wasm_bindgen(js_name = playInput)]
    pub fn play_input(&self, input: &str) -> bool {
        self.controller.borrow_mut().play_input(input).is_some()
    }

    /// Play a configured preset
    #[wasm_bindgen(js_name = playPreset)]
    pub fn play_preset(&self, name: &str) -> bool {
        self.controller.borrow_mut().play_preset(name).is_some()
    }

    /// Destroy the current session
    pub fn teardown(&self) {
        self.controller.borrow_mut().teardown();
    }

    /// Drain queued engine events; returns how many were handled
    pub fn pump(&self) -> usize {
        self.controller.borrow_mut().pump_events()
    }

    #[wasm_bindgen(getter)]
    pub fn status(&self) -> String {
        self.controller.borrow().status().current().message
    }

    #[wasm_bindgen(getter, js_name = statusIsError)]
    pub fn status_is_error(&self) -> bool {
        self.controller.borrow().status().current().is_error()
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.controller.borrow().state().to_string()
    }

    /// Strategy of the current session, if any
    #[wasm_bindgen(getter)]
    pub fn strategy(&self) -> Option<String> {
        self.controller.borrow().strategy().map(|s| s.to_string())
    }

    /// Call `callback(message, isError)` on every status change
    #[wasm_bindgen(js_name = onStatus)]
    pub fn on_status(&self, callback: js_sys::Function) {
        let mut rx = self.controller.borrow().status().subscribe();
        wasm_bindgen_futures::spawn_local(async move {
            while rx.changed().await.is_ok() {
                let status = rx.borrow_and_update().clone();
                let _ = callback.call2(
                    &JsValue::NULL,
                    &JsValue::from_str(&status.message),
                    &JsValue::from_bool(status.is_error()),
                );
            }
        });
    }

    /// Tear the session down when the page unloads
    #[wasm_bindgen(js_name = installUnloadTeardown)]
    pub fn install_unload_teardown(&mut self) -> Result<(), JsError> {
        if self.unload.is_some() {
            return Ok(());
        }
        let window = web_sys::window().ok_or_else(|| JsError::new("no window"))?;
        let controller = Rc::downgrade(&self.controller);
        let listener = Closure::wrap(Box::new(move || {
            if let Some(controller) = controller.upgrade() {
                if let Ok(mut controller) = controller.try_borrow_mut() {
                    controller.teardown();
                }
            }
        }) as Box<dyn FnMut()>);
        window
            .add_event_listener_with_callback("beforeunload", listener.as_ref().unchecked_ref())
            .map_err(|e| JsError::new(&surface::js_error_message(&e)))?;
        self.unload = Some(listener);
        Ok(())
    }
}

impl Drop for RelayPlayer {
    fn drop(&mut self) {
        if let (Some(listener), Some(window)) = (self.unload.take(), web_sys::window()) {
            let _ = window.remove_event_listener_with_callback(
                "beforeunload",
                listener.as_ref().unchecked_ref(),
            );
        }
    }
}

/// Engine callbacks fire inside controller calls, so draining is deferred
/// to a microtask instead of borrowing the controller re-entrantly.
fn schedule_pump(controller: Weak<RefCell<Controller>>) -> Box<dyn Fn()> {
    Box::new(move || {
        let controller = controller.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Some(controller) = controller.upgrade() {
                if let Ok(mut controller) = controller.try_borrow_mut() {
                    controller.pump_events();
                }
            }
        });
    })
}
