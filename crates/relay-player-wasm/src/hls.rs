//! hls.js adaptive engine
//!
//! Binds the global `Hls` class loaded by the page. Engine callbacks only
//! queue events; the controller drains them on the next pump.

use crate::surface::{js_error_message, VideoSurface};
use relay_player_core::{
    AdaptiveEngine, EngineConfig, EngineErrorKind, EngineEvent, EngineEventSink, EngineFactory,
    Error, Result,
};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

const MANIFEST_PARSED: &str = "hlsManifestParsed";
const LEVEL_LOADED: &str = "hlsLevelLoaded";
const ERROR: &str = "hlsError";

#[wasm_bindgen]
extern "C" {
    type Hls;

    #[wasm_bindgen(constructor, catch)]
    fn new(config: &JsValue) -> std::result::Result<Hls, JsValue>;

    #[wasm_bindgen(method, js_name = loadSource)]
    fn load_source(this: &Hls, url: &str);

    #[wasm_bindgen(method, js_name = attachMedia)]
    fn attach_media(this: &Hls, media: &web_sys::HtmlMediaElement);

    #[wasm_bindgen(method, js_name = startLoad)]
    fn start_load(this: &Hls);

    #[wasm_bindgen(method, js_name = recoverMediaError)]
    fn recover_media_error(this: &Hls);

    #[wasm_bindgen(method)]
    fn destroy(this: &Hls);

    #[wasm_bindgen(method)]
    fn on(this: &Hls, event: &str, listener: &Closure<dyn FnMut(JsValue, JsValue)>);
}

type Listener = Closure<dyn FnMut(JsValue, JsValue)>;

/// Callback that asks the owner to drain queued engine events
pub type PumpHook = Rc<RefCell<Option<Box<dyn Fn()>>>>;

/// A live hls.js instance with its listeners
pub struct HlsEngine {
    hls: Hls,
    _listeners: Vec<Listener>,
    _xhr_setup: Listener,
}

impl AdaptiveEngine<VideoSurface> for HlsEngine {
    fn load_source(&mut self, url: &str) {
        self.hls.load_source(url);
    }

    fn attach_media(&mut self, surface: &mut VideoSurface) {
        self.hls.attach_media(surface.element());
    }

    fn start_load(&mut self) {
        self.hls.start_load();
    }

    fn recover_media_error(&mut self) {
        self.hls.recover_media_error();
    }

    fn destroy(&mut self) {
        self.hls.destroy();
    }
}

/// Builds [`HlsEngine`]s from the page's global `Hls`
pub struct HlsFactory {
    pump: PumpHook,
}

impl HlsFactory {
    pub fn new(pump: PumpHook) -> Self {
        Self { pump }
    }

    fn listener(
        &self,
        sink: &EngineEventSink,
        decode: impl Fn(&JsValue) -> Option<EngineEvent> + 'static,
    ) -> Listener {
        let sink = sink.clone();
        let pump = self.pump.clone();
        Closure::wrap(Box::new(move |_event: JsValue, data: JsValue| {
            if let Some(event) = decode(&data) {
                sink.emit(event);
                if let Some(pump) = pump.borrow().as_ref() {
                    pump();
                }
            }
        }) as Box<dyn FnMut(JsValue, JsValue)>)
    }
}

impl EngineFactory<VideoSurface> for HlsFactory {
    type Engine = HlsEngine;

    fn create(&mut self, config: &EngineConfig, events: EngineEventSink) -> Result<HlsEngine> {
        let global = js_sys::global();
        let available = js_sys::Reflect::get(&global, &JsValue::from_str("Hls"))
            .map(|hls| hls.is_function())
            .unwrap_or(false);
        if !available {
            return Err(Error::EngineUnavailable("Hls.js not loaded".into()));
        }

        let js_config = serde_wasm_bindgen::to_value(config)
            .map_err(|e| Error::EngineUnavailable(e.to_string()))?;

        let with_credentials = config.with_credentials;
        let xhr_setup: Listener = Closure::wrap(Box::new(move |xhr: JsValue, _url: JsValue| {
            let _ = js_sys::Reflect::set(
                &xhr,
                &JsValue::from_str("withCredentials"),
                &JsValue::from_bool(with_credentials),
            );
        }) as Box<dyn FnMut(JsValue, JsValue)>);
        js_sys::Reflect::set(&js_config, &JsValue::from_str("xhrSetup"), xhr_setup.as_ref())
            .map_err(|e| Error::EngineUnavailable(js_error_message(&e)))?;

        let hls = Hls::new(&js_config).map_err(|e| Error::EngineUnavailable(js_error_message(&e)))?;

        let listeners = vec![
            self.listener(&events, |_| Some(EngineEvent::ManifestParsed)),
            self.listener(&events, |data| {
                let live = get(data, "details")
                    .map(|details| get(&details, "live").and_then(|l| l.as_bool()).unwrap_or(false))
                    .unwrap_or(false);
                Some(EngineEvent::LevelLoaded { live })
            }),
            self.listener(&events, |data| {
                let kind = get(data, "type")
                    .and_then(|t| t.as_string())
                    .map(|t| EngineErrorKind::from_type_name(&t))
                    .unwrap_or(EngineErrorKind::Other);
                let details = get(data, "details").and_then(|d| d.as_string()).unwrap_or_default();
                let fatal = get(data, "fatal").and_then(|f| f.as_bool()).unwrap_or(false);
                web_sys::console::warn_3(
                    &"HLS error:".into(),
                    &kind.as_str().into(),
                    &details.as_str().into(),
                );
                Some(EngineEvent::Error { kind, details, fatal })
            }),
        ];

        hls.on(MANIFEST_PARSED, &listeners[0]);
        hls.on(LEVEL_LOADED, &listeners[1]);
        hls.on(ERROR, &listeners[2]);

        Ok(HlsEngine { hls, _listeners: listeners, _xhr_setup: xhr_setup })
    }
}

/// Read a property, treating `undefined`/`null` as absent
fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}
