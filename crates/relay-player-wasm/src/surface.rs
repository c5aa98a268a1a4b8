//! `HTMLVideoElement` rendering surface

use relay_player_core::{CanPlay, PlayRejection, RenderingSurface};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlVideoElement;

/// Video element the player draws into
pub struct VideoSurface {
    video: HtmlVideoElement,
}

impl VideoSurface {
    pub fn new(video: HtmlVideoElement) -> Self {
        Self { video }
    }

    pub fn element(&self) -> &HtmlVideoElement {
        &self.video
    }
}

impl RenderingSurface for VideoSurface {
    fn set_source(&mut self, url: &str) {
        self.video.set_src(url);
    }

    fn request_play(&mut self, on_reject: PlayRejection) {
        match self.video.play() {
            Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    on_reject(js_error_message(&err));
                }
            }),
            Err(err) => on_reject(js_error_message(&err)),
        }
    }

    fn can_play_type(&self, mime_type: &str) -> CanPlay {
        CanPlay::from_answer(&self.video.can_play_type(mime_type))
    }
}

/// Best-effort message out of a thrown JS value
pub fn js_error_message(err: &JsValue) -> String {
    js_sys::Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_else(|| "error".to_string())
}
