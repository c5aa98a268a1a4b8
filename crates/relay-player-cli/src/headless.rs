//! Headless surface and scripted engine
//!
//! Stand-ins for the browser collaborators. Every call they receive is
//! appended to a shared journal so the simulation can show what the
//! controller did in response to each event.

use relay_player_core::{
    AdaptiveEngine, CanPlay, EngineConfig, EngineEventSink, EngineFactory, PlayRejection,
    RenderingSurface, Result,
};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::info;

/// Calls made on the surface and engines, in order
pub type Journal = Rc<RefCell<Vec<String>>>;

/// Reason given for rejected play requests
pub const AUTOPLAY_REJECTION: &str =
    "NotAllowedError: play() failed because the user didn't interact with the document first.";

/// Video surface without a display
pub struct HeadlessSurface {
    journal: Journal,
    native: CanPlay,
    block_autoplay: bool,
}

impl HeadlessSurface {
    pub fn new(journal: Journal, native: CanPlay, block_autoplay: bool) -> Self {
        Self { journal, native, block_autoplay }
    }
}

impl RenderingSurface for HeadlessSurface {
    fn set_source(&mut self, url: &str) {
        info!(url, "Surface source set");
        self.journal.borrow_mut().push(format!("surface.src = {url}"));
    }

    fn request_play(&mut self, on_reject: PlayRejection) {
        self.journal.borrow_mut().push("surface.play()".to_string());
        if self.block_autoplay {
            on_reject(AUTOPLAY_REJECTION.to_string());
        }
    }

    fn can_play_type(&self, _mime_type: &str) -> CanPlay {
        self.native
    }
}

/// Engine that only records what it is asked to do
pub struct ScriptedEngine {
    id: u32,
    journal: Journal,
}

impl ScriptedEngine {
    fn record(&self, call: &str) {
        info!(engine = self.id, call, "Engine call");
        self.journal.borrow_mut().push(format!("engine#{}.{}", self.id, call));
    }
}

impl AdaptiveEngine<HeadlessSurface> for ScriptedEngine {
    fn load_source(&mut self, url: &str) {
        self.record(&format!("loadSource({url})"));
    }

    fn attach_media(&mut self, _surface: &mut HeadlessSurface) {
        self.record("attachMedia()");
    }

    fn start_load(&mut self) {
        self.record("startLoad()");
    }

    fn recover_media_error(&mut self) {
        self.record("recoverMediaError()");
    }

    fn destroy(&mut self) {
        self.record("destroy()");
    }
}

/// Hands out scripted engines and keeps the newest one's event sink
pub struct ScriptedEngineFactory {
    journal: Journal,
    created: u32,
    sink: Option<EngineEventSink>,
}

impl ScriptedEngineFactory {
    pub fn new(journal: Journal) -> Self {
        Self { journal, created: 0, sink: None }
    }

    /// Event sink of the most recently created engine
    pub fn sink(&self) -> Option<&EngineEventSink> {
        self.sink.as_ref()
    }
}

impl EngineFactory<HeadlessSurface> for ScriptedEngineFactory {
    type Engine = ScriptedEngine;

    fn create(&mut self, config: &EngineConfig, events: EngineEventSink) -> Result<ScriptedEngine> {
        self.created += 1;
        self.journal.borrow_mut().push(format!(
            "engine#{} = new Hls({})",
            self.created,
            serde_json::to_string(config)?
        ));
        self.sink = Some(events);
        Ok(ScriptedEngine { id: self.created, journal: self.journal.clone() })
    }
}
