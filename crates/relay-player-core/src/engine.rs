//! Adaptive streaming engine boundary
//!
//! The engine (hls.js in the browser) does all manifest, buffering and ABR
//! work. This module only describes what we can call on it, what it tells us
//! back, and the fixed configuration it is built with.

use crate::{Result, SessionId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

/// Fixed engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Forward buffer target (seconds)
    pub max_buffer_length: f64,
    /// Hard cap on the forward buffer (seconds)
    pub max_max_buffer_length: f64,
    /// Back buffer kept behind the live edge (seconds)
    pub live_back_buffer_length: f64,
    /// Back buffer kept behind the playhead (seconds)
    pub back_buffer_length: f64,
    /// Demux in a background worker
    pub enable_worker: bool,
    /// Low-latency live mode
    pub low_latency_mode: bool,
    /// Send credentials on relay requests
    #[serde(skip)]
    pub with_credentials: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_buffer_length: 30.0,
            max_max_buffer_length: 120.0,
            live_back_buffer_length: 30.0,
            back_buffer_length: 30.0,
            enable_worker: true,
            low_latency_mode: true,
            with_credentials: false,
        }
    }
}

/// Engine-reported error type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineErrorKind {
    #[serde(rename = "networkError")]
    Network,
    #[serde(rename = "mediaError")]
    Media,
    #[serde(rename = "keySystemError")]
    KeySystem,
    #[serde(rename = "muxError")]
    Mux,
    #[serde(rename = "otherError", other)]
    Other,
}

impl EngineErrorKind {
    /// Map the engine's error type name
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "networkError" => EngineErrorKind::Network,
            "mediaError" => EngineErrorKind::Media,
            "keySystemError" => EngineErrorKind::KeySystem,
            "muxError" => EngineErrorKind::Mux,
            _ => EngineErrorKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineErrorKind::Network => "networkError",
            EngineErrorKind::Media => "mediaError",
            EngineErrorKind::KeySystem => "keySystemError",
            EngineErrorKind::Mux => "muxError",
            EngineErrorKind::Other => "otherError",
        }
    }
}

impl std::fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events emitted by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Manifest downloaded and parsed
    ManifestParsed,
    /// A variant playlist loaded
    LevelLoaded {
        #[serde(default)]
        live: bool,
    },
    /// Something went wrong; the engine decides fatality
    Error {
        kind: EngineErrorKind,
        #[serde(default)]
        details: String,
        #[serde(default)]
        fatal: bool,
    },
}

impl EngineEvent {
    pub fn error(kind: EngineErrorKind, details: impl Into<String>, fatal: bool) -> Self {
        EngineEvent::Error { kind, details: details.into(), fatal }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::ManifestParsed => "manifest_parsed",
            EngineEvent::LevelLoaded { .. } => "level_loaded",
            EngineEvent::Error { .. } => "error",
        }
    }
}

/// Queue entry: an event plus the session whose engine produced it
pub type TaggedEvent = (SessionId, EngineEvent);

/// Handle an engine uses to publish events to its session
#[derive(Debug, Clone)]
pub struct EngineEventSink {
    session_id: SessionId,
    tx: mpsc::UnboundedSender<TaggedEvent>,
}

impl EngineEventSink {
    pub fn new(session_id: SessionId, tx: mpsc::UnboundedSender<TaggedEvent>) -> Self {
        Self { session_id, tx }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Queue an event for the controller. Events sent after the controller
    /// is gone are dropped.
    pub fn emit(&self, event: EngineEvent) {
        trace!(session_id = %self.session_id, event = event.name(), "Engine event queued");
        let _ = self.tx.send((self.session_id, event));
    }
}

/// Operations the controller issues on an engine instance
pub trait AdaptiveEngine<S: ?Sized> {
    /// Start loading a manifest URL
    fn load_source(&mut self, url: &str);

    /// Bind the engine to the rendering surface
    fn attach_media(&mut self, surface: &mut S);

    /// Restart loading after a network failure
    fn start_load(&mut self);

    /// Attempt in-place recovery from a decode failure
    fn recover_media_error(&mut self);

    /// Release the instance. No calls follow this one.
    fn destroy(&mut self);
}

/// Builds engine instances on demand
pub trait EngineFactory<S: ?Sized> {
    type Engine: AdaptiveEngine<S>;

    /// Construct an engine that publishes its events into `events`.
    ///
    /// Fails with [`crate::Error::EngineUnavailable`] when no engine
    /// implementation is present.
    fn create(&mut self, config: &EngineConfig, events: EngineEventSink) -> Result<Self::Engine>;
}
