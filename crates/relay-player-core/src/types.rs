//! Core types for Relay Player

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A play action's input, exactly as the operator typed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub raw_url: String,
}

impl StreamRequest {
    pub fn new(raw_url: impl Into<String>) -> Self {
        Self { raw_url: raw_url.into() }
    }
}

/// Relay-routed location of an upstream stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedTarget {
    /// Same-origin path embedding the percent-encoded upstream URL
    pub relay_url: String,
}

impl ResolvedTarget {
    pub fn as_str(&self) -> &str {
        &self.relay_url
    }
}

impl std::fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.relay_url)
    }
}

/// How a resolved stream gets fetched and decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStrategy {
    /// Single transport-stream file handed straight to the surface
    DirectTransportStream,
    /// Surface decodes the adaptive manifest itself
    NativeAdaptive,
    /// External adaptive engine attached to the surface
    EngineAdaptive,
}

impl PlaybackStrategy {
    /// Whether this strategy owns an adaptive engine instance
    pub fn uses_engine(&self) -> bool {
        matches!(self, PlaybackStrategy::EngineAdaptive)
    }
}

impl std::fmt::Display for PlaybackStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStrategy::DirectTransportStream => write!(f, "direct-ts"),
            PlaybackStrategy::NativeAdaptive => write!(f, "native-adaptive"),
            PlaybackStrategy::EngineAdaptive => write!(f, "engine-adaptive"),
        }
    }
}

/// Session recovery state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryState {
    /// No source handed out yet
    Idle,
    /// Source loading, waiting for the manifest
    Loading,
    /// Playback requested
    Playing,
    /// A recovery call is being issued to the engine
    Recovering,
    /// Engine destroyed; a new session is required
    Terminated,
}

impl RecoveryState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: RecoveryState) -> bool {
        use RecoveryState::*;
        matches!(
            (self, target),
            // From Idle
            (Idle, Loading) |
            // From Loading
            (Loading, Playing) | (Loading, Recovering) | (Loading, Terminated) |
            // From Playing
            (Playing, Recovering) | (Playing, Terminated) |
            // From Recovering
            (Recovering, Loading) | (Recovering, Playing)
        )
    }

    /// States in which engine events are acted upon
    pub fn accepts_events(&self) -> bool {
        matches!(self, RecoveryState::Loading | RecoveryState::Playing)
    }
}

impl std::fmt::Display for RecoveryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryState::Idle => write!(f, "idle"),
            RecoveryState::Loading => write!(f, "loading"),
            RecoveryState::Playing => write!(f, "playing"),
            RecoveryState::Recovering => write!(f, "recovering"),
            RecoveryState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Status severity, rendered distinctly by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Error,
}

/// Last human-readable status
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Status {
    pub message: String,
    pub severity: Severity,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self { message: message.into(), severity: Severity::Info }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { message: message.into(), severity: Severity::Error }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            Severity::Info => write!(f, "{}", self.message),
            Severity::Error => write!(f, "[error] {}", self.message),
        }
    }
}
