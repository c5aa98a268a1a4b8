//! Recovery state machine
//!
//! Maps engine events onto status reports and recovery calls:
//!
//! | State           | Event                 | Action                    | Next                    |
//! |-----------------|-----------------------|---------------------------|-------------------------|
//! | Loading         | manifest parsed       | request play              | Playing                 |
//! | Loading/Playing | level loaded (live)   | report live               | unchanged               |
//! | Loading/Playing | non-fatal error       | report (info)             | unchanged               |
//! | Loading/Playing | fatal network error   | `start_load`              | Recovering -> Loading   |
//! | Loading/Playing | fatal media error     | `recover_media_error`     | Recovering -> Playing   |
//! | Loading/Playing | any other fatal error | destroy engine            | Terminated              |
//!
//! The machine never touches the engine itself. [`RecoveryMachine::on_event`]
//! returns a [`Transition`]; the session controller carries out its action and
//! then calls [`RecoveryMachine::finish`].

use crate::{
    engine::{EngineErrorKind, EngineEvent},
    RecoveryState, Status,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const MANIFEST_LOADED: &str = "Manifest loaded. Starting playback…";
pub const LIVE_DETECTED: &str = "Live stream detected";
pub const AUTOPLAY_BLOCKED: &str = "Autoplay blocked: press Play button.";

/// Engine fault classes, decided purely from the engine's `(type, fatal)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackFault {
    NonFatalNotice,
    FatalNetwork,
    FatalMedia,
    FatalOther,
}

impl PlaybackFault {
    pub fn classify(kind: EngineErrorKind, fatal: bool) -> Self {
        match (fatal, kind) {
            (false, _) => PlaybackFault::NonFatalNotice,
            (true, EngineErrorKind::Network) => PlaybackFault::FatalNetwork,
            (true, EngineErrorKind::Media) => PlaybackFault::FatalMedia,
            (true, _) => PlaybackFault::FatalOther,
        }
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self, PlaybackFault::NonFatalNotice)
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            PlaybackFault::NonFatalNotice => "NON_FATAL",
            PlaybackFault::FatalNetwork => "FATAL_NETWORK",
            PlaybackFault::FatalMedia => "FATAL_MEDIA",
            PlaybackFault::FatalOther => "FATAL_OTHER",
        }
    }
}

/// Call the controller must make on the surface or engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Ask the surface to play
    RequestPlay,
    /// Re-issue the engine's load
    StartLoad,
    /// Engine's in-place media recovery
    RecoverMediaError,
    /// Destroy the engine; the session is over
    DestroyEngine,
}

/// Optional ceilings on consecutive recoveries.
///
/// `None` keeps recovering on every fatal error. When a ceiling is
/// exceeded the error is handled like an unrecoverable one. Counters reset
/// whenever the engine reports a parsed manifest or a loaded level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryPolicy {
    pub max_network_recoveries: Option<u32>,
    pub max_media_recoveries: Option<u32>,
}

impl RecoveryPolicy {
    /// Policy that gives up after `n` consecutive recoveries of either class
    pub fn bounded(n: u32) -> Self {
        Self {
            max_network_recoveries: Some(n),
            max_media_recoveries: Some(n),
        }
    }
}

/// Outcome of feeding one event to the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Status to report, if any
    pub status: Option<Status>,
    /// Call to make before finishing
    pub action: Option<RecoveryAction>,
    /// Fault class for error events
    pub fault: Option<PlaybackFault>,
    /// State once the action has been issued
    pub next: RecoveryState,
}

impl Transition {
    fn stay(state: RecoveryState) -> Self {
        Self { status: None, action: None, fault: None, next: state }
    }
}

/// Per-session recovery state
#[derive(Debug, Clone)]
pub struct RecoveryMachine {
    state: RecoveryState,
    policy: RecoveryPolicy,
    network_recoveries: u32,
    media_recoveries: u32,
}

impl RecoveryMachine {
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self {
            state: RecoveryState::Idle,
            policy,
            network_recoveries: 0,
            media_recoveries: 0,
        }
    }

    pub fn state(&self) -> RecoveryState {
        self.state
    }

    /// Source handed to the surface or engine
    pub fn begin_loading(&mut self) {
        self.set_state(RecoveryState::Loading);
    }

    /// Playback requested on the surface directly, without an engine
    pub fn play_requested(&mut self) {
        self.set_state(RecoveryState::Playing);
    }

    /// Compute the reaction to `event`. Returns `None` when the current
    /// state ignores events.
    pub fn on_event(&mut self, event: &EngineEvent) -> Option<Transition> {
        if !self.state.accepts_events() {
            debug!(state = %self.state, event = event.name(), "Event ignored");
            return None;
        }

        let transition = match event {
            EngineEvent::ManifestParsed => {
                self.reset_counters();
                if self.state == RecoveryState::Loading {
                    Transition {
                        status: Some(Status::info(MANIFEST_LOADED)),
                        action: Some(RecoveryAction::RequestPlay),
                        fault: None,
                        next: RecoveryState::Playing,
                    }
                } else {
                    Transition::stay(self.state)
                }
            }
            EngineEvent::LevelLoaded { live } => {
                self.reset_counters();
                Transition {
                    status: (*live).then(|| Status::info(LIVE_DETECTED)),
                    ..Transition::stay(self.state)
                }
            }
            EngineEvent::Error { kind, details, fatal } => {
                self.on_error(*kind, details, *fatal)
            }
        };

        if matches!(
            transition.action,
            Some(RecoveryAction::StartLoad | RecoveryAction::RecoverMediaError)
        ) {
            self.set_state(RecoveryState::Recovering);
        }

        Some(transition)
    }

    /// Settle into the transition's target state once its action was issued
    pub fn finish(&mut self, transition: &Transition) {
        if transition.next != self.state {
            self.set_state(transition.next);
        }
    }

    fn on_error(&mut self, kind: EngineErrorKind, details: &str, fatal: bool) -> Transition {
        let message = format!("{}: {}", kind, details);
        let fault = PlaybackFault::classify(kind, fatal);

        let (fault, action, next) = match fault {
            PlaybackFault::NonFatalNotice => {
                return Transition {
                    status: Some(Status::info(message)),
                    fault: Some(fault),
                    ..Transition::stay(self.state)
                };
            }
            PlaybackFault::FatalNetwork => {
                self.network_recoveries = self.network_recoveries.saturating_add(1);
                if exceeds(self.network_recoveries, self.policy.max_network_recoveries) {
                    self.give_up(fault, self.network_recoveries)
                } else {
                    (fault, RecoveryAction::StartLoad, RecoveryState::Loading)
                }
            }
            PlaybackFault::FatalMedia => {
                self.media_recoveries = self.media_recoveries.saturating_add(1);
                if exceeds(self.media_recoveries, self.policy.max_media_recoveries) {
                    self.give_up(fault, self.media_recoveries)
                } else {
                    (fault, RecoveryAction::RecoverMediaError, RecoveryState::Playing)
                }
            }
            PlaybackFault::FatalOther => (fault, RecoveryAction::DestroyEngine, RecoveryState::Terminated),
        };

        Transition {
            status: Some(Status::error(message)),
            action: Some(action),
            fault: Some(fault),
            next,
        }
    }

    fn give_up(
        &self,
        fault: PlaybackFault,
        attempts: u32,
    ) -> (PlaybackFault, RecoveryAction, RecoveryState) {
        warn!(fault = fault.error_code(), attempts, "Recovery limit reached, terminating");
        (PlaybackFault::FatalOther, RecoveryAction::DestroyEngine, RecoveryState::Terminated)
    }

    fn reset_counters(&mut self) {
        self.network_recoveries = 0;
        self.media_recoveries = 0;
    }

    fn set_state(&mut self, new_state: RecoveryState) {
        let current = self.state;
        if !current.can_transition_to(new_state) {
            warn!(from = %current, to = %new_state, "Unexpected state transition");
        }
        self.state = new_state;
        info!(from = %current, to = %new_state, "State transition");
    }
}

impl Default for RecoveryMachine {
    fn default() -> Self {
        Self::new(RecoveryPolicy::default())
    }
}

fn exceeds(count: u32, ceiling: Option<u32>) -> bool {
    ceiling.is_some_and(|max| count > max)
}
