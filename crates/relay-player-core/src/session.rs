//! Session Controller - owns the one active playback attempt
//!
//! Coordinates:
//! - URL resolution and strategy selection per play action
//! - Engine acquisition and teardown (never more than one engine alive)
//! - Draining engine events through the recovery state machine
//! - Status reporting

use crate::{
    config::PlayerConfig,
    engine::{AdaptiveEngine, EngineConfig, EngineEvent, EngineEventSink, EngineFactory, TaggedEvent},
    recovery::{RecoveryAction, RecoveryMachine, AUTOPLAY_BLOCKED},
    resolver::UrlResolver,
    status::StatusReporter,
    strategy,
    surface::{PlayRejection, RenderingSurface},
    PlaybackStrategy, RecoveryState, ResolvedTarget, SessionId, StreamRequest,
};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

pub const LOADING_STREAM: &str = "Loading stream…";
pub const INVALID_URL: &str = "Invalid URL";
pub const ENGINE_UNAVAILABLE: &str = "Adaptive engine not available";
pub const EMPTY_INPUT: &str = "Please paste a .m3u8 or .ts URL";

/// A single playback attempt
#[derive(Debug)]
pub struct Session<E> {
    id: SessionId,
    strategy: PlaybackStrategy,
    target: ResolvedTarget,
    engine: Option<E>,
    recovery: RecoveryMachine,
}

impl<E> Session<E> {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn strategy(&self) -> PlaybackStrategy {
        self.strategy
    }

    pub fn target(&self) -> &ResolvedTarget {
        &self.target
    }

    pub fn state(&self) -> RecoveryState {
        self.recovery.state()
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }
}

/// Drives play actions against a rendering surface and an engine factory
pub struct SessionController<S: RenderingSurface, F: EngineFactory<S>> {
    config: PlayerConfig,
    resolver: UrlResolver,
    engine_config: EngineConfig,
    surface: S,
    factory: F,
    status: StatusReporter,
    session: Option<Session<F::Engine>>,
    events_tx: mpsc::UnboundedSender<TaggedEvent>,
    events_rx: mpsc::UnboundedReceiver<TaggedEvent>,
}

impl<S: RenderingSurface, F: EngineFactory<S>> SessionController<S, F> {
    pub fn new(config: PlayerConfig, surface: S, factory: F) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            resolver: UrlResolver::new(config.relay_prefix.clone()),
            config,
            engine_config: EngineConfig::default(),
            surface,
            factory,
            status: StatusReporter::new(),
            session: None,
            events_tx,
            events_rx,
        }
    }

    /// Status sink shared with the UI
    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    /// The active session, if any
    pub fn session(&self) -> Option<&Session<F::Engine>> {
        self.session.as_ref()
    }

    /// Recovery state of the active session (`Idle` without one)
    pub fn state(&self) -> RecoveryState {
        self.session
            .as_ref()
            .map(|s| s.state())
            .unwrap_or(RecoveryState::Idle)
    }

    pub fn strategy(&self) -> Option<PlaybackStrategy> {
        self.session.as_ref().map(|s| s.strategy())
    }

    pub fn engine_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.has_engine())
    }

    /// Play whatever the operator typed into the URL box
    pub fn play_input(&mut self, input: &str) -> Option<SessionId> {
        let input = input.trim();
        if input.is_empty() {
            self.status.error(EMPTY_INPUT);
            return None;
        }
        self.start_session(input)
    }

    /// Play a configured preset. Unconfigured presets are reported, not errors.
    pub fn play_preset(&mut self, name: &str) -> Option<SessionId> {
        match self.config.preset_url(name) {
            Some(url) => {
                let url = url.to_string();
                self.start_session(&url)
            }
            None => {
                self.status
                    .info(format!("No {name} URL configured. Paste one in the input."));
                None
            }
        }
    }

    /// Start a new session for `raw_url`, superseding any active one.
    ///
    /// Returns the new session's id, or `None` when no session was created
    /// (the reason is on the status reporter).
    #[instrument(skip(self))]
    pub fn start_session(&mut self, raw_url: &str) -> Option<SessionId> {
        self.status.info(LOADING_STREAM);

        let request = StreamRequest::new(raw_url);
        let target = match self.resolver.resolve_request(&request) {
            Ok(target) => target,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "Rejected stream URL");
                self.status.error(INVALID_URL);
                return None;
            }
        };

        let strategy = strategy::select(&request.raw_url, &target, &self.surface);

        // The previous engine must be gone before anything new is acquired.
        self.teardown();

        let id = SessionId::new();
        let mut session = Session {
            id,
            strategy,
            target,
            engine: None,
            recovery: RecoveryMachine::new(self.config.recovery),
        };

        match strategy {
            PlaybackStrategy::DirectTransportStream | PlaybackStrategy::NativeAdaptive => {
                self.surface.set_source(session.target.as_str());
                session.recovery.begin_loading();
                self.surface
                    .request_play(autoplay_handler(&self.status, strategy));
                session.recovery.play_requested();
            }
            PlaybackStrategy::EngineAdaptive => {
                let sink = EngineEventSink::new(id, self.events_tx.clone());
                let mut engine = match self.factory.create(&self.engine_config, sink) {
                    Ok(engine) => engine,
                    Err(e) => {
                        warn!(error = %e, code = e.error_code(), "Engine construction failed");
                        self.status.error(ENGINE_UNAVAILABLE);
                        return None;
                    }
                };
                session.recovery.begin_loading();
                engine.load_source(session.target.as_str());
                engine.attach_media(&mut self.surface);
                session.engine = Some(engine);
            }
        }

        info!(session_id = %id, strategy = %strategy, target = %session.target, "Session started");
        self.session = Some(session);
        Some(id)
    }

    /// Destroy the active engine and end the session. No-op without one.
    pub fn teardown(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if let Some(mut engine) = session.engine.take() {
            engine.destroy();
            info!(session_id = %session.id, "Engine destroyed");
        }
        debug!(session_id = %session.id, state = %session.state(), "Session ended");
    }

    /// Run every queued engine event through the recovery machine.
    ///
    /// Returns the number of events taken off the queue. Within one call a
    /// fatal error's status is never overwritten by a later non-fatal notice.
    pub fn pump_events(&mut self) -> usize {
        let mut drained = 0;
        let mut fatal_reported = false;
        while let Ok((id, event)) = self.events_rx.try_recv() {
            drained += 1;
            self.dispatch(id, &event, &mut fatal_reported);
        }
        drained
    }

    fn dispatch(&mut self, id: SessionId, event: &EngineEvent, fatal_reported: &mut bool) {
        let Some(session) = self.session.as_mut().filter(|s| s.id == id) else {
            debug!(session_id = %id, event = event.name(), "Dropping event from superseded session");
            return;
        };

        let Some(transition) = session.recovery.on_event(event) else {
            return;
        };

        // A fatal error's status outlives every later notice in the same pump.
        let fatal = transition.fault.is_some_and(|f| f.is_fatal());
        if let Some(status) = &transition.status {
            if *fatal_reported && !fatal && !status.is_error() {
                debug!(status = %status.message, "Notice suppressed by earlier fatal error");
            } else {
                self.status.report(status.message.clone(), status.severity);
            }
        }
        *fatal_reported |= fatal;

        match transition.action {
            Some(RecoveryAction::RequestPlay) => {
                self.surface
                    .request_play(autoplay_handler(&self.status, PlaybackStrategy::EngineAdaptive));
            }
            Some(RecoveryAction::StartLoad) => {
                if let Some(engine) = session.engine.as_mut() {
                    info!(session_id = %id, "Reloading after network error");
                    engine.start_load();
                }
            }
            Some(RecoveryAction::RecoverMediaError) => {
                if let Some(engine) = session.engine.as_mut() {
                    info!(session_id = %id, "Recovering from media error");
                    engine.recover_media_error();
                }
            }
            Some(RecoveryAction::DestroyEngine) => {
                if let Some(mut engine) = session.engine.take() {
                    engine.destroy();
                    warn!(session_id = %id, "Unrecoverable error, engine destroyed");
                }
            }
            None => {}
        }

        session.recovery.finish(&transition);
    }
}

impl<S: RenderingSurface, F: EngineFactory<S>> Drop for SessionController<S, F> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Status callback for a rejected play request
fn autoplay_handler(status: &StatusReporter, strategy: PlaybackStrategy) -> PlayRejection {
    let status = status.clone();
    Box::new(move |reason: String| {
        let message = match strategy {
            PlaybackStrategy::NativeAdaptive => {
                let reason = if reason.is_empty() { "error".to_string() } else { reason };
                format!("Autoplay blocked: press Play. ({reason})")
            }
            _ => AUTOPLAY_BLOCKED.to_string(),
        };
        status.error(message);
    })
}
