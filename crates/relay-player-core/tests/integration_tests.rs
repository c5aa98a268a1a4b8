//! Integration tests for Relay Player Core

use relay_player_core::{
    engine::EngineEventSink,
    recovery::{AUTOPLAY_BLOCKED, LIVE_DETECTED, MANIFEST_LOADED},
    session::{EMPTY_INPUT, ENGINE_UNAVAILABLE, INVALID_URL, LOADING_STREAM},
    AdaptiveEngine, CanPlay, EngineConfig, EngineErrorKind, EngineEvent, EngineFactory, Error,
    PlaybackStrategy, PlayerConfig, PlayRejection, RecoveryPolicy, RecoveryState,
    RenderingSurface, Result, SessionController, Status, UrlResolver,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// =============================================================================
// Recording fakes
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    SetSource(String),
    Play,
    Created(u32),
    Load(u32, String),
    Attach(u32),
    StartLoad(u32),
    RecoverMedia(u32),
    Destroy(u32),
}

type Log = Rc<RefCell<Vec<Call>>>;

struct FakeSurface {
    log: Log,
    can_play: CanPlay,
    reject_play: Option<String>,
}

impl RenderingSurface for FakeSurface {
    fn set_source(&mut self, url: &str) {
        self.log.borrow_mut().push(Call::SetSource(url.to_string()));
    }

    fn request_play(&mut self, on_reject: PlayRejection) {
        self.log.borrow_mut().push(Call::Play);
        if let Some(reason) = &self.reject_play {
            on_reject(reason.clone());
        }
    }

    fn can_play_type(&self, _mime_type: &str) -> CanPlay {
        self.can_play
    }
}

struct FakeEngine {
    id: u32,
    log: Log,
    live: Rc<Cell<u32>>,
    sink: EngineEventSink,
}

impl FakeEngine {
    fn emit(&self, event: EngineEvent) {
        self.sink.emit(event);
    }
}

impl AdaptiveEngine<FakeSurface> for FakeEngine {
    fn load_source(&mut self, url: &str) {
        self.log.borrow_mut().push(Call::Load(self.id, url.to_string()));
    }

    fn attach_media(&mut self, _surface: &mut FakeSurface) {
        self.log.borrow_mut().push(Call::Attach(self.id));
    }

    fn start_load(&mut self) {
        self.log.borrow_mut().push(Call::StartLoad(self.id));
    }

    fn recover_media_error(&mut self) {
        self.log.borrow_mut().push(Call::RecoverMedia(self.id));
    }

    fn destroy(&mut self) {
        self.live.set(self.live.get() - 1);
        self.log.borrow_mut().push(Call::Destroy(self.id));
    }
}

struct FakeFactory {
    log: Log,
    next_id: u32,
    live: Rc<Cell<u32>>,
    max_live: Cell<u32>,
    available: bool,
    last_config: Option<EngineConfig>,
}

impl EngineFactory<FakeSurface> for FakeFactory {
    type Engine = FakeEngine;

    fn create(&mut self, config: &EngineConfig, events: EngineEventSink) -> Result<FakeEngine> {
        if !self.available {
            return Err(Error::EngineUnavailable("Hls".into()));
        }
        self.next_id += 1;
        self.live.set(self.live.get() + 1);
        self.max_live.set(self.max_live.get().max(self.live.get()));
        self.last_config = Some(config.clone());
        self.log.borrow_mut().push(Call::Created(self.next_id));
        Ok(FakeEngine {
            id: self.next_id,
            log: self.log.clone(),
            live: self.live.clone(),
            sink: events,
        })
    }
}

type Controller = SessionController<FakeSurface, FakeFactory>;

fn controller_with(config: PlayerConfig, can_play: CanPlay) -> (Controller, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let surface = FakeSurface { log: log.clone(), can_play, reject_play: None };
    let factory = FakeFactory {
        log: log.clone(),
        next_id: 0,
        live: Rc::new(Cell::new(0)),
        max_live: Cell::new(0),
        available: true,
        last_config: None,
    };
    (SessionController::new(config, surface, factory), log)
}

fn new_controller(can_play: CanPlay) -> (Controller, Log) {
    controller_with(PlayerConfig::default(), can_play)
}

fn emit(controller: &Controller, event: EngineEvent) {
    controller
        .session()
        .and_then(|s| s.engine())
        .expect("active engine")
        .emit(event);
}

fn relay(url: &str) -> String {
    UrlResolver::default().resolve(url).unwrap().relay_url
}

const LIVE: &str = "https://example.com/live.m3u8";

// =============================================================================
// Resolution & strategy
// =============================================================================

#[test]
fn test_resolve_is_deterministic_and_reversible() {
    let resolver = UrlResolver::default();
    for raw in [
        LIVE,
        "http://10.0.0.5:8080/hls/chan?id=7&sig=a%2Fb",
        "https://cdn.example.com/path with space/seg.ts",
    ] {
        let a = resolver.resolve(raw).unwrap();
        let b = resolver.resolve(raw).unwrap();
        assert_eq!(a, b);
        let decoded = resolver.decode_relay_url(&a.relay_url).unwrap();
        assert_eq!(decoded, url::Url::parse(raw).unwrap());
    }
}

#[test]
fn test_invalid_url_creates_nothing() {
    for raw in ["example.com/live.m3u8", "live.m3u8", "http://", "::"] {
        let (mut controller, log) = new_controller(CanPlay::No);
        assert!(controller.start_session(raw).is_none());
        assert!(controller.session().is_none());
        assert_eq!(controller.status().current(), Status::error(INVALID_URL));
        assert!(log.borrow().is_empty(), "input {raw:?}");
    }
}

#[test]
fn test_invalid_url_keeps_previous_session() {
    let (mut controller, log) = new_controller(CanPlay::No);
    let first = controller.start_session(LIVE).unwrap();
    controller.start_session("not a url");
    assert_eq!(controller.session().map(|s| s.id()), Some(first));
    assert!(controller.engine_active());
    assert!(!log.borrow().contains(&Call::Destroy(1)));
}

#[test]
fn test_raw_segment_plays_directly() {
    for can_play in [CanPlay::Probably, CanPlay::Maybe, CanPlay::No] {
        let (mut controller, log) = new_controller(can_play);
        controller.start_session("https://example.com/seg.ts").unwrap();
        assert_eq!(controller.strategy(), Some(PlaybackStrategy::DirectTransportStream));
        assert!(!controller.engine_active());
        assert_eq!(
            *log.borrow(),
            vec![Call::SetSource(relay("https://example.com/seg.ts")), Call::Play]
        );
        assert_eq!(controller.state(), RecoveryState::Playing);
    }
}

#[test]
fn test_native_adaptive_skips_engine() {
    let (mut controller, log) = new_controller(CanPlay::Maybe);
    controller.start_session(LIVE).unwrap();
    assert_eq!(controller.strategy(), Some(PlaybackStrategy::NativeAdaptive));
    assert_eq!(*log.borrow(), vec![Call::SetSource(relay(LIVE)), Call::Play]);
    assert_eq!(controller.factory().next_id, 0);
    assert_eq!(controller.status().current(), Status::info(LOADING_STREAM));
}

#[test]
fn test_native_support_checked_on_every_play() {
    let (mut controller, _log) = new_controller(CanPlay::No);
    let first = controller.start_session(LIVE).unwrap();
    assert_eq!(controller.strategy(), Some(PlaybackStrategy::EngineAdaptive));
    let session = controller.session().unwrap();
    assert_eq!(session.target().as_str(), relay(LIVE));
    assert_eq!(session.engine().unwrap().sink.session_id(), first);

    controller.surface_mut().can_play = CanPlay::Probably;
    controller.start_session(LIVE).unwrap();
    assert_eq!(controller.strategy(), Some(PlaybackStrategy::NativeAdaptive));
    assert!(!controller.engine_active());
    assert_eq!(controller.factory().live.get(), 0);
}

// =============================================================================
// Engine sessions
// =============================================================================

#[test]
fn test_engine_session_manifest_parsed() {
    let (mut controller, log) = new_controller(CanPlay::No);
    controller.start_session(LIVE).unwrap();
    assert_eq!(controller.strategy(), Some(PlaybackStrategy::EngineAdaptive));
    assert_eq!(controller.state(), RecoveryState::Loading);
    assert_eq!(
        *log.borrow(),
        vec![Call::Created(1), Call::Load(1, relay(LIVE)), Call::Attach(1)]
    );
    assert_eq!(controller.factory().last_config, Some(EngineConfig::default()));

    emit(&controller, EngineEvent::ManifestParsed);
    assert_eq!(controller.pump_events(), 1);
    assert_eq!(controller.status().current(), Status::info(MANIFEST_LOADED));
    assert_eq!(controller.state(), RecoveryState::Playing);
    assert_eq!(log.borrow().last(), Some(&Call::Play));
}

#[test]
fn test_live_level_reported() {
    let (mut controller, _log) = new_controller(CanPlay::No);
    controller.start_session(LIVE).unwrap();
    emit(&controller, EngineEvent::LevelLoaded { live: true });
    controller.pump_events();
    assert_eq!(controller.status().current(), Status::info(LIVE_DETECTED));
    assert_eq!(controller.state(), RecoveryState::Loading);
}

#[test]
fn test_fatal_network_reissues_load() {
    let (mut controller, log) = new_controller(CanPlay::No);
    controller.start_session(LIVE).unwrap();
    emit(&controller, EngineEvent::ManifestParsed);
    emit(
        &controller,
        EngineEvent::error(EngineErrorKind::Network, "levelLoadError", true),
    );
    controller.pump_events();

    assert_eq!(log.borrow().last(), Some(&Call::StartLoad(1)));
    assert_eq!(controller.state(), RecoveryState::Loading);
    assert_eq!(
        controller.status().current(),
        Status::error("networkError: levelLoadError")
    );
    assert!(controller.engine_active());
}

#[test]
fn test_fatal_media_recovers_in_place() {
    let (mut controller, log) = new_controller(CanPlay::No);
    controller.start_session(LIVE).unwrap();
    emit(
        &controller,
        EngineEvent::error(EngineErrorKind::Media, "bufferStalledError", true),
    );
    controller.pump_events();

    assert_eq!(log.borrow().last(), Some(&Call::RecoverMedia(1)));
    assert_eq!(controller.state(), RecoveryState::Playing);
}

#[test]
fn test_fatal_other_terminates_and_new_play_starts_fresh() {
    let (mut controller, log) = new_controller(CanPlay::No);
    let first = controller.start_session(LIVE).unwrap();
    emit(&controller, EngineEvent::ManifestParsed);
    emit(
        &controller,
        EngineEvent::error(EngineErrorKind::Mux, "remuxAllocError", true),
    );
    controller.pump_events();

    assert_eq!(controller.state(), RecoveryState::Terminated);
    assert!(!controller.engine_active());
    assert_eq!(log.borrow().last(), Some(&Call::Destroy(1)));
    assert_eq!(controller.factory().live.get(), 0);

    let second = controller.start_session(LIVE).unwrap();
    assert_ne!(first, second);
    assert_eq!(controller.state(), RecoveryState::Loading);
    assert_eq!(log.borrow().iter().filter(|c| **c == Call::Destroy(1)).count(), 1);
    assert!(log.borrow().contains(&Call::Created(2)));
}

#[test]
fn test_non_fatal_error_is_informational() {
    let (mut controller, log) = new_controller(CanPlay::No);
    controller.start_session(LIVE).unwrap();
    let before = log.borrow().len();
    emit(
        &controller,
        EngineEvent::error(EngineErrorKind::Network, "fragLoadTimeOut", false),
    );
    controller.pump_events();
    assert_eq!(
        controller.status().current(),
        Status::info("networkError: fragLoadTimeOut")
    );
    assert_eq!(log.borrow().len(), before);
}

#[test]
fn test_fatal_status_wins_within_one_pump() {
    let (mut controller, _log) = new_controller(CanPlay::No);
    controller.start_session(LIVE).unwrap();
    emit(
        &controller,
        EngineEvent::error(EngineErrorKind::Network, "manifestLoadError", true),
    );
    emit(
        &controller,
        EngineEvent::error(EngineErrorKind::Network, "fragLoadTimeOut", false),
    );
    assert_eq!(controller.pump_events(), 2);
    assert_eq!(
        controller.status().current(),
        Status::error("networkError: manifestLoadError")
    );
}

#[test]
fn test_fatal_status_outlives_live_notice() {
    let (mut controller, _log) = new_controller(CanPlay::No);
    controller.start_session(LIVE).unwrap();
    emit(
        &controller,
        EngineEvent::error(EngineErrorKind::Network, "manifestLoadError", true),
    );
    emit(&controller, EngineEvent::LevelLoaded { live: true });
    assert_eq!(controller.pump_events(), 2);
    assert_eq!(
        controller.status().current(),
        Status::error("networkError: manifestLoadError")
    );

    // A later pump reports notices again
    emit(&controller, EngineEvent::LevelLoaded { live: true });
    controller.pump_events();
    assert_eq!(controller.status().current(), Status::info(LIVE_DETECTED));
}

#[test]
fn test_recovery_ceiling_from_config() {
    let config = PlayerConfig {
        recovery: RecoveryPolicy {
            max_network_recoveries: Some(1),
            max_media_recoveries: None,
        },
        ..PlayerConfig::default()
    };
    let (mut controller, log) = controller_with(config, CanPlay::No);
    controller.start_session(LIVE).unwrap();
    let fatal = EngineEvent::error(EngineErrorKind::Network, "manifestLoadError", true);
    emit(&controller, fatal.clone());
    controller.pump_events();
    emit(&controller, fatal);
    controller.pump_events();

    assert_eq!(controller.state(), RecoveryState::Terminated);
    assert_eq!(
        *log.borrow(),
        vec![
            Call::Created(1),
            Call::Load(1, relay(LIVE)),
            Call::Attach(1),
            Call::StartLoad(1),
            Call::Destroy(1),
        ]
    );
}

// =============================================================================
// Supersession & teardown
// =============================================================================

#[test]
fn test_new_session_destroys_old_engine_first() {
    let (mut controller, log) = new_controller(CanPlay::No);
    controller.start_session(LIVE).unwrap();
    controller.start_session("https://example.com/other.m3u8").unwrap();

    let log = log.borrow();
    let destroyed = log.iter().position(|c| *c == Call::Destroy(1)).unwrap();
    let created = log.iter().position(|c| *c == Call::Created(2)).unwrap();
    assert!(destroyed < created);
    assert_eq!(controller.factory().max_live.get(), 1);
    assert_eq!(controller.factory().live.get(), 1);
}

#[test]
fn test_direct_session_supersedes_engine() {
    let (mut controller, log) = new_controller(CanPlay::No);
    controller.start_session(LIVE).unwrap();
    controller.start_session("https://example.com/seg.ts").unwrap();

    let log = log.borrow();
    let destroyed = log.iter().position(|c| *c == Call::Destroy(1)).unwrap();
    let assigned = log
        .iter()
        .position(|c| matches!(c, Call::SetSource(_)))
        .unwrap();
    assert!(destroyed < assigned);
    assert!(!controller.engine_active());
}

#[test]
fn test_events_from_superseded_engine_are_dropped() {
    let (mut controller, log) = new_controller(CanPlay::No);
    controller.start_session(LIVE).unwrap();
    let stale = controller.session().unwrap().engine().unwrap().sink.clone();
    controller.start_session("https://example.com/other.m3u8").unwrap();
    controller.pump_events();
    let calls = log.borrow().len();

    stale.emit(EngineEvent::error(EngineErrorKind::Other, "internalException", true));
    stale.emit(EngineEvent::ManifestParsed);
    assert_eq!(controller.pump_events(), 2);

    assert_eq!(controller.state(), RecoveryState::Loading);
    assert!(controller.engine_active());
    assert_eq!(log.borrow().len(), calls);
    assert_eq!(controller.status().current(), Status::info(LOADING_STREAM));
}

#[test]
fn test_teardown_is_idempotent() {
    let (mut controller, log) = new_controller(CanPlay::No);
    controller.teardown();
    assert_eq!(controller.state(), RecoveryState::Idle);
    assert!(log.borrow().is_empty());

    controller.start_session(LIVE).unwrap();
    controller.teardown();
    controller.teardown();
    assert_eq!(log.borrow().iter().filter(|c| **c == Call::Destroy(1)).count(), 1);
    assert!(controller.session().is_none());
}

#[test]
fn test_drop_destroys_engine() {
    let (mut controller, log) = new_controller(CanPlay::No);
    controller.start_session(LIVE).unwrap();
    drop(controller);
    assert_eq!(log.borrow().last(), Some(&Call::Destroy(1)));
}

#[test]
fn test_engine_unavailable() {
    let (mut controller, log) = new_controller(CanPlay::No);
    controller.start_session(LIVE).unwrap();
    controller.factory_mut().available = false;

    assert!(controller.start_session("https://example.com/other.m3u8").is_none());
    assert!(controller.session().is_none());
    assert_eq!(controller.status().current(), Status::error(ENGINE_UNAVAILABLE));
    assert_eq!(log.borrow().last(), Some(&Call::Destroy(1)));
    assert_eq!(controller.factory().live.get(), 0);
}

// =============================================================================
// Autoplay
// =============================================================================

fn blocking_controller(can_play: CanPlay) -> (Controller, Log) {
    let (mut controller, log) = new_controller(can_play);
    controller.surface_mut().reject_play = Some("NotAllowedError".into());
    (controller, log)
}

#[test]
fn test_autoplay_blocked_direct() {
    let (mut controller, _log) = blocking_controller(CanPlay::No);
    controller.start_session("https://example.com/seg.ts").unwrap();
    assert_eq!(controller.status().current(), Status::error(AUTOPLAY_BLOCKED));
    assert!(controller.session().is_some());
}

#[test]
fn test_autoplay_blocked_native_includes_reason() {
    let (mut controller, _log) = blocking_controller(CanPlay::Probably);
    controller.start_session(LIVE).unwrap();
    assert_eq!(
        controller.status().current(),
        Status::error("Autoplay blocked: press Play. (NotAllowedError)")
    );
}

#[test]
fn test_autoplay_blocked_after_manifest() {
    let (mut controller, _log) = blocking_controller(CanPlay::No);
    controller.start_session(LIVE).unwrap();
    emit(&controller, EngineEvent::ManifestParsed);
    controller.pump_events();
    assert_eq!(controller.status().current(), Status::error(AUTOPLAY_BLOCKED));
    assert_eq!(controller.state(), RecoveryState::Playing);
}

// =============================================================================
// Play actions
// =============================================================================

#[test]
fn test_empty_input_is_an_error() {
    let (mut controller, log) = new_controller(CanPlay::No);
    assert!(controller.play_input("   ").is_none());
    assert_eq!(controller.status().current(), Status::error(EMPTY_INPUT));
    assert!(log.borrow().is_empty());

    assert!(controller.play_input(&format!("  {LIVE}  ")).is_some());
}

#[test]
fn test_unconfigured_preset_is_informational() {
    let config = PlayerConfig::default().with_preset("sky", "");
    let (mut controller, log) = controller_with(config, CanPlay::No);
    assert!(controller.play_preset("sky").is_none());
    assert_eq!(
        controller.status().current(),
        Status::info("No sky URL configured. Paste one in the input.")
    );
    assert!(controller.play_preset("willow").is_none());
    assert!(log.borrow().is_empty());
}

#[test]
fn test_configured_preset_plays() {
    let config = PlayerConfig::default().with_preset("willow", "https://example.com/w.m3u8");
    let (mut controller, log) = controller_with(config, CanPlay::No);
    controller.play_preset("willow").unwrap();
    assert!(log
        .borrow()
        .contains(&Call::Load(1, relay("https://example.com/w.m3u8"))));
}

#[test]
fn test_custom_relay_prefix() {
    let config = PlayerConfig { relay_prefix: "/relay/".into(), ..PlayerConfig::default() };
    let (mut controller, log) = controller_with(config, CanPlay::No);
    controller.start_session("https://example.com/seg.ts").unwrap();
    assert!(matches!(
        &log.borrow()[0],
        Call::SetSource(url) if url.starts_with("/relay/https%3A%2F%2F")
    ));
}
