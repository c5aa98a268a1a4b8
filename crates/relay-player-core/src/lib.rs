//! Relay Player Core - playback control for relayed live streams
//!
//! This crate decides how a raw stream URL gets played and keeps playback
//! alive afterwards:
//! - Relay URL resolution (same-origin proxy routing)
//! - Native adaptive-playback capability detection
//! - Strategy selection (raw segment, native HLS, or external engine)
//! - Session control with a single live engine instance
//! - Recovery state machine driven by engine events
//! - Status reporting for the UI
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Relay Player Core                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │     URL      │  │  Capability  │  │   Strategy   │           │
//! │  │   Resolver   │  │   Detector   │  │   Selector   │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │   Session   │──── Engine (hls.js)          │
//! │                    │ Controller  │◄─── engine events            │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐                              │
//! │  │    Status    │◄─│  Recovery   │                              │
//! │  │   Reporter   │  │   Machine   │                              │
//! │  └──────────────┘  └─────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod resolver;
pub mod capability;
pub mod strategy;
pub mod surface;
pub mod engine;
pub mod recovery;
pub mod status;
pub mod session;

pub use error::{Error, Result};
pub use types::*;
pub use config::{PlayerConfig, DEFAULT_PRESETS};
pub use resolver::{UrlResolver, DEFAULT_RELAY_PREFIX};
pub use capability::{CanPlay, CapabilityProbe, HLS_MIME_TYPE};
pub use surface::{PlayRejection, RenderingSurface};
pub use engine::{
    AdaptiveEngine, EngineConfig, EngineErrorKind, EngineEvent, EngineEventSink, EngineFactory,
};
pub use recovery::{PlaybackFault, RecoveryAction, RecoveryMachine, RecoveryPolicy, Transition};
pub use status::StatusReporter;
pub use session::{Session, SessionController};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the player library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Relay Player Core initialized");
}
