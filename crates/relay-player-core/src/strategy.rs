//! Playback strategy selection

use crate::{capability::CapabilityProbe, PlaybackStrategy, ResolvedTarget};
use tracing::debug;

/// File extension of raw transport-stream segments
pub const RAW_SEGMENT_EXTENSION: &str = ".ts";

/// Whether the operator's input names a raw transport-stream segment
pub fn is_raw_segment(raw_url: &str) -> bool {
    raw_url
        .trim()
        .to_lowercase()
        .ends_with(RAW_SEGMENT_EXTENSION)
}

/// Choose how to fetch and decode a resolved stream.
///
/// Raw segments always play directly; the capability probe is only
/// consulted for manifests.
pub fn select(
    raw_url: &str,
    target: &ResolvedTarget,
    probe: &(impl CapabilityProbe + ?Sized),
) -> PlaybackStrategy {
    let strategy = if is_raw_segment(raw_url) {
        PlaybackStrategy::DirectTransportStream
    } else if probe.supports_native_adaptive_playback() {
        PlaybackStrategy::NativeAdaptive
    } else {
        PlaybackStrategy::EngineAdaptive
    };

    debug!(target = %target, strategy = %strategy, "Strategy selected");
    strategy
}
