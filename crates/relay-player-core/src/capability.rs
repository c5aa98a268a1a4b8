//! Native adaptive-playback capability detection

use crate::surface::RenderingSurface;
use serde::{Deserialize, Serialize};

/// Media type of HLS adaptive manifests
pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

/// Answer of a media element's `canPlayType` query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanPlay {
    Probably,
    Maybe,
    No,
}

impl CanPlay {
    /// Map a raw `canPlayType` answer; anything unrecognised counts as `No`
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim().to_ascii_lowercase().as_str() {
            "probably" => CanPlay::Probably,
            "maybe" => CanPlay::Maybe,
            _ => CanPlay::No,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, CanPlay::Probably | CanPlay::Maybe)
    }
}

impl std::fmt::Display for CanPlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanPlay::Probably => write!(f, "probably"),
            CanPlay::Maybe => write!(f, "maybe"),
            CanPlay::No => write!(f, "no"),
        }
    }
}

/// Anything that can report native adaptive-manifest support
pub trait CapabilityProbe {
    fn supports_native_adaptive_playback(&self) -> bool;
}

impl<S: RenderingSurface + ?Sized> CapabilityProbe for S {
    fn supports_native_adaptive_playback(&self) -> bool {
        self.can_play_type(HLS_MIME_TYPE).is_supported()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_answer() {
        assert_eq!(CanPlay::from_answer("probably"), CanPlay::Probably);
        assert_eq!(CanPlay::from_answer("maybe"), CanPlay::Maybe);
        assert_eq!(CanPlay::from_answer(""), CanPlay::No);
        assert_eq!(CanPlay::from_answer("no"), CanPlay::No);
    }

    #[test]
    fn test_support_mapping() {
        assert!(CanPlay::Probably.is_supported());
        assert!(CanPlay::Maybe.is_supported());
        assert!(!CanPlay::No.is_supported());
    }
}
