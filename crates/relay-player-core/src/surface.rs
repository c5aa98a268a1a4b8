//! Rendering surface boundary
//!
//! The surface is whatever actually shows video: an `HTMLVideoElement` in the
//! browser, or a recording stand-in for headless runs.

use crate::capability::CanPlay;

/// Callback run when a play request is rejected, receiving the reason.
///
/// Only ever writes status; it must not start sessions.
pub type PlayRejection = Box<dyn FnOnce(String) + 'static>;

/// Video sink the controller hands sources to
pub trait RenderingSurface {
    /// Point the surface at a new source URL
    fn set_source(&mut self, url: &str);

    /// Ask the surface to start playing. Completion is asynchronous;
    /// `on_reject` runs if the request is refused (e.g. autoplay policy).
    fn request_play(&mut self, on_reject: PlayRejection);

    /// Self-reported ability to decode `mime_type`
    fn can_play_type(&self, mime_type: &str) -> CanPlay;
}
