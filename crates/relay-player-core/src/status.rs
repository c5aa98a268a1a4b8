//! Status reporting
//!
//! Keeps the last human-readable status only. UI collaborators either poll
//! [`StatusReporter::current`] or await changes on a subscription.

use crate::{Severity, Status};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Overwriting status sink shared by the controller and play callbacks
#[derive(Debug, Clone)]
pub struct StatusReporter {
    tx: Arc<watch::Sender<Status>>,
}

impl StatusReporter {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Status::default());
        Self { tx: Arc::new(tx) }
    }

    /// Replace the current status
    pub fn report(&self, message: impl Into<String>, severity: Severity) {
        let status = Status { message: message.into(), severity };
        match severity {
            Severity::Info => info!(status = %status.message, "Status"),
            Severity::Error => warn!(status = %status.message, "Status"),
        }
        self.tx.send_replace(status);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.report(message, Severity::Info);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.report(message, Severity::Error);
    }

    /// Last reported status
    pub fn current(&self) -> Status {
        self.tx.borrow().clone()
    }

    /// Subscribe to status changes
    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.tx.subscribe()
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}
