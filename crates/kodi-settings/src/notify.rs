//! Notification sink - surfaces operation outcomes to the host UI.
//!
//! The engine consumes the sink, it does not own it: the host UI bus
//! supplies the real implementation. The default sink routes everything
//! to the log so the engine stays usable headless.

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

pub trait NotificationSink {
    /// Transient outcome message.
    fn toast(&self, kind: ToastKind, title: &str, message: &str);

    /// Blocking prompt, used for the reboot-required outcome.
    fn modal(&self, title: &str, message: &str);
}

/// Log-backed sink for headless operation.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn toast(&self, kind: ToastKind, title: &str, message: &str) {
        match kind {
            ToastKind::Success => info!("{}: {}", title, message),
            ToastKind::Error => error!("{}: {}", title, message),
        }
    }

    fn modal(&self, title: &str, message: &str) {
        warn!("{}: {}", title, message);
    }
}
