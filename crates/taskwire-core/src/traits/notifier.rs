//! User-facing notification surface.

use std::fmt;

use tracing::{error, info};

/// Severity of a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationLevel::Success => "success",
            NotificationLevel::Info => "info",
            NotificationLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// Shows short messages to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, level: NotificationLevel);
}

/// A [`Notifier`] that only writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, level: NotificationLevel) {
        match level {
            NotificationLevel::Error => error!(%level, "{}", message),
            _ => info!(%level, "{}", message),
        }
    }
}
