//! System notification channel
//!
//! Notifications are best effort. Permission is requested once at
//! startup and never re-prompted; a notification is only shown when
//! permission was granted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Notification permission state as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    /// The user has not been asked yet
    Default,
    Granted,
    Denied,
    /// The platform has no notification support
    Unsupported,
}

/// System notification capability
pub trait Notifier: Send + Sync {
    fn permission(&self) -> NotificationPermission;

    /// Ask the user for permission and return the resulting state
    fn request_permission(&self) -> NotificationPermission;

    fn show(&self, title: &str, body: &str);
}

/// Notifier for platforms without notification support
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Unsupported
    }

    fn request_permission(&self) -> NotificationPermission {
        NotificationPermission::Unsupported
    }

    fn show(&self, _title: &str, _body: &str) {}
}

#[derive(Clone)]
pub struct Notifications {
    notifier: Arc<dyn Notifier>,
    requested: Arc<AtomicBool>,
}

impl Notifications {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Ask for permission if the user has not decided yet. Only the first call has any effect.
    pub fn request_permission_once(&self) {
        if self.requested.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.notifier.permission() == NotificationPermission::Default {
            let result = self.notifier.request_permission();
            tracing::info!("Notification permission: {:?}", result);
        }
    }

    /// Show a notification if permission was granted
    pub fn notify(&self, title: &str, body: &str) {
        match self.notifier.permission() {
            NotificationPermission::Granted => self.notifier.show(title, body),
            other => tracing::debug!("Skipping notification '{}' ({:?})", title, other),
        }
    }
}
