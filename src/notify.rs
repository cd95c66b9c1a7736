//! User-visible notifications (toast equivalents) raised by store actions.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warn,
    Info,
    Success,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub severity: Severity,
    /// Short headline, e.g. "Unable to load buckets".
    pub summary: String,
    /// Underlying error message.
    pub detail: String,
}

impl Notification {
    pub fn error(summary: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self::new(Severity::Error, summary, detail)
    }

    pub fn new(severity: Severity, summary: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self {
            id: Uuid::new_v4(),
            severity,
            summary: summary.into(),
            detail: detail.to_string(),
        }
    }
}

/// Sink for notifications; implemented by whatever surfaces them to a user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}

/// Notifier that only emits tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let Notification {
            id,
            severity,
            summary,
            detail,
        } = notification;
        match severity {
            Severity::Error => {
                tracing::error!(target = "bcbox::store", %id, detail = %detail, "{summary}");
            }
            Severity::Warn => {
                tracing::warn!(target = "bcbox::store", %id, detail = %detail, "{summary}");
            }
            Severity::Info | Severity::Success => {
                tracing::info!(target = "bcbox::store", %id, detail = %detail, "{summary}");
            }
        }
    }
}

/// Queue of pending notifications for a front end to poll and dismiss.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything queued so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock())
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        TracingNotifier.notify(notification.clone());
        self.entries.lock().push(notification);
    }
}
