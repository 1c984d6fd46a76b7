// src/core/notifications.rs
//! Session-scoped queue of short-lived user-facing messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(5);

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Added(Notification),
    Removed(Uuid),
    Cleared,
}

struct Entry {
    notification: Notification,
    /// `None` when no runtime was available to schedule the expiry
    expiry: Option<JoinHandle<()>>,
}

impl Entry {
    fn cancel(&self) {
        if let Some(expiry) = &self.expiry {
            expiry.abort();
        }
    }
}

struct Inner {
    entries: Mutex<Vec<Entry>>,
    events: broadcast::Sender<NotificationEvent>,
    lifetime: Duration,
}

impl Inner {
    fn entries(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take(&self, id: Uuid) -> Option<Entry> {
        let mut entries = self.entries();
        let index = entries.iter().position(|e| e.notification.id == id)?;
        Some(entries.remove(index))
    }

    fn publish(&self, event: NotificationEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Cloneable handle to one notification queue.
///
/// Every notification gets its own expiry task; `dismiss` and `clear` abort
/// the pending tasks they make redundant. Outside a tokio runtime nothing can
/// be scheduled, so notifications stay until dismissed or cleared.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_lifetime(DEFAULT_LIFETIME)
    }

    pub fn with_lifetime(lifetime: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(Vec::new()),
                events,
                lifetime,
            }),
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.inner.lifetime
    }

    /// Queue a message and schedule its removal; returns its id
    pub fn notify(&self, kind: NotificationKind, message: impl Into<String>) -> Uuid {
        let notification = Notification {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            created_at: Utc::now(),
        };
        let id = notification.id;

        match kind {
            NotificationKind::Error => error!("[notification] {}", notification.message),
            NotificationKind::Warning => warn!("[notification] {}", notification.message),
            _ => info!("[notification] {}", notification.message),
        }

        // Hold the lock while spawning so the expiry task cannot run before the entry exists
        let mut entries = self.inner.entries();
        let expiry = match Handle::try_current() {
            Ok(handle) => Some(handle.spawn(expire(
                Arc::downgrade(&self.inner),
                id,
                self.inner.lifetime,
            ))),
            Err(_) => {
                warn!("No tokio runtime; notification {} will not expire", id);
                None
            }
        };
        entries.push(Entry {
            notification: notification.clone(),
            expiry,
        });
        drop(entries);

        self.inner.publish(NotificationEvent::Added(notification));
        id
    }

    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.notify(NotificationKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.notify(NotificationKind::Error, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> Uuid {
        self.notify(NotificationKind::Warning, message)
    }

    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.notify(NotificationKind::Info, message)
    }

    /// Remove a notification before it expires. Unknown ids are ignored.
    pub fn dismiss(&self, id: Uuid) -> bool {
        match self.inner.take(id) {
            Some(entry) => {
                entry.cancel();
                self.inner.publish(NotificationEvent::Removed(id));
                true
            }
            None => false,
        }
    }

    /// Drop every queued notification and cancel all pending expiries
    pub fn clear(&self) {
        let drained: Vec<Entry> = self.inner.entries().drain(..).collect();
        for entry in &drained {
            entry.cancel();
        }
        debug!("Cleared {} notifications", drained.len());
        self.inner.publish(NotificationEvent::Cleared);
    }

    /// Snapshot of the queue in creation order
    pub fn list(&self) -> Vec<Notification> {
        self.inner
            .entries()
            .iter()
            .map(|e| e.notification.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.inner.events.subscribe()
    }
}

async fn expire(inner: Weak<Inner>, id: Uuid, after: Duration) {
    tokio::time::sleep(after).await;

    let Some(inner) = inner.upgrade() else {
        return;
    };
    if inner.take(id).is_some() {
        debug!("Notification {} expired", id);
        inner.publish(NotificationEvent::Removed(id));
    }
}
