//! Transient, dismissible user notifications

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// Identifier of a queued notification, unique per queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub message: String,
    pub ttl: Option<Duration>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    entries: Vec<Notification>,
}

/// Ordered queue of notifications; insertion order is display order.
///
/// Cloning yields another handle to the same queue.
#[derive(Debug, Clone, Default)]
pub struct NotificationQueue {
    inner: Arc<Mutex<Inner>>,
    default_ttl: Option<Duration>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue whose convenience producers (`success`, `error`, ...) expire
    /// after `ttl`
    pub fn with_default_ttl(ttl: Option<Duration>) -> Self {
        Self {
            inner: Arc::default(),
            default_ttl: ttl,
        }
    }

    /// Append a notification. With a `ttl` it is removed once the ttl
    /// elapses, unless dismissed earlier.
    pub fn push(
        &self,
        kind: NotificationKind,
        message: impl Into<String>,
        ttl: Option<Duration>,
    ) -> NotificationId {
        let message = message.into();
        let id = {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.next_id += 1;
            let id = NotificationId(inner.next_id);
            inner.entries.push(Notification {
                id,
                kind,
                message,
                ttl,
            });
            id
        };
        debug!("Queued {:?} notification {}", kind, id);

        if let Some(ttl) = ttl {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let queue = self.clone();
                    runtime.spawn(async move {
                        tokio::time::sleep(ttl).await;
                        queue.dismiss(id);
                    });
                }
                Err(_) => warn!("No runtime to expire notification {}; it stays until dismissed", id),
            }
        }

        id
    }

    pub fn success(&self, message: impl Into<String>) -> NotificationId {
        self.push(NotificationKind::Success, message, self.default_ttl)
    }

    pub fn error(&self, message: impl Into<String>) -> NotificationId {
        self.push(NotificationKind::Error, message, self.default_ttl)
    }

    pub fn warning(&self, message: impl Into<String>) -> NotificationId {
        self.push(NotificationKind::Warning, message, self.default_ttl)
    }

    pub fn info(&self, message: impl Into<String>) -> NotificationId {
        self.push(NotificationKind::Info, message, self.default_ttl)
    }

    /// Remove a notification. Returns `false` if it was already gone.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = inner.entries.len();
        inner.entries.retain(|n| n.id != id);
        before != inner.entries.len()
    }

    /// Current notifications in display order
    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
