//! Navigation seam between the client core and whatever hosts it

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A place in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// A navigation request. `from` is the location to come back to after a
/// login detour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
    pub from: Option<Location>,
}

impl Redirect {
    /// Send the user to `login_path`, remembering where they were
    pub fn to_login(login_path: &str, from: Option<Location>) -> Self {
        Self {
            path: login_path.to_string(),
            from,
        }
    }

    pub fn to(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            from: None,
        }
    }
}

/// Performs navigation on behalf of the client core
pub trait Navigator: Send + Sync {
    fn navigate(&self, redirect: Redirect);
}

/// Navigator that records every request in order. Suitable for headless
/// hosts that poll for the next destination.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<Redirect>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All redirects so far, oldest first
    pub fn history(&self) -> Vec<Redirect> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<Redirect> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, redirect: Redirect) {
        debug!("Navigating to {}", redirect.path);
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(redirect);
    }
}

/// A navigation scheduled for later. Dropping the handle cancels it, so a
/// view that is torn down before the delay elapses never navigates.
#[derive(Debug)]
pub struct DeferredRedirect {
    handle: Option<JoinHandle<()>>,
}

impl DeferredRedirect {
    /// Navigate to `redirect` after `delay`. Outside a tokio runtime there is
    /// no timer to wait on, so the navigation happens right away.
    pub fn schedule(navigator: Arc<dyn Navigator>, redirect: Redirect, delay: Duration) -> Self {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let handle = runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.navigate(redirect);
                });
                Self {
                    handle: Some(handle),
                }
            }
            Err(_) => {
                warn!("No runtime to delay redirect to {}; navigating now", redirect.path);
                navigator.navigate(redirect);
                Self { handle: None }
            }
        }
    }

    /// Whether the redirect already happened (or was cancelled)
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub fn cancel(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

impl Drop for DeferredRedirect {
    fn drop(&mut self) {
        self.cancel();
    }
}
