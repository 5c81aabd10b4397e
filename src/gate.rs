//! Access gate for protected views

use std::sync::Arc;

use premios_auth::SessionStore;
use tracing::debug;

use crate::navigation::{Location, Navigator, Redirect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// The session is still being restored
    Checking,
    /// Restored without an identity
    Denied,
    /// Restored with an identity
    Granted,
}

/// What a protected view shows for the current gate state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateView<T> {
    /// Neutral placeholder while checking
    Placeholder,
    /// Nothing; the redirect to login has been issued
    Denied,
    Granted(T),
}

/// Guards one mounted view.
///
/// The gate decides once, the first time it observes the session with
/// restore complete. A denial redirects to the login page exactly once,
/// carrying the guarded location so login can send the user back.
pub struct AccessGate {
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    location: Location,
    state: GateState,
}

impl AccessGate {
    pub fn new(
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        login_path: &str,
        location: Location,
    ) -> Self {
        Self {
            session,
            navigator,
            login_path: login_path.to_string(),
            location,
            state: GateState::Checking,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Look at the session and decide if restore has completed. Calling
    /// this again after a decision does nothing.
    pub fn evaluate(&mut self) -> GateState {
        if self.state != GateState::Checking {
            return self.state;
        }

        let status = self.session.status();
        if status.loading {
            return GateState::Checking;
        }

        if status.authenticated {
            self.state = GateState::Granted;
        } else {
            self.state = GateState::Denied;
            debug!("Access to {} denied", self.location.path);
            self.navigator.navigate(Redirect::to_login(
                &self.login_path,
                Some(self.location.clone()),
            ));
        }
        self.state
    }

    /// Wait until the session has been restored, then decide
    pub async fn resolve(&mut self) -> GateState {
        let mut status = self.session.subscribe();
        loop {
            let state = self.evaluate();
            if state != GateState::Checking {
                return state;
            }
            if status.changed().await.is_err() {
                return self.evaluate();
            }
        }
    }

    /// Render the view for the current state. `view` only runs when access
    /// is granted.
    pub fn render<T>(&mut self, view: impl FnOnce() -> T) -> GateView<T> {
        match self.evaluate() {
            GateState::Checking => GateView::Placeholder,
            GateState::Denied => GateView::Denied,
            GateState::Granted => GateView::Granted(view()),
        }
    }
}
