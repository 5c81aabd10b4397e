//! BNUPremios Rust Client Library
//!
//! Client core for the BNUPremios raffle marketplace: session handling,
//! protected views, notifications, quota selection, the purchase workflow
//! and the buyer ranking.

pub mod config;
pub mod error;
pub mod fetch;
pub mod gate;
pub mod navigation;
pub mod notify;
pub mod owner;
pub mod purchase;
pub mod quota;
pub mod ranking;
pub mod rewards;

pub use premios_auth as auth;

use std::sync::Arc;

use premios_auth::{RegisterPayload, SessionStorage, SessionStore};
use reqwest::Client;
use tracing::debug;

use crate::config::ClientOptions;
use crate::error::Result;
use crate::gate::AccessGate;
use crate::navigation::{Location, Navigator, Redirect};
use crate::notify::NotificationQueue;
use crate::owner::OwnerDashboard;
use crate::purchase::{PurchaseWorkflow, WorkflowContext};
use crate::rewards::RewardsClient;

const LOGIN_FAILED_MESSAGE: &str = "Email ou senha incorretos";
const REGISTER_SUCCESS_MESSAGE: &str = "Cadastro realizado com sucesso! Faça login para continuar.";
const REGISTER_FAILED_MESSAGE: &str = "Erro ao registrar. Tente novamente.";

/// The main entry point for the BNUPremios client.
///
/// Owns one HTTP client, the session, the notification queue and the
/// rewards client, and hands out views wired to them.
pub struct Premios {
    /// HTTP client shared by every request
    pub http_client: Client,
    /// Client options
    pub options: ClientOptions,
    session: Arc<SessionStore>,
    notifications: NotificationQueue,
    navigator: Arc<dyn Navigator>,
    rewards: Arc<RewardsClient>,
}

impl Premios {
    /// Create a new client. Call [`Premios::restore`] before mounting any
    /// protected view.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use premios_client::{Premios, config::ClientOptions};
    /// use premios_client::auth::MemoryStorage;
    /// use premios_client::navigation::HistoryNavigator;
    ///
    /// let premios = Premios::new(
    ///     ClientOptions::default(),
    ///     Arc::new(MemoryStorage::new()),
    ///     Arc::new(HistoryNavigator::new()),
    /// )
    /// .unwrap();
    /// premios.restore();
    /// ```
    pub fn new(
        options: ClientOptions,
        storage: Arc<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let session = Arc::new(SessionStore::new(
            &options.api_url,
            http_client.clone(),
            storage,
            options.auth_options(),
        )?);
        let notifications = NotificationQueue::with_default_ttl(options.notification_ttl);
        let rewards = Arc::new(RewardsClient::new(
            http_client.clone(),
            options.clone(),
            session.clone(),
            navigator.clone(),
        ));

        Ok(Self {
            http_client,
            options,
            session,
            notifications,
            navigator,
            rewards,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn rewards(&self) -> &Arc<RewardsClient> {
        &self.rewards
    }

    /// Load the persisted session
    pub fn restore(&self) {
        self.session.restore();
    }

    /// Guard for a protected view mounted at `location`
    pub fn gate(&self, location: Location) -> AccessGate {
        AccessGate::new(
            self.session.clone(),
            self.navigator.clone(),
            &self.options.login_path,
            location,
        )
    }

    /// Detail view of `reward_id`. Call [`PurchaseWorkflow::load`] to fetch it.
    pub fn purchase_workflow(&self, reward_id: &str, location: Location) -> PurchaseWorkflow {
        let ctx = WorkflowContext {
            api: self.rewards.clone(),
            session: self.session.clone(),
            notifications: self.notifications.clone(),
            navigator: self.navigator.clone(),
            options: self.options.clone(),
        };
        PurchaseWorkflow::new(reward_id, location, ctx)
    }

    pub fn owner_dashboard(&self) -> OwnerDashboard {
        OwnerDashboard::new(
            self.rewards.clone(),
            self.session.clone(),
            self.notifications.clone(),
        )
    }

    /// Log in and go back to where the user was headed (`from`), or home.
    /// Returns the redirect taken, or `None` if the login failed.
    pub async fn login_and_resume(
        &self,
        email: &str,
        password: &str,
        from: Option<Location>,
    ) -> Option<Redirect> {
        if !self.session.login(email, password).await {
            self.notifications.error(LOGIN_FAILED_MESSAGE);
            return None;
        }

        let destination = from
            .map(|location| location.path)
            .unwrap_or_else(|| self.options.home_path.clone());
        debug!("Resuming at {}", destination);
        let redirect = Redirect::to(destination);
        self.navigator.navigate(redirect.clone());
        Some(redirect)
    }

    /// Create an account and send the user to the login page. The new
    /// account is not signed in.
    pub async fn register(&self, payload: &RegisterPayload) -> bool {
        if !self.session.register(payload).await {
            self.notifications.error(REGISTER_FAILED_MESSAGE);
            return false;
        }

        self.notifications.success(REGISTER_SUCCESS_MESSAGE);
        self.navigator
            .navigate(Redirect::to(self.options.login_path.clone()));
        true
    }

    pub fn logout(&self) {
        self.session.logout();
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{Identity, SessionStatus, SessionStore};
    pub use crate::config::ClientOptions;
    pub use crate::error::{Error, Result};
    pub use crate::gate::{AccessGate, GateState, GateView};
    pub use crate::navigation::{HistoryNavigator, Location, Navigator, Redirect};
    pub use crate::notify::{Notification, NotificationKind, NotificationQueue};
    pub use crate::purchase::{ParticipateOutcome, PurchaseWorkflow, SubmitOutcome, WorkflowState};
    pub use crate::quota::QuotaSelector;
    pub use crate::ranking::{rank, Ranking};
    pub use crate::rewards::{RewardDetails, RewardsApi, RewardsClient};
    pub use crate::Premios;
}
