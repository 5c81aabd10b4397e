//! Rewards API: listing, details, purchases and owner management

mod types;

use std::sync::Arc;

use async_trait::async_trait;
use premios_auth::{Credential, SessionStore};
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::{Fetch, FetchBuilder};
use crate::navigation::{Navigator, Redirect};

pub use types::*;

/// The rewards operations the purchase workflow depends on
#[async_trait]
pub trait RewardsApi: Send + Sync {
    /// Fetch a reward with its buyers
    async fn reward_details(&self, reward_id: &str) -> Result<RewardDetails>;

    /// Buy `quantity` quotas of `reward_id` for `user_id`
    async fn buy_quotas(&self, reward_id: &str, user_id: &str, quantity: u32)
        -> Result<PurchaseReceipt>;
}

/// Client for the `/rewards` endpoints.
///
/// Protected calls attach the session's bearer credential. When the server
/// says the credential is no longer good, the session is logged out, the
/// user is sent to the login page and [`Error::Unauthorized`] is returned,
/// whichever operation triggered it.
pub struct RewardsClient {
    url: String,
    http_client: Client,
    options: ClientOptions,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl RewardsClient {
    pub fn new(
        http_client: Client,
        options: ClientOptions,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            url: options.api_url.trim_end_matches('/').to_string(),
            http_client,
            options,
            session,
            navigator,
        }
    }

    fn rewards_url(&self, path: &str) -> String {
        format!("{}/rewards{}", self.url, path)
    }

    fn with_timeout<'a>(&self, builder: FetchBuilder<'a>) -> FetchBuilder<'a> {
        builder.timeout(self.options.request_timeout)
    }

    fn credential(&self) -> Result<Credential> {
        match self.session.credential() {
            Some(credential) => Ok(credential),
            None => Err(self.expire_session("missing credential".to_string())),
        }
    }

    /// Run the shared expired-credential handling over a protected call
    fn guard<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Err(e) if e.is_auth_failure() => Err(self.expire_session(e.to_string())),
            other => other,
        }
    }

    fn expire_session(&self, reason: String) -> Error {
        warn!("Credential rejected ({}); logging out", reason);
        self.session.logout();
        self.navigator
            .navigate(Redirect::to_login(&self.options.login_path, None));
        Error::Unauthorized(reason)
    }

    /// List rewards, one page at a time
    pub async fn list(&self, page: Option<u32>, limit: Option<u32>) -> Result<RewardList> {
        let mut builder = self.with_timeout(Fetch::get(&self.http_client, &self.rewards_url("")));
        if let Some(page) = page {
            builder = builder.query("page", page);
        }
        if let Some(limit) = limit {
            builder = builder.query("limit", limit);
        }
        builder.execute().await
    }

    /// A single reward without pricing or buyers
    pub async fn get(&self, reward_id: &str) -> Result<Reward> {
        self.with_timeout(Fetch::get(
            &self.http_client,
            &self.rewards_url(&format!("/{}", reward_id)),
        ))
        .execute()
        .await
    }

    /// A reward with pricing, images, buyers and winner
    pub async fn details(&self, reward_id: &str) -> Result<RewardDetails> {
        debug!("Fetching details of reward {}", reward_id);
        self.with_timeout(Fetch::get(
            &self.http_client,
            &self.rewards_url(&format!("/{}/details", reward_id)),
        ))
        .execute()
        .await
    }

    /// Buy quotas for a user
    pub async fn buy(&self, reward_id: &str, user_id: &str, quantity: u32) -> Result<PurchaseReceipt> {
        let credential = self.credential()?;
        let url = self.rewards_url(&format!("/{}/buyers/{}", reward_id, user_id));
        let result = self
            .with_timeout(Fetch::post(&self.http_client, &url))
            .bearer_auth(&credential)
            .json(&PurchaseRequest { quantity })?
            .execute()
            .await;
        self.guard(result)
    }

    /// Rewards owned by the current user
    pub async fn mine(&self) -> Result<RewardList> {
        let credential = self.credential()?;
        let result = self
            .with_timeout(Fetch::get(&self.http_client, &self.rewards_url("/mine")))
            .bearer_auth(&credential)
            .execute()
            .await;
        self.guard(result)
    }

    pub async fn create(&self, request: &RewardRequest) -> Result<Reward> {
        let credential = self.credential()?;
        let result = self
            .with_timeout(Fetch::post(&self.http_client, &self.rewards_url("")))
            .bearer_auth(&credential)
            .json(request)?
            .execute()
            .await;
        self.guard(result)
    }

    pub async fn update(&self, reward_id: &str, update: &RewardUpdate) -> Result<Reward> {
        let credential = self.credential()?;
        let url = self.rewards_url(&format!("/{}", reward_id));
        let result = self
            .with_timeout(Fetch::put(&self.http_client, &url))
            .bearer_auth(&credential)
            .json(update)?
            .execute()
            .await;
        self.guard(result)
    }

    pub async fn delete(&self, reward_id: &str) -> Result<()> {
        let credential = self.credential()?;
        let url = self.rewards_url(&format!("/{}", reward_id));
        let result = self
            .with_timeout(Fetch::delete(&self.http_client, &url))
            .bearer_auth(&credential)
            .execute_empty()
            .await;
        self.guard(result)
    }

    /// Draw the winning number of a reward
    pub async fn draw(&self, reward_id: &str) -> Result<DrawResult> {
        let credential = self.credential()?;
        let url = self.rewards_url(&format!("/{}/draw", reward_id));
        let result = self
            .with_timeout(Fetch::post(&self.http_client, &url))
            .bearer_auth(&credential)
            .execute()
            .await;
        self.guard(result)
    }
}

#[async_trait]
impl RewardsApi for RewardsClient {
    async fn reward_details(&self, reward_id: &str) -> Result<RewardDetails> {
        self.details(reward_id).await
    }

    async fn buy_quotas(
        &self,
        reward_id: &str,
        user_id: &str,
        quantity: u32,
    ) -> Result<PurchaseReceipt> {
        self.buy(reward_id, user_id, quantity).await
    }
}
