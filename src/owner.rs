//! "My rewards": the owner's view of the rewards they created

use std::sync::Arc;

use premios_auth::SessionStore;
use tracing::{debug, warn};

use crate::error::Error;
use crate::notify::NotificationQueue;
use crate::rewards::{DrawResult, Reward, RewardsClient};

const LOAD_FAILED_MESSAGE: &str = "Erro ao carregar seus prêmios. Tente novamente.";
const DELETE_FAILED_MESSAGE: &str = "Erro ao deletar prêmio. Tente novamente.";
const DRAW_FAILED_MESSAGE: &str = "Erro ao realizar o sorteio. Tente novamente.";

/// Lists the current user's rewards and manages them.
///
/// Completed rewards are read-only: they can be deleted but never edited or
/// drawn again.
pub struct OwnerDashboard {
    client: Arc<RewardsClient>,
    session: Arc<SessionStore>,
    notifications: NotificationQueue,
    rewards: Vec<Reward>,
    pending_delete: Option<String>,
}

impl OwnerDashboard {
    pub fn new(
        client: Arc<RewardsClient>,
        session: Arc<SessionStore>,
        notifications: NotificationQueue,
    ) -> Self {
        Self {
            client,
            session,
            notifications,
            rewards: Vec::new(),
            pending_delete: None,
        }
    }

    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    /// Fetch the owner's rewards. On failure the list is emptied.
    pub async fn load(&mut self) -> bool {
        match self.client.mine().await {
            Ok(list) => {
                debug!("Loaded {} owned rewards", list.rewards.len());
                self.rewards = list.rewards;
                true
            }
            Err(e) => {
                warn!("Failed to load owned rewards: {}", e);
                self.rewards.clear();
                self.notifications.error(LOAD_FAILED_MESSAGE);
                false
            }
        }
    }

    /// Whether the edit and draw controls are offered for `reward`
    pub fn can_edit(&self, reward: &Reward) -> bool {
        self.session
            .identity()
            .is_some_and(|identity| reward.is_managed_by(&identity))
    }

    fn find(&self, reward_id: &str) -> Option<&Reward> {
        self.rewards.iter().find(|r| r.id == reward_id)
    }

    /// Ask for confirmation before deleting
    pub fn request_delete(&mut self, reward_id: &str) -> bool {
        if self.find(reward_id).is_none() {
            return false;
        }
        self.pending_delete = Some(reward_id.to_string());
        true
    }

    /// The reward awaiting delete confirmation
    pub fn pending_delete(&self) -> Option<&Reward> {
        self.find(self.pending_delete.as_deref()?)
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the reward awaiting confirmation, then reload the list
    pub async fn confirm_delete(&mut self) -> bool {
        let Some(reward_id) = self.pending_delete.take() else {
            return false;
        };

        match self.client.delete(&reward_id).await {
            Ok(()) => {
                self.load().await;
                true
            }
            Err(e) => {
                warn!("Failed to delete reward {}: {}", reward_id, e);
                self.notifications.error(failure_message(&e, DELETE_FAILED_MESSAGE));
                false
            }
        }
    }

    /// Draw the winner of one of the owner's open rewards, then reload
    pub async fn draw(&mut self, reward_id: &str) -> Option<DrawResult> {
        let drawable = self.find(reward_id).is_some_and(|r| self.can_edit(r));
        if !drawable {
            return None;
        }

        match self.client.draw(reward_id).await {
            Ok(result) => {
                self.notifications.success(format!(
                    "Sorteio realizado! Número vencedor: {}",
                    result.winner_number
                ));
                self.load().await;
                Some(result)
            }
            Err(e) => {
                warn!("Failed to draw reward {}: {}", reward_id, e);
                self.notifications.error(failure_message(&e, DRAW_FAILED_MESSAGE));
                None
            }
        }
    }
}

fn failure_message(e: &Error, fallback: &str) -> String {
    if e.is_auth_failure() {
        return crate::purchase::SESSION_EXPIRED_MESSAGE.to_string();
    }
    e.server_message().unwrap_or(fallback).to_string()
}
