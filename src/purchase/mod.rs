//! Reward detail page: participation, confirmation and purchase

mod state;

use std::sync::Arc;

use premios_auth::{Identity, SessionStore};
use tracing::{debug, warn};

use crate::config::ClientOptions;
use crate::error::Error;
use crate::navigation::{DeferredRedirect, Location, Navigator, Redirect};
use crate::notify::NotificationQueue;
use crate::quota::QuotaSelector;
use crate::ranking::{rank, Ranking};
use crate::rewards::{RewardDetails, RewardsApi};

pub use state::*;

pub(crate) const LOAD_FAILED_MESSAGE: &str = "Erro ao carregar o prêmio. Tente novamente.";
pub(crate) const LOGIN_REQUIRED_MESSAGE: &str =
    "Você precisa estar logado para participar do sorteio.";
pub(crate) const PURCHASE_FAILED_MESSAGE: &str = "Erro ao realizar a compra. Tente novamente.";
pub(crate) const SESSION_EXPIRED_MESSAGE: &str = "Sua sessão expirou. Faça login novamente.";

/// Shared collaborators of the views
#[derive(Clone)]
pub struct WorkflowContext {
    pub api: Arc<dyn RewardsApi>,
    pub session: Arc<SessionStore>,
    pub notifications: NotificationQueue,
    pub navigator: Arc<dyn Navigator>,
    pub options: ClientOptions,
}

/// One reward detail view.
///
/// Every transition takes `&mut self`, so a workflow can never have two
/// purchases in flight. Dropping the workflow cancels a pending login
/// redirect.
pub struct PurchaseWorkflow {
    reward_id: String,
    location: Location,
    ctx: WorkflowContext,
    state: WorkflowState,
    details: Option<RewardDetails>,
    selector: Option<QuotaSelector>,
    pending_redirect: Option<DeferredRedirect>,
}

impl PurchaseWorkflow {
    /// A workflow for `reward_id`, shown at `location`. Call
    /// [`PurchaseWorkflow::load`] to fetch the reward.
    pub fn new(reward_id: &str, location: Location, ctx: WorkflowContext) -> Self {
        Self {
            reward_id: reward_id.to_string(),
            location,
            ctx,
            state: WorkflowState::Loading,
            details: None,
            selector: None,
            pending_redirect: None,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn details(&self) -> Option<&RewardDetails> {
        self.details.as_ref()
    }

    pub fn selector(&self) -> Option<&QuotaSelector> {
        self.selector.as_ref()
    }

    /// The quantity selector, while the user may still change it
    pub fn selector_mut(&mut self) -> Option<&mut QuotaSelector> {
        if self.state != WorkflowState::Ready || !self.shows_purchase() {
            return None;
        }
        self.selector.as_mut()
    }

    /// Whether purchase controls are displayed at all. Never true for a
    /// completed reward.
    pub fn shows_purchase(&self) -> bool {
        self.details.as_ref().is_some_and(|d| !d.reward.completed)
    }

    /// Whether the participate control is enabled
    pub fn can_participate(&self) -> bool {
        self.state == WorkflowState::Ready && self.shows_purchase()
    }

    /// The winner panel, for completed rewards
    pub fn winner(&self) -> Option<&Identity> {
        self.details.as_ref().and_then(RewardDetails::winner)
    }

    /// The buyer leaderboard, or `None` when there is nothing to show
    pub fn ranking(&self) -> Option<Ranking> {
        let ranking = rank(self.details.as_ref()?.buyer_records());
        if ranking.is_empty() {
            None
        } else {
            Some(ranking)
        }
    }

    /// Fetch the reward. Also the manual "try again" after a failure.
    pub async fn load(&mut self) {
        self.state = WorkflowState::Loading;
        match self.ctx.api.reward_details(&self.reward_id).await {
            Ok(details) => {
                self.apply(details);
                self.state = WorkflowState::Ready;
            }
            Err(e) => {
                warn!("Failed to load reward {}: {}", self.reward_id, e);
                self.details = None;
                self.selector = None;
                self.ctx.notifications.error(LOAD_FAILED_MESSAGE);
                self.state = WorkflowState::LoadFailed;
            }
        }
    }

    fn apply(&mut self, details: RewardDetails) {
        let keep_selection = self
            .selector
            .as_ref()
            .is_some_and(|s| s.price() == details.price && s.min_quota() == details.min_quota.max(1));
        if !keep_selection {
            self.selector = Some(QuotaSelector::new(details.price, details.min_quota));
        }
        self.details = Some(details);
    }

    /// The user clicked "participate"
    pub fn participate(&mut self) -> ParticipateOutcome {
        if !self.can_participate() {
            return ParticipateOutcome::Unavailable;
        }

        if !self.ctx.session.is_authenticated() {
            self.require_login();
            return ParticipateOutcome::LoginRequired;
        }

        let (Some(details), Some(selector)) = (&self.details, &self.selector) else {
            return ParticipateOutcome::Unavailable;
        };

        let min_quota = details.min_quota;
        if selector.quantity() < min_quota {
            self.ctx
                .notifications
                .error(format!("A quantidade mínima é {} números.", min_quota));
            return ParticipateOutcome::BelowMinimum { min_quota };
        }

        let intent = PurchaseIntent {
            reward_id: self.reward_id.clone(),
            quantity: selector.quantity(),
            unit_price: details.price,
        };
        debug!("Confirming purchase of {} quotas", intent.quantity);
        self.state = WorkflowState::Confirming(intent);
        ParticipateOutcome::Confirming
    }

    fn require_login(&mut self) {
        self.ctx.notifications.warning(LOGIN_REQUIRED_MESSAGE);

        let already_pending = self
            .pending_redirect
            .as_ref()
            .is_some_and(|pending| !pending.is_finished());
        if already_pending {
            return;
        }

        let redirect = Redirect::to_login(&self.ctx.options.login_path, Some(self.location.clone()));
        self.pending_redirect = Some(DeferredRedirect::schedule(
            self.ctx.navigator.clone(),
            redirect,
            self.ctx.options.login_redirect_delay,
        ));
    }

    /// Close the confirmation and discard the intent
    pub fn cancel(&mut self) -> bool {
        if matches!(self.state, WorkflowState::Confirming(_)) {
            self.state = WorkflowState::Ready;
            true
        } else {
            false
        }
    }

    /// Submit the confirmed purchase, then refetch the reward so buyers and
    /// ranking reflect the server.
    pub async fn confirm(&mut self) -> SubmitOutcome {
        let intent = match &self.state {
            WorkflowState::Confirming(intent) => intent.clone(),
            _ => return SubmitOutcome::NotConfirming,
        };

        let Some(user) = self.ctx.session.identity() else {
            self.state = WorkflowState::Ready;
            self.require_login();
            return SubmitOutcome::LoginRequired;
        };

        self.state = WorkflowState::Submitting(intent.clone());
        let result = self
            .ctx
            .api
            .buy_quotas(&intent.reward_id, &user.id, intent.quantity)
            .await;

        let outcome = match result {
            Ok(receipt) => {
                let numbers: Vec<String> = receipt.numbers.iter().map(u64::to_string).collect();
                self.ctx.notifications.success(format!(
                    "Compra realizada com sucesso! Seus números: {}",
                    numbers.join(", ")
                ));
                self.reconcile().await;
                SubmitOutcome::Purchased(receipt)
            }
            Err(e) => {
                warn!("Purchase of reward {} failed: {}", intent.reward_id, e);
                let message = failure_message(&e);
                self.ctx.notifications.error(message.clone());
                SubmitOutcome::Failed { message }
            }
        };

        self.state = WorkflowState::Ready;
        outcome
    }

    /// Refetch after a purchase. On failure the stale details stay on
    /// screen until the next manual reload.
    async fn reconcile(&mut self) {
        match self.ctx.api.reward_details(&self.reward_id).await {
            Ok(details) => self.apply(details),
            Err(e) => warn!(
                "Purchase succeeded but refreshing reward {} failed: {}",
                self.reward_id, e
            ),
        }
    }

    /// The hosting view is going away
    pub fn teardown(&mut self) {
        if let Some(pending) = self.pending_redirect.take() {
            pending.cancel();
        }
    }
}

fn failure_message(e: &Error) -> String {
    if e.is_auth_failure() {
        return SESSION_EXPIRED_MESSAGE.to_string();
    }
    e.server_message()
        .unwrap_or(PURCHASE_FAILED_MESSAGE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::navigation::HistoryNavigator;
    use crate::notify::NotificationKind;
    use crate::rewards::PurchaseReceipt;
    use async_trait::async_trait;
    use premios_auth::{AuthOptions, Credential, MemoryStorage};
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory rewards backend recording every call
    struct FakeRewards {
        details: Mutex<Vec<Result<RewardDetails>>>,
        purchase: Mutex<Option<Result<PurchaseReceipt>>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRewards {
        fn new(details: Vec<Result<RewardDetails>>) -> Arc<Self> {
            Arc::new(Self {
                details: Mutex::new(details),
                purchase: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn with_purchase(self: Arc<Self>, result: Result<PurchaseReceipt>) -> Arc<Self> {
            *self.purchase.lock().unwrap() = Some(result);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RewardsApi for FakeRewards {
        async fn reward_details(&self, reward_id: &str) -> Result<RewardDetails> {
            self.calls.lock().unwrap().push(format!("details {}", reward_id));
            let mut queued = self.details.lock().unwrap();
            if queued.is_empty() {
                return Err(Error::general("no more details"));
            }
            queued.remove(0)
        }

        async fn buy_quotas(
            &self,
            reward_id: &str,
            user_id: &str,
            quantity: u32,
        ) -> Result<PurchaseReceipt> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("buy {} {} {}", reward_id, user_id, quantity));
            self.purchase
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(Error::general("unexpected purchase")))
        }
    }

    fn details(completed: bool, buyers: serde_json::Value) -> RewardDetails {
        serde_json::from_value(json!({
            "id": "r-1",
            "owner_id": "owner-1",
            "name": "Bicicleta",
            "draw_date": "2025-12-20T18:00:00Z",
            "completed": completed,
            "created_at": "2025-10-01T12:00:00Z",
            "updated_at": "2025-10-01T12:00:00Z",
            "price": 10.0,
            "min_quota": 5,
            "buyers": buyers,
            "winner_user": if completed {
                json!({ "id": "w", "name": "Vencedora", "email": "w@email.com" })
            } else {
                json!(null)
            }
        }))
        .unwrap()
    }

    fn session(logged_in: bool) -> Arc<SessionStore> {
        let store = SessionStore::new(
            "http://localhost:8080/api/v1",
            reqwest::Client::new(),
            Arc::new(MemoryStorage::new()),
            AuthOptions::default(),
        )
        .unwrap();
        store.restore();
        if logged_in {
            store.set_session(
                Identity {
                    id: "u-1".to_string(),
                    name: "João".to_string(),
                    email: "joao@email.com".to_string(),
                    phone: None,
                    avatar: None,
                    join_date: None,
                },
                Credential::new("tok"),
            );
        }
        Arc::new(store)
    }

    fn workflow(
        api: Arc<FakeRewards>,
        logged_in: bool,
    ) -> (PurchaseWorkflow, NotificationQueue, Arc<HistoryNavigator>) {
        let notifications = NotificationQueue::new();
        let navigator = Arc::new(HistoryNavigator::new());
        let ctx = WorkflowContext {
            api,
            session: session(logged_in),
            notifications: notifications.clone(),
            navigator: navigator.clone(),
            options: ClientOptions::default().with_notification_ttl(None),
        };
        (
            PurchaseWorkflow::new("r-1", Location::new("/rewards/r-1"), ctx),
            notifications,
            navigator,
        )
    }

    fn last_message(queue: &NotificationQueue) -> (NotificationKind, String) {
        let last = queue.snapshot().pop().unwrap();
        (last.kind, last.message)
    }

    #[tokio::test]
    async fn below_minimum_never_confirms() {
        let api = FakeRewards::new(vec![Ok(details(false, json!([])))]);
        let (mut wf, notifications, _) = workflow(api.clone(), true);
        wf.load().await;

        wf.selector_mut().unwrap().input("3");
        assert_eq!(wf.participate(), ParticipateOutcome::BelowMinimum { min_quota: 5 });
        assert_eq!(wf.state(), &WorkflowState::Ready);
        assert_eq!(
            last_message(&notifications),
            (NotificationKind::Error, "A quantidade mínima é 5 números.".to_string())
        );
        assert_eq!(api.calls(), vec!["details r-1".to_string()]);
    }

    #[tokio::test]
    async fn cancel_discards_intent() {
        let api = FakeRewards::new(vec![Ok(details(false, json!([])))]);
        let (mut wf, _, _) = workflow(api.clone(), true);
        wf.load().await;

        wf.selector_mut().unwrap().select(10);
        assert_eq!(wf.participate(), ParticipateOutcome::Confirming);
        let intent = wf.state().intent().unwrap().clone();
        assert_eq!(intent.quantity, 10);
        assert_eq!(intent.total(), Decimal::from(100));

        assert!(wf.cancel());
        assert_eq!(wf.state(), &WorkflowState::Ready);
        assert_eq!(wf.confirm().await, SubmitOutcome::NotConfirming);
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn successful_purchase_refreshes_buyers() {
        let buyers_after = json!([
            { "user": { "id": "u-1", "name": "João", "email": "joao@email.com" }, "total_numbers": 8 }
        ]);
        let receipt = PurchaseReceipt {
            message: "Números comprados com sucesso".to_string(),
            numbers: (12..=19).collect(),
            quantity: 8,
        };
        let api = FakeRewards::new(vec![
            Ok(details(false, json!(null))),
            Ok(details(false, buyers_after)),
        ])
        .with_purchase(Ok(receipt.clone()));
        let (mut wf, notifications, _) = workflow(api.clone(), true);
        wf.load().await;
        assert!(wf.ranking().is_none());

        wf.selector_mut().unwrap().input("8");
        assert_eq!(wf.participate(), ParticipateOutcome::Confirming);
        assert_eq!(wf.confirm().await, SubmitOutcome::Purchased(receipt));

        assert_eq!(wf.state(), &WorkflowState::Ready);
        assert_eq!(
            api.calls(),
            vec![
                "details r-1".to_string(),
                "buy r-1 u-1 8".to_string(),
                "details r-1".to_string()
            ]
        );
        let (kind, message) = last_message(&notifications);
        assert_eq!(kind, NotificationKind::Success);
        assert!(message.contains("12, 13, 14, 15, 16, 17, 18, 19"));
        assert_eq!(wf.ranking().unwrap().top[0].buyer.total_numbers, 8);
    }

    #[tokio::test]
    async fn refresh_failure_keeps_success_and_stale_details() {
        let receipt = PurchaseReceipt {
            message: String::new(),
            numbers: vec![1, 2, 3, 4, 5],
            quantity: 5,
        };
        let api = FakeRewards::new(vec![Ok(details(false, json!([])))]).with_purchase(Ok(receipt));
        let (mut wf, notifications, _) = workflow(api, true);
        wf.load().await;
        let before = wf.details().cloned();

        assert_eq!(wf.participate(), ParticipateOutcome::Confirming);
        assert!(matches!(wf.confirm().await, SubmitOutcome::Purchased(_)));

        assert_eq!(wf.state(), &WorkflowState::Ready);
        assert_eq!(wf.details().cloned(), before);
        let kinds: Vec<NotificationKind> = notifications.snapshot().iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NotificationKind::Success]);
    }

    #[tokio::test]
    async fn failed_purchase_uses_server_message_and_keeps_state() {
        let api = FakeRewards::new(vec![Ok(details(false, json!([])))]).with_purchase(Err(
            Error::Api {
                status: 500,
                message: Some("números esgotados".to_string()),
            },
        ));
        let (mut wf, notifications, _) = workflow(api.clone(), true);
        wf.load().await;
        let before = wf.details().cloned();

        wf.participate();
        assert_eq!(
            wf.confirm().await,
            SubmitOutcome::Failed {
                message: "números esgotados".to_string()
            }
        );
        assert_eq!(wf.state(), &WorkflowState::Ready);
        assert_eq!(wf.details().cloned(), before);
        assert_eq!(
            last_message(&notifications),
            (NotificationKind::Error, "números esgotados".to_string())
        );
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn failed_purchase_without_message_uses_fallback() {
        let api = FakeRewards::new(vec![Ok(details(false, json!([])))])
            .with_purchase(Err(Error::general("connection reset")));
        let (mut wf, _, _) = workflow(api, true);
        wf.load().await;
        wf.participate();

        assert_eq!(
            wf.confirm().await,
            SubmitOutcome::Failed {
                message: PURCHASE_FAILED_MESSAGE.to_string()
            }
        );
    }

    #[tokio::test]
    async fn completed_reward_offers_no_purchase() {
        let api = FakeRewards::new(Vec::new());
        for logged_in in [true, false] {
            let (mut wf, notifications, navigator) = workflow(api.clone(), logged_in);
            api.details.lock().unwrap().push(Ok(details(true, json!([]))));
            wf.load().await;

            assert!(!wf.shows_purchase());
            assert!(!wf.can_participate());
            assert!(wf.selector_mut().is_none());
            assert_eq!(wf.winner().unwrap().name, "Vencedora");
            assert_eq!(wf.participate(), ParticipateOutcome::Unavailable);
            assert!(notifications.is_empty());
            assert!(navigator.history().is_empty());
        }
    }

    #[tokio::test]
    async fn load_failure_is_not_interactive_until_reload() {
        let api = FakeRewards::new(vec![
            Err(Error::Api {
                status: 404,
                message: None,
            }),
            Ok(details(false, json!([]))),
        ]);
        let (mut wf, notifications, _) = workflow(api, true);

        wf.load().await;
        assert_eq!(wf.state(), &WorkflowState::LoadFailed);
        assert_eq!(wf.participate(), ParticipateOutcome::Unavailable);
        assert_eq!(
            last_message(&notifications),
            (NotificationKind::Error, LOAD_FAILED_MESSAGE.to_string())
        );

        wf.load().await;
        assert_eq!(wf.state(), &WorkflowState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn unauthenticated_participation_redirects_once_after_delay() {
        let api = FakeRewards::new(vec![Ok(details(false, json!([])))]);
        let (mut wf, notifications, navigator) = workflow(api.clone(), false);
        wf.load().await;

        assert_eq!(wf.participate(), ParticipateOutcome::LoginRequired);
        assert_eq!(wf.participate(), ParticipateOutcome::LoginRequired);
        assert_eq!(wf.state(), &WorkflowState::Ready);
        assert_eq!(
            last_message(&notifications),
            (NotificationKind::Warning, LOGIN_REQUIRED_MESSAGE.to_string())
        );

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(navigator.history().is_empty());

        tokio::time::sleep(Duration::from_secs(1)).await;
        for _ in 0..10 {
            if !navigator.history().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(
            navigator.history(),
            vec![Redirect::to_login("/auth/login", Some(Location::new("/rewards/r-1")))]
        );
        assert_eq!(api.calls(), vec!["details r-1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_pending_redirect() {
        let api = FakeRewards::new(vec![Ok(details(false, json!([])))]);
        let (mut wf, _, navigator) = workflow(api, false);
        wf.load().await;

        assert_eq!(wf.participate(), ParticipateOutcome::LoginRequired);
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(wf);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(navigator.history().is_empty());
    }

    #[test]
    fn unauthenticated_participation_outside_runtime_redirects_now() {
        let api = FakeRewards::new(vec![Ok(details(false, json!([])))]);
        let (mut wf, notifications, navigator) = workflow(api, false);
        tokio_test::block_on(wf.load());

        assert_eq!(wf.participate(), ParticipateOutcome::LoginRequired);
        assert_eq!(wf.state(), &WorkflowState::Ready);
        assert_eq!(
            last_message(&notifications),
            (NotificationKind::Warning, LOGIN_REQUIRED_MESSAGE.to_string())
        );
        assert_eq!(
            navigator.history(),
            vec![Redirect::to_login("/auth/login", Some(Location::new("/rewards/r-1")))]
        );
    }

    #[tokio::test]
    async fn malformed_buyers_do_not_blank_the_page() {
        let buyers = json!([
            null,
            7,
            { "user": { "id": "u-1", "name": "João", "email": "joao@email.com" }, "total_numbers": 3 }
        ]);
        let api = FakeRewards::new(vec![Ok(details(false, buyers))]);
        let (mut wf, notifications, _) = workflow(api, true);
        wf.load().await;

        assert_eq!(wf.state(), &WorkflowState::Ready);
        assert!(notifications.is_empty());
        let ranking = wf.ranking().unwrap();
        assert_eq!(ranking.top.len(), 1);
        assert_eq!(ranking.top[0].buyer.user.name, "João");
        assert!(ranking.rest.is_empty());
    }
}
