//! States and outcomes of the purchase workflow

use rust_decimal::Decimal;

use crate::rewards::PurchaseReceipt;

/// What the user is about to buy. Lives from the participate click until
/// the purchase resolves or is cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseIntent {
    pub reward_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl PurchaseIntent {
    pub fn total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    /// Fetching reward details
    Loading,
    /// Details could not be fetched; only a manual reload leaves this state
    LoadFailed,
    /// Details on screen; completed rewards stay here for good
    Ready,
    /// Waiting for the user to confirm the intent
    Confirming(PurchaseIntent),
    /// Purchase request in flight
    Submitting(PurchaseIntent),
}

impl WorkflowState {
    pub fn intent(&self) -> Option<&PurchaseIntent> {
        match self {
            WorkflowState::Confirming(intent) | WorkflowState::Submitting(intent) => Some(intent),
            _ => None,
        }
    }
}

/// Result of clicking "participate"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipateOutcome {
    /// Confirmation is now showing
    Confirming,
    /// Not logged in; a redirect to the login page is scheduled
    LoginRequired,
    /// Selected quantity is under the reward's minimum
    BelowMinimum { min_quota: u32 },
    /// Nothing to participate in: not ready, or the reward is completed
    Unavailable,
}

/// Result of confirming a purchase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Purchased(PurchaseReceipt),
    /// The purchase was rejected or never reached the server
    Failed { message: String },
    /// The session ended between confirming and submitting
    LoginRequired,
    /// There was no confirmation to act on
    NotConfirming,
}
