//! Wire types for rewards, buyers and purchases

use chrono::{DateTime, Utc};
use premios_auth::Identity;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

fn default_min_quota() -> u32 {
    1
}

/// A raffle prize
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub draw_date: DateTime<Utc>,
    /// Terminal: once drawn, a reward is never purchasable or editable again
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawn_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reward {
    /// Whether `identity` may edit, delete or draw this reward
    pub fn is_managed_by(&self, identity: &Identity) -> bool {
        !self.completed && self.owner_id == identity.id
    }
}

/// A reward with its pricing, images and buyers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardDetails {
    #[serde(flatten)]
    pub reward: Reward,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default = "default_min_quota")]
    pub min_quota: u32,
    /// `null` and `[]` both mean "no buyers yet". Entries are kept raw;
    /// malformed ones are dropped when ranking.
    #[serde(default)]
    pub buyers: Option<Vec<BuyerRecord>>,
    /// Only meaningful once the reward is completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_user: Option<Identity>,
}

impl RewardDetails {
    pub fn buyer_records(&self) -> &[BuyerRecord] {
        self.buyers.as_deref().unwrap_or_default()
    }

    /// The winner, only for completed rewards
    pub fn winner(&self) -> Option<&Identity> {
        if self.reward.completed {
            self.winner_user.as_ref()
        } else {
            None
        }
    }
}

/// A buyer entry exactly as the server sent it. Entries that are not even
/// objects come through empty rather than failing the whole payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BuyerRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_numbers: Option<serde_json::Value>,
}

impl<'de> Deserialize<'de> for BuyerRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let serde_json::Value::Object(mut fields) = serde_json::Value::deserialize(deserializer)?
        else {
            return Ok(Self::default());
        };
        let mut take = |key: &str| fields.remove(key).filter(|v| !v.is_null());
        Ok(Self {
            user: take("user"),
            total_numbers: take("total_numbers"),
        })
    }
}

impl BuyerRecord {
    /// The entry as a [`Buyer`], or `None` if the user is missing or not an
    /// identity, or `total_numbers` is not a non-negative integer
    pub fn to_buyer(&self) -> Option<Buyer> {
        let user: Identity = serde_json::from_value(self.user.clone()?).ok()?;
        let total_numbers = self.total_numbers.as_ref()?.as_u64()?;
        Some(Buyer {
            user,
            total_numbers,
        })
    }
}

/// One user's cumulative quota count for one reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub user: Identity,
    pub total_numbers: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u32,
    pub pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// A page of rewards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardList {
    #[serde(default)]
    pub rewards: Vec<Reward>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Purchase quotas request body
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PurchaseRequest {
    pub quantity: u32,
}

/// Numbers allocated by a successful purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    #[serde(default)]
    pub message: String,
    pub numbers: Vec<u64>,
    pub quantity: u32,
}

/// Outcome of a draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawResult {
    pub reward_id: String,
    pub winner_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_user: Option<Identity>,
    pub drawn_at: DateTime<Utc>,
    #[serde(default)]
    pub message: String,
}

/// Body for creating a reward
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardRequest {
    pub name: String,
    pub description: String,
    pub image: String,
    pub draw_date: DateTime<Utc>,
    pub images: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub min_quota: u32,
}

/// Partial update of a reward; unset fields are left alone
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RewardUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draw_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_quota: Option<u32>,
}
