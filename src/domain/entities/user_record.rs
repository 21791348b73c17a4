use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Plan id every user starts on. Carries no expiry and no revenue.
pub const FREE_PLAN_ID: &str = "free";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Incomplete,
}

impl SubscriptionStatus {
    /// Convert from a payment processor subscription status string.
    ///
    /// Unknown statuses map to `Incomplete` so they never count as revenue.
    pub fn from_processor(s: &str) -> Self {
        match s {
            "active" => SubscriptionStatus::Active,
            "trialing" => SubscriptionStatus::Trialing,
            "past_due" | "unpaid" => SubscriptionStatus::PastDue,
            "canceled" | "incomplete_expired" => SubscriptionStatus::Canceled,
            _ => SubscriptionStatus::Incomplete,
        }
    }

    /// Returns true if the subscription currently generates reliable revenue.
    pub fn is_revenue_generating(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing
        )
    }
}

/// Durable user record. The reconciliation pipeline only touches the billing fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub external_identity_id: String,
    pub email: String,
    pub name: Option<String>,
    pub billing_customer_id: Option<String>,
    pub billing_subscription_id: Option<String>,
    pub subscription_plan_id: String,
    pub subscription_status: SubscriptionStatus,
    pub current_period_end_ms: Option<i64>,
    pub auto_renew: bool,
    pub updated_at_ms: i64,
}

impl UserRecord {
    pub fn is_free(&self) -> bool {
        self.subscription_plan_id == FREE_PLAN_ID
    }

    /// Period end as seen by the rest of the system. Free plans never expire,
    /// whatever value is stored.
    pub fn effective_period_end_ms(&self) -> Option<i64> {
        if self.is_free() {
            return None;
        }
        self.current_period_end_ms.filter(|ms| *ms > 0)
    }
}

/// The subscription tuple written on every reconciled event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionUpdate {
    pub subscription_plan_id: String,
    /// `None` clears the stored subscription id.
    pub billing_subscription_id: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub current_period_end_ms: i64,
    pub auto_renew: bool,
}

impl SubscriptionUpdate {
    /// Tuple written when the processor deletes a subscription.
    pub fn downgrade() -> Self {
        Self {
            subscription_plan_id: FREE_PLAN_ID.to_string(),
            billing_subscription_id: None,
            subscription_status: SubscriptionStatus::Canceled,
            current_period_end_ms: 0,
            auto_renew: false,
        }
    }
}
