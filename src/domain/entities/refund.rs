use serde::Serialize;
use uuid::Uuid;

/// Append-only refund ledger entry. Read by analytics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundRecord {
    pub id: Uuid,
    pub billing_subscription_id: String,
    pub amount_cents: i64,
    pub created_at_ms: i64,
}
