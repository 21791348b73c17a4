//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use serde_json::{Value, json};
use uuid::Uuid;

use crate::domain::entities::{
    admin::{AccessLevel, AdminRecord},
    billing_event::BillingEvent,
    refund::RefundRecord,
    user_record::{FREE_PLAN_ID, SubscriptionStatus, UserRecord},
};

/// Fixed timestamp used for fixtures (2025-01-01T00:00:00Z).
pub const TEST_NOW_MS: i64 = 1_735_689_600_000;

/// Create a free-plan user with no billing link.
pub fn create_test_user(overrides: impl FnOnce(&mut UserRecord)) -> UserRecord {
    let mut user = UserRecord {
        id: Uuid::new_v4(),
        external_identity_id: format!("user_{}", Uuid::new_v4().simple()),
        email: "user@example.com".to_string(),
        name: Some("Test User".to_string()),
        billing_customer_id: None,
        billing_subscription_id: None,
        subscription_plan_id: FREE_PLAN_ID.to_string(),
        subscription_status: SubscriptionStatus::Incomplete,
        current_period_end_ms: None,
        auto_renew: false,
        updated_at_ms: TEST_NOW_MS,
    };
    overrides(&mut user);
    user
}

/// Create a user on a paid plan, linked to `customer_id`.
pub fn create_test_paying_user(
    customer_id: &str,
    plan_id: &str,
    status: SubscriptionStatus,
    overrides: impl FnOnce(&mut UserRecord),
) -> UserRecord {
    create_test_user(|u| {
        u.billing_customer_id = Some(customer_id.to_string());
        u.billing_subscription_id = Some(format!("sub_{}", customer_id));
        u.subscription_plan_id = plan_id.to_string();
        u.subscription_status = status;
        u.current_period_end_ms = Some(TEST_NOW_MS + 30 * 86_400_000);
        u.auto_renew = true;
        overrides(u);
    })
}

pub fn create_test_admin(external_identity_id: &str, access_level: AccessLevel) -> AdminRecord {
    AdminRecord {
        external_identity_id: external_identity_id.to_string(),
        access_level,
        created_by: None,
        created_at_ms: TEST_NOW_MS,
        updated_at_ms: TEST_NOW_MS,
    }
}

pub fn create_test_refund(billing_subscription_id: &str, amount_cents: i64) -> RefundRecord {
    RefundRecord {
        id: Uuid::new_v4(),
        billing_subscription_id: billing_subscription_id.to_string(),
        amount_cents,
        created_at_ms: TEST_NOW_MS,
    }
}

// ============================================================================
// Processor payloads
// ============================================================================

/// A processor subscription object in the current API shape.
pub fn subscription_object(
    subscription_id: &str,
    customer_id: &str,
    price_id: &str,
    period_end_secs: i64,
) -> Value {
    json!({
        "id": subscription_id,
        "object": "subscription",
        "customer": customer_id,
        "status": "active",
        "cancel_at_period_end": false,
        "current_period_end": period_end_secs,
        "items": {
            "data": [
                {
                    "id": format!("si_{}", subscription_id),
                    "price": { "id": price_id, "product": format!("prod_{}", price_id) },
                    "current_period_end": period_end_secs
                }
            ]
        },
        "metadata": {}
    })
}

pub fn checkout_session_object(customer_id: &str, external_identity_id: &str) -> Value {
    json!({
        "id": "cs_test_1",
        "object": "checkout.session",
        "customer": customer_id,
        "mode": "subscription",
        "metadata": { "userId": external_identity_id }
    })
}

pub fn invoice_object(invoice_id: &str, customer_id: &str, subscription_id: &str) -> Value {
    json!({
        "id": invoice_id,
        "object": "invoice",
        "customer": customer_id,
        "subscription": subscription_id
    })
}

/// Wrap a payload object in an event envelope.
pub fn billing_event(event_type: &str, object: Value) -> BillingEvent {
    serde_json::from_value(billing_event_json(event_type, object))
        .expect("Test event should deserialize")
}

pub fn billing_event_json(event_type: &str, object: Value) -> Value {
    json!({
        "id": format!("evt_{}", Uuid::new_v4().simple()),
        "object": "event",
        "type": event_type,
        "created": TEST_NOW_MS / 1000,
        "data": { "object": object }
    })
}
