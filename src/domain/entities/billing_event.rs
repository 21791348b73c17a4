//! Verified payment processor events and read-only views over their payloads.
//!
//! Payload shapes drift across event types and processor API versions, so the
//! views read loose JSON and expose only the fields reconciliation needs.

use serde::Deserialize;
use serde_json::Value;

/// Metadata key carrying the identity provider's user id.
pub const IDENTITY_METADATA_KEY: &str = "userId";

/// Metadata key carrying a fallback internal plan id.
pub const PLAN_METADATA_KEY: &str = "planId";

#[derive(Debug, Clone, Deserialize)]
pub struct BillingEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Unix seconds, as sent by the processor.
    #[serde(default)]
    pub created: Option<i64>,
    pub data: BillingEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingEventData {
    pub object: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, strum::EnumString)]
pub enum BillingEventKind {
    #[strum(serialize = "checkout.session.completed")]
    CheckoutCompleted,
    #[strum(serialize = "customer.subscription.created")]
    SubscriptionCreated,
    #[strum(serialize = "customer.subscription.updated")]
    SubscriptionUpdated,
    #[strum(serialize = "customer.subscription.deleted")]
    SubscriptionDeleted,
    #[strum(serialize = "invoice.payment_succeeded", serialize = "invoice.paid")]
    InvoicePaymentSucceeded,
    #[strum(serialize = "invoice.payment_failed")]
    InvoicePaymentFailed,
    #[strum(default)]
    Other(String),
}

impl BillingEvent {
    pub fn kind(&self) -> BillingEventKind {
        self.event_type
            .parse()
            .unwrap_or_else(|_| BillingEventKind::Other(self.event_type.clone()))
    }

    pub fn object(&self) -> &Value {
        &self.data.object
    }
}

/// Reads an id that may be a bare string or an expanded `{ "id": ... }` object.
fn id_field(value: &Value) -> Option<&str> {
    value
        .as_str()
        .or_else(|| value["id"].as_str())
        .filter(|s| !s.is_empty())
}

fn metadata_field<'a>(object: &'a Value, key: &str) -> Option<&'a str> {
    object["metadata"][key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// View over a subscription object (event payload or re-fetched).
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionView<'a> {
    raw: &'a Value,
}

impl<'a> SubscriptionView<'a> {
    pub fn new(raw: &'a Value) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &'a Value {
        self.raw
    }

    pub fn id(&self) -> Option<&'a str> {
        id_field(&self.raw["id"])
    }

    pub fn customer_id(&self) -> Option<&'a str> {
        id_field(&self.raw["customer"])
    }

    pub fn status(&self) -> &'a str {
        self.raw["status"].as_str().unwrap_or("")
    }

    pub fn cancel_at_period_end(&self) -> bool {
        self.raw["cancel_at_period_end"].as_bool().unwrap_or(false)
    }

    pub fn external_identity_id(&self) -> Option<&'a str> {
        metadata_field(self.raw, IDENTITY_METADATA_KEY)
    }

    pub fn metadata_plan_id(&self) -> Option<&'a str> {
        metadata_field(self.raw, PLAN_METADATA_KEY)
    }

    /// Processor-side price/product identifiers, most specific first.
    pub fn price_candidates(&self) -> Vec<&'a str> {
        let first_item = &self.raw["items"]["data"][0];
        [
            id_field(&first_item["price"]["id"]),
            id_field(&first_item["price"]["product"]),
            id_field(&self.raw["plan"]["id"]),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// View over a checkout session object.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutSessionView<'a> {
    raw: &'a Value,
}

impl<'a> CheckoutSessionView<'a> {
    pub fn new(raw: &'a Value) -> Self {
        Self { raw }
    }

    pub fn customer_id(&self) -> Option<&'a str> {
        id_field(&self.raw["customer"])
    }

    pub fn external_identity_id(&self) -> Option<&'a str> {
        metadata_field(self.raw, IDENTITY_METADATA_KEY).or_else(|| {
            self.raw["client_reference_id"]
                .as_str()
                .filter(|s| !s.is_empty())
        })
    }
}

/// View over an invoice object.
#[derive(Debug, Clone, Copy)]
pub struct InvoiceView<'a> {
    raw: &'a Value,
}

impl<'a> InvoiceView<'a> {
    pub fn new(raw: &'a Value) -> Self {
        Self { raw }
    }

    pub fn id(&self) -> Option<&'a str> {
        id_field(&self.raw["id"])
    }

    /// Subscription the invoice bills, if any. Newer API versions moved it
    /// under `parent.subscription_details`.
    pub fn subscription_id(&self) -> Option<&'a str> {
        id_field(&self.raw["subscription"])
            .or_else(|| id_field(&self.raw["parent"]["subscription_details"]["subscription"]))
    }
}
