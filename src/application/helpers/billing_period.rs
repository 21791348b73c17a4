//! Normalization of the billing period carried by subscription payloads.
//!
//! Older processor API versions put `current_period_end` on the subscription
//! itself; newer ones only carry it on each subscription item.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    pub current_period_end_ms: i64,
    pub auto_renew: bool,
}

/// Extract the canonical billing period from a subscription object.
///
/// Looks at the top-level `current_period_end` first, then at the first
/// subscription item. Seconds are converted to milliseconds. Returns `None`
/// when no positive period end exists in either location.
pub fn normalize_period(subscription: &Value) -> Option<BillingPeriod> {
    let period_end_secs = epoch_secs(&subscription["current_period_end"])
        .or_else(|| epoch_secs(&subscription["items"]["data"][0]["current_period_end"]))?;

    let cancel_at_period_end = subscription["cancel_at_period_end"]
        .as_bool()
        .unwrap_or(false);

    Some(BillingPeriod {
        current_period_end_ms: period_end_secs.checked_mul(1000)?,
        auto_renew: !cancel_at_period_end,
    })
}

fn epoch_secs(value: &Value) -> Option<i64> {
    let secs = value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.trunc() as i64))?;
    (secs > 0).then_some(secs)
}
