use async_trait::async_trait;
use serde_json::Value;

use crate::app_error::AppResult;

/// Outbound calls to the payment processor. Read-only.
#[async_trait]
pub trait PaymentProcessorPort: Send + Sync {
    /// Fetch the live subscription object as returned by the processor.
    async fn fetch_subscription(&self, subscription_id: &str) -> AppResult<Value>;
}
