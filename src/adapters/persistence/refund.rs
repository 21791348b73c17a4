use async_trait::async_trait;
use sqlx::Row;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::ports::record_store::RefundRepoTrait,
    domain::entities::refund::RefundRecord,
};

#[async_trait]
impl RefundRepoTrait for PostgresPersistence {
    async fn list_refunds(&self) -> AppResult<Vec<RefundRecord>> {
        let rows = sqlx::query(
            "SELECT id, billing_subscription_id, amount_cents, created_at_ms FROM refunds ORDER BY created_at_ms",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows
            .iter()
            .map(|row| RefundRecord {
                id: row.get("id"),
                billing_subscription_id: row.get("billing_subscription_id"),
                amount_cents: row.get("amount_cents"),
                created_at_ms: row.get("created_at_ms"),
            })
            .collect())
    }
}
