use async_trait::async_trait;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::ports::record_store::{BillingEventLogEntry, BillingEventLogTrait},
};

#[async_trait]
impl BillingEventLogTrait for PostgresPersistence {
    async fn append(&self, entry: BillingEventLogEntry, now_ms: i64) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO billing_event_log (event_id, event_type, user_id, new_status, created_at_ms)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&entry.event_id)
        .bind(&entry.event_type)
        .bind(entry.user_id)
        .bind(entry.new_status)
        .bind(now_ms)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}
