use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::ports::record_store::{LinkOutcome, UserRecordRepoTrait},
    domain::entities::user_record::{FREE_PLAN_ID, SubscriptionUpdate, UserRecord},
};

fn row_to_record(row: &sqlx::postgres::PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        external_identity_id: row.get("external_identity_id"),
        email: row.get("email"),
        name: row.get("name"),
        billing_customer_id: row.get("billing_customer_id"),
        billing_subscription_id: row.get("billing_subscription_id"),
        subscription_plan_id: row.get("subscription_plan_id"),
        subscription_status: row.get("subscription_status"),
        current_period_end_ms: row.get("current_period_end_ms"),
        auto_renew: row.get("auto_renew"),
        updated_at_ms: row.get("updated_at_ms"),
    }
}

const SELECT_COLS: &str = r#"
    id, external_identity_id, email, name, billing_customer_id, billing_subscription_id,
    subscription_plan_id, subscription_status, current_period_end_ms, auto_renew, updated_at_ms
"#;

#[async_trait]
impl UserRecordRepoTrait for PostgresPersistence {
    async fn get_by_customer_id(&self, billing_customer_id: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE billing_customer_id = $1",
            SELECT_COLS
        ))
        .bind(billing_customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn get_by_external_identity_id(
        &self,
        external_identity_id: &str,
    ) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE external_identity_id = $1",
            SELECT_COLS
        ))
        .bind(external_identity_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn link_customer_id(
        &self,
        external_identity_id: &str,
        billing_customer_id: &str,
        now_ms: i64,
    ) -> AppResult<LinkOutcome> {
        // Conditional update keeps first-write-wins atomic at the row level
        let updated = sqlx::query(
            r#"
            UPDATE users
            SET billing_customer_id = $2, updated_at_ms = $3
            WHERE external_identity_id = $1 AND billing_customer_id IS NULL
            "#,
        )
        .bind(external_identity_id)
        .bind(billing_customer_id)
        .bind(now_ms)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if updated.rows_affected() > 0 {
            return Ok(LinkOutcome::Linked);
        }

        let existing: Option<Option<String>> = sqlx::query(
            "SELECT billing_customer_id FROM users WHERE external_identity_id = $1",
        )
        .bind(external_identity_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?
        .map(|row| row.get("billing_customer_id"));

        Ok(match existing {
            None => LinkOutcome::UserMissing,
            Some(Some(existing)) if existing == billing_customer_id => LinkOutcome::AlreadyLinked,
            Some(Some(existing)) => LinkOutcome::KeptExisting {
                existing_customer_id: existing,
            },
            // Raced with a concurrent clear; nothing sensible to do but report
            Some(None) => LinkOutcome::UserMissing,
        })
    }

    async fn upsert_subscription(
        &self,
        user_id: Uuid,
        billing_customer_id: &str,
        update: &SubscriptionUpdate,
        updated_at_ms: i64,
    ) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET billing_customer_id = COALESCE(billing_customer_id, $2),
                subscription_plan_id = $3,
                billing_subscription_id = $4,
                subscription_status = $5,
                current_period_end_ms = $6,
                auto_renew = $7,
                updated_at_ms = $8
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(user_id)
        .bind(billing_customer_id)
        .bind(&update.subscription_plan_id)
        .bind(&update.billing_subscription_id)
        .bind(update.subscription_status)
        .bind(update.current_period_end_ms)
        .bind(update.auto_renew)
        .bind(updated_at_ms)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn list_non_free(&self) -> AppResult<Vec<UserRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users WHERE subscription_plan_id <> $1 ORDER BY id",
            SELECT_COLS
        ))
        .bind(FREE_PLAN_ID)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_record).collect())
    }
}
