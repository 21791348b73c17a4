use async_trait::async_trait;
use sqlx::Row;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::ports::record_store::{AdminDeleteOutcome, AdminRepoTrait},
    domain::entities::admin::{AccessLevel, AdminRecord},
};

fn row_to_admin(row: &sqlx::postgres::PgRow) -> AdminRecord {
    AdminRecord {
        external_identity_id: row.get("external_identity_id"),
        access_level: row.get("access_level"),
        created_by: row.get("created_by"),
        created_at_ms: row.get("created_at_ms"),
        updated_at_ms: row.get("updated_at_ms"),
    }
}

const SELECT_COLS: &str = "external_identity_id, access_level, created_by, created_at_ms, updated_at_ms";

#[async_trait]
impl AdminRepoTrait for PostgresPersistence {
    async fn get(&self, external_identity_id: &str) -> AppResult<Option<AdminRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM admins WHERE external_identity_id = $1",
            SELECT_COLS
        ))
        .bind(external_identity_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_admin))
    }

    async fn list(&self) -> AppResult<Vec<AdminRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM admins ORDER BY external_identity_id",
            SELECT_COLS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_admin).collect())
    }

    async fn create(
        &self,
        external_identity_id: &str,
        access_level: AccessLevel,
        created_by: &str,
        now_ms: i64,
    ) -> AppResult<AdminRecord> {
        // Unique violation on the primary key surfaces as InvalidInput
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO admins (external_identity_id, access_level, created_by, created_at_ms, updated_at_ms)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(external_identity_id)
        .bind(access_level)
        .bind(created_by)
        .bind(now_ms)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_admin(&row))
    }

    async fn update_level(
        &self,
        external_identity_id: &str,
        access_level: AccessLevel,
        now_ms: i64,
    ) -> AppResult<Option<AdminRecord>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE admins SET access_level = $2, updated_at_ms = $3
            WHERE external_identity_id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(external_identity_id)
        .bind(access_level)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_admin))
    }

    async fn delete_guarded(&self, external_identity_id: &str) -> AppResult<AdminDeleteOutcome> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        // Serializes concurrent deletes of Full admins
        sqlx::query("SELECT external_identity_id FROM admins WHERE access_level = $1 FOR UPDATE")
            .bind(AccessLevel::Full)
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::from)?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM admins
            WHERE external_identity_id = $1
              AND (access_level <> $2
                   OR (SELECT COUNT(*) FROM admins WHERE access_level = $2) > 1)
            "#,
        )
        .bind(external_identity_id)
        .bind(AccessLevel::Full)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        let outcome = if deleted.rows_affected() > 0 {
            AdminDeleteOutcome::Deleted
        } else {
            let exists = sqlx::query("SELECT 1 FROM admins WHERE external_identity_id = $1")
                .bind(external_identity_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(AppError::from)?
                .is_some();
            if exists {
                AdminDeleteOutcome::LastFullAdmin
            } else {
                AdminDeleteOutcome::NotFound
            }
        };

        tx.commit().await.map_err(AppError::from)?;
        Ok(outcome)
    }
}
