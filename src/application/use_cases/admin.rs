use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{
    app_error::{AppError, AppResult},
    application::ports::record_store::{AdminDeleteOutcome, AdminRepoTrait},
    domain::entities::admin::{AccessLevel, AdminRecord},
};

/// Admin trust tiers. Guards the analytics view and manages itself.
pub struct AdminUseCases {
    repo: Arc<dyn AdminRepoTrait>,
}

impl AdminUseCases {
    pub fn new(repo: Arc<dyn AdminRepoTrait>) -> Self {
        Self { repo }
    }

    /// Resolve the caller to an admin of any level.
    #[instrument(skip(self))]
    pub async fn require_admin(&self, external_identity_id: &str) -> AppResult<AdminRecord> {
        self.repo
            .get(external_identity_id)
            .await?
            .ok_or(AppError::Forbidden)
    }

    #[instrument(skip(self))]
    pub async fn list_admins(&self, actor_id: &str) -> AppResult<Vec<AdminRecord>> {
        self.require_admin(actor_id).await?;
        self.repo.list().await
    }

    /// Full admins may create any level; others only levels below their own.
    #[instrument(skip(self))]
    pub async fn create_admin(
        &self,
        actor_id: &str,
        target_id: &str,
        access_level: AccessLevel,
    ) -> AppResult<AdminRecord> {
        let actor = self.require_admin(actor_id).await?;

        if actor.access_level != AccessLevel::Full && !actor.access_level.outranks(access_level) {
            return Err(AppError::Forbidden);
        }

        let target_id = target_id.trim();
        if target_id.is_empty() {
            return Err(AppError::InvalidInput("Identity id is required".into()));
        }

        let now_ms = chrono::Utc::now().timestamp_millis();
        let admin = self
            .repo
            .create(target_id, access_level, &actor.external_identity_id, now_ms)
            .await?;

        info!(target_id, ?access_level, "Admin created");
        Ok(admin)
    }

    #[instrument(skip(self))]
    pub async fn update_access_level(
        &self,
        actor_id: &str,
        target_id: &str,
        access_level: AccessLevel,
    ) -> AppResult<AdminRecord> {
        self.require_full_admin_other_than(actor_id, target_id)
            .await?;

        let now_ms = chrono::Utc::now().timestamp_millis();
        let admin = self
            .repo
            .update_level(target_id, access_level, now_ms)
            .await?
            .ok_or(AppError::NotFound)?;

        info!(target_id, ?access_level, "Admin access level updated");
        Ok(admin)
    }

    #[instrument(skip(self))]
    pub async fn delete_admin(&self, actor_id: &str, target_id: &str) -> AppResult<()> {
        self.require_full_admin_other_than(actor_id, target_id)
            .await?;

        match self.repo.delete_guarded(target_id).await? {
            AdminDeleteOutcome::Deleted => {
                info!(target_id, "Admin deleted");
                Ok(())
            }
            AdminDeleteOutcome::NotFound => Err(AppError::NotFound),
            AdminDeleteOutcome::LastFullAdmin => {
                warn!(target_id, "Refused to delete the last Full admin");
                Err(AppError::InvalidInput(
                    "Cannot delete the last Full admin".into(),
                ))
            }
        }
    }

    /// Mutations require a Full actor and never apply to the actor's own record.
    async fn require_full_admin_other_than(
        &self,
        actor_id: &str,
        target_id: &str,
    ) -> AppResult<AdminRecord> {
        let actor = self.require_admin(actor_id).await?;
        if actor.access_level != AccessLevel::Full {
            return Err(AppError::Forbidden);
        }
        if actor.external_identity_id == target_id {
            warn!("Admin attempted to modify own record");
            return Err(AppError::Forbidden);
        }
        Ok(actor)
    }
}
