use std::sync::Arc;

use tracing::{instrument, warn};

use crate::{
    app_error::{AppError, AppResult},
    application::{ports::record_store::UserRecordRepoTrait, use_cases::user_linker::UserLinker},
    domain::entities::user_record::{SubscriptionUpdate, UserRecord},
};

/// Initial attempt plus one retry after linking.
const MAX_WRITE_ATTEMPTS: u32 = 2;

/// Input to a subscription state write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionWrite {
    pub billing_customer_id: String,
    pub external_identity_id: Option<String>,
    pub update: SubscriptionUpdate,
}

pub struct SubscriptionStateWriter {
    users: Arc<dyn UserRecordRepoTrait>,
    linker: Arc<UserLinker>,
}

impl SubscriptionStateWriter {
    pub fn new(users: Arc<dyn UserRecordRepoTrait>, linker: Arc<UserLinker>) -> Self {
        Self { users, linker }
    }

    /// Apply the subscription tuple to the user's record.
    ///
    /// On `UserNotFound` with an identity available, links the customer id and
    /// retries exactly once. Any other error is returned unchanged.
    #[instrument(skip(self, write), fields(customer_id = %write.billing_customer_id))]
    pub async fn write(&self, write: &SubscriptionWrite) -> AppResult<UserRecord> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_write(write).await {
                Ok(record) => return Ok(record),
                Err(AppError::UserNotFound) if attempt < MAX_WRITE_ATTEMPTS => {
                    let Some(external_identity_id) = write.external_identity_id.as_deref() else {
                        return Err(AppError::UserNotFound);
                    };
                    warn!(attempt, "User not resolvable, linking before retry");
                    self.linker
                        .ensure_link(&write.billing_customer_id, Some(external_identity_id))
                        .await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_write(&self, write: &SubscriptionWrite) -> AppResult<UserRecord> {
        let user = self.resolve_user(write).await?.ok_or(AppError::UserNotFound)?;

        let now_ms = chrono::Utc::now().timestamp_millis();
        self.users
            .upsert_subscription(user.id, &write.billing_customer_id, &write.update, now_ms)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    async fn resolve_user(&self, write: &SubscriptionWrite) -> AppResult<Option<UserRecord>> {
        if let Some(user) = self
            .users
            .get_by_customer_id(&write.billing_customer_id)
            .await?
        {
            return Ok(Some(user));
        }
        match write.external_identity_id.as_deref() {
            Some(external_identity_id) => {
                self.users
                    .get_by_external_identity_id(external_identity_id)
                    .await
            }
            None => Ok(None),
        }
    }
}
