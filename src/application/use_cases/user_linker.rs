use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::{
    app_error::AppResult,
    application::ports::record_store::{LinkOutcome, UserRecordRepoTrait},
};

/// Links processor customer ids to users, first write wins.
pub struct UserLinker {
    users: Arc<dyn UserRecordRepoTrait>,
}

impl UserLinker {
    pub fn new(users: Arc<dyn UserRecordRepoTrait>) -> Self {
        Self { users }
    }

    /// Make sure `billing_customer_id` is linked to the user behind
    /// `external_identity_id`. Skipped when the event carries no identity.
    ///
    /// A customer id already owned by another user is never moved, and a user
    /// already carrying a different customer id keeps it.
    #[instrument(skip(self))]
    pub async fn ensure_link(
        &self,
        billing_customer_id: &str,
        external_identity_id: Option<&str>,
    ) -> AppResult<LinkOutcome> {
        let Some(external_identity_id) = external_identity_id else {
            debug!("No identity on event, skipping link");
            return Ok(LinkOutcome::Skipped);
        };

        if let Some(owner) = self.users.get_by_customer_id(billing_customer_id).await? {
            if owner.external_identity_id == external_identity_id {
                return Ok(LinkOutcome::AlreadyLinked);
            }
            warn!(
                owner_user_id = %owner.id,
                "Customer id already belongs to another user, not reassigning"
            );
            return Ok(LinkOutcome::ClaimedByOtherUser {
                owner_user_id: owner.id,
            });
        }

        let now_ms = chrono::Utc::now().timestamp_millis();
        let outcome = self
            .users
            .link_customer_id(external_identity_id, billing_customer_id, now_ms)
            .await?;

        match &outcome {
            LinkOutcome::Linked => info!("Linked customer id to user"),
            LinkOutcome::KeptExisting {
                existing_customer_id,
            } => warn!(
                existing_customer_id = %existing_customer_id,
                "User already linked to a different customer id, keeping it"
            ),
            LinkOutcome::UserMissing => warn!("No user record for identity, cannot link yet"),
            _ => {}
        }

        Ok(outcome)
    }
}
