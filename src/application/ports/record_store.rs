//! Record store ports consumed by the reconciliation pipeline and analytics.
//!
//! Every method is a single atomic RPC against the durable store. The core never
//! holds connections or transactions across calls.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    domain::entities::{
        admin::{AccessLevel, AdminRecord},
        refund::RefundRecord,
        user_record::{SubscriptionStatus, SubscriptionUpdate, UserRecord},
    },
};

/// Result of attempting to link a processor customer id to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The user had no customer id and now has this one.
    Linked,
    /// The user already carried this exact customer id.
    AlreadyLinked,
    /// The user carries a different customer id, which was kept.
    KeptExisting { existing_customer_id: String },
    /// The customer id already belongs to a different user and stays there.
    ClaimedByOtherUser { owner_user_id: Uuid },
    /// No user record exists for the external identity id.
    UserMissing,
    /// No external identity id was available; nothing to link.
    Skipped,
}

#[async_trait]
pub trait UserRecordRepoTrait: Send + Sync {
    async fn get_by_customer_id(&self, billing_customer_id: &str) -> AppResult<Option<UserRecord>>;

    async fn get_by_external_identity_id(
        &self,
        external_identity_id: &str,
    ) -> AppResult<Option<UserRecord>>;

    /// Set the customer id only if the user has none yet. Never overwrites.
    async fn link_customer_id(
        &self,
        external_identity_id: &str,
        billing_customer_id: &str,
        now_ms: i64,
    ) -> AppResult<LinkOutcome>;

    /// Write the full subscription tuple to one user. Also fills in the
    /// customer id when the record has none. Returns `None` if the user
    /// vanished between lookup and write.
    async fn upsert_subscription(
        &self,
        user_id: Uuid,
        billing_customer_id: &str,
        update: &SubscriptionUpdate,
        updated_at_ms: i64,
    ) -> AppResult<Option<UserRecord>>;

    async fn list_non_free(&self) -> AppResult<Vec<UserRecord>>;
}

#[async_trait]
pub trait RefundRepoTrait: Send + Sync {
    async fn list_refunds(&self) -> AppResult<Vec<RefundRecord>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminDeleteOutcome {
    Deleted,
    NotFound,
    /// The target is the only remaining Full admin and was kept.
    LastFullAdmin,
}

#[async_trait]
pub trait AdminRepoTrait: Send + Sync {
    async fn get(&self, external_identity_id: &str) -> AppResult<Option<AdminRecord>>;

    async fn list(&self) -> AppResult<Vec<AdminRecord>>;

    /// Insert a new admin. Fails with `InvalidInput` if one already exists.
    async fn create(
        &self,
        external_identity_id: &str,
        access_level: AccessLevel,
        created_by: &str,
        now_ms: i64,
    ) -> AppResult<AdminRecord>;

    async fn update_level(
        &self,
        external_identity_id: &str,
        access_level: AccessLevel,
        now_ms: i64,
    ) -> AppResult<Option<AdminRecord>>;

    /// Remove an admin unless it is the last Full one. Check and delete are
    /// one atomic operation.
    async fn delete_guarded(&self, external_identity_id: &str) -> AppResult<AdminDeleteOutcome>;
}

/// One reconciled write, kept for operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingEventLogEntry {
    pub event_id: String,
    pub event_type: String,
    pub user_id: Uuid,
    pub new_status: SubscriptionStatus,
}

#[async_trait]
pub trait BillingEventLogTrait: Send + Sync {
    async fn append(&self, entry: BillingEventLogEntry, now_ms: i64) -> AppResult<()>;
}
