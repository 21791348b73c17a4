//! In-memory mock implementations for the record store ports.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::record_store::{
        AdminDeleteOutcome, AdminRepoTrait, BillingEventLogEntry, BillingEventLogTrait,
        LinkOutcome, RefundRepoTrait, UserRecordRepoTrait,
    },
    domain::entities::{
        admin::{AccessLevel, AdminRecord},
        refund::RefundRecord,
        user_record::{FREE_PLAN_ID, SubscriptionUpdate, UserRecord},
    },
};

// ============================================================================
// InMemoryUserRecordRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRecordRepo {
    pub users: Mutex<HashMap<Uuid, UserRecord>>,
    /// When set, every call fails with a database error.
    pub fail_all: AtomicBool,
    pub upsert_calls: AtomicUsize,
    pub link_calls: AtomicUsize,
}

impl InMemoryUserRecordRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<UserRecord>) -> Self {
        let map: HashMap<Uuid, UserRecord> = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            users: Mutex::new(map),
            ..Default::default()
        }
    }

    pub fn insert(&self, user: UserRecord) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn get(&self, id: Uuid) -> Option<UserRecord> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_all.store(failing, Ordering::SeqCst);
    }

    fn check_failure(&self) -> AppResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRecordRepoTrait for InMemoryUserRecordRepo {
    async fn get_by_customer_id(&self, billing_customer_id: &str) -> AppResult<Option<UserRecord>> {
        self.check_failure()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.billing_customer_id.as_deref() == Some(billing_customer_id))
            .cloned())
    }

    async fn get_by_external_identity_id(
        &self,
        external_identity_id: &str,
    ) -> AppResult<Option<UserRecord>> {
        self.check_failure()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.external_identity_id == external_identity_id)
            .cloned())
    }

    async fn link_customer_id(
        &self,
        external_identity_id: &str,
        billing_customer_id: &str,
        now_ms: i64,
    ) -> AppResult<LinkOutcome> {
        self.check_failure()?;
        self.link_calls.fetch_add(1, Ordering::SeqCst);

        let mut users = self.users.lock().unwrap();
        let Some(user) = users
            .values_mut()
            .find(|u| u.external_identity_id == external_identity_id)
        else {
            return Ok(LinkOutcome::UserMissing);
        };

        match user.billing_customer_id.as_deref() {
            None => {
                user.billing_customer_id = Some(billing_customer_id.to_string());
                user.updated_at_ms = now_ms;
                Ok(LinkOutcome::Linked)
            }
            Some(existing) if existing == billing_customer_id => Ok(LinkOutcome::AlreadyLinked),
            Some(existing) => Ok(LinkOutcome::KeptExisting {
                existing_customer_id: existing.to_string(),
            }),
        }
    }

    async fn upsert_subscription(
        &self,
        user_id: Uuid,
        billing_customer_id: &str,
        update: &SubscriptionUpdate,
        updated_at_ms: i64,
    ) -> AppResult<Option<UserRecord>> {
        self.check_failure()?;
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        let mut users = self.users.lock().unwrap();
        let Some(user) = users.get_mut(&user_id) else {
            return Ok(None);
        };

        if user.billing_customer_id.is_none() {
            user.billing_customer_id = Some(billing_customer_id.to_string());
        }
        user.subscription_plan_id = update.subscription_plan_id.clone();
        user.billing_subscription_id = update.billing_subscription_id.clone();
        user.subscription_status = update.subscription_status;
        user.current_period_end_ms = Some(update.current_period_end_ms);
        user.auto_renew = update.auto_renew;
        user.updated_at_ms = updated_at_ms;

        Ok(Some(user.clone()))
    }

    async fn list_non_free(&self) -> AppResult<Vec<UserRecord>> {
        self.check_failure()?;
        let mut users: Vec<UserRecord> = self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.subscription_plan_id != FREE_PLAN_ID)
            .cloned()
            .collect();
        // Deterministic order, like the store's primary key scan
        users.sort_by_key(|u| u.id);
        Ok(users)
    }
}

// ============================================================================
// InMemoryRefundRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryRefundRepo {
    pub refunds: Mutex<Vec<RefundRecord>>,
}

impl InMemoryRefundRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refunds(refunds: Vec<RefundRecord>) -> Self {
        Self {
            refunds: Mutex::new(refunds),
        }
    }
}

#[async_trait]
impl RefundRepoTrait for InMemoryRefundRepo {
    async fn list_refunds(&self) -> AppResult<Vec<RefundRecord>> {
        Ok(self.refunds.lock().unwrap().clone())
    }
}

// ============================================================================
// InMemoryAdminRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryAdminRepo {
    pub admins: Mutex<HashMap<String, AdminRecord>>,
}

impl InMemoryAdminRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admins(admins: Vec<AdminRecord>) -> Self {
        let map: HashMap<String, AdminRecord> = admins
            .into_iter()
            .map(|a| (a.external_identity_id.clone(), a))
            .collect();
        Self {
            admins: Mutex::new(map),
        }
    }

    pub fn full_count(&self) -> usize {
        self.admins
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.access_level == AccessLevel::Full)
            .count()
    }
}

#[async_trait]
impl AdminRepoTrait for InMemoryAdminRepo {
    async fn get(&self, external_identity_id: &str) -> AppResult<Option<AdminRecord>> {
        Ok(self
            .admins
            .lock()
            .unwrap()
            .get(external_identity_id)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<AdminRecord>> {
        let mut admins: Vec<AdminRecord> = self.admins.lock().unwrap().values().cloned().collect();
        admins.sort_by(|a, b| a.external_identity_id.cmp(&b.external_identity_id));
        Ok(admins)
    }

    async fn create(
        &self,
        external_identity_id: &str,
        access_level: AccessLevel,
        created_by: &str,
        now_ms: i64,
    ) -> AppResult<AdminRecord> {
        let mut admins = self.admins.lock().unwrap();
        if admins.contains_key(external_identity_id) {
            return Err(AppError::InvalidInput("Admin already exists".into()));
        }
        let admin = AdminRecord {
            external_identity_id: external_identity_id.to_string(),
            access_level,
            created_by: Some(created_by.to_string()),
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        };
        admins.insert(admin.external_identity_id.clone(), admin.clone());
        Ok(admin)
    }

    async fn update_level(
        &self,
        external_identity_id: &str,
        access_level: AccessLevel,
        now_ms: i64,
    ) -> AppResult<Option<AdminRecord>> {
        let mut admins = self.admins.lock().unwrap();
        Ok(admins.get_mut(external_identity_id).map(|admin| {
            admin.access_level = access_level;
            admin.updated_at_ms = now_ms;
            admin.clone()
        }))
    }

    async fn delete_guarded(&self, external_identity_id: &str) -> AppResult<AdminDeleteOutcome> {
        let mut admins = self.admins.lock().unwrap();
        let Some(target) = admins.get(external_identity_id) else {
            return Ok(AdminDeleteOutcome::NotFound);
        };
        let full_count = admins
            .values()
            .filter(|a| a.access_level == AccessLevel::Full)
            .count();
        if target.access_level == AccessLevel::Full && full_count <= 1 {
            return Ok(AdminDeleteOutcome::LastFullAdmin);
        }
        admins.remove(external_identity_id);
        Ok(AdminDeleteOutcome::Deleted)
    }
}

// ============================================================================
// InMemoryBillingEventLog
// ============================================================================

#[derive(Default)]
pub struct InMemoryBillingEventLog {
    pub entries: Mutex<Vec<BillingEventLogEntry>>,
    /// When set, appends fail. The pipeline must not care.
    pub fail_appends: AtomicBool,
}

impl InMemoryBillingEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<BillingEventLogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl BillingEventLogTrait for InMemoryBillingEventLog {
    async fn append(&self, entry: BillingEventLogEntry, _now_ms: i64) -> AppResult<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(AppError::Database("event log unavailable".into()));
        }
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}
