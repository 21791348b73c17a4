//! Test app state builder for HTTP-level integration testing.
//!
//! `TestAppStateBuilder` wires the real use cases over in-memory mocks so
//! route tests exercise the full verify, dispatch and write path.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        helpers::plan_resolver::PlanResolver,
        use_cases::{
            admin::AdminUseCases, analytics::AnalyticsUseCases,
            billing_webhook::BillingWebhookUseCases, subscription_writer::SubscriptionStateWriter,
            user_linker::UserLinker,
        },
    },
    domain::entities::{admin::AdminRecord, refund::RefundRecord, user_record::UserRecord},
    infra::{config::AppConfig, webhook_verifier::EventVerifier},
    test_utils::{
        InMemoryAdminRepo, InMemoryBillingEventLog, InMemoryRefundRepo, InMemoryUserRecordRepo,
        StubPaymentProcessor,
    },
};

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const TEST_IDENTITY_SECRET: &str = "identity_test_secret";
pub const TEST_PRO_PRICE_ID: &str = "price_pro_monthly";
pub const TEST_TEAM_PRICE_ID: &str = "price_team_monthly";

pub fn test_identity_secret() -> SecretString {
    SecretString::new(TEST_IDENTITY_SECRET.into())
}

pub fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        database_url: "postgres://unused".to_string(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        stripe_secret_key: SecretString::new("sk_test_123".into()),
        stripe_api_base: Url::parse("http://localhost:12111").unwrap(),
        stripe_webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
        webhook_tolerance_secs: 300,
        identity_jwt_secret: test_identity_secret(),
        plan_price_ids: HashMap::from([
            (TEST_PRO_PRICE_ID.to_string(), "pro".to_string()),
            (TEST_TEAM_PRICE_ID.to_string(), "team".to_string()),
        ]),
        plan_monthly_prices: HashMap::from([
            ("pro".to_string(), 2900),
            ("team".to_string(), 9900),
        ]),
        log_file: None,
    }
}

/// Handles to the mocks behind a built `AppState`, for assertions.
pub struct TestMocks {
    pub users: Arc<InMemoryUserRecordRepo>,
    pub refunds: Arc<InMemoryRefundRepo>,
    pub admins: Arc<InMemoryAdminRepo>,
    pub event_log: Arc<InMemoryBillingEventLog>,
    pub processor: Arc<StubPaymentProcessor>,
}

// ============================================================================
// TestAppStateBuilder
// ============================================================================

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let user = create_test_user(|u| u.billing_customer_id = Some("cus_1".into()));
///
/// let (app_state, mocks) = TestAppStateBuilder::new()
///     .with_user(user)
///     .with_admin(create_test_admin("root", AccessLevel::Full))
///     .build_with_mocks();
/// ```
pub struct TestAppStateBuilder {
    users: Vec<UserRecord>,
    admins: Vec<AdminRecord>,
    refunds: Vec<RefundRecord>,
    processor: StubPaymentProcessor,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            users: vec![],
            admins: vec![],
            refunds: vec![],
            processor: StubPaymentProcessor::new(),
        }
    }

    pub fn with_user(mut self, user: UserRecord) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_admin(mut self, admin: AdminRecord) -> Self {
        self.admins.push(admin);
        self
    }

    pub fn with_refund(mut self, refund: RefundRecord) -> Self {
        self.refunds.push(refund);
        self
    }

    /// Subscription object the stub processor returns on re-fetch.
    pub fn with_processor_subscription(mut self, subscription: serde_json::Value) -> Self {
        self.processor = self.processor.with_subscription(subscription);
        self
    }

    pub fn build(self) -> AppState {
        self.build_with_mocks().0
    }

    pub fn build_with_mocks(self) -> (AppState, TestMocks) {
        let config = test_config();

        let mocks = TestMocks {
            users: Arc::new(InMemoryUserRecordRepo::with_users(self.users)),
            refunds: Arc::new(InMemoryRefundRepo::with_refunds(self.refunds)),
            admins: Arc::new(InMemoryAdminRepo::with_admins(self.admins)),
            event_log: Arc::new(InMemoryBillingEventLog::new()),
            processor: Arc::new(self.processor),
        };

        let linker = Arc::new(UserLinker::new(mocks.users.clone()));
        let writer = Arc::new(SubscriptionStateWriter::new(
            mocks.users.clone(),
            linker.clone(),
        ));
        let billing_webhook_use_cases = BillingWebhookUseCases::new(
            PlanResolver::new(config.plan_price_ids.clone()),
            mocks.processor.clone(),
            linker,
            writer,
            mocks.event_log.clone(),
        );

        let admin_use_cases = Arc::new(AdminUseCases::new(mocks.admins.clone()));
        let analytics_use_cases = AnalyticsUseCases::new(
            admin_use_cases.clone(),
            mocks.users.clone(),
            mocks.refunds.clone(),
            config.plan_monthly_prices.clone(),
        );

        let event_verifier = EventVerifier::new(
            config.stripe_webhook_secret.clone(),
            config.webhook_tolerance_secs,
        );

        let app_state = AppState {
            config: Arc::new(config),
            event_verifier: Arc::new(event_verifier),
            billing_webhook_use_cases: Arc::new(billing_webhook_use_cases),
            analytics_use_cases: Arc::new(analytics_use_cases),
            admin_use_cases,
        };

        (app_state, mocks)
    }
}
