use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    application::use_cases::{
        admin::AdminUseCases, analytics::AnalyticsUseCases,
        billing_webhook::BillingWebhookUseCases,
    },
    infra::{config::AppConfig, webhook_verifier::EventVerifier},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub event_verifier: Arc<EventVerifier>,
    pub billing_webhook_use_cases: Arc<BillingWebhookUseCases>,
    pub analytics_use_cases: Arc<AnalyticsUseCases>,
    pub admin_use_cases: Arc<AdminUseCases>,
}

impl FromRef<AppState> for Arc<AdminUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.admin_use_cases.clone()
    }
}
