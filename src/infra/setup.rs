use std::fs::File;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{http::app_state::AppState, persistence::PostgresPersistence},
    application::{
        helpers::plan_resolver::PlanResolver,
        ports::record_store::{
            AdminRepoTrait, BillingEventLogTrait, RefundRepoTrait, UserRecordRepoTrait,
        },
        use_cases::{
            admin::AdminUseCases, analytics::AnalyticsUseCases,
            billing_webhook::BillingWebhookUseCases, subscription_writer::SubscriptionStateWriter,
            user_linker::UserLinker,
        },
    },
    infra::{
        config::AppConfig, db::init_db, stripe_client::StripeClient,
        webhook_verifier::EventVerifier,
    },
};

pub async fn init_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let pool = init_db(&config.database_url).await?;
    let postgres_arc = Arc::new(PostgresPersistence::new(pool));

    let users = postgres_arc.clone() as Arc<dyn UserRecordRepoTrait>;
    let stripe = Arc::new(StripeClient::new(
        config.stripe_secret_key.clone(),
        config.stripe_api_base.clone(),
    ));

    let linker = Arc::new(UserLinker::new(users.clone()));
    let writer = Arc::new(SubscriptionStateWriter::new(users.clone(), linker.clone()));
    let billing_webhook_use_cases = BillingWebhookUseCases::new(
        PlanResolver::new(config.plan_price_ids.clone()),
        stripe,
        linker,
        writer,
        postgres_arc.clone() as Arc<dyn BillingEventLogTrait>,
    );

    let admin_use_cases = Arc::new(AdminUseCases::new(
        postgres_arc.clone() as Arc<dyn AdminRepoTrait>
    ));
    let analytics_use_cases = AnalyticsUseCases::new(
        admin_use_cases.clone(),
        users,
        postgres_arc as Arc<dyn RefundRepoTrait>,
        config.plan_monthly_prices.clone(),
    );

    let event_verifier = EventVerifier::new(
        config.stripe_webhook_secret.clone(),
        config.webhook_tolerance_secs,
    );

    Ok(AppState {
        config: Arc::new(config),
        event_verifier: Arc::new(event_verifier),
        billing_webhook_use_cases: Arc::new(billing_webhook_use_cases),
        analytics_use_cases: Arc::new(analytics_use_cases),
        admin_use_cases,
    })
}

/// Console logs always; structured JSON logs when `log_file` is set.
pub fn init_tracing(log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "subsync=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let json_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {path}"))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(true)
                    .with_span_list(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();

    Ok(())
}
