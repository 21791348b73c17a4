//! Inbound payment processor webhook.
//!
//! The status code is the only retry signal the processor sees: 200 means
//! handled (or deliberately ignored), anything else triggers redelivery.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use serde::Serialize;
use tracing::{Span, info};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    infra::webhook_verifier::SIGNATURE_HEADER,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(handle_webhook))
}

#[derive(Serialize)]
struct WebhookResponse {
    received: bool,
    outcome: &'static str,
}

/// POST /api/billing/webhook
async fn handle_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::InvalidSignature("Missing signature header".into()))?;

    let event = app_state.event_verifier.verify(&body, signature)?;

    // Failures are logged once by `AppError::into_response`, inside this span
    let span = Span::current();
    span.record("event_id", event.id.as_str());
    span.record("event_type", event.event_type.as_str());

    let outcome = app_state.billing_webhook_use_cases.dispatch(&event).await?;
    info!(
        event_id = %event.id,
        event_type = %event.event_type,
        event_created = ?event.created,
        outcome = outcome.as_str(),
        "Webhook handled"
    );

    Ok(Json(WebhookResponse {
        received: true,
        outcome: outcome.as_str(),
    }))
}
