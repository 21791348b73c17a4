use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_processor::PaymentProcessorPort,
};

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Read-only Stripe client used to re-fetch live subscriptions.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
    api_base: Url,
}

impl StripeClient {
    pub fn new(secret_key: SecretString, api_base: Url) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            api_base,
        }
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.secret_key.expose_secret()));
        format!("Basic {}", encoded)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.as_str().trim_end_matches('/'), path)
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    pub async fn get_subscription(&self, subscription_id: &str) -> AppResult<Value> {
        let response = self
            .client
            .get(self.endpoint(&format!("subscriptions/{}", subscription_id)))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Stripe request failed: {}", e)))?;

        self.handle_response(response).await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Stripe API error");

            if let Ok(error) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(AppError::Provider(format!(
                    "Stripe error: {}",
                    error.error.message.unwrap_or(error.error.error_type)
                )));
            }

            return Err(AppError::Provider(format!(
                "Stripe API error: {} - {}",
                status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Stripe response");
            AppError::Provider(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

#[async_trait]
impl PaymentProcessorPort for StripeClient {
    async fn fetch_subscription(&self, subscription_id: &str) -> AppResult<Value> {
        self.get_subscription(subscription_id).await
    }
}

// ============================================================================
// Stripe Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    #[serde(rename = "type")]
    error_type: String,
    message: Option<String>,
}
