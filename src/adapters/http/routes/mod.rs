pub mod admin;
pub mod billing_webhook;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/billing", billing_webhook::router())
        .nest("/admin", admin::router())
}
