use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
    routing::{get, patch},
};
use serde::Deserialize;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::{jwt, use_cases::analytics::SubscriptionListQuery},
    domain::entities::admin::AccessLevel,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analytics", get(get_analytics))
        .route("/admins", get(list_admins).post(create_admin))
        .route(
            "/admins/{external_identity_id}",
            patch(update_admin).delete(delete_admin),
        )
}

/// External identity id of the caller, from the identity-provider bearer token.
fn current_identity(headers: &HeaderMap, app_state: &AppState) -> AppResult<String> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidCredentials)?;

    let claims = jwt::verify(token, &app_state.config.identity_jwt_secret)?;
    Ok(claims.sub)
}

/// GET /api/admin/analytics
async fn get_analytics(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SubscriptionListQuery>,
) -> AppResult<impl IntoResponse> {
    let identity = current_identity(&headers, &app_state)?;
    let analytics = app_state
        .analytics_use_cases
        .get_analytics(&identity, &query)
        .await?;
    Ok(Json(analytics))
}

/// GET /api/admin/admins
async fn list_admins(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let identity = current_identity(&headers, &app_state)?;
    let admins = app_state.admin_use_cases.list_admins(&identity).await?;
    Ok(Json(admins))
}

#[derive(Deserialize)]
struct CreateAdminPayload {
    external_identity_id: String,
    access_level: AccessLevel,
}

/// POST /api/admin/admins
async fn create_admin(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateAdminPayload>,
) -> AppResult<impl IntoResponse> {
    let identity = current_identity(&headers, &app_state)?;
    let admin = app_state
        .admin_use_cases
        .create_admin(&identity, &payload.external_identity_id, payload.access_level)
        .await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

#[derive(Deserialize)]
struct UpdateAdminPayload {
    access_level: AccessLevel,
}

/// PATCH /api/admin/admins/{external_identity_id}
async fn update_admin(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(external_identity_id): Path<String>,
    Json(payload): Json<UpdateAdminPayload>,
) -> AppResult<impl IntoResponse> {
    let identity = current_identity(&headers, &app_state)?;
    let admin = app_state
        .admin_use_cases
        .update_access_level(&identity, &external_identity_id, payload.access_level)
        .await?;
    Ok(Json(admin))
}

/// DELETE /api/admin/admins/{external_identity_id}
async fn delete_admin(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(external_identity_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let identity = current_identity(&headers, &app_state)?;
    app_state
        .admin_use_cases
        .delete_admin(&identity, &external_identity_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
