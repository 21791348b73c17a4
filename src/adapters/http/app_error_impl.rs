use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, retryable = self.is_retryable(), "Request failed");

        let code = self.code();
        match self {
            AppError::InvalidSignature(msg) => {
                error_resp(StatusCode::BAD_REQUEST, code, Some(msg))
            }
            AppError::UnresolvedPlan(msg) | AppError::UnresolvedPeriod(msg) => {
                error_resp(StatusCode::UNPROCESSABLE_ENTITY, code, Some(msg))
            }
            AppError::UserNotFound | AppError::NotFound => {
                error_resp(StatusCode::NOT_FOUND, code, None)
            }
            AppError::Database(_) | AppError::Internal(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, None)
            }
            AppError::Provider(_) => error_resp(StatusCode::BAD_GATEWAY, code, None),
            AppError::InvalidInput(msg) => error_resp(StatusCode::BAD_REQUEST, code, Some(msg)),
            AppError::InvalidCredentials => error_resp(StatusCode::UNAUTHORIZED, code, None),
            AppError::Forbidden => error_resp(StatusCode::FORBIDDEN, code, None),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
