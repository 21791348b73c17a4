use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Unresolved plan: {0}")]
    UnresolvedPlan(String),

    #[error("Unresolved billing period: {0}")]
    UnresolvedPeriod(String),

    #[error("User not found")]
    UserNotFound,

    /// Record store RPC failure. Propagated unchanged so the processor redelivers.
    #[error("Database error: {0}")]
    Database(String),

    #[error("Payment processor error: {0}")]
    Provider(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Transient failures that may succeed when the processor redelivers.
    ///
    /// Every failure still produces a non-2xx response; this only classifies
    /// the failure for logs.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Database(_) => true,
            AppError::Provider(_) => true,
            AppError::Internal(_) => true,
            // Resolves once the user signs in and a later event links them
            AppError::UserNotFound => true,

            AppError::InvalidSignature(_) => false,
            AppError::UnresolvedPlan(_) => false,
            AppError::UnresolvedPeriod(_) => false,
            AppError::InvalidInput(_) => false,
            AppError::InvalidCredentials => false,
            AppError::Forbidden => false,
            AppError::NotFound => false,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidSignature(_) => ErrorCode::InvalidSignature,
            AppError::UnresolvedPlan(_) => ErrorCode::UnresolvedPlan,
            AppError::UnresolvedPeriod(_) => ErrorCode::UnresolvedPeriod,
            AppError::UserNotFound => ErrorCode::UserNotFound,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::Provider(_) => ErrorCode::ProviderError,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::Forbidden => ErrorCode::Forbidden,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidSignature,
    UnresolvedPlan,
    UnresolvedPeriod,
    UserNotFound,
    DatabaseError,
    ProviderError,
    InvalidInput,
    InvalidCredentials,
    Forbidden,
    NotFound,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::UnresolvedPlan => "UNRESOLVED_PLAN",
            ErrorCode::UnresolvedPeriod => "UNRESOLVED_PERIOD",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ProviderError => "PROVIDER_ERROR",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
