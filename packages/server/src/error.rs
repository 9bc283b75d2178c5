use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use thiserror::Error;

/// Why an API call produced no data.
///
/// Clients never see the distinction: every variant renders as `200 OK` with a
/// `null` body. The variant only decides how the failure is logged.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("identity owns {owned} links, limit is {limit}")]
    QuotaExceeded { owned: u64, limit: u64 },
    #[error("{0}")]
    NotFound(String),
    #[error("client address could not be determined")]
    AddressUnavailable,
    #[error("store error: {0}")]
    Store(#[from] DbErr),
}

impl AppError {
    /// Stable machine-readable code, used as a log field.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AddressUnavailable => "ADDRESS_UNAVAILABLE",
            AppError::Store(_) => "STORE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::Store(err) => {
                tracing::error!(code = self.code(), "Store operation failed: {}", err);
            }
            AppError::AddressUnavailable => {
                tracing::error!(code = self.code(), "{}", self);
            }
            _ => tracing::warn!(code = self.code(), "{}", self),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        (StatusCode::OK, Json(serde_json::Value::Null)).into_response()
    }
}
