#![allow(dead_code)]
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn error(code: &str, message: &str) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.to_string(),
            }),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Application error type. Every per-module error enum (`LockError`,
/// `MatchingError`, `AccrualError`, `ContestError`) converts into this at the
/// HTTP boundary; validation errors become 4xx, lock contention becomes 503,
/// everything else is a 500.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: &str) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn conflict(message: &str) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn service_unavailable(message: &str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", message)
    }

    pub fn internal(message: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::error(&self.code, &self.message);
        (self.status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("database error: {}", err);
        AppError::internal("a database error occurred")
    }
}

impl From<crate::locks::LockError> for AppError {
    fn from(err: crate::locks::LockError) -> Self {
        match err {
            crate::locks::LockError::InsufficientBalance
            | crate::locks::LockError::InsufficientShares => {
                AppError::bad_request(&err.to_string())
            }
            crate::locks::LockError::Database(e) => e.into(),
        }
    }
}

impl From<crate::matching::MatchingError> for AppError {
    fn from(err: crate::matching::MatchingError) -> Self {
        use crate::matching::MatchingError as M;
        match err {
            M::InvalidPrice(_)
            | M::InvalidQuantity(_)
            | M::InsufficientLiquidity
            | M::Lock(_) => AppError::bad_request(&err.to_string()),
            M::OrderNotFound(_) => AppError::not_found(&err.to_string()),
            M::NotCancellable => AppError::conflict(&err.to_string()),
            M::Database(e) => e.into(),
        }
    }
}

impl From<crate::accrual::AccrualError> for AppError {
    fn from(err: crate::accrual::AccrualError) -> Self {
        use crate::accrual::AccrualError as A;
        match err {
            A::InvalidSplits(_) | A::TooManyPlayers => AppError::bad_request(&err.to_string()),
            A::Database(e) => e.into(),
        }
    }
}

impl From<crate::contest::ContestError> for AppError {
    fn from(err: crate::contest::ContestError) -> Self {
        use crate::contest::ContestError as C;
        match err {
            C::ContestNotFound(_) | C::EntryNotFound(_) => AppError::not_found(&err.to_string()),
            C::ContestNotOpen | C::EmptyLineup | C::Lock(_) => {
                AppError::bad_request(&err.to_string())
            }
            C::Database(e) => e.into(),
        }
    }
}
