//! API error types with structured JSON responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::booking::BookingError;
use crate::catalog::CatalogError;
use crate::core_state::CoreError;
use crate::scheduling::ConflictReport;
use crate::waitlist::WaitlistError;

const CONFLICT_MESSAGE: &str =
    "This time slot is already booked. Please choose another slot or request an override.";

/// Error envelope: `{ "ok": false, "error": { code, message, details? } }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),
    #[error("Scheduling conflict")]
    Conflict(ConflictReport),
    #[error("No resources: {0}")]
    NoResources(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
                None,
            ),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail, None),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail, None),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", detail, None)
            }
            ApiError::InvalidInterval(detail) => {
                (StatusCode::BAD_REQUEST, "INVALID_INTERVAL", detail, None)
            }
            ApiError::Conflict(report) => (
                StatusCode::CONFLICT,
                "CONFLICT",
                CONFLICT_MESSAGE.to_string(),
                serde_json::to_value(&report).ok(),
            ),
            ApiError::NoResources(detail) => (StatusCode::CONFLICT, "NO_RESOURCES", detail, None),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            ok: false,
            error: ErrorDetail {
                code,
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<crate::db::DatabaseError> for ApiError {
    fn from(err: crate::db::DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Forbidden(denied) => ApiError::Forbidden(denied.to_string()),
            e @ BookingError::InvalidInterval { .. } => ApiError::InvalidInterval(e.to_string()),
            e @ BookingError::NotFound(_) => ApiError::NotFound(e.to_string()),
            BookingError::Conflict(report) => ApiError::Conflict(report),
            BookingError::Validation(msg) => ApiError::BadRequest(msg),
            BookingError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Forbidden(denied) => ApiError::Forbidden(denied.to_string()),
            e @ CatalogError::NotFound(_) => ApiError::NotFound(e.to_string()),
            CatalogError::Validation(msg) => ApiError::BadRequest(msg),
            CatalogError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<WaitlistError> for ApiError {
    fn from(err: WaitlistError) -> Self {
        match err {
            WaitlistError::Forbidden(denied) => ApiError::Forbidden(denied.to_string()),
            e @ WaitlistError::NotFound(_) => ApiError::NotFound(e.to_string()),
            WaitlistError::Validation(msg) => ApiError::BadRequest(msg),
            e @ WaitlistError::NoResources => ApiError::NoResources(e.to_string()),
            WaitlistError::Booking(e) => ApiError::from(e),
            WaitlistError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
