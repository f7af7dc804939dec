//! API error types with structured JSON responses.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core_state::CoreError;
use crate::crypto::CryptoError;
use crate::db::DatabaseError;
use crate::models::{LinkRejection, ValidationError};
use crate::reports::ReportError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Rate limit exceeded")]
    RateLimited { retry_after: u64 },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Invitation link rejected: {0}")]
    Link(LinkRejection),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut reason = None;
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Your role cannot access this resource".to_string(),
            ),
            ApiError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                format!("Rate limit exceeded. Retry after {retry_after}s"),
            ),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::Validation(err) => {
                (StatusCode::BAD_REQUEST, "VALIDATION", err.to_string())
            }
            ApiError::Link(rejection) => {
                reason = Some(rejection.reason());
                match rejection {
                    LinkRejection::Invalid => (
                        StatusCode::NOT_FOUND,
                        "INVALID_LINK",
                        "This invitation link is not valid".to_string(),
                    ),
                    LinkRejection::Expired => (
                        StatusCode::GONE,
                        "EXPIRED_LINK",
                        "This invitation link has expired".to_string(),
                    ),
                    LinkRejection::Used => (
                        StatusCode::CONFLICT,
                        "USED_LINK",
                        "This invitation has already been answered".to_string(),
                    ),
                }
            }
            ApiError::InvalidTransition(detail) => {
                (StatusCode::CONFLICT, "INVALID_TRANSITION", detail.clone())
            }
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail.clone()),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message,
                reason,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let ApiError::RateLimited { retry_after } = &self {
            if let Ok(val) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("Retry-After", val);
            }
        }
        response
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        if err.is_constraint() {
            return match err {
                DatabaseError::ConstraintViolation(detail) => ApiError::Conflict(detail),
                _ => ApiError::Conflict("A conflicting record already exists".into()),
            };
        }
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} {id} not found"))
            }
            DatabaseError::LinkRejected(rejection) => ApiError::Link(rejection),
            DatabaseError::InvalidTransition { entity, from, to } => {
                ApiError::InvalidTransition(format!("{entity} cannot move from {from} to {to}"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Database(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Database(e) => e.into(),
            ReportError::Pdf(detail) => ApiError::Internal(detail),
        }
    }
}
