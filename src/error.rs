//! The single translation point from domain outcomes to HTTP responses.
//!
//! Repositories return `StoreError`, services return `ServiceError`, the gates
//! return `AuthError`. Handlers and middleware bubble all of them up as
//! `AppError`, whose `IntoResponse` impl picks the status code and decides what
//! the caller is allowed to see.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    auth::AuthError,
    models::{EntityId, ErrorResponse, ValidationError},
    repository::StoreError,
    service::ServiceError,
};

/// Top-level error type for handlers and middleware.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or rule-breaking input. 400, message names the field.
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid credential. 401, no details leaked.
    #[error(transparent)]
    Unauthorized(AuthError),

    /// Valid credential, insufficient role. 403.
    #[error(transparent)]
    Forbidden(AuthError),

    /// The targeted entity does not exist. 404.
    #[error("{0}")]
    NotFound(String),

    /// The payload clashes with existing data. 409.
    #[error("{0}")]
    Conflict(String),

    /// The path exists but not for this verb. 405.
    #[error("{0}")]
    MethodNotAllowed(String),

    /// The body exceeds the request size limit. 413.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Persistence failure. 500 (503 on timeout), details logged only.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    /// 404 for an id that resolved to nothing in `collection`.
    pub fn not_found(collection: &str, id: EntityId) -> Self {
        Self::NotFound(format!("{collection} entry {id} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Store(StoreError::Timeout { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Invalid(invalid) => invalid.into(),
            ServiceError::Conflict(msg) => Self::Conflict(msg),
            ServiceError::Store(store) => Self::Store(store),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InsufficientRole { .. } => Self::Forbidden(err),
            _ => Self::Unauthorized(err),
        }
    }
}

/// Converts application errors into HTTP responses.
///
/// Client errors echo their message. Auth failures are logged at debug level and
/// answered generically. Store failures are logged in full and redacted.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Validation(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::MethodNotAllowed(msg)
            | Self::PayloadTooLarge(msg) => msg.clone(),
            Self::Unauthorized(reason) => {
                tracing::debug!(%reason, "request not authenticated");
                "Authentication required".to_string()
            }
            Self::Forbidden(reason) => {
                tracing::debug!(%reason, "request not authorized");
                "Insufficient privileges".to_string()
            }
            Self::Store(err @ StoreError::Timeout { .. }) => {
                tracing::error!(error = %err, "store timeout");
                "Service temporarily unavailable".to_string()
            }
            Self::Store(err) => {
                tracing::error!(error = %err, "store failure");
                "Internal server error".to_string()
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Panic handler for `CatchPanicLayer`: a panicking handler becomes a plain 500
/// instead of tearing down the connection.
pub fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
        }),
    )
        .into_response()
}
