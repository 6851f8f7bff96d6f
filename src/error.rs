//! Marketplace error types with HTTP status code mapping.
//!
//! [`MarketError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Server-side failures are logged in full and rendered with a generic
//! message so backend details never reach the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{OfferAction, OfferStatus, PlantStatus};

/// Message shown to callers when a server-side failure is hidden.
const GENERIC_FAILURE_MESSAGE: &str = "something went wrong, please try again later";

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "you have no available plants to offer"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`MarketError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Service-wide error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category         | HTTP Status                        |
/// |-----------|------------------|------------------------------------|
/// | 1000–1999 | Validation       | 400 / 413 / 415                    |
/// | 2000–2999 | Not Found        | 404 Not Found                      |
/// | 3000–3999 | Server           | 500 Internal Server Error          |
/// | 4000–4999 | Exchange state   | 409 Conflict / 422 Unprocessable   |
/// | 5000–5999 | Identity         | 401 Unauthorized / 403 Forbidden   |
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Plant with the given ID was not found.
    #[error("plant not found: {0}")]
    PlantNotFound(uuid::Uuid),

    /// Profile with the given ID was not found.
    #[error("profile not found: {0}")]
    ProfileNotFound(uuid::Uuid),

    /// Exchange offer with the given ID was not found.
    #[error("exchange offer not found: {0}")]
    OfferNotFound(uuid::Uuid),

    /// Notification with the given ID was not found for the caller.
    #[error("notification not found: {0}")]
    NotificationNotFound(uuid::Uuid),

    /// The sender owns no plant with status `available`.
    #[error("you have no available plants to offer")]
    NoAvailablePlants,

    /// The receiver's selection was empty.
    #[error("select at least one plant")]
    EmptySelection,

    /// A plant is not in a state that allows the operation.
    #[error("plant {plant_id} is {status}, expected available")]
    PlantUnavailable {
        /// Offending plant.
        plant_id: uuid::Uuid,
        /// Its current status.
        status: PlantStatus,
    },

    /// The action is not valid for the offer's current status.
    #[error("cannot {action} an offer that is {from}")]
    InvalidTransition {
        /// Status the offer was in.
        from: OfferStatus,
        /// Action that was attempted.
        action: OfferAction,
    },

    /// A uniqueness rule was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Uploaded blob exceeds the bucket size cap.
    #[error("file too large for bucket {bucket}: limit is {limit_bytes} bytes")]
    PayloadTooLarge {
        /// Target bucket name.
        bucket: &'static str,
        /// Maximum accepted size.
        limit_bytes: usize,
    },

    /// Uploaded blob has a content type that is not accepted.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// No actor identity accompanied the request.
    #[error("missing or invalid session")]
    Unauthenticated,

    /// The actor may not perform the operation on this record.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Row store failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Object storage failure.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MarketError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::PayloadTooLarge { .. } => 1002,
            Self::UnsupportedMediaType(_) => 1003,
            Self::PlantNotFound(_) => 2001,
            Self::ProfileNotFound(_) => 2002,
            Self::OfferNotFound(_) => 2003,
            Self::NotificationNotFound(_) => 2004,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::StorageError(_) => 3002,
            Self::NoAvailablePlants => 4001,
            Self::EmptySelection => 4002,
            Self::PlantUnavailable { .. } => 4003,
            Self::InvalidTransition { .. } => 4004,
            Self::Conflict(_) => 4005,
            Self::Unauthenticated => 5001,
            Self::Forbidden(_) => 5002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PlantNotFound(_)
            | Self::ProfileNotFound(_)
            | Self::OfferNotFound(_)
            | Self::NotificationNotFound(_) => StatusCode::NOT_FOUND,
            Self::NoAvailablePlants | Self::EmptySelection | Self::PlantUnavailable { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::InvalidTransition { .. } | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::PersistenceError(_) | Self::StorageError(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns `true` for failures on our side whose detail is hidden from
    /// the caller.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::PersistenceError(_) | Self::StorageError(_) | Self::Internal(_)
        )
    }
}

impl From<sqlx::Error> for MarketError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl From<std::io::Error> for MarketError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
            self.to_string()
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
