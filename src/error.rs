//! Service error types with HTTP status code mapping.
//!
//! [`NetworkError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::InviteStatus;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "profile not found for auth user 3f0c…",
///     "details": null
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
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category         | HTTP Status                  |
/// |-----------|------------------|------------------------------|
/// | 1000–1999 | Validation       | 400 Bad Request              |
/// | 2000–2999 | Not Found / State| 404 / 403 / 409 / 429        |
/// | 3000–3999 | Server           | 500 / 502                    |
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No player profile is linked to the given auth identity.
    #[error("profile not found for auth user {0}")]
    ProfileNotFound(uuid::Uuid),

    /// Player with the given id does not exist.
    #[error("player not found: {0}")]
    PlayerNotFound(uuid::Uuid),

    /// Relationship with the given id does not exist.
    #[error("relationship not found: {0}")]
    RelationshipNotFound(uuid::Uuid),

    /// Invite with the given id does not exist.
    #[error("invite not found: {0}")]
    InviteNotFound(uuid::Uuid),

    /// The acting player may not perform this mutation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The mutation would break a relationship invariant, or lost a race
    /// against a concurrent change.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A network fetch was skipped by the throttle and no earlier value
    /// exists to answer with.
    #[error("network fetch throttled, retry in {retry_after_ms} ms")]
    Throttled {
        /// Throttle window in milliseconds.
        retry_after_ms: u64,
    },

    /// Invite state machine rejected the transition.
    #[error("invalid invite transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: InviteStatus,
        /// Requested status.
        to: InviteStatus,
    },

    /// Email-delivery function reported a failure.
    #[error("email delivery failed: {0}")]
    EmailDelivery(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NetworkError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::ProfileNotFound(_) => 2001,
            Self::PlayerNotFound(_) => 2002,
            Self::RelationshipNotFound(_) => 2003,
            Self::InviteNotFound(_) => 2004,
            Self::Forbidden(_) => 2101,
            Self::Conflict(_) => 2201,
            Self::InvalidTransition { .. } => 2202,
            Self::Throttled { .. } => 2301,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::EmailDelivery(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ProfileNotFound(_)
            | Self::PlayerNotFound(_)
            | Self::RelationshipNotFound(_)
            | Self::InviteNotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) | Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::EmailDelivery(_) => StatusCode::BAD_GATEWAY,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NetworkError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        let id = uuid::Uuid::new_v4();
        for err in [
            NetworkError::ProfileNotFound(id),
            NetworkError::PlayerNotFound(id),
            NetworkError::RelationshipNotFound(id),
            NetworkError::InviteNotFound(id),
        ] {
            assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn invalid_transition_is_a_conflict() {
        let err = NetworkError::InvalidTransition {
            from: InviteStatus::Accepted,
            to: InviteStatus::Sent,
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), 2202);
        assert_eq!(err.to_string(), "invalid invite transition: accepted -> sent");
    }

    #[test]
    fn response_carries_status() {
        let response = NetworkError::Forbidden("not your request".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
