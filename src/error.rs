//! Classified upstream failures and their HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Classified outcome of a failed tracking lookup.
///
/// The `Display` text is the fixed client-facing detail message; nothing from
/// the underlying failure ever leaks into it. Full context is logged at the
/// classification site instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TrackingError {
    /// Upstream answered successfully but reported no tracking data.
    #[error("Tracking not found")]
    NotFound,

    /// The upstream call exceeded the configured timeout.
    #[error("EPS timeout")]
    Timeout,

    /// Upstream was reachable but responded with a non-success status.
    #[error("EPS service error")]
    Upstream,

    /// Anything else: connection failures, malformed bodies.
    #[error("Internal server error")]
    Internal,
}

impl TrackingError {
    /// HTTP status for this classification.
    pub fn status(&self) -> StatusCode {
        match self {
            TrackingError::NotFound => StatusCode::NOT_FOUND,
            TrackingError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            TrackingError::Upstream => StatusCode::BAD_GATEWAY,
            TrackingError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TrackingError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
