//! Service error responses.
//!
//! Every error leaves the service as a JSON envelope with `success: false`
//! and a human-readable `error` string. Token expiry additionally carries
//! `needs_auth: true` so callers know to re-authenticate rather than
//! retry.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Missing or wrong `X-API-Secret` header.
    #[error("Unauthorized")]
    Unauthorized,

    /// Request body failed validation.
    #[error("{0}")]
    Validation(String),

    /// Marketplace rejected the email/password pair.
    #[error("Invalid email or password")]
    BadCredentials,

    /// Upstream tokens expired or were revoked.
    #[error("Token expired")]
    TokenExpired,

    /// The requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Everything else. The message is already phrased for the client.
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    needs_auth: Option<bool>,
}

impl ServiceError {
    fn status(&self) -> StatusCode {
        match self {
            ServiceError::Unauthorized | ServiceError::TokenExpired => StatusCode::UNAUTHORIZED,
            ServiceError::Validation(_) | ServiceError::BadCredentials => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if matches!(self, ServiceError::Internal(_)) {
            error!(error = %self, "request failed");
        }

        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            needs_auth: matches!(self, ServiceError::TokenExpired).then_some(true),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServiceError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ServiceError::Validation("Tokens are required".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServiceError::BadCredentials.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ServiceError::NotFound("Book not found in library".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Internal("Library fetch error: boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_strings() {
        assert_eq!(ServiceError::Unauthorized.to_string(), "Unauthorized");
        assert_eq!(
            ServiceError::BadCredentials.to_string(),
            "Invalid email or password"
        );
        assert_eq!(ServiceError::TokenExpired.to_string(), "Token expired");
    }
}
