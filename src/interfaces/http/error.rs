//! HTTP error boundary
//!
//! Every failure leaves the service as
//! `{"success": false, "error": "...", "reason": "..."}` with a matching
//! status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use super::versioning::VersionRejection;
use crate::application::AuthorizationError;
use crate::domain::DomainError;

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Human readable description
    pub error: String,
    /// Machine readable code, when one applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("API version rejected: {0}")]
    VersionRejected(VersionRejection),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Insufficient permissions: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(DomainError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Domain(DomainError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Domain(DomainError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::VersionRejected(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Authorization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn reason(&self) -> Option<&'static str> {
        match self {
            ApiError::Domain(DomainError::Validation(_)) => Some("validation"),
            ApiError::Domain(DomainError::NotFound { .. }) => Some("not-found"),
            ApiError::VersionRejected(rejection) => Some(rejection.reason()),
            ApiError::Unauthorized(_) => Some("unauthorized"),
            ApiError::Forbidden(_) => Some("forbidden"),
            ApiError::BadRequest(_) => Some("bad-request"),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details stay in the logs
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut body = ErrorResponse::new(message);
        if let Some(reason) = self.reason() {
            body = body.with_reason(reason);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        let validation: ApiError = DomainError::Validation("bad".into()).into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let missing: ApiError = DomainError::not_found("Author", "id", 3).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.reason(), Some("not-found"));

        let db: ApiError = DomainError::Database("disk".into()).into();
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn version_rejection_carries_its_reason() {
        let err = ApiError::VersionRejected(VersionRejection::VersionMismatch);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.reason(), Some("version-mismatch"));
    }

    #[test]
    fn auth_statuses() {
        assert_eq!(
            ApiError::Unauthorized("no token".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("is-admin".into()).status(),
            StatusCode::FORBIDDEN
        );
        let engine: ApiError = AuthorizationError::UnknownPolicy("x".into()).into();
        assert_eq!(engine.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn body_omits_reason_when_absent() {
        let json = serde_json::to_value(ErrorResponse::new("boom")).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("reason").is_none());
    }
}
