//! # Error Handling Module
//!
//! This module provides the gateway's error type using the `thiserror` crate.
//! Every failure a handler can produce is a [`GatewayError`]; each variant knows its
//! [`ErrorCode`] (and therefore its HTTP status) and the i18n key of its message.
//!
//! ## Propagation
//! - Validation and precondition failures are raised by the business services.
//! - Transport failures are normalized by the RPC wrapper into a
//!   [`TypedRpcException`] and wrapped in [`GatewayError::Rpc`] unchanged.
//! - At the HTTP boundary, `IntoResponse` writes a JSON error body and attaches an
//!   [`ErrorReport`] extension; the i18n error filter then translates the message
//!   for the caller's language.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::rpc::exception::{ErrorCode, TypedRpcException};

/// Main result type used throughout the gateway
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Application error for every layer of the gateway
#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    /// Any error that came back from (or on the way to) a backing service
    #[error("{0}")]
    Rpc(#[from] TypedRpcException),

    /// Request validation errors (malformed body, out-of-range field, ...)
    #[error("Request validation failed: {field} - {key}")]
    Validation { field: String, key: String },

    /// Preconditions that are not about a single field
    #[error("Bad request: {key}")]
    BadRequest { key: String },

    /// Missing or invalid credentials
    #[error("Unauthorized: {key}")]
    Unauthorized { key: String },

    /// Authenticated but not allowed
    #[error("Forbidden: {key}")]
    Forbidden { key: String },

    /// Missing resource
    #[error("Not found: {key}")]
    NotFound { key: String },

    /// Conflicting resource (duplicate SKU, ...)
    #[error("Conflict: {key}")]
    Conflict { key: String },

    /// Configuration-related errors (invalid config, missing files, etc.)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Media host failures
    #[error("Upload failed: {message}")]
    Upload { message: String },

    /// OAuth provider failures (token exchange, profile fetch)
    #[error("OAuth error: {message}")]
    OAuth { message: String },

    /// Internal server errors for unexpected failures
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    pub fn validation(field: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            key: key.into(),
        }
    }

    pub fn bad_request(key: impl Into<String>) -> Self {
        Self::BadRequest { key: key.into() }
    }

    pub fn unauthorized(key: impl Into<String>) -> Self {
        Self::Unauthorized { key: key.into() }
    }

    pub fn forbidden(key: impl Into<String>) -> Self {
        Self::Forbidden { key: key.into() }
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn conflict(key: impl Into<String>) -> Self {
        Self::Conflict { key: key.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn upload(message: impl Into<String>) -> Self {
        Self::Upload {
            message: message.into(),
        }
    }

    pub fn oauth(message: impl Into<String>) -> Self {
        Self::OAuth {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Machine-readable code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Rpc(exception) => exception.code,
            Self::Validation { .. } | Self::BadRequest { .. } => ErrorCode::BadRequest,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Conflict { .. } => ErrorCode::Conflict,
            Self::Upload { .. } | Self::OAuth { .. } => ErrorCode::ServiceUnavailable,
            Self::Configuration { .. } | Self::Internal { .. } => ErrorCode::InternalServerError,
        }
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        self.code().status_code()
    }

    /// i18n key of the client-facing message
    ///
    /// Internal details (config, upload, OAuth failures) never leak to clients; they are
    /// logged where they happen and answered with a generic key.
    pub fn message_key(&self) -> &str {
        match self {
            Self::Rpc(exception) => &exception.message,
            Self::Validation { key, .. }
            | Self::BadRequest { key }
            | Self::Unauthorized { key }
            | Self::Forbidden { key }
            | Self::NotFound { key }
            | Self::Conflict { key } => key,
            Self::Upload { .. } => "media.errors.uploadFailed",
            Self::OAuth { .. } => "auth.errors.oauthFailed",
            Self::Configuration { .. } | Self::Internal { .. } => "common.errors.internalServerError",
        }
    }

    /// Field name for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Typed exception view, as it would travel over the bus
    pub fn to_exception(&self) -> TypedRpcException {
        TypedRpcException::new(self.code(), self.message_key())
    }
}

/// Structured error details attached to error responses
///
/// The i18n error filter reads this extension to rebuild the body in the caller's
/// language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message_key: String,
    pub field: Option<String>,
}

impl From<&GatewayError> for ErrorReport {
    fn from(err: &GatewayError) -> Self {
        Self {
            code: err.code(),
            message_key: err.message_key().to_string(),
            field: err.field().map(str::to_string),
        }
    }
}

impl From<serde_yaml::Error> for GatewayError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::config(format!("YAML error: {}", err))
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("I/O error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for GatewayError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::unauthorized("auth.errors.tokenExpired"),
            _ => Self::unauthorized("auth.errors.invalidToken"),
        }
    }
}

/// Untranslated JSON error body; the i18n filter replaces `message`
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let report = ErrorReport::from(&self);
        let body = serde_json::json!({
            "statusCode": status.as_u16(),
            "code": report.code,
            "message": report.message_key,
            "messageKey": report.message_key,
            "field": report.field,
        });

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            GatewayError::unauthorized("auth.errors.missingToken").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(GatewayError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(GatewayError::validation("email", "x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GatewayError::from(TypedRpcException::timeout_or_network()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_rpc_errors_keep_their_key() {
        let err = GatewayError::from(TypedRpcException::new(ErrorCode::Conflict, "product.errors.skuExists"));
        assert_eq!(err.message_key(), "product.errors.skuExists");
        assert_eq!(err.to_exception().code, ErrorCode::Conflict);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = GatewayError::internal("database password is hunter2");
        assert_eq!(err.message_key(), "common.errors.internalServerError");
    }

    #[test]
    fn test_response_carries_report() {
        let response = GatewayError::validation("rating", "review.errors.invalidRating").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.field.as_deref(), Some("rating"));
        assert_eq!(report.message_key, "review.errors.invalidRating");
    }
}
