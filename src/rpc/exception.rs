//! # Typed RPC Exception
//!
//! Structured errors that travel across service boundaries. A `TypedRpcException`
//! carries a machine-readable [`ErrorCode`] and an i18n message key; it is produced by
//! backing services (inside reply packets) and by the RPC call wrapper when a call
//! cannot be completed, and it reaches the HTTP boundary unchanged.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use utoipa::ToSchema;

/// Error codes shared by the gateway and the backing services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    UnprocessableEntity,
    InternalServerError,
    ServiceUnavailable,
    TimeOutOrNetwork,
}

impl ErrorCode {
    /// HTTP status the global error filter answers with
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::TimeOutOrNetwork => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Wire name, e.g. `SERVICE_UNAVAILABLE`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::UnprocessableEntity => "UNPROCESSABLE_ENTITY",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::TimeOutOrNetwork => "TIME_OUT_OR_NETWORK",
        }
    }

    /// Parse a wire name; services may also send a numeric HTTP status
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => serde_json::from_value(Value::String(name.clone())).ok(),
            Value::Number(number) => match number.as_u64()? {
                400 => Some(Self::BadRequest),
                401 => Some(Self::Unauthorized),
                403 => Some(Self::Forbidden),
                404 => Some(Self::NotFound),
                409 => Some(Self::Conflict),
                422 => Some(Self::UnprocessableEntity),
                500 => Some(Self::InternalServerError),
                503 => Some(Self::ServiceUnavailable),
                504 => Some(Self::TimeOutOrNetwork),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error carried across service boundaries
///
/// `message` is always an i18n key (for example `cart.errors.insufficientStock`),
/// never a client-facing sentence. Translation happens at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error, ToSchema)]
#[error("{code}: {message}")]
pub struct TypedRpcException {
    pub code: ErrorCode,
    pub message: String,
}

impl TypedRpcException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn service_unavailable() -> Self {
        Self::new(ErrorCode::ServiceUnavailable, "common.errors.serviceUnavailable")
    }

    pub fn timeout_or_network() -> Self {
        Self::new(ErrorCode::TimeOutOrNetwork, "common.errors.timeoutOrNetwork")
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "common.errors.unauthorized")
    }

    pub fn internal() -> Self {
        Self::new(ErrorCode::InternalServerError, "common.errors.internalServerError")
    }

    /// Normalize the `err` field of a reply packet
    ///
    /// Backing services reply with `{ code, message }`, sometimes with a numeric
    /// `statusCode` instead of `code`, and occasionally with a bare string.
    pub fn from_remote(err: &Value) -> Self {
        match err {
            Value::String(message) => Self::new(ErrorCode::InternalServerError, message.clone()),
            Value::Object(fields) => {
                let code = fields
                    .get("code")
                    .and_then(ErrorCode::parse)
                    .or_else(|| fields.get("statusCode").and_then(ErrorCode::parse))
                    .unwrap_or(ErrorCode::InternalServerError);
                let message = fields
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| "common.errors.internalServerError".to_string());
                Self::new(code, message)
            }
            _ => Self::internal(),
        }
    }
}
