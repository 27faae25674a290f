//! Extractors whose rejections are [`GatewayError`]s, so malformed input goes through
//! the same error filter as everything else.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

use crate::core::error::GatewayError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(GatewayError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(GatewayError))]
pub struct AppQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(GatewayError))]
pub struct AppPath<T>(pub T);

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected JSON body");
        GatewayError::validation("body", "common.errors.invalidBody")
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected query string");
        GatewayError::validation("query", "common.errors.invalidQuery")
    }
}

impl From<PathRejection> for GatewayError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected path parameters");
        GatewayError::validation("path", "common.errors.invalidPath")
    }
}

impl From<axum::extract::multipart::MultipartRejection> for GatewayError {
    fn from(rejection: axum::extract::multipart::MultipartRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected multipart body");
        GatewayError::validation("body", "common.errors.invalidBody")
    }
}

impl From<axum::extract::multipart::MultipartError> for GatewayError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        tracing::debug!(error = %err.body_text(), "Failed to read multipart field");
        GatewayError::validation("body", "common.errors.invalidBody")
    }
}
