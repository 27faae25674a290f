//! Uniform success envelope returned by every gateway endpoint.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusKey {
    Success,
    Failed,
    Unchanged,
}

/// `{ "statusKey": "...", "data": ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResponse<T> {
    pub status_key: StatusKey,
    pub data: T,
}

pub fn build_base_response<T>(status_key: StatusKey, data: T) -> BaseResponse<T> {
    BaseResponse { status_key, data }
}

impl<T: Serialize> IntoResponse for BaseResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// OpenAPI shape of [`BaseResponse`]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDoc {
    pub status_key: StatusKey,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

/// OpenAPI shape of the JSON error body
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDoc {
    pub status_code: u16,
    pub code: crate::rpc::exception::ErrorCode,
    pub message: String,
    pub message_key: String,
    pub path: String,
    pub timestamp: String,
}
