//! Global error filter.
//!
//! Runs around every route: stores the request [`Lang`] in the request extensions
//! and, when the response carries an [`ErrorReport`], rewrites the body with the
//! translated message.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::core::error::ErrorReport;
use crate::i18n::{Lang, Translator};

pub async fn translate_errors(State(translator): State<Arc<Translator>>, mut request: Request, next: Next) -> Response {
    let lang = Lang::detect(request.headers(), request.uri().query(), translator.default_lang());
    let path = request.uri().path().to_string();
    request.extensions_mut().insert(lang);

    let response = next.run(request).await;
    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let status = response.status();
    let body = json!({
        "statusCode": status.as_u16(),
        "code": report.code,
        "message": translator.translate(lang, &report.message_key),
        "messageKey": report.message_key,
        "field": report.field,
        "path": path,
        "timestamp": Utc::now().to_rfc3339(),
    });

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
    Response::from_parts(parts, Body::from(body.to_string()))
}
