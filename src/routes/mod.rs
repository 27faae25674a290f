//! HTTP surface: one module per resource, each exposing a `routes()` router.
//!
//! Handlers stay thin. They extract the caller and the request, hand both to a
//! business service and return its envelope; all rules live in `services`.

pub mod admin;
pub mod auth;
pub mod carts;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;

use axum::extract::multipart::MultipartRejection;
use axum::extract::Multipart;
use axum::Router;

use crate::core::error::{GatewayError, GatewayResult};
use crate::gateway::state::AppState;
use crate::media::UploadFile;

/// Every API route, without the outer middleware stack
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(users::routes())
        .merge(products::routes())
        .merge(carts::routes())
        .merge(orders::routes())
        .merge(admin::routes())
}

/// Unknown paths answer with the uniform error body
pub async fn fallback() -> GatewayError {
    GatewayError::not_found("common.errors.routeNotFound")
}

/// Read every part named `field` into memory
pub(crate) async fn read_files(
    multipart: Result<Multipart, MultipartRejection>,
    field: &str,
) -> GatewayResult<Vec<UploadFile>> {
    let mut multipart = multipart?;
    let mut files = Vec::new();

    while let Some(part) = multipart.next_field().await? {
        if part.name() != Some(field) {
            continue;
        }
        let file_name = part.file_name().unwrap_or("upload").to_string();
        let content_type = part
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = part.bytes().await?;
        files.push(UploadFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Ok(files)
}

/// Exactly one part named `field`
pub(crate) async fn read_single_file(
    multipart: Result<Multipart, MultipartRejection>,
    field: &str,
) -> GatewayResult<UploadFile> {
    read_files(multipart, field)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::validation(field, "media.errors.noFiles"))
}
