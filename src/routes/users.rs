use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::routing::{get, post};
use axum::Router;

use crate::auth::MaybeUser;
use crate::core::error::GatewayResult;
use crate::core::extract::AppJson;
use crate::core::response::{BaseResponse, EnvelopeDoc, ErrorDoc};
use crate::dto::user::{UpdateProfileDto, UserDto};
use crate::gateway::state::AppState;
use crate::routes::read_single_file;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/profile", get(get_profile).patch(update_profile))
        .route("/users/avatar", post(upload_avatar))
}

#[utoipa::path(
    get,
    path = "/users/profile",
    tag = "users",
    security(("bearer" = []), ("cookie" = [])),
    responses(
        (status = 200, description = "Profile of the caller", body = EnvelopeDoc),
        (status = 401, description = "Not logged in", body = ErrorDoc)
    )
)]
pub async fn get_profile(State(state): State<AppState>, user: MaybeUser) -> GatewayResult<BaseResponse<UserDto>> {
    state.services.user.get_profile(user.id()).await
}

#[utoipa::path(
    patch,
    path = "/users/profile",
    tag = "users",
    security(("bearer" = []), ("cookie" = [])),
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Updated profile", body = EnvelopeDoc),
        (status = 400, description = "Invalid profile data", body = ErrorDoc),
        (status = 401, description = "Not logged in", body = ErrorDoc)
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: MaybeUser,
    AppJson(dto): AppJson<UpdateProfileDto>,
) -> GatewayResult<BaseResponse<UserDto>> {
    state.services.user.update_profile(user.id(), dto).await
}

/// Multipart form with a single `file` part
#[utoipa::path(
    post,
    path = "/users/avatar",
    tag = "users",
    security(("bearer" = []), ("cookie" = [])),
    request_body(content = String, content_type = "multipart/form-data", description = "Image in the `file` field"),
    responses(
        (status = 200, description = "Profile with the new avatar", body = EnvelopeDoc),
        (status = 400, description = "Missing or unsupported file", body = ErrorDoc),
        (status = 503, description = "Media host unavailable", body = ErrorDoc)
    )
)]
pub async fn upload_avatar(
    State(state): State<AppState>,
    user: MaybeUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> GatewayResult<BaseResponse<UserDto>> {
    // reject anonymous callers before buffering the body
    crate::services::require_user(user.id())?;
    let file = read_single_file(multipart, "file").await?;
    state.services.user.upload_avatar(user.id(), file).await
}
