use axum::extract::State;
use axum::routing::{get, patch, post};
use axum::Router;

use crate::auth::MaybeUser;
use crate::core::error::GatewayResult;
use crate::core::extract::{AppJson, AppPath};
use crate::core::response::{BaseResponse, EnvelopeDoc, ErrorDoc};
use crate::dto::cart::{AddCartItemDto, CartSummary, UpdateCartItemDto};
use crate::gateway::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/carts", get(get_cart).delete(clear_cart))
        .route("/carts/items", post(add_item))
        .route("/carts/items/:item_id", patch(update_item).delete(remove_item))
}

#[utoipa::path(
    get,
    path = "/carts",
    tag = "carts",
    security(("bearer" = []), ("cookie" = [])),
    responses(
        (status = 200, description = "Cart summary", body = EnvelopeDoc),
        (status = 401, description = "Not logged in", body = ErrorDoc)
    )
)]
pub async fn get_cart(State(state): State<AppState>, user: MaybeUser) -> GatewayResult<BaseResponse<CartSummary>> {
    state.services.cart.get_cart(user.id()).await
}

#[utoipa::path(
    post,
    path = "/carts/items",
    tag = "carts",
    security(("bearer" = []), ("cookie" = [])),
    request_body = AddCartItemDto,
    responses(
        (status = 200, description = "Cart summary with the new item", body = EnvelopeDoc),
        (status = 400, description = "Invalid quantity or not enough stock", body = ErrorDoc),
        (status = 401, description = "Not logged in", body = ErrorDoc),
        (status = 404, description = "Unknown variant", body = ErrorDoc)
    )
)]
pub async fn add_item(
    State(state): State<AppState>,
    user: MaybeUser,
    AppJson(dto): AppJson<AddCartItemDto>,
) -> GatewayResult<BaseResponse<CartSummary>> {
    state.services.cart.add_item(user.id(), dto).await
}

#[utoipa::path(
    patch,
    path = "/carts/items/{itemId}",
    tag = "carts",
    security(("bearer" = []), ("cookie" = [])),
    params(("itemId" = String, Path, description = "Cart item id")),
    request_body = UpdateCartItemDto,
    responses(
        (status = 200, description = "Updated cart summary, `unchanged` when the quantity is the same", body = EnvelopeDoc),
        (status = 404, description = "Unknown cart item", body = ErrorDoc)
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    user: MaybeUser,
    AppPath(item_id): AppPath<String>,
    AppJson(dto): AppJson<UpdateCartItemDto>,
) -> GatewayResult<BaseResponse<CartSummary>> {
    state.services.cart.update_item(user.id(), &item_id, dto).await
}

#[utoipa::path(
    delete,
    path = "/carts/items/{itemId}",
    tag = "carts",
    security(("bearer" = []), ("cookie" = [])),
    params(("itemId" = String, Path, description = "Cart item id")),
    responses(
        (status = 200, description = "Cart summary without the item", body = EnvelopeDoc),
        (status = 404, description = "Unknown cart item", body = ErrorDoc)
    )
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: MaybeUser,
    AppPath(item_id): AppPath<String>,
) -> GatewayResult<BaseResponse<CartSummary>> {
    state.services.cart.remove_item(user.id(), &item_id).await
}

#[utoipa::path(
    delete,
    path = "/carts",
    tag = "carts",
    security(("bearer" = []), ("cookie" = [])),
    responses((status = 200, description = "Empty cart", body = EnvelopeDoc))
)]
pub async fn clear_cart(State(state): State<AppState>, user: MaybeUser) -> GatewayResult<BaseResponse<CartSummary>> {
    state.services.cart.clear(user.id()).await
}
