use axum::extract::State;
use axum::routing::{get, patch};
use axum::Router;

use crate::auth::MaybeUser;
use crate::core::error::GatewayResult;
use crate::core::extract::{AppJson, AppPath, AppQuery};
use crate::core::pagination::PaginatedResult;
use crate::core::response::{BaseResponse, EnvelopeDoc, ErrorDoc};
use crate::dto::order::{CreateOrderDto, OrderDto, OrderQuery};
use crate::gateway::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/cancel", patch(cancel_order))
}

/// Turn the caller's cart into an order and empty the cart
#[utoipa::path(
    post,
    path = "/orders",
    tag = "orders",
    security(("bearer" = []), ("cookie" = [])),
    request_body = CreateOrderDto,
    responses(
        (status = 200, description = "Order created", body = EnvelopeDoc),
        (status = 400, description = "Empty cart or missing address", body = ErrorDoc),
        (status = 401, description = "Not logged in", body = ErrorDoc)
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: MaybeUser,
    AppJson(dto): AppJson<CreateOrderDto>,
) -> GatewayResult<BaseResponse<OrderDto>> {
    state.services.order.create_order(user.id(), dto).await
}

#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    security(("bearer" = []), ("cookie" = [])),
    params(OrderQuery),
    responses((status = 200, description = "Page of the caller's orders", body = EnvelopeDoc))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: MaybeUser,
    AppQuery(query): AppQuery<OrderQuery>,
) -> GatewayResult<BaseResponse<PaginatedResult<OrderDto>>> {
    state.services.order.list_orders(user.id(), query).await
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "orders",
    security(("bearer" = []), ("cookie" = [])),
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = EnvelopeDoc),
        (status = 404, description = "Unknown order or owned by someone else", body = ErrorDoc)
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: MaybeUser,
    AppPath(id): AppPath<String>,
) -> GatewayResult<BaseResponse<OrderDto>> {
    state.services.order.get_order(user.0.as_ref(), &id).await
}

#[utoipa::path(
    patch,
    path = "/orders/{id}/cancel",
    tag = "orders",
    security(("bearer" = []), ("cookie" = [])),
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Cancelled order", body = EnvelopeDoc),
        (status = 400, description = "Order can no longer be cancelled", body = ErrorDoc),
        (status = 404, description = "Unknown order", body = ErrorDoc)
    )
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: MaybeUser,
    AppPath(id): AppPath<String>,
) -> GatewayResult<BaseResponse<OrderDto>> {
    state.services.order.cancel_order(user.0.as_ref(), &id).await
}
