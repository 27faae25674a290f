//! Back-office routes. Every handler takes [`AdminUser`], so non-admins get `403`
//! before anything else runs.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::routing::{get, patch, post};
use axum::Router;

use crate::auth::AdminUser;
use crate::core::error::GatewayResult;
use crate::core::extract::{AppJson, AppPath, AppQuery};
use crate::core::pagination::PaginatedResult;
use crate::core::response::{BaseResponse, EnvelopeDoc, ErrorDoc};
use crate::dto::order::{OrderDto, OrderQuery, UpdateOrderStatusDto};
use crate::dto::product::{CategoryDto, CreateCategoryDto, CreateProductDto, ProductDto, ProductQuery, UpdateProductDto};
use crate::dto::statistic::{DashboardDto, StatisticQuery};
use crate::dto::user::{ListUsersQuery, UserDto};
use crate::gateway::state::AppState;
use crate::routes::read_files;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/products", get(list_products).post(create_product))
        .route("/admin/products/:id", patch(update_product).delete(delete_product))
        .route("/admin/products/:id/images", post(upload_product_images))
        .route("/admin/categories", post(create_category))
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/:id/status", patch(update_order_status))
        .route("/admin/statistics", get(statistics))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    security(("bearer" = []), ("cookie" = [])),
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Page of users", body = EnvelopeDoc),
        (status = 403, description = "Caller is not an admin", body = ErrorDoc)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(query): AppQuery<ListUsersQuery>,
) -> GatewayResult<BaseResponse<PaginatedResult<UserDto>>> {
    state.services.user.list_users(query).await
}

/// Same filters as the public catalogue, soft-deleted products included
#[utoipa::path(
    get,
    path = "/admin/products",
    tag = "admin",
    security(("bearer" = []), ("cookie" = [])),
    params(ProductQuery),
    responses((status = 200, description = "Page of products", body = EnvelopeDoc))
)]
pub async fn list_products(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(query): AppQuery<ProductQuery>,
) -> GatewayResult<BaseResponse<PaginatedResult<ProductDto>>> {
    state.services.product.list_products(query, true).await
}

#[utoipa::path(
    post,
    path = "/admin/products",
    tag = "admin",
    security(("bearer" = []), ("cookie" = [])),
    request_body = CreateProductDto,
    responses(
        (status = 200, description = "Product created", body = EnvelopeDoc),
        (status = 400, description = "Invalid product", body = ErrorDoc),
        (status = 409, description = "A SKU is already taken", body = ErrorDoc)
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(dto): AppJson<CreateProductDto>,
) -> GatewayResult<BaseResponse<ProductDto>> {
    state.services.product.create_product(dto).await
}

#[utoipa::path(
    patch,
    path = "/admin/products/{id}",
    tag = "admin",
    security(("bearer" = []), ("cookie" = [])),
    params(("id" = String, Path, description = "Product id")),
    request_body = UpdateProductDto,
    responses(
        (status = 200, description = "Updated product", body = EnvelopeDoc),
        (status = 404, description = "Unknown product", body = ErrorDoc)
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppPath(id): AppPath<String>,
    AppJson(dto): AppJson<UpdateProductDto>,
) -> GatewayResult<BaseResponse<ProductDto>> {
    state.services.product.update_product(&id, dto).await
}

#[utoipa::path(
    delete,
    path = "/admin/products/{id}",
    tag = "admin",
    security(("bearer" = []), ("cookie" = [])),
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Soft-deleted product", body = EnvelopeDoc),
        (status = 404, description = "Unknown product", body = ErrorDoc)
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppPath(id): AppPath<String>,
) -> GatewayResult<BaseResponse<ProductDto>> {
    state.services.product.delete_product(&id).await
}

/// Multipart form with one or more `files` parts
#[utoipa::path(
    post,
    path = "/admin/products/{id}/images",
    tag = "admin",
    security(("bearer" = []), ("cookie" = [])),
    params(("id" = String, Path, description = "Product id")),
    request_body(content = String, content_type = "multipart/form-data", description = "Images in `files` fields"),
    responses(
        (status = 200, description = "Product with the new images", body = EnvelopeDoc),
        (status = 400, description = "Missing or unsupported files", body = ErrorDoc),
        (status = 404, description = "Unknown product", body = ErrorDoc)
    )
)]
pub async fn upload_product_images(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppPath(id): AppPath<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> GatewayResult<BaseResponse<ProductDto>> {
    let files = read_files(multipart, "files").await?;
    state.services.product.upload_product_images(&id, files).await
}

#[utoipa::path(
    post,
    path = "/admin/categories",
    tag = "admin",
    security(("bearer" = []), ("cookie" = [])),
    request_body = CreateCategoryDto,
    responses(
        (status = 200, description = "Category created", body = EnvelopeDoc),
        (status = 400, description = "Missing name", body = ErrorDoc)
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(dto): AppJson<CreateCategoryDto>,
) -> GatewayResult<BaseResponse<CategoryDto>> {
    state.services.product.create_category(dto).await
}

#[utoipa::path(
    get,
    path = "/admin/orders",
    tag = "admin",
    security(("bearer" = []), ("cookie" = [])),
    params(OrderQuery),
    responses((status = 200, description = "Page of every customer's orders", body = EnvelopeDoc))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(query): AppQuery<OrderQuery>,
) -> GatewayResult<BaseResponse<PaginatedResult<OrderDto>>> {
    state.services.order.list_all_orders(query).await
}

#[utoipa::path(
    patch,
    path = "/admin/orders/{id}/status",
    tag = "admin",
    security(("bearer" = []), ("cookie" = [])),
    params(("id" = String, Path, description = "Order id")),
    request_body = UpdateOrderStatusDto,
    responses(
        (status = 200, description = "Order in its new status, `unchanged` when already there", body = EnvelopeDoc),
        (status = 400, description = "Transition not allowed", body = ErrorDoc),
        (status = 404, description = "Unknown order", body = ErrorDoc)
    )
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppPath(id): AppPath<String>,
    AppJson(dto): AppJson<UpdateOrderStatusDto>,
) -> GatewayResult<BaseResponse<OrderDto>> {
    state.services.order.update_status(&id, dto).await
}

#[utoipa::path(
    get,
    path = "/admin/statistics",
    tag = "admin",
    security(("bearer" = []), ("cookie" = [])),
    params(StatisticQuery),
    responses(
        (status = 200, description = "Revenue, orders and users over the range", body = EnvelopeDoc),
        (status = 400, description = "Invalid date range", body = ErrorDoc)
    )
)]
pub async fn statistics(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(query): AppQuery<StatisticQuery>,
) -> GatewayResult<BaseResponse<DashboardDto>> {
    state.services.statistic.dashboard(query).await
}
