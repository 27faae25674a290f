use axum::extract::State;
use axum::routing::get;
use axum::Router;

use crate::auth::MaybeUser;
use crate::core::error::GatewayResult;
use crate::core::extract::{AppJson, AppPath, AppQuery};
use crate::core::pagination::{PaginatedResult, PaginationQuery};
use crate::core::response::{BaseResponse, EnvelopeDoc, ErrorDoc};
use crate::dto::product::{CategoryDto, CreateReviewDto, ProductDto, ProductQuery, ReviewDto};
use crate::gateway::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/products/:id/reviews", get(list_reviews).post(create_review))
        .route("/categories", get(category_tree))
}

/// Public catalogue, soft-deleted products excluded
#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Page of products", body = EnvelopeDoc),
        (status = 400, description = "Invalid filter", body = ErrorDoc)
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ProductQuery>,
) -> GatewayResult<BaseResponse<PaginatedResult<ProductDto>>> {
    state.services.product.list_products(query, false).await
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "products",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with variants and images", body = EnvelopeDoc),
        (status = 404, description = "Unknown product", body = ErrorDoc)
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> GatewayResult<BaseResponse<ProductDto>> {
    state.services.product.get_product_detail(&id).await
}

#[utoipa::path(
    get,
    path = "/products/{id}/reviews",
    tag = "products",
    params(("id" = String, Path, description = "Product id"), PaginationQuery),
    responses((status = 200, description = "Page of reviews", body = EnvelopeDoc))
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> GatewayResult<BaseResponse<PaginatedResult<ReviewDto>>> {
    state.services.product.list_reviews(&id, query).await
}

#[utoipa::path(
    post,
    path = "/products/{id}/reviews",
    tag = "products",
    security(("bearer" = []), ("cookie" = [])),
    params(("id" = String, Path, description = "Product id")),
    request_body = CreateReviewDto,
    responses(
        (status = 200, description = "Review created", body = EnvelopeDoc),
        (status = 400, description = "Invalid rating or comment", body = ErrorDoc),
        (status = 401, description = "Not logged in", body = ErrorDoc),
        (status = 404, description = "Unknown product", body = ErrorDoc)
    )
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: MaybeUser,
    AppPath(id): AppPath<String>,
    AppJson(dto): AppJson<CreateReviewDto>,
) -> GatewayResult<BaseResponse<ReviewDto>> {
    state.services.product.create_review(user.id(), &id, dto).await
}

#[utoipa::path(
    get,
    path = "/categories",
    tag = "products",
    responses((status = 200, description = "Category tree", body = EnvelopeDoc))
)]
pub async fn category_tree(State(state): State<AppState>) -> GatewayResult<BaseResponse<Vec<CategoryDto>>> {
    state.services.product.get_category_tree().await
}
