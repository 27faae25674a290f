//! OpenAPI document served by Swagger UI at `/docs`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::core::response::{EnvelopeDoc, ErrorDoc, StatusKey};
use crate::dto::auth::{AuthResponse, LoginDto, OAuthProfile, RegisterDto};
use crate::dto::cart::{AddCartItemDto, CartItemDto, CartSummary, UpdateCartItemDto};
use crate::dto::order::{CreateOrderDto, OrderDto, OrderItemDto, OrderStatus, PaymentMethod, UpdateOrderStatusDto};
use crate::dto::product::{
    CategoryDto, CreateCategoryDto, CreateProductDto, CreateReviewDto, CreateVariantDto, ProductDto, ProductImageDto,
    ProductSort, ProductVariantDto, ReviewDto, UpdateProductDto,
};
use crate::dto::statistic::{DashboardDto, DateRange};
use crate::dto::user::{Role, UpdateProfileDto, UserDto};
use crate::routes::{self, health::HealthReport};
use crate::rpc::exception::ErrorCode;

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";
pub const DOCS_PATH: &str = "/docs";

#[derive(OpenApi)]
#[openapi(
    info(title = "Shop Gateway API", description = "Storefront and back-office HTTP API"),
    paths(
        routes::auth::register,
        routes::auth::login,
        routes::auth::logout,
        routes::auth::me,
        routes::auth::oauth_redirect,
        routes::auth::oauth_callback,
        routes::users::get_profile,
        routes::users::update_profile,
        routes::users::upload_avatar,
        routes::products::list_products,
        routes::products::get_product,
        routes::products::list_reviews,
        routes::products::create_review,
        routes::products::category_tree,
        routes::carts::get_cart,
        routes::carts::add_item,
        routes::carts::update_item,
        routes::carts::remove_item,
        routes::carts::clear_cart,
        routes::orders::create_order,
        routes::orders::list_orders,
        routes::orders::get_order,
        routes::orders::cancel_order,
        routes::admin::list_users,
        routes::admin::list_products,
        routes::admin::create_product,
        routes::admin::update_product,
        routes::admin::delete_product,
        routes::admin::upload_product_images,
        routes::admin::create_category,
        routes::admin::list_orders,
        routes::admin::update_order_status,
        routes::admin::statistics,
        routes::health::health,
        routes::health::metrics,
    ),
    components(schemas(
        StatusKey, EnvelopeDoc, ErrorDoc, ErrorCode, HealthReport,
        RegisterDto, LoginDto, AuthResponse, OAuthProfile,
        Role, UserDto, UpdateProfileDto,
        ProductDto, ProductVariantDto, ProductImageDto, ProductSort, CategoryDto, ReviewDto,
        CreateProductDto, CreateVariantDto, UpdateProductDto, CreateCategoryDto, CreateReviewDto,
        CartSummary, CartItemDto, AddCartItemDto, UpdateCartItemDto,
        OrderDto, OrderItemDto, OrderStatus, PaymentMethod, CreateOrderDto, UpdateOrderStatusDto,
        DashboardDto, DateRange,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and OAuth"),
        (name = "users", description = "Profile of the current user"),
        (name = "products", description = "Catalogue, categories and reviews"),
        (name = "carts", description = "Shopping cart"),
        (name = "orders", description = "Checkout and order history"),
        (name = "admin", description = "Back office"),
        (name = "health", description = "Liveness and metrics")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
            components.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("access_token"))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_resource() {
        let doc = ApiDoc::openapi();
        for path in ["/auth/login", "/carts/items", "/admin/orders/{id}/status", "/products/{id}/reviews"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer"));
        assert!(components.schemas.contains_key("CartSummary"));
    }
}
