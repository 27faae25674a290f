//! # Business Services
//!
//! One service per resource. They all follow the same shape:
//! 1. reject a missing caller with `UNAUTHORIZED` before touching the bus
//! 2. validate the request DTO
//! 3. check a precondition with one RPC call and branch on the answer
//! 4. issue the mutating call and wrap the reply with [`build_base_response`]
//!
//! [`build_base_response`]: crate::core::response::build_base_response

pub mod auth;
pub mod cart;
pub mod notification;
pub mod order;
pub mod product;
pub mod statistic;
pub mod user;

pub use auth::AuthService;
pub use cart::CartService;
pub use notification::NotificationService;
pub use order::OrderService;
pub use product::ProductService;
pub use statistic::StatisticService;
pub use user::UserService;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::JwtService;
use crate::caching::CacheService;
use crate::core::error::{GatewayError, GatewayResult};
use crate::media::UploadQueue;
use crate::rpc::ServiceClients;

/// Every business service, built once at startup
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<AuthService>,
    pub user: Arc<UserService>,
    pub product: Arc<ProductService>,
    pub cart: Arc<CartService>,
    pub order: Arc<OrderService>,
    pub statistic: Arc<StatisticService>,
    pub notification: NotificationService,
}

impl Services {
    pub fn new(
        clients: ServiceClients,
        cache: CacheService,
        uploads: UploadQueue,
        jwt: Arc<JwtService>,
        product_ttl: Duration,
    ) -> Self {
        let notification = NotificationService::new(clients.notification.clone());
        Self {
            auth: Arc::new(AuthService::new(
                clients.auth.clone(),
                clients.user.clone(),
                jwt,
                notification.clone(),
            )),
            user: Arc::new(UserService::new(clients.user.clone(), uploads.clone())),
            product: Arc::new(ProductService::new(clients.product.clone(), cache, product_ttl, uploads)),
            cart: Arc::new(CartService::new(clients.product.clone())),
            order: Arc::new(OrderService::new(clients.product.clone(), notification.clone())),
            statistic: Arc::new(StatisticService::new(clients.product, clients.user)),
            notification,
        }
    }
}

/// Caller id or `UNAUTHORIZED`, checked before any RPC call
pub(crate) fn require_user(user_id: Option<&str>) -> GatewayResult<&str> {
    user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| GatewayError::unauthorized("common.errors.unauthorized"))
}
