//! Shared fixtures: the real router wired to an in-process message router, an
//! in-memory cache and a fake media host.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::{header, HeaderName, HeaderValue};
use axum_test::TestServer;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shop_gateway::caching::InMemoryCache;
use shop_gateway::core::config::{CacheBackend, TransportKind};
use shop_gateway::dto::user::{Role, UserDto};
use shop_gateway::media::{MediaStorage, UploadFile, UploadedMedia};
use shop_gateway::rpc::{CallOptions, LocalTransport, MessageRouter};
use shop_gateway::{build_router, AppState, Backends, GatewayConfig, GatewayResult};

pub struct TestGateway {
    pub server: TestServer,
    pub state: AppState,
}

impl TestGateway {
    /// Bearer header for a user with `role`
    pub fn bearer(&self, user_id: &str, role: Role) -> (HeaderName, HeaderValue) {
        let token = self.state.jwt.issue(&user(user_id, role)).expect("token");
        (
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).expect("header"),
        )
    }
}

pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.transport.kind = TransportKind::Local;
    config.transport.rpc = CallOptions::new(Duration::from_millis(500), 1);
    config.cache.backend = CacheBackend::Memory;
    config.auth.jwt.secret = "integration-test-secret".to_string();
    config
}

pub fn gateway(router: MessageRouter) -> TestGateway {
    gateway_with(router, test_config())
}

pub fn gateway_with(router: MessageRouter, config: GatewayConfig) -> TestGateway {
    let backends = Backends {
        transport: Arc::new(LocalTransport::new(Arc::new(router))),
        cache: Arc::new(InMemoryCache::new()),
        media: Arc::new(FakeMedia),
    };
    let state = AppState::build(&config, backends, None).expect("state");
    let server = TestServer::new(build_router(state.clone(), &config)).expect("server");
    TestGateway { server, state }
}

pub fn user(id: &str, role: Role) -> UserDto {
    UserDto {
        id: id.to_string(),
        email: format!("{}@shop.test", id),
        name: "Lan Nguyen".to_string(),
        avatar: None,
        phone: None,
        role,
        provider: None,
        created_at: Utc::now(),
    }
}

pub fn user_json(id: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{}@shop.test", id),
        "name": "Lan Nguyen",
        "role": "user",
        "createdAt": "2024-05-01T10:00:00Z"
    })
}

pub fn variant_json(id: &str, price: &str, stock: u32) -> Value {
    json!({
        "id": id,
        "productId": "p1",
        "sku": format!("SKU-{}", id),
        "name": "M",
        "price": price,
        "stock": stock,
        "productName": "Linen shirt"
    })
}

pub fn product_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Linen shirt",
        "description": "Breathable summer shirt",
        "slug": "linen-shirt",
        "categoryId": "c1",
        "basePrice": "150000",
        "images": [],
        "variants": [variant_json("v1", "150000", 10)],
        "createdAt": "2024-05-01T10:00:00Z"
    })
}

pub fn order_json(id: &str, user_id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "userId": user_id,
        "status": status,
        "items": [{
            "productVariantId": "v1",
            "productName": "Linen shirt",
            "quantity": 2,
            "unitPrice": "150000"
        }],
        "totalAmount": "300000",
        "shippingAddress": "12 Hang Bac, Hanoi",
        "paymentMethod": "cod",
        "createdAt": "2024-05-01T10:00:00Z"
    })
}

/// Counts calls to one pattern
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Media host that accepts everything
pub struct FakeMedia;

#[async_trait]
impl MediaStorage for FakeMedia {
    async fn upload(&self, file: UploadFile, folder: &str) -> GatewayResult<UploadedMedia> {
        Ok(UploadedMedia {
            url: format!("https://media.test/{}/{}", folder, file.file_name),
            public_id: format!("{}/{}", folder, file.file_name),
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
