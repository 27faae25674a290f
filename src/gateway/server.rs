//! # HTTP Server Module
//!
//! Wires the configured backends into [`AppState`], builds the axum router with its
//! middleware stack and runs it until a shutdown signal arrives.
//!
//! Layer order, outermost first:
//! 1. `x-request-id` propagation and HTTP metrics
//! 2. `TraceLayer` span per request
//! 3. CORS
//! 4. i18n error filter, so it sees every `GatewayError`
//! 5. request deadline, reported as `TIME_OUT_OR_NETWORK`
//! 6. body size limit, enforced by the extractors

use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{CookieSettings, JwtService, OAuthService};
use crate::caching::{CacheService, CacheStore, InMemoryCache, RedisCache};
use crate::core::config::{CacheBackend, GatewayConfig, ServerConfig, TransportKind};
use crate::core::error::{GatewayError, GatewayResult};
use crate::gateway::docs::{ApiDoc, DOCS_PATH, OPENAPI_PATH};
use crate::gateway::state::AppState;
use crate::i18n::{filter::translate_errors, Lang, Translator};
use crate::media::{CloudinaryStorage, MediaStorage, UploadQueue};
use crate::observability::{logging, metrics, MetricsHandle};
use crate::routes;
use crate::rpc::{LocalTransport, MessageRouter, MessageTransport, RedisTransport, ServiceClients, TypedRpcException};
use crate::services::Services;

/// External systems the gateway talks to
#[derive(Clone)]
pub struct Backends {
    pub transport: Arc<dyn MessageTransport>,
    pub cache: Arc<dyn CacheStore>,
    pub media: Arc<dyn MediaStorage>,
}

impl Backends {
    /// Connect the backends named by `config`
    ///
    /// `local_router` serves the calls when the transport is `local`.
    pub async fn connect(config: &GatewayConfig, local_router: Arc<MessageRouter>) -> GatewayResult<Self> {
        let transport: Arc<dyn MessageTransport> = match config.transport.kind {
            TransportKind::Redis => {
                let transport = RedisTransport::connect(&config.transport.redis.url())
                    .await
                    .map_err(|e| GatewayError::config(format!("Failed to connect message bus: {}", e)))?;
                Arc::new(transport)
            }
            TransportKind::Local => {
                if local_router.patterns().is_empty() {
                    warn!("Local transport has no handlers registered, every call will fail");
                }
                Arc::new(LocalTransport::new(local_router))
            }
        };

        let cache: Arc<dyn CacheStore> = match config.cache.backend {
            CacheBackend::Redis => Arc::new(
                RedisCache::new(&config.transport.redis.url(), config.cache.key_prefix.clone()).await?,
            ),
            CacheBackend::Memory => Arc::new(InMemoryCache::new()),
        };

        let media: Arc<dyn MediaStorage> = Arc::new(CloudinaryStorage::new(config.media.cloudinary.clone())?);

        info!(
            transport = transport.name(),
            cache = cache.name(),
            media = media.name(),
            "Backends connected"
        );
        Ok(Self { transport, cache, media })
    }
}

impl AppState {
    /// Build every service on top of `backends`
    pub fn build(config: &GatewayConfig, backends: Backends, metrics: Option<MetricsHandle>) -> GatewayResult<Self> {
        let default_lang = Lang::parse(&config.i18n.default_lang).unwrap_or_default();
        let translator = Arc::new(Translator::embedded(default_lang)?);

        let jwt = Arc::new(JwtService::new(&config.auth.jwt));
        let cookies = Arc::new(CookieSettings::new(&config.auth.cookie, jwt.ttl()));
        let cache = CacheService::new(backends.cache);
        let oauth = Arc::new(OAuthService::new(&config.auth.oauth, cache.clone())?);

        let uploads = UploadQueue::new(
            backends.media,
            config.media.max_concurrent_uploads,
            config.media.max_file_size,
        );
        let clients = ServiceClients::new(backends.transport, config.transport.rpc);
        let services = Services::new(clients, cache, uploads, jwt.clone(), config.cache.product_ttl);

        Ok(Self {
            services,
            oauth,
            translator,
            jwt,
            cookies,
            metrics,
            frontend_url: Arc::from(config.server.frontend_url.as_str()),
        })
    }
}

/// Full application router with docs and middleware
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let server = &config.server;

    let app = routes::api_routes()
        .merge(routes::health::routes(&config.observability.metrics.endpoint_path))
        .fallback(routes::fallback)
        .layer(DefaultBodyLimit::max(server.max_request_size))
        .layer(middleware::from_fn_with_state(server.request_timeout, enforce_deadline))
        .layer(middleware::from_fn_with_state(state.translator.clone(), translate_errors))
        .with_state(state)
        .merge(SwaggerUi::new(DOCS_PATH).url(OPENAPI_PATH, ApiDoc::openapi()));

    app.layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(logging::propagate_request_id))
            .layer(middleware::from_fn(metrics::track_http_metrics))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(server)),
    )
}

/// Abandon the handler once `deadline` has passed
async fn enforce_deadline(State(deadline): State<Duration>, request: Request, next: Next) -> Response {
    match tokio::time::timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(deadline_ms = deadline.as_millis() as u64, "Request deadline exceeded");
            GatewayError::from(TypedRpcException::timeout_or_network()).into_response()
        }
    }
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = if config.cors_origins.is_empty() {
        vec![config.frontend_url.as_str()]
    } else {
        config.cors_origins.iter().map(String::as_str).collect()
    }
    .into_iter()
    .filter_map(|origin| match origin.trim_end_matches('/').parse::<HeaderValue>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(origin, "Ignoring invalid CORS origin");
            None
        }
    })
    .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT_LANGUAGE,
            HeaderName::from_static("x-lang"),
            logging::REQUEST_ID_HEADER,
        ])
        .expose_headers([logging::REQUEST_ID_HEADER])
        .allow_credentials(true)
}

fn bind_address(config: &GatewayConfig) -> GatewayResult<SocketAddr> {
    format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| GatewayError::config(format!("Invalid bind address: {}", e)))
}

/// HTTP server bound to the configured address
pub struct GatewayServer {
    app: Router,
    bind_addr: SocketAddr,
}

impl GatewayServer {
    pub fn new(state: AppState, config: &GatewayConfig) -> GatewayResult<Self> {
        Ok(Self {
            app: build_router(state, config),
            bind_addr: bind_address(config)?,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Serve until `shutdown` resolves, then let in-flight requests finish
    pub async fn start<F>(self, shutdown: F) -> GatewayResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .map_err(|e| GatewayError::internal(format!("Failed to bind gateway server to {}: {}", self.bind_addr, e)))?;

        info!("Gateway HTTP server listening on {}", self.bind_addr);
        info!("API docs available at {}", DOCS_PATH);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::internal(format!("Gateway server error: {}", e)))
    }
}
