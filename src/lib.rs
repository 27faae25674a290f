//! # Shop Gateway - Core Library Crate
//!
//! HTTP API gateway of the shop platform. It owns no data: every request is
//! validated, authenticated and translated at the edge, then forwarded over a
//! message bus to the auth, user, product and notification services.
//!
//! ## Request path
//! 1. `routes`: axum handlers extract the caller and the request DTO
//! 2. `services`: business rules, precondition checks, envelope building
//! 3. `rpc`: typed clients, the timeout/retry wrapper and the bus transports
//! 4. `i18n`: the error filter turns any failure into a translated JSON error
//!
//! `auth`, `caching` and `media` are supporting concerns used by the services;
//! `gateway` wires everything together and `observability` sets up logs and metrics.

/// Error type, configuration, pagination and the response envelope
pub mod core;

/// Typed RPC over the message bus
pub mod rpc;

/// Request and reply shapes exchanged with clients and backing services
pub mod dto;

/// Business services, one per resource
pub mod services;

/// JWT, cookies, caller extractors and OAuth login
pub mod auth;

/// Best-effort cache for product details and OAuth state
pub mod caching;

/// Image uploads to the media host
pub mod media;

/// Message translation and the global error filter
pub mod i18n;

/// HTTP handlers
pub mod routes;

/// Shared state, router and server
pub mod gateway;

/// Logging and metrics setup
pub mod observability;

// Re-export commonly used types for easier access
pub use core::config::GatewayConfig;
pub use core::error::{GatewayError, GatewayResult};
pub use core::response::{build_base_response, BaseResponse, StatusKey};
pub use gateway::{build_router, AppState, Backends, GatewayServer};
pub use rpc::{call_microservice, CallOptions, TypedRpcException};
