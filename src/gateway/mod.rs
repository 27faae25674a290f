//! # Gateway Module
//!
//! Composition root: shared state, router and middleware stack, OpenAPI document.

pub mod docs;
pub mod server;
pub mod state;

pub use server::{build_router, Backends, GatewayServer};
pub use state::AppState;
