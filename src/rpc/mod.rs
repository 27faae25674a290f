//! # RPC Module
//!
//! Message-bus RPC between the gateway and the backing microservices:
//! - `exception`: the typed error carried across service boundaries
//! - `call`: timeout/retry wrapper around every outbound call
//! - `transport`: the transport trait, with Redis and in-process implementations
//! - `client`: typed per-service clients used by the business services
//! - `router` / `server`: the service side of the bus

pub mod call;
pub mod client;
pub mod exception;
pub mod local;
pub mod packet;
pub mod patterns;
pub mod redis_transport;
pub mod router;
pub mod server;
pub mod transport;

pub use call::{call_microservice, CallOptions};
pub use client::{ServiceClient, ServiceClients};
pub use exception::{ErrorCode, TypedRpcException};
pub use local::LocalTransport;
pub use redis_transport::RedisTransport;
pub use patterns::ServiceName;
pub use router::MessageRouter;
pub use server::RedisMessageServer;
pub use transport::{MessageTransport, TransportError};
