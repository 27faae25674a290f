//! # Message Transport
//!
//! The seam between the gateway and the message bus. Business code never touches a
//! transport directly: it goes through [`ServiceClient`](crate::rpc::ServiceClient),
//! which wraps every `send` in the timeout/retry policy.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::rpc::exception::TypedRpcException;

/// Failures a transport can report for a single attempt
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The broker could not be reached or the connection dropped mid-call
    #[error("transport connection error: {0}")]
    Connection(String),

    /// The remote service answered with an error payload
    #[error("remote service error: {0}")]
    Remote(TypedRpcException),

    /// The packet could not be encoded or decoded
    #[error("packet decode error: {0}")]
    Decode(String),

    /// Nobody is listening on this pattern
    #[error("no handler registered for pattern {0}")]
    NoHandler(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<redis::RedisError> for TransportError {
    fn from(err: redis::RedisError) -> Self {
        Self::Connection(err.to_string())
    }
}

/// Request/reply and fire-and-forget messaging over a broker
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Publish `payload` on `pattern` and wait for the reply
    async fn send(&self, pattern: &str, payload: Value) -> Result<Value, TransportError>;

    /// Publish an event on `pattern` without waiting for anything
    async fn emit(&self, pattern: &str, payload: Value) -> Result<(), TransportError>;

    /// Short name for logs (`redis`, `local`)
    fn name(&self) -> &'static str;
}
