//! # Message Router
//!
//! Pattern → handler registry on the service side of the bus. The same router backs
//! the in-process [`LocalTransport`](crate::rpc::local::LocalTransport) and the
//! [`RedisMessageServer`](crate::rpc::server::RedisMessageServer).

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::rpc::exception::{ErrorCode, TypedRpcException};

type RequestHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, TypedRpcException>> + Send + Sync>;
type EventHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Default)]
pub struct MessageRouter {
    handlers: DashMap<String, RequestHandler>,
    event_handlers: DashMap<String, Vec<EventHandler>>,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request handler working on raw JSON
    pub fn on<F, Fut>(&self, pattern: impl Into<String>, handler: F) -> &Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, TypedRpcException>> + Send + 'static,
    {
        let handler: RequestHandler = Arc::new(move |payload| Box::pin(handler(payload)));
        self.handlers.insert(pattern.into(), handler);
        self
    }

    /// Register a request handler with typed payload and reply
    pub fn handle<P, R, F, Fut>(&self, pattern: impl Into<String>, handler: F) -> &Self
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, TypedRpcException>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        self.on(pattern, move |payload| {
            let handler = handler.clone();
            async move {
                let payload: P = serde_json::from_value(payload)
                    .map_err(|_| TypedRpcException::new(ErrorCode::BadRequest, "common.errors.invalidPayload"))?;
                let reply = handler(payload).await?;
                serde_json::to_value(reply).map_err(|_| TypedRpcException::internal())
            }
        })
    }

    /// Register an event handler; several handlers may listen on one pattern
    pub fn on_event<F, Fut>(&self, pattern: impl Into<String>, handler: F) -> &Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: EventHandler = Arc::new(move |payload| Box::pin(handler(payload)));
        self.event_handlers.entry(pattern.into()).or_default().push(handler);
        self
    }

    /// Run the request handler for `pattern`, `None` when nobody handles it
    pub async fn dispatch(&self, pattern: &str, payload: Value) -> Option<Result<Value, TypedRpcException>> {
        let handler = self.handlers.get(pattern).map(|entry| entry.value().clone());
        match handler {
            Some(handler) => {
                debug!(pattern, "Dispatching request");
                Some(handler(payload).await)
            }
            None => {
                warn!(pattern, "No handler registered");
                None
            }
        }
    }

    /// Run every event handler for `pattern`, returns how many ran
    pub async fn dispatch_event(&self, pattern: &str, payload: Value) -> usize {
        let handlers = self
            .event_handlers
            .get(pattern)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        for handler in &handlers {
            handler(payload.clone()).await;
        }
        handlers.len()
    }

    pub fn patterns(&self) -> Vec<String> {
        self.handlers.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn event_patterns(&self) -> Vec<String> {
        self.event_handlers.iter().map(|entry| entry.key().clone()).collect()
    }
}
