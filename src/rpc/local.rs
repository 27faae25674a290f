//! In-process transport that dispatches straight into a [`MessageRouter`].
//!
//! Used when the gateway runs with `transport: local` (development without a broker)
//! and by the integration tests, which register fake backing services on the router.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::rpc::router::MessageRouter;
use crate::rpc::transport::{MessageTransport, TransportError};

#[derive(Clone)]
pub struct LocalTransport {
    router: Arc<MessageRouter>,
}

impl LocalTransport {
    pub fn new(router: Arc<MessageRouter>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Arc<MessageRouter> {
        &self.router
    }
}

#[async_trait]
impl MessageTransport for LocalTransport {
    async fn send(&self, pattern: &str, payload: Value) -> Result<Value, TransportError> {
        match self.router.dispatch(pattern, payload).await {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(exception)) => Err(TransportError::Remote(exception)),
            None => Err(TransportError::NoHandler(pattern.to_string())),
        }
    }

    async fn emit(&self, pattern: &str, payload: Value) -> Result<(), TransportError> {
        self.router.dispatch_event(pattern, payload).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
