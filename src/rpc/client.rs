//! # Service Client
//!
//! Typed handle on one backing microservice. Every request goes through
//! [`call_microservice`] so callers only ever see a [`TypedRpcException`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

use crate::rpc::call::{call_microservice, CallOptions};
use crate::rpc::exception::TypedRpcException;
use crate::rpc::patterns::ServiceName;
use crate::rpc::transport::MessageTransport;

#[derive(Clone)]
pub struct ServiceClient {
    service: ServiceName,
    transport: Arc<dyn MessageTransport>,
    options: CallOptions,
}

impl ServiceClient {
    pub fn new(service: ServiceName, transport: Arc<dyn MessageTransport>, options: CallOptions) -> Self {
        Self {
            service,
            transport,
            options,
        }
    }

    pub fn service(&self) -> ServiceName {
        self.service
    }

    pub fn options(&self) -> CallOptions {
        self.options
    }

    /// Request/reply call decoded into `T`
    pub async fn send<P, T>(&self, pattern: &str, payload: &P) -> Result<T, TypedRpcException>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_value(payload).map_err(|e| {
            error!(service = %self.service, pattern, error = %e, "Failed to encode RPC payload");
            TypedRpcException::internal()
        })?;

        let transport = &self.transport;
        let reply = call_microservice(
            || transport.send(pattern, payload.clone()),
            self.service.as_str(),
            self.options,
        )
        .await?;

        serde_json::from_value(reply).map_err(|e| {
            error!(service = %self.service, pattern, error = %e, "Failed to decode RPC reply");
            TypedRpcException::internal()
        })
    }

    /// Fire-and-forget event; failures are logged and swallowed
    pub async fn emit<P>(&self, pattern: &str, payload: &P)
    where
        P: Serialize + ?Sized,
    {
        let payload = match serde_json::to_value(payload) {
            Ok(payload) => payload,
            Err(e) => {
                error!(service = %self.service, pattern, error = %e, "Failed to encode event payload");
                return;
            }
        };

        if let Err(e) = self.transport.emit(pattern, payload).await {
            warn!(service = %self.service, pattern, error = %e, "Failed to emit event");
        }
    }
}

/// One client per backing service, all sharing the same transport
#[derive(Clone)]
pub struct ServiceClients {
    pub auth: ServiceClient,
    pub user: ServiceClient,
    pub product: ServiceClient,
    pub notification: ServiceClient,
}

impl ServiceClients {
    pub fn new(transport: Arc<dyn MessageTransport>, options: CallOptions) -> Self {
        let client = |service| ServiceClient::new(service, transport.clone(), options);
        Self {
            auth: client(ServiceName::Auth),
            user: client(ServiceName::User),
            product: client(ServiceName::Product),
            notification: client(ServiceName::Notification),
        }
    }
}
