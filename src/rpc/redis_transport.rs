//! # Redis Transport
//!
//! Request/reply over Redis pub/sub, compatible with the NestJS Redis transport the
//! backing services listen on.
//!
//! One `ConnectionManager` publishes requests; one listener task `PSUBSCRIBE`s to
//! `*.reply` and completes the pending call whose id matches the reply. A call that is
//! abandoned (for example by the RPC wrapper's timeout) removes its own pending entry
//! when its future is dropped.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::{Stream, StreamExt};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Msg};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::rpc::packet::{ReplyPacket, RequestPacket, REPLY_SUFFIX};
use crate::rpc::transport::{MessageTransport, TransportError};

type PendingReplies = Arc<DashMap<String, oneshot::Sender<ReplyPacket>>>;

pub struct RedisTransport {
    publisher: ConnectionManager,
    pending: PendingReplies,
    listener: JoinHandle<()>,
}

impl RedisTransport {
    /// Connect to the broker and start the reply listener
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let client = Client::open(url)?;
        let publisher = ConnectionManager::new(client.clone()).await?;

        let mut pubsub = client.get_async_connection().await?.into_pubsub();
        pubsub.psubscribe(format!("*{}", REPLY_SUFFIX)).await?;

        let pending: PendingReplies = Arc::new(DashMap::new());
        let listener = tokio::spawn(listen_for_replies(pubsub.into_on_message(), pending.clone()));

        info!(url, "Redis transport connected");
        Ok(Self {
            publisher,
            pending,
            listener,
        })
    }
}

impl Drop for RedisTransport {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn listen_for_replies<S>(messages: S, pending: PendingReplies)
where
    S: Stream<Item = Msg>,
{
    let mut messages = Box::pin(messages);
    while let Some(msg) = messages.next().await {
        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(channel = msg.get_channel_name(), error = %e, "Unreadable reply payload");
                continue;
            }
        };

        let reply: ReplyPacket = match serde_json::from_str(&payload) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(channel = msg.get_channel_name(), error = %e, "Malformed reply packet");
                continue;
            }
        };

        match pending.remove(&reply.id) {
            Some((_, waiter)) => {
                let _ = waiter.send(reply);
            }
            None => debug!(id = %reply.id, "Reply for unknown or abandoned call"),
        }
    }
    warn!("Redis reply listener stopped");
}

/// Removes the pending entry when the call finishes or is dropped
struct PendingGuard {
    id: String,
    pending: PendingReplies,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

#[async_trait]
impl MessageTransport for RedisTransport {
    async fn send(&self, pattern: &str, payload: Value) -> Result<Value, TransportError> {
        let id = Uuid::new_v4().to_string();
        let (waiter, reply) = oneshot::channel();
        self.pending.insert(id.clone(), waiter);
        let _guard = PendingGuard {
            id: id.clone(),
            pending: self.pending.clone(),
        };

        let packet = serde_json::to_string(&RequestPacket::request(pattern, payload, id))?;
        let mut publisher = self.publisher.clone();
        let receivers: i64 = publisher.publish(pattern, packet).await?;
        if receivers == 0 {
            return Err(TransportError::NoHandler(pattern.to_string()));
        }

        let reply = reply
            .await
            .map_err(|_| TransportError::Connection("reply listener stopped".to_string()))?;

        match reply.exception() {
            Some(exception) => Err(TransportError::Remote(exception)),
            None => Ok(reply.response),
        }
    }

    async fn emit(&self, pattern: &str, payload: Value) -> Result<(), TransportError> {
        let packet = serde_json::to_string(&RequestPacket::event(pattern, payload))?;
        let mut publisher = self.publisher.clone();
        let _: i64 = publisher.publish(pattern, packet).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
