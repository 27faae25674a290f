//! # Redis Message Server
//!
//! Hosts a [`MessageRouter`] on the Redis bus: subscribes to every registered pattern,
//! runs the handler for each request packet and publishes the reply packet on
//! `<pattern>.reply`. Event packets (no id) run the event handlers and get no reply.

use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::rpc::exception::{ErrorCode, TypedRpcException};
use crate::rpc::packet::{reply_channel, ReplyPacket, RequestPacket};
use crate::rpc::router::MessageRouter;
use crate::rpc::transport::TransportError;

pub struct RedisMessageServer {
    client: Client,
    router: Arc<MessageRouter>,
}

impl RedisMessageServer {
    pub fn new(url: &str, router: Arc<MessageRouter>) -> Result<Self, TransportError> {
        Ok(Self {
            client: Client::open(url)?,
            router,
        })
    }

    /// Serve until the subscription stream ends
    pub async fn run(self) -> Result<(), TransportError> {
        let publisher = ConnectionManager::new(self.client.clone()).await?;
        let mut pubsub = self.client.get_async_connection().await?.into_pubsub();

        let channels: BTreeSet<String> = self
            .router
            .patterns()
            .into_iter()
            .chain(self.router.event_patterns())
            .collect();
        for channel in &channels {
            pubsub.subscribe(channel).await?;
        }
        info!(patterns = channels.len(), "Message server listening");

        let mut messages = Box::pin(pubsub.into_on_message());
        while let Some(msg) = messages.next().await {
            let payload: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(channel = msg.get_channel_name(), error = %e, "Unreadable request payload");
                    continue;
                }
            };
            tokio::spawn(handle_packet(self.router.clone(), publisher.clone(), payload));
        }

        warn!("Message server subscription ended");
        Ok(())
    }
}

async fn handle_packet(router: Arc<MessageRouter>, mut publisher: ConnectionManager, payload: String) {
    let packet: RequestPacket = match serde_json::from_str(&payload) {
        Ok(packet) => packet,
        Err(e) => {
            warn!(error = %e, "Malformed request packet");
            return;
        }
    };

    let pattern = packet.pattern.clone();
    let Some(reply) = reply_for(&router, packet).await else {
        return;
    };

    let encoded = match serde_json::to_string(&reply) {
        Ok(encoded) => encoded,
        Err(e) => {
            error!(pattern = %pattern, error = %e, "Failed to encode reply");
            return;
        }
    };

    let published: Result<i64, _> = publisher.publish(reply_channel(&pattern), encoded).await;
    if let Err(e) = published {
        error!(pattern = %pattern, error = %e, "Failed to publish reply");
    }
}

/// Run `packet` through the router; events produce no reply
///
/// A request nobody handles is answered with `NOT_FOUND` so the caller fails fast.
pub(crate) async fn reply_for(router: &MessageRouter, packet: RequestPacket) -> Option<ReplyPacket> {
    let Some(id) = packet.id else {
        let handled = router.dispatch_event(&packet.pattern, packet.data).await;
        debug!(pattern = %packet.pattern, handled, "Event dispatched");
        return None;
    };

    let reply = match router.dispatch(&packet.pattern, packet.data).await {
        Some(Ok(response)) => ReplyPacket::ok(id, response),
        Some(Err(exception)) => ReplyPacket::error(id, &exception),
        None => ReplyPacket::error(
            id,
            &TypedRpcException::new(ErrorCode::NotFound, "common.errors.noHandler"),
        ),
    };
    Some(reply)
}
