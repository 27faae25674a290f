//! JSON packets exchanged over the Redis bus.
//!
//! The layout matches the NestJS Redis transport used by the backing services:
//! requests are `{ pattern, data, id }` on channel `<pattern>`, replies are
//! `{ id, response, err, isDisposed }` on channel `<pattern>.reply`, and events are
//! requests without an `id`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rpc::exception::TypedRpcException;

pub const REPLY_SUFFIX: &str = ".reply";

pub fn reply_channel(pattern: &str) -> String {
    format!("{}{}", pattern, REPLY_SUFFIX)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPacket {
    pub pattern: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl RequestPacket {
    pub fn request(pattern: &str, data: Value, id: String) -> Self {
        Self {
            pattern: pattern.to_string(),
            data,
            id: Some(id),
        }
    }

    pub fn event(pattern: &str, data: Value) -> Self {
        Self {
            pattern: pattern.to_string(),
            data,
            id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPacket {
    pub id: String,
    #[serde(default)]
    pub response: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<Value>,
    #[serde(default)]
    pub is_disposed: bool,
}

impl ReplyPacket {
    pub fn ok(id: String, response: Value) -> Self {
        Self {
            id,
            response,
            err: None,
            is_disposed: true,
        }
    }

    pub fn error(id: String, exception: &TypedRpcException) -> Self {
        Self {
            id,
            response: Value::Null,
            err: serde_json::to_value(exception).ok(),
            is_disposed: true,
        }
    }

    /// The remote error, if the reply carries one
    pub fn exception(&self) -> Option<TypedRpcException> {
        self.err
            .as_ref()
            .filter(|err| !err.is_null())
            .map(TypedRpcException::from_remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::exception::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_request_layout() {
        let packet = RequestPacket::request("CREATE_ORDER", json!({ "userId": 1 }), "abc".into());
        assert_eq!(
            serde_json::to_value(&packet).unwrap(),
            json!({ "pattern": "CREATE_ORDER", "data": { "userId": 1 }, "id": "abc" })
        );

        let event = RequestPacket::event("ORDER_CREATED", json!({}));
        assert!(serde_json::to_value(&event).unwrap().get("id").is_none());
    }

    #[test]
    fn test_reply_from_nest_service() {
        let raw = r#"{"id":"abc","err":null,"response":{"ok":true},"isDisposed":true}"#;
        let reply: ReplyPacket = serde_json::from_str(raw).unwrap();
        assert!(reply.exception().is_none());
        assert_eq!(reply.response, json!({ "ok": true }));

        let raw = r#"{"id":"abc","err":{"code":"NOT_FOUND","message":"product.errors.notFound"},"isDisposed":true}"#;
        let reply: ReplyPacket = serde_json::from_str(raw).unwrap();
        assert_eq!(reply.exception().unwrap().code, ErrorCode::NotFound);
    }

    #[test]
    fn test_reply_channel() {
        assert_eq!(reply_channel("GET_CART"), "GET_CART.reply");
    }
}
