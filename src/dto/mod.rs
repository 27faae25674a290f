//! # Data Transfer Objects
//!
//! Request bodies accepted by the gateway, the payloads it forwards onto the bus and
//! the mirrors of the entities the backing services own. Everything is camelCase on
//! the wire; money is a [`rust_decimal::Decimal`] serialized as a string.
//!
//! Request DTOs carry an explicit `validate()` that returns the first offending field
//! as a [`GatewayError::Validation`](crate::core::error::GatewayError::Validation).

pub mod auth;
pub mod cart;
pub mod order;
pub mod product;
pub mod statistic;
pub mod user;

use regex::Regex;
use std::sync::OnceLock;

use crate::core::error::{GatewayError, GatewayResult};

pub(crate) fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"))
        .is_match(email)
}

/// Trimmed, non-empty and at most `max` characters
pub(crate) fn require_text(value: &str, max: usize, field: &str, key: &str) -> GatewayResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > max {
        return Err(GatewayError::validation(field, key));
    }
    Ok(())
}

/// `{ "id": ... }` payload used by most lookups
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IdPayload {
    pub id: String,
}

impl IdPayload {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
