use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::require_text;
use crate::core::error::{GatewayError, GatewayResult};

/// Largest quantity of one line item
pub const MAX_ITEM_QUANTITY: u32 = 99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartDto {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub items: Vec<CartItemDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDto {
    pub id: String,
    pub product_variant_id: String,
    pub product_name: String,
    pub quantity: u32,
    #[schema(value_type = String, example = "199000.00")]
    pub unit_price: Decimal,
}

impl CartItemDto {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Cart as returned to clients, totals computed by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub cart_id: String,
    pub items: Vec<CartItemDto>,
    pub total_quantity: u32,
    #[schema(value_type = String, example = "398000.00")]
    pub total_amount: Decimal,
}

impl From<CartDto> for CartSummary {
    fn from(cart: CartDto) -> Self {
        let total_quantity = cart.items.iter().map(|item| item.quantity).sum();
        let total_amount = cart.items.iter().map(CartItemDto::line_total).sum();
        Self {
            cart_id: cart.id,
            items: cart.items,
            total_quantity,
            total_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemDto {
    pub product_variant_id: String,
    pub quantity: u32,
}

impl AddCartItemDto {
    pub fn validate(&self) -> GatewayResult<()> {
        require_text(&self.product_variant_id, 64, "productVariantId", "cart.errors.variantRequired")?;
        validate_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemDto {
    pub quantity: u32,
}

impl UpdateCartItemDto {
    pub fn validate(&self) -> GatewayResult<()> {
        validate_quantity(self.quantity)
    }
}

fn validate_quantity(quantity: u32) -> GatewayResult<()> {
    if quantity == 0 || quantity > MAX_ITEM_QUANTITY {
        return Err(GatewayError::validation("quantity", "cart.errors.invalidQuantity"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdPayload {
    pub user_id: String,
}

/// `ADD_CART_ITEM` payload, priced from the variant lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemPayload {
    pub user_id: String,
    pub product_variant_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// `UPDATE_CART_ITEM` / `REMOVE_CART_ITEM` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemPayload {
    pub user_id: String,
    pub item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32, unit_price: Decimal) -> CartItemDto {
        CartItemDto {
            id: format!("i{}", quantity),
            product_variant_id: "v1".to_string(),
            product_name: "Linen shirt".to_string(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn test_summary_totals() {
        let cart = CartDto {
            id: "c1".to_string(),
            user_id: "u1".to_string(),
            items: vec![item(2, Decimal::new(19950, 2)), item(1, Decimal::new(5000, 2))],
        };

        let summary = CartSummary::from(cart);
        assert_eq!(summary.cart_id, "c1");
        assert_eq!(summary.total_quantity, 3);
        assert_eq!(summary.total_amount, Decimal::new(44900, 2));
    }

    #[test]
    fn test_empty_cart_totals() {
        let summary = CartSummary::from(CartDto {
            id: "c1".to_string(),
            user_id: "u1".to_string(),
            items: vec![],
        });
        assert_eq!(summary.total_quantity, 0);
        assert_eq!(summary.total_amount, Decimal::ZERO);
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(UpdateCartItemDto { quantity: 0 }.validate().is_err());
        assert!(UpdateCartItemDto { quantity: 100 }.validate().is_err());
        assert!(UpdateCartItemDto { quantity: 3 }.validate().is_ok());
    }
}
