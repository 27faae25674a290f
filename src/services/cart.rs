use super::require_user;
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::response::{build_base_response, BaseResponse, StatusKey};
use crate::dto::cart::{AddCartItemDto, MAX_ITEM_QUANTITY, AddCartItemPayload, CartDto, CartItemPayload, CartSummary, UpdateCartItemDto, UserIdPayload};
use crate::dto::product::ProductVariantDto;
use crate::dto::IdPayload;
use crate::rpc::patterns::cart;
use crate::rpc::ServiceClient;

/// Carts live in the product service; the gateway checks stock and computes totals
pub struct CartService {
    product: ServiceClient,
}

impl CartService {
    pub fn new(product: ServiceClient) -> Self {
        Self { product }
    }

    pub async fn get_cart(&self, user_id: Option<&str>) -> GatewayResult<BaseResponse<CartSummary>> {
        let user_id = require_user(user_id)?;
        let cart = self.fetch(user_id).await?;
        Ok(build_base_response(StatusKey::Success, cart.into()))
    }

    pub async fn add_item(&self, user_id: Option<&str>, dto: AddCartItemDto) -> GatewayResult<BaseResponse<CartSummary>> {
        let user_id = require_user(user_id)?;
        dto.validate()?;

        let variant = self.variant(&dto.product_variant_id).await?;
        let current = self.fetch(user_id).await?;
        let wanted = current
            .items
            .iter()
            .filter(|item| item.product_variant_id == dto.product_variant_id)
            .fold(dto.quantity, |total, item| total.saturating_add(item.quantity));
        ensure_stock(&variant, wanted)?;
        if wanted > MAX_ITEM_QUANTITY {
            return Err(GatewayError::validation("quantity", "cart.errors.invalidQuantity"));
        }

        let payload = AddCartItemPayload {
            user_id: user_id.to_string(),
            product_variant_id: variant.id,
            quantity: dto.quantity,
            unit_price: variant.price,
        };

        let cart: CartDto = self.product.send(cart::ADD_CART_ITEM, &payload).await?;
        Ok(build_base_response(StatusKey::Success, cart.into()))
    }

    pub async fn update_item(
        &self,
        user_id: Option<&str>,
        item_id: &str,
        dto: UpdateCartItemDto,
    ) -> GatewayResult<BaseResponse<CartSummary>> {
        let user_id = require_user(user_id)?;
        dto.validate()?;

        let current = self.fetch(user_id).await?;
        let item = current
            .items
            .iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| GatewayError::not_found("cart.errors.itemNotFound"))?;
        if item.quantity == dto.quantity {
            return Ok(build_base_response(StatusKey::Unchanged, current.into()));
        }
        let variant = self.variant(&item.product_variant_id).await?;
        ensure_stock(&variant, dto.quantity)?;

        let payload = CartItemPayload {
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            quantity: Some(dto.quantity),
        };
        let cart: CartDto = self.product.send(cart::UPDATE_CART_ITEM, &payload).await?;
        Ok(build_base_response(StatusKey::Success, cart.into()))
    }

    pub async fn remove_item(&self, user_id: Option<&str>, item_id: &str) -> GatewayResult<BaseResponse<CartSummary>> {
        let user_id = require_user(user_id)?;
        let payload = CartItemPayload {
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            quantity: None,
        };
        let cart: CartDto = self.product.send(cart::REMOVE_CART_ITEM, &payload).await?;
        Ok(build_base_response(StatusKey::Success, cart.into()))
    }

    pub async fn clear(&self, user_id: Option<&str>) -> GatewayResult<BaseResponse<CartSummary>> {
        let user_id = require_user(user_id)?;
        let cart = self.clear_for(user_id).await?;
        Ok(build_base_response(StatusKey::Success, cart.into()))
    }

    pub(crate) async fn fetch(&self, user_id: &str) -> GatewayResult<CartDto> {
        let payload = UserIdPayload {
            user_id: user_id.to_string(),
        };
        Ok(self.product.send(cart::GET_CART, &payload).await?)
    }

    pub(crate) async fn clear_for(&self, user_id: &str) -> GatewayResult<CartDto> {
        let payload = UserIdPayload {
            user_id: user_id.to_string(),
        };
        Ok(self.product.send(cart::CLEAR_CART, &payload).await?)
    }

    async fn variant(&self, variant_id: &str) -> GatewayResult<ProductVariantDto> {
        let variant: Option<ProductVariantDto> = self
            .product
            .send(cart::CHECK_PRODUCT_VARIANT_EXISTS, &IdPayload::new(variant_id))
            .await?;
        variant.ok_or_else(|| GatewayError::not_found("cart.errors.variantNotFound"))
    }
}

/// `quantity` is the whole line after the change, not the delta
fn ensure_stock(variant: &ProductVariantDto, quantity: u32) -> GatewayResult<()> {
    if quantity > variant.stock {
        return Err(GatewayError::bad_request("cart.errors.insufficientStock"));
    }
    Ok(())
}
