use tracing::info;

use super::{require_user, CartService, NotificationService};
use crate::auth::CurrentUser;
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::pagination::PaginatedResult;
use crate::core::response::{build_base_response, BaseResponse, StatusKey};
use crate::dto::order::{
    CreateOrderDto, CreateOrderPayload, OrderCreatedEvent, OrderDto, OrderItemDto, OrderQuery, OrderStatus,
    OrderStatusChangedEvent, UpdateOrderStatusDto, UpdateOrderStatusPayload,
};
use crate::dto::IdPayload;
use crate::rpc::patterns::order;
use crate::rpc::ServiceClient;

pub struct OrderService {
    product: ServiceClient,
    carts: CartService,
    notifications: NotificationService,
}

impl OrderService {
    pub fn new(product: ServiceClient, notifications: NotificationService) -> Self {
        Self {
            carts: CartService::new(product.clone()),
            product,
            notifications,
        }
    }

    /// Turn the caller's cart into an order, then empty the cart
    pub async fn create_order(&self, user_id: Option<&str>, dto: CreateOrderDto) -> GatewayResult<BaseResponse<OrderDto>> {
        let user_id = require_user(user_id)?;
        dto.validate()?;

        let cart = self.carts.fetch(user_id).await?;
        if cart.items.is_empty() {
            return Err(GatewayError::bad_request("order.errors.emptyCart"));
        }

        let total_amount = cart.items.iter().map(|item| item.line_total()).sum();
        let items: Vec<OrderItemDto> = cart
            .items
            .into_iter()
            .map(|item| OrderItemDto {
                product_variant_id: item.product_variant_id,
                product_name: Some(item.product_name),
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();

        let payload = CreateOrderPayload {
            user_id: user_id.to_string(),
            items,
            total_amount,
            shipping_address: dto.shipping_address.trim().to_string(),
            payment_method: dto.payment_method,
            note: dto.note,
        };
        let created: OrderDto = self.product.send(order::CREATE_ORDER, &payload).await?;
        self.carts.clear_for(user_id).await?;
        info!(order_id = %created.id, user_id, "Order created");

        self.notifications
            .order_created(&OrderCreatedEvent {
                order_id: created.id.clone(),
                user_id: created.user_id.clone(),
                total_amount: created.total_amount,
                item_count: created.items.iter().map(|item| item.quantity).sum(),
            })
            .await;

        Ok(build_base_response(StatusKey::Success, created))
    }

    pub async fn list_orders(
        &self,
        user_id: Option<&str>,
        query: OrderQuery,
    ) -> GatewayResult<BaseResponse<PaginatedResult<OrderDto>>> {
        let user_id = require_user(user_id)?;
        let filter = query.validate(Some(user_id.to_string()))?;
        let page: PaginatedResult<OrderDto> = self.product.send(order::GET_ORDERS, &filter).await?;
        Ok(build_base_response(StatusKey::Success, page.normalized()))
    }

    /// Every customer's orders (admin)
    pub async fn list_all_orders(&self, query: OrderQuery) -> GatewayResult<BaseResponse<PaginatedResult<OrderDto>>> {
        let filter = query.validate(None)?;
        let page: PaginatedResult<OrderDto> = self.product.send(order::GET_ORDERS, &filter).await?;
        Ok(build_base_response(StatusKey::Success, page.normalized()))
    }

    /// Another customer's order looks like a missing one, except to admins
    pub async fn get_order(&self, user: Option<&CurrentUser>, id: &str) -> GatewayResult<BaseResponse<OrderDto>> {
        let user = user.ok_or_else(|| GatewayError::unauthorized("common.errors.unauthorized"))?;
        let order = self.fetch_visible(user, id).await?;
        Ok(build_base_response(StatusKey::Success, order))
    }

    pub async fn cancel_order(&self, user: Option<&CurrentUser>, id: &str) -> GatewayResult<BaseResponse<OrderDto>> {
        let user = user.ok_or_else(|| GatewayError::unauthorized("common.errors.unauthorized"))?;
        let current = self.fetch_visible(user, id).await?;
        let updated = self.transition(current, OrderStatus::Cancelled).await?;
        Ok(build_base_response(StatusKey::Success, updated))
    }

    /// Admin status change along the order lifecycle
    pub async fn update_status(&self, id: &str, dto: UpdateOrderStatusDto) -> GatewayResult<BaseResponse<OrderDto>> {
        let current: OrderDto = self.product.send(order::GET_ORDER_DETAIL, &IdPayload::new(id)).await?;
        if current.status == dto.status {
            return Ok(build_base_response(StatusKey::Unchanged, current));
        }
        let updated = self.transition(current, dto.status).await?;
        Ok(build_base_response(StatusKey::Success, updated))
    }

    async fn fetch_visible(&self, user: &CurrentUser, id: &str) -> GatewayResult<OrderDto> {
        let order: OrderDto = self.product.send(order::GET_ORDER_DETAIL, &IdPayload::new(id)).await?;
        if order.user_id != user.id && !user.is_admin() {
            return Err(GatewayError::not_found("order.errors.notFound"));
        }
        Ok(order)
    }

    async fn transition(&self, current: OrderDto, next: OrderStatus) -> GatewayResult<OrderDto> {
        if !current.status.can_transition_to(next) {
            return Err(GatewayError::bad_request("order.errors.invalidTransition"));
        }

        let payload = UpdateOrderStatusPayload {
            id: current.id.clone(),
            status: next,
        };
        let updated: OrderDto = self.product.send(order::UPDATE_ORDER_STATUS, &payload).await?;
        info!(order_id = %updated.id, from = %current.status, to = %next, "Order status changed");

        self.notifications
            .order_status_changed(&OrderStatusChangedEvent {
                order_id: updated.id.clone(),
                user_id: updated.user_id.clone(),
                from: current.status,
                to: next,
            })
            .await;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::order::PaymentMethod;
    use crate::dto::user::Role;
    use crate::rpc::patterns::{cart, notification};
    use crate::rpc::MessageRouter;
    use crate::services::test_support::{clients, Calls};
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    fn order_json(user_id: &str, status: &str) -> Value {
        json!({
            "id": "o1",
            "userId": user_id,
            "status": status,
            "items": [{ "productVariantId": "v1", "quantity": 2, "unitPrice": "100" }],
            "totalAmount": "200",
            "shippingAddress": "1 Le Loi, HCMC",
            "paymentMethod": "cod",
            "createdAt": "2024-05-01T10:00:00Z"
        })
    }

    fn customer(id: &str, role: Role) -> CurrentUser {
        CurrentUser {
            id: id.to_string(),
            email: format!("{}@shop.vn", id),
            role,
        }
    }

    fn service(router: MessageRouter) -> OrderService {
        let clients = clients(router);
        OrderService::new(clients.product, NotificationService::new(clients.notification))
    }

    fn order_router(status: &'static str) -> MessageRouter {
        let router = MessageRouter::new();
        router.on(order::GET_ORDER_DETAIL, move |_| async move { Ok(order_json("u1", status)) });
        router.on(order::UPDATE_ORDER_STATUS, |payload: Value| async move {
            let status = payload["status"].as_str().unwrap_or_default().to_string();
            Ok(order_json("u1", &status))
        });
        router
    }

    #[tokio::test]
    async fn test_create_order_clears_cart_and_notifies() {
        let cleared = Calls::default();
        let notified = Calls::default();
        let router = MessageRouter::new();
        router.on(cart::GET_CART, |_| async {
            Ok(json!({
                "id": "c1",
                "userId": "u1",
                "items": [{
                    "id": "i1",
                    "productVariantId": "v1",
                    "productName": "Linen shirt",
                    "quantity": 2,
                    "unitPrice": "100"
                }]
            }))
        });
        router.on(order::CREATE_ORDER, |payload: Value| async move {
            assert_eq!(payload["totalAmount"], "200");
            Ok(order_json("u1", "pending"))
        });
        let seen = cleared.clone();
        router.on(cart::CLEAR_CART, move |_| {
            seen.hit();
            async { Ok(json!({ "id": "c1", "userId": "u1", "items": [] })) }
        });
        let seen = notified.clone();
        router.on_event(notification::ORDER_CREATED, move |_| {
            let seen = seen.clone();
            async move { seen.hit() }
        });

        let dto = CreateOrderDto {
            shipping_address: "1 Le Loi, HCMC".to_string(),
            payment_method: PaymentMethod::Cod,
            note: None,
        };
        let response = service(router).create_order(Some("u1"), dto).await.unwrap();
        assert_eq!(response.data.status, OrderStatus::Pending);
        assert_eq!(cleared.count(), 1);
        assert_eq!(notified.count(), 1);
    }

    #[tokio::test]
    async fn test_create_order_with_empty_cart() {
        let router = MessageRouter::new();
        router.on(cart::GET_CART, |_| async { Ok(json!({ "id": "c1", "userId": "u1", "items": [] })) });

        let dto = CreateOrderDto {
            shipping_address: "1 Le Loi".to_string(),
            payment_method: PaymentMethod::Card,
            note: None,
        };
        let err = service(router).create_order(Some("u1"), dto).await.unwrap_err();
        assert_eq!(err.message_key(), "order.errors.emptyCart");
    }

    #[tokio::test]
    async fn test_cancel_pending_order() {
        let response = service(order_router("pending"))
            .cancel_order(Some(&customer("u1", Role::User)), "o1")
            .await
            .unwrap();
        assert_eq!(response.data.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cannot_cancel_shipping_order() {
        let err = service(order_router("shipping"))
            .cancel_order(Some(&customer("u1", Role::User)), "o1")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message_key(), "order.errors.invalidTransition");
    }

    #[tokio::test]
    async fn test_orders_of_others_are_hidden() {
        let service = service(order_router("pending"));

        let err = service
            .get_order(Some(&customer("u2", Role::User)), "o1")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        assert!(service.get_order(Some(&customer("admin", Role::Admin)), "o1").await.is_ok());
    }

    #[tokio::test]
    async fn test_admin_status_update() {
        let service = service(order_router("confirmed"));

        let shipped = service
            .update_status("o1", UpdateOrderStatusDto { status: OrderStatus::Shipping })
            .await
            .unwrap();
        assert_eq!(shipped.data.status, OrderStatus::Shipping);

        let same = service
            .update_status("o1", UpdateOrderStatusDto { status: OrderStatus::Confirmed })
            .await
            .unwrap();
        assert_eq!(same.status_key, StatusKey::Unchanged);

        let err = service
            .update_status("o1", UpdateOrderStatusDto { status: OrderStatus::Delivered })
            .await
            .unwrap_err();
        assert_eq!(err.message_key(), "order.errors.invalidTransition");
    }
}
