use crate::dto::auth::UserRegisteredEvent;
use crate::dto::order::{OrderCreatedEvent, OrderStatusChangedEvent};
use crate::rpc::patterns::notification;
use crate::rpc::ServiceClient;

/// Emits notification events; failures are only logged
#[derive(Clone)]
pub struct NotificationService {
    client: ServiceClient,
}

impl NotificationService {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    pub async fn user_registered(&self, event: &UserRegisteredEvent) {
        self.client.emit(notification::USER_REGISTERED, event).await;
    }

    pub async fn order_created(&self, event: &OrderCreatedEvent) {
        self.client.emit(notification::ORDER_CREATED, event).await;
    }

    pub async fn order_status_changed(&self, event: &OrderStatusChangedEvent) {
        self.client.emit(notification::ORDER_STATUS_CHANGED, event).await;
    }
}
