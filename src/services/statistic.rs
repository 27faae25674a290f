use crate::core::error::GatewayResult;
use crate::core::response::{build_base_response, BaseResponse, StatusKey};
use crate::dto::statistic::{DashboardDto, OrderStatistics, StatisticQuery, UserCount};
use crate::rpc::patterns::{order, user};
use crate::rpc::ServiceClient;

/// Admin dashboard numbers
pub struct StatisticService {
    product: ServiceClient,
    user: ServiceClient,
}

impl StatisticService {
    pub fn new(product: ServiceClient, user: ServiceClient) -> Self {
        Self { product, user }
    }

    /// Order and user figures are fetched concurrently
    pub async fn dashboard(&self, query: StatisticQuery) -> GatewayResult<BaseResponse<DashboardDto>> {
        let range = query.validate()?;

        let (orders, users) = tokio::try_join!(
            self.product.send::<_, OrderStatistics>(order::GET_ORDER_STATISTICS, &range),
            self.user.send::<_, UserCount>(user::COUNT_USERS, &range),
        )?;

        Ok(build_base_response(
            StatusKey::Success,
            DashboardDto::aggregate(range, orders, users),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::order::OrderStatus;
    use crate::rpc::exception::{ErrorCode, TypedRpcException};
    use crate::rpc::MessageRouter;
    use crate::services::test_support::clients;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[tokio::test]
    async fn test_dashboard_combines_services() {
        let router = MessageRouter::new();
        router.on(order::GET_ORDER_STATISTICS, |payload| async move {
            assert!(payload["from"].is_string());
            Ok(json!({
                "totalRevenue": "900",
                "orderCount": 4,
                "statusCounts": { "delivered": 3, "cancelled": 1 }
            }))
        });
        router.on(user::COUNT_USERS, |_| async { Ok(json!({ "total": 12, "newInRange": 2 })) });

        let clients = clients(router);
        let service = StatisticService::new(clients.product, clients.user);
        let dashboard = service.dashboard(StatisticQuery::default()).await.unwrap().data;

        assert_eq!(dashboard.order_count, 4);
        assert_eq!(dashboard.average_order_value, Decimal::new(225, 0));
        assert_eq!(dashboard.total_users, 12);
        assert_eq!(dashboard.orders_by_status[&OrderStatus::Pending], 0);
        assert_eq!(dashboard.orders_by_status[&OrderStatus::Delivered], 3);
    }

    #[tokio::test]
    async fn test_dashboard_fails_when_one_side_fails() {
        let router = MessageRouter::new();
        router.on(order::GET_ORDER_STATISTICS, |_| async {
            Err(TypedRpcException::new(ErrorCode::InternalServerError, "common.errors.internalServerError"))
        });
        router.on(user::COUNT_USERS, |_| async { Ok(json!({ "total": 1 })) });

        let clients = clients(router);
        let service = StatisticService::new(clients.product, clients.user);
        assert!(service.dashboard(StatisticQuery::default()).await.is_err());
    }
}
