use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

use crate::core::error::{GatewayError, GatewayResult};
use crate::dto::order::OrderStatus;

/// Window used when the dashboard is opened without a range
pub const DEFAULT_RANGE_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StatisticQuery {
    /// Inclusive start date (YYYY-MM-DD)
    pub from: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD)
    pub to: Option<NaiveDate>,
}

/// `GET_ORDER_STATISTICS` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl StatisticQuery {
    pub fn validate(&self) -> GatewayResult<DateRange> {
        self.validate_at(Utc::now().date_naive())
    }

    pub fn validate_at(&self, today: NaiveDate) -> GatewayResult<DateRange> {
        let to = self.to.unwrap_or(today);
        let from = self.from.unwrap_or(to - Duration::days(DEFAULT_RANGE_DAYS));
        if from > to {
            return Err(GatewayError::bad_request("statistic.errors.invalidDateRange"));
        }
        Ok(DateRange { from, to })
    }
}

/// Reply of `GET_ORDER_STATISTICS`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatistics {
    /// Revenue of delivered orders
    pub total_revenue: Decimal,
    pub order_count: u64,
    #[serde(default)]
    pub status_counts: BTreeMap<OrderStatus, u64>,
}

/// Reply of `COUNT_USERS`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCount {
    pub total: u64,
    #[serde(default)]
    pub new_in_range: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    pub range: DateRange,
    #[schema(value_type = String, example = "12500000.00")]
    pub total_revenue: Decimal,
    pub order_count: u64,
    #[schema(value_type = String, example = "250000.00")]
    pub average_order_value: Decimal,
    pub total_users: u64,
    pub new_users: u64,
    /// Every status is present, zero-filled
    pub orders_by_status: BTreeMap<OrderStatus, u64>,
}

impl DashboardDto {
    pub fn aggregate(range: DateRange, orders: OrderStatistics, users: UserCount) -> Self {
        let average_order_value = if orders.order_count == 0 {
            Decimal::ZERO
        } else {
            (orders.total_revenue / Decimal::from(orders.order_count)).round_dp(2)
        };

        let mut orders_by_status: BTreeMap<OrderStatus, u64> =
            OrderStatus::ALL.iter().map(|status| (*status, 0)).collect();
        orders_by_status.extend(orders.status_counts);

        Self {
            range,
            total_revenue: orders.total_revenue,
            order_count: orders.order_count,
            average_order_value,
            total_users: users.total,
            new_users: users.new_in_range,
            orders_by_status,
        }
    }
}
