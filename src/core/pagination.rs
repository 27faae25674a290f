//! Page/size query parameters and the paginated reply shape.

use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::core::error::{GatewayError, GatewayResult};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// 1-based page number
    pub page: Option<u32>,
    /// Items per page (max 100)
    pub page_size: Option<u32>,
}

/// Validated pagination forwarded to the backing services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl PaginationQuery {
    pub fn validate(&self) -> GatewayResult<Pagination> {
        let page = self.page.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page == 0 {
            return Err(GatewayError::validation("page", "common.errors.invalidPage"));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(GatewayError::validation("pageSize", "common.errors.invalidPageSize"));
        }
        Ok(Pagination { page, page_size })
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
            total_pages: total_pages(total, pagination.page_size),
        }
    }

    /// Backing services do not always send `totalPages`
    pub fn normalized(mut self) -> Self {
        self.total_pages = total_pages(self.total, self.page_size);
        self
    }
}

fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64) as u32
}
