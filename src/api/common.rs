//! Shared API query and response types

use serde::{Deserialize, Serialize};

use crate::models::{ListParams, PagedResult, SortOrder};

/// Query parameters accepted by list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Case-sensitive substring match on either-language title
    pub q: Option<String>,
    pub publish: Option<bool>,
    pub kind: Option<String>,
    pub sort: Option<SortOrder>,
}

impl ListQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page.unwrap_or(1), self.per_page.unwrap_or(20))
    }

    pub fn sort(&self) -> SortOrder {
        self.sort.unwrap_or_default()
    }
}

/// Paginated response envelope
#[derive(Debug, Serialize)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> From<PagedResult<T>> for PagedResponse<T> {
    fn from(result: PagedResult<T>) -> Self {
        let total_pages = result.total_pages();
        Self {
            items: result.items,
            total: result.total,
            page: result.page,
            per_page: result.per_page,
            total_pages,
        }
    }
}
