//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope.

use marquee_core::page::Page;
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// A [`Page`] plus the derived page count and next-page flag.
#[derive(Debug, Serialize)]
pub struct PageResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page_index: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub has_next: bool,
}

impl<T: Serialize> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        let has_next = page.has_next();
        Self {
            items: page.items,
            total_count: page.total_count,
            page_index: page.page_index,
            page_size: page.page_size,
            total_pages,
            has_next,
        }
    }
}

/// Body of a bulk delete.
#[derive(Debug, Serialize)]
pub struct DeletedCount {
    pub deleted: u64,
}
