use serde::{Deserialize, Serialize};

/// One page of search results plus the paging metadata needed to fetch more.
///
/// `page_index` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page_index: i64,
    pub page_size: i64,
}

impl<T> Page<T> {
    /// A page with no rows, echoing the requested position.
    pub fn empty(page_index: i64, page_size: i64) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            page_index,
            page_size,
        }
    }

    /// Number of pages needed to cover `total_count` rows.
    pub fn total_pages(&self) -> i64 {
        if self.page_size <= 0 || self.total_count <= 0 {
            return 0;
        }
        (self.total_count + self.page_size - 1) / self.page_size
    }

    /// Whether a page after this one holds rows.
    pub fn has_next(&self) -> bool {
        self.page_index < self.total_pages()
    }
}
