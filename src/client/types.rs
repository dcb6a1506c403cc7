//! List endpoint wire types.
//!
//! List endpoints answer with a pagination block and a page of results:
//!
//! ```json
//! {
//!   "pagination": { "next": 2, "previous": 0, "count": 230, "current": 1,
//!                   "total_pages": 3, "start_index": 1, "end_index": 100 },
//!   "results": [ ... ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

use crate::paginate::PageResponse;

/// Pagination block of a list response.
///
/// Page indices are 1-based; `0` in `next` or `previous` means there is no
/// such page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    /// Index of the next page, or 0.
    pub next: u32,
    /// Index of the previous page, or 0.
    pub previous: u32,
    /// Total number of results across all pages.
    pub count: u64,
    /// Index of this page.
    pub current: u32,
    /// Total number of pages.
    pub total_pages: u32,
    /// 1-based index of the first result on this page.
    pub start_index: u64,
    /// 1-based index of the last result on this page.
    pub end_index: u64,
}

impl Pagination {
    /// Returns the next page index, if there is one.
    #[must_use]
    pub const fn next_page(&self) -> Option<NonZeroU32> {
        NonZeroU32::new(self.next)
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPage<T> {
    /// Pagination block.
    #[serde(default)]
    pub pagination: Pagination,
    /// Results on this page.
    pub results: Vec<T>,
}

impl<T> PageResponse for ListPage<T> {
    type Item = T;

    fn has_next_page(&self) -> bool {
        self.pagination.next_page().is_some()
    }

    fn into_results(self) -> Vec<T> {
        self.results
    }
}
