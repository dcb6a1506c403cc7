//! Page request and page response capabilities.
//!
//! A list endpoint participates in auto-pagination by exposing these two
//! small traits. The paginator never inspects a request beyond them.

use async_trait::async_trait;

/// A request that can target a page and execute itself.
///
/// Implementations are builders: `with_page` and `with_page_size` derive a
/// new configured copy and leave `self` untouched, so the paginator can
/// re-derive a request for every page and every retry.
#[async_trait]
pub trait PageRequest: Send + Sync + Sized {
    /// The page returned by a successful execution.
    type Page: PageResponse + Send;

    /// The error returned by a failed execution.
    ///
    /// Transport failures and non-success API responses both surface here.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns a copy of this request targeting the given 1-based page.
    #[must_use]
    fn with_page(&self, page: u32) -> Self;

    /// Returns a copy of this request with the given page size.
    #[must_use]
    fn with_page_size(&self, size: u32) -> Self;

    /// Executes the request, performing one round-trip.
    async fn execute(&self) -> Result<Self::Page, Self::Error>;
}

/// A single page of results.
pub trait PageResponse {
    /// Element type of the result set.
    type Item;

    /// Returns true if the server reports a page after this one.
    fn has_next_page(&self) -> bool;

    /// Consumes the page, yielding its results in server order.
    fn into_results(self) -> Vec<Self::Item>;
}

/// Item type produced by a request's pages.
pub type ItemOf<R> = <<R as PageRequest>::Page as PageResponse>::Item;
