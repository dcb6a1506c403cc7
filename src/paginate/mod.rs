//! Auto-pagination over page-indexed list endpoints.
//!
//! [`fetch_all`] walks pages 1, 2, 3, ... of a [`PageRequest`] until the
//! server reports no further page, accumulating results in fetch order.
//! A failure on the first page is fatal. Failures on later pages are
//! retried a bounded number of times before the fetch is abandoned, and
//! pages already fetched are always handed back to the caller.

mod fetch;
mod request;

pub use fetch::{
    fetch_all, fetch_all_items, FetchError, FetchOptions, FetchOutcome, FetchStop, PageFailure,
    RetryPolicy, DEFAULT_PAGE_SIZE,
};
pub use request::{ItemOf, PageRequest, PageResponse};
