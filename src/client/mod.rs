//! REST adapter for paginated list endpoints.
//!
//! This module provides a `reqwest`-based [`crate::paginate::PageRequest`]
//! for JSON list endpoints that page with `page` and `page_size` query
//! parameters and report the next page index in a pagination block.

mod api;
mod types;

pub use api::{ApiClient, ListRequest};
pub use types::{ListPage, Pagination};
