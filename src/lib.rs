// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # listsync
//!
//! Resilient auto-pagination and order-preserving reconciliation for lists
//! served by paginated REST APIs.
//!
//! ## Overview
//!
//! listsync keeps a locally ordered copy of remote lists (group members,
//! mappings, policy bindings) in step with the server without reshuffling
//! the local order every time the server returns elements differently:
//!
//! - Fetch every page of a listing, retrying transient failures on later
//!   pages and never discarding pages that were already fetched
//! - Merge the remote listing into the stored ordering: membership follows
//!   the remote side, relative order of known elements follows the local
//!   side, and new elements are appended in remote order
//! - Persist the merged ordering as the local side of the next run
//!
//! ## Modules
//!
//! - [`paginate`]: The page-request capability and the fetch loop
//! - [`merge`]: The consistent merge and change reports
//! - [`client`]: `reqwest` adapter for JSON list endpoints
//! - [`state`]: Stored orderings
//! - [`reconciler`]: Fetch, merge, and persist per list
//! - [`config`]: Configuration parsing and validation
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```
//! use listsync::merge;
//!
//! let merged = merge(&["a", "b", "c"], &["c", "a", "d"]);
//! assert_eq!(merged, vec!["a", "c", "d"]);
//! ```
//!
//! ```yaml
//! api:
//!   base_url: https://idp.example.com/api/v3
//! pagination:
//!   page_size: 100
//!   max_retries: 3
//! lists:
//!   - name: admins
//!     path: /core/users/
//!     key: pk
//!     query:
//!       groups_by_name: admins
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod merge;
pub mod paginate;
pub mod reconciler;
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use client::{ApiClient, ListRequest};
pub use config::{ConfigParser, ConfigValidator, SyncConfig};
pub use error::{ListSyncError, Result};
pub use merge::{merge, merge_by, ListDiff};
pub use paginate::{fetch_all, fetch_all_items, FetchOptions, FetchOutcome, PageRequest, PageResponse};
pub use reconciler::{ReconciliationReport, Reconciler};
pub use state::{LocalStateStore, StateStore, SyncState};
