//! Order-stable list reconciliation.
//!
//! A declarative tool stores multi-valued fields in the order the operator
//! wrote them, while the API lists them in its own canonical order. Storing
//! the API order verbatim would report a reorder on every refresh. The
//! consistent merge keeps the stored order for known elements, takes
//! membership from the API, and appends anything new at the end.

mod consistent;
mod diff;

pub use consistent::{merge, merge_by};
pub use diff::ListDiff;
