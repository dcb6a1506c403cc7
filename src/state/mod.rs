//! State management module for listsync.
//!
//! This module persists the reconciled ordering of every configured list,
//! which becomes the local side of the next merge.

mod local;
mod store;
mod types;

pub use local::{LocalStateStore, STATE_DIR};
pub use store::StateStore;
#[cfg(test)]
pub use store::MockStateStore;
pub use types::{StoredList, SyncState, STATE_VERSION};
