//! State types for reconciled list orderings.
//!
//! The state records, per configured list, the ordering the last successful
//! reconciliation produced. It is the local input of the next merge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current version of the state format.
pub const STATE_VERSION: &str = "1.0";

/// The complete persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// State format version.
    pub version: String,
    /// Stored orderings keyed by list name.
    #[serde(default)]
    pub lists: BTreeMap<String, StoredList>,
    /// When the state was last updated.
    pub last_updated: DateTime<Utc>,
}

/// A stored list ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredList {
    /// Element keys in their reconciled order.
    pub items: Vec<String>,
    /// When this ordering was stored.
    pub updated_at: DateTime<Utc>,
}

impl SyncState {
    /// Creates a new empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION.to_string(),
            lists: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }

    /// Gets a stored list by name.
    #[must_use]
    pub fn get_list(&self, name: &str) -> Option<&StoredList> {
        self.lists.get(name)
    }

    /// Returns the stored ordering for a list, empty if it was never stored.
    #[must_use]
    pub fn ordering(&self, name: &str) -> &[String] {
        self.lists
            .get(name)
            .map(|list| list.items.as_slice())
            .unwrap_or_default()
    }

    /// Stores the ordering of a list, replacing any previous one.
    pub fn set_list(&mut self, name: &str, items: Vec<String>) {
        let now = Utc::now();
        self.lists.insert(
            name.to_string(),
            StoredList {
                items,
                updated_at: now,
            },
        );
        self.last_updated = now;
    }

    /// Removes a stored list by name.
    pub fn remove_list(&mut self, name: &str) -> Option<StoredList> {
        let result = self.lists.remove(name);
        if result.is_some() {
            self.last_updated = Utc::now();
        }
        result
    }

    /// Returns all stored list names.
    #[must_use]
    pub fn list_names(&self) -> Vec<&str> {
        self.lists.keys().map(String::as_str).collect()
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

impl StoredList {
    /// Returns the number of stored elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the stored ordering is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
