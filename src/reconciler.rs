//! Reconciler for keeping stored list orderings in step with the remote API.
//!
//! A reconciliation fetches the full remote listing, merges it into the
//! stored ordering so that known elements keep their local order, and
//! persists the result.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::{ListSyncError, ReconcileError, Result};
use crate::merge::{merge, ListDiff};
use crate::paginate::{fetch_all, FetchOptions, FetchStop, ItemOf, PageRequest};
use crate::state::{StateStore, SyncState};

/// Reconciler for stored list orderings.
pub struct Reconciler<'a, S: StateStore> {
    /// State store.
    state_store: &'a S,
    /// Options for every remote fetch.
    options: FetchOptions,
}

/// Result of reconciling one list.
#[derive(Debug, Clone, Serialize)]
pub struct ListReconciliation {
    /// Name of the list.
    pub name: String,
    /// The merged ordering.
    pub items: Vec<String>,
    /// Changes relative to the stored ordering.
    pub diff: ListDiff<String>,
    /// Number of pages fetched.
    pub pages_fetched: u32,
    /// Failed page attempts that a retry recovered.
    pub recovered_failures: usize,
    /// Remote items without a usable key.
    pub skipped: usize,
    /// True if the page limit cut the listing short.
    pub truncated: bool,
    /// True if the merged ordering was saved.
    pub persisted: bool,
}

/// Aggregated result of reconciling several lists.
#[derive(Debug, Default, Serialize)]
pub struct ReconciliationReport {
    /// Lists reconciled successfully.
    pub lists: Vec<ListReconciliation>,
    /// Error messages keyed by list name.
    pub errors: BTreeMap<String, String>,
}

impl<'a, S: StateStore> Reconciler<'a, S> {
    /// Creates a new reconciler with default fetch options.
    #[must_use]
    pub fn new(state_store: &'a S) -> Self {
        Self {
            state_store,
            options: FetchOptions::default(),
        }
    }

    /// Sets the fetch options.
    #[must_use]
    pub const fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Fetches, merges, and stores one list.
    ///
    /// `key_fn` maps each remote item to the key it is stored under; items
    /// for which it returns `None` are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be loaded or saved, or if the
    /// remote listing could not be fetched completely. An incomplete listing
    /// is never stored.
    pub async fn reconcile_list<R, F>(
        &self,
        name: &str,
        request: &R,
        key_fn: F,
    ) -> Result<ListReconciliation>
    where
        R: PageRequest,
        F: Fn(&ItemOf<R>) -> Option<String>,
    {
        info!("Reconciling list '{name}'");

        let mut state = self.load_state().await?;
        let mut result = self.merge_remote(&state, name, request, key_fn).await?;

        state.set_list(name, result.items.clone());
        self.state_store.save(&state).await?;
        result.persisted = true;

        info!("List '{name}' reconciled: {}", result.diff);
        Ok(result)
    }

    /// Fetches and merges one list without storing the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be loaded or the remote listing
    /// could not be fetched completely.
    pub async fn check_list<R, F>(
        &self,
        name: &str,
        request: &R,
        key_fn: F,
    ) -> Result<ListReconciliation>
    where
        R: PageRequest,
        F: Fn(&ItemOf<R>) -> Option<String>,
    {
        info!("Checking list '{name}' for drift");

        let state = self.load_state().await?;
        self.merge_remote(&state, name, request, key_fn).await
    }

    /// Loads the stored state, starting empty if there is none.
    async fn load_state(&self) -> Result<SyncState> {
        Ok(self.state_store.load().await?.unwrap_or_else(|| {
            debug!("No stored state found, starting empty");
            SyncState::new()
        }))
    }

    /// Fetches the remote listing and merges it into the stored ordering.
    async fn merge_remote<R, F>(
        &self,
        state: &SyncState,
        name: &str,
        request: &R,
        key_fn: F,
    ) -> Result<ListReconciliation>
    where
        R: PageRequest,
        F: Fn(&ItemOf<R>) -> Option<String>,
    {
        let outcome = fetch_all(request, &self.options).await;
        let reason = outcome
            .last_failure()
            .map(|f| f.error.to_string())
            .unwrap_or_default();

        match outcome.stop {
            FetchStop::FirstPageFailed => {
                return Err(ListSyncError::Reconcile(ReconcileError::FetchFailed {
                    name: name.to_string(),
                    reason,
                }));
            }
            FetchStop::Aborted { page } => {
                return Err(ListSyncError::Reconcile(ReconcileError::Incomplete {
                    name: name.to_string(),
                    fetched: outcome.items.len(),
                    page,
                    reason,
                }));
            }
            FetchStop::PageLimit => {
                warn!("List '{name}' was truncated by the page limit");
            }
            FetchStop::Exhausted => {}
        }

        let total = outcome.items.len();
        let remote: Vec<String> = outcome.items.iter().filter_map(&key_fn).collect();
        let skipped = total - remote.len();
        if skipped > 0 {
            warn!("List '{name}': skipped {skipped} items without a key");
        }

        let local = state.ordering(name);
        let items = merge(local, &remote);
        let diff = ListDiff::between(local, &remote);

        debug!(
            "List '{name}': {} stored, {} remote, {} merged",
            local.len(),
            remote.len(),
            items.len()
        );

        Ok(ListReconciliation {
            name: name.to_string(),
            items,
            diff,
            pages_fetched: outcome.pages_fetched,
            recovered_failures: outcome.failures.len(),
            skipped,
            truncated: outcome.stop == FetchStop::PageLimit,
            persisted: false,
        })
    }
}

/// Returns a key function reading `field` from JSON list items.
///
/// String values are used as-is and numbers in their decimal form; any other
/// value, or a missing field, yields no key.
pub fn json_key(field: &str) -> impl Fn(&serde_json::Value) -> Option<String> + '_ {
    move |item| match item.get(field)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl ListReconciliation {
    /// Returns true if membership changed.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.diff.has_changes()
    }
}

impl ReconciliationReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the result of one list.
    pub fn record(&mut self, name: &str, result: Result<ListReconciliation>) {
        match result {
            Ok(list) => self.lists.push(list),
            Err(e) => {
                warn!("List '{name}' failed: {e}");
                self.errors.insert(name.to_string(), e.to_string());
            }
        }
    }

    /// Returns true if every list succeeded.
    #[must_use]
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if any list changed membership.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.lists.iter().any(ListReconciliation::has_changes)
    }
}

impl std::fmt::Display for ListReconciliation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} ({} items, {} pages)",
            self.name,
            self.diff,
            self.items.len(),
            self.pages_fetched
        )?;
        if self.truncated {
            write!(f, " [truncated]")?;
        }
        Ok(())
    }
}

impl std::fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.success() { "successful" } else { "failed" };
        writeln!(f, "Reconciliation {status}:")?;
        for list in &self.lists {
            writeln!(f, "  {list}")?;
        }

        if !self.errors.is_empty() {
            writeln!(f, "  Errors:")?;
            for (name, error) in &self.errors {
                writeln!(f, "    - {name}: {error}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginate::{PageResponse, RetryPolicy};
    use crate::state::MockStateStore;
    use async_trait::async_trait;
    use std::sync::Arc;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("page {0} unavailable")]
    struct Unavailable(u32);

    struct FixedPage {
        items: Vec<String>,
        has_next: bool,
    }

    impl PageResponse for FixedPage {
        type Item = String;

        fn has_next_page(&self) -> bool {
            self.has_next
        }

        fn into_results(self) -> Vec<String> {
            self.items
        }
    }

    /// Serves fixed pages; `None` marks a page that always fails.
    #[derive(Clone)]
    struct FixedRequest {
        pages: Arc<Vec<Option<Vec<&'static str>>>>,
        page: u32,
    }

    impl FixedRequest {
        fn new(pages: Vec<Option<Vec<&'static str>>>) -> Self {
            Self {
                pages: Arc::new(pages),
                page: 1,
            }
        }
    }

    #[async_trait]
    impl PageRequest for FixedRequest {
        type Page = FixedPage;
        type Error = Unavailable;

        fn with_page(&self, page: u32) -> Self {
            Self {
                page,
                ..self.clone()
            }
        }

        fn with_page_size(&self, _size: u32) -> Self {
            self.clone()
        }

        async fn execute(&self) -> std::result::Result<FixedPage, Unavailable> {
            let index = (self.page - 1) as usize;
            match self.pages.get(index) {
                Some(Some(items)) => Ok(FixedPage {
                    items: items.iter().map(ToString::to_string).collect(),
                    has_next: index + 1 < self.pages.len(),
                }),
                _ => Err(Unavailable(self.page)),
            }
        }
    }

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn stored(name: &str, items: &[&str]) -> SyncState {
        let mut state = SyncState::new();
        state.set_list(name, keys(items));
        state
    }

    #[allow(clippy::ptr_arg)]
    fn identity(item: &String) -> Option<String> {
        Some(item.clone())
    }

    fn no_retry() -> FetchOptions {
        FetchOptions::default().with_retry(RetryPolicy::none())
    }

    #[tokio::test]
    async fn test_reconcile_merges_and_saves() {
        let mut store = MockStateStore::new();
        store
            .expect_load()
            .times(1)
            .returning(|| Ok(Some(stored("members", &["a", "b", "c"]))));
        store
            .expect_save()
            .withf(|state: &SyncState| state.ordering("members") == keys(&["a", "c", "d"]))
            .times(1)
            .returning(|_| Ok(()));

        let request = FixedRequest::new(vec![Some(vec!["c", "a"]), Some(vec!["d"])]);
        let reconciler = Reconciler::new(&store).with_options(no_retry());

        let result = reconciler
            .reconcile_list("members", &request, identity)
            .await
            .unwrap();

        assert_eq!(result.items, keys(&["a", "c", "d"]));
        assert_eq!(result.diff.added, keys(&["d"]));
        assert_eq!(result.diff.removed, keys(&["b"]));
        assert_eq!(result.pages_fetched, 2);
        assert!(result.persisted);
        assert!(result.has_changes());
    }

    #[tokio::test]
    async fn test_reconcile_without_state_takes_remote_order() {
        let mut store = MockStateStore::new();
        store.expect_load().returning(|| Ok(None));
        store
            .expect_save()
            .withf(|state: &SyncState| state.ordering("groups") == keys(&["z", "y"]))
            .times(1)
            .returning(|_| Ok(()));

        let request = FixedRequest::new(vec![Some(vec!["z", "y"])]);
        let result = Reconciler::new(&store)
            .reconcile_list("groups", &request, identity)
            .await
            .unwrap();

        assert_eq!(result.items, keys(&["z", "y"]));
    }

    #[tokio::test]
    async fn test_incomplete_fetch_is_not_saved() {
        let mut store = MockStateStore::new();
        store
            .expect_load()
            .returning(|| Ok(Some(stored("members", &["a"]))));
        store.expect_save().never();

        let request = FixedRequest::new(vec![Some(vec!["a"]), None, Some(vec!["c"])]);
        let err = Reconciler::new(&store)
            .with_options(no_retry())
            .reconcile_list("members", &request, identity)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ListSyncError::Reconcile(ReconcileError::Incomplete {
                fetched: 1,
                page: 2,
                ..
            })
        ));
        assert!(err.to_string().contains("page 2 unavailable"));
    }

    #[tokio::test]
    async fn test_first_page_failure() {
        let mut store = MockStateStore::new();
        store.expect_load().returning(|| Ok(None));
        store.expect_save().never();

        let request = FixedRequest::new(vec![None]);
        let err = Reconciler::new(&store)
            .check_list("members", &request, identity)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ListSyncError::Reconcile(ReconcileError::FetchFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_check_list_does_not_save() {
        let mut store = MockStateStore::new();
        store
            .expect_load()
            .returning(|| Ok(Some(stored("members", &["b", "a"]))));
        store.expect_save().never();

        let request = FixedRequest::new(vec![Some(vec!["a", "b"])]);
        let result = Reconciler::new(&store)
            .check_list("members", &request, identity)
            .await
            .unwrap();

        assert_eq!(result.items, keys(&["b", "a"]));
        assert!(!result.has_changes());
        assert!(result.diff.reorder_suppressed);
        assert!(!result.persisted);
    }

    #[tokio::test]
    async fn test_items_without_key_are_skipped() {
        let mut store = MockStateStore::new();
        store.expect_load().returning(|| Ok(None));

        let request = FixedRequest::new(vec![Some(vec!["a", "", "b"])]);
        let result = Reconciler::new(&store)
            .check_list("members", &request, |item: &String| {
                (!item.is_empty()).then(|| item.clone())
            })
            .await
            .unwrap();

        assert_eq!(result.items, keys(&["a", "b"]));
        assert_eq!(result.skipped, 1);
    }

    #[tokio::test]
    async fn test_page_limit_marks_truncated() {
        let mut store = MockStateStore::new();
        store.expect_load().returning(|| Ok(None));

        let request = FixedRequest::new(vec![Some(vec!["a"]), Some(vec!["b"])]);
        let result = Reconciler::new(&store)
            .with_options(no_retry().with_max_pages(1))
            .check_list("members", &request, identity)
            .await
            .unwrap();

        assert!(result.truncated);
        assert_eq!(result.items, keys(&["a"]));
        assert!(result.to_string().ends_with("[truncated]"));
    }

    #[test]
    fn test_json_key() {
        let key = json_key("pk");

        assert_eq!(key(&serde_json::json!({ "pk": "u1" })), Some(String::from("u1")));
        assert_eq!(key(&serde_json::json!({ "pk": 42 })), Some(String::from("42")));
        assert_eq!(key(&serde_json::json!({ "pk": null })), None);
        assert_eq!(key(&serde_json::json!({ "name": "x" })), None);
    }

    #[test]
    fn test_report() {
        let mut report = ReconciliationReport::new();
        report.record(
            "members",
            Ok(ListReconciliation {
                name: String::from("members"),
                items: keys(&["a"]),
                diff: ListDiff::between(&[], &keys(&["a"])),
                pages_fetched: 1,
                recovered_failures: 0,
                skipped: 0,
                truncated: false,
                persisted: true,
            }),
        );
        assert!(report.success());
        assert!(report.has_changes());

        report.record(
            "groups",
            Err(ListSyncError::Reconcile(ReconcileError::Aborted {
                reason: String::from("interrupted"),
            })),
        );
        assert!(!report.success());
        assert!(report.to_string().contains("groups: Reconciliation error"));
    }
}
