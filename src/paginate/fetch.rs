//! The auto-pagination loop.
//!
//! Pages are fetched strictly one after another so that the accumulated
//! result order is the page order defined by the server.

use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::request::{ItemOf, PageRequest, PageResponse};

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default number of retries for a failing page after the first.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry in milliseconds.
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;

/// Default upper bound on the retry delay in milliseconds.
const DEFAULT_MAX_BACKOFF_MS: u64 = 10_000;

/// Retry policy for pages after the first.
///
/// The first page is never retried: without it there is neither data nor
/// evidence that the listing exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed per page, on top of the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every further retry.
    pub initial_backoff: Duration,
    /// Upper bound on the delay between two attempts.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// Creates a retry policy.
    #[must_use]
    pub const fn new(max_retries: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff,
        }
    }

    /// A policy that abandons the fetch on the first failing page.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    /// Returns the delay to wait before the given retry (1-based).
    #[must_use]
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Options for a single [`fetch_all`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Page size requested on every page.
    pub page_size: NonZeroU32,
    /// Retry policy for pages after the first.
    pub retry: RetryPolicy,
    /// Stop after this many pages even if the server reports more.
    pub max_pages: Option<u32>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: NonZeroU32::MIN.saturating_add(DEFAULT_PAGE_SIZE - 1),
            retry: RetryPolicy::default(),
            max_pages: None,
        }
    }
}

impl FetchOptions {
    /// Creates options with the given page size and the default retry policy.
    #[must_use]
    pub fn new(page_size: NonZeroU32) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    /// Creates options from a raw page size, rejecting zero.
    #[must_use]
    pub fn with_page_size(page_size: u32) -> Option<Self> {
        NonZeroU32::new(page_size).map(Self::new)
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Caps the number of pages fetched.
    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }
}

/// A failed attempt to fetch one page.
#[derive(Debug)]
pub struct PageFailure<E> {
    /// Page index that failed.
    pub page: u32,
    /// Attempt number for that page (1-based).
    pub attempt: u32,
    /// The error returned by the request.
    pub error: E,
}

/// Why a fetch stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStop {
    /// The server reported no further page.
    Exhausted,
    /// The configured page cap was reached.
    PageLimit,
    /// The first page could not be fetched.
    FirstPageFailed,
    /// A later page kept failing after all retries.
    Aborted {
        /// The page that could not be fetched.
        page: u32,
    },
}

/// Everything a fetch produced: results, recorded failures, and why it stopped.
#[derive(Debug)]
pub struct FetchOutcome<T, E> {
    /// Results in fetch order.
    pub items: Vec<T>,
    /// Number of pages fetched successfully.
    pub pages_fetched: u32,
    /// Every failed attempt, including ones that were later retried successfully.
    pub failures: Vec<PageFailure<E>>,
    /// Why the fetch stopped.
    pub stop: FetchStop,
}

impl<T, E> FetchOutcome<T, E> {
    /// Returns true if the whole listing (or the capped prefix of it) was fetched.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.stop, FetchStop::Exhausted | FetchStop::PageLimit)
    }

    /// Returns the most recent failure, if any.
    #[must_use]
    pub fn last_failure(&self) -> Option<&PageFailure<E>> {
        self.failures.last()
    }

    /// Converts the outcome into all-or-nothing form.
    ///
    /// Failures that were recovered by a retry are dropped here; inspect
    /// [`FetchOutcome::failures`] before converting to see them.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::FirstPage`] if the first page failed and
    /// [`FetchError::Incomplete`] if a later page was abandoned.
    pub fn into_result(self) -> Result<Vec<T>, FetchError<E>>
    where
        E: std::error::Error + 'static,
    {
        let fetched = self.items.len();
        let mut failures = self.failures;

        // Failed stops always record the failure that caused them.
        let last = match self.stop {
            FetchStop::Exhausted | FetchStop::PageLimit => return Ok(self.items),
            FetchStop::FirstPageFailed | FetchStop::Aborted { .. } => match failures.pop() {
                Some(last) => last,
                None => return Ok(self.items),
            },
        };

        if self.stop == FetchStop::FirstPageFailed {
            return Err(FetchError::FirstPage { source: last.error });
        }

        Err(FetchError::Incomplete {
            page: last.page,
            fetched,
            source: last.error,
            earlier: failures,
        })
    }
}

/// Error form of a failed fetch.
#[derive(Debug, Error)]
pub enum FetchError<E: std::error::Error + 'static> {
    /// The first page could not be fetched; there are no results.
    #[error("failed to fetch page 1: {source}")]
    FirstPage {
        /// The error returned by the request.
        #[source]
        source: E,
    },

    /// A later page was abandoned after all retries.
    #[error("fetch aborted at page {page} after {fetched} items: {source}")]
    Incomplete {
        /// The page that could not be fetched.
        page: u32,
        /// Number of items fetched before the abort.
        fetched: usize,
        /// The final error for that page.
        #[source]
        source: E,
        /// Failures recorded before the final one.
        earlier: Vec<PageFailure<E>>,
    },
}

impl<E: std::error::Error + 'static> FetchError<E> {
    /// Returns the error that ended the fetch.
    #[must_use]
    pub const fn last_error(&self) -> &E {
        match self {
            Self::FirstPage { source } | Self::Incomplete { source, .. } => source,
        }
    }

    /// Returns the total number of failed attempts this error aggregates.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        match self {
            Self::FirstPage { .. } => 1,
            Self::Incomplete { earlier, .. } => earlier.len() + 1,
        }
    }
}

/// Fetches every page of a listing.
///
/// Starts at page 1 and keeps requesting the next page for as long as the
/// server reports one. Results are accumulated in fetch order.
///
/// A failure on page 1 ends the fetch immediately with no results. A failure
/// on a later page is recorded and the same page is retried according to
/// [`FetchOptions::retry`]; once the retries run out the fetch stops with
/// every previously fetched item intact.
///
/// The returned outcome cannot tell retryable errors apart from fatal ones;
/// both are whatever the request's `execute` returned.
pub async fn fetch_all<R>(request: &R, options: &FetchOptions) -> FetchOutcome<ItemOf<R>, R::Error>
where
    R: PageRequest,
{
    let page_size = options.page_size.get();
    let max_attempts = options.retry.max_retries.saturating_add(1);

    let mut items = Vec::new();
    let mut failures = Vec::new();
    let mut pages_fetched: u32 = 0;
    let mut page: u32 = 1;
    let mut attempt: u32 = 1;

    let stop = loop {
        debug!("Fetching page {page} (size {page_size}, attempt {attempt})");

        let current = request.with_page(page).with_page_size(page_size);

        match current.execute().await {
            Ok(response) => {
                let has_next = response.has_next_page();
                let results = response.into_results();
                debug!("Page {page}: {} results", results.len());

                items.extend(results);
                pages_fetched += 1;

                if !has_next {
                    break FetchStop::Exhausted;
                }

                if options.max_pages.is_some_and(|max| pages_fetched >= max) {
                    warn!("Stopping after {pages_fetched} pages: page limit reached");
                    break FetchStop::PageLimit;
                }

                let Some(next) = page.checked_add(1) else {
                    warn!("Stopping after page {page}: page index overflow");
                    break FetchStop::PageLimit;
                };
                page = next;
                attempt = 1;
            }
            Err(error) => {
                if page == 1 {
                    warn!("Failed to fetch first page: {error}");
                    failures.push(PageFailure {
                        page,
                        attempt,
                        error,
                    });
                    break FetchStop::FirstPageFailed;
                }

                warn!("Failed to fetch page {page} (attempt {attempt}/{max_attempts}): {error}");
                failures.push(PageFailure {
                    page,
                    attempt,
                    error,
                });

                if attempt >= max_attempts {
                    break FetchStop::Aborted { page };
                }

                let delay = options.retry.backoff_for(attempt);
                if !delay.is_zero() {
                    debug!("Retrying page {page} in {delay:?}");
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    };

    match stop {
        FetchStop::Exhausted | FetchStop::PageLimit => info!(
            "Fetched {} items in {pages_fetched} pages ({} failed attempts recovered)",
            items.len(),
            failures.len()
        ),
        FetchStop::FirstPageFailed => warn!("Fetch failed on the first page"),
        FetchStop::Aborted { page } => warn!(
            "Fetch aborted at page {page}: keeping {} items from {pages_fetched} pages",
            items.len()
        ),
    }

    FetchOutcome {
        items,
        pages_fetched,
        failures,
        stop,
    }
}

/// Fetches every page of a listing, all or nothing.
///
/// # Errors
///
/// Returns an error if the first page fails or a later page is abandoned.
pub async fn fetch_all_items<R>(
    request: &R,
    options: &FetchOptions,
) -> Result<Vec<ItemOf<R>>, FetchError<R::Error>>
where
    R: PageRequest,
{
    fetch_all(request, options).await.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Error, PartialEq, Eq)]
    #[error("scripted failure on page {page}")]
    struct ScriptedError {
        page: u32,
    }

    #[derive(Debug, Default)]
    struct Script {
        total_pages: u32,
        failures: HashMap<u32, u32>,
        calls: Vec<(u32, u32)>,
    }

    /// A listing of `total_pages` pages holding consecutive integers.
    #[derive(Debug, Clone)]
    struct ScriptedRequest {
        script: Arc<Mutex<Script>>,
        page: u32,
        page_size: u32,
    }

    struct ScriptedPage {
        items: Vec<u32>,
        has_next: bool,
    }

    impl PageResponse for ScriptedPage {
        type Item = u32;

        fn has_next_page(&self) -> bool {
            self.has_next
        }

        fn into_results(self) -> Vec<u32> {
            self.items
        }
    }

    #[async_trait]
    impl PageRequest for ScriptedRequest {
        type Page = ScriptedPage;
        type Error = ScriptedError;

        fn with_page(&self, page: u32) -> Self {
            Self {
                page,
                ..self.clone()
            }
        }

        fn with_page_size(&self, size: u32) -> Self {
            Self {
                page_size: size,
                ..self.clone()
            }
        }

        async fn execute(&self) -> Result<ScriptedPage, ScriptedError> {
            let mut script = self.script.lock().unwrap();
            script.calls.push((self.page, self.page_size));

            if let Some(remaining) = script.failures.get_mut(&self.page)
                && *remaining > 0
            {
                *remaining -= 1;
                return Err(ScriptedError { page: self.page });
            }

            let start = (self.page - 1) * self.page_size;
            Ok(ScriptedPage {
                items: (start..start + self.page_size).collect(),
                has_next: self.page < script.total_pages,
            })
        }
    }

    fn scripted(total_pages: u32, failures: &[(u32, u32)]) -> (ScriptedRequest, Arc<Mutex<Script>>) {
        let script = Arc::new(Mutex::new(Script {
            total_pages,
            failures: failures.iter().copied().collect(),
            calls: Vec::new(),
        }));
        let request = ScriptedRequest {
            script: Arc::clone(&script),
            page: 0,
            page_size: 0,
        };
        (request, script)
    }

    fn options(page_size: u32, max_retries: u32) -> FetchOptions {
        FetchOptions::with_page_size(page_size)
            .unwrap()
            .with_retry(RetryPolicy::new(max_retries, Duration::ZERO, Duration::ZERO))
    }

    #[tokio::test]
    async fn test_fetches_every_page_in_order() {
        let (request, script) = scripted(4, &[]);

        let outcome = fetch_all(&request, &options(3, 0)).await;

        assert_eq!(outcome.stop, FetchStop::Exhausted);
        assert_eq!(outcome.pages_fetched, 4);
        assert_eq!(outcome.items, (0..12).collect::<Vec<_>>());
        assert!(outcome.failures.is_empty());

        let calls = script.lock().unwrap().calls.clone();
        assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3), (4, 3)]);
    }

    #[tokio::test]
    async fn test_single_page_listing() {
        let (request, _script) = scripted(1, &[]);

        let items = fetch_all_items(&request, &options(5, 0)).await.unwrap();
        assert_eq!(items, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_first_page_failure_is_fatal() {
        let (request, script) = scripted(3, &[(1, 1)]);

        let outcome = fetch_all(&request, &options(2, 5)).await;

        assert_eq!(outcome.stop, FetchStop::FirstPageFailed);
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        // no retry on the first page
        assert_eq!(script.lock().unwrap().calls.len(), 1);

        let err = outcome.into_result().unwrap_err();
        assert!(matches!(err, FetchError::FirstPage { .. }));
        assert_eq!(err.last_error(), &ScriptedError { page: 1 });
    }

    #[tokio::test]
    async fn test_persistent_failure_keeps_earlier_pages() {
        let (request, script) = scripted(5, &[(3, u32::MAX)]);

        let outcome = fetch_all(&request, &options(3, 2)).await;

        assert_eq!(outcome.stop, FetchStop::Aborted { page: 3 });
        assert_eq!(outcome.items, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(outcome.pages_fetched, 2);
        assert_eq!(outcome.failures.len(), 3);
        assert!(!outcome.is_complete());

        let calls = script.lock().unwrap().calls.clone();
        assert_eq!(calls.iter().filter(|(page, _)| *page == 3).count(), 3);
        assert!(calls.iter().all(|(page, _)| *page <= 3));

        match outcome.into_result() {
            Err(FetchError::Incomplete {
                page,
                fetched,
                earlier,
                ..
            }) => {
                assert_eq!(page, 3);
                assert_eq!(fetched, 6);
                assert_eq!(earlier.len(), 2);
            }
            other => panic!("expected incomplete fetch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let (request, script) = scripted(3, &[(2, 1)]);

        let outcome = fetch_all(&request, &options(2, 3)).await;

        assert_eq!(outcome.stop, FetchStop::Exhausted);
        assert_eq!(outcome.items, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].page, 2);
        assert_eq!(outcome.failures[0].attempt, 1);
        assert_eq!(script.lock().unwrap().calls.len(), 4);

        assert_eq!(outcome.into_result().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_no_retry_policy_aborts_immediately() {
        let (request, script) = scripted(3, &[(2, 1)]);

        let opts = FetchOptions::with_page_size(2)
            .unwrap()
            .with_retry(RetryPolicy::none());
        let outcome = fetch_all(&request, &opts).await;

        assert_eq!(outcome.stop, FetchStop::Aborted { page: 2 });
        assert_eq!(outcome.items, vec![0, 1]);
        assert_eq!(script.lock().unwrap().calls.len(), 2);
    }

    #[tokio::test]
    async fn test_page_limit() {
        let (request, _script) = scripted(10, &[]);

        let outcome = fetch_all(&request, &options(1, 0).with_max_pages(2)).await;

        assert_eq!(outcome.stop, FetchStop::PageLimit);
        assert_eq!(outcome.items, vec![0, 1]);
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_millis(350));

        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(350));
        assert_eq!(policy.backoff_for(40), Duration::from_millis(350));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(FetchOptions::with_page_size(0).is_none());
        assert_eq!(FetchOptions::default().page_size.get(), DEFAULT_PAGE_SIZE);
    }
}
