//! Configuration specification types.
//!
//! This module defines the structs that map to the `listsync.yaml` file:
//! where the API lives, how to paginate it, where reconciled orderings are
//! stored, and which list endpoints to reconcile.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::paginate::{DEFAULT_PAGE_SIZE, FetchOptions, RetryPolicy};

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    /// API connection settings.
    pub api: ApiConfig,
    /// Pagination behavior shared by all lists.
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Where reconciled orderings are stored.
    #[serde(default)]
    pub state: StateConfig,
    /// List endpoints to reconcile.
    #[serde(default)]
    pub lists: Vec<ListConfig>,
}

/// API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL that list paths are appended to.
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Static headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Pagination settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Items requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Retries for a failing page after the first.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound on the retry delay in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Optional cap on pages fetched per list.
    #[serde(default)]
    pub max_pages: Option<u32>,
}

/// State storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateConfig {
    /// Path of the state file. Defaults to `.listsync/state.json`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// A list endpoint to reconcile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListConfig {
    /// Name the reconciled ordering is stored under.
    pub name: String,
    /// Endpoint path relative to the API base URL.
    pub path: String,
    /// Result field identifying an element.
    #[serde(default = "default_key")]
    pub key: String,
    /// Extra query parameters sent with every page request.
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    /// Page size override for this list.
    #[serde(default)]
    pub page_size: Option<u32>,
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

const fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_key() -> String {
    String::from("pk")
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_pages: None,
        }
    }
}

impl PaginationConfig {
    /// Returns the retry policy described by this configuration.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }

    /// Builds fetch options, optionally overriding the page size.
    ///
    /// # Errors
    ///
    /// Returns an error if the effective page size is zero.
    pub fn fetch_options(&self, page_size: Option<u32>) -> Result<FetchOptions, ConfigError> {
        let size = page_size.unwrap_or(self.page_size);
        let size = NonZeroU32::new(size).ok_or_else(|| {
            ConfigError::validation("Page size must be a positive integer", "pagination.page_size")
        })?;

        let options = FetchOptions::new(size).with_retry(self.retry_policy());
        Ok(match self.max_pages {
            Some(max_pages) => options.with_max_pages(max_pages),
            None => options,
        })
    }
}

impl SyncConfig {
    /// Looks up a configured list by name.
    #[must_use]
    pub fn list(&self, name: &str) -> Option<&ListConfig> {
        self.lists.iter().find(|l| l.name == name)
    }

    /// Returns the fetch options for a list.
    ///
    /// # Errors
    ///
    /// Returns an error if the effective page size is zero.
    pub fn fetch_options_for(&self, list: &ListConfig) -> Result<FetchOptions, ConfigError> {
        self.pagination.fetch_options(list.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let config = PaginationConfig::default();
        let options = config.fetch_options(None).unwrap();

        assert_eq!(options.page_size.get(), 100);
        assert_eq!(options.retry.max_retries, 3);
        assert_eq!(options.retry.initial_backoff, Duration::from_millis(500));
        assert_eq!(options.max_pages, None);
    }

    #[test]
    fn test_page_size_override() {
        let config = PaginationConfig {
            max_pages: Some(4),
            ..PaginationConfig::default()
        };
        let options = config.fetch_options(Some(20)).unwrap();

        assert_eq!(options.page_size.get(), 20);
        assert_eq!(options.max_pages, Some(4));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = PaginationConfig {
            page_size: 0,
            ..PaginationConfig::default()
        };
        assert!(config.fetch_options(None).is_err());
    }
}
