//! HTTP client for paginated list endpoints.
//!
//! [`ApiClient`] owns the connection settings; [`ListRequest`] is the
//! per-endpoint request that the paginator drives page by page.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::trace;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::paginate::PageRequest;

use super::types::ListPage;

/// Query parameter carrying the page index.
const PAGE_PARAM: &str = "page";

/// Query parameter carrying the page size.
const PAGE_SIZE_PARAM: &str = "page_size";

/// HTTP method used for list requests.
const LIST_METHOD: &str = "GET";

/// Client for a REST API exposing paginated list endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// HTTP client.
    client: Client,
    /// Base URL without a trailing slash.
    base_url: String,
}

impl ApiClient {
    /// Creates a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured header is invalid or the HTTP
    /// client cannot be created.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ApiError::ClientBuild {
                    message: format!("invalid header name '{name}': {e}"),
                }
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| ApiError::ClientBuild {
                message: format!("invalid value for header '{name}': {e}"),
            })?;
            headers.insert(header_name, header_value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates a request for the list endpoint at `path`.
    #[must_use]
    pub fn list<T>(&self, path: &str) -> ListRequest<T> {
        ListRequest {
            client: self.clone(),
            path: format!("/{}", path.trim_start_matches('/')),
            query: Vec::new(),
            page: 1,
            page_size: None,
            _item: PhantomData,
        }
    }
}

/// A GET request against a paginated list endpoint.
pub struct ListRequest<T> {
    /// Client the request is sent through.
    client: ApiClient,
    /// Endpoint path, always starting with `/`.
    path: String,
    /// Extra query parameters.
    query: Vec<(String, String)>,
    /// Page index (1-based).
    page: u32,
    /// Page size, if set.
    page_size: Option<u32>,
    _item: PhantomData<fn() -> T>,
}

impl<T> ListRequest<T> {
    /// Adds a query parameter sent with every page.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Returns the endpoint path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the page index this request targets.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Returns the full query string parameters for this request.
    fn query_params(&self) -> Vec<(String, String)> {
        let mut params = self.query.clone();
        params.push((PAGE_PARAM.to_string(), self.page.to_string()));
        if let Some(size) = self.page_size {
            params.push((PAGE_SIZE_PARAM.to_string(), size.to_string()));
        }
        params
    }

    fn transport_error(&self, error: &reqwest::Error) -> ApiError {
        ApiError::Transport {
            method: LIST_METHOD.to_string(),
            path: self.path.clone(),
            message: error.to_string(),
        }
    }
}

impl<T> Clone for ListRequest<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            path: self.path.clone(),
            query: self.query.clone(),
            page: self.page,
            page_size: self.page_size,
            _item: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ListRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListRequest")
            .field("base_url", &self.client.base_url)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[async_trait]
impl<T> PageRequest for ListRequest<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Page = ListPage<T>;
    type Error = ApiError;

    fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    fn with_page_size(&self, size: u32) -> Self {
        Self {
            page_size: Some(size),
            ..self.clone()
        }
    }

    async fn execute(&self) -> Result<ListPage<T>, ApiError> {
        let url = format!("{}{}", self.client.base_url, self.path);
        let params = self.query_params();
        trace!("{LIST_METHOD} {url} {params:?}");

        let response = self
            .client
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                method: LIST_METHOD.to_string(),
                path: self.path.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(&e))?;

        serde_json::from_slice(&body).map_err(|e| ApiError::Decode {
            method: LIST_METHOD.to_string(),
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}
