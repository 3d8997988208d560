//! Remote endpoint data source.
//!
//! Issues a GET against the configured endpoint with the fetch filters as
//! query parameters and expects a JSON array of raw event records back.
//!
//! The catalog lookups use URLs derived from the events endpoint. With an
//! endpoint of `https://host/api/events`:
//!
//! | lookup | URL |
//! |---|---|
//! | one event | `https://host/api/events/{id}` |
//! | categories | `https://host/api/categories` |
//! | search | `https://host/api/search?q={query}` |

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::source::{BoxFuture, DataSource, EventCatalog, FetchFilters};

const CATEGORIES_SEGMENT: &str = "categories";
const SEARCH_SEGMENT: &str = "search";
/// Query parameter carrying the search text.
pub const SEARCH_QUERY_PARAM: &str = "q";

/// Configuration for [`RemoteSource`].
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Endpoint returning the event array.
    pub endpoint: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl RemoteConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration for the given endpoint.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("sonar-calendar/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of a single event: the endpoint with `id` appended.
    pub fn event_url(&self, id: &str) -> ApiResult<Url> {
        self.derive_url(|segments| {
            segments.pop_if_empty().push(id);
        })
    }

    /// URL of the categories list, a sibling of the events endpoint.
    pub fn categories_url(&self) -> ApiResult<Url> {
        self.sibling_url(CATEGORIES_SEGMENT)
    }

    /// URL of the search endpoint, a sibling of the events endpoint.
    pub fn search_url(&self) -> ApiResult<Url> {
        self.sibling_url(SEARCH_SEGMENT)
    }

    fn sibling_url(&self, name: &str) -> ApiResult<Url> {
        self.derive_url(|segments| {
            segments.pop_if_empty().pop().push(name);
        })
    }

    fn derive_url(&self, edit: impl FnOnce(&mut url::PathSegmentsMut<'_>)) -> ApiResult<Url> {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        let mut segments = url.path_segments_mut().map_err(|()| {
            ApiError::internal(format!("endpoint has no path to extend: {}", self.endpoint))
        })?;
        edit(&mut segments);
        drop(segments);
        Ok(url)
    }
}

/// Fetches events from an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    client: Client,
    config: RemoteConfig,
}

impl RemoteSource {
    /// Creates a new remote source.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the HTTP client cannot be built.
    pub fn new(config: RemoteConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ApiError::internal(format!("failed to create HTTP client: {}", e)).with_source(e)
            })?;

        Ok(Self { client, config })
    }

    /// Returns the configured endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    async fn get(&self, url: Url, query: &[(&str, &str)]) -> ApiResult<serde_json::Value> {
        debug!(url = %url, params = query.len(), "requesting remote endpoint");

        let response = self
            .client
            .get(url.clone())
            .query(query)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    "Network error: request timed out".to_string()
                } else if e.is_connect() {
                    "Network error: Unable to connect to the server".to_string()
                } else {
                    format!("Network error: {}", e)
                };
                ApiError::network(message).with_source(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "endpoint returned an error status");
            return Err(ApiError::http(status.as_u16()).with_detail("endpoint", url.as_str()));
        }

        let body = response.text().await.map_err(|e| {
            ApiError::network(format!("Network error: failed to read response body: {}", e))
                .with_source(e)
        })?;

        serde_json::from_str(&body).map_err(|e| {
            ApiError::parse(format!("Invalid JSON in response: {}", e)).with_source(e)
        })
    }
}

impl DataSource for RemoteSource {
    fn name(&self) -> &str {
        "remote"
    }

    fn fetch(&self, filters: &FetchFilters) -> BoxFuture<'_, ApiResult<serde_json::Value>> {
        let filters = filters.clone();
        Box::pin(async move {
            let query: Vec<(&str, &str)> = filters.iter().collect();
            self.get(self.config.endpoint.clone(), &query)
                .await
                .map_err(|e| e.with_context(self.name()))
        })
    }
}

impl EventCatalog for RemoteSource {
    fn get_event(&self, id: &str) -> BoxFuture<'_, ApiResult<serde_json::Value>> {
        let id = id.to_string();
        Box::pin(async move {
            let url = self.config.event_url(&id)?;
            self.get(url, &[])
                .await
                .map_err(|e| e.with_context(self.name()).with_detail("event_id", id))
        })
    }

    fn categories(&self) -> BoxFuture<'_, ApiResult<serde_json::Value>> {
        Box::pin(async move {
            let url = self.config.categories_url()?;
            self.get(url, &[])
                .await
                .map_err(|e| e.with_context(self.name()))
        })
    }

    fn search_events(
        &self,
        query: &str,
        filters: &FetchFilters,
    ) -> BoxFuture<'_, ApiResult<serde_json::Value>> {
        let filters = filters.clone().with_param(SEARCH_QUERY_PARAM, query);
        Box::pin(async move {
            let url = self.config.search_url()?;
            let params: Vec<(&str, &str)> = filters.iter().collect();
            self.get(url, &params)
                .await
                .map_err(|e| e.with_context(self.name()))
        })
    }
}
