//! ZoomEye API client
//!
//! This module issues asset searches and vulnerability lookups against the
//! ZoomEye v2 API. Searches are read-through/write-through cached and retried
//! with exponential backoff on transient failures. Vulnerability lookups are
//! single uncached requests.

mod error;
mod retry;
mod search;

pub use error::ZoomEyeError;
pub use retry::{
    RetryPolicy, DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRYABLE_STATUSES,
};
pub use search::{SearchParams, DEFAULT_PAGE, DEFAULT_PAGESIZE};

use reqwest::{Client, Proxy, RequestBuilder, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::ResponseCache;
use crate::config::ClientConfig;

/// Header carrying the API key
const API_KEY_HEADER: &str = "API-KEY";

/// Asset search endpoint
const SEARCH_PATH: &str = "/v2/search";

/// Vulnerability lookup by identifier; the id is appended as a path segment
const VULDB_PATH: &str = "/v2/vuldb";

/// Vulnerability search by keyword
const VULDB_SEARCH_PATH: &str = "/v2/search/vuldb";

/// Records per page for keyword vulnerability searches when unspecified
pub const DEFAULT_VULN_PAGE_SIZE: u32 = 10;

/// Client for the ZoomEye API
///
/// Cheap to clone: clones share the HTTP connection pool and the response cache.
#[derive(Debug, Clone)]
pub struct ZoomEyeClient {
    http_client: Client,
    api_key: Option<String>,
    base_url: String,
    retry: RetryPolicy,
    cache: ResponseCache,
}

impl ZoomEyeClient {
    /// Creates a client, building an HTTP client from the configured proxy and timeout
    ///
    /// Only the configured proxy is used; proxy environment variables are expected
    /// to have been resolved into `config.proxy` already.
    pub fn new(config: ClientConfig) -> Result<Self, ZoomEyeError> {
        let mut builder = Client::builder().timeout(config.timeout).no_proxy();

        if let Some(proxy_url) = &config.proxy {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                ZoomEyeError::Configuration(format!("invalid proxy URL '{}': {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let http_client = builder.build().map_err(|e| {
            ZoomEyeError::Configuration(format!("failed to build HTTP client: {}", e))
        })?;

        Ok(Self::with_client(http_client, config))
    }

    /// Creates a client around an existing HTTP client
    ///
    /// `config.proxy` and `config.timeout` are ignored; they belong to `http_client`.
    pub fn with_client(http_client: Client, config: ClientConfig) -> Self {
        Self {
            http_client,
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry,
            cache: ResponseCache::new(config.cache_ttl),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> Result<&str, ZoomEyeError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(ZoomEyeError::missing_api_key)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Runs an asset search
    ///
    /// # Behavior
    /// - Fails with `Configuration` before any network activity if no API key is set
    /// - Unless `bypass_cache` is set, returns a fresh cached response if present
    /// - Otherwise POSTs to `/v2/search`, retrying retryable failures per the policy
    /// - A body that is not JSON fails with `MalformedResponse` and is not cached
    /// - Successful responses are cached unless `bypass_cache` is set
    pub async fn search(&self, params: &SearchParams) -> Result<Value, ZoomEyeError> {
        let api_key = self.api_key()?;

        let cache_key = if params.bypass_cache {
            None
        } else {
            Some(params.cache_key())
        };

        if let Some(key) = &cache_key {
            if let Some(cached) = self.cache.get(key) {
                debug!(cache_key = %key, "search cache hit");
                return Ok(cached);
            }
            debug!(cache_key = %key, "search cache miss");
        }

        let body = self.post_search(api_key, params).await?;
        let result: Value = serde_json::from_str(&body)?;

        if let Some(key) = cache_key {
            self.cache.set(&key, result.clone());
        }

        Ok(result)
    }

    /// POSTs a search, backing off and retrying while the policy allows
    async fn post_search(&self, api_key: &str, params: &SearchParams) -> Result<String, ZoomEyeError> {
        let url = self.endpoint(SEARCH_PATH);
        let body = params.request_body();
        let mut attempt = 1;

        loop {
            debug!(attempt, %url, "sending ZoomEye search request");
            let request = self
                .http_client
                .post(&url)
                .header(API_KEY_HEADER, api_key)
                .json(&body);

            match send_checked(request).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable(&self.retry) && self.retry.allows_another(attempt) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(attempt, ?delay, error = %err, "ZoomEye search failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if attempt > 1 {
                        warn!(attempts = attempt, error = %err, "ZoomEye search retries exhausted");
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Looks up a vulnerability by identifier (CVE, CNVD or CNNVD id)
    ///
    /// A single uncached GET; any failure is returned as-is without retrying.
    pub async fn lookup_vulnerability(&self, id: &str) -> Result<Value, ZoomEyeError> {
        let api_key = self.api_key()?;
        let id = id.trim();
        if id.is_empty() {
            return Err(ZoomEyeError::InvalidArgument(
                "vulnerability id must not be empty".to_string(),
            ));
        }

        let mut url = Url::parse(&self.endpoint(VULDB_PATH)).map_err(|e| {
            ZoomEyeError::Configuration(format!("invalid base URL '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ZoomEyeError::Configuration(format!("base URL '{}' cannot take a path", self.base_url))
            })?
            .push(id);

        debug!(%url, "looking up vulnerability");
        let request = self.http_client.get(url).header(API_KEY_HEADER, api_key);
        let body = send_checked(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Searches the vulnerability database by product or vendor keyword
    ///
    /// A single uncached GET; any failure is returned as-is without retrying.
    pub async fn search_vulnerabilities(
        &self,
        keyword: &str,
        page_size: u32,
    ) -> Result<Value, ZoomEyeError> {
        let api_key = self.api_key()?;
        let url = self.endpoint(VULDB_SEARCH_PATH);

        debug!(%url, keyword, page_size, "searching vulnerabilities");
        let request = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .query(&[("search", keyword.to_string()), ("page_size", page_size.to_string())]);
        let body = send_checked(request).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Sends a request and returns the body of a successful response
async fn send_checked(request: RequestBuilder) -> Result<String, ZoomEyeError> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(ZoomEyeError::status(status, &text));
    }
    Ok(text)
}
