//! Client configuration
//!
//! All settings are resolved by the caller (CLI flags, environment, `.env`) and
//! handed to the client as one value. Nothing in the client reads the process
//! environment itself.

use std::time::Duration;

use crate::cache::DEFAULT_TTL_SECS;
use crate::client::RetryPolicy;

/// Production API root
pub const DEFAULT_BASE_URL: &str = "https://api.zoomeye.ai";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for a `ZoomEyeClient`
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key sent in the `API-KEY` header; required for every call
    pub api_key: Option<String>,
    /// Outbound proxy URL applied to all requests
    pub proxy: Option<String>,
    /// API root, without a trailing path
    pub base_url: String,
    /// How long search responses stay in the local cache
    pub cache_ttl: Duration,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry policy for search requests
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            proxy: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Picks the proxy to use: an explicit setting wins, then the HTTPS proxy,
    /// then the HTTP proxy. Blank values count as unset.
    pub fn resolve_proxy(
        explicit: Option<String>,
        https_proxy: Option<String>,
        http_proxy: Option<String>,
    ) -> Option<String> {
        [explicit, https_proxy, http_proxy]
            .into_iter()
            .flatten()
            .find(|p| !p.trim().is_empty())
    }
}
