//! Command-line interface parsing for the ZoomEye query tool
//!
//! This module handles parsing of CLI arguments using clap and turns them into a
//! `ClientConfig`. It is the only place that reads proxy settings from the
//! environment; the API key comes from `--key` or `ZOOMEYE_API_KEY`.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use thiserror::Error;

use crate::cache::DEFAULT_TTL_SECS;
use crate::client::{SearchParams, DEFAULT_PAGE, DEFAULT_PAGESIZE, DEFAULT_VULN_PAGE_SIZE};
use crate::config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::logging::{LogFormat, LoggingConfig};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// Tool arguments were not a valid JSON object
    #[error("Invalid tool arguments: {0}")]
    InvalidToolArguments(String),
}

/// ZoomEye asset search and vulnerability lookup
#[derive(Parser, Debug)]
#[command(name = "zoomeye")]
#[command(about = "Query the ZoomEye asset search and vulnerability APIs")]
#[command(version)]
pub struct Cli {
    /// ZoomEye API key
    #[arg(long, env = "ZOOMEYE_API_KEY", hide_env_values = true, global = true)]
    pub key: Option<String>,

    /// Proxy URL for outbound requests (defaults to https_proxy, then http_proxy)
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// ZoomEye API root
    #[arg(long, default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Seconds a search response stays in the local cache
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TTL_SECS, global = true)]
    pub cache_ttl: u64,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout: u64,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search for internet-facing assets
    Search(SearchArgs),

    /// Look up a vulnerability by CVE, CNVD or CNNVD id
    Vuln {
        /// Vulnerability identifier, e.g. CVE-2021-44228
        id: String,
    },

    /// Search the vulnerability database by keyword
    VulnSearch {
        /// Product or vendor name, e.g. nginx
        keyword: String,

        /// Number of records per page
        #[arg(long, default_value_t = DEFAULT_VULN_PAGE_SIZE)]
        page_size: u32,
    },

    /// Print the tool definitions as JSON
    Tools,

    /// Call a tool by name with a JSON object of arguments
    ///
    /// Example:
    ///   zoomeye call zoomeye_vuldb_by_id '{"cve_id": "CVE-2021-44228"}'
    Call {
        /// Tool name, e.g. zoomeye_search
        tool: String,

        /// Tool arguments as a JSON object
        arguments: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query text, e.g. 'app="Apache Tomcat" && country="US"'
    pub query: String,

    /// Treat QUERY as already base64-encoded
    #[arg(long)]
    pub encoded: bool,

    /// Page number
    #[arg(long, default_value_t = DEFAULT_PAGE)]
    pub page: u32,

    /// Records per page
    #[arg(long, default_value_t = DEFAULT_PAGESIZE)]
    pub pagesize: u32,

    /// Fields to return, comma separated
    #[arg(long)]
    pub fields: Option<String>,

    /// Data type: v4, v6 or web
    #[arg(long)]
    pub sub_type: Option<String>,

    /// Statistics to aggregate, comma separated
    #[arg(long)]
    pub facets: Option<String>,

    /// Ask for fresh results, skipping both the local and the upstream cache
    #[arg(long)]
    pub ignore_cache: bool,
}

impl SearchArgs {
    pub fn to_params(&self) -> SearchParams {
        let mut params = if self.encoded {
            SearchParams::new(self.query.clone())
        } else {
            SearchParams::from_query(&self.query)
        }
        .with_page(self.page)
        .with_pagesize(self.pagesize);

        if let Some(fields) = &self.fields {
            params = params.with_fields(fields.clone());
        }
        if let Some(sub_type) = &self.sub_type {
            params = params.with_sub_type(sub_type.clone());
        }
        if let Some(facets) = &self.facets {
            params = params.with_facets(facets.clone());
        }
        if self.ignore_cache {
            params = params.with_ignore_cache(true).with_bypass_cache(true);
        }
        params
    }
}

impl Cli {
    /// Builds the client configuration, resolving the proxy from the environment
    /// when `--proxy` is not given
    pub fn client_config(&self) -> ClientConfig {
        let env = |name: &str| std::env::var(name).ok();
        let proxy = ClientConfig::resolve_proxy(
            self.proxy.clone(),
            env("https_proxy").or_else(|| env("HTTPS_PROXY")),
            env("http_proxy").or_else(|| env("HTTP_PROXY")),
        );

        ClientConfig {
            api_key: self.key.clone(),
            proxy,
            base_url: self.base_url.clone(),
            cache_ttl: Duration::from_secs(self.cache_ttl),
            timeout: Duration::from_secs(self.timeout),
            ..ClientConfig::default()
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format,
        }
    }
}

/// Parses the optional JSON argument string of `zoomeye call`
///
/// # Returns
/// * `Ok(Value::Object)` for a JSON object, or an empty object when absent
/// * `Err(CliError::InvalidToolArguments)` for invalid JSON or a non-object value
pub fn parse_tool_arguments(raw: Option<&str>) -> Result<Value, CliError> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(Value::Object(Default::default()));
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(CliError::InvalidToolArguments(format!(
            "expected a JSON object, got {}",
            other
        ))),
        Err(e) => Err(CliError::InvalidToolArguments(e.to_string())),
    }
}
