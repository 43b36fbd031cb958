//! Callable tools exposed to a model-orchestration host
//!
//! Each tool takes a JSON parameter bag and returns the upstream JSON payload.
//! This module only validates argument shape and maps tool names onto
//! `ZoomEyeClient` calls; caching and retries live in the client.

mod guide;

pub use guide::{search_tool_description, SEARCH_SYNTAX_GUIDE};

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::client::{
    SearchParams, ZoomEyeClient, ZoomEyeError, DEFAULT_PAGE, DEFAULT_PAGESIZE,
    DEFAULT_VULN_PAGE_SIZE,
};

/// The tools this crate exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    /// Asset search
    Search,
    /// Vulnerability lookup by CVE/CNVD/CNNVD id
    VulnById,
    /// Vulnerability search by keyword
    VulnByKeyword,
}

impl ToolName {
    pub const ALL: [ToolName; 3] = [ToolName::Search, ToolName::VulnById, ToolName::VulnByKeyword];

    /// Wire name of the tool
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::Search => "zoomeye_search",
            ToolName::VulnById => "zoomeye_vuldb_by_id",
            ToolName::VulnByKeyword => "zoomeye_vuldb_by_keyword",
        }
    }

    /// Parses a wire name. Returns `None` for unknown tools.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<ToolName> {
        ToolName::ALL.into_iter().find(|tool| tool.as_str() == s.trim())
    }
}

/// Description of a tool as advertised to the host
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Definitions for every tool, in a stable order
pub fn definitions() -> Vec<ToolDefinition> {
    ToolName::ALL.into_iter().map(definition).collect()
}

fn definition(tool: ToolName) -> ToolDefinition {
    let (description, input_schema) = match tool {
        ToolName::Search => (
            search_tool_description(),
            json!({
                "type": "object",
                "properties": {
                    "qbase64": {
                        "type": "string",
                        "description": "Base64 encoded query string for ZoomEye search"
                    },
                    "page": {
                        "type": "integer",
                        "description": "View asset page number, default is 1",
                        "default": DEFAULT_PAGE
                    },
                    "pagesize": {
                        "type": "integer",
                        "description": "Number of records per page, default is 10, maximum is 1000",
                        "default": DEFAULT_PAGESIZE,
                        "maximum": 1000
                    },
                    "fields": {
                        "type": "string",
                        "description": "Fields to return, comma separated. Default: ip, port, domain, update_time"
                    },
                    "sub_type": {
                        "type": "string",
                        "description": "Data type: v4, v6 or web. Default is v4",
                        "enum": ["v4", "v6", "web"]
                    },
                    "facets": {
                        "type": "string",
                        "description": "Statistics to aggregate, comma separated: country, subdivisions, city, product, service, device, OS, port"
                    },
                    "ignore_cache": {
                        "type": "boolean",
                        "description": "Fetch fresh results instead of cached ones (upstream cache requires Business plan or above)"
                    }
                },
                "required": ["qbase64"]
            }),
        ),
        ToolName::VulnById => (
            "Look up detailed vulnerability information by identifier (CVE, CNVD or CNNVD)."
                .to_string(),
            json!({
                "type": "object",
                "properties": {
                    "cve_id": {
                        "type": "string",
                        "description": "Vulnerability identifier, e.g. CVE-XXXX-XXXX, CNVD-XXXX-XXXX, CNNVD-XXXX-XXXX"
                    }
                },
                "required": ["cve_id"]
            }),
        ),
        ToolName::VulnByKeyword => (
            "Search the ZoomEye vulnerability database by product or vendor keyword. \
             Results include CVE ids, severity, affected versions and descriptions."
                .to_string(),
            json!({
                "type": "object",
                "properties": {
                    "keyword": {
                        "type": "string",
                        "description": "Product or vendor name, e.g. nginx, mysql, tomcat, WordPress, hikvision"
                    },
                    "page_size": {
                        "type": "integer",
                        "description": "Number of records per page, default is 10, maximum is 100",
                        "default": DEFAULT_VULN_PAGE_SIZE,
                        "maximum": 100
                    }
                },
                "required": ["keyword"]
            }),
        ),
    };

    ToolDefinition {
        name: tool.as_str(),
        description,
        input_schema,
    }
}

/// Dispatches a tool call by name
///
/// # Arguments
/// * `client` - The client that performs the upstream call
/// * `name` - Wire name of the tool
/// * `arguments` - JSON object of tool arguments; `null` counts as no arguments
///
/// # Returns
/// * `Ok(Value)` - The upstream payload
/// * `Err(ZoomEyeError::UnknownOperation)` - If `name` is not a known tool
/// * `Err(ZoomEyeError::InvalidArgument)` - If a required argument is missing or mistyped
pub async fn call_tool(
    client: &ZoomEyeClient,
    name: &str,
    arguments: &Value,
) -> Result<Value, ZoomEyeError> {
    let tool =
        ToolName::from_str(name).ok_or_else(|| ZoomEyeError::UnknownOperation(name.to_string()))?;
    let empty = Map::new();
    let args = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(ZoomEyeError::InvalidArgument(format!(
                "arguments must be a JSON object, got {}",
                other
            )))
        }
    };

    debug!(tool = tool.as_str(), "dispatching tool call");
    match tool {
        ToolName::Search => client.search(&search_params(args)?).await,
        ToolName::VulnById => {
            let id = required_str(args, "cve_id")?;
            client.lookup_vulnerability(id).await
        }
        ToolName::VulnByKeyword => {
            let keyword = required_str(args, "keyword")?;
            let page_size = optional_u32(args, "page_size")?.unwrap_or(DEFAULT_VULN_PAGE_SIZE);
            client.search_vulnerabilities(keyword, page_size).await
        }
    }
}

/// Builds search parameters from a tool parameter bag
///
/// `ignore_cache = true` is sent upstream and also skips the local cache.
pub fn search_params(args: &Map<String, Value>) -> Result<SearchParams, ZoomEyeError> {
    let mut params = SearchParams::new(required_str(args, "qbase64")?)
        .with_page(optional_u32(args, "page")?.unwrap_or(DEFAULT_PAGE))
        .with_pagesize(optional_u32(args, "pagesize")?.unwrap_or(DEFAULT_PAGESIZE));

    if let Some(fields) = optional_str(args, "fields")? {
        params = params.with_fields(fields);
    }
    if let Some(sub_type) = optional_str(args, "sub_type")? {
        params = params.with_sub_type(sub_type);
    }
    if let Some(facets) = optional_str(args, "facets")? {
        params = params.with_facets(facets);
    }
    if let Some(ignore_cache) = optional_bool(args, "ignore_cache")? {
        params = params
            .with_ignore_cache(ignore_cache)
            .with_bypass_cache(ignore_cache);
    }

    Ok(params)
}

/// Renders a tool result as pretty-printed JSON; `null` renders as an empty string
pub fn format_result(value: &Value) -> String {
    if value.is_null() {
        return String::new();
    }
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn required_str<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a str, ZoomEyeError> {
    optional_str(args, name)?
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ZoomEyeError::InvalidArgument(format!("Missing required argument: {}", name)))
}

fn optional_str<'a>(
    args: &'a Map<String, Value>,
    name: &str,
) -> Result<Option<&'a str>, ZoomEyeError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(type_error(name, "a string", other)),
    }
}

fn optional_u32(args: &Map<String, Value>, name: &str) -> Result<Option<u32>, ZoomEyeError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| type_error(name, "a non-negative integer", &Value::Number(n.clone()))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| type_error(name, "a non-negative integer", &Value::String(s.clone()))),
        Some(other) => Err(type_error(name, "a non-negative integer", other)),
    }
}

fn optional_bool(args: &Map<String, Value>, name: &str) -> Result<Option<bool>, ZoomEyeError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(type_error(name, "a boolean", &Value::String(s.clone()))),
        },
        Some(other) => Err(type_error(name, "a boolean", other)),
    }
}

fn type_error(name: &str, expected: &str, got: &Value) -> ZoomEyeError {
    ZoomEyeError::InvalidArgument(format!("{} must be {}, got {}", name, expected, got))
}
