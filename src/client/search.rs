//! Search request parameters and their wire form

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::cache::ResponseCache;

/// Page requested when the caller does not specify one
pub const DEFAULT_PAGE: u32 = 1;

/// Records per page when the caller does not specify a size
pub const DEFAULT_PAGESIZE: u32 = 10;

/// Parameters of a ZoomEye asset search
///
/// `qbase64` is the base64-encoded query text and is passed upstream as-is.
/// Optional fields set to an empty string are treated as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub qbase64: String,
    pub page: u32,
    pub pagesize: u32,
    /// Comma-separated result fields
    pub fields: Option<String>,
    /// Data type: v4, v6 or web
    pub sub_type: Option<String>,
    /// Comma-separated statistics to aggregate
    pub facets: Option<String>,
    /// Asks ZoomEye to skip its own server-side cache
    pub ignore_cache: Option<bool>,
    /// Skips the local response cache for both read and write
    pub bypass_cache: bool,
}

/// JSON body of `POST /v2/search`
#[derive(Debug, Serialize)]
pub(crate) struct SearchRequestBody<'a> {
    qbase64: &'a str,
    page: u32,
    pagesize: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    facets: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ignore_cache: Option<bool>,
}

fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl SearchParams {
    /// Creates parameters for an already-encoded query
    pub fn new(qbase64: impl Into<String>) -> Self {
        Self {
            qbase64: qbase64.into(),
            page: DEFAULT_PAGE,
            pagesize: DEFAULT_PAGESIZE,
            fields: None,
            sub_type: None,
            facets: None,
            ignore_cache: None,
            bypass_cache: false,
        }
    }

    /// Creates parameters from plain query text, base64-encoding it
    pub fn from_query(query: &str) -> Self {
        Self::new(STANDARD.encode(query))
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_pagesize(mut self, pagesize: u32) -> Self {
        self.pagesize = pagesize;
        self
    }

    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = non_empty(fields);
        self
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = non_empty(sub_type);
        self
    }

    pub fn with_facets(mut self, facets: impl Into<String>) -> Self {
        self.facets = non_empty(facets);
        self
    }

    pub fn with_ignore_cache(mut self, ignore_cache: bool) -> Self {
        self.ignore_cache = Some(ignore_cache);
        self
    }

    pub fn with_bypass_cache(mut self, bypass_cache: bool) -> Self {
        self.bypass_cache = bypass_cache;
        self
    }

    /// Cache signature of these parameters
    ///
    /// Only parameters that change the upstream result take part; the cache
    /// control flags do not.
    pub fn cache_key(&self) -> String {
        ResponseCache::build_key(
            &self.qbase64,
            [
                ("page", Some(self.page.to_string())),
                ("pagesize", Some(self.pagesize.to_string())),
                ("fields", self.fields.clone()),
                ("sub_type", self.sub_type.clone()),
                ("facets", self.facets.clone()),
            ],
        )
    }

    pub(crate) fn request_body(&self) -> SearchRequestBody<'_> {
        SearchRequestBody {
            qbase64: &self.qbase64,
            page: self.page,
            pagesize: self.pagesize,
            fields: self.fields.as_deref(),
            sub_type: self.sub_type.as_deref(),
            facets: self.facets.as_deref(),
            ignore_cache: self.ignore_cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let params = SearchParams::new("cXVlcnk=");
        assert_eq!(params.page, 1);
        assert_eq!(params.pagesize, 10);
        assert!(params.fields.is_none());
        assert!(params.ignore_cache.is_none());
        assert!(!params.bypass_cache);
    }

    #[test]
    fn test_from_query_encodes_text() {
        let params = SearchParams::from_query("test_query");
        assert_eq!(params.qbase64, "dGVzdF9xdWVyeQ==");
    }

    #[test]
    fn test_empty_optional_values_are_absent() {
        let params = SearchParams::new("cXVlcnk=")
            .with_fields("")
            .with_sub_type("  ")
            .with_facets("country");
        assert!(params.fields.is_none());
        assert!(params.sub_type.is_none());
        assert_eq!(params.facets.as_deref(), Some("country"));
    }

    #[test]
    fn test_cache_key_format() {
        let params = SearchParams::new("dGVzdF9xdWVyeQ==").with_fields("ip,port");
        assert_eq!(
            params.cache_key(),
            "qbase64=dGVzdF9xdWVyeQ==&fields=ip,port&page=1&pagesize=10"
        );
    }

    #[test]
    fn test_cache_key_ignores_cache_flags() {
        let plain = SearchParams::new("cXVlcnk=");
        let flagged = SearchParams::new("cXVlcnk=")
            .with_ignore_cache(true)
            .with_bypass_cache(true);
        assert_eq!(plain.cache_key(), flagged.cache_key());
    }

    #[test]
    fn test_cache_key_builder_order_does_not_matter() {
        let a = SearchParams::new("cXVlcnk=")
            .with_facets("country")
            .with_sub_type("v6")
            .with_page(3);
        let b = SearchParams::new("cXVlcnk=")
            .with_page(3)
            .with_sub_type("v6")
            .with_facets("country");
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(
            a.cache_key(),
            "qbase64=cXVlcnk=&facets=country&page=3&pagesize=10&sub_type=v6"
        );
    }

    #[test]
    fn test_request_body_omits_absent_fields() {
        let params = SearchParams::new("cXVlcnk=");
        let body = serde_json::to_value(params.request_body()).unwrap();
        assert_eq!(body, json!({"qbase64": "cXVlcnk=", "page": 1, "pagesize": 10}));
    }

    #[test]
    fn test_request_body_with_all_fields() {
        let params = SearchParams::new("cXVlcnk=")
            .with_page(2)
            .with_pagesize(20)
            .with_fields("ip,port")
            .with_sub_type("v4")
            .with_facets("country")
            .with_ignore_cache(true);
        let body = serde_json::to_value(params.request_body()).unwrap();
        assert_eq!(
            body,
            json!({
                "qbase64": "cXVlcnk=",
                "page": 2,
                "pagesize": 20,
                "fields": "ip,port",
                "sub_type": "v4",
                "facets": "country",
                "ignore_cache": true
            })
        );
    }
}
