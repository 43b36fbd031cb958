//! Search syntax reference shown to callers of the search tool

pub const SEARCH_TOOL_SUMMARY: &str = "Search ZoomEye for internet-facing assets (IPv4/IPv6 hosts and websites). \
The query must be base64-encoded and passed as `qbase64`.";

pub const SEARCH_SYNTAX_GUIDE: &str = r#"
### Query syntax

Queries match keywords across protocol banners (HTTP headers and body, SSL, SSH, FTP, titles).
Matching is case-insensitive and tokenized unless `==` is used. Quote search strings and
escape embedded quotes or parentheses with a backslash, e.g. "a\"b" or portinfo\(\).

Operators:
- `=`   contains:                      title="knownsec"
- `==`  exact, case-sensitive match:   title=="knownsec"
- `||`  or:                            service="ssh" || service="http"
- `&&`  and:                           device="router" && after="2020-01-01"
- `!=`  not:                           country="US" && subdivisions!="new york"
- `()`  grouping:                      (country="US" && port!=80) || title!="404 Not Found"
- `*`   wildcard:                      title="*google"

Common keywords:
- Location: country="CN", subdivisions="beijing", city="changsha"
- Network: ip="8.8.8.8", cidr="52.2.254.36/24", port=80, asn=42893, org="Stanford University"
- Service: app="Apache Tomcat", service="ssh", product="nginx", os="linux", device="router"
- Web: title="Cisco", domain="baidu.com", hostname="google.com", http.header="nginx"
- Certificates: ssl="google", ssl.cert.fingerprint="F3C9...", ssl.cert.alg="SHA256-RSA"
- Time: after="2020-01-01", before="2023-01-01"
- Fingerprints: hash="0fce...", iconhash="f3418a443e7d841097c714d69ec4bcb8"
"#;

/// Full description for the search tool
pub fn search_tool_description() -> String {
    format!("{}\n{}", SEARCH_TOOL_SUMMARY, SEARCH_SYNTAX_GUIDE)
}
