//! Error type for ZoomEye client and tool calls

use reqwest::StatusCode;
use thiserror::Error;

use super::RetryPolicy;

/// Maximum number of response body bytes kept in a status error
const MAX_ERROR_BODY_LEN: usize = 512;

/// Errors that can occur when querying ZoomEye or dispatching a tool call
#[derive(Debug, Error)]
pub enum ZoomEyeError {
    /// Client is missing a credential or was given unusable settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// HTTP request failed before a response was received
    #[error("Error querying ZoomEye API: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Error querying ZoomEye API: HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Response body was not valid JSON
    #[error("Invalid JSON response from ZoomEye API: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// Caller asked for a tool that does not exist
    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    /// Tool arguments were missing or had the wrong shape
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ZoomEyeError {
    pub fn missing_api_key() -> Self {
        ZoomEyeError::Configuration(
            "ZoomEye API key is required. Set ZOOMEYE_API_KEY or pass --key".to_string(),
        )
    }

    /// Builds a status error, truncating long bodies
    pub fn status(status: StatusCode, body: &str) -> Self {
        let body = match body.char_indices().nth(MAX_ERROR_BODY_LEN) {
            Some((idx, _)) => format!("{}...", &body[..idx]),
            None => body.to_string(),
        };
        ZoomEyeError::Status { status, body }
    }

    /// Whether the failure happened at the network or HTTP level
    pub fn is_transport(&self) -> bool {
        matches!(self, ZoomEyeError::Request(_) | ZoomEyeError::Status { .. })
    }

    /// Whether the retry policy allows another attempt after this failure
    ///
    /// Connection and timeout failures are treated like a retryable status.
    pub fn is_retryable(&self, policy: &RetryPolicy) -> bool {
        match self {
            ZoomEyeError::Status { status, .. } => policy.is_retryable_status(*status),
            ZoomEyeError::Request(err) => err.is_connect() || err.is_timeout(),
            _ => false,
        }
    }

    /// The upstream status code, if this is a status error
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ZoomEyeError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_message() {
        let err = ZoomEyeError::missing_api_key();
        assert!(err.to_string().contains("ZoomEye API key is required"));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_status_error_is_transport() {
        let err = ZoomEyeError::status(StatusCode::SERVICE_UNAVAILABLE, "down");
        assert!(err.is_transport());
        assert_eq!(err.status_code(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("down"));
    }

    #[test]
    fn test_status_error_retryable_follows_policy() {
        let policy = RetryPolicy::default();

        assert!(ZoomEyeError::status(StatusCode::TOO_MANY_REQUESTS, "").is_retryable(&policy));
        assert!(ZoomEyeError::status(StatusCode::BAD_GATEWAY, "").is_retryable(&policy));
        assert!(!ZoomEyeError::status(StatusCode::NOT_FOUND, "").is_retryable(&policy));
        assert!(!ZoomEyeError::status(StatusCode::UNAUTHORIZED, "").is_retryable(&policy));
    }

    #[test]
    fn test_non_transport_errors_never_retry() {
        let policy = RetryPolicy::default();
        let malformed = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();

        assert!(!ZoomEyeError::missing_api_key().is_retryable(&policy));
        assert!(!ZoomEyeError::MalformedResponse(malformed).is_retryable(&policy));
        assert!(!ZoomEyeError::UnknownOperation("x".into()).is_retryable(&policy));
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(MAX_ERROR_BODY_LEN * 2);
        match ZoomEyeError::status(StatusCode::BAD_REQUEST, &body) {
            ZoomEyeError::Status { body, .. } => {
                assert_eq!(body.len(), MAX_ERROR_BODY_LEN + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_response_message() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ZoomEyeError::from(parse_err);
        assert!(err.to_string().starts_with("Invalid JSON response from ZoomEye API"));
        assert!(!err.is_transport());
    }
}
