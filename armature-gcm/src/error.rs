//! GCM error types.

use thiserror::Error;

/// Result type for GCM operations.
pub type Result<T> = std::result::Result<T, GcmError>;

/// GCM client errors.
#[derive(Debug, Error)]
pub enum GcmError {
    /// A structurally invalid value was supplied (empty identifier, empty key, missing api key).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A payload key is already present in the target mapping.
    #[error("Key `{key}` conflicts with current {mapping} entries")]
    KeyConflict {
        /// Mapping the key was added to (`data` or `notification`).
        mapping: &'static str,
        /// The conflicting key.
        key: String,
    },

    /// Gateway rejected the api key (HTTP 401).
    #[error("401 Forbidden; authentication error")]
    Authentication,

    /// Gateway could not parse the request (HTTP 400).
    #[error("400 Bad Request; invalid message")]
    InvalidMessage,

    /// Gateway internal failure (HTTP 500).
    #[error("500 Internal Server Error")]
    ServerError,

    /// Gateway temporarily unavailable (HTTP 503).
    #[error("503 Server Unavailable{}", retry_after_suffix(.retry_after))]
    ServiceUnavailable {
        /// Raw `Retry-After` header value, if the gateway sent one.
        retry_after: Option<String>,
    },

    /// Response body absent, not a JSON object, or missing required fields.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Client configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level failure (connection, TLS, I/O).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Transport timed out.
    #[error("Request timed out")]
    Timeout,

    /// Request encoding error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn retry_after_suffix(retry_after: &Option<String>) -> String {
    retry_after
        .as_ref()
        .map(|value| format!("; retry after: {value}"))
        .unwrap_or_default()
}

impl GcmError {
    /// Check if the caller may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ServerError | Self::ServiceUnavailable { .. } | Self::Transport(_) | Self::Timeout
        )
    }

    /// Get the raw `Retry-After` value if the gateway was unavailable.
    pub fn retry_after(&self) -> Option<&str> {
        match self {
            Self::ServiceUnavailable { retry_after } => retry_after.as_deref(),
            _ => None,
        }
    }

    /// Get the HTTP status code behind a gateway-reported failure.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::InvalidMessage => Some(400),
            Self::Authentication => Some(401),
            Self::ServerError => Some(500),
            Self::ServiceUnavailable { .. } => Some(503),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GcmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GcmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_unavailable_display() {
        let err = GcmError::ServiceUnavailable {
            retry_after: Some("30".to_string()),
        };
        assert_eq!(err.to_string(), "503 Server Unavailable; retry after: 30");

        let err = GcmError::ServiceUnavailable { retry_after: None };
        assert_eq!(err.to_string(), "503 Server Unavailable");
    }

    #[test]
    fn test_retry_after() {
        let err = GcmError::ServiceUnavailable {
            retry_after: Some("120".to_string()),
        };
        assert_eq!(err.retry_after(), Some("120"));
        assert_eq!(GcmError::ServerError.retry_after(), None);
    }

    #[test]
    fn test_is_retryable() {
        assert!(GcmError::ServerError.is_retryable());
        assert!(GcmError::Timeout.is_retryable());
        assert!(GcmError::ServiceUnavailable { retry_after: None }.is_retryable());

        assert!(!GcmError::Authentication.is_retryable());
        assert!(!GcmError::InvalidMessage.is_retryable());
        assert!(!GcmError::MalformedResponse("empty".into()).is_retryable());
    }

    #[test]
    fn test_status_code() {
        assert_eq!(GcmError::InvalidMessage.status_code(), Some(400));
        assert_eq!(GcmError::Authentication.status_code(), Some(401));
        assert_eq!(GcmError::ServerError.status_code(), Some(500));
        assert_eq!(GcmError::InvalidArgument("x".into()).status_code(), None);
    }

    #[test]
    fn test_key_conflict_display() {
        let err = GcmError::KeyConflict {
            mapping: "data",
            key: "score".to_string(),
        };
        assert_eq!(err.to_string(), "Key `score` conflicts with current data entries");
    }
}
