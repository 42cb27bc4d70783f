//! HTTP transport used by the client.
//!
//! The client only needs to issue one request and read back the status,
//! headers and body. [`HttpTransport`] captures that, so applications can
//! plug in their own stack (or a fake in tests); [`ReqwestTransport`] is the
//! default.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use reqwest::Client;
use url::Url;

use crate::{GcmConfig, GcmError, Result};

/// An outgoing request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Request method.
    pub method: Method,
    /// Target URI.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Raw request body.
    pub body: Bytes,
}

/// A received response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a response.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Get a header value as a string.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }
}

/// Capability to execute a single HTTP request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute the request and return the gateway's reply, whatever its status.
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the configured timeout and user agent.
    pub fn new(config: &GcmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| GcmError::Config(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an existing `reqwest` client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        let response = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_response_header_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("30"));
        let response = TransportResponse::new(StatusCode::SERVICE_UNAVAILABLE, headers, "");

        assert_eq!(response.header("Retry-After"), Some("30"));
        assert_eq!(response.header("content-type"), None);
    }

    #[test]
    fn test_reqwest_transport_builds_from_config() {
        assert!(ReqwestTransport::new(&GcmConfig::default()).is_ok());
    }
}
