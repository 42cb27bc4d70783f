//! GCM client for sending messages.

use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, RETRY_AFTER};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use tracing::debug;
use url::Url;

use crate::config::CONTENT_TYPE_JSON;
use crate::transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
use crate::{Delivery, GcmConfig, GcmError, GcmResponse, Message, Result};

/// Client for the GCM send endpoint.
///
/// Each [`send`](Self::send) issues exactly one request; retrying after a
/// [`GcmError::ServiceUnavailable`] or [`GcmError::ServerError`] is left to
/// the caller.
#[derive(Debug, Clone)]
pub struct GcmClient<T = ReqwestTransport> {
    config: GcmConfig,
    endpoint: Url,
    transport: T,
}

impl GcmClient<ReqwestTransport> {
    /// Create a client backed by `reqwest`.
    pub fn new(config: GcmConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: HttpTransport> GcmClient<T> {
    /// Create a client with a custom transport.
    pub fn with_transport(config: GcmConfig, transport: T) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| GcmError::Config(format!("invalid endpoint `{}`: {e}", config.endpoint)))?;

        Ok(Self {
            config,
            endpoint,
            transport,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &GcmConfig {
        &self.config
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the api key.
    pub fn api_key(&self) -> Option<&str> {
        self.config.api_key.as_deref()
    }

    /// Set the api key.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> Result<()> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(GcmError::InvalidArgument(
                "api key must be a non-empty string".to_string(),
            ));
        }
        self.config.api_key = Some(api_key);
        Ok(())
    }

    /// Send a message and decode the gateway's reply.
    ///
    /// The returned [`Delivery`] keeps a copy of `message` so results can be
    /// correlated with its registration ids.
    pub async fn send(&self, message: &Message) -> Result<Delivery> {
        let request = self.build_request(message)?;

        debug!(
            recipients = message.recipients().len(),
            dry_run = message.dry_run(),
            bytes = request.body.len(),
            "Sending GCM message"
        );

        let reply = self.transport.execute(request).await?;
        let response = decode_reply(reply)?;

        debug!(
            multicast_id = response.multicast_id(),
            success = response.success_count(),
            failure = response.failure_count(),
            canonical_ids = response.canonical_count(),
            "GCM reply decoded"
        );

        Ok(Delivery::new(response, message.clone()))
    }

    fn build_request(&self, message: &Message) -> Result<TransportRequest> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(GcmError::InvalidArgument(
                    "api key must be set before sending".to_string(),
                ));
            }
        };

        let body = Bytes::from(message.to_json()?);

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("key={api_key}")).map_err(|e| {
                GcmError::InvalidArgument(format!("api key is not a valid header value: {e}"))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));

        Ok(TransportRequest {
            method: Method::POST,
            url: self.endpoint.clone(),
            headers,
            body,
        })
    }
}

/// Map a raw reply to a decoded response or a gateway error.
fn decode_reply(reply: TransportResponse) -> Result<GcmResponse> {
    match reply.status {
        StatusCode::INTERNAL_SERVER_ERROR => Err(GcmError::ServerError),
        StatusCode::SERVICE_UNAVAILABLE => Err(GcmError::ServiceUnavailable {
            retry_after: reply.header(RETRY_AFTER).map(str::to_string),
        }),
        StatusCode::UNAUTHORIZED => Err(GcmError::Authentication),
        StatusCode::BAD_REQUEST => Err(GcmError::InvalidMessage),
        status if !status.is_success() => Err(GcmError::MalformedResponse(format!(
            "unexpected status {status}"
        ))),
        _ => GcmResponse::from_slice(&reply.body),
    }
}
