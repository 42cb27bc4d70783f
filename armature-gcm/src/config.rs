//! Gateway constants and client configuration.

use std::time::Duration;

/// Gateway send endpoint.
pub const SERVER_URI: &str = "https://fcm.googleapis.com/fcm/send";

/// Time to live the gateway applies when none is sent (28 days).
pub const DEFAULT_TIME_TO_LIVE: u32 = 2_419_200;

/// Priority the gateway applies when none is sent.
pub const DEFAULT_PRIORITY: &str = "normal";

/// Default request timeout for the reqwest transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Content type of every request body.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Environment variable read by [`GcmConfig::from_env`] for the api key.
pub const ENV_API_KEY: &str = "GCM_API_KEY";

/// Environment variable read by [`GcmConfig::from_env`] for the endpoint.
pub const ENV_ENDPOINT: &str = "GCM_ENDPOINT";

/// Configuration for the GCM client.
#[derive(Debug, Clone)]
pub struct GcmConfig {
    /// Server api key sent as `Authorization: key=<api_key>`.
    ///
    /// Checked when a message is sent, not when the client is built.
    pub api_key: Option<String>,

    /// Gateway endpoint.
    pub endpoint: String,

    /// Request timeout for the reqwest transport.
    pub timeout: Duration,

    /// User-Agent header for the reqwest transport.
    pub user_agent: String,
}

impl Default for GcmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: SERVER_URI.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("armature-gcm/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl GcmConfig {
    /// Create a configuration with the given api key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Create a builder for custom configuration.
    pub fn builder() -> GcmConfigBuilder {
        GcmConfigBuilder::new()
    }

    /// Load the api key and an optional endpoint override from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var(ENV_API_KEY)
            && !key.is_empty()
        {
            config.api_key = Some(key);
        }
        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT)
            && !endpoint.is_empty()
        {
            config.endpoint = endpoint;
        }
        config
    }
}

/// Builder for [`GcmConfig`].
#[derive(Debug, Clone, Default)]
pub struct GcmConfigBuilder {
    config: GcmConfig,
}

impl GcmConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: GcmConfig::default(),
        }
    }

    /// Set the api key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    /// Override the gateway endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout = Duration::from_secs(secs);
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GcmConfig {
        self.config
    }
}
