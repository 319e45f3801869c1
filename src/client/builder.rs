//! Builder for creating Gemini web client instances.

use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Endpoints, GeminiWebConfig};
use crate::error::{GeminiWebError, GeminiWebResult, NetworkError};
use crate::transport::{HttpTransport, ReqwestTransport};

use super::client::GeminiWebClient;

/// Builder for creating a [`GeminiWebClient`].
///
/// # Example
///
/// ```no_run
/// use integrations_gemini_web::GeminiWebClientBuilder;
/// use secrecy::SecretString;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GeminiWebClientBuilder::new()
///     .secure_1psid(SecretString::new("your-cookie".into()))
///     .timeout(Duration::from_secs(120))
///     .auto_refresh(false)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct GeminiWebClientBuilder {
    secure_1psid: Option<SecretString>,
    secure_1psidts: Option<SecretString>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    auto_refresh: Option<bool>,
    refresh_interval: Option<Duration>,
    proxy: Option<String>,
    endpoints: Option<Endpoints>,
    stream_buffer: Option<usize>,

    // Injectable dependencies for testing
    transport: Option<Arc<dyn HttpTransport>>,
}

impl GeminiWebClientBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from an existing configuration.
    pub fn from_config(config: GeminiWebConfig) -> Self {
        Self {
            secure_1psid: Some(config.secure_1psid),
            secure_1psidts: config.secure_1psidts,
            timeout: Some(config.timeout),
            connect_timeout: Some(config.connect_timeout),
            auto_refresh: Some(config.auto_refresh),
            refresh_interval: Some(config.refresh_interval),
            proxy: config.proxy.map(String::from),
            endpoints: Some(config.endpoints),
            stream_buffer: Some(config.stream_buffer),
            transport: None,
        }
    }

    /// Sets the `__Secure-1PSID` cookie.
    pub fn secure_1psid(mut self, value: SecretString) -> Self {
        self.secure_1psid = Some(value);
        self
    }

    /// Sets the `__Secure-1PSIDTS` cookie.
    pub fn secure_1psidts(mut self, value: SecretString) -> Self {
        self.secure_1psidts = Some(value);
        self
    }

    /// Sets the whole-call timeout of generate calls.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Enables or disables background cookie rotation.
    pub fn auto_refresh(mut self, enable: bool) -> Self {
        self.auto_refresh = Some(enable);
        self
    }

    /// Sets the cookie rotation interval.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    /// Routes every call through a proxy.
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.proxy = Some(url.into());
        self
    }

    /// Overrides the endpoint URLs.
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Sets the streaming channel capacity.
    pub fn stream_buffer(mut self, size: usize) -> Self {
        self.stream_buffer = Some(size);
        self
    }

    /// Sets a custom HTTP transport (for testing).
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `__Secure-1PSID` is neither provided nor set in `GEMINI_SECURE_1PSID`
    /// - a configuration value is invalid
    /// - the HTTP transport cannot be created
    pub fn build(self) -> GeminiWebResult<GeminiWebClient> {
        // Explicit value first, then the environment.
        let secure_1psid = self.secure_1psid.or_else(|| {
            std::env::var("GEMINI_SECURE_1PSID")
                .ok()
                .filter(|s| !s.is_empty())
                .map(SecretString::new)
        });

        let mut builder = GeminiWebConfig::builder();
        if let Some(value) = secure_1psid {
            builder = builder.secure_1psid(value);
        }
        if let Some(value) = self.secure_1psidts {
            builder = builder.secure_1psidts(value);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(enable) = self.auto_refresh {
            builder = builder.auto_refresh(enable);
        }
        if let Some(interval) = self.refresh_interval {
            builder = builder.refresh_interval(interval);
        }
        if let Some(proxy) = &self.proxy {
            builder = builder.proxy(proxy)?;
        }
        if let Some(endpoints) = self.endpoints {
            builder = builder.endpoints(endpoints);
        }
        if let Some(size) = self.stream_buffer {
            builder = builder.stream_buffer(size);
        }
        let config = builder.build()?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(
                ReqwestTransport::new(config.timeout, config.connect_timeout, config.proxy.as_ref())
                    .map_err(|e| {
                        GeminiWebError::Network(NetworkError::ConnectionFailed {
                            message: format!("Failed to create HTTP transport: {}", e),
                        })
                    })?,
            ),
        };

        tracing::debug!(
            has_secure_1psidts = config.secure_1psidts.is_some(),
            auto_refresh = config.auto_refresh,
            proxy = config.proxy.is_some(),
            "Gemini web client created"
        );

        Ok(GeminiWebClient::from_parts(config, transport))
    }
}
