//! Configuration types for the Gemini web client.

use secrecy::SecretString;
use std::time::Duration;
use url::Url;
use crate::error::{ConfigurationError, GeminiWebError};
use crate::protocol::constants;

/// Default whole-call timeout for generate calls (300 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default connect timeout (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default cookie rotation interval (540 seconds).
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 540;

/// Minimum age of the last successful rotation before another one is attempted.
pub const MIN_ROTATION_INTERVAL_SECS: u64 = 60;

/// Default capacity of the streaming update channel.
pub const DEFAULT_STREAM_BUFFER: usize = 32;

/// Endpoints the client talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    /// Landing page.
    pub init: Url,
    /// Streaming generate call.
    pub generate: Url,
    /// Batched RPC call.
    pub batch_execute: Url,
    /// Cookie rotation call.
    pub rotate_cookies: Url,
    /// File upload call.
    pub upload: Url,
}

impl Endpoints {
    /// Points every endpoint at `base`, keeping the production paths.
    ///
    /// Used to route all traffic to a local mock server.
    pub fn with_base(base: &str) -> Result<Self, GeminiWebError> {
        let base = Url::parse(base)?;
        let rebase = |production: &str| -> Result<Url, GeminiWebError> {
            let production = Url::parse(production)?;
            Ok(base.join(production.path())?)
        };
        Ok(Self {
            init: rebase(constants::ENDPOINT_INIT)?,
            generate: rebase(constants::ENDPOINT_GENERATE)?,
            batch_execute: rebase(constants::ENDPOINT_BATCH_EXECUTE)?,
            rotate_cookies: rebase(constants::ENDPOINT_ROTATE_COOKIES)?,
            upload: rebase(constants::ENDPOINT_UPLOAD)?,
        })
    }

    fn production() -> Result<Self, GeminiWebError> {
        Ok(Self {
            init: Url::parse(constants::ENDPOINT_INIT)?,
            generate: Url::parse(constants::ENDPOINT_GENERATE)?,
            batch_execute: Url::parse(constants::ENDPOINT_BATCH_EXECUTE)?,
            rotate_cookies: Url::parse(constants::ENDPOINT_ROTATE_COOKIES)?,
            upload: Url::parse(constants::ENDPOINT_UPLOAD)?,
        })
    }
}

/// Configuration for the Gemini web client.
#[derive(Clone)]
pub struct GeminiWebConfig {
    /// `__Secure-1PSID` cookie (required).
    pub secure_1psid: SecretString,
    /// `__Secure-1PSIDTS` cookie; refreshed by rotation.
    pub secure_1psidts: Option<SecretString>,
    /// Whole-call bound for generate calls, connection plus full stream.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Run background cookie rotation after init.
    pub auto_refresh: bool,
    /// Interval between rotations.
    pub refresh_interval: Duration,
    /// Proxy for every outbound call.
    pub proxy: Option<Url>,
    /// Endpoint URLs.
    pub endpoints: Endpoints,
    /// Capacity of the streaming update channel.
    pub stream_buffer: usize,
}

impl std::fmt::Debug for GeminiWebConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiWebConfig")
            .field("secure_1psid", &"[REDACTED]")
            .field("secure_1psidts", &self.secure_1psidts.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("auto_refresh", &self.auto_refresh)
            .field("refresh_interval", &self.refresh_interval)
            .field("proxy", &self.proxy)
            .field("endpoints", &self.endpoints)
            .field("stream_buffer", &self.stream_buffer)
            .finish()
    }
}

impl GeminiWebConfig {
    /// Create a new configuration builder.
    pub fn builder() -> GeminiWebConfigBuilder {
        GeminiWebConfigBuilder::default()
    }

    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, GeminiWebError> {
        let secure_1psid = std::env::var("GEMINI_SECURE_1PSID")
            .map_err(|_| ConfigurationError::MissingSecure1Psid)?;

        let mut builder = Self::builder().secure_1psid(SecretString::new(secure_1psid));

        if let Ok(ts) = std::env::var("GEMINI_SECURE_1PSIDTS") {
            if !ts.is_empty() {
                builder = builder.secure_1psidts(SecretString::new(ts));
            }
        }

        if let Some(secs) = env_secs("GEMINI_TIMEOUT_SECS") {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Some(secs) = env_secs("GEMINI_REFRESH_INTERVAL_SECS") {
            builder = builder.refresh_interval(Duration::from_secs(secs));
        }

        if let Ok(proxy) = std::env::var("GEMINI_PROXY") {
            if !proxy.is_empty() {
                builder = builder.proxy(&proxy)?;
            }
        }

        builder.build()
    }
}

fn env_secs(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

/// Builder for GeminiWebConfig.
#[derive(Default)]
pub struct GeminiWebConfigBuilder {
    secure_1psid: Option<SecretString>,
    secure_1psidts: Option<SecretString>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    auto_refresh: Option<bool>,
    refresh_interval: Option<Duration>,
    proxy: Option<Url>,
    endpoints: Option<Endpoints>,
    stream_buffer: Option<usize>,
}

impl GeminiWebConfigBuilder {
    /// Set the `__Secure-1PSID` cookie.
    pub fn secure_1psid(mut self, value: SecretString) -> Self {
        self.secure_1psid = Some(value);
        self
    }

    /// Set the `__Secure-1PSIDTS` cookie.
    pub fn secure_1psidts(mut self, value: SecretString) -> Self {
        self.secure_1psidts = Some(value);
        self
    }

    /// Set the whole-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Enable or disable background cookie rotation.
    pub fn auto_refresh(mut self, enable: bool) -> Self {
        self.auto_refresh = Some(enable);
        self
    }

    /// Set the cookie rotation interval.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    /// Set the proxy URL.
    pub fn proxy(mut self, proxy: &str) -> Result<Self, GeminiWebError> {
        self.proxy = Some(Url::parse(proxy)?);
        Ok(self)
    }

    /// Override the endpoint URLs.
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Set the streaming channel capacity.
    pub fn stream_buffer(mut self, size: usize) -> Self {
        self.stream_buffer = Some(size);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<GeminiWebConfig, GeminiWebError> {
        let secure_1psid = self.secure_1psid
            .ok_or(ConfigurationError::MissingSecure1Psid)?;

        let refresh_interval = self.refresh_interval
            .unwrap_or(Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS));
        if refresh_interval < Duration::from_secs(MIN_ROTATION_INTERVAL_SECS) {
            return Err(ConfigurationError::InvalidConfiguration {
                message: format!(
                    "refresh_interval must be at least {MIN_ROTATION_INTERVAL_SECS} seconds"
                ),
            }
            .into());
        }

        let stream_buffer = self.stream_buffer.unwrap_or(DEFAULT_STREAM_BUFFER);
        if stream_buffer == 0 {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "stream_buffer must be greater than zero".to_string(),
            }
            .into());
        }

        let endpoints = match self.endpoints {
            Some(endpoints) => endpoints,
            None => Endpoints::production()?,
        };

        Ok(GeminiWebConfig {
            secure_1psid,
            secure_1psidts: self.secure_1psidts,
            timeout: self.timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            connect_timeout: self.connect_timeout.unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            auto_refresh: self.auto_refresh.unwrap_or(true),
            refresh_interval,
            proxy: self.proxy,
            endpoints,
            stream_buffer,
        })
    }
}
