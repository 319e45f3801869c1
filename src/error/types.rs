//! Main error type for the Gemini web client.

use std::time::Duration;
use thiserror::Error;
use super::categories::*;
use crate::transport::TransportError;

/// Result type alias for Gemini web operations.
pub type GeminiWebResult<T> = Result<T, GeminiWebError>;

/// Top-level error type for the Gemini web client.
#[derive(Error, Debug, Clone)]
pub enum GeminiWebError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),
}

impl GeminiWebError {
    /// Returns true if a later identical call may succeed.
    ///
    /// The client itself never retries; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GeminiWebError::Network(NetworkError::Timeout { .. })
                | GeminiWebError::Network(NetworkError::ConnectionFailed { .. })
                | GeminiWebError::Network(NetworkError::StreamInterrupted { .. })
                | GeminiWebError::Server(ServerError::TemporaryError)
        ) || matches!(self, GeminiWebError::Server(ServerError::HttpStatus { status, .. }) if *status >= 500)
    }

    /// Returns true if the error came from a non-success HTTP status.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            GeminiWebError::Server(ServerError::HttpStatus { .. })
                | GeminiWebError::Authentication(AuthenticationError::Unauthorized { .. })
        )
    }

    /// Returns true if the session cookies are no longer accepted.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            GeminiWebError::Authentication(
                AuthenticationError::AccessTokenNotFound
                    | AuthenticationError::Unauthorized { .. }
                    | AuthenticationError::SessionExpired
            )
        )
    }
}

impl From<TransportError> for GeminiWebError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connection(message) => {
                GeminiWebError::Network(NetworkError::ConnectionFailed { message })
            }
            TransportError::Timeout => GeminiWebError::Network(NetworkError::Timeout {
                duration: Duration::from_secs(0), // Unknown actual duration
            }),
            TransportError::Request(message) => {
                GeminiWebError::Network(NetworkError::ConnectionFailed { message })
            }
            TransportError::Stream(message) => {
                GeminiWebError::Network(NetworkError::StreamInterrupted { message })
            }
            TransportError::Status { status, body } => {
                super::mapper::map_http_status_with_body(status, body.as_bytes())
            }
        }
    }
}

impl From<serde_json::Error> for GeminiWebError {
    fn from(err: serde_json::Error) -> Self {
        GeminiWebError::Response(ResponseError::UnexpectedFormat {
            message: err.to_string(),
        })
    }
}

impl From<url::ParseError> for GeminiWebError {
    fn from(err: url::ParseError) -> Self {
        GeminiWebError::Configuration(ConfigurationError::InvalidEndpoint {
            url: err.to_string(),
        })
    }
}
