//! Transport layer error types.

/// Transport error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Timeout")]
    Timeout,
    #[error("Request error: {0}")]
    Request(String),
    #[error("Stream error: {0}")]
    Stream(String),
    #[error("HTTP status {status}")]
    Status { status: u16, body: String },
}
