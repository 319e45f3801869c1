//! Error category types for granular error handling.

use std::time::Duration;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Error, Debug, Clone)]
pub enum ConfigurationError {
    #[error("Missing __Secure-1PSID cookie")]
    MissingSecure1Psid,

    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Authentication and session lifecycle errors.
#[derive(Error, Debug, Clone)]
pub enum AuthenticationError {
    #[error("Access token (SNlM0e) not found in landing page; cookies are likely invalid")]
    AccessTokenNotFound,

    #[error("Unauthorized (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Client is not initialized; call init() first")]
    NotInitialized,

    #[error("Session has expired; re-initialize with fresh cookies")]
    SessionExpired,

    #[error("Cookie rotation failed: {message}")]
    RotationFailed { message: String },
}

/// Caller-side request errors.
#[derive(Error, Debug, Clone)]
pub enum RequestError {
    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    #[error("Unknown model: {name}. Available models: {}", available.join(", "))]
    UnknownModel { name: String, available: Vec<String> },

    #[error("Candidate index {index} out of range ({count} candidates)")]
    InvalidCandidateIndex { index: usize, count: usize },

    #[error("No previous output to choose a candidate from")]
    NoPreviousOutput,

    #[error("Invalid file: {message}")]
    InvalidFile { message: String },

    #[error("Gem id cannot be empty")]
    InvalidGem,
}

/// Network-level errors.
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Stream interrupted: {message}")]
    StreamInterrupted { message: String },

    #[error("Call was cancelled")]
    Cancelled,
}

/// Server-side errors: non-success statuses and error codes embedded in frames.
#[derive(Error, Debug, Clone)]
pub enum ServerError {
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Temporary server error (code 1013); retry later")]
    TemporaryError,

    #[error("Usage limit exceeded for this model (code 1037)")]
    UsageLimitExceeded,

    #[error("Model is inconsistent with the chat history (code 1050)")]
    ModelInconsistent,

    #[error("Model header is invalid or the model is unavailable (code 1052)")]
    ModelHeaderInvalid,

    #[error("IP address temporarily blocked (code 1060)")]
    IpTemporarilyBlocked,

    #[error("Server reported error code {code}")]
    Unknown { code: i64 },
}

impl ServerError {
    /// Maps an error code reported inside a response frame.
    pub fn from_code(code: i64) -> Self {
        match code {
            1013 => ServerError::TemporaryError,
            1037 => ServerError::UsageLimitExceeded,
            1050 => ServerError::ModelInconsistent,
            1052 => ServerError::ModelHeaderInvalid,
            1060 => ServerError::IpTemporarilyBlocked,
            code => ServerError::Unknown { code },
        }
    }
}

/// File upload errors.
#[derive(Error, Debug, Clone)]
pub enum UploadError {
    #[error("Upload of {filename} failed with HTTP {status}")]
    Failed { filename: String, status: u16 },

    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },
}

/// Response decoding errors.
#[derive(Error, Debug, Clone)]
pub enum ResponseError {
    #[error("Call completed without producing any candidate")]
    EmptyResult,

    #[error("Unexpected response format: {message}")]
    UnexpectedFormat { message: String },
}

/// Resource lookup errors.
#[derive(Error, Debug, Clone)]
pub enum ResourceError {
    #[error("Gem not found: {key}")]
    GemNotFound { key: String },

    #[error("Gems have not been fetched yet")]
    GemsNotFetched,
}
