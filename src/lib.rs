//! # Gemini Web Client
//!
//! Rust client for the Gemini web frontend, authenticated with browser cookies
//! instead of an API key.
//!
//! ## Features
//!
//! - Cookie-based sessions with access token mining and background cookie rotation
//! - Streaming replies decoded from the length-prefixed frame format, with
//!   append-only text deltas per candidate
//! - Multi-turn chats with candidate selection
//! - File attachments uploaded ahead of a turn
//! - Gem listing, creation, update and deletion
//! - Secure credential handling with `SecretString`
//! - Scripted mock transport for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use integrations_gemini_web::{GeminiWebApi, GeminiWebClient, GenerateOptions, Model};
//! use secrecy::SecretString;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GeminiWebClient::builder()
//!         .secure_1psid(SecretString::new("your-cookie".into()))
//!         .build()?;
//!     client.init().await?;
//!
//!     let options = GenerateOptions::new().with_model(Model::Gemini30Flash);
//!     let mut stream = client.generate_content_stream("Hello World!", options).await?;
//!     while let Some(update) = stream.next().await {
//!         print!("{}", update?.text_delta());
//!     }
//!
//!     let chat = client.start_chat();
//!     let reply = chat.send_message("Tell me a joke", Vec::new()).await?;
//!     println!("{}", reply.text());
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - `client` - Main client, builder, collaborator trait and chat sessions
//! - `config` - Configuration types and builder
//! - `auth` - Session state, cookie jar, token mining and cookie rotation
//! - `protocol` - Endpoints, procedure ids, payload slots and index paths
//! - `transport` - HTTP transport layer and request encoding
//! - `streaming` - Frame decoding, response projection, deltas and the turn driver
//! - `error` - Error types and taxonomy
//! - `types` - Candidates, images, gems, chat metadata and model output
//! - `services` - Service implementations (content, files, gems)

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod services;
pub mod streaming;
pub mod transport;
pub mod types;

// Development/testing modules - always available for integration tests
pub mod mocks;
pub mod fixtures;

// Re-exports for convenience
pub use auth::{SessionManager, SessionStatus};
pub use client::{
    create_client, create_client_from_env, ChatSession, GeminiWebApi, GeminiWebClient,
    GeminiWebClientBuilder,
};
pub use config::{
    Endpoints, GeminiWebConfig, GeminiWebConfigBuilder, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_STREAM_BUFFER, DEFAULT_TIMEOUT_SECS,
};
pub use error::{
    // Main error types
    GeminiWebError,
    GeminiWebResult,
    // Error categories
    AuthenticationError,
    ConfigurationError,
    NetworkError,
    RequestError,
    ResourceError,
    ResponseError,
    ServerError,
    UploadError,
    // Error mapping utilities
    map_http_status_with_body,
};
pub use protocol::Model;
pub use transport::{
    ChunkedStream, HttpMethod, HttpRequest, HttpResponse, HttpTransport, MultipartRequest,
    ReqwestTransport, StreamingResponse, TransportError,
};

// Type re-exports
pub use types::{
    Candidate, ChatMetadata, FileInput, Gem, GemJar, GeneratedImage, Image, ModelOutput,
    RpcCall, UploadedFile, WebImage,
};

// Service re-exports
pub use services::{ContentService, FilesService, GemsService, GenerateOptions};

// Streaming re-exports
pub use streaming::{ContentStream, FrameDecoder};
