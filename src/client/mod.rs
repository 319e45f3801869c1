//! Client interface and factory for the Gemini web frontend.
//!
//! Provides `GeminiWebClient` with its builder, the `GeminiWebApi` trait the
//! outer layers program against, and `ChatSession` for multi-turn use.

mod builder;
mod chat;
mod client;
mod traits;

// Re-export public API
pub use builder::GeminiWebClientBuilder;
pub use chat::ChatSession;
pub use client::{create_client, create_client_from_env, GeminiWebClient};
pub use traits::GeminiWebApi;
