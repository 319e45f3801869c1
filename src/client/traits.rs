//! Client trait definitions for the Gemini web client.

use async_trait::async_trait;

use crate::error::GeminiWebResult;
use crate::services::GenerateOptions;
use crate::streaming::ContentStream;
use crate::types::{Gem, GemJar, ModelOutput};

use super::chat::ChatSession;

/// Operations the outer layers (CLI, HTTP server) build on.
#[async_trait]
pub trait GeminiWebApi: Send + Sync {
    /// Mines the access token from the landing page and starts cookie rotation.
    async fn init(&self) -> GeminiWebResult<()>;

    /// Generates a reply and returns the last update of the turn.
    async fn generate_content(
        &self,
        prompt: &str,
        options: GenerateOptions,
    ) -> GeminiWebResult<ModelOutput>;

    /// Generates a reply as an ordered stream of updates.
    async fn generate_content_stream(
        &self,
        prompt: &str,
        options: GenerateOptions,
    ) -> GeminiWebResult<ContentStream>;

    /// Starts a new conversation.
    fn start_chat(&self) -> ChatSession;

    /// Fetches and caches gems.
    async fn fetch_gems(&self, include_hidden: bool, language: &str) -> GeminiWebResult<GemJar>;

    /// Creates a custom gem.
    async fn create_gem(&self, name: &str, prompt: &str, description: &str) -> GeminiWebResult<Gem>;

    /// Updates a custom gem.
    async fn update_gem(
        &self,
        gem_id: &str,
        name: &str,
        prompt: &str,
        description: &str,
    ) -> GeminiWebResult<Gem>;

    /// Deletes a custom gem.
    async fn delete_gem(&self, gem_id: &str) -> GeminiWebResult<()>;

    /// Stops cookie rotation and drops the session tokens.
    async fn close(&self);
}
