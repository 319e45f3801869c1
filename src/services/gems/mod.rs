//! Gem management service.

mod service;

use async_trait::async_trait;
use crate::error::GeminiWebResult;
use crate::types::{Gem, GemJar};

pub use service::GemsServiceImpl;

/// Service for listing and editing gems.
///
/// Listings are cached; the cache is also kept in step with local creates,
/// updates and deletes.
#[async_trait]
pub trait GemsService: Send + Sync {
    /// Fetches predefined and custom gems and replaces the cache.
    ///
    /// `include_hidden` adds predefined gems the web app does not show.
    async fn fetch_gems(&self, include_hidden: bool, language: &str) -> GeminiWebResult<GemJar>;

    /// Cached gems from the last fetch.
    fn gems(&self) -> GeminiWebResult<GemJar>;

    /// Finds a cached gem by id and/or name.
    fn get_gem(&self, id: Option<&str>, name: Option<&str>) -> GeminiWebResult<Gem>;

    /// Creates a custom gem.
    async fn create_gem(&self, name: &str, prompt: &str, description: &str) -> GeminiWebResult<Gem>;

    /// Replaces a custom gem's name, prompt and description.
    async fn update_gem(
        &self,
        gem_id: &str,
        name: &str,
        prompt: &str,
        description: &str,
    ) -> GeminiWebResult<Gem>;

    /// Deletes a custom gem.
    async fn delete_gem(&self, gem_id: &str) -> GeminiWebResult<()>;
}
