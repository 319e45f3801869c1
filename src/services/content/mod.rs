//! Content generation service.

mod service;
mod validation;

use async_trait::async_trait;
use crate::error::GeminiWebResult;
use crate::protocol::Model;
use crate::streaming::ContentStream;
use crate::types::{FileInput, ModelOutput};

pub use service::ContentServiceImpl;
pub use validation::{validate_generate_request, validate_prompt};

/// Per-call options of a generate call.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Files uploaded and attached to the prompt.
    pub files: Vec<FileInput>,
    /// Backend model variant.
    pub model: Model,
    /// Gem id applied to the turn.
    pub gem: Option<String>,
}

impl GenerateOptions {
    /// Options with no files, the default model and no gem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the attached files.
    pub fn with_files(mut self, files: impl IntoIterator<Item = FileInput>) -> Self {
        self.files = files.into_iter().collect();
        self
    }

    /// Attaches one more file.
    pub fn with_file(mut self, file: impl Into<FileInput>) -> Self {
        self.files.push(file.into());
        self
    }

    /// Selects the model.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Applies a gem by id.
    pub fn with_gem(mut self, gem_id: impl Into<String>) -> Self {
        self.gem = Some(gem_id.into());
        self
    }
}

/// Service for single-turn content generation.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Generates a reply and returns the last update of the turn.
    async fn generate(&self, prompt: &str, options: GenerateOptions) -> GeminiWebResult<ModelOutput>;

    /// Generates a reply as an ordered stream of updates.
    ///
    /// Attachments are uploaded before this returns, so an upload failure is
    /// reported here and no generate call is made.
    async fn generate_stream(
        &self,
        prompt: &str,
        options: GenerateOptions,
    ) -> GeminiWebResult<ContentStream>;
}
