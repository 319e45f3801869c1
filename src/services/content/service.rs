//! Content service implementation for generating and streaming replies.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::validation::validate_generate_request;
use super::{ContentService, GenerateOptions};
use crate::auth::SessionManager;
use crate::config::GeminiWebConfig;
use crate::error::GeminiWebResult;
use crate::services::batch::BatchExecutor;
use crate::services::files::FilesService;
use crate::streaming::{ContentStream, Turn, TurnHook};
use crate::transport::{GeneratePayload, HttpTransport, RequestBuilder};
use crate::types::{ChatMetadata, ModelOutput};

/// Implementation of the content service.
pub struct ContentServiceImpl {
    transport: Arc<dyn HttpTransport>,
    session: Arc<SessionManager>,
    requests: RequestBuilder,
    batch: BatchExecutor,
    files: Arc<dyn FilesService>,
    timeout: Duration,
    stream_buffer: usize,
}

impl ContentServiceImpl {
    pub(crate) fn new(
        config: &GeminiWebConfig,
        transport: Arc<dyn HttpTransport>,
        session: Arc<SessionManager>,
        batch: BatchExecutor,
        files: Arc<dyn FilesService>,
    ) -> Self {
        Self {
            requests: RequestBuilder::new(config.endpoints.clone(), Arc::clone(&session)),
            transport,
            session,
            batch,
            files,
            timeout: config.timeout,
            stream_buffer: config.stream_buffer,
        }
    }

    /// Uploads attachments and starts one turn.
    ///
    /// `metadata` continues an existing conversation. `on_complete` runs with
    /// the last update when the turn ends cleanly.
    pub(crate) async fn start_turn(
        &self,
        prompt: &str,
        options: &GenerateOptions,
        metadata: Option<&ChatMetadata>,
        on_complete: Option<TurnHook>,
    ) -> GeminiWebResult<ContentStream> {
        validate_generate_request(prompt, options)?;

        let uploaded = if options.files.is_empty() {
            Vec::new()
        } else {
            self.batch.enable_activity().await?;
            let uploaded = self.files.upload_all(&options.files).await?;
            self.batch.enable_activity().await?;
            uploaded
        };

        let payload = GeneratePayload {
            prompt,
            files: &uploaded,
            metadata,
            gem_id: options.gem.as_deref(),
        };
        let request = self.requests.generate(&payload, options.model)?;

        tracing::debug!(
            model = %options.model,
            files = uploaded.len(),
            gem = ?options.gem,
            continued = metadata.is_some(),
            "Starting generate call"
        );

        Ok(Turn {
            transport: Arc::clone(&self.transport),
            session: Arc::clone(&self.session),
            request,
            timeout: self.timeout,
            buffer: self.stream_buffer,
            on_complete,
        }
        .spawn())
    }
}

#[async_trait]
impl ContentService for ContentServiceImpl {
    async fn generate(&self, prompt: &str, options: GenerateOptions) -> GeminiWebResult<ModelOutput> {
        self.start_turn(prompt, &options, None, None)
            .await?
            .collect_last()
            .await
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        options: GenerateOptions,
    ) -> GeminiWebResult<ContentStream> {
        self.start_turn(prompt, &options, None, None).await
    }
}
