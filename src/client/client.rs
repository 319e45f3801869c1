//! Main client implementation for the Gemini web frontend.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::auth::{extract_tokens, RotationTask, SessionManager, SessionStatus};
use crate::config::GeminiWebConfig;
use crate::error::{map_http_status_with_body, GeminiWebResult};
use crate::services::{
    BatchExecutor, ContentService, ContentServiceImpl, FilesService, FilesServiceImpl,
    GemsService, GemsServiceImpl, GenerateOptions,
};
use crate::streaming::ContentStream;
use crate::transport::{HttpTransport, RequestBuilder};
use crate::types::{Gem, GemJar, ModelOutput};

use super::builder::GeminiWebClientBuilder;
use super::chat::ChatSession;
use super::traits::GeminiWebApi;

struct ClientInner {
    config: GeminiWebConfig,
    transport: Arc<dyn HttpTransport>,
    session: Arc<SessionManager>,
    requests: RequestBuilder,
    content: ContentServiceImpl,
    files: Arc<FilesServiceImpl>,
    gems: GemsServiceImpl,
    rotation: Mutex<Option<RotationTask>>,
}

/// Client for the Gemini web frontend.
///
/// Cheap to clone; clones share the session, the cookie jar and the
/// request-id counter.
///
/// # Example
///
/// ```no_run
/// use integrations_gemini_web::{GeminiWebApi, GeminiWebClient, GenerateOptions};
/// use secrecy::SecretString;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GeminiWebClient::builder()
///     .secure_1psid(SecretString::new("your-cookie".into()))
///     .build()?;
/// client.init().await?;
///
/// let output = client.generate_content("Hello World!", GenerateOptions::new()).await?;
/// println!("{}", output.text());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GeminiWebClient {
    inner: Arc<ClientInner>,
}

impl GeminiWebClient {
    /// Creates a new client builder.
    pub fn builder() -> GeminiWebClientBuilder {
        GeminiWebClientBuilder::new()
    }

    /// Creates a client from environment variables.
    ///
    /// Reads `GEMINI_SECURE_1PSID` (required), `GEMINI_SECURE_1PSIDTS`,
    /// `GEMINI_TIMEOUT_SECS`, `GEMINI_REFRESH_INTERVAL_SECS` and `GEMINI_PROXY`.
    pub fn from_env() -> GeminiWebResult<Self> {
        Self::new(GeminiWebConfig::from_env()?)
    }

    /// Creates a client from a configuration object.
    pub fn new(config: GeminiWebConfig) -> GeminiWebResult<Self> {
        GeminiWebClientBuilder::from_config(config).build()
    }

    /// Creates a client from pre-constructed parts (used by builder).
    pub(super) fn from_parts(config: GeminiWebConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let session = Arc::new(SessionManager::new(&config));
        let requests = RequestBuilder::new(config.endpoints.clone(), Arc::clone(&session));
        let batch = BatchExecutor::new(Arc::clone(&transport), requests.clone(), Arc::clone(&session));
        let files = Arc::new(FilesServiceImpl::new(Arc::clone(&transport), requests.clone()));
        let content = ContentServiceImpl::new(
            &config,
            Arc::clone(&transport),
            Arc::clone(&session),
            batch.clone(),
            files.clone(),
        );

        Self {
            inner: Arc::new(ClientInner {
                gems: GemsServiceImpl::new(batch),
                config,
                transport,
                session,
                requests,
                content,
                files,
                rotation: Mutex::new(None),
            }),
        }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &GeminiWebConfig {
        &self.inner.config
    }

    /// Current session status.
    pub fn status(&self) -> SessionStatus {
        self.inner.session.status()
    }

    /// Snapshot of the session cookies.
    pub fn cookies(&self) -> BTreeMap<String, String> {
        self.inner.session.cookies()
    }

    /// Returns true while the cookie rotation task is running.
    pub fn is_rotating(&self) -> bool {
        self.inner
            .rotation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(false, |task| !task.is_finished())
    }

    /// Access the content generation service.
    pub fn content(&self) -> &dyn ContentService {
        &self.inner.content
    }

    pub(crate) fn content_service(&self) -> &ContentServiceImpl {
        &self.inner.content
    }

    /// Access the file upload service.
    pub fn files(&self) -> &dyn FilesService {
        self.inner.files.as_ref()
    }

    /// Access the gems service.
    pub fn gems(&self) -> &dyn GemsService {
        &self.inner.gems
    }

    fn replace_rotation(&self, task: Option<RotationTask>) -> Option<RotationTask> {
        let mut rotation = self.inner.rotation.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *rotation, task)
    }

    /// Stops rotation and drops the tokens. Cookies are kept.
    async fn reset_session(&self) {
        if let Some(task) = self.replace_rotation(None) {
            task.stop().await;
        }
        self.inner.session.reset();
    }
}

#[async_trait]
impl GeminiWebApi for GeminiWebClient {
    async fn init(&self) -> GeminiWebResult<()> {
        let inner = &self.inner;
        let response = inner.transport.send(inner.requests.init()).await?;
        inner.session.merge_set_cookies(&response.set_cookies);

        if !response.is_success() {
            tracing::error!(status = response.status, "Landing page request failed");
            self.reset_session().await;
            return Err(map_http_status_with_body(response.status, &response.body));
        }

        let tokens = match extract_tokens(&response.text()) {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::error!("Access token not found; the cookies were not accepted");
                self.reset_session().await;
                return Err(e.into());
            }
        };
        tracing::info!(
            build_label = tokens.build_label.is_some(),
            session_id = tokens.session_id.is_some(),
            "Gemini web client initialized"
        );
        inner.session.install_tokens(tokens);

        let task = inner.config.auto_refresh.then(|| {
            RotationTask::spawn(
                Arc::clone(&inner.transport),
                inner.requests.clone(),
                Arc::clone(&inner.session),
                inner.config.refresh_interval,
            )
        });
        if let Some(previous) = self.replace_rotation(task) {
            previous.stop().await;
        }
        Ok(())
    }

    async fn generate_content(
        &self,
        prompt: &str,
        options: GenerateOptions,
    ) -> GeminiWebResult<ModelOutput> {
        self.inner.content.generate(prompt, options).await
    }

    async fn generate_content_stream(
        &self,
        prompt: &str,
        options: GenerateOptions,
    ) -> GeminiWebResult<ContentStream> {
        self.inner.content.generate_stream(prompt, options).await
    }

    fn start_chat(&self) -> ChatSession {
        ChatSession::new(self.clone())
    }

    async fn fetch_gems(&self, include_hidden: bool, language: &str) -> GeminiWebResult<GemJar> {
        self.inner.gems.fetch_gems(include_hidden, language).await
    }

    async fn create_gem(&self, name: &str, prompt: &str, description: &str) -> GeminiWebResult<Gem> {
        self.inner.gems.create_gem(name, prompt, description).await
    }

    async fn update_gem(
        &self,
        gem_id: &str,
        name: &str,
        prompt: &str,
        description: &str,
    ) -> GeminiWebResult<Gem> {
        self.inner.gems.update_gem(gem_id, name, prompt, description).await
    }

    async fn delete_gem(&self, gem_id: &str) -> GeminiWebResult<()> {
        self.inner.gems.delete_gem(gem_id).await
    }

    async fn close(&self) {
        self.reset_session().await;
        tracing::info!("Gemini web client closed");
    }
}

impl std::fmt::Debug for GeminiWebClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiWebClient")
            .field("config", &"<redacted>")
            .field("status", &self.status())
            .finish()
    }
}

/// Create a client from configuration.
pub fn create_client(config: GeminiWebConfig) -> GeminiWebResult<Arc<dyn GeminiWebApi>> {
    let client = GeminiWebClient::new(config)?;
    Ok(Arc::new(client))
}

/// Create a client from environment variables.
pub fn create_client_from_env() -> GeminiWebResult<Arc<dyn GeminiWebApi>> {
    let config = GeminiWebConfig::from_env()?;
    create_client(config)
}
