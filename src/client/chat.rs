//! Multi-turn conversations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{GeminiWebResult, RequestError};
use crate::protocol::constants::metadata::RCID;
use crate::protocol::Model;
use crate::services::GenerateOptions;
use crate::streaming::{ContentStream, TurnHook};
use crate::types::{ChatMetadata, FileInput, ModelOutput};

use super::client::GeminiWebClient;

#[derive(Debug, Default)]
struct ChatState {
    metadata: ChatMetadata,
    last_output: Option<ModelOutput>,
    model: Model,
    gem: Option<String>,
}

/// A conversation carried across turns.
///
/// Each clean turn replaces the metadata wholesale, so the next message
/// continues from the candidate the server (or [`choose_candidate`]) picked.
/// Clones share the same conversation.
///
/// [`choose_candidate`]: ChatSession::choose_candidate
#[derive(Clone)]
pub struct ChatSession {
    client: GeminiWebClient,
    state: Arc<Mutex<ChatState>>,
}

impl ChatSession {
    pub(crate) fn new(client: GeminiWebClient) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(ChatState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Uses `model` for later turns.
    pub fn with_model(self, model: Model) -> Self {
        self.state().model = model;
        self
    }

    /// Applies a gem to later turns.
    pub fn with_gem(self, gem_id: impl Into<String>) -> Self {
        self.state().gem = Some(gem_id.into());
        self
    }

    /// Resumes a conversation from saved metadata.
    pub fn with_metadata(self, metadata: ChatMetadata) -> Self {
        self.state().metadata = metadata;
        self
    }

    async fn start(&self, prompt: &str, files: Vec<FileInput>) -> GeminiWebResult<ContentStream> {
        let (options, metadata) = {
            let state = self.state();
            let mut options = GenerateOptions::new().with_files(files).with_model(state.model);
            options.gem = state.gem.clone();
            let metadata = (!state.metadata.is_empty()).then(|| state.metadata.clone());
            (options, metadata)
        };

        let shared = Arc::clone(&self.state);
        let hook: TurnHook = Box::new(move |last: &ModelOutput| {
            if last.candidates.is_empty() {
                return;
            }
            let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
            state.metadata = last.metadata.clone();
            state.last_output = Some(last.clone());
        });

        self.client
            .content_service()
            .start_turn(prompt, &options, metadata.as_ref(), Some(hook))
            .await
    }

    /// Sends a message and returns the last update of the reply.
    pub async fn send_message(
        &self,
        prompt: &str,
        files: Vec<FileInput>,
    ) -> GeminiWebResult<ModelOutput> {
        self.start(prompt, files).await?.collect_last().await
    }

    /// Sends a message and streams the reply.
    ///
    /// The conversation advances once the stream has ended cleanly.
    pub async fn send_message_stream(
        &self,
        prompt: &str,
        files: Vec<FileInput>,
    ) -> GeminiWebResult<ContentStream> {
        self.start(prompt, files).await
    }

    /// Continues the conversation from candidate `index` of the last reply.
    pub fn choose_candidate(&self, index: usize) -> GeminiWebResult<ModelOutput> {
        let mut state = self.state();
        let output = state
            .last_output
            .as_mut()
            .ok_or(RequestError::NoPreviousOutput)?;

        let count = output.candidates.len();
        let rcid = output
            .candidates
            .get(index)
            .map(|c| c.rcid.clone())
            .ok_or(RequestError::InvalidCandidateIndex { index, count })?;

        output.chosen = index;
        let output = output.clone();
        state.metadata.set(RCID, Some(rcid));
        Ok(output)
    }

    /// Conversation metadata.
    pub fn metadata(&self) -> ChatMetadata {
        self.state().metadata.clone()
    }

    /// Conversation id.
    pub fn cid(&self) -> Option<String> {
        self.state().metadata.cid().map(str::to_string)
    }

    /// Reply id.
    pub fn rid(&self) -> Option<String> {
        self.state().metadata.rid().map(str::to_string)
    }

    /// Chosen candidate id.
    pub fn rcid(&self) -> Option<String> {
        self.state().metadata.rcid().map(str::to_string)
    }

    /// Last reply of a clean turn.
    pub fn last_output(&self) -> Option<ModelOutput> {
        self.state().last_output.clone()
    }

    /// Model used for later turns.
    pub fn model(&self) -> Model {
        self.state().model
    }

    /// Gem applied to later turns.
    pub fn gem(&self) -> Option<String> {
        self.state().gem.clone()
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("ChatSession")
            .field("cid", &state.metadata.cid())
            .field("rid", &state.metadata.rid())
            .field("rcid", &state.metadata.rcid())
            .field("model", &state.model)
            .field("gem", &state.gem)
            .finish()
    }
}
