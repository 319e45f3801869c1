//! Positional payload of the generate call.

use serde_json::{json, Value};
use crate::protocol::constants::payload::{CHAT_METADATA, GEM_ID, MESSAGE, SLOTS, SNAPSHOT_STREAMING};
use crate::types::{ChatMetadata, UploadedFile};

/// Inputs of one generate call, before serialization.
#[derive(Debug, Clone, Copy)]
pub struct GeneratePayload<'a> {
    /// User prompt.
    pub prompt: &'a str,
    /// Files uploaded ahead of the call.
    pub files: &'a [UploadedFile],
    /// Metadata of the conversation being continued; `None` starts a new one.
    pub metadata: Option<&'a ChatMetadata>,
    /// Gem applied to the turn.
    pub gem_id: Option<&'a str>,
}

impl GeneratePayload<'_> {
    /// The inner positional array.
    pub fn inner(&self) -> Value {
        let file_refs = if self.files.is_empty() {
            Value::Null
        } else {
            Value::Array(
                self.files
                    .iter()
                    .map(|f| json!([[f.url], f.filename]))
                    .collect(),
            )
        };

        let mut slots = vec![Value::Null; SLOTS];
        slots[MESSAGE] = json!([self.prompt, 0, null, file_refs, null, null, 0]);
        slots[CHAT_METADATA] = self
            .metadata
            .map_or_else(ChatMetadata::new_chat_payload, ChatMetadata::to_payload);
        slots[SNAPSHOT_STREAMING] = json!(1);
        if let Some(gem_id) = self.gem_id {
            slots[GEM_ID] = json!(gem_id);
        }
        Value::Array(slots)
    }

    /// Value of the `f.req` form field: `[null, "<inner JSON>"]`.
    pub fn to_form_value(&self) -> Result<String, serde_json::Error> {
        let inner = serde_json::to_string(&self.inner())?;
        serde_json::to_string(&json!([null, inner]))
    }
}
