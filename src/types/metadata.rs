//! Ten-slot chat metadata.

use serde::Serialize;
use serde_json::Value;
use crate::protocol::constants::metadata::{CID, CONTEXT, RCID, RID, SLOTS};

/// Positional record identifying a conversation, its reply and the chosen candidate.
///
/// Always exactly ten slots: conversation id, reply id, chosen candidate id,
/// six reserved slots, and the continuation token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatMetadata {
    slots: [Option<String>; SLOTS],
}

impl ChatMetadata {
    /// Empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the string slots of a server metadata array; extra slots are ignored.
    pub fn from_value(value: &Value) -> Self {
        let mut metadata = Self::new();
        if let Some(list) = value.as_array() {
            for (slot, item) in metadata.slots.iter_mut().zip(list) {
                *slot = item.as_str().filter(|s| !s.is_empty()).map(str::to_string);
            }
        }
        metadata
    }

    /// Slot value.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.slots.get(index).and_then(|s| s.as_deref())
    }

    /// Sets a slot; out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, value: Option<String>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = value.filter(|v| !v.is_empty());
        }
    }

    /// All slots.
    pub fn slots(&self) -> &[Option<String>; SLOTS] {
        &self.slots
    }

    /// Conversation id.
    pub fn cid(&self) -> Option<&str> {
        self.get(CID)
    }

    /// Reply id.
    pub fn rid(&self) -> Option<&str> {
        self.get(RID)
    }

    /// Chosen candidate id.
    pub fn rcid(&self) -> Option<&str> {
        self.get(RCID)
    }

    /// Continuation token.
    pub fn context(&self) -> Option<&str> {
        self.get(CONTEXT)
    }

    /// Returns true when no slot is set.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Payload form for a continuing conversation: unset slots become `null`.
    pub fn to_payload(&self) -> Value {
        Value::Array(
            self.slots
                .iter()
                .map(|s| s.as_ref().map_or(Value::Null, |v| Value::String(v.clone())))
                .collect(),
        )
    }

    /// Payload form for a brand new conversation.
    pub fn new_chat_payload() -> Value {
        let mut slots = vec![Value::Null; SLOTS];
        for slot in [CID, RID, RCID, CONTEXT] {
            slots[slot] = Value::String(String::new());
        }
        Value::Array(slots)
    }
}
