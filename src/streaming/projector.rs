//! Projection of decoded frames into model outputs.

use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ServerError;
use crate::protocol::constants::{metadata as slot, paths, CARD_CONTENT_PATTERN};
use crate::protocol::{get_array, get_i64, get_nested, get_non_empty_str, get_str};
use crate::types::image::generated_image_title;
use crate::types::{Candidate, ChatMetadata, GeneratedImage, ModelOutput, WebImage};
use super::delta::DeltaTracker;

#[allow(clippy::expect_used)]
static CARD_CONTENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(CARD_CONTENT_PATTERN).expect("valid card content pattern"));

/// Turns the frames of one turn into successive [`ModelOutput`] updates.
///
/// Holds the per-turn state: text history for deltas, the latest metadata and
/// the continuation token, which may arrive in a frame without candidates.
#[derive(Debug, Default)]
pub struct ResponseProjector {
    deltas: DeltaTracker,
    metadata: Option<ChatMetadata>,
    context: Option<String>,
}

impl ResponseProjector {
    /// Fresh state for a new turn.
    pub fn new() -> Self {
        Self::default()
    }

    /// Continuation token seen so far in this turn.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Projects one frame.
    ///
    /// Returns `Ok(None)` for frames that carry no candidate (keep-alives,
    /// trailers, metadata-only frames). A server error code aborts the turn.
    /// `cookies` is attached to generated images so they can be fetched later.
    pub fn project(
        &mut self,
        frame: &Value,
        cookies: &BTreeMap<String, String>,
    ) -> Result<Option<ModelOutput>, ServerError> {
        let Some(body) = get_str(frame, paths::FRAME_BODY) else {
            if let Some(code) = get_i64(frame, paths::FRAME_ERROR_CODE) {
                tracing::warn!(code, "Server reported an error for this turn");
                return Err(ServerError::from_code(code));
            }
            return Ok(None);
        };

        let body: Value = match serde_json::from_str(body) {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(error = %e, "Dropping frame with malformed inner body");
                return Ok(None);
            }
        };

        if let Some(value) = get_nested(&body, paths::BODY_METADATA) {
            if value.is_array() {
                self.metadata = Some(ChatMetadata::from_value(value));
            }
        }
        if let Some(context) = get_non_empty_str(&body, paths::BODY_CONTEXT) {
            self.context = Some(context.to_string());
        }

        let Some(entries) = get_array(&body, paths::BODY_CANDIDATES) else {
            return Ok(None);
        };

        let candidates: Vec<Candidate> = entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| self.project_candidate(entry, index, cookies))
            .collect();

        if candidates.is_empty() {
            return Ok(None);
        }

        let mut metadata = self.metadata.clone().unwrap_or_default();
        if metadata.rcid().is_none() {
            metadata.set(slot::RCID, Some(candidates[0].rcid.clone()));
        }
        if let Some(context) = &self.context {
            metadata.set(slot::CONTEXT, Some(context.clone()));
        }

        Ok(Some(ModelOutput {
            metadata,
            candidates,
            chosen: 0,
        }))
    }

    fn project_candidate(
        &mut self,
        entry: &Value,
        index: usize,
        cookies: &BTreeMap<String, String>,
    ) -> Option<Candidate> {
        let rcid = get_non_empty_str(entry, paths::CANDIDATE_RCID)?;

        let mut text = get_str(entry, paths::CANDIDATE_TEXT).unwrap_or_default();
        if CARD_CONTENT.is_match(text) {
            if let Some(card) = get_non_empty_str(entry, paths::CANDIDATE_CARD_TEXT) {
                text = card;
            }
        }
        // The frontend sends HTML-escaped text.
        let text = decode_html_entities(text);
        let thoughts = get_str(entry, paths::CANDIDATE_THOUGHTS).map(decode_html_entities);

        let is_final = get_array(entry, paths::CANDIDATE_DONE_MARKER).is_some()
            || get_i64(entry, paths::CANDIDATE_STATUS) == Some(paths::CANDIDATE_STATUS_DONE);

        let update = self
            .deltas
            .apply(rcid, index, &text, thoughts.as_deref(), is_final);

        Some(Candidate {
            rcid: rcid.to_string(),
            text: update.text,
            text_delta: update.text_delta,
            thoughts: update.thoughts,
            thoughts_delta: update.thoughts_delta,
            web_images: web_images(entry),
            generated_images: generated_images(entry, cookies),
            is_final,
        })
    }
}

fn web_images(entry: &Value) -> Vec<WebImage> {
    get_array(entry, paths::CANDIDATE_WEB_IMAGES)
        .into_iter()
        .flatten()
        .filter_map(|item| {
            let url = get_non_empty_str(item, paths::WEB_IMAGE_URL)?;
            Some(WebImage {
                url: url.to_string(),
                title: get_str(item, paths::WEB_IMAGE_TITLE).unwrap_or_default().to_string(),
                alt: get_str(item, paths::WEB_IMAGE_ALT).unwrap_or_default().to_string(),
            })
        })
        .collect()
}

fn generated_images(entry: &Value, cookies: &BTreeMap<String, String>) -> Vec<GeneratedImage> {
    get_array(entry, paths::CANDIDATE_GENERATED_IMAGES)
        .into_iter()
        .flatten()
        .filter_map(|item| {
            let url = get_non_empty_str(item, paths::GENERATED_IMAGE_URL)?;
            Some(GeneratedImage {
                url: url.to_string(),
                title: generated_image_title(get_i64(item, paths::GENERATED_IMAGE_NUMBER)),
                alt: get_str(item, paths::GENERATED_IMAGE_ALT).unwrap_or_default().to_string(),
                cookies: cookies.clone(),
            })
        })
        .collect()
}
