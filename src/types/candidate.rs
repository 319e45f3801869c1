//! Reply candidates.

use serde::Serialize;
use super::image::{GeneratedImage, Image, WebImage};

/// One alternative reply within a turn, as of the latest update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Candidate id.
    pub rcid: String,
    /// Text accumulated so far.
    pub text: String,
    /// Text added since the previous update for this candidate.
    pub text_delta: String,
    /// Thoughts accumulated so far; empty for models that do not reason.
    pub thoughts: String,
    /// Thoughts added since the previous update for this candidate.
    pub thoughts_delta: String,
    /// Images found on the web.
    pub web_images: Vec<WebImage>,
    /// Images generated by the model.
    pub generated_images: Vec<GeneratedImage>,
    /// True once the server marked the candidate complete.
    pub is_final: bool,
}

impl Candidate {
    /// Thoughts, if the model produced any.
    pub fn thoughts(&self) -> Option<&str> {
        (!self.thoughts.is_empty()).then_some(self.thoughts.as_str())
    }

    /// Web images followed by generated images.
    pub fn images(&self) -> Vec<Image> {
        self.web_images
            .iter()
            .cloned()
            .map(Image::Web)
            .chain(self.generated_images.iter().cloned().map(Image::Generated))
            .collect()
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let preview: String = self.text.chars().take(20).collect();
        let ellipsis = if self.text.chars().count() > 20 { "..." } else { "" };
        write!(
            f,
            "Candidate(rcid='{}', text='{preview}{ellipsis}', images={})",
            self.rcid,
            self.web_images.len() + self.generated_images.len()
        )
    }
}
