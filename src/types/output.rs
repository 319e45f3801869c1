//! Model output: one update of a turn.

use serde::Serialize;
use super::candidate::Candidate;
use super::image::Image;
use super::metadata::ChatMetadata;

/// One update of a generate call: chat metadata plus every candidate seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelOutput {
    /// Chat metadata as of this update.
    pub metadata: ChatMetadata,
    /// Candidates of this update.
    pub candidates: Vec<Candidate>,
    /// Index of the chosen candidate.
    pub chosen: usize,
}

impl ModelOutput {
    /// The chosen candidate, if any.
    pub fn chosen_candidate(&self) -> Option<&Candidate> {
        self.candidates.get(self.chosen)
    }

    /// Text of the chosen candidate.
    pub fn text(&self) -> &str {
        self.chosen_candidate().map_or("", |c| c.text.as_str())
    }

    /// Text delta of the chosen candidate.
    pub fn text_delta(&self) -> &str {
        self.chosen_candidate().map_or("", |c| c.text_delta.as_str())
    }

    /// Thoughts of the chosen candidate.
    pub fn thoughts(&self) -> Option<&str> {
        self.chosen_candidate().and_then(Candidate::thoughts)
    }

    /// Thoughts delta of the chosen candidate.
    pub fn thoughts_delta(&self) -> &str {
        self.chosen_candidate().map_or("", |c| c.thoughts_delta.as_str())
    }

    /// Images of the chosen candidate.
    pub fn images(&self) -> Vec<Image> {
        self.chosen_candidate().map(Candidate::images).unwrap_or_default()
    }

    /// Id of the chosen candidate.
    pub fn rcid(&self) -> Option<&str> {
        self.chosen_candidate().map(|c| c.rcid.as_str())
    }

    /// Returns true once every candidate is complete.
    pub fn is_final(&self) -> bool {
        !self.candidates.is_empty() && self.candidates.iter().all(|c| c.is_final)
    }
}

impl std::fmt::Display for ModelOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(rcid: &str, text: &str) -> Candidate {
        Candidate {
            rcid: rcid.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_chosen_accessors() {
        let mut output = ModelOutput {
            metadata: ChatMetadata::new(),
            candidates: vec![candidate("rc_a", "first"), candidate("rc_b", "second")],
            chosen: 0,
        };
        assert_eq!(output.text(), "first");
        assert_eq!(output.rcid(), Some("rc_a"));

        output.chosen = 1;
        assert_eq!(output.text(), "second");
        assert_eq!(output.to_string(), "second");
    }

    #[test]
    fn test_empty_output() {
        let output = ModelOutput::default();
        assert_eq!(output.text(), "");
        assert!(output.rcid().is_none());
        assert!(output.images().is_empty());
        assert!(!output.is_final());
    }
}
