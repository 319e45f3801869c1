//! Incremental text reconstruction.
//!
//! Every update resends the whole text of a candidate, and its tail may still
//! change while the server settles markdown formatting. The functions here turn
//! successive snapshots into append-only deltas without flicker.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

#[allow(clippy::expect_used)]
static TRAILING_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\+[`*_~].*$").expect("valid escape pattern"));

const TRAILING_FENCE: &str = "\n```";

/// Whitespace and the ASCII punctuation used by markdown.
fn is_volatile(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r') || c.is_ascii_punctuation()
}

/// Removes transient tails from a non-final snapshot: an unclosed code fence
/// and trailing backslash-escaped formatting.
pub fn clean_text(text: &str) -> String {
    let text = text.strip_suffix(TRAILING_FENCE).unwrap_or(text);
    TRAILING_ESCAPE.replace(text, "").into_owned()
}

/// Reconciles a new snapshot with the text already sent.
///
/// Returns the delta to emit and the new accumulated text: the cleaned
/// snapshot, or the raw one when `is_final`.
pub fn reconcile(new_text: &str, last_sent: &str, is_final: bool) -> (String, String) {
    let new_clean = if is_final {
        new_text.to_string()
    } else {
        clean_text(new_text)
    };

    if let Some(delta) = new_clean.strip_prefix(last_sent) {
        return (delta.to_string(), new_clean);
    }

    let new_chars: Vec<char> = new_clean.chars().collect();
    let last_chars: Vec<char> = last_sent.chars().collect();

    let target = last_chars.iter().filter(|c| !is_volatile(**c)).count();

    let resume = if target == 0 {
        Some(0)
    } else {
        let mut seen = 0;
        new_chars.iter().position(|c| {
            if !is_volatile(*c) {
                seen += 1;
            }
            seen == target
        })
        .map(|i| i + 1)
    };

    let Some(resume) = resume else {
        // The snapshot shrank below what was sent; fall back to the common prefix.
        let common = new_chars
            .iter()
            .zip(&last_chars)
            .take_while(|(a, b)| a == b)
            .count();
        tracing::trace!(common, "Snapshot shorter than sent text; using common prefix");
        return (new_chars[common..].iter().collect(), new_clean);
    };

    // Volatile characters sent after the last content character.
    let tail_start = last_chars
        .iter()
        .rposition(|c| !is_volatile(*c))
        .map_or(0, |i| i + 1);
    let tail = &last_chars[tail_start..];

    let mut i = 0;
    let mut j = 0;
    while i < tail.len() && resume + j < new_chars.len() {
        let old = tail[i];
        let new = new_chars[resume + j];
        if old == new {
            i += 1;
            j += 1;
        } else if new == '\\' && new_chars.get(resume + j + 1) == Some(&old) {
            j += 2;
            i += 1;
        } else if old == '\\' && tail.get(i + 1) == Some(&new) {
            i += 2;
            j += 1;
        } else {
            break;
        }
    }

    let delta = new_chars[(resume + j).min(new_chars.len())..].iter().collect();
    (delta, new_clean)
}

/// Text and thoughts of one candidate after an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateDelta {
    /// Accumulated text.
    pub text: String,
    /// Text added by this update.
    pub text_delta: String,
    /// Accumulated thoughts; empty when the update carried none.
    pub thoughts: String,
    /// Thoughts added by this update.
    pub thoughts_delta: String,
}

/// Per-turn delta state.
///
/// Texts are keyed by candidate id, with the candidate's position as a fallback
/// for updates that momentarily carry no id.
#[derive(Debug, Default)]
pub struct DeltaTracker {
    texts: HashMap<String, String>,
    thoughts: HashMap<String, String>,
}

fn position_key(index: usize) -> String {
    format!("idx_{index}")
}

fn lookup<'a>(map: &'a HashMap<String, String>, rcid: &str, index: usize) -> &'a str {
    map.get(rcid)
        .filter(|s| !s.is_empty())
        .or_else(|| map.get(&position_key(index)))
        .map_or("", String::as_str)
}

fn store(map: &mut HashMap<String, String>, rcid: &str, index: usize, value: &str) {
    if !rcid.is_empty() {
        map.insert(rcid.to_string(), value.to_string());
    }
    map.insert(position_key(index), value.to_string());
}

impl DeltaTracker {
    /// Empty state for a new turn.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one candidate snapshot through the reconstructor and records it.
    pub fn apply(
        &mut self,
        rcid: &str,
        index: usize,
        text: &str,
        thoughts: Option<&str>,
        is_final: bool,
    ) -> CandidateDelta {
        let (text_delta, text) = reconcile(text, lookup(&self.texts, rcid, index), is_final);
        store(&mut self.texts, rcid, index, &text);

        let (thoughts_delta, thoughts) = match thoughts.filter(|t| !t.is_empty()) {
            Some(raw) => reconcile(raw, lookup(&self.thoughts, rcid, index), is_final),
            None => (String::new(), String::new()),
        };
        store(&mut self.thoughts, rcid, index, &thoughts);

        CandidateDelta {
            text,
            text_delta,
            thoughts,
            thoughts_delta,
        }
    }

    /// Text last sent for a candidate.
    pub fn last_text(&self, rcid: &str, index: usize) -> &str {
        lookup(&self.texts, rcid, index)
    }

    /// Forgets every candidate.
    pub fn reset(&mut self) {
        self.texts.clear();
        self.thoughts.clear();
    }
}
