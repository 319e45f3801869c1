//! Length-prefixed frame decoding.
//!
//! A generate response body looks like:
//!
//! ```text
//! )]}'
//!
//! 2345
//! [["wrb.fr",null,"[...]"]]
//! 57
//! [["di",123],["af.httprm",122,"-1",5]]
//! ```
//!
//! Each frame is a decimal length followed by its payload. The length counts
//! UTF-16 code units and starts at the newline right after the digits.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::ResponseError;
use crate::protocol::constants::XSSI_PREFIX;

#[allow(clippy::expect_used)]
static LENGTH_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\n").expect("valid length marker pattern"));

/// Decodes every complete frame at the start of `content`.
///
/// Returns the decoded values, with top-level arrays spliced in element by
/// element, and the unconsumed remainder. An incomplete trailing frame is left
/// in the remainder untouched. Payloads that are not valid JSON are dropped.
pub fn parse_frames(content: &str) -> (Vec<Value>, &str) {
    let mut frames = Vec::new();
    let mut pos = 0;

    loop {
        pos += leading_whitespace(&content[pos..]);
        if pos >= content.len() {
            break;
        }

        let Some(marker) = LENGTH_MARKER.captures(&content[pos..]) else {
            break;
        };
        let digits = &marker[1];
        let Ok(declared) = digits.parse::<usize>() else {
            tracing::debug!(marker = digits, "Frame length does not fit; waiting");
            break;
        };

        // The declared length includes the newline after the digits.
        let start = pos + digits.len();
        let Some(end) = utf16_span_end(&content[start..], declared) else {
            break;
        };
        let end = start + end;

        let chunk = content[start..end].trim();
        pos = end;
        if chunk.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(chunk) {
            Ok(Value::Array(items)) => frames.extend(items),
            Ok(value) => frames.push(value),
            Err(e) => {
                tracing::debug!(error = %e, length = declared, "Dropping malformed frame");
            }
        }
    }

    (frames, &content[pos..])
}

fn leading_whitespace(s: &str) -> usize {
    s.len() - s.trim_start_matches([' ', '\t', '\n', '\r']).len()
}

/// Byte offset in `s` at which `units` UTF-16 code units have been consumed.
///
/// `None` when `s` holds fewer units, or when the declared length ends inside
/// a surrogate pair: such a span cannot be consumed exactly, so the frame is
/// left undecoded.
fn utf16_span_end(s: &str, units: usize) -> Option<usize> {
    if units == 0 {
        return Some(0);
    }

    let mut counted = 0;
    for (offset, c) in s.char_indices() {
        counted += c.len_utf16();
        if counted == units {
            return Some(offset + c.len_utf8());
        }
        if counted > units {
            tracing::debug!(declared = units, "Frame length splits a surrogate pair");
            return None;
        }
    }
    None
}

/// Incremental decoder over an arbitrarily chunked byte stream.
///
/// Bytes are pushed as they arrive; complete frames come out in order and
/// everything else is carried into the next push. Splitting the same stream at
/// different boundaries yields the same frames.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    prefix_checked: bool,
}

impl FrameDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the frames it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.pending.extend_from_slice(chunk);
        self.drain_utf8(false);
        self.decode()
    }

    /// Final pass once no more bytes will arrive.
    ///
    /// Returns any frame still decodable from the buffer and discards the rest.
    pub fn finish(&mut self) -> Vec<Value> {
        self.drain_utf8(true);
        self.prefix_checked = true;
        let frames = self.decode();
        if !self.buffer.trim().is_empty() {
            tracing::debug!(leftover = self.buffer.len(), "Discarding undecodable stream tail");
        }
        self.buffer.clear();
        frames
    }

    /// Text buffered but not yet decoded.
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    fn decode(&mut self) -> Vec<Value> {
        if !self.strip_prefix() {
            return Vec::new();
        }

        let (frames, rest) = parse_frames(&self.buffer);
        let consumed = self.buffer.len() - rest.len();
        self.buffer.drain(..consumed);
        frames
    }

    /// Removes the anti-hijacking prefix once. Returns false while the buffer
    /// could still turn out to be the start of that prefix.
    fn strip_prefix(&mut self) -> bool {
        if self.prefix_checked {
            return true;
        }
        if self.buffer.starts_with(XSSI_PREFIX) {
            self.buffer.drain(..XSSI_PREFIX.len());
        } else if XSSI_PREFIX.starts_with(self.buffer.as_str()) {
            return false;
        }
        self.prefix_checked = true;
        true
    }

    /// Moves the valid UTF-8 prefix of `pending` into the text buffer.
    fn drain_utf8(&mut self, flush: bool) {
        while !self.pending.is_empty() {
            let (valid, invalid) = match std::str::from_utf8(&self.pending) {
                Ok(_) => (self.pending.len(), None),
                Err(e) => (e.valid_up_to(), Some(e.error_len())),
            };
            self.buffer
                .push_str(&String::from_utf8_lossy(&self.pending[..valid]));

            match invalid {
                None => {
                    self.pending.clear();
                }
                Some(Some(bad)) => {
                    self.buffer.push(char::REPLACEMENT_CHARACTER);
                    self.pending.drain(..valid + bad);
                }
                Some(None) if flush => {
                    self.buffer.push(char::REPLACEMENT_CHARACTER);
                    self.pending.clear();
                }
                Some(None) => {
                    self.pending.drain(..valid);
                    return;
                }
            }
        }
    }
}

/// Extracts the JSON parts of a non-streaming response body.
///
/// Batched RPC responses use the same framing as the generate stream. Bodies
/// that are not framed are read as a single JSON document, then as one JSON
/// value per line.
pub fn extract_json_from_response(text: &str) -> Result<Vec<Value>, ResponseError> {
    let body = text.strip_prefix(XSSI_PREFIX).unwrap_or(text).trim_start();

    let (frames, _) = parse_frames(body);
    if !frames.is_empty() {
        return Ok(frames);
    }

    // A single document, possibly behind a length marker that does not match it.
    let unmarked = LENGTH_MARKER
        .find(body)
        .map_or(body, |m| &body[m.end()..]);
    for document in [body, unmarked] {
        if let Ok(value) = serde_json::from_str::<Value>(document) {
            return Ok(match value {
                Value::Array(items) => items,
                other => vec![other],
            });
        }
    }

    let mut parts = Vec::new();
    let lines = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.bytes().all(|b| b.is_ascii_digit()));
    for line in lines {
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Array(items)) => parts.extend(items),
            Ok(value) => parts.push(value),
            Err(_) => continue,
        }
    }

    if parts.is_empty() {
        Err(ResponseError::UnexpectedFormat {
            message: "no JSON found in response body".to_string(),
        })
    } else {
        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Builds one frame with a correct UTF-16 length for `payload`.
    fn frame(payload: &str) -> String {
        let body = format!("\n{payload}\n");
        format!("{}{body}", body.encode_utf16().count())
    }

    #[test]
    fn test_single_frame() {
        let (frames, rest) = parse_frames("5\n\n[1]");
        assert_eq!(frames, vec![json!(1)]);
        assert_eq!(rest, "");
    }

    #[test]
    fn test_multiple_frames() {
        let (frames, rest) = parse_frames("5\n\n[1]\n5\n\n[2]");
        assert_eq!(frames, vec![json!(1), json!(2)]);
        assert_eq!(rest, "");
    }

    #[test]
    fn test_incomplete_frame_is_kept() {
        let (frames, rest) = parse_frames("5\n\n[1]10\n[2");
        assert_eq!(frames, vec![json!(1)]);
        assert_eq!(rest, "10\n[2");
    }

    #[test]
    fn test_marker_without_newline_waits() {
        let (frames, rest) = parse_frames("12");
        assert!(frames.is_empty());
        assert_eq!(rest, "12");
    }

    #[test]
    fn test_malformed_frame_is_dropped() {
        let input = format!("{}{}", frame("[not json"), frame("[\"ok\"]"));
        let (frames, rest) = parse_frames(&input);
        assert_eq!(frames, vec![json!("ok")]);
        assert_eq!(rest, "");
    }

    #[test]
    fn test_object_frame_is_appended() {
        let (frames, _) = parse_frames(&frame(r#"{"a":1}"#));
        assert_eq!(frames, vec![json!({"a": 1})]);
    }

    #[test]
    fn test_length_counts_utf16_units() {
        // "😀" is one char, four UTF-8 bytes and two UTF-16 units.
        let payload = "[\"😀\"]";
        let input = format!("{}[\"x\"]", frame(payload));
        let (frames, rest) = parse_frames(&input);
        assert_eq!(frames, vec![json!("😀")]);
        assert_eq!(rest, "[\"x\"]");
    }

    #[test]
    fn test_utf16_span_is_exact() {
        assert_eq!(utf16_span_end("a😀b", 1), Some(1));
        assert_eq!(utf16_span_end("a😀b", 3), Some(5));
        assert_eq!(utf16_span_end("a😀b", 4), Some(6));
        assert_eq!(utf16_span_end("a😀b", 5), None);
    }

    #[test]
    fn test_length_inside_surrogate_pair_is_not_consumed() {
        assert_eq!(utf16_span_end("a😀b", 2), None);

        // Declares 2 units: "\n" plus half of the emoji.
        let input = "2\n😀]\n";
        let (frames, rest) = parse_frames(input);
        assert!(frames.is_empty());
        assert_eq!(rest, input);
    }

    #[test]
    fn test_decoder_strips_prefix() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(format!(")]}}'\n\n{}", frame("[[1,2]]")).as_bytes());
        assert_eq!(frames, vec![json!([1, 2])]);
        assert_eq!(decoder.remainder(), "");
    }

    #[test]
    fn test_decoder_prefix_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b")]").is_empty());
        assert!(decoder.push(b"}'\n5\n").is_empty());
        assert_eq!(decoder.push(b"\n[1]"), vec![json!(1)]);
    }

    #[test]
    fn test_decoder_incremental_matches_one_shot() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"5\n").is_empty());
        assert_eq!(decoder.push(b"\n[1]"), vec![json!(1)]);
    }

    #[test]
    fn test_decoder_any_split_yields_same_frames() {
        let stream = format!(
            ")]}}'\n\n{}{}{}",
            frame(r#"[["wrb.fr",null,"[\"héllo 😀\"]"]]"#),
            frame("[broken"),
            frame(r#"[["di",42],["af.httprm",41,"-1",3]]"#),
        );
        let bytes = stream.as_bytes();

        let mut one_shot = FrameDecoder::new();
        let mut expected = one_shot.push(bytes);
        expected.extend(one_shot.finish());
        assert_eq!(expected.len(), 3);

        for split in 0..=bytes.len() {
            let mut decoder = FrameDecoder::new();
            let mut frames = decoder.push(&bytes[..split]);
            frames.extend(decoder.push(&bytes[split..]));
            frames.extend(decoder.finish());
            assert_eq!(frames, expected, "split at byte {split}");
        }
    }

    #[test]
    fn test_decoder_byte_at_a_time() {
        let stream = format!("{}{}", frame("[\"añb\"]"), frame("[\"𝄞\"]"));
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for byte in stream.as_bytes() {
            frames.extend(decoder.push(std::slice::from_ref(byte)));
        }
        frames.extend(decoder.finish());
        assert_eq!(frames, vec![json!("añb"), json!("𝄞")]);
    }

    #[test]
    fn test_finish_discards_incomplete_tail() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"99\n[1,2").is_empty());
        assert!(decoder.finish().is_empty());
        assert_eq!(decoder.remainder(), "");
    }

    #[test]
    fn test_extract_framed_batch_response() {
        let body = format!(")]}}'\n\n{}", frame(r#"[["wrb.fr","CNgdBe","[]",null,null,null,"system"]]"#));
        let parts = extract_json_from_response(&body).unwrap();
        assert_eq!(parts[0][0], json!("wrb.fr"));
        assert_eq!(parts[0][6], json!("system"));
    }

    #[test]
    fn test_extract_multiline_json_document() {
        let body = ")]}'\n[[\"wrb.fr\",\"BardGeneratorService\",\n\"some data\"\n]]";
        let parts = extract_json_from_response(body).unwrap();
        assert_eq!(parts[0][1], json!("BardGeneratorService"));
    }

    #[test]
    fn test_extract_document_with_wrong_length_marker() {
        let body = ")]}'\n1024\n[[\"wrb.fr\",\"BardGeneratorService\",[\n  [\"nested\"]\n],null]]";
        let parts = extract_json_from_response(body).unwrap();
        assert_eq!(parts[0][0], json!("wrb.fr"));
        assert_eq!(parts[0][2], json!([["nested"]]));
    }

    #[test]
    fn test_extract_line_delimited_fallback() {
        let body = ")]}'\n[[\"a\"]]\ngarbage\n[[\"b\"]]";
        let parts = extract_json_from_response(body).unwrap();
        assert_eq!(parts, vec![json!(["a"]), json!(["b"])]);
    }

    #[test]
    fn test_extract_nothing_is_error() {
        assert!(extract_json_from_response(")]}'\nnot json at all").is_err());
    }
}
