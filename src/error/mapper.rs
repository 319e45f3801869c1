//! Error mapping utilities for HTTP status codes.

use super::categories::*;
use super::types::GeminiWebError;

/// Longest body excerpt kept in an error message.
const MAX_BODY_EXCERPT: usize = 200;

/// Maps a non-success HTTP status and its response body to a `GeminiWebError`.
///
/// The web frontend answers with HTML or framed text rather than structured JSON
/// errors, so only the status decides the category; the body is kept as a short
/// excerpt for diagnostics.
pub fn map_http_status_with_body(status: u16, body: &[u8]) -> GeminiWebError {
    match status {
        401 | 403 => GeminiWebError::Authentication(AuthenticationError::Unauthorized { status }),
        _ => GeminiWebError::Server(ServerError::HttpStatus {
            status,
            message: body_excerpt(body),
        }),
    }
}

/// Returns the first characters of a response body, trimmed and on one line.
fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    let mut excerpt: String = text
        .chars()
        .take(MAX_BODY_EXCERPT)
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if text.chars().count() > MAX_BODY_EXCERPT {
        excerpt.push_str("...");
    }
    excerpt
}
