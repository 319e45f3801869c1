//! Test fixtures for the Gemini web client.
//!
//! Captured wire payloads: the landing page, framed generate bodies and
//! batched RPC responses. All fixtures live next to this module.

use std::path::PathBuf;

/// Get the path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("src")
        .join("fixtures")
        .join(relative_path)
}

/// Load a fixture file as a string.
pub fn load_fixture(relative_path: &str) -> String {
    std::fs::read_to_string(fixture_path(relative_path))
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", relative_path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::extract_tokens;
    use crate::streaming::extract_json_from_response;

    #[test]
    fn test_fixture_path() {
        let path = fixture_path("generate/two_candidates.txt");
        assert!(path.to_string_lossy().contains("fixtures"));
        assert!(path.to_string_lossy().contains("generate"));
    }

    #[test]
    fn test_landing_page_fixture() {
        let tokens = extract_tokens(&load_fixture("init/landing_page.html")).unwrap();
        assert_eq!(tokens.session_id.as_deref(), Some("-3902512711396427013"));
        assert!(tokens.build_label.is_some());
    }

    #[test]
    fn test_gems_fixture_parts() {
        let parts = extract_json_from_response(&load_fixture("gems/list_response.txt")).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0][6], "system");
        assert_eq!(parts[1][6], "custom");
    }
}
