//! Token mining from the landing page.

use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::SecretString;
use crate::error::AuthenticationError;
use crate::protocol::constants::tokens;

static ACCESS_TOKEN_RE: Lazy<Regex> = Lazy::new(|| token_regex(tokens::ACCESS_TOKEN));
static BUILD_LABEL_RE: Lazy<Regex> = Lazy::new(|| token_regex(tokens::BUILD_LABEL));
static SESSION_ID_RE: Lazy<Regex> = Lazy::new(|| token_regex(tokens::SESSION_ID));

#[allow(clippy::expect_used)]
fn token_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("token pattern is a valid regex")
}

/// Tokens scraped from an authenticated landing page.
#[derive(Clone)]
pub struct SessionTokens {
    /// Access token (`SNlM0e`), sent as `at` on every call.
    pub access_token: SecretString,
    /// Build label (`cfb2h`), sent as `bl` when present.
    pub build_label: Option<String>,
    /// Session id (`FdrFJe`), sent as `f.sid` when present.
    pub session_id: Option<String>,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"[REDACTED]")
            .field("build_label", &self.build_label)
            .field("session_id", &self.session_id)
            .finish()
    }
}

fn capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extracts the access token and the auxiliary tokens from landing page HTML.
///
/// A missing access token means the cookies were not accepted.
pub fn extract_tokens(html: &str) -> Result<SessionTokens, AuthenticationError> {
    let access_token = capture(&ACCESS_TOKEN_RE, html)
        .filter(|t| !t.is_empty())
        .ok_or(AuthenticationError::AccessTokenNotFound)?;

    Ok(SessionTokens {
        access_token: SecretString::new(access_token),
        build_label: capture(&BUILD_LABEL_RE, html).filter(|s| !s.is_empty()),
        session_id: capture(&SESSION_ID_RE, html).filter(|s| !s.is_empty()),
    })
}
