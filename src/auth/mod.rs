//! Session and cookie management for the web frontend.
//!
//! The web frontend authenticates with browser cookies rather than an API key:
//! the landing page is fetched with `__Secure-1PSID` (and optionally
//! `__Secure-1PSIDTS`) to mine an access token, and a background task keeps the
//! refresh cookie fresh.

mod cookies;
mod rotation;
mod session;
mod tokens;

pub use cookies::CookieJar;
pub use rotation::{rotate_cookies, RotationOutcome, RotationTask};
pub use session::{RequestContext, SessionManager, SessionStatus};
pub use tokens::{extract_tokens, SessionTokens};
