//! Shared session state: tokens, cookies and request-id sequencing.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use rand::Rng;
use secrecy::{ExposeSecret, SecretString};

use crate::config::GeminiWebConfig;
use crate::error::{AuthenticationError, GeminiWebResult};
use crate::protocol::constants::{cookies, request_id};
use super::cookies::CookieJar;
use super::tokens::SessionTokens;

/// Lifecycle of a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No access token yet.
    Uninitialized,
    /// Access token mined; no call has completed yet.
    Initialized,
    /// At least one call completed with the current cookies.
    Active,
    /// The service rejected the cookies.
    Expired,
}

/// Everything one outbound call needs, captured atomically.
#[derive(Clone)]
pub struct RequestContext {
    /// Access token.
    pub access_token: SecretString,
    /// Build label.
    pub build_label: Option<String>,
    /// Session id.
    pub session_id: Option<String>,
    /// `Cookie` header value.
    pub cookie_header: String,
    /// Request id reserved for this call.
    pub request_id: u64,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("access_token", &"[REDACTED]")
            .field("build_label", &self.build_label)
            .field("session_id", &self.session_id)
            .field("cookie_header", &"[REDACTED]")
            .field("request_id", &self.request_id)
            .finish()
    }
}

struct SessionState {
    status: SessionStatus,
    tokens: Option<SessionTokens>,
    cookies: CookieJar,
    next_request_id: u64,
    last_rotation: Option<Instant>,
}

/// Owns the authentication cookies, the access token and the request-id counter.
///
/// All mutation happens under one lock, so a reader never observes a
/// half-applied cookie rotation and two concurrent calls never share an id.
pub struct SessionManager {
    state: RwLock<SessionState>,
}

impl SessionManager {
    /// Creates a session seeded with the configured cookies.
    pub fn new(config: &GeminiWebConfig) -> Self {
        let initial = rand::thread_rng().gen_range(request_id::INITIAL_MIN..=request_id::INITIAL_MAX);
        Self::with_initial_request_id(config, initial)
    }

    /// Creates a session with a fixed first request id.
    pub fn with_initial_request_id(config: &GeminiWebConfig, initial: u64) -> Self {
        let mut jar = CookieJar::new();
        jar.set(cookies::SECURE_1PSID, config.secure_1psid.expose_secret().as_str());
        if let Some(ts) = &config.secure_1psidts {
            jar.set(cookies::SECURE_1PSIDTS, ts.expose_secret().as_str());
        }

        Self {
            state: RwLock::new(SessionState {
                status: SessionStatus::Uninitialized,
                tokens: None,
                cookies: jar,
                next_request_id: initial,
                last_rotation: None,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current lifecycle status.
    pub fn status(&self) -> SessionStatus {
        self.read().status
    }

    /// Reserves the next request id.
    pub fn next_request_id(&self) -> u64 {
        let mut state = self.write();
        let id = state.next_request_id;
        state.next_request_id += request_id::STRIDE;
        tracing::trace!(request_id = id, "Allocated request id");
        id
    }

    /// Stores freshly mined tokens and moves to `Initialized`.
    pub fn install_tokens(&self, tokens: SessionTokens) {
        let mut state = self.write();
        state.tokens = Some(tokens);
        state.status = SessionStatus::Initialized;
    }

    /// Captures the tokens, cookies and a fresh request id for one call.
    pub fn request_context(&self) -> GeminiWebResult<RequestContext> {
        let mut state = self.write();
        let tokens = match (state.status, &state.tokens) {
            (SessionStatus::Expired, _) => return Err(AuthenticationError::SessionExpired.into()),
            (SessionStatus::Uninitialized, _) | (_, None) => {
                return Err(AuthenticationError::NotInitialized.into())
            }
            (_, Some(tokens)) => tokens.clone(),
        };

        let id = state.next_request_id;
        state.next_request_id += request_id::STRIDE;
        tracing::trace!(request_id = id, "Allocated request id");

        Ok(RequestContext {
            access_token: tokens.access_token,
            build_label: tokens.build_label,
            session_id: tokens.session_id,
            cookie_header: state.cookies.header_value(),
            request_id: id,
        })
    }

    /// `Cookie` header value for calls made outside a session (init, rotation).
    pub fn cookie_header(&self) -> String {
        self.read().cookies.header_value()
    }

    /// Returns one cookie value.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.read().cookies.get(name).map(str::to_string)
    }

    /// Copies every cookie currently held.
    pub fn cookies(&self) -> BTreeMap<String, String> {
        self.read().cookies.to_map()
    }

    /// Merges `Set-Cookie` headers, returning the names that were updated.
    pub fn merge_set_cookies(&self, headers: &[String]) -> Vec<String> {
        if headers.is_empty() {
            return Vec::new();
        }
        let mut state = self.write();
        headers
            .iter()
            .filter_map(|h| state.cookies.merge_set_cookie(h))
            .collect()
    }

    /// Records a successful call: `Initialized` becomes `Active`.
    pub fn mark_active(&self) {
        let mut state = self.write();
        if state.status == SessionStatus::Initialized {
            state.status = SessionStatus::Active;
        }
    }

    /// Records that the service rejected the cookies.
    pub fn mark_expired(&self) {
        let mut state = self.write();
        if state.status != SessionStatus::Uninitialized {
            tracing::warn!("Session cookies were rejected; session expired");
            state.status = SessionStatus::Expired;
        }
    }

    /// Drops the tokens and returns to `Uninitialized`. Cookies are kept.
    pub fn reset(&self) {
        let mut state = self.write();
        state.tokens = None;
        state.status = SessionStatus::Uninitialized;
    }

    /// Returns true when the last successful rotation is older than `min_interval`.
    pub fn rotation_due(&self, min_interval: Duration) -> bool {
        self.read()
            .last_rotation
            .map_or(true, |at| at.elapsed() >= min_interval)
    }

    /// Records a successful rotation.
    pub fn record_rotation(&self) {
        self.write().last_rotation = Some(Instant::now());
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("SessionManager")
            .field("status", &state.status)
            .field("cookies", &state.cookies)
            .field("next_request_id", &state.next_request_id)
            .finish_non_exhaustive()
    }
}
