//! `__Secure-1PSIDTS` cookie rotation.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::MIN_ROTATION_INTERVAL_SECS;
use crate::error::{AuthenticationError, GeminiWebResult};
use crate::protocol::constants::cookies;
use crate::transport::{HttpTransport, RequestBuilder};
use super::session::SessionManager;

/// Outcome of one rotation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The service issued a new `__Secure-1PSIDTS`.
    Rotated,
    /// The call succeeded without a new refresh cookie.
    Unchanged,
    /// The previous rotation is too recent.
    Throttled,
}

/// Calls the rotation endpoint once and merges the returned cookies.
///
/// A 401 marks the session expired. Rotation younger than 60 seconds is skipped.
pub async fn rotate_cookies(
    transport: &dyn HttpTransport,
    requests: &RequestBuilder,
    session: &SessionManager,
) -> GeminiWebResult<RotationOutcome> {
    if !session.rotation_due(Duration::from_secs(MIN_ROTATION_INTERVAL_SECS)) {
        return Ok(RotationOutcome::Throttled);
    }

    let response = transport.send(requests.rotate_cookies()).await?;

    if response.status == 401 {
        session.mark_expired();
        return Err(AuthenticationError::Unauthorized { status: 401 }.into());
    }
    if !response.is_success() {
        return Err(AuthenticationError::RotationFailed {
            message: format!("HTTP {}", response.status),
        }
        .into());
    }

    let updated = session.merge_set_cookies(&response.set_cookies);
    session.record_rotation();

    if updated.iter().any(|name| name == cookies::SECURE_1PSIDTS) {
        tracing::debug!("Rotated __Secure-1PSIDTS");
        Ok(RotationOutcome::Rotated)
    } else {
        tracing::debug!(cookies = updated.len(), "Rotation returned no new __Secure-1PSIDTS");
        Ok(RotationOutcome::Unchanged)
    }
}

/// Handle on the background rotation task.
#[derive(Debug)]
pub struct RotationTask {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RotationTask {
    /// Spawns a task rotating the cookies every `interval` until stopped.
    ///
    /// Failures are logged and retried on the next tick; a rejected session
    /// ends the task.
    pub fn spawn(
        transport: Arc<dyn HttpTransport>,
        requests: RequestBuilder,
        session: Arc<SessionManager>,
        interval: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; init has just authenticated.
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let result = tokio::select! {
                    () = token.cancelled() => break,
                    result = rotate_cookies(transport.as_ref(), &requests, &session) => result,
                };
                match result {
                    Ok(outcome) => tracing::debug!(?outcome, "Cookie rotation finished"),
                    Err(e) if e.is_auth_failure() => {
                        tracing::warn!(error = %e, "Cookie rotation rejected; stopping rotation");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Cookie rotation failed; retrying next interval");
                    }
                }
            }
            tracing::debug!("Cookie rotation task stopped");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Stops the task and waits for it to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Cookie rotation task ended abnormally");
            }
        }
    }

    /// Returns true once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for RotationTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::extract_tokens;
    use crate::config::GeminiWebConfig;
    use crate::error::GeminiWebError;
    use crate::mocks::MockHttpTransport;
    use secrecy::SecretString;

    fn setup() -> (Arc<SessionManager>, RequestBuilder) {
        let config = GeminiWebConfig::builder()
            .secure_1psid(SecretString::new("psid".into()))
            .secure_1psidts(SecretString::new("old".into()))
            .build()
            .unwrap();
        let session = Arc::new(SessionManager::new(&config));
        session.install_tokens(extract_tokens(r#""SNlM0e":"at""#).unwrap());
        let requests = RequestBuilder::new(config.endpoints, Arc::clone(&session));
        (session, requests)
    }

    #[tokio::test]
    async fn test_rotate_replaces_refresh_cookie() {
        let (session, requests) = setup();
        let transport = MockHttpTransport::new();
        transport.enqueue_response_with_cookies(
            200,
            "",
            vec!["__Secure-1PSIDTS=new; Path=/; Secure".to_string()],
        );

        let outcome = rotate_cookies(&transport, &requests, &session).await.unwrap();

        assert_eq!(outcome, RotationOutcome::Rotated);
        assert_eq!(session.cookie("__Secure-1PSIDTS").as_deref(), Some("new"));
        transport.verify_request(0, crate::transport::HttpMethod::Post, "RotateCookies");
        transport.verify_header(0, "Cookie", "__Secure-1PSID=psid; __Secure-1PSIDTS=old");
    }

    #[tokio::test]
    async fn test_rotate_throttled() {
        let (session, requests) = setup();
        let transport = MockHttpTransport::new();
        transport.enqueue_response_with_cookies(200, "", vec![]);

        let first = rotate_cookies(&transport, &requests, &session).await.unwrap();
        let second = rotate_cookies(&transport, &requests, &session).await.unwrap();

        assert_eq!(first, RotationOutcome::Unchanged);
        assert_eq!(second, RotationOutcome::Throttled);
        transport.verify_request_count(1);
    }

    #[tokio::test]
    async fn test_rotate_unauthorized_expires_session() {
        let (session, requests) = setup();
        let transport = MockHttpTransport::new();
        transport.enqueue_json_response(401, "");

        let err = rotate_cookies(&transport, &requests, &session).await.unwrap_err();

        assert!(err.is_auth_failure());
        assert_eq!(session.status(), crate::auth::SessionStatus::Expired);
    }

    #[tokio::test]
    async fn test_rotate_server_error_is_rotation_failure() {
        let (session, requests) = setup();
        let transport = MockHttpTransport::new();
        transport.enqueue_json_response(500, "");

        let err = rotate_cookies(&transport, &requests, &session).await.unwrap_err();

        assert!(matches!(
            err,
            GeminiWebError::Authentication(AuthenticationError::RotationFailed { .. })
        ));
        assert_eq!(session.cookie("__Secure-1PSIDTS").as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_rotation_task_stops_on_unauthorized() {
        let (session, requests) = setup();
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(401, "");

        let task = RotationTask::spawn(
            transport.clone(),
            requests,
            Arc::clone(&session),
            Duration::from_millis(10),
        );

        tokio::time::timeout(Duration::from_secs(5), async {
            while !task.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        transport.verify_request_count(1);
        assert_eq!(session.status(), crate::auth::SessionStatus::Expired);
    }

    #[tokio::test]
    async fn test_stop_abandons_rotation_in_flight() {
        let (session, requests) = setup();
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_stalled_response();

        let task = RotationTask::spawn(
            transport.clone(),
            requests,
            Arc::clone(&session),
            Duration::from_millis(10),
        );
        tokio::time::timeout(Duration::from_secs(5), async {
            while transport.get_requests().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        tokio::time::timeout(Duration::from_secs(1), task.stop())
            .await
            .unwrap();

        transport.verify_request_count(1);
        assert_eq!(session.cookie("__Secure-1PSIDTS").as_deref(), Some("old"));
    }
}
