//! Batched RPC execution shared by the services.

use std::sync::Arc;

use crate::auth::SessionManager;
use crate::error::{map_http_status_with_body, GeminiWebError, GeminiWebResult};
use crate::protocol::constants::rpc;
use crate::transport::{HttpResponse, HttpTransport, RequestBuilder};
use crate::types::RpcCall;

/// Sends batched RPC calls and applies their side effects on the session.
#[derive(Clone)]
pub(crate) struct BatchExecutor {
    transport: Arc<dyn HttpTransport>,
    requests: RequestBuilder,
    session: Arc<SessionManager>,
}

impl BatchExecutor {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        requests: RequestBuilder,
        session: Arc<SessionManager>,
    ) -> Self {
        Self {
            transport,
            requests,
            session,
        }
    }

    /// Sends one batch and returns the successful response.
    ///
    /// Cookies set by the response are merged first. A 401 or 403 expires the
    /// session.
    pub async fn execute(&self, calls: &[RpcCall]) -> GeminiWebResult<HttpResponse> {
        let request = self.requests.batch_execute(calls)?;
        tracing::debug!(
            rpc_ids = %calls.iter().map(|c| c.rpc_id.as_str()).collect::<Vec<_>>().join(","),
            "Sending batched RPC call"
        );

        let response = self.transport.send(request).await?;
        self.session.merge_set_cookies(&response.set_cookies);

        if !response.is_success() {
            let error = map_http_status_with_body(response.status, &response.body);
            if let GeminiWebError::Authentication(_) = error {
                self.session.mark_expired();
            }
            tracing::warn!(status = response.status, "Batched RPC call failed");
            return Err(error);
        }

        self.session.mark_active();
        Ok(response)
    }

    /// Turns on activity recording, which the service requires before it
    /// accepts file attachments.
    pub async fn enable_activity(&self) -> GeminiWebResult<()> {
        self.execute(&[RpcCall::new(
            rpc::BARD_ACTIVITY,
            rpc::BARD_ACTIVITY_ENABLE_PAYLOAD,
        )])
        .await
        .map(|_| ())
    }
}
