//! Drives one generate call from request to ordered updates.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::auth::SessionManager;
use crate::error::{AuthenticationError, GeminiWebError, GeminiWebResult, NetworkError, ResponseError};
use crate::protocol::constants::metadata as slot;
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::ModelOutput;
use super::frame_decoder::FrameDecoder;
use super::projector::ResponseProjector;

/// Callback run with the last update of a turn that ended cleanly.
pub(crate) type TurnHook = Box<dyn FnOnce(&ModelOutput) + Send>;

/// One generate call ready to run.
pub(crate) struct Turn {
    pub transport: Arc<dyn HttpTransport>,
    pub session: Arc<SessionManager>,
    pub request: HttpRequest,
    pub timeout: Duration,
    pub buffer: usize,
    pub on_complete: Option<TurnHook>,
}

impl Turn {
    /// Spawns the producer task and returns the consumer end.
    pub fn spawn(self) -> ContentStream {
        let (tx, rx) = mpsc::channel(self.buffer.max(1));
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let Turn {
                transport,
                session,
                request,
                timeout,
                on_complete,
                ..
            } = self;

            let work = read_turn(transport.as_ref(), &session, request, tx);
            let result: GeminiWebResult<ModelOutput> = tokio::select! {
                () = token.cancelled() => {
                    tracing::debug!("Generate call cancelled");
                    Err(NetworkError::Cancelled.into())
                }
                result = tokio::time::timeout(timeout, work) => match result {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::debug!(?timeout, "Generate call timed out");
                        Err(NetworkError::Timeout { duration: timeout }.into())
                    }
                },
            };

            // The data channel is closed by now: `tx` went down with `work`.
            let outcome = match result {
                Ok(last) => {
                    session.mark_active();
                    if let Some(hook) = on_complete {
                        hook(&last);
                    }
                    Ok(())
                }
                Err(e) => {
                    if matches!(
                        e,
                        GeminiWebError::Authentication(AuthenticationError::Unauthorized { .. })
                    ) {
                        session.mark_expired();
                    }
                    Err(e)
                }
            };
            let _ = outcome_tx.send(outcome);
        });

        ContentStream {
            updates: rx,
            updates_closed: false,
            outcome: Some(outcome_rx),
            cancel,
        }
    }
}

/// Sends the request and forwards every projected update.
///
/// Returns the last update sent; a turn with none is [`ResponseError::EmptyResult`].
async fn read_turn(
    transport: &dyn HttpTransport,
    session: &SessionManager,
    request: HttpRequest,
    tx: mpsc::Sender<ModelOutput>,
) -> GeminiWebResult<ModelOutput> {
    let response = transport.send_streaming(request).await?;
    session.merge_set_cookies(&response.set_cookies);
    let cookies = session.cookies();

    let mut body = response.body;
    let mut decoder = FrameDecoder::new();
    let mut projector = ResponseProjector::new();
    let mut last = None;

    loop {
        let (frames, finished) = match body.next().await {
            Some(chunk) => (decoder.push(&chunk?), false),
            None => (decoder.finish(), true),
        };

        for frame in frames {
            let Some(update) = projector.project(&frame, &cookies)? else {
                continue;
            };
            last = Some(update.clone());
            if tx.send(update).await.is_err() {
                tracing::debug!("Update receiver dropped; stopping");
                return Err(NetworkError::Cancelled.into());
            }
        }

        if finished {
            break;
        }
    }

    let mut last = last.ok_or(ResponseError::EmptyResult)?;

    // The token often arrives in a trailing frame without candidates; hand it
    // out as one more update that adds no text.
    if let Some(context) = projector.context() {
        if last.metadata.context() != Some(context) {
            tracing::trace!("Continuation token arrived after the last update");
            last.metadata.set(slot::CONTEXT, Some(context.to_string()));
            for candidate in &mut last.candidates {
                candidate.text_delta.clear();
                candidate.thoughts_delta.clear();
            }
            if tx.send(last.clone()).await.is_err() {
                return Err(NetworkError::Cancelled.into());
            }
        }
    }
    Ok(last)
}

/// Ordered updates of one generate call.
///
/// Yields every update as soon as it is decoded. A failure is reported once,
/// after the last successfully decoded update; updates already yielded stay
/// valid. Dropping the stream cancels the call.
pub struct ContentStream {
    updates: mpsc::Receiver<ModelOutput>,
    updates_closed: bool,
    outcome: Option<oneshot::Receiver<GeminiWebResult<()>>>,
    cancel: CancellationToken,
}

impl ContentStream {
    /// Cancels the call; the stream ends with [`NetworkError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true once [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drains the stream and returns its last update.
    pub async fn collect_last(mut self) -> GeminiWebResult<ModelOutput> {
        let mut last = None;
        while let Some(update) = self.next().await {
            last = Some(update?);
        }
        last.ok_or_else(|| ResponseError::EmptyResult.into())
    }
}

impl std::fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStream")
            .field("updates_closed", &self.updates_closed)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Stream for ContentStream {
    type Item = GeminiWebResult<ModelOutput>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if !this.updates_closed {
            match this.updates.poll_recv(cx) {
                Poll::Ready(Some(update)) => return Poll::Ready(Some(Ok(update))),
                Poll::Ready(None) => this.updates_closed = true,
                Poll::Pending => return Poll::Pending,
            }
        }

        let Some(outcome) = this.outcome.as_mut() else {
            return Poll::Ready(None);
        };
        match Pin::new(outcome).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(result) => {
                this.outcome = None;
                match result {
                    Ok(Ok(())) => Poll::Ready(None),
                    Ok(Err(e)) => Poll::Ready(Some(Err(e))),
                    Err(_) => Poll::Ready(Some(Err(NetworkError::StreamInterrupted {
                        message: "generate task ended without an outcome".to_string(),
                    }
                    .into()))),
                }
            }
        }
    }
}

impl Drop for ContentStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
