//! Mock implementations for testing.
//!
//! This module provides a scripted `HttpTransport` for exercising the client
//! without touching the network: responses are queued up front and every
//! request is recorded for later assertions.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use futures::{stream, StreamExt};

use crate::transport::{
    ChunkedStream, HttpMethod, HttpRequest, HttpResponse, HttpTransport, MultipartRequest,
    StreamingResponse, TransportError,
};

/// A scripted streaming body.
struct MockStream {
    set_cookies: Vec<String>,
    chunks: Vec<Result<Bytes, TransportError>>,
    /// Never end after the last chunk; the reader blocks until cancelled.
    stall: bool,
}

/// A scripted reply to a regular or multipart call.
enum MockReply {
    Ready(Result<HttpResponse, TransportError>),
    /// Never completes; the caller blocks until it gives up.
    Stall,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock HTTP transport for testing.
///
/// Regular and multipart calls share one response queue, consumed in call
/// order; streaming calls have their own queue. Multipart calls are also
/// recorded as POST requests whose body is the uploaded data.
///
/// # Example
///
/// ```
/// use integrations_gemini_web::mocks::MockHttpTransport;
/// use integrations_gemini_web::transport::{HttpMethod, HttpRequest, HttpTransport};
/// use std::collections::HashMap;
///
/// # tokio_test::block_on(async {
/// let transport = MockHttpTransport::new();
/// transport.enqueue_text_response(200, "ok");
///
/// let request = HttpRequest {
///     method: HttpMethod::Get,
///     url: "https://example.com".to_string(),
///     headers: HashMap::new(),
///     body: None,
/// };
///
/// let response = transport.send(request).await.unwrap();
/// assert_eq!(response.status, 200);
/// transport.verify_request_count(1);
/// # });
/// ```
pub struct MockHttpTransport {
    responses: Arc<Mutex<VecDeque<MockReply>>>,
    streaming_responses: Arc<Mutex<VecDeque<Result<MockStream, TransportError>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    uploads: Arc<Mutex<Vec<MultipartRequest>>>,
}

impl MockHttpTransport {
    /// Create a new mock HTTP transport.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            streaming_responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Enqueue a response to be returned by the next request.
    pub fn enqueue_response(&self, response: Result<HttpResponse, TransportError>) {
        lock(&self.responses).push_back(MockReply::Ready(response));
    }

    /// Enqueue a reply that never arrives.
    pub fn enqueue_stalled_response(&self) {
        lock(&self.responses).push_back(MockReply::Stall);
    }

    /// Enqueue a response with the given status, body and `Set-Cookie` headers.
    pub fn enqueue_response_with_cookies(&self, status: u16, body: &str, set_cookies: Vec<String>) {
        self.enqueue_response(Ok(HttpResponse {
            status,
            headers: HashMap::new(),
            set_cookies,
            body: Bytes::from(body.to_string()),
        }));
    }

    /// Enqueue a plain text response.
    pub fn enqueue_text_response(&self, status: u16, body: &str) {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());

        self.enqueue_response(Ok(HttpResponse {
            status,
            headers,
            set_cookies: Vec::new(),
            body: Bytes::from(body.to_string()),
        }));
    }

    /// Enqueue a JSON response with the given status code and body.
    pub fn enqueue_json_response(&self, status: u16, body: &str) {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        self.enqueue_response(Ok(HttpResponse {
            status,
            headers,
            set_cookies: Vec::new(),
            body: Bytes::from(body.to_string()),
        }));
    }

    /// Enqueue an error response.
    pub fn enqueue_error(&self, error: TransportError) {
        self.enqueue_response(Err(error));
    }

    /// Enqueue a streaming response with multiple chunks.
    pub fn enqueue_streaming_response(&self, chunks: Vec<Bytes>) {
        self.enqueue_streaming_chunks(chunks.into_iter().map(Ok).collect());
    }

    /// Enqueue a streaming response whose chunks may fail part way through.
    pub fn enqueue_streaming_chunks(&self, chunks: Vec<Result<Bytes, TransportError>>) {
        lock(&self.streaming_responses).push_back(Ok(MockStream {
            set_cookies: Vec::new(),
            chunks,
            stall: false,
        }));
    }

    /// Enqueue a streaming response carrying `Set-Cookie` headers.
    pub fn enqueue_streaming_response_with_cookies(&self, chunks: Vec<Bytes>, set_cookies: Vec<String>) {
        lock(&self.streaming_responses).push_back(Ok(MockStream {
            set_cookies,
            chunks: chunks.into_iter().map(Ok).collect(),
            stall: false,
        }));
    }

    /// Enqueue a streaming response that never ends after its last chunk.
    pub fn enqueue_stalled_stream(&self, chunks: Vec<Bytes>) {
        lock(&self.streaming_responses).push_back(Ok(MockStream {
            set_cookies: Vec::new(),
            chunks: chunks.into_iter().map(Ok).collect(),
            stall: true,
        }));
    }

    /// Enqueue a streaming error.
    pub fn enqueue_streaming_error(&self, error: TransportError) {
        lock(&self.streaming_responses).push_back(Err(error));
    }

    /// Get all requests that were made.
    pub fn get_requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Get the last request that was made.
    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Get all multipart uploads that were made.
    pub fn get_uploads(&self) -> Vec<MultipartRequest> {
        lock(&self.uploads).clone()
    }

    /// Number of recorded requests whose URL contains `url_contains`.
    pub fn count_requests_to(&self, url_contains: &str) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|r| r.url.contains(url_contains))
            .count()
    }

    /// Verify that exactly `expected` requests were made.
    pub fn verify_request_count(&self, expected: usize) {
        let actual = lock(&self.requests).len();
        assert_eq!(actual, expected, "Expected {} requests, got {}", expected, actual);
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
        lock(&self.uploads).clear();
    }

    /// Verify that a request was made with the expected method and URL.
    pub fn verify_request(&self, index: usize, method: HttpMethod, url_contains: &str) {
        let requests = lock(&self.requests);
        assert!(index < requests.len(), "No request at index {}", index);

        let request = &requests[index];
        assert_eq!(request.method, method, "Expected method {:?}, got {:?}", method, request.method);
        assert!(
            request.url.contains(url_contains),
            "Expected URL to contain '{}', got '{}'",
            url_contains,
            request.url
        );
    }

    /// Verify that a request contains a specific header.
    pub fn verify_header(&self, index: usize, header_name: &str, header_value: &str) {
        let requests = lock(&self.requests);
        assert!(index < requests.len(), "No request at index {}", index);

        let request = &requests[index];
        let actual_value = request.headers.get(header_name);
        assert_eq!(
            actual_value,
            Some(&header_value.to_string()),
            "Expected header '{}' to be '{}', got {:?}",
            header_name,
            header_value,
            actual_value
        );
    }

    async fn next_response(&self) -> Result<HttpResponse, TransportError> {
        let reply = lock(&self.responses).pop_front();
        match reply {
            Some(MockReply::Ready(response)) => response,
            Some(MockReply::Stall) => std::future::pending().await,
            None => Err(TransportError::Connection(
                "No response configured in MockHttpTransport".into(),
            )),
        }
    }
}

impl Default for MockHttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request);
        self.next_response().await
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError> {
        lock(&self.requests).push(request);

        let mock = lock(&self.streaming_responses).pop_front().unwrap_or_else(|| {
            Err(TransportError::Connection(
                "No streaming response configured in MockHttpTransport".into(),
            ))
        })?;

        let chunks = stream::iter(mock.chunks);
        let body: ChunkedStream = if mock.stall {
            Box::pin(chunks.chain(stream::pending()))
        } else {
            Box::pin(chunks)
        };

        Ok(StreamingResponse {
            set_cookies: mock.set_cookies,
            body,
        })
    }

    async fn send_multipart(&self, request: MultipartRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(HttpRequest {
            method: HttpMethod::Post,
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: Some(request.data.clone()),
        });
        lock(&self.uploads).push(request);
        self.next_response().await
    }
}
