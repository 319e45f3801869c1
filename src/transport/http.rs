//! Core HTTP transport abstractions for the Gemini web client.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::pin::Pin;
use futures::Stream;

use super::error::TransportError;

/// HTTP request for the transport layer.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request URL, query string included.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<Bytes>,
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
}

/// Multipart upload of a single file field.
#[derive(Debug, Clone)]
pub struct MultipartRequest {
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Form field name.
    pub field_name: String,
    /// File name sent with the part.
    pub file_name: String,
    /// MIME type of the part.
    pub mime_type: String,
    /// File contents.
    pub data: Bytes,
}

/// HTTP response from the transport layer.
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Every `Set-Cookie` header, in arrival order.
    pub set_cookies: Vec<String>,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Returns true for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body as lossily decoded text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Chunked stream for streaming responses.
pub type ChunkedStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Successful streaming response: cookies are available before the body is read.
pub struct StreamingResponse {
    /// Every `Set-Cookie` header, in arrival order.
    pub set_cookies: Vec<String>,
    /// Response body chunks.
    pub body: ChunkedStream,
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("set_cookies", &self.set_cookies.len())
            .finish_non_exhaustive()
    }
}

/// HTTP transport abstraction for testability.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request and receive the full response, whatever its status.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Send a request and receive its body as a chunk stream.
    ///
    /// A non-success status is returned as [`TransportError::Status`].
    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError>;

    /// Send a multipart upload and receive the full response, whatever its status.
    async fn send_multipart(&self, request: MultipartRequest) -> Result<HttpResponse, TransportError>;
}
