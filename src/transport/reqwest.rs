//! Reqwest-based HTTP transport implementation.

use super::http::{
    ChunkedStream, HttpMethod, HttpRequest, HttpResponse, HttpTransport, MultipartRequest,
    StreamingResponse,
};
use super::error::TransportError;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use futures::StreamExt;
use url::Url;

/// Reqwest-based HTTP transport.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a new reqwest transport with the given timeouts and optional proxy.
    pub fn new(
        timeout: Duration,
        connect_timeout: Duration,
        proxy: Option<&Url>,
    ) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout);

        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| TransportError::Connection(format!("Invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Convert HttpMethod to reqwest::Method.
    fn convert_method(&self, method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }

    /// Convert headers HashMap to reqwest::header::HeaderMap.
    fn convert_headers(&self, headers: HashMap<String, String>) -> reqwest::header::HeaderMap {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in headers {
            if let (Ok(name), Ok(val)) = (
                reqwest::header::HeaderName::from_bytes(key.as_bytes()),
                reqwest::header::HeaderValue::from_str(&value),
            ) {
                header_map.insert(name, val);
            }
        }
        header_map
    }

    /// Convert reqwest::header::HeaderMap to HashMap.
    fn extract_headers(&self, headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    /// Collect every Set-Cookie header; the HashMap above keeps only one.
    fn extract_set_cookies(&self, headers: &reqwest::header::HeaderMap) -> Vec<String> {
        headers
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect()
    }

    fn map_send_error(e: &reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Connection(e.to_string())
        }
    }

    async fn into_response(&self, response: reqwest::Response) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let headers = self.extract_headers(response.headers());
        let set_cookies = self.extract_set_cookies(response.headers());
        let body = response.bytes().await
            .map_err(|e| TransportError::Request(format!("Failed to read response body: {}", e)))?;

        Ok(HttpResponse {
            status,
            headers,
            set_cookies,
            body,
        })
    }

    fn build(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = self.convert_method(request.method);
        let headers = self.convert_headers(request.headers);

        let mut req_builder = self.client
            .request(method, &request.url)
            .headers(headers);

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }
        req_builder
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self.build(request)
            .send()
            .await
            .map_err(|e| Self::map_send_error(&e))?;

        self.into_response(response).await
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError> {
        let response = self.build(request)
            .send()
            .await
            .map_err(|e| Self::map_send_error(&e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.bytes().await
                .map_err(|e| TransportError::Request(format!("Failed to read error response: {}", e)))?;
            return Err(TransportError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let set_cookies = self.extract_set_cookies(response.headers());
        let stream = response.bytes_stream();
        let body: ChunkedStream = Box::pin(stream.map(|result| {
            result.map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Stream(e.to_string())
                }
            })
        }));

        Ok(StreamingResponse { set_cookies, body })
    }

    async fn send_multipart(&self, request: MultipartRequest) -> Result<HttpResponse, TransportError> {
        let part = reqwest::multipart::Part::bytes(request.data.to_vec())
            .file_name(request.file_name)
            .mime_str(&request.mime_type)
            .map_err(|e| TransportError::Request(format!("Invalid MIME type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part(request.field_name, part);

        let response = self.client
            .post(&request.url)
            .headers(self.convert_headers(request.headers))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::map_send_error(&e))?;

        self.into_response(response).await
    }
}
