//! Request builder for the web frontend.
//!
//! This module provides the `RequestBuilder`, which encodes every outbound call:
//! the landing page fetch, batched RPC calls, the streaming generate call, cookie
//! rotation and file uploads.

use bytes::Bytes;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

use crate::auth::{RequestContext, SessionManager};
use crate::config::Endpoints;
use crate::error::GeminiWebResult;
use crate::protocol::constants::{
    HEADERS_GEMINI, HEADERS_ROTATE_COOKIES, HEADERS_UPLOAD, ROTATE_COOKIES_BODY, UPLOAD_FIELD_NAME,
};
use crate::protocol::Model;
use crate::types::RpcCall;
use super::http::{HttpMethod, HttpRequest, MultipartRequest};
use super::payload::GeneratePayload;

/// Builder for requests to the web frontend.
///
/// Tokens, cookies and request ids come from the shared [`SessionManager`];
/// each built request reserves its own request id.
#[derive(Clone)]
pub struct RequestBuilder {
    endpoints: Endpoints,
    session: Arc<SessionManager>,
}

impl RequestBuilder {
    /// Creates a new request builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use integrations_gemini_web::auth::SessionManager;
    /// use integrations_gemini_web::config::GeminiWebConfig;
    /// use integrations_gemini_web::transport::RequestBuilder;
    /// use secrecy::SecretString;
    ///
    /// let config = GeminiWebConfig::builder()
    ///     .secure_1psid(SecretString::new("psid".into()))
    ///     .build()
    ///     .unwrap();
    ///
    /// let session = Arc::new(SessionManager::new(&config));
    /// let builder = RequestBuilder::new(config.endpoints.clone(), session);
    /// let init = builder.init();
    /// ```
    pub fn new(endpoints: Endpoints, session: Arc<SessionManager>) -> Self {
        Self { endpoints, session }
    }

    /// Endpoint URLs in use.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn headers(defaults: &[(&str, &str)], cookie_header: &str) -> HashMap<String, String> {
        let mut headers: HashMap<String, String> = defaults
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        if !cookie_header.is_empty() {
            headers.insert("Cookie".to_string(), cookie_header.to_string());
        }
        headers
    }

    fn form_body(ctx: &RequestContext, f_req: &str) -> Bytes {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("at", ctx.access_token.expose_secret())
            .append_pair("f.req", f_req)
            .finish();
        Bytes::from(body)
    }

    fn append_session_params(url: &mut Url, ctx: &RequestContext) {
        let mut query = url.query_pairs_mut();
        if let Some(bl) = &ctx.build_label {
            query.append_pair("bl", bl);
        }
        if let Some(sid) = &ctx.session_id {
            query.append_pair("f.sid", sid);
        }
    }

    /// Authenticated GET of the landing page.
    pub fn init(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.endpoints.init.to_string(),
            headers: Self::headers(HEADERS_GEMINI, &self.session.cookie_header()),
            body: None,
        }
    }

    /// Cookie rotation call.
    pub fn rotate_cookies(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoints.rotate_cookies.to_string(),
            headers: Self::headers(HEADERS_ROTATE_COOKIES, &self.session.cookie_header()),
            body: Some(Bytes::from_static(ROTATE_COOKIES_BODY.as_bytes())),
        }
    }

    /// Batched RPC call.
    ///
    /// The body's `f.req` is a JSON array of `[rpcId, payload, null, identifier]`.
    pub fn batch_execute(&self, calls: &[RpcCall]) -> GeminiWebResult<HttpRequest> {
        let ctx = self.session.request_context()?;

        let rpc_ids = calls
            .iter()
            .map(|c| c.rpc_id.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let mut url = self.endpoints.batch_execute.clone();
        url.query_pairs_mut()
            .append_pair("rpcids", &rpc_ids)
            .append_pair("_reqid", &ctx.request_id.to_string())
            .append_pair("rt", "c")
            .append_pair("source-path", "/app");
        Self::append_session_params(&mut url, &ctx);

        let f_req = serde_json::to_string(&calls.iter().map(RpcCall::serialize).collect::<Vec<_>>())?;

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: url.to_string(),
            headers: Self::headers(HEADERS_GEMINI, &ctx.cookie_header),
            body: Some(Self::form_body(&ctx, &f_req)),
        })
    }

    /// Streaming generate call.
    pub fn generate(&self, payload: &GeneratePayload<'_>, model: Model) -> GeminiWebResult<HttpRequest> {
        let ctx = self.session.request_context()?;

        let mut url = self.endpoints.generate.clone();
        url.query_pairs_mut()
            .append_pair("_reqid", &ctx.request_id.to_string())
            .append_pair("rt", "c");
        Self::append_session_params(&mut url, &ctx);

        let mut headers = Self::headers(HEADERS_GEMINI, &ctx.cookie_header);
        for (name, value) in model.headers() {
            headers.insert(name.to_string(), value.to_string());
        }

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: url.to_string(),
            headers,
            body: Some(Self::form_body(&ctx, &payload.to_form_value()?)),
        })
    }

    /// Multipart upload of one file.
    pub fn upload(&self, file_name: &str, data: Bytes) -> MultipartRequest {
        MultipartRequest {
            url: self.endpoints.upload.to_string(),
            headers: Self::headers(HEADERS_UPLOAD, ""),
            field_name: UPLOAD_FIELD_NAME.to_string(),
            file_name: file_name.to_string(),
            mime_type: guess_mime(file_name).to_string(),
            data,
        }
    }
}

/// MIME type from a file extension; octet-stream when unknown.
fn guess_mime(file_name: &str) -> mime::Mime {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("bmp") => mime::IMAGE_BMP,
        Some("svg") => mime::IMAGE_SVG,
        Some("webp") => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        Some("pdf") => mime::APPLICATION_PDF,
        Some("json") => mime::APPLICATION_JSON,
        Some("csv") => mime::TEXT_CSV,
        Some("txt" | "md") => mime::TEXT_PLAIN,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}
