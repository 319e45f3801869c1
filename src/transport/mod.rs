//! HTTP transport layer for the Gemini web client.

mod http;
mod error;
mod reqwest;
mod payload;
mod request;

pub use http::{
    ChunkedStream, HttpMethod, HttpRequest, HttpResponse, HttpTransport, MultipartRequest,
    StreamingResponse,
};
pub use error::TransportError;
pub use reqwest::ReqwestTransport;
pub use payload::GeneratePayload;
pub use request::RequestBuilder;
