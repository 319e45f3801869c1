//! Integration tests for frame decoding and streamed generate calls.

use bytes::Bytes;
use futures::StreamExt;
use integrations_gemini_web::fixtures::load_fixture;
use integrations_gemini_web::mocks::MockHttpTransport;
use integrations_gemini_web::streaming::{FrameDecoder, ResponseProjector};
use integrations_gemini_web::{
    GeminiWebApi, GeminiWebClient, GeminiWebError, GenerateOptions, ModelOutput, NetworkError,
    ServerError, TransportError,
};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds one frame with a correct UTF-16 length for `payload`.
fn frame(payload: &str) -> String {
    let body = format!("\n{payload}\n");
    format!("{}{body}", body.encode_utf16().count())
}

fn decode_all(chunks: &[&[u8]]) -> Vec<Value> {
    let mut decoder = FrameDecoder::new();
    let mut frames = Vec::new();
    for chunk in chunks {
        frames.extend(decoder.push(chunk));
    }
    frames.extend(decoder.finish());
    frames
}

/// Splits `data` into chunks of `size` bytes, ignoring char boundaries.
fn chunked(data: &str, size: usize) -> Vec<Bytes> {
    data.as_bytes()
        .chunks(size)
        .map(Bytes::copy_from_slice)
        .collect()
}

/// A client that has gone through init against the mock.
async fn initialized_client(transport: Arc<MockHttpTransport>) -> GeminiWebClient {
    transport.enqueue_text_response(200, &load_fixture("init/landing_page.html"));
    let client = GeminiWebClient::builder()
        .secure_1psid(SecretString::new("psid".into()))
        .auto_refresh(false)
        .transport(transport)
        .build()
        .unwrap();
    client.init().await.unwrap();
    client
}

fn concatenated_deltas(updates: &[ModelOutput], index: usize) -> String {
    updates
        .iter()
        .filter_map(|u| u.candidates.get(index))
        .map(|c| c.text_delta.as_str())
        .collect()
}

#[test]
fn test_fixture_decodes_the_same_at_every_split_point() {
    // Arrange
    let body = load_fixture("generate/two_candidates.txt");
    let bytes = body.as_bytes();
    let whole = decode_all(&[bytes]);

    // Act & Assert
    assert_eq!(whole.len(), 4);
    for split in 0..=bytes.len() {
        let (head, tail) = bytes.split_at(split);
        assert_eq!(decode_all(&[head, tail]), whole, "split at byte {split}");
    }
}

#[test]
fn test_fixture_projects_two_candidates() {
    // Arrange
    let frames = decode_all(&[load_fixture("generate/two_candidates.txt").as_bytes()]);
    let mut projector = ResponseProjector::new();

    // Act
    let updates: Vec<ModelOutput> = frames
        .iter()
        .filter_map(|f| projector.project(f, &BTreeMap::new()).unwrap())
        .collect();

    // Assert
    assert_eq!(updates.len(), 2);
    let last = &updates[1];
    assert!(last.is_final());
    assert_eq!(last.candidates.len(), 2);
    assert_eq!(last.candidates[0].text, "Hello World! \u{1F30D}");
    assert_eq!(last.candidates[1].text, "Hi there!");
    assert_eq!(last.metadata.cid(), Some("c_8f2a61d0"));
    assert_eq!(last.metadata.rid(), Some("r_44b1c9e7"));
    assert_eq!(last.metadata.rcid(), Some("rc_a1"));
    assert_eq!(last.metadata.context(), Some("ctx_9d3e"));
    assert_eq!(projector.context(), Some("ctx_9d3e"));
}

#[tokio::test]
async fn test_stream_updates_arrive_in_order() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    let client = initialized_client(Arc::clone(&transport)).await;
    transport.enqueue_streaming_response(chunked(&load_fixture("generate/two_candidates.txt"), 7));

    // Act
    let stream = client
        .generate_content_stream("Hello World!", GenerateOptions::new())
        .await
        .unwrap();
    let updates: Vec<ModelOutput> = stream.map(|u| u.unwrap()).collect().await;

    // Assert
    assert_eq!(updates.len(), 2);
    assert!(!updates[0].is_final());
    assert!(updates[1].is_final());
    assert_eq!(concatenated_deltas(&updates, 0), "Hello World! \u{1F30D}");
    assert_eq!(concatenated_deltas(&updates, 1), "Hi there!");
}

#[tokio::test]
async fn test_stream_failure_after_data_keeps_updates() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    let client = initialized_client(Arc::clone(&transport)).await;
    let inner = json!([null, ["c_1", "r_1"], null, null, [["rc_1", ["Partial"]]]]);
    let first = frame(&json!([["wrb.fr", null, inner.to_string()]]).to_string());
    transport.enqueue_streaming_chunks(vec![
        Ok(Bytes::from(format!(")]}}'\n{first}"))),
        Err(TransportError::Stream("connection reset".into())),
    ]);

    // Act
    let mut stream = client
        .generate_content_stream("hi", GenerateOptions::new())
        .await
        .unwrap();
    let first = stream.next().await.unwrap().unwrap();
    let failure = stream.next().await.unwrap().unwrap_err();
    let end = stream.next().await;

    // Assert
    assert_eq!(first.text(), "Partial");
    assert!(matches!(
        failure,
        GeminiWebError::Network(NetworkError::StreamInterrupted { .. })
    ));
    assert!(end.is_none());
}

#[tokio::test]
async fn test_server_error_code_ends_turn() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    let client = initialized_client(Arc::clone(&transport)).await;
    let error_frame = frame(
        &json!([["wrb.fr", null, null, null, null, [null, null, [[null, [1037]]]]]]).to_string(),
    );
    transport.enqueue_streaming_response(vec![Bytes::from(format!(")]}}'\n{error_frame}"))]);

    // Act
    let err = client
        .generate_content("hi", GenerateOptions::new())
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(err, GeminiWebError::Server(ServerError::UsageLimitExceeded)));
}

#[tokio::test]
async fn test_cancel_unblocks_stalled_stream() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    let client = initialized_client(Arc::clone(&transport)).await;
    let inner = json!([null, ["c_1", "r_1"], null, null, [["rc_1", ["Thinking"]]]]);
    let first = frame(&json!([["wrb.fr", null, inner.to_string()]]).to_string());
    transport.enqueue_stalled_stream(vec![Bytes::from(format!(")]}}'\n{first}"))]);

    // Act
    let mut stream = client
        .generate_content_stream("hi", GenerateOptions::new())
        .await
        .unwrap();
    let first = stream.next().await.unwrap().unwrap();
    stream.cancel();
    let cancelled = stream.next().await.unwrap().unwrap_err();

    // Assert
    assert_eq!(first.text(), "Thinking");
    assert!(stream.is_cancelled());
    assert!(matches!(cancelled, GeminiWebError::Network(NetworkError::Cancelled)));
    assert!(stream.next().await.is_none());
}

/// The `f.req` inner array of a recorded generate request.
fn sent_inner(transport: &MockHttpTransport, index: usize) -> Value {
    let body = transport.get_requests()[index].body.clone().unwrap();
    let f_req = url::form_urlencoded::parse(&body)
        .find(|(k, _)| k == "f.req")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    let f_req: Value = serde_json::from_str(&f_req).unwrap();
    serde_json::from_str(f_req[1].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_chat_keeps_token_from_trailing_frame() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    let client = initialized_client(Arc::clone(&transport)).await;
    let reply = json!([null, ["c_1", "r_1"], null, null, [["rc_1", ["Hello"], [2]]]]);
    let mut trailer = vec![Value::Null; 25];
    trailer[1] = json!(["c_1", "r_1"]);
    trailer.push(json!("ctx_token"));
    let body = format!(
        ")]}}'\n{}{}",
        frame(&json!([["wrb.fr", null, reply.to_string()]]).to_string()),
        frame(&json!([["wrb.fr", null, Value::Array(trailer).to_string()]]).to_string())
    );
    transport.enqueue_streaming_response(vec![Bytes::from(body.clone())]);
    transport.enqueue_streaming_response(vec![Bytes::from(body)]);
    let chat = client.start_chat();

    // Act
    let first = chat.send_message("Hi", Vec::new()).await.unwrap();
    chat.send_message("Again", Vec::new()).await.unwrap();

    // Assert
    assert_eq!(first.text(), "Hello");
    assert_eq!(first.metadata.context(), Some("ctx_token"));
    assert_eq!(chat.metadata().context(), Some("ctx_token"));
    // Request 0 is the landing page.
    assert_eq!(
        sent_inner(&transport, 2)[2],
        json!(["c_1", "r_1", "rc_1", null, null, null, null, null, null, "ctx_token"])
    );
}
