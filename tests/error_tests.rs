//! Error taxonomy as seen by callers.

use integrations_gemini_web::{
    map_http_status_with_body, AuthenticationError, GeminiWebError, NetworkError, RequestError,
    ServerError, TransportError,
};
use std::time::Duration;

#[test]
fn test_frame_error_codes() {
    let cases = [
        (1013, "Temporary server error (code 1013); retry later"),
        (1037, "Usage limit exceeded for this model (code 1037)"),
        (1050, "Model is inconsistent with the chat history (code 1050)"),
        (1052, "Model header is invalid or the model is unavailable (code 1052)"),
        (1060, "IP address temporarily blocked (code 1060)"),
        (42, "Server reported error code 42"),
    ];

    for (code, message) in cases {
        assert_eq!(ServerError::from_code(code).to_string(), message);
    }
}

#[test]
fn test_only_transient_failures_are_retryable() {
    let retryable = [
        GeminiWebError::Server(ServerError::TemporaryError),
        GeminiWebError::Network(NetworkError::Timeout {
            duration: Duration::from_secs(300),
        }),
        GeminiWebError::Network(NetworkError::StreamInterrupted {
            message: "reset".to_string(),
        }),
        map_http_status_with_body(503, b"unavailable"),
    ];
    for err in &retryable {
        assert!(err.is_retryable(), "{err} should be retryable");
    }

    let permanent = [
        GeminiWebError::Server(ServerError::UsageLimitExceeded),
        GeminiWebError::Server(ServerError::IpTemporarilyBlocked),
        GeminiWebError::Network(NetworkError::Cancelled),
        GeminiWebError::Request(RequestError::EmptyPrompt),
        map_http_status_with_body(404, b"not found"),
        map_http_status_with_body(401, b""),
    ];
    for err in &permanent {
        assert!(!err.is_retryable(), "{err} should not be retryable");
    }
}

#[test]
fn test_rejected_cookies_are_auth_failures() {
    let forbidden = map_http_status_with_body(403, b"<html>denied</html>");
    assert!(forbidden.is_auth_failure());
    assert!(forbidden.is_transport_failure());

    let expired = GeminiWebError::from(AuthenticationError::SessionExpired);
    assert!(expired.is_auth_failure());
    assert!(!expired.is_transport_failure());

    let not_initialized = GeminiWebError::from(AuthenticationError::NotInitialized);
    assert!(!not_initialized.is_auth_failure());
}

#[test]
fn test_transport_errors_map_to_categories() {
    let err: GeminiWebError = TransportError::Stream("eof".to_string()).into();
    assert!(matches!(
        err,
        GeminiWebError::Network(NetworkError::StreamInterrupted { ref message }) if message == "eof"
    ));

    let err: GeminiWebError = TransportError::Connection("refused".to_string()).into();
    assert!(matches!(err, GeminiWebError::Network(NetworkError::ConnectionFailed { .. })));

    let err: GeminiWebError = TransportError::Status {
        status: 500,
        body: "boom".to_string(),
    }
    .into();
    assert!(matches!(
        err,
        GeminiWebError::Server(ServerError::HttpStatus { status: 500, ref message }) if message == "boom"
    ));
}

#[test]
fn test_messages_name_the_problem() {
    let err = GeminiWebError::from(RequestError::InvalidCandidateIndex { index: 3, count: 2 });
    assert_eq!(
        err.to_string(),
        "Request error: Candidate index 3 out of range (2 candidates)"
    );
}
