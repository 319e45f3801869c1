//! Reverse-engineered protocol constants.
//!
//! Every endpoint, procedure id, header value and magic index path used to talk
//! to the web frontend lives here, so a change on the server side is a one-file
//! edit.

/// Landing page; mined for the access token and auxiliary tokens.
pub const ENDPOINT_INIT: &str = "https://gemini.google.com/app";

/// Streaming generate endpoint.
pub const ENDPOINT_GENERATE: &str =
    "https://gemini.google.com/_/BardChatUi/data/assistant.lamda.BardFrontendService/StreamGenerate";

/// Batched RPC endpoint.
pub const ENDPOINT_BATCH_EXECUTE: &str = "https://gemini.google.com/_/BardChatUi/data/batchexecute";

/// Cookie rotation endpoint.
pub const ENDPOINT_ROTATE_COOKIES: &str = "https://accounts.google.com/RotateCookies";

/// File upload endpoint.
pub const ENDPOINT_UPLOAD: &str = "https://content-push.googleapis.com/upload";

/// Anti-hijacking prefix in front of every framed response body.
pub const XSSI_PREFIX: &str = ")]}'";

/// Procedure ids for the batched RPC endpoint.
pub mod rpc {
    /// List gems.
    pub const LIST_GEMS: &str = "CNgdBe";
    /// Create a custom gem.
    pub const CREATE_GEM: &str = "oMH3Zd";
    /// Update a custom gem.
    pub const UPDATE_GEM: &str = "kHv0Vd";
    /// Delete a custom gem.
    pub const DELETE_GEM: &str = "UXcSJb";
    /// Toggle account activity settings.
    pub const BARD_ACTIVITY: &str = "ESY5D";

    /// Payload enabling activity recording, required before file uploads.
    pub const BARD_ACTIVITY_ENABLE_PAYLOAD: &str = r#"[[["bard_activity_enabled"]]]"#;

    /// Identifier used when a call does not name one.
    pub const DEFAULT_IDENTIFIER: &str = "generic";
}

/// Headers mimicking a browser tab on the web frontend.
pub const HEADERS_GEMINI: &[(&str, &str)] = &[
    ("Content-Type", "application/x-www-form-urlencoded;charset=utf-8"),
    ("Host", "gemini.google.com"),
    ("Origin", "https://gemini.google.com"),
    ("Referer", "https://gemini.google.com/"),
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36",
    ),
    ("X-Same-Domain", "1"),
];

/// Headers for the cookie rotation call.
pub const HEADERS_ROTATE_COOKIES: &[(&str, &str)] = &[("Content-Type", "application/json")];

/// Body of the cookie rotation call.
pub const ROTATE_COOKIES_BODY: &str = r#"[000,"-0000000000000000000"]"#;

/// Headers for the upload call.
pub const HEADERS_UPLOAD: &[(&str, &str)] = &[("Push-ID", "feeds/mcudyrk2a4khkz")];

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD_NAME: &str = "file";

/// Header selecting the backend model variant.
pub const MODEL_HEADER_NAME: &str = "x-goog-ext-525001261-jspb";

/// Cookie names.
pub mod cookies {
    /// Mandatory session cookie.
    pub const SECURE_1PSID: &str = "__Secure-1PSID";
    /// Refresh cookie replaced by rotation.
    pub const SECURE_1PSIDTS: &str = "__Secure-1PSIDTS";
}

/// Request id sequencing.
pub mod request_id {
    /// Lower bound (inclusive) of the random initial request id.
    pub const INITIAL_MIN: u64 = 10_000;
    /// Upper bound (inclusive) of the random initial request id.
    pub const INITIAL_MAX: u64 = 99_999;
    /// Increment applied on every call.
    pub const STRIDE: u64 = 100_000;
}

/// Positional layout of the generate request payload.
pub mod payload {
    /// Total number of slots in the inner request array.
    pub const SLOTS: usize = 69;
    /// Message content: `[prompt, 0, null, fileRefs, null, null, 0]`.
    pub const MESSAGE: usize = 0;
    /// Ten-slot chat metadata.
    pub const CHAT_METADATA: usize = 2;
    /// Snapshot streaming switch; set to `1`.
    pub const SNAPSHOT_STREAMING: usize = 7;
    /// Gem id.
    pub const GEM_ID: usize = 19;
}

/// Chat metadata slots.
pub mod metadata {
    /// Number of slots; always exactly this many.
    pub const SLOTS: usize = 10;
    /// Conversation id.
    pub const CID: usize = 0;
    /// Reply id.
    pub const RID: usize = 1;
    /// Chosen candidate id.
    pub const RCID: usize = 2;
    /// Continuation token.
    pub const CONTEXT: usize = 9;
}

/// Index paths into decoded response frames.
pub mod paths {
    /// Inner JSON string inside a generate frame.
    pub const FRAME_BODY: &[isize] = &[2];
    /// Server error code inside a generate frame.
    pub const FRAME_ERROR_CODE: &[isize] = &[5, 2, 0, 1, 0];

    /// Conversation/reply metadata inside the inner body.
    pub const BODY_METADATA: &[isize] = &[1];
    /// Candidate list inside the inner body.
    pub const BODY_CANDIDATES: &[isize] = &[4];
    /// Continuation token inside the inner body.
    pub const BODY_CONTEXT: &[isize] = &[25];

    /// Candidate id.
    pub const CANDIDATE_RCID: &[isize] = &[0];
    /// Candidate text.
    pub const CANDIDATE_TEXT: &[isize] = &[1, 0];
    /// Completion marker; finished when this is an array.
    pub const CANDIDATE_DONE_MARKER: &[isize] = &[2];
    /// Numeric status; finished when equal to [`CANDIDATE_STATUS_DONE`].
    pub const CANDIDATE_STATUS: &[isize] = &[8, 0];
    /// Web image list.
    pub const CANDIDATE_WEB_IMAGES: &[isize] = &[12, 1];
    /// Generated image list.
    pub const CANDIDATE_GENERATED_IMAGES: &[isize] = &[12, 7, 0];
    /// Alternate text used when the main text is a card-content placeholder.
    pub const CANDIDATE_CARD_TEXT: &[isize] = &[22, 0];
    /// Thoughts of reasoning-capable models.
    pub const CANDIDATE_THOUGHTS: &[isize] = &[37, 0, 0];

    /// Status value meaning the candidate is complete.
    pub const CANDIDATE_STATUS_DONE: i64 = 2;

    /// Web image url.
    pub const WEB_IMAGE_URL: &[isize] = &[0, 0, 0];
    /// Web image title.
    pub const WEB_IMAGE_TITLE: &[isize] = &[7, 0];
    /// Web image alt text.
    pub const WEB_IMAGE_ALT: &[isize] = &[0, 4];

    /// Generated image url.
    pub const GENERATED_IMAGE_URL: &[isize] = &[0, 3, 3];
    /// Generated image number.
    pub const GENERATED_IMAGE_NUMBER: &[isize] = &[3, 6];
    /// Generated image alt text.
    pub const GENERATED_IMAGE_ALT: &[isize] = &[3, 5, 0];

    /// Identifier of a batch response part (last element).
    pub const PART_IDENTIFIER: &[isize] = &[-1];
    /// Body string of a batch response part.
    pub const PART_BODY: &[isize] = &[2];
    /// Gem list inside a gem listing body.
    pub const GEMS_LIST: &[isize] = &[2];
    /// New gem id inside a gem creation body.
    pub const CREATED_GEM_ID: &[isize] = &[0];
}

/// Text of a candidate that only points at a card rendered elsewhere.
pub const CARD_CONTENT_PATTERN: &str = r"^http://googleusercontent\.com/card_content/\d+$";

/// Landing page token patterns.
pub mod tokens {
    /// Access token.
    pub const ACCESS_TOKEN: &str = r#""SNlM0e":\s*"(.*?)""#;
    /// Build label, sent as `bl`.
    pub const BUILD_LABEL: &str = r#""cfb2h":\s*"(.*?)""#;
    /// Session id, sent as `f.sid`.
    pub const SESSION_ID: &str = r#""FdrFJe":\s*"(.*?)""#;
}

/// Gem listing flavours.
pub mod gems {
    /// Predefined gems, visible ones only.
    pub const KIND_SYSTEM: u8 = 3;
    /// Predefined gems including hidden ones.
    pub const KIND_SYSTEM_HIDDEN: u8 = 4;
    /// User-created gems.
    pub const KIND_CUSTOM: u8 = 2;
    /// Identifier tagging the predefined listing.
    pub const IDENTIFIER_SYSTEM: &str = "system";
    /// Identifier tagging the custom listing.
    pub const IDENTIFIER_CUSTOM: &str = "custom";
}
