//! Streaming support for the generate endpoint.
//!
//! A generate call answers with a `text/plain` body of length-prefixed frames.
//! Each frame wraps a JSON string holding the whole reply so far, so turning it
//! into usable updates takes four stages:
//!
//! - [`FrameDecoder`] splits the arbitrarily chunked body into JSON frames,
//!   carrying partial frames over to the next chunk
//! - [`ResponseProjector`] reads candidates, images and metadata out of each
//!   frame by fixed index paths
//! - [`DeltaTracker`] reduces each candidate's full-text snapshot to the text
//!   added since the previous update
//! - [`ContentStream`] runs the above on a background task and hands updates
//!   to the caller in arrival order
//!
//! ## Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use integrations_gemini_web::streaming::ContentStream;
//!
//! async fn print_stream(mut stream: ContentStream) {
//!     while let Some(update) = stream.next().await {
//!         match update {
//!             Ok(output) => print!("{}", output.text_delta()),
//!             Err(e) => eprintln!("stream failed: {e}"),
//!         }
//!     }
//! }
//! ```

mod delta;
mod frame_decoder;
mod orchestrator;
mod projector;

pub use delta::{clean_text, reconcile, CandidateDelta, DeltaTracker};
pub use frame_decoder::{extract_json_from_response, parse_frames, FrameDecoder};
pub use orchestrator::ContentStream;
pub(crate) use orchestrator::{Turn, TurnHook};
pub use projector::ResponseProjector;
