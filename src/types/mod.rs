//! Core types for the Gemini web client.
//!
//! Candidates, images, gems, chat metadata, batched RPC calls and the model
//! output handed to callers.

pub mod candidate;
pub mod file;
pub mod gem;
pub mod image;
pub mod metadata;
pub mod output;
pub mod rpc;

pub use candidate::Candidate;
pub use file::{FileInput, UploadedFile};
pub use gem::{Gem, GemJar};
pub use image::{GeneratedImage, Image, WebImage};
pub use metadata::ChatMetadata;
pub use output::ModelOutput;
pub use rpc::RpcCall;
