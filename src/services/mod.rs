//! Service implementations for the Gemini web frontend.

mod batch;
pub mod content;
pub mod files;
pub mod gems;

pub(crate) use batch::BatchExecutor;
pub use content::*;
pub use files::*;
pub use gems::*;
