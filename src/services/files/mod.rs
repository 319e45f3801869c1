//! File upload service.
//!
//! Files attached to a prompt are uploaded one by one ahead of the generate
//! call; the generate payload then refers to them by the opaque reference the
//! upload endpoint returns.

mod service;
mod validation;

use async_trait::async_trait;
use crate::error::GeminiWebResult;
use crate::types::{FileInput, UploadedFile};

pub use service::FilesServiceImpl;
pub use validation::validate_file_input;

/// Service for uploading prompt attachments.
#[async_trait]
pub trait FilesService: Send + Sync {
    /// Uploads one file and returns its reference.
    async fn upload(&self, file: &FileInput) -> GeminiWebResult<UploadedFile>;

    /// Uploads files in order, stopping at the first failure.
    async fn upload_all(&self, files: &[FileInput]) -> GeminiWebResult<Vec<UploadedFile>> {
        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            uploaded.push(self.upload(file).await?);
        }
        Ok(uploaded)
    }
}
