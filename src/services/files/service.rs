//! Files service implementation.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use super::FilesService;
use super::validation::validate_file_input;
use crate::error::{GeminiWebResult, UploadError};
use crate::transport::{HttpTransport, RequestBuilder};
use crate::types::file::random_file_name;
use crate::types::{FileInput, UploadedFile};

/// Extension given to unnamed in-memory uploads.
const DEFAULT_EXTENSION: &str = ".txt";

/// Implementation of the files service.
pub struct FilesServiceImpl {
    transport: Arc<dyn HttpTransport>,
    requests: RequestBuilder,
}

impl FilesServiceImpl {
    /// Create a new files service instance.
    pub fn new(transport: Arc<dyn HttpTransport>, requests: RequestBuilder) -> Self {
        Self {
            transport,
            requests,
        }
    }

    /// Upload name and contents of a file.
    async fn resolve(file: &FileInput) -> GeminiWebResult<(String, Bytes)> {
        match file {
            FileInput::Path(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let data = tokio::fs::read(path).await.map_err(|e| UploadError::Io {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                Ok((name, Bytes::from(data)))
            }
            FileInput::Bytes { data, filename } => {
                let name = filename
                    .clone()
                    .unwrap_or_else(|| random_file_name(DEFAULT_EXTENSION));
                Ok((name, data.clone()))
            }
        }
    }
}

#[async_trait]
impl FilesService for FilesServiceImpl {
    async fn upload(&self, file: &FileInput) -> GeminiWebResult<UploadedFile> {
        validate_file_input(file)?;
        let (filename, data) = Self::resolve(file).await?;

        tracing::debug!(filename = %filename, size = data.len(), "Uploading file");
        let response = self
            .transport
            .send_multipart(self.requests.upload(&filename, data))
            .await?;

        if !response.is_success() {
            tracing::warn!(filename = %filename, status = response.status, "File upload failed");
            return Err(UploadError::Failed {
                filename,
                status: response.status,
            }
            .into());
        }

        Ok(UploadedFile {
            url: response.text().trim().to_string(),
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionManager;
    use crate::config::GeminiWebConfig;
    use crate::error::GeminiWebError;
    use crate::mocks::MockHttpTransport;
    use secrecy::SecretString;

    fn service(transport: Arc<MockHttpTransport>) -> FilesServiceImpl {
        let config = GeminiWebConfig::builder()
            .secure_1psid(SecretString::new("psid".into()))
            .build()
            .unwrap();
        let session = Arc::new(SessionManager::new(&config));
        FilesServiceImpl::new(transport, RequestBuilder::new(config.endpoints, session))
    }

    #[tokio::test]
    async fn test_upload_named_bytes() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_text_response(200, "/contrib_service/ttl_1d/abc\n");
        let files = service(Arc::clone(&transport));

        let uploaded = files
            .upload(&FileInput::named_bytes(&b"hello"[..], "hello.txt"))
            .await
            .unwrap();

        assert_eq!(uploaded.url, "/contrib_service/ttl_1d/abc");
        assert_eq!(uploaded.filename, "hello.txt");

        let upload = &transport.get_uploads()[0];
        assert_eq!(upload.field_name, "file");
        assert_eq!(upload.mime_type, "text/plain");
        assert_eq!(upload.headers.get("Push-ID").map(String::as_str), Some("feeds/mcudyrk2a4khkz"));
        assert!(!upload.headers.contains_key("Cookie"));
    }

    #[tokio::test]
    async fn test_unnamed_bytes_get_random_name() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_text_response(200, "/ref");
        let files = service(Arc::clone(&transport));

        let uploaded = files.upload(&FileInput::bytes(&b"x"[..])).await.unwrap();

        assert!(uploaded.filename.starts_with("input_"));
        assert!(uploaded.filename.ends_with(".txt"));
    }

    #[tokio::test]
    async fn test_failed_upload() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_text_response(500, "");
        let files = service(Arc::clone(&transport));

        let err = files
            .upload(&FileInput::named_bytes(&b"x"[..], "a.png"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GeminiWebError::Upload(UploadError::Failed { ref filename, status: 500 }) if filename == "a.png"
        ));
    }

    #[tokio::test]
    async fn test_missing_path_is_io_error() {
        let transport = Arc::new(MockHttpTransport::new());
        let files = service(Arc::clone(&transport));

        let err = files
            .upload(&FileInput::path("/definitely/not/here.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(err, GeminiWebError::Upload(UploadError::Io { .. })));
        transport.verify_request_count(0);
    }

    #[tokio::test]
    async fn test_upload_all_stops_at_first_failure() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_text_response(200, "/one");
        transport.enqueue_text_response(413, "");
        let files = service(Arc::clone(&transport));

        let inputs = vec![
            FileInput::named_bytes(&b"1"[..], "one.txt"),
            FileInput::named_bytes(&b"2"[..], "two.txt"),
            FileInput::named_bytes(&b"3"[..], "three.txt"),
        ];
        let err = files.upload_all(&inputs).await.unwrap_err();

        assert!(matches!(err, GeminiWebError::Upload(UploadError::Failed { status: 413, .. })));
        assert_eq!(transport.get_uploads().len(), 2);
    }
}
