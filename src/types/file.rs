//! File attachments.

use bytes::Bytes;
use rand::Rng;
use std::path::PathBuf;

/// A file to attach to a prompt.
#[derive(Debug, Clone)]
pub enum FileInput {
    /// A file on disk; uploaded under its base name.
    Path(PathBuf),
    /// In-memory contents.
    Bytes {
        /// File contents.
        data: Bytes,
        /// Upload name; a random `input_NNNNNNN.txt` when absent.
        filename: Option<String>,
    },
}

impl FileInput {
    /// A file on disk.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        FileInput::Path(path.into())
    }

    /// In-memory contents with a random upload name.
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        FileInput::Bytes {
            data: data.into(),
            filename: None,
        }
    }

    /// In-memory contents with an explicit upload name.
    pub fn named_bytes(data: impl Into<Bytes>, filename: impl Into<String>) -> Self {
        FileInput::Bytes {
            data: data.into(),
            filename: Some(filename.into()),
        }
    }
}

impl From<PathBuf> for FileInput {
    fn from(path: PathBuf) -> Self {
        FileInput::Path(path)
    }
}

impl From<&std::path::Path> for FileInput {
    fn from(path: &std::path::Path) -> Self {
        FileInput::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for FileInput {
    fn from(data: Vec<u8>) -> Self {
        FileInput::bytes(data)
    }
}

/// A file already uploaded, referenced from the generate payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Opaque reference returned by the upload endpoint.
    pub url: String,
    /// Name the file was uploaded under.
    pub filename: String,
}

/// Random upload name for in-memory files: `input_` plus seven digits.
pub(crate) fn random_file_name(extension: &str) -> String {
    let n: u32 = rand::thread_rng().gen_range(1_000_000..10_000_000);
    format!("input_{n}{extension}")
}
