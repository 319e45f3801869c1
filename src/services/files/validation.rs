//! Validation of file attachments.

use crate::error::RequestError;
use crate::types::FileInput;

/// Checks that a file can be named on upload.
pub fn validate_file_input(file: &FileInput) -> Result<(), RequestError> {
    match file {
        FileInput::Path(path) => {
            if path.file_name().is_none() {
                return Err(RequestError::InvalidFile {
                    message: format!("{} has no file name", path.display()),
                });
            }
        }
        FileInput::Bytes {
            filename: Some(name),
            ..
        } => {
            if name.trim().is_empty() {
                return Err(RequestError::InvalidFile {
                    message: "file name cannot be empty".to_string(),
                });
            }
            if name.contains(['/', '\\']) {
                return Err(RequestError::InvalidFile {
                    message: format!("file name {name} contains a path separator"),
                });
            }
        }
        FileInput::Bytes { filename: None, .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_inputs() {
        assert!(validate_file_input(&FileInput::path("/tmp/report.pdf")).is_ok());
        assert!(validate_file_input(&FileInput::bytes(vec![1, 2, 3])).is_ok());
        assert!(validate_file_input(&FileInput::named_bytes(vec![1], "notes.txt")).is_ok());
    }

    #[test]
    fn test_path_without_file_name() {
        assert!(matches!(
            validate_file_input(&FileInput::path("/")),
            Err(RequestError::InvalidFile { .. })
        ));
    }

    #[test]
    fn test_bad_explicit_names() {
        assert!(validate_file_input(&FileInput::named_bytes(vec![1], "  ")).is_err());
        assert!(validate_file_input(&FileInput::named_bytes(vec![1], "a/b.txt")).is_err());
    }
}
