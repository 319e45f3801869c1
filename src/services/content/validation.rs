//! Validation of generate calls.

use crate::error::RequestError;
use crate::services::files::validate_file_input;
use super::GenerateOptions;

/// Rejects blank prompts.
pub fn validate_prompt(prompt: &str) -> Result<(), RequestError> {
    if prompt.trim().is_empty() {
        return Err(RequestError::EmptyPrompt);
    }
    Ok(())
}

/// Validate a generate call before anything is sent.
pub fn validate_generate_request(prompt: &str, options: &GenerateOptions) -> Result<(), RequestError> {
    validate_prompt(prompt)?;
    for file in &options.files {
        validate_file_input(file)?;
    }
    if let Some(gem) = &options.gem {
        if gem.trim().is_empty() {
            return Err(RequestError::InvalidGem);
        }
    }
    Ok(())
}
