//! Model descriptors.

use std::fmt;
use crate::error::RequestError;
use super::constants::MODEL_HEADER_NAME;

/// A backend model variant, selected through a request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Model {
    /// Let the server pick; no header is sent.
    #[default]
    Unspecified,
    /// Gemini 3.0 Pro.
    Gemini30Pro,
    /// Gemini 3.0 Flash.
    Gemini30Flash,
    /// Gemini 3.0 Flash with thinking.
    Gemini30FlashThinking,
}

impl Model {
    /// All known models.
    pub const ALL: [Model; 4] = [
        Model::Unspecified,
        Model::Gemini30Pro,
        Model::Gemini30Flash,
        Model::Gemini30FlashThinking,
    ];

    /// Returns the model name.
    pub fn name(&self) -> &'static str {
        match self {
            Model::Unspecified => "unspecified",
            Model::Gemini30Pro => "gemini-3.0-pro",
            Model::Gemini30Flash => "gemini-3.0-flash",
            Model::Gemini30FlashThinking => "gemini-3.0-flash-thinking",
        }
    }

    /// Looks a model up by name.
    pub fn from_name(name: &str) -> Result<Self, RequestError> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| RequestError::UnknownModel {
                name: name.to_string(),
                available: Self::ALL.iter().map(|m| m.name().to_string()).collect(),
            })
    }

    /// Returns the headers selecting this model.
    pub fn headers(&self) -> Vec<(&'static str, &'static str)> {
        let value = match self {
            Model::Unspecified => return Vec::new(),
            Model::Gemini30Pro => {
                r#"[1,null,null,null,"9d8ca3786ebdfbea",null,null,0,[4],null,null,1]"#
            }
            Model::Gemini30Flash => {
                r#"[1,null,null,null,"fbb127bbb056c959",null,null,0,[4],null,null,1]"#
            }
            Model::Gemini30FlashThinking => {
                r#"[1,null,null,null,"5bf011840784117a",null,null,0,[4],null,null,1]"#
            }
        };
        vec![(MODEL_HEADER_NAME, value)]
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Model {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
