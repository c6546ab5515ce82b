//! Input text validation
//!
//! Applied at the HTTP and CLI boundary before anything reaches the cache
//! or the job store. The trimmed text returned here is the text used from
//! then on, including as the cache key.

use crate::config::ValidationConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Field 'text' is required.")]
    Missing,

    #[error("Text must not be empty or whitespace.")]
    Blank,

    #[error("Text length must be between {min} and {max} characters (got {len}).")]
    OutOfBounds { len: usize, min: usize, max: usize },
}

/// Character bounds for submitted text
#[derive(Debug, Clone, Copy)]
pub struct TextRules {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for TextRules {
    fn default() -> Self {
        Self::from(&ValidationConfig::default())
    }
}

impl From<&ValidationConfig> for TextRules {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            min_chars: config.min_chars,
            max_chars: config.max_chars,
        }
    }
}

impl TextRules {
    /// Trim `text` and check it against the bounds
    pub fn validate(&self, text: &str) -> Result<String, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Blank);
        }

        let len = trimmed.chars().count();
        if len < self.min_chars || len > self.max_chars {
            return Err(ValidationError::OutOfBounds {
                len,
                min: self.min_chars,
                max: self.max_chars,
            });
        }

        Ok(trimmed.to_string())
    }

    /// Same as [`validate`](Self::validate), treating an absent value as an error
    pub fn validate_opt(&self, text: Option<&str>) -> Result<String, ValidationError> {
        match text {
            Some(text) => self.validate(text),
            None => Err(ValidationError::Missing),
        }
    }
}
