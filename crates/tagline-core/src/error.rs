//! Error types for Tagline.
//!
//! Configuration errors are fatal at startup. Inference errors are scoped to a
//! single prediction and never affect the shared tagger.

use thiserror::Error;

/// Top-level error type for Tagline operations.
#[derive(Error, Debug)]
pub enum TaglineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Model or scoring failures
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Unknown scoring strategy name
    #[error("Invalid strategy '{0}': choose 'zero-shot' or 'embeddings'")]
    InvalidStrategy(String),
}

/// Errors raised while scoring a description.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The description was empty or whitespace only
    #[error("Description text is empty")]
    EmptyText,

    /// The model collaborator failed to load or run
    #[error("Model error: {message}")]
    Model { message: String },

    /// Scoring a category produced unusable output
    #[error("Scoring failed for category '{category}': {message}")]
    Scoring { category: String, message: String },

    /// Inference did not finish in time
    #[error("Inference timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl InferenceError {
    /// Shorthand for a model error with a formatted message.
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model {
            message: message.into(),
        }
    }

    /// Shorthand for a scoring error in a named category.
    pub fn scoring(category: &str, message: impl Into<String>) -> Self {
        Self::Scoring {
            category: category.to_string(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for Tagline results.
pub type Result<T> = std::result::Result<T, TaglineError>;

/// Convenience type alias for inference results.
pub type InferenceResult<T> = std::result::Result<T, InferenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_strategy_message_names_choices() {
        let err = ConfigError::InvalidStrategy("bm25".to_string());
        let msg = err.to_string();
        assert!(msg.contains("bm25"));
        assert!(msg.contains("zero-shot"));
        assert!(msg.contains("embeddings"));
    }

    #[test]
    fn test_scoring_error_names_category() {
        let err = InferenceError::scoring("skills", "missing score");
        assert_eq!(
            err.to_string(),
            "Scoring failed for category 'skills': missing score"
        );
    }

    #[test]
    fn test_config_error_converts_to_top_level() {
        let err: TaglineError = ConfigError::ValidationError("top_n".into()).into();
        assert!(matches!(err, TaglineError::Config(_)));
    }
}
