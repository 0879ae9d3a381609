//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tagger.top_n == 0 {
            return Err(ConfigError::ValidationError(
                "tagger.top_n must be > 0".into(),
            ));
        }
        if !self.zero_shot.hypothesis_template.contains("{}") {
            return Err(ConfigError::ValidationError(
                "zero_shot.hypothesis_template must contain '{}'".into(),
            ));
        }
        if self.zero_shot.max_length == 0 {
            return Err(ConfigError::ValidationError(
                "zero_shot.max_length must be > 0".into(),
            ));
        }
        if self.embedding.max_length == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.max_length must be > 0".into(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.batch_size must be > 0".into(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be > 0".into(),
            ));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "server.max_body_bytes must be > 0".into(),
            ));
        }
        if self.limits.inference_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.inference_timeout_ms must be > 0".into(),
            ));
        }
        self.taxonomy()?;
        Ok(())
    }
}
