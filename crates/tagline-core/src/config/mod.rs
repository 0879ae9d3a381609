//! Configuration management for Tagline.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. All config structs implement `Default`.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use crate::taxonomy::TagTaxonomy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Tagline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Tagger settings
    pub tagger: TaggerConfig,

    /// Zero-shot classifier settings
    pub zero_shot: ZeroShotConfig,

    /// Embedding encoder settings
    pub embedding: EmbeddingConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Optional taxonomy override
    pub taxonomy: TaxonomyConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.tagline.tagline/config.toml
    /// - Linux: ~/.config/tagline/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\tagline\config\config.toml
    ///
    /// Falls back to ~/.tagline/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "tagline", "tagline")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".tagline").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.general.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Directory holding the model for the given strategy.
    pub fn strategy_model_dir(&self, strategy: Strategy) -> PathBuf {
        let name = match strategy {
            Strategy::ZeroShot => &self.zero_shot.model,
            Strategy::Embeddings => &self.embedding.model,
        };
        self.model_dir().join(name)
    }

    /// Build the active taxonomy: the configured override, or the built-in one.
    pub fn taxonomy(&self) -> Result<TagTaxonomy, ConfigError> {
        if self.taxonomy.categories.is_empty() {
            Ok(TagTaxonomy::volunteer())
        } else {
            TagTaxonomy::new(self.taxonomy.categories.clone())
        }
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tagger.strategy, Strategy::ZeroShot);
        assert_eq!(config.tagger.top_n, 2);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.zero_shot.hypothesis_template, "This example is {}.");
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[tagger]"));
        assert!(toml.contains("strategy = \"zero-shot\""));
        assert!(toml.contains("[server]"));
    }

    #[test]
    fn test_default_toml_round_trips_through_validation() {
        let toml = Config::default().to_toml().unwrap();
        let parsed = Config::from_toml(&toml).unwrap();
        assert_eq!(parsed.tagger.top_n, 2);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml("[tagger]\nstrategy = \"embeddings\"\n").unwrap();
        assert_eq!(config.tagger.strategy, Strategy::Embeddings);
        assert_eq!(config.tagger.top_n, 2);
        assert_eq!(config.embedding.model, "all-MiniLM-L6-v2");
    }

    #[test]
    fn test_unknown_strategy_is_config_error() {
        let err = Config::from_toml("[tagger]\nstrategy = \"keywords\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(err
            .to_string()
            .contains("Invalid strategy 'keywords': choose 'zero-shot' or 'embeddings'"));
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("zero-shot".parse::<Strategy>().unwrap(), Strategy::ZeroShot);
        assert_eq!("embeddings".parse::<Strategy>().unwrap(), Strategy::Embeddings);
        let err = "zeroshot".parse::<Strategy>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStrategy(ref s) if s == "zeroshot"));
    }

    #[test]
    fn test_taxonomy_override() {
        let config = Config::from_toml(
            r#"
[[taxonomy.categories]]
name = "causes"
tags = ["Climate", "Literacy"]
"#,
        )
        .unwrap();
        let taxonomy = config.taxonomy().unwrap();
        assert_eq!(taxonomy.category_names(), vec!["causes"]);
    }

    #[test]
    fn test_default_taxonomy_is_volunteer() {
        let taxonomy = Config::default().taxonomy().unwrap();
        assert_eq!(taxonomy.category_names(), vec!["interests", "skills"]);
    }

    #[test]
    fn test_strategy_model_dir() {
        let mut config = Config::default();
        config.general.model_dir = PathBuf::from("/opt/models");
        assert_eq!(
            config.strategy_model_dir(Strategy::Embeddings),
            PathBuf::from("/opt/models/all-MiniLM-L6-v2")
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tagger]\ntop_n = 3\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.tagger.top_n, 3);
    }
}
