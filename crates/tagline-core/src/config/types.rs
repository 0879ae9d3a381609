//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::taxonomy::Category;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.tagline/models"),
        }
    }
}

/// Scoring strategy used by the tagger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Strategy {
    /// NLI zero-shot classification, one model call per category
    #[default]
    ZeroShot,
    /// Sentence embeddings compared by cosine similarity
    Embeddings,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::ZeroShot, Strategy::Embeddings];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ZeroShot => "zero-shot",
            Strategy::Embeddings => "embeddings",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "zero-shot" => Ok(Strategy::ZeroShot),
            "embeddings" => Ok(Strategy::Embeddings),
            other => Err(ConfigError::InvalidStrategy(other.to_string())),
        }
    }
}

impl TryFrom<String> for Strategy {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Tagger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Active scoring strategy ("zero-shot" or "embeddings")
    pub strategy: Strategy,

    /// Number of tags returned per category
    pub top_n: usize,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::ZeroShot,
            top_n: 2,
        }
    }
}

/// Zero-shot (NLI) classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZeroShotConfig {
    /// Model directory name under `general.model_dir`
    pub model: String,

    /// Hypothesis built for each candidate label; `{}` is replaced by the label
    pub hypothesis_template: String,

    /// Maximum tokens per premise/hypothesis pair
    pub max_length: usize,
}

impl Default for ZeroShotConfig {
    fn default() -> Self {
        Self {
            model: "bart-large-mnli".to_string(),
            hypothesis_template: "This example is {}.".to_string(),
            max_length: 1024,
        }
    }
}

/// Sentence embedding encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model directory name under `general.model_dir`
    pub model: String,

    /// Maximum tokens per encoded text
    pub max_length: usize,

    /// Tags encoded per ONNX call when building tag banks
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            max_length: 256,
            batch_size: 64,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Maximum accepted request body in bytes
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Resource limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Per-request inference timeout in milliseconds
    pub inference_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            inference_timeout_ms: 30000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Taxonomy override.
///
/// An empty category list means the built-in volunteer taxonomy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,
}
