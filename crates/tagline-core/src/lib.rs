//! Tagline Core - Embeddable tagging library for volunteer opportunities.
//!
//! Tagline takes a free-text description and suggests tags from a static
//! taxonomy ("interests" and "skills") using a pretrained language model that
//! runs locally via ONNX Runtime.
//!
//! # Architecture
//!
//! ```text
//! Description → Strategy (zero-shot NLI | sentence embeddings) → Rank per category → Top-N
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use tagline_core::{Config, Tagger};
//!
//! fn main() -> tagline_core::Result<()> {
//!     let config = Config::load()?;
//!     let tagger = Tagger::load(&config)?;
//!
//!     let prediction = tagger.predict("Help kids with reading after school")?;
//!     println!("{}", serde_json::to_string(&prediction)?);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod math;
pub mod model;
pub mod scoring;
pub mod tagger;
pub mod taxonomy;
pub mod types;

// Re-exports for convenient access
pub use config::{Config, Strategy};
pub use error::{ConfigError, InferenceError, InferenceResult, Result, TaglineError};
pub use scoring::{PreparedText, Scores, ScoringStrategy};
pub use tagger::{Deadline, Tagger};
pub use taxonomy::{Category, TagTaxonomy};
pub use types::Prediction;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
