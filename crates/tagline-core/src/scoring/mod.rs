//! Scoring strategies: produce one score per candidate tag of a category.
//!
//! The tagger holds exactly one strategy, chosen at construction. Strategies
//! return an unordered `tag -> score` mapping; ordering is the tagger's job.

pub mod embeddings;
pub mod zero_shot;

use std::collections::HashMap;

use crate::error::InferenceResult;

pub use embeddings::{EmbeddingsStrategy, TagBank};
pub use zero_shot::ZeroShotStrategy;

/// Score per tag label for one category.
pub type Scores = HashMap<String, f32>;

/// Input text plus whatever a strategy derives from it once per request.
#[derive(Debug, Clone)]
pub struct PreparedText {
    text: String,
    embedding: Option<Vec<f32>>,
}

impl PreparedText {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            embedding: None,
        }
    }

    pub fn with_embedding(text: &str, embedding: Vec<f32>) -> Self {
        Self {
            text: text.to_string(),
            embedding: Some(embedding),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }
}

/// A way of scoring candidate tags against a description.
pub trait ScoringStrategy: Send + Sync {
    /// Strategy name for logging (e.g., "zero-shot").
    fn name(&self) -> &str;

    /// Derive per-request state from the text, once before any category is scored.
    fn prepare(&self, text: &str) -> InferenceResult<PreparedText> {
        Ok(PreparedText::new(text))
    }

    /// Score every candidate tag of `category`.
    fn score(
        &self,
        input: &PreparedText,
        category: &str,
        candidate_tags: &[String],
    ) -> InferenceResult<Scores>;
}
