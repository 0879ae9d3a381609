//! Embeddings strategy: cosine similarity against pre-computed tag vectors.
//!
//! Every tag of every category is encoded once at construction into a
//! per-category `TagBank`. Per request only the description is encoded, once,
//! and reused for all categories.

use std::collections::HashMap;

use crate::error::{InferenceError, InferenceResult};
use crate::math::cosine_similarity;
use crate::model::TextEncoder;
use crate::taxonomy::TagTaxonomy;

use super::{PreparedText, Scores, ScoringStrategy};

/// Pre-computed tag embeddings for one category.
///
/// Stores a single flat matrix (N × dim, row-major) in taxonomy order.
#[derive(Debug, Clone)]
pub struct TagBank {
    tags: Vec<String>,
    /// Flat matrix: N × dim stored row-major.
    matrix: Vec<f32>,
    embedding_dim: usize,
}

impl TagBank {
    /// Build a bank from one vector per tag.
    pub fn from_vectors(tags: Vec<String>, vectors: Vec<Vec<f32>>) -> InferenceResult<Self> {
        if tags.len() != vectors.len() {
            return Err(InferenceError::model(format!(
                "Tag bank needs one vector per tag ({} tags, {} vectors)",
                tags.len(),
                vectors.len()
            )));
        }
        let embedding_dim = vectors.first().map(Vec::len).unwrap_or(0);
        let mut matrix = Vec::with_capacity(tags.len() * embedding_dim);
        for (tag, vector) in tags.iter().zip(&vectors) {
            if vector.len() != embedding_dim {
                return Err(InferenceError::model(format!(
                    "Tag '{}' has {} dims, expected {}",
                    tag,
                    vector.len(),
                    embedding_dim
                )));
            }
            matrix.extend_from_slice(vector);
        }
        Ok(Self {
            tags,
            matrix,
            embedding_dim,
        })
    }

    /// Encode a category's tags in batches.
    pub fn encode(
        tags: &[String],
        encoder: &dyn TextEncoder,
        batch_size: usize,
    ) -> InferenceResult<Self> {
        let mut vectors = Vec::with_capacity(tags.len());
        for chunk in tags.chunks(batch_size.max(1)) {
            vectors.extend(encoder.encode_batch(chunk)?);
        }
        Self::from_vectors(tags.to_vec(), vectors)
    }

    /// Cosine similarity of `query` against every tag, in taxonomy order.
    pub fn similarities(&self, query: &[f32]) -> InferenceResult<Vec<f32>> {
        if query.len() != self.embedding_dim {
            return Err(InferenceError::model(format!(
                "Query has {} dims, tag bank has {}",
                query.len(),
                self.embedding_dim
            )));
        }
        Ok(self
            .matrix
            .chunks(self.embedding_dim.max(1))
            .map(|row| cosine_similarity(query, row))
            .collect())
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Scores tags by cosine similarity between text and tag embeddings.
pub struct EmbeddingsStrategy {
    encoder: Box<dyn TextEncoder>,
    banks: HashMap<String, TagBank>,
}

impl EmbeddingsStrategy {
    /// Encode all taxonomy tags up front.
    pub fn build(
        encoder: Box<dyn TextEncoder>,
        taxonomy: &TagTaxonomy,
        batch_size: usize,
    ) -> InferenceResult<Self> {
        tracing::info!(
            "Encoding {} tags across {} categories...",
            taxonomy.tag_count(),
            taxonomy.len()
        );

        let mut banks = HashMap::with_capacity(taxonomy.len());
        for category in taxonomy.categories() {
            let bank = TagBank::encode(&category.tags, encoder.as_ref(), batch_size)?;
            tracing::debug!(
                "  {}: {} tags x {} dims",
                category.name,
                bank.len(),
                bank.embedding_dim()
            );
            banks.insert(category.name.clone(), bank);
        }

        tracing::info!("Tag banks ready");
        Ok(Self { encoder, banks })
    }

    /// The pre-computed bank for a category.
    pub fn bank(&self, category: &str) -> Option<&TagBank> {
        self.banks.get(category)
    }
}

impl ScoringStrategy for EmbeddingsStrategy {
    fn name(&self) -> &str {
        "embeddings"
    }

    fn prepare(&self, text: &str) -> InferenceResult<PreparedText> {
        let embedding = self.encoder.encode(text)?;
        Ok(PreparedText::with_embedding(text, embedding))
    }

    fn score(
        &self,
        input: &PreparedText,
        category: &str,
        candidate_tags: &[String],
    ) -> InferenceResult<Scores> {
        let bank = self
            .banks
            .get(category)
            .ok_or_else(|| InferenceError::scoring(category, "no pre-computed tag embeddings"))?;

        if bank.tags() != candidate_tags {
            return Err(InferenceError::scoring(
                category,
                "candidate tags differ from the pre-computed tag bank",
            ));
        }

        let text_embedding = match input.embedding() {
            Some(embedding) => embedding.to_vec(),
            None => self.encoder.encode(input.text())?,
        };

        let similarities = bank
            .similarities(&text_embedding)
            .map_err(|e| InferenceError::scoring(category, e.to_string()))?;

        Ok(bank.tags().iter().cloned().zip(similarities).collect())
    }
}
