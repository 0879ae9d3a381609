//! Zero-shot strategy: one multi-label classifier call per category.

use crate::error::{InferenceError, InferenceResult};
use crate::model::ZeroShotClassifier;

use super::{PreparedText, Scores, ScoringStrategy};

/// Delegates scoring to a zero-shot classifier with multi-label scoring.
pub struct ZeroShotStrategy {
    classifier: Box<dyn ZeroShotClassifier>,
}

impl ZeroShotStrategy {
    pub fn new(classifier: Box<dyn ZeroShotClassifier>) -> Self {
        Self { classifier }
    }
}

impl ScoringStrategy for ZeroShotStrategy {
    fn name(&self) -> &str {
        "zero-shot"
    }

    fn score(
        &self,
        input: &PreparedText,
        category: &str,
        candidate_tags: &[String],
    ) -> InferenceResult<Scores> {
        let result = self
            .classifier
            .classify(input.text(), candidate_tags, true)
            .map_err(|e| InferenceError::scoring(category, e.to_string()))?;

        if result.labels.len() != result.scores.len() {
            return Err(InferenceError::scoring(
                category,
                format!(
                    "classifier returned {} labels but {} scores",
                    result.labels.len(),
                    result.scores.len()
                ),
            ));
        }

        Ok(result.labels.into_iter().zip(result.scores).collect())
    }
}
