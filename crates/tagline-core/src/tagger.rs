//! The tagger: ranks each category's tags for a description.
//!
//! Built once at startup and shared read-only across requests. Predictions
//! are all-or-nothing: if any category fails, no tags are returned.

use std::time::{Duration, Instant};

use crate::config::{Config, Strategy};
use crate::error::{ConfigError, InferenceError, InferenceResult, Result};
use crate::model::{NliClassifier, SentenceEncoder};
use crate::scoring::{EmbeddingsStrategy, Scores, ScoringStrategy, ZeroShotStrategy};
use crate::taxonomy::TagTaxonomy;
use crate::types::Prediction;

/// Default number of tags returned per category.
pub const DEFAULT_TOP_N: usize = 2;

/// Point in time after which a prediction stops before its next model call.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    fn check(&self) -> InferenceResult<()> {
        if self.is_expired() {
            Err(InferenceError::Timeout {
                timeout_ms: self.budget.as_millis() as u64,
            })
        } else {
            Ok(())
        }
    }
}

/// Suggests the top tags of every category for a description.
pub struct Tagger {
    taxonomy: TagTaxonomy,
    strategy: Box<dyn ScoringStrategy>,
    top_n: usize,
}

impl std::fmt::Debug for Tagger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tagger")
            .field("strategy", &self.strategy.name())
            .field("categories", &self.taxonomy.category_names())
            .field("top_n", &self.top_n)
            .finish()
    }
}

impl Tagger {
    /// Build a tagger around an already-constructed strategy.
    pub fn new(
        taxonomy: TagTaxonomy,
        strategy: Box<dyn ScoringStrategy>,
        top_n: usize,
    ) -> std::result::Result<Self, ConfigError> {
        if top_n == 0 {
            return Err(ConfigError::ValidationError(
                "top_n must be a positive integer".into(),
            ));
        }
        Ok(Self {
            taxonomy,
            strategy,
            top_n,
        })
    }

    /// Load the configured strategy's model and build the tagger.
    ///
    /// This is the expensive one-time step: the model is loaded eagerly and,
    /// for the embeddings strategy, every tag is encoded up front.
    pub fn load(config: &Config) -> Result<Self> {
        let taxonomy = config.taxonomy()?;
        let strategy = config.tagger.strategy;
        let model_dir = config.strategy_model_dir(strategy);
        let start = Instant::now();

        let scoring: Box<dyn ScoringStrategy> = match strategy {
            Strategy::ZeroShot => {
                let classifier = NliClassifier::load(&model_dir, &config.zero_shot)?;
                Box::new(ZeroShotStrategy::new(Box::new(classifier)))
            }
            Strategy::Embeddings => {
                let encoder = SentenceEncoder::load(&model_dir, &config.embedding)?;
                Box::new(EmbeddingsStrategy::build(
                    Box::new(encoder),
                    &taxonomy,
                    config.embedding.batch_size,
                )?)
            }
        };

        tracing::info!(
            "Tagger ready: strategy={}, top_n={}, categories={:?} ({:?})",
            strategy,
            config.tagger.top_n,
            taxonomy.category_names(),
            start.elapsed()
        );

        Ok(Self::new(taxonomy, scoring, config.tagger.top_n)?)
    }

    /// Suggest the top tags of every category for `text`.
    pub fn predict(&self, text: &str) -> InferenceResult<Prediction> {
        self.run(text, None)
    }

    /// Like [`predict`](Self::predict), but gives up with
    /// `InferenceError::Timeout` before any model call that would start after
    /// `deadline`. A call already running is not interrupted.
    pub fn predict_before(&self, text: &str, deadline: Deadline) -> InferenceResult<Prediction> {
        self.run(text, Some(deadline))
    }

    fn run(&self, text: &str, deadline: Option<Deadline>) -> InferenceResult<Prediction> {
        if text.trim().is_empty() {
            return Err(InferenceError::EmptyText);
        }
        let start = Instant::now();
        let check_deadline = || deadline.as_ref().map_or(Ok(()), Deadline::check);

        check_deadline()?;
        let prepared = self.strategy.prepare(text)?;
        let mut prediction = Prediction::with_capacity(self.taxonomy.len());

        for category in self.taxonomy.categories() {
            check_deadline()?;
            let scores = self
                .strategy
                .score(&prepared, &category.name, &category.tags)?;
            let top = rank(&category.name, &category.tags, &scores, self.top_n)?;
            prediction.insert(category.name.clone(), top);
        }

        tracing::debug!(
            "Predicted {} categories with {} in {:?}",
            prediction.len(),
            self.strategy.name(),
            start.elapsed()
        );

        Ok(prediction)
    }

    pub fn taxonomy(&self) -> &TagTaxonomy {
        &self.taxonomy
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }
}

/// Order `tags` by descending score and keep the first `top_n`.
///
/// The sort is stable, so equal scores keep taxonomy order. Every tag must
/// have a finite score, and no score may name a tag outside the category.
fn rank(
    category: &str,
    tags: &[String],
    scores: &Scores,
    top_n: usize,
) -> InferenceResult<Vec<String>> {
    if let Some(unknown) = scores.keys().find(|label| !tags.contains(label)) {
        return Err(InferenceError::scoring(
            category,
            format!("score returned for unknown tag '{unknown}'"),
        ));
    }

    let mut scored: Vec<(&String, f32)> = Vec::with_capacity(tags.len());
    for tag in tags {
        let score = *scores
            .get(tag)
            .ok_or_else(|| InferenceError::scoring(category, format!("no score for tag '{tag}'")))?;
        if !score.is_finite() {
            return Err(InferenceError::scoring(
                category,
                format!("non-finite score for tag '{tag}'"),
            ));
        }
        scored.push((tag, score));
    }

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    Ok(scored
        .into_iter()
        .take(top_n)
        .map(|(tag, _)| tag.clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::PreparedText;
    use crate::taxonomy::Category;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns fixed scores per category and counts calls.
    struct StubStrategy {
        scores: HashMap<String, Scores>,
        calls: Arc<AtomicUsize>,
        fail_on: Option<String>,
    }

    impl StubStrategy {
        fn new(scores: &[(&str, &[(&str, f32)])]) -> Self {
            Self {
                scores: scores
                    .iter()
                    .map(|(cat, tags)| {
                        (
                            cat.to_string(),
                            tags.iter().map(|(t, s)| (t.to_string(), *s)).collect(),
                        )
                    })
                    .collect(),
                calls: Arc::new(AtomicUsize::new(0)),
                fail_on: None,
            }
        }
    }

    impl ScoringStrategy for StubStrategy {
        fn name(&self) -> &str {
            "stub"
        }

        fn score(
            &self,
            _input: &PreparedText,
            category: &str,
            _candidate_tags: &[String],
        ) -> InferenceResult<Scores> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.as_deref() == Some(category) {
                return Err(InferenceError::model("stub failure"));
            }
            Ok(self.scores.get(category).cloned().unwrap_or_default())
        }
    }

    fn example_taxonomy() -> TagTaxonomy {
        TagTaxonomy::new(vec![
            Category::new("interests", &["A", "B", "C"]),
            Category::new("skills", &["X", "Y"]),
        ])
        .unwrap()
    }

    fn example_stub() -> StubStrategy {
        StubStrategy::new(&[
            ("interests", &[("A", 0.9), ("B", 0.1), ("C", 0.5)]),
            ("skills", &[("X", 0.2), ("Y", 0.8)]),
        ])
    }

    #[test]
    fn test_predict_example() {
        let tagger = Tagger::new(example_taxonomy(), Box::new(example_stub()), 2).unwrap();
        let prediction = tagger.predict("Help at the animal shelter").unwrap();

        assert_eq!(prediction.get("interests").unwrap(), &["A", "C"]);
        assert_eq!(prediction.get("skills").unwrap(), &["Y", "X"]);
    }

    #[test]
    fn test_keys_match_taxonomy_in_order() {
        let tagger = Tagger::new(example_taxonomy(), Box::new(example_stub()), 2).unwrap();
        let prediction = tagger.predict("text").unwrap();
        assert_eq!(prediction.categories(), vec!["interests", "skills"]);
    }

    #[test]
    fn test_top_n_larger_than_category() {
        let tagger = Tagger::new(example_taxonomy(), Box::new(example_stub()), 5).unwrap();
        let prediction = tagger.predict("text").unwrap();
        assert_eq!(prediction.get("interests").unwrap(), &["A", "C", "B"]);
        assert_eq!(prediction.get("skills").unwrap().len(), 2);
    }

    #[test]
    fn test_ties_keep_taxonomy_order() {
        let stub = StubStrategy::new(&[
            ("interests", &[("A", 0.3), ("B", 0.7), ("C", 0.7)]),
            ("skills", &[("X", 0.5), ("Y", 0.5)]),
        ]);
        let tagger = Tagger::new(example_taxonomy(), Box::new(stub), 3).unwrap();
        let prediction = tagger.predict("text").unwrap();
        assert_eq!(prediction.get("interests").unwrap(), &["B", "C", "A"]);
        assert_eq!(prediction.get("skills").unwrap(), &["X", "Y"]);
    }

    #[test]
    fn test_predict_is_deterministic() {
        let tagger = Tagger::new(example_taxonomy(), Box::new(example_stub()), 2).unwrap();
        let first = tagger.predict("same text").unwrap();
        for _ in 0..5 {
            assert_eq!(tagger.predict("same text").unwrap(), first);
        }
    }

    #[test]
    fn test_empty_text_skips_strategy() {
        let stub = example_stub();
        let calls = stub.calls.clone();
        let tagger = Tagger::new(example_taxonomy(), Box::new(stub), 2).unwrap();

        assert!(matches!(tagger.predict(""), Err(InferenceError::EmptyText)));
        assert!(matches!(tagger.predict("   \n"), Err(InferenceError::EmptyText)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_second_category_failure_fails_whole_prediction() {
        let mut stub = example_stub();
        stub.fail_on = Some("skills".to_string());
        let calls = stub.calls.clone();
        let tagger = Tagger::new(example_taxonomy(), Box::new(stub), 2).unwrap();

        assert!(tagger.predict("text").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_expired_deadline_skips_strategy() {
        let stub = example_stub();
        let calls = stub.calls.clone();
        let tagger = Tagger::new(example_taxonomy(), Box::new(stub), 2).unwrap();

        let err = tagger
            .predict_before("text", Deadline::after(Duration::ZERO))
            .unwrap_err();

        assert!(matches!(err, InferenceError::Timeout { timeout_ms: 0 }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_deadline_passing_mid_prediction_stops_remaining_categories() {
        struct SlowStrategy {
            calls: Arc<AtomicUsize>,
        }

        impl ScoringStrategy for SlowStrategy {
            fn name(&self) -> &str {
                "slow"
            }

            fn score(
                &self,
                _input: &PreparedText,
                _category: &str,
                candidate_tags: &[String],
            ) -> InferenceResult<Scores> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(50));
                Ok(candidate_tags.iter().map(|t| (t.clone(), 0.5)).collect())
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = SlowStrategy {
            calls: calls.clone(),
        };
        let tagger = Tagger::new(example_taxonomy(), Box::new(strategy), 2).unwrap();

        let result = tagger.predict_before("text", Deadline::after(Duration::from_millis(20)));

        assert!(matches!(result, Err(InferenceError::Timeout { timeout_ms: 20 })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_generous_deadline_matches_predict() {
        let tagger = Tagger::new(example_taxonomy(), Box::new(example_stub()), 2).unwrap();
        let bounded = tagger
            .predict_before("text", Deadline::after(Duration::from_secs(60)))
            .unwrap();
        assert_eq!(bounded, tagger.predict("text").unwrap());
    }

    #[test]
    fn test_zero_top_n_is_config_error() {
        let err = Tagger::new(example_taxonomy(), Box::new(example_stub()), 0).unwrap_err();
        assert!(err.to_string().contains("top_n"));
    }

    #[test]
    fn test_rank_rejects_missing_score() {
        let tags = vec!["A".to_string(), "B".to_string()];
        let scores: Scores = [("A".to_string(), 0.4)].into_iter().collect();
        let err = rank("interests", &tags, &scores, 2).unwrap_err();
        assert!(err.to_string().contains("no score for tag 'B'"));
    }

    #[test]
    fn test_rank_rejects_invented_label() {
        let tags = vec!["A".to_string()];
        let scores: Scores = [("A".to_string(), 0.4), ("Z".to_string(), 0.9)]
            .into_iter()
            .collect();
        let err = rank("interests", &tags, &scores, 2).unwrap_err();
        assert!(err.to_string().contains("unknown tag 'Z'"));
    }

    #[test]
    fn test_rank_rejects_nan() {
        let tags = vec!["A".to_string()];
        let scores: Scores = [("A".to_string(), f32::NAN)].into_iter().collect();
        assert!(rank("interests", &tags, &scores, 1).is_err());
    }

    #[test]
    fn test_rank_handles_negative_cosine() {
        let tags = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let scores: Scores = [
            ("A".to_string(), -0.4),
            ("B".to_string(), -0.1),
            ("C".to_string(), -0.9),
        ]
        .into_iter()
        .collect();
        assert_eq!(rank("interests", &tags, &scores, 2).unwrap(), vec!["B", "A"]);
    }
}
