//! NLI-based zero-shot classifier.
//!
//! Each candidate label becomes a hypothesis ("This example is {label}.") and
//! the description is the premise. All pairs run through the entailment model
//! in a single ONNX call.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationStrategy};

use crate::config::ZeroShotConfig;
use crate::error::{InferenceError, InferenceResult};
use crate::math::softmax;

use super::{load_tokenizer, Classification, ModelFiles, TokenBatch, ZeroShotClassifier};

/// Default MNLI label order: contradiction, neutral, entailment.
const DEFAULT_CONTRADICTION_ID: usize = 0;
const DEFAULT_ENTAILMENT_ID: usize = 2;

/// Subset of a Hugging Face `config.json` we care about.
#[derive(Debug, Default, Deserialize)]
struct HfModelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// Positions of the entailment and contradiction logits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelIds {
    pub entailment: usize,
    pub contradiction: usize,
}

impl Default for LabelIds {
    fn default() -> Self {
        Self {
            entailment: DEFAULT_ENTAILMENT_ID,
            contradiction: DEFAULT_CONTRADICTION_ID,
        }
    }
}

impl LabelIds {
    /// Resolve logit positions from an `id2label` map, falling back to MNLI order.
    fn from_id2label(id2label: &HashMap<String, String>) -> Self {
        let find = |prefix: &str| {
            id2label.iter().find_map(|(id, label)| {
                if label.to_lowercase().starts_with(prefix) {
                    id.parse::<usize>().ok()
                } else {
                    None
                }
            })
        };
        let defaults = Self::default();
        Self {
            entailment: find("entail").unwrap_or(defaults.entailment),
            contradiction: find("contra").unwrap_or(defaults.contradiction),
        }
    }

    fn load(config_path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(config_path) else {
            return Self::default();
        };
        match serde_json::from_str::<HfModelConfig>(&content) {
            Ok(config) => Self::from_id2label(&config.id2label),
            Err(e) => {
                tracing::warn!("Ignoring unreadable {:?}: {e}", config_path);
                Self::default()
            }
        }
    }
}

/// Natural-language-inference model used for zero-shot classification.
///
/// `Session::run` takes `&mut self`, so the session sits behind a `Mutex` and
/// concurrent requests are serialized here.
pub struct NliClassifier {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    hypothesis_template: String,
    label_ids: LabelIds,
    feeds_token_type_ids: bool,
}

impl NliClassifier {
    /// Load the classifier from its model directory.
    pub fn load(model_dir: &Path, config: &ZeroShotConfig) -> InferenceResult<Self> {
        let files = ModelFiles::in_dir(model_dir);
        files.require()?;

        tracing::info!("Loading zero-shot model from {:?}", files.model);

        let session = Session::builder()
            .map_err(|e| InferenceError::model(format!("Failed to create ONNX session builder: {e}")))?
            .commit_from_file(&files.model)
            .map_err(|e| InferenceError::model(format!("Failed to load zero-shot model: {e}")))?;

        // Only the premise is truncated; hypotheses are short.
        let tokenizer = load_tokenizer(
            &files.tokenizer,
            config.max_length,
            TruncationStrategy::OnlyFirst,
        )?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        let feeds_token_type_ids = input_names.iter().any(|n| n == "token_type_ids");
        let label_ids = LabelIds::load(&files.config);

        tracing::debug!(
            "Loaded zero-shot model (inputs: {:?}, labels: {:?})",
            input_names,
            label_ids
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            hypothesis_template: config.hypothesis_template.clone(),
            label_ids,
            feeds_token_type_ids,
        })
    }

    /// Raw NLI logits, one row per candidate label.
    fn logits(&self, text: &str, candidate_labels: &[String]) -> InferenceResult<Vec<Vec<f32>>> {
        let batch = encode_pairs(
            &self.tokenizer,
            &self.hypothesis_template,
            text,
            candidate_labels,
        )?;
        let shape = batch.shape();

        let input_ids = Value::from_array((shape.clone(), batch.input_ids))
            .map_err(|e| InferenceError::model(format!("Failed to create input tensor: {e}")))?;
        let attention_mask = Value::from_array((shape.clone(), batch.attention_mask))
            .map_err(|e| InferenceError::model(format!("Failed to create mask tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| InferenceError::model(format!("Zero-shot session lock poisoned: {e}")))?;

        let run_result = if self.feeds_token_type_ids {
            let token_type_ids = Value::from_array((shape, batch.token_type_ids)).map_err(|e| {
                InferenceError::model(format!("Failed to create token type tensor: {e}"))
            })?;
            session.run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask
            ])
        };
        let outputs = run_result
            .map_err(|e| InferenceError::model(format!("Zero-shot inference failed: {e}")))?;

        let logits = outputs
            .iter()
            .find(|(name, _)| *name == "logits")
            .ok_or_else(|| InferenceError::model("Zero-shot model did not produce logits"))?;

        let (shape, data) = logits
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::model(format!("Failed to extract logits: {e}")))?;

        if shape.len() != 2 || shape[0] as usize != candidate_labels.len() {
            return Err(InferenceError::model(format!(
                "Unexpected logits shape: {:?}",
                shape
            )));
        }
        let num_classes = shape[1] as usize;
        let needed = self.label_ids.entailment.max(self.label_ids.contradiction);
        if needed >= num_classes {
            return Err(InferenceError::model(format!(
                "Model has {num_classes} classes but entailment/contradiction ids are {:?}",
                self.label_ids
            )));
        }

        Ok(data.chunks(num_classes).map(|row| row.to_vec()).collect())
    }
}

impl ZeroShotClassifier for NliClassifier {
    fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
        multi_label: bool,
    ) -> InferenceResult<Classification> {
        if candidate_labels.is_empty() {
            return Ok(Classification {
                labels: vec![],
                scores: vec![],
            });
        }
        let logits = self.logits(text, candidate_labels)?;
        let scores = scores_from_logits(&logits, self.label_ids, multi_label);
        Ok(sorted_classification(candidate_labels, scores))
    }
}

/// Fill the hypothesis template with a label.
fn hypothesis(template: &str, label: &str) -> String {
    template.replacen("{}", label, 1)
}

/// Tokenize one (premise, hypothesis) pair per label into a single padded batch.
fn encode_pairs(
    tokenizer: &Tokenizer,
    template: &str,
    text: &str,
    labels: &[String],
) -> InferenceResult<TokenBatch> {
    let pairs: Vec<(String, String)> = labels
        .iter()
        .map(|label| (text.to_string(), hypothesis(template, label)))
        .collect();

    let encodings = tokenizer
        .encode_batch(pairs, true)
        .map_err(|e| InferenceError::model(format!("Tokenization failed: {e}")))?;
    TokenBatch::from_encodings(&encodings)
}

/// Turn per-label NLI logits into label scores.
///
/// Multi-label: softmax over \[contradiction, entailment\] per label, keeping
/// the entailment probability. Single-label: softmax of the entailment logits
/// across labels.
fn scores_from_logits(logits: &[Vec<f32>], ids: LabelIds, multi_label: bool) -> Vec<f32> {
    if multi_label {
        logits
            .iter()
            .map(|row| softmax(&[row[ids.contradiction], row[ids.entailment]])[1])
            .collect()
    } else {
        let entailment: Vec<f32> = logits.iter().map(|row| row[ids.entailment]).collect();
        softmax(&entailment)
    }
}

/// Pair labels with scores, highest score first.
fn sorted_classification(labels: &[String], scores: Vec<f32>) -> Classification {
    let mut paired: Vec<(String, f32)> = labels.iter().cloned().zip(scores).collect();
    paired.sort_by(|a, b| b.1.total_cmp(&a.1));
    let (labels, scores) = paired.into_iter().unzip();
    Classification { labels, scores }
}
