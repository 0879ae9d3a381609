//! Pretrained text models running locally via ONNX Runtime.
//!
//! The scoring strategies only see the two narrow traits defined here. The
//! ONNX-backed implementations load an exported model plus its
//! `tokenizer.json` from `{model_dir}/{model_name}/`.

pub mod nli;
pub mod sentence;

use std::path::{Path, PathBuf};

use tokenizers::{
    Encoding, PaddingStrategy, Tokenizer, TruncationParams, TruncationStrategy,
};

use crate::error::{InferenceError, InferenceResult};

pub use nli::NliClassifier;
pub use sentence::SentenceEncoder;

/// ONNX model filename inside a model directory.
pub const MODEL_FILENAME: &str = "model.onnx";
/// Tokenizer filename inside a model directory.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";
/// Optional Hugging Face model config (label mapping).
pub const CONFIG_FILENAME: &str = "config.json";

/// Labels paired by position with their scores.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
}

/// Zero-shot classification collaborator.
pub trait ZeroShotClassifier: Send + Sync {
    /// Score every candidate label against `text`.
    ///
    /// With `multi_label`, each label is scored independently in \[0, 1\];
    /// otherwise scores are normalized across the candidates.
    fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
        multi_label: bool,
    ) -> InferenceResult<Classification>;
}

/// Text embedding collaborator.
pub trait TextEncoder: Send + Sync {
    /// Encode a batch of texts to fixed-dimension vectors.
    fn encode_batch(&self, texts: &[String]) -> InferenceResult<Vec<Vec<f32>>>;

    /// Dimension of every vector this encoder produces.
    fn embedding_dim(&self) -> usize;

    /// Encode a single text.
    fn encode(&self, text: &str) -> InferenceResult<Vec<f32>> {
        self.encode_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::model("Encoder returned empty result for single input"))
    }
}

/// Paths of the files making up one exported model.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub model: PathBuf,
    pub tokenizer: PathBuf,
    pub config: PathBuf,
}

impl ModelFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model: dir.join(MODEL_FILENAME),
            tokenizer: dir.join(TOKENIZER_FILENAME),
            config: dir.join(CONFIG_FILENAME),
        }
    }

    /// Whether the required files (model and tokenizer) exist.
    pub fn exist(&self) -> bool {
        self.model.exists() && self.tokenizer.exists()
    }

    /// Fail with a model error naming the first missing required file.
    pub fn require(&self) -> InferenceResult<()> {
        for (what, path) in [("Model", &self.model), ("Tokenizer", &self.tokenizer)] {
            if !path.exists() {
                return Err(InferenceError::model(format!(
                    "{what} not found at {:?}. Run `tagline models download` first.",
                    path
                )));
            }
        }
        Ok(())
    }
}

/// Load a tokenizer with truncation and batch-longest padding configured.
pub(crate) fn load_tokenizer(
    path: &Path,
    max_length: usize,
    truncation: TruncationStrategy,
) -> InferenceResult<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path)
        .map_err(|e| InferenceError::model(format!("Failed to load tokenizer: {e}")))?;

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            strategy: truncation,
            ..Default::default()
        }))
        .map_err(|e| InferenceError::model(format!("Failed to configure truncation: {e}")))?;

    let pad = ["<pad>", "[PAD]"]
        .into_iter()
        .find_map(|token| tokenizer.token_to_id(token).map(|id| (token, id)));
    let mut padding = tokenizer.get_padding().cloned().unwrap_or_default();
    padding.strategy = PaddingStrategy::BatchLongest;
    if let Some((token, id)) = pad {
        if tokenizer.get_padding().is_none() {
            padding.pad_token = token.to_string();
            padding.pad_id = id;
        }
    }
    tokenizer.with_padding(Some(padding));

    Ok(tokenizer)
}

/// Flat row-major input tensors for one tokenized batch.
#[derive(Debug)]
pub(crate) struct TokenBatch {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
    pub batch_size: usize,
    pub seq_len: usize,
}

impl TokenBatch {
    /// Flatten padded encodings; all encodings must share one length.
    pub fn from_encodings(encodings: &[Encoding]) -> InferenceResult<Self> {
        let batch_size = encodings.len();
        let seq_len = encodings.first().map(|e| e.len()).unwrap_or(0);

        let mut input_ids = Vec::with_capacity(batch_size * seq_len);
        let mut attention_mask = Vec::with_capacity(batch_size * seq_len);
        let mut token_type_ids = Vec::with_capacity(batch_size * seq_len);

        for encoding in encodings {
            if encoding.len() != seq_len {
                return Err(InferenceError::model(format!(
                    "Unpadded batch: expected {} tokens, got {}",
                    seq_len,
                    encoding.len()
                )));
            }
            input_ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            token_type_ids.extend(encoding.get_type_ids().iter().map(|&t| t as i64));
        }

        Ok(Self {
            input_ids,
            attention_mask,
            token_type_ids,
            batch_size,
            seq_len,
        })
    }

    pub fn shape(&self) -> Vec<i64> {
        vec![self.batch_size as i64, self.seq_len as i64]
    }
}

/// Write a whitespace-split WordLevel `tokenizer.json` for tests.
///
/// Ids follow the order of `vocab`; unknown words map to `[UNK]`, which must be listed.
#[cfg(test)]
pub(crate) fn write_word_level_tokenizer(
    dir: &Path,
    vocab: &[&str],
    padding: Option<serde_json::Value>,
) -> PathBuf {
    let vocab: serde_json::Map<String, serde_json::Value> = vocab
        .iter()
        .enumerate()
        .map(|(id, token)| (token.to_string(), serde_json::json!(id)))
        .collect();
    let tokenizer = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": padding,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "WhitespaceSplit" },
        "post_processor": null,
        "decoder": null,
        "model": { "type": "WordLevel", "vocab": vocab, "unk_token": "[UNK]" }
    });
    let path = dir.join(TOKENIZER_FILENAME);
    std::fs::write(&path, tokenizer.to_string()).unwrap();
    path
}
