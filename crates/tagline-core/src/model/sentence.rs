//! Sentence-transformer text encoder.
//!
//! Runs a MiniLM-style encoder exported to ONNX and mean-pools the token
//! states under the attention mask into one L2-normalized vector per text.

use std::path::Path;
use std::sync::Mutex;

use ndarray::{ArrayView2, ArrayView3, Axis};
use ort::session::Session;
use ort::value::Value;
use tokenizers::{Tokenizer, TruncationStrategy};

use crate::config::EmbeddingConfig;
use crate::error::{InferenceError, InferenceResult};

use super::{load_tokenizer, ModelFiles, TextEncoder, TokenBatch};

/// Sentence embedding encoder wrapper.
///
/// Uses the same `Mutex<Session>` pattern as the zero-shot classifier.
pub struct SentenceEncoder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    feeds_token_type_ids: bool,
    embedding_dim: usize,
}

impl SentenceEncoder {
    /// Load the encoder from its model directory.
    ///
    /// Runs one sample encoding to learn the embedding dimension.
    pub fn load(model_dir: &Path, config: &EmbeddingConfig) -> InferenceResult<Self> {
        let files = ModelFiles::in_dir(model_dir);
        files.require()?;

        tracing::info!("Loading embedding model from {:?}", files.model);

        let session = Session::builder()
            .map_err(|e| InferenceError::model(format!("Failed to create ONNX session builder: {e}")))?
            .commit_from_file(&files.model)
            .map_err(|e| InferenceError::model(format!("Failed to load embedding model: {e}")))?;

        let tokenizer = load_tokenizer(
            &files.tokenizer,
            config.max_length,
            TruncationStrategy::LongestFirst,
        )?;

        let feeds_token_type_ids = session
            .inputs()
            .iter()
            .any(|i| i.name() == "token_type_ids");

        tracing::debug!(
            "Loaded embedding model (inputs: {:?}, outputs: {:?})",
            session.inputs().iter().map(|i| i.name()).collect::<Vec<_>>(),
            session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>()
        );

        let mut encoder = Self {
            session: Mutex::new(session),
            tokenizer,
            feeds_token_type_ids,
            embedding_dim: 0,
        };
        let sample = encoder.run(&["dimension check".to_string()])?;
        encoder.embedding_dim = sample.first().map(Vec::len).unwrap_or(0);
        if encoder.embedding_dim == 0 {
            return Err(InferenceError::model(
                "Embedding model produced an empty vector",
            ));
        }
        tracing::info!(
            "Embedding model ready ({} dims)",
            encoder.embedding_dim
        );

        Ok(encoder)
    }

    fn run(&self, texts: &[String]) -> InferenceResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| InferenceError::model(format!("Tokenization failed: {e}")))?;
        let batch = TokenBatch::from_encodings(&encodings)?;
        let shape = batch.shape();
        let (batch_size, seq_len) = (batch.batch_size, batch.seq_len);
        let mask = batch.attention_mask.clone();

        let input_ids = Value::from_array((shape.clone(), batch.input_ids))
            .map_err(|e| InferenceError::model(format!("Failed to create input tensor: {e}")))?;
        let attention_mask = Value::from_array((shape.clone(), batch.attention_mask))
            .map_err(|e| InferenceError::model(format!("Failed to create mask tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| InferenceError::model(format!("Embedding session lock poisoned: {e}")))?;

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
            .map_err(|e| InferenceError::model(format!("Embedding inference failed: {e}")))?;

        // Prefer a pooled sentence_embedding output when the export has one.
        if let Some((_, pooled)) = outputs.iter().find(|(name, _)| *name == "sentence_embedding") {
            let (shape, data) = pooled.try_extract_tensor::<f32>().map_err(|e| {
                InferenceError::model(format!("Failed to extract sentence_embedding: {e}"))
            })?;
            if shape.len() != 2 || shape[0] as usize != batch_size {
                return Err(InferenceError::model(format!(
                    "Unexpected sentence_embedding shape: {:?}",
                    shape
                )));
            }
            let dim = shape[1] as usize;
            if dim == 0 {
                return Err(InferenceError::model("Embedding model produced an empty vector"));
            }
            return Ok(data.chunks(dim).map(crate::math::l2_normalize).collect());
        }

        let hidden = outputs
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .ok_or_else(|| {
                InferenceError::model("Embedding model did not produce last_hidden_state")
            })?;

        let (shape, data) = hidden
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::model(format!("Failed to extract last_hidden_state: {e}")))?;

        if shape.len() != 3 || shape[0] as usize != batch_size || shape[1] as usize != seq_len {
            return Err(InferenceError::model(format!(
                "Unexpected last_hidden_state shape: {:?}",
                shape
            )));
        }
        let dim = shape[2] as usize;

        let hidden = ArrayView3::from_shape((batch_size, seq_len, dim), data)
            .map_err(|e| InferenceError::model(format!("Bad hidden state layout: {e}")))?;
        let mask = ArrayView2::from_shape((batch_size, seq_len), mask.as_slice())
            .map_err(|e| InferenceError::model(format!("Bad attention mask layout: {e}")))?;

        Ok(mean_pool(hidden, mask))
    }
}

impl TextEncoder for SentenceEncoder {
    fn encode_batch(&self, texts: &[String]) -> InferenceResult<Vec<Vec<f32>>> {
        self.run(texts)
    }

    fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }
}

/// Mean of the token states where the mask is set, L2-normalized per row.
fn mean_pool(hidden: ArrayView3<'_, f32>, mask: ArrayView2<'_, i64>) -> Vec<Vec<f32>> {
    let mask = mask.mapv(|m| m as f32);
    let weighted = &hidden * &mask.view().insert_axis(Axis(2));
    let summed = weighted.sum_axis(Axis(1));
    let counts = mask.sum_axis(Axis(1));

    summed
        .outer_iter()
        .zip(counts.iter())
        .map(|(row, &count)| {
            let count = count.max(1e-9);
            let mean: Vec<f32> = row.iter().map(|x| x / count).collect();
            crate::math::l2_normalize(&mean)
        })
        .collect()
}
