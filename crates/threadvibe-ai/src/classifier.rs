//! ONNX Runtime text-classification pipeline.
//!
//! Loads a HuggingFace classification export (`model.onnx`,
//! `tokenizer.json`, `config.json`) and maps a batch of strings to one
//! top-1 label prediction per input. Built for exports of
//! cardiffnlp/twitter-roberta-base-sentiment (3 labels) and
//! j-hartmann/emotion-english-distilroberta-base (7 labels), but any
//! single-sequence classification model with an `id2label` config
//! works.

use std::path::Path;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

use threadvibe_core::{Classifier, Prediction};

use crate::labels::load_labels;

/// Tokenizer truncation bound; matches the models' max position
/// embeddings.
const MAX_LENGTH: usize = 512;

/// Batch text classifier over a pretrained ONNX model.
///
/// Expensive to construct (model load), so one instance is built per
/// model at process start and reused for every request.
pub struct TextClassifier {
    session: Session,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    needs_token_type_ids: bool,
}

impl TextClassifier {
    /// Load a classifier from a directory containing `model.onnx`,
    /// `tokenizer.json`, and `config.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );
        anyhow::ensure!(
            config_path.exists(),
            "config.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let labels = load_labels(&config_path)?;

        // RoBERTa-family exports take only input_ids/attention_mask;
        // BERT-family exports also want token_type_ids.
        let needs_token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            ..Default::default()
        }));

        info!(
            labels = labels.len(),
            model = %model_path.display(),
            "loaded classification model"
        );
        Ok(Self {
            session,
            tokenizer,
            labels,
            needs_token_type_ids,
        })
    }

    /// The model's label vocabulary, in logit order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Classify a batch of texts, returning one prediction per input,
    /// aligned by index. An empty batch returns an empty vec without
    /// touching the session.
    pub fn classify_batch(&mut self, texts: &[String]) -> anyhow::Result<Vec<Prediction>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        // Build flat input tensors: [batch_size, seq_len].
        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let offset = i * seq_len;
            for (j, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[offset + j] = id as i64;
            }
            for (j, &mask) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[offset + j] = mask as i64;
            }
            for (j, &tid) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[offset + j] = tid as i64;
            }
        }

        let shape = [batch_size as i64, seq_len as i64];
        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.into_boxed_slice()))?;

        let outputs = if self.needs_token_type_ids {
            let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;
            self.session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_tensor,
            ])?
        } else {
            self.session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
            ])?
        };

        // Logits: [batch_size, num_labels].
        let (output_shape, logits) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 2
                && dims[0] as usize == batch_size
                && dims[1] as usize == self.labels.len(),
            "unexpected output shape: {dims:?}, expected [{batch_size}, {}]",
            self.labels.len()
        );

        let num_labels = self.labels.len();
        let mut predictions = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let row = &logits[i * num_labels..(i + 1) * num_labels];
            let probabilities = softmax(row);
            let (best, score) = probabilities
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(idx, &p)| (idx, p))
                .unwrap_or((0, 0.0));
            predictions.push(Prediction {
                label: self.labels[best].clone(),
                score,
            });
        }

        Ok(predictions)
    }
}

impl Classifier for TextClassifier {
    fn classify(&mut self, batch: &[String]) -> anyhow::Result<Vec<Prediction>> {
        self.classify_batch(batch)
    }
}

/// Numerically stable softmax over one logit row.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
