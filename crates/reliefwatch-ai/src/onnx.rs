//! Local ONNX Runtime classification service.
//!
//! Two Hugging Face sequence-classification exports are expected under the
//! model directory:
//!
//! - `sentiment/`: a polarity classifier (e.g. PhoBERT fine-tuned on
//!   Vietnamese reviews, labels `NEG`/`POS`/`NEU`).
//! - `zero-shot/`: an NLI model (e.g. multilingual mDeBERTa on XNLI) whose
//!   labels include `entailment` and `contradiction`.
//!
//! Each directory holds `model.onnx`, `tokenizer.json` and the `config.json`
//! carrying `id2label`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::{EncodeInput, Tokenizer};
use tracing::info;

use crate::service::{BackendError, ClassificationService, ScoredLabel};

/// Token limit applied to every input (pairs included).
pub const MAX_LENGTH: usize = 256;

/// NLI hypothesis for a candidate label.
pub const HYPOTHESIS_TEMPLATE: &str = "This example is {}.";

#[derive(Deserialize)]
struct ModelConfig {
    id2label: BTreeMap<String, String>,
}

/// Parse `id2label` from a model `config.json`, ordered by class index.
fn parse_id2label(json: &str) -> anyhow::Result<Vec<String>> {
    let config: ModelConfig = serde_json::from_str(json).context("parse config.json")?;
    let mut indexed = config
        .id2label
        .into_iter()
        .map(|(id, label)| {
            id.parse::<usize>()
                .map(|i| (i, label))
                .with_context(|| format!("non-numeric class id {id:?}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    indexed.sort_by_key(|(i, _)| *i);

    for (expected, (i, _)) in indexed.iter().enumerate() {
        anyhow::ensure!(*i == expected, "class ids are not contiguous from 0");
    }
    anyhow::ensure!(!indexed.is_empty(), "id2label is empty");
    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

fn hypothesis(label: &str) -> String {
    HYPOTHESIS_TEMPLATE.replace("{}", label)
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
}

/// Index of the first label starting with `prefix`, case-insensitively.
fn label_index(labels: &[String], prefix: &str) -> Option<usize> {
    labels
        .iter()
        .position(|l| l.to_ascii_lowercase().starts_with(prefix))
}

/// One exported sequence-classification model.
struct SequenceClassifier {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    type_ids: bool,
}

impl SequenceClassifier {
    fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let config = std::fs::read_to_string(&config_path)
            .with_context(|| format!("read {}", config_path.display()))?;
        let labels = parse_id2label(&config)?;

        let session = Session::builder()?.commit_from_file(&model_path)?;
        // RoBERTa/DeBERTa exports usually drop token_type_ids.
        let type_ids = session
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
            type_ids,
            model = %model_path.display(),
            "loaded classification model"
        );
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
            type_ids,
        })
    }

    /// Raw logits, one row of `labels.len()` values per input.
    fn logits<'s>(&self, inputs: Vec<EncodeInput<'s>>) -> anyhow::Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(vec![]);
        }
        let batch_size = inputs.len();

        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

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

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("session lock poisoned"))?;

        let outputs = if self.type_ids {
            let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_tensor,
            ])?
        } else {
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
            ])?
        };

        let (output_shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        let classes = self.labels.len();
        anyhow::ensure!(
            dims.len() == 2 && dims[0] as usize == batch_size && dims[1] as usize == classes,
            "unexpected logits shape: {dims:?}, expected [{batch_size}, {classes}]"
        );

        Ok(data.chunks(classes).map(<[f32]>::to_vec).collect())
    }
}

/// [`ClassificationService`] backed by two local ONNX models.
pub struct OnnxService {
    sentiment: SequenceClassifier,
    nli: SequenceClassifier,
    entailment: usize,
    contradiction: usize,
}

impl OnnxService {
    /// Load `sentiment/` and `zero-shot/` from `model_dir`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let sentiment = SequenceClassifier::load(&model_dir.join("sentiment"))
            .context("load sentiment model")?;
        let nli = SequenceClassifier::load(&model_dir.join("zero-shot"))
            .context("load zero-shot model")?;

        let entailment = label_index(&nli.labels, "entail")
            .context("zero-shot model has no entailment label")?;
        let contradiction = label_index(&nli.labels, "contradict")
            .context("zero-shot model has no contradiction label")?;

        Ok(Self {
            sentiment,
            nli,
            entailment,
            contradiction,
        })
    }

    /// Entailment logits and (contradiction, entailment) probabilities for
    /// every (text, candidate) pair, row-major by text.
    fn nli_rows(&self, texts: &[&str], candidates: &[&str]) -> anyhow::Result<Vec<Vec<[f32; 2]>>> {
        let hypotheses: Vec<String> = candidates.iter().map(|c| hypothesis(c)).collect();
        let pairs: Vec<EncodeInput<'_>> = texts
            .iter()
            .flat_map(|&t| hypotheses.iter().map(move |h| EncodeInput::from((t, h.as_str()))))
            .collect();

        let logits = self.nli.logits(pairs)?;
        Ok(logits
            .chunks(candidates.len().max(1))
            .map(|row| {
                row.iter()
                    .map(|l| [l[self.contradiction], l[self.entailment]])
                    .collect()
            })
            .collect())
    }
}

impl ClassificationService for OnnxService {
    fn name(&self) -> &str {
        "onnx"
    }

    fn sentiment(&self, texts: &[&str]) -> Result<Vec<String>, BackendError> {
        let inputs: Vec<EncodeInput<'_>> = texts.iter().map(|&t| EncodeInput::from(t)).collect();
        let logits = self.sentiment.logits(inputs)?;
        logits
            .iter()
            .map(|row| {
                argmax(row)
                    .map(|i| self.sentiment.labels[i].clone())
                    .ok_or_else(|| BackendError::Unavailable("empty logits row".into()))
            })
            .collect()
    }

    fn zero_shot_multi_label(
        &self,
        texts: &[&str],
        candidates: &[&str],
    ) -> Result<Vec<Vec<ScoredLabel>>, BackendError> {
        if candidates.is_empty() {
            return Ok(vec![Vec::new(); texts.len()]);
        }
        let rows = self.nli_rows(texts, candidates)?;

        Ok(rows
            .into_iter()
            .map(|pairs| {
                let mut scored: Vec<ScoredLabel> = candidates
                    .iter()
                    .zip(pairs)
                    .map(|(c, logits)| ScoredLabel::new(*c, softmax(&logits)[1]))
                    .collect();
                scored.sort_by(|a, b| b.score.total_cmp(&a.score));
                scored
            })
            .collect())
    }

    fn zero_shot_single_label(
        &self,
        texts: &[&str],
        candidates: &[&str],
    ) -> Result<Vec<String>, BackendError> {
        if candidates.is_empty() {
            return Err(BackendError::Unavailable("no candidate labels".into()));
        }
        let rows = self.nli_rows(texts, candidates)?;

        rows.into_iter()
            .map(|pairs| {
                let entail: Vec<f32> = pairs.iter().map(|p| p[1]).collect();
                argmax(&softmax(&entail))
                    .map(|i| candidates[i].to_string())
                    .ok_or_else(|| BackendError::Unavailable("empty logits row".into()))
            })
            .collect()
    }
}
