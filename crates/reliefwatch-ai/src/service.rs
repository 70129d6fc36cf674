//! The external classification service seam.
//!
//! Implementations wrap a probabilistic classifier (a local ONNX runtime,
//! a remote inference server, a test double). They are constructed once at
//! process start and shared read-only across requests.

use thiserror::Error;

/// Failure of the classification backend. Always recoverable: the adapter
/// answers with keyword classification instead.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("classification service unavailable: {0}")]
    Unavailable(String),

    #[error("classification service returned {got} results for {expected} texts")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("inference failed: {0}")]
    Inference(#[from] anyhow::Error),
}

impl BackendError {
    /// Check that a response holds one row per input text.
    pub fn expect_len(expected: usize, got: usize) -> Result<(), Self> {
        if expected == got {
            Ok(())
        } else {
            Err(Self::ShapeMismatch { expected, got })
        }
    }
}

/// A candidate label with its confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLabel {
    pub label: String,
    pub score: f32,
}

impl ScoredLabel {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Batch classification capabilities consumed by the model adapter.
///
/// Every method returns exactly one row per input text, in input order.
pub trait ClassificationService: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// One native polarity label per text (e.g. `POS`, `NEG`, `NEU`).
    fn sentiment(&self, texts: &[&str]) -> Result<Vec<String>, BackendError>;

    /// Scores for every candidate label per text, ranked by descending score.
    /// Scores are independent per label (multi-label).
    fn zero_shot_multi_label(
        &self,
        texts: &[&str],
        candidates: &[&str],
    ) -> Result<Vec<Vec<ScoredLabel>>, BackendError>;

    /// The single best candidate label per text.
    fn zero_shot_single_label(
        &self,
        texts: &[&str],
        candidates: &[&str],
    ) -> Result<Vec<String>, BackendError>;
}
