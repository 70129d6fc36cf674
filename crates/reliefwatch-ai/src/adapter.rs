//! Model-backed classification with keyword fallback.
//!
//! Wraps a [`ClassificationService`] and normalizes its output into the same
//! [`Decision`] shape the keyword classifier produces. Texts go to the
//! service in fixed-size chunks, one chunk at a time, and results are
//! concatenated in input order. If the service fails on a chunk, that whole
//! chunk is classified by keyword matching instead; a chunk never mixes
//! model and keyword results.

use std::sync::Arc;

use reliefwatch_core::decision::normalize_categories;
use reliefwatch_core::{Decision, OTHER_CATEGORY, Provenance, Sentiment, Taxonomy};
use tracing::{debug, warn};

use crate::keyword;
use crate::labels::sentiment_from_label;
use crate::service::{BackendError, ClassificationService, ScoredLabel};

/// Texts per service call.
pub const DEFAULT_CHUNK_SIZE: usize = 8;

/// Minimum score (exclusive) for a zero-shot label to be accepted.
pub const DEFAULT_ACCEPT_THRESHOLD: f32 = 0.4;

/// Adapter from a classification service to per-document decisions.
pub struct ModelClassifier {
    service: Arc<dyn ClassificationService>,
    chunk_size: usize,
    threshold: f32,
}

impl ModelClassifier {
    pub fn new(service: Arc<dyn ClassificationService>) -> Self {
        Self {
            service,
            chunk_size: DEFAULT_CHUNK_SIZE,
            threshold: DEFAULT_ACCEPT_THRESHOLD,
        }
    }

    /// Override the chunk size (clamped to at least 1).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Override the multi-label acceptance threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    /// Categories (multi-label over `taxonomy`) and sentiment per text.
    pub fn classify(&self, texts: &[&str], taxonomy: &Taxonomy, polarity: &Taxonomy) -> Vec<Decision> {
        let candidates = taxonomy.labels();
        self.run_chunked(
            "decision",
            texts,
            |batch| {
                let sentiments = self.service.sentiment(batch)?;
                BackendError::expect_len(batch.len(), sentiments.len())?;
                let ranked = self.service.zero_shot_multi_label(batch, &candidates)?;
                BackendError::expect_len(batch.len(), ranked.len())?;

                Ok(sentiments
                    .iter()
                    .zip(&ranked)
                    .map(|(label, scores)| {
                        Decision::new(
                            select_labels(scores, &candidates, self.threshold),
                            sentiment_from_label(label),
                            Provenance::Model,
                        )
                    })
                    .collect())
            },
            || Decision::empty(Provenance::Model),
            |text| keyword::decide(text, taxonomy, polarity),
        )
    }

    /// Sentiment only.
    pub fn classify_sentiments(&self, texts: &[&str], polarity: &Taxonomy) -> Vec<Sentiment> {
        self.run_chunked(
            "sentiment",
            texts,
            |batch| {
                let labels = self.service.sentiment(batch)?;
                Ok(labels.iter().map(|l| sentiment_from_label(l)).collect())
            },
            || Sentiment::Neutral,
            |text| keyword::classify_sentiment(text, polarity),
        )
    }

    /// Multi-label categories only.
    pub fn classify_categories(&self, texts: &[&str], taxonomy: &Taxonomy) -> Vec<Vec<String>> {
        let candidates = taxonomy.labels();
        self.run_chunked(
            "categories",
            texts,
            |batch| {
                let ranked = self.service.zero_shot_multi_label(batch, &candidates)?;
                Ok(ranked
                    .iter()
                    .map(|scores| {
                        normalize_categories(select_labels(scores, &candidates, self.threshold))
                    })
                    .collect())
            },
            || normalize_categories(Vec::new()),
            |text| keyword::classify_categories(text, taxonomy),
        )
    }

    /// Single-label intent: only the top-ranked label is kept.
    pub fn classify_intents(&self, texts: &[&str], intent: &Taxonomy) -> Vec<String> {
        let candidates = intent.labels();
        self.run_chunked(
            "intent",
            texts,
            |batch| {
                let labels = self.service.zero_shot_single_label(batch, &candidates)?;
                Ok(labels
                    .into_iter()
                    .map(|label| {
                        if candidates.contains(&label.as_str()) {
                            label
                        } else {
                            OTHER_CATEGORY.to_string()
                        }
                    })
                    .collect())
            },
            || OTHER_CATEGORY.to_string(),
            |text| keyword::classify_intent(text, intent),
        )
    }

    /// Run `model` chunk by chunk, substituting `fallback` for every text of a
    /// chunk whose service call fails.
    ///
    /// Blank texts never reach the service; within a successful chunk they
    /// get `blank()`.
    fn run_chunked<T>(
        &self,
        op: &'static str,
        texts: &[&str],
        model: impl Fn(&[&str]) -> Result<Vec<T>, BackendError>,
        blank: impl Fn() -> T,
        fallback: impl Fn(&str) -> T,
    ) -> Vec<T> {
        let mut out = Vec::with_capacity(texts.len());

        for (index, chunk) in texts.chunks(self.chunk_size).enumerate() {
            let filled: Vec<&str> = chunk
                .iter()
                .copied()
                .filter(|t| !t.trim().is_empty())
                .collect();

            let result = if filled.is_empty() {
                Ok(Vec::new())
            } else {
                model(&filled).and_then(|rows| {
                    BackendError::expect_len(filled.len(), rows.len())?;
                    Ok(rows)
                })
            };

            match result {
                Ok(rows) => {
                    let mut rows = rows.into_iter();
                    for text in chunk {
                        if text.trim().is_empty() {
                            out.push(blank());
                        } else if let Some(row) = rows.next() {
                            out.push(row);
                        }
                    }
                    debug!(op, chunk = index, size = chunk.len(), "chunk classified by model");
                }
                Err(error) => {
                    warn!(
                        op,
                        chunk = index,
                        size = chunk.len(),
                        service = self.service.name(),
                        %error,
                        "classification service failed, falling back to keyword matching"
                    );
                    out.extend(chunk.iter().map(|&t| fallback(t)));
                }
            }
        }

        out
    }
}

/// Every candidate whose score exceeds `threshold`, highest score first.
///
/// Labels outside the candidate list are ignored.
pub fn select_labels(scores: &[ScoredLabel], candidates: &[&str], threshold: f32) -> Vec<String> {
    let mut accepted: Vec<&ScoredLabel> = scores
        .iter()
        .filter(|s| s.score > threshold && candidates.contains(&s.label.as_str()))
        .collect();
    accepted.sort_by(|a, b| b.score.total_cmp(&a.score));
    accepted.into_iter().map(|s| s.label.clone()).collect()
}
