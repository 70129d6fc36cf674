//! Mode-based routing between keyword and model classification.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use reliefwatch_core::{Decision, Lexicon, Sentiment, Taxonomy};
use thiserror::Error;
use tracing::{debug, warn};

use crate::adapter::ModelClassifier;
use crate::keyword;

/// Requested classification backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    Keyword,
    #[default]
    Ai,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Ai => "ai",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown classification mode {0:?} (expected \"keyword\" or \"ai\")")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "ai" => Ok(Self::Ai),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

/// Routes batches to the keyword classifier or the model adapter.
///
/// Built once at startup: the lexicon and the optional model handle are
/// shared read-only by every request.
pub struct Dispatcher {
    lexicon: Arc<Lexicon>,
    model: Option<ModelClassifier>,
    /// Set once the missing-service degradation has been logged at `warn`.
    degraded_logged: AtomicBool,
}

impl Dispatcher {
    /// Keyword-only dispatcher. `Mode::Ai` requests degrade to keywords.
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self {
            lexicon,
            model: None,
            degraded_logged: AtomicBool::new(false),
        }
    }

    pub fn with_model(mut self, model: ModelClassifier) -> Self {
        self.model = Some(model);
        self
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// The model adapter to use for `mode`, if any.
    fn model_for(&self, mode: Mode, op: &'static str, batch: usize) -> Option<&ModelClassifier> {
        debug!(op, %mode, batch, "dispatching");
        match (mode, &self.model) {
            (Mode::Keyword, _) => None,
            (Mode::Ai, Some(model)) => Some(model),
            (Mode::Ai, None) => {
                if self.degraded_logged.swap(true, Ordering::Relaxed) {
                    debug!(op, batch, "no classification service, using keywords");
                } else {
                    warn!(
                        op,
                        batch,
                        "ai mode requested without a classification service, using keywords"
                    );
                }
                None
            }
        }
    }

    /// Categories from `taxonomy` plus sentiment, one decision per text.
    pub fn classify(&self, texts: &[&str], taxonomy: &Taxonomy, mode: Mode) -> Vec<Decision> {
        let polarity = &self.lexicon.sentiment;
        match self.model_for(mode, "classify", texts.len()) {
            Some(model) => model.classify(texts, taxonomy, polarity),
            None => keyword::decide_batch(texts, taxonomy, polarity),
        }
    }

    pub fn classify_categories(
        &self,
        texts: &[&str],
        taxonomy: &Taxonomy,
        mode: Mode,
    ) -> Vec<Vec<String>> {
        match self.model_for(mode, "categories", texts.len()) {
            Some(model) => model.classify_categories(texts, taxonomy),
            None => texts
                .iter()
                .map(|t| keyword::classify_categories(t, taxonomy))
                .collect(),
        }
    }

    pub fn classify_sentiments(&self, texts: &[&str], mode: Mode) -> Vec<Sentiment> {
        let polarity = &self.lexicon.sentiment;
        match self.model_for(mode, "sentiment", texts.len()) {
            Some(model) => model.classify_sentiments(texts, polarity),
            None => texts
                .iter()
                .map(|t| keyword::classify_sentiment(t, polarity))
                .collect(),
        }
    }

    /// One intent label per text.
    pub fn classify_intents(&self, texts: &[&str], mode: Mode) -> Vec<String> {
        let intent = &self.lexicon.intent;
        match self.model_for(mode, "intent", texts.len()) {
            Some(model) => model.classify_intents(texts, intent),
            None => texts
                .iter()
                .map(|t| keyword::classify_intent(t, intent))
                .collect(),
        }
    }
}
