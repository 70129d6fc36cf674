//! Per-document classification results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InputShapeError;

/// Label given to documents that match no category.
pub const OTHER_CATEGORY: &str = "Other";

/// Exactly one sentiment per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }

    /// Sign of a keyword score.
    pub fn from_score(score: i64) -> Self {
        match score.signum() {
            1 => Self::Positive,
            -1 => Self::Negative,
            _ => Self::Neutral,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backend produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Dictionary lookup, either requested or as a fallback.
    Keyword,
    /// External classification service.
    Model,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Model => "model",
        }
    }
}

/// Classification of one document: a non-empty category set and one sentiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDecision")]
pub struct Decision {
    categories: Vec<String>,
    pub sentiment: Sentiment,
    pub provenance: Provenance,
}

impl Decision {
    /// Build a decision. Duplicate categories are dropped (first occurrence wins)
    /// and an empty set becomes `{"Other"}`.
    pub fn new(categories: Vec<String>, sentiment: Sentiment, provenance: Provenance) -> Self {
        Self {
            categories: normalize_categories(categories),
            sentiment,
            provenance,
        }
    }

    /// The decision for empty or absent text.
    pub fn empty(provenance: Provenance) -> Self {
        Self::new(Vec::new(), Sentiment::Neutral, provenance)
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn is_other(&self) -> bool {
        self.categories.len() == 1 && self.categories[0] == OTHER_CATEGORY
    }
}

/// Wire form of [`Decision`]; deserialized values are normalized through `Decision::new`.
#[derive(Deserialize)]
struct RawDecision {
    categories: Vec<String>,
    sentiment: Sentiment,
    provenance: Provenance,
}

impl From<RawDecision> for Decision {
    fn from(raw: RawDecision) -> Self {
        Self::new(raw.categories, raw.sentiment, raw.provenance)
    }
}

/// Deduplicate in order, and substitute `{"Other"}` for an empty set.
pub fn normalize_categories(categories: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(categories.len().max(1));
    for c in categories {
        if !out.contains(&c) {
            out.push(c);
        }
    }
    if out.is_empty() {
        out.push(OTHER_CATEGORY.to_string());
    }
    out
}

/// One input snippet with its optional date string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document<'a> {
    pub text: &'a str,
    pub date: Option<&'a str>,
}

impl<'a> Document<'a> {
    /// Documents without dates.
    pub fn undated<S: AsRef<str>>(texts: &'a [S]) -> Vec<Self> {
        texts
            .iter()
            .map(|t| Self {
                text: t.as_ref(),
                date: None,
            })
            .collect()
    }

    /// Pair texts with dates; lengths must match exactly.
    pub fn dated<S: AsRef<str>, D: AsRef<str>>(
        texts: &'a [S],
        dates: &'a [D],
    ) -> Result<Vec<Self>, InputShapeError> {
        InputShapeError::check(texts.len(), dates.len())?;
        Ok(texts
            .iter()
            .zip(dates)
            .map(|(t, d)| Self {
                text: t.as_ref(),
                date: Some(d.as_ref()),
            })
            .collect())
    }

    /// The date column of dated documents, in document order.
    pub fn dates(docs: &[Self]) -> Vec<&'a str> {
        docs.iter().filter_map(|d| d.date).collect()
    }

    /// The text column, in document order.
    pub fn texts(docs: &[Self]) -> Vec<&'a str> {
        docs.iter().map(|d| d.text).collect()
    }
}
