//! Fold per-document decisions into report summaries.
//!
//! Every shape uses the same fold: walk documents with their decision and
//! bump the counter selected by the grouping key once for *each* category
//! the document belongs to. A document in two categories therefore counts
//! fully in both buckets, so per-category totals can exceed the document
//! count.
//!
//! Groups are emitted in first-encounter order. Only groups that received
//! at least one contribution exist; there is no zero-filled grid.

use std::collections::HashMap;
use std::hash::Hash;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::decision::{Decision, Sentiment};
use crate::error::InputShapeError;

/// Positive/negative/neutral counters for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub positive: u64,
    pub negative: u64,
    pub neutral: u64,
}

impl SentimentCounts {
    pub fn record(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.positive + self.negative + self.neutral
    }
}

/// One row of the sentiment trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSummary {
    pub date: String,
    #[serde(flatten)]
    pub counts: SentimentCounts,
}

/// One non-empty (date, category) bucket of the relief trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCategorySummary {
    pub date: String,
    pub category: String,
    #[serde(flatten)]
    pub counts: SentimentCounts,
}

/// Sentiment distribution per category, serialized as a JSON object
/// `{category: {positive, negative, neutral}}` in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySentiment(pub Vec<(String, SentimentCounts)>);

impl CategorySentiment {
    pub fn get(&self, category: &str) -> Option<&SentimentCounts> {
        self.0.iter().find(|(c, _)| c == category).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for CategorySentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (category, counts) in &self.0 {
            map.serialize_entry(category, counts)?;
        }
        map.end()
    }
}

/// Contribution count per category, serialized as `{category: count}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFrequency(pub Vec<(String, u64)>);

impl CategoryFrequency {
    pub fn get(&self, category: &str) -> Option<u64> {
        self.0.iter().find(|(c, _)| c == category).map(|(_, n)| *n)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for CategoryFrequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (category, count) in &self.0 {
            map.serialize_entry(category, count)?;
        }
        map.end()
    }
}

/// Mutually exclusive intent of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    /// Asking for relief (demand).
    Request,
    /// Offering relief (supply).
    Offer,
    /// General news or information.
    News,
}

impl IntentKind {
    /// Map an intent taxonomy label onto its kind.
    ///
    /// Labels name their kind in English somewhere in the text, e.g.
    /// `"Yêu cầu cứu trợ (Request/Demand)"`. Anything else counts as news.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("request") {
            Self::Request
        } else if lower.contains("offer") {
            Self::Offer
        } else {
            Self::News
        }
    }
}

/// Supply/demand intent totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentCounts {
    #[serde(rename = "Request")]
    pub request: u64,
    #[serde(rename = "Offer")]
    pub offer: u64,
    #[serde(rename = "News")]
    pub news: u64,
}

impl IntentCounts {
    pub fn record(&mut self, kind: IntentKind) {
        match kind {
            IntentKind::Request => self.request += 1,
            IntentKind::Offer => self.offer += 1,
            IntentKind::News => self.news += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.request + self.offer + self.news
    }
}

// ── Grouping ──

/// Insertion-ordered accumulator keyed by `K`.
struct Grouped<K, V> {
    index: HashMap<K, usize>,
    rows: Vec<(K, V)>,
}

impl<K: Hash + Eq + Clone, V: Default> Grouped<K, V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            rows: Vec::new(),
        }
    }

    fn entry(&mut self, key: K) -> &mut V {
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.rows.len();
                self.index.insert(key.clone(), idx);
                self.rows.push((key, V::default()));
                idx
            }
        };
        &mut self.rows[idx].1
    }

    fn into_rows(self) -> Vec<(K, V)> {
        self.rows
    }
}

// ── Shapes ──

/// Shape 1: sentiment per date. Categories play no part, so this folds the
/// per-document sentiments directly.
pub fn by_date<D: AsRef<str>>(
    dates: &[D],
    sentiments: &[Sentiment],
) -> Result<Vec<DateSummary>, InputShapeError> {
    InputShapeError::check(sentiments.len(), dates.len())?;

    let mut groups: Grouped<&str, SentimentCounts> = Grouped::new();
    for (date, &sentiment) in dates.iter().zip(sentiments) {
        groups.entry(date.as_ref()).record(sentiment);
    }

    Ok(groups
        .into_rows()
        .into_iter()
        .map(|(date, counts)| DateSummary {
            date: date.to_string(),
            counts,
        })
        .collect())
}

/// Shape 2: contribution count per category. Sentiment is ignored.
pub fn by_category_count<'a>(
    categories: impl IntoIterator<Item = &'a [String]>,
) -> CategoryFrequency {
    let mut groups: Grouped<&str, u64> = Grouped::new();
    for cats in categories {
        for category in cats {
            *groups.entry(category.as_str()) += 1;
        }
    }

    CategoryFrequency(
        groups
            .into_rows()
            .into_iter()
            .map(|(c, n)| (c.to_string(), n))
            .collect(),
    )
}

/// Shape 3: sentiment distribution per category, no time axis.
pub fn by_category_sentiment(decisions: &[Decision]) -> CategorySentiment {
    let mut groups: Grouped<&str, SentimentCounts> = Grouped::new();
    for decision in decisions {
        for category in decision.categories() {
            groups.entry(category.as_str()).record(decision.sentiment);
        }
    }

    CategorySentiment(
        groups
            .into_rows()
            .into_iter()
            .map(|(c, counts)| (c.to_string(), counts))
            .collect(),
    )
}

/// Shape 4: sentiment per (date, category), flattened to non-empty buckets.
pub fn by_date_category<D: AsRef<str>>(
    dates: &[D],
    decisions: &[Decision],
) -> Result<Vec<DateCategorySummary>, InputShapeError> {
    InputShapeError::check(decisions.len(), dates.len())?;

    let mut groups: Grouped<(&str, &str), SentimentCounts> = Grouped::new();
    for (date, decision) in dates.iter().zip(decisions) {
        for category in decision.categories() {
            groups
                .entry((date.as_ref(), category.as_str()))
                .record(decision.sentiment);
        }
    }

    Ok(groups
        .into_rows()
        .into_iter()
        .map(|((date, category), counts)| DateCategorySummary {
            date: date.to_string(),
            category: category.to_string(),
            counts,
        })
        .collect())
}

/// Tally single-label intent predictions.
pub fn intent_counts<S: AsRef<str>>(labels: &[S]) -> IntentCounts {
    let mut counts = IntentCounts::default();
    for label in labels {
        counts.record(IntentKind::from_label(label.as_ref()));
    }
    counts
}
