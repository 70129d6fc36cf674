//! Native label tables for external classifiers.
//!
//! Sentiment models name their classes differently: PhoBERT-style models
//! emit `POS`/`NEG`/`NEU`, star-rating models emit `1 star` … `5 stars`,
//! others spell the polarity out. Everything is folded onto [`Sentiment`].

use reliefwatch_core::Sentiment;

/// Native label → polarity, compared case-insensitively.
pub const SENTIMENT_LABELS: &[(&str, Sentiment)] = &[
    ("pos", Sentiment::Positive),
    ("positive", Sentiment::Positive),
    ("neg", Sentiment::Negative),
    ("negative", Sentiment::Negative),
    ("neu", Sentiment::Neutral),
    ("neutral", Sentiment::Neutral),
    ("1 star", Sentiment::Negative),
    ("2 stars", Sentiment::Negative),
    ("3 stars", Sentiment::Neutral),
    ("4 stars", Sentiment::Positive),
    ("5 stars", Sentiment::Positive),
];

/// Map a service label onto a sentiment. Unknown labels are neutral.
pub fn sentiment_from_label(label: &str) -> Sentiment {
    let label = label.trim();
    SENTIMENT_LABELS
        .iter()
        .find(|(native, _)| native.eq_ignore_ascii_case(label))
        .map(|&(_, s)| s)
        .unwrap_or(Sentiment::Neutral)
}
