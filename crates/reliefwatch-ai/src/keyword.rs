//! Deterministic keyword classification.
//!
//! Case-insensitive substring matching against a [`Taxonomy`]. The text is
//! lower-cased once per call; keywords are pre-normalized by the taxonomy.
//! Every function here is pure in `(text, taxonomy)`.

use reliefwatch_core::taxonomy::{NEGATIVE_BUCKET, POSITIVE_BUCKET};
use reliefwatch_core::{Decision, OTHER_CATEGORY, Provenance, Sentiment, Taxonomy};

/// Multi-label category match.
///
/// Categories are tested in taxonomy order; a category is added once when
/// any of its keywords occurs in the text. No match yields `["Other"]`.
pub fn classify_categories(text: &str, taxonomy: &Taxonomy) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![OTHER_CATEGORY.to_string()];
    }
    categories_of(&text.to_lowercase(), taxonomy)
}

/// Polarity by keyword presence: `#positive − #negative`.
///
/// Each keyword counts at most once however often it occurs, and both
/// buckets are scanned in full.
pub fn classify_sentiment(text: &str, polarity: &Taxonomy) -> Sentiment {
    if text.trim().is_empty() {
        return Sentiment::Neutral;
    }
    Sentiment::from_score(sentiment_score(&text.to_lowercase(), polarity))
}

/// Single-label intent: the first matching intent category in taxonomy order.
pub fn classify_intent(text: &str, intent: &Taxonomy) -> String {
    if text.trim().is_empty() {
        return OTHER_CATEGORY.to_string();
    }
    let lowered = text.to_lowercase();
    intent
        .categories()
        .iter()
        .find(|c| c.needles().iter().any(|kw| lowered.contains(kw.as_str())))
        .map(|c| c.name().to_string())
        .unwrap_or_else(|| OTHER_CATEGORY.to_string())
}

/// Categories and sentiment for one document.
pub fn decide(text: &str, taxonomy: &Taxonomy, polarity: &Taxonomy) -> Decision {
    if text.trim().is_empty() {
        return Decision::empty(Provenance::Keyword);
    }
    let lowered = text.to_lowercase();
    Decision::new(
        categories_of(&lowered, taxonomy),
        Sentiment::from_score(sentiment_score(&lowered, polarity)),
        Provenance::Keyword,
    )
}

/// Classify a batch of texts.
pub fn decide_batch(texts: &[&str], taxonomy: &Taxonomy, polarity: &Taxonomy) -> Vec<Decision> {
    texts
        .iter()
        .map(|t| decide(t, taxonomy, polarity))
        .collect()
}

/// Raw polarity score of already lower-cased text.
pub fn sentiment_score(lowered: &str, polarity: &Taxonomy) -> i64 {
    let present = |bucket: &str| -> i64 {
        polarity
            .get(bucket)
            .map(|c| {
                c.needles()
                    .iter()
                    .filter(|kw| lowered.contains(kw.as_str()))
                    .count() as i64
            })
            .unwrap_or(0)
    };
    present(POSITIVE_BUCKET) - present(NEGATIVE_BUCKET)
}

fn categories_of(lowered: &str, taxonomy: &Taxonomy) -> Vec<String> {
    let matched: Vec<String> = taxonomy
        .categories()
        .iter()
        .filter(|c| c.needles().iter().any(|kw| lowered.contains(kw.as_str())))
        .map(|c| c.name().to_string())
        .collect();

    if matched.is_empty() {
        vec![OTHER_CATEGORY.to_string()]
    } else {
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reliefwatch_core::TaxonomyId;

    fn polarity() -> Taxonomy {
        Taxonomy::new(
            TaxonomyId::Sentiment,
            [
                ("positive", vec!["tốt", "cảm ơn", "an toàn"]),
                ("negative", vec!["tồi", "mất điện", "không có", "sập"]),
            ],
        )
        .unwrap()
    }

    fn damage() -> Taxonomy {
        Taxonomy::new(
            TaxonomyId::Damage,
            [
                ("Infrastructure", vec!["mất điện", "cột điện", "đường"]),
                ("Housing", vec!["không có nước", "nhà", "tốc mái"]),
                ("HumanAffected", vec!["mất tích", "bị thương"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn multi_label_in_taxonomy_order() {
        let cats = classify_categories("Mất điện, không có nước", &damage());
        assert_eq!(cats, vec!["Infrastructure".to_string(), "Housing".to_string()]);
    }

    #[test]
    fn category_counted_once_despite_many_keywords() {
        let cats = classify_categories("nhà bị tốc mái, nhà đổ", &damage());
        assert_eq!(cats, vec!["Housing".to_string()]);
    }

    #[test]
    fn no_match_is_other() {
        assert_eq!(classify_categories("trời đẹp", &damage()), vec!["Other".to_string()]);
    }

    #[test]
    fn empty_text_is_other_and_neutral() {
        assert_eq!(classify_categories("", &damage()), vec!["Other".to_string()]);
        assert_eq!(classify_sentiment("", &polarity()), Sentiment::Neutral);

        let d = decide("   ", &damage(), &polarity());
        assert!(d.is_other());
        assert_eq!(d.sentiment, Sentiment::Neutral);
        assert_eq!(d.provenance, Provenance::Keyword);
    }

    #[test]
    fn padded_keyword_needs_word_boundaries() {
        let relief =
            Taxonomy::new(TaxonomyId::Relief, [("Transportation", vec![" xe "])]).unwrap();
        assert_eq!(
            classify_categories("mọi người xem tin bão", &relief),
            vec!["Other".to_string()]
        );
        assert_eq!(
            classify_categories("cần xe tải chở hàng", &relief),
            vec!["Transportation".to_string()]
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify_sentiment("RẤT TỐT", &polarity()), Sentiment::Positive);
        assert_eq!(
            classify_categories("CỘT ĐIỆN đổ", &damage()),
            vec!["Infrastructure".to_string()]
        );
    }

    #[test]
    fn sentiment_counts_presence_not_occurrences() {
        // "tồi" three times still scores −1; "tốt" and "cảm ơn" score +2.
        let text = "tồi tồi tồi nhưng tốt, cảm ơn";
        assert_eq!(sentiment_score(text, &polarity()), 1);
        assert_eq!(classify_sentiment(text, &polarity()), Sentiment::Positive);
    }

    #[test]
    fn sentiment_scans_both_buckets() {
        assert_eq!(classify_sentiment("tốt nhưng tồi", &polarity()), Sentiment::Neutral);
        assert_eq!(classify_sentiment("quá tồi", &polarity()), Sentiment::Negative);
        assert_eq!(classify_sentiment("bình thường", &polarity()), Sentiment::Neutral);
    }

    #[test]
    fn intent_takes_first_match() {
        let intent = Taxonomy::new(
            TaxonomyId::Intent,
            [
                ("Yêu cầu cứu trợ (Request/Demand)", vec!["cần", "cứu với"]),
                ("Cung cấp cứu trợ (Offer/Supply)", vec!["ủng hộ", "gửi"]),
            ],
        )
        .unwrap();
        assert_eq!(
            classify_intent("cần gạo, ai gửi giúp", &intent),
            "Yêu cầu cứu trợ (Request/Demand)"
        );
        assert_eq!(
            classify_intent("đã gửi 10 thùng mì", &intent),
            "Cung cấp cứu trợ (Offer/Supply)"
        );
        assert_eq!(classify_intent("bão đã tan", &intent), "Other");
        assert_eq!(classify_intent("", &intent), "Other");
    }

    #[test]
    fn decide_combines_categories_and_sentiment() {
        let d = decide("mất điện, không có nước", &damage(), &polarity());
        assert_eq!(
            d.categories(),
            &["Infrastructure".to_string(), "Housing".to_string()]
        );
        assert_eq!(d.sentiment, Sentiment::Negative);
    }

    #[test]
    fn classification_is_idempotent() {
        let texts = ["nhà sập", "cảm ơn đoàn cứu trợ", ""];
        let a = decide_batch(&texts, &damage(), &polarity());
        let b = decide_batch(&texts, &damage(), &polarity());
        assert_eq!(a, b);
    }
}
