//! Report operations: classify a request's texts, then aggregate.
//!
//! Date-keyed reports pair texts with dates as [`Document`]s before anything
//! is classified, so a malformed request never reaches the classification
//! service.

use reliefwatch_core::aggregate::{self, CategoryFrequency, CategorySentiment, IntentCounts};
use reliefwatch_core::dates::sort_by_date;
use reliefwatch_core::{
    AnalysisRequest, DateCategorySummary, DateSummary, Document, InputShapeError,
};
use serde::Serialize;
use thiserror::Error;

use crate::dispatch::{Dispatcher, Mode, UnknownMode};

/// Per-request report failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error(transparent)]
    Shape(#[from] InputShapeError),

    #[error(transparent)]
    Mode(#[from] UnknownMode),
}

/// Report selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    SentimentTrend,
    DamageFrequency,
    DamageLabels,
    ReliefSentiment,
    ReliefTrend,
    IntentStats,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        Self::SentimentTrend,
        Self::DamageFrequency,
        Self::DamageLabels,
        Self::ReliefSentiment,
        Self::ReliefTrend,
        Self::IntentStats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SentimentTrend => "sentiment-trend",
            Self::DamageFrequency => "damage",
            Self::DamageLabels => "damage-labels",
            Self::ReliefSentiment => "relief-sentiment",
            Self::ReliefTrend => "relief-trend",
            Self::IntentStats => "intent",
        }
    }

    /// Whether the report is keyed by date and so requires `dates`.
    pub fn needs_dates(&self) -> bool {
        matches!(self, Self::SentimentTrend | Self::ReliefTrend)
    }
}

/// Output of any report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    SentimentTrend(Vec<DateSummary>),
    DamageFrequency(CategoryFrequency),
    DamageLabels(Vec<Vec<String>>),
    ReliefSentiment(CategorySentiment),
    ReliefTrend(Vec<DateCategorySummary>),
    IntentStats(IntentCounts),
}

impl Report {
    /// Order date-keyed rows chronologically. Other reports are unchanged.
    pub fn sort_dates(&mut self) {
        match self {
            Self::SentimentTrend(rows) => sort_by_date(rows, |r| r.date.as_str()),
            Self::ReliefTrend(rows) => sort_by_date(rows, |r| r.date.as_str()),
            _ => {}
        }
    }
}

impl Dispatcher {
    /// Sentiment per date.
    pub fn sentiment_trend<D: AsRef<str>>(
        &self,
        texts: &[&str],
        dates: &[D],
        mode: Mode,
    ) -> Result<Vec<DateSummary>, InputShapeError> {
        let docs = Document::dated(texts, dates)?;
        let sentiments = self.classify_sentiments(texts, mode);
        aggregate::by_date(&Document::dates(&docs), &sentiments)
    }

    /// How often each damage category is mentioned.
    pub fn damage_frequency(&self, texts: &[&str], mode: Mode) -> CategoryFrequency {
        let labels = self.damage_labels(texts, mode);
        aggregate::by_category_count(labels.iter().map(Vec::as_slice))
    }

    /// Damage categories per document, in input order.
    pub fn damage_labels(&self, texts: &[&str], mode: Mode) -> Vec<Vec<String>> {
        self.classify_categories(texts, &self.lexicon().damage, mode)
    }

    /// Sentiment distribution per relief category.
    pub fn relief_sentiment(&self, texts: &[&str], mode: Mode) -> CategorySentiment {
        let decisions = self.classify(texts, &self.lexicon().relief, mode);
        aggregate::by_category_sentiment(&decisions)
    }

    /// Sentiment per (date, relief category).
    pub fn relief_trend<D: AsRef<str>>(
        &self,
        texts: &[&str],
        dates: &[D],
        mode: Mode,
    ) -> Result<Vec<DateCategorySummary>, InputShapeError> {
        let docs = Document::dated(texts, dates)?;
        let decisions = self.classify(texts, &self.lexicon().relief, mode);
        aggregate::by_date_category(&Document::dates(&docs), &decisions)
    }

    /// Request / Offer / News counts.
    pub fn intent_stats(&self, texts: &[&str], mode: Mode) -> IntentCounts {
        let labels = self.classify_intents(texts, mode);
        aggregate::intent_counts(&labels)
    }

    /// Run `kind` over a request body. `mode` overrides the request's
    /// `model_type` when given.
    ///
    /// A date-keyed report without `dates` is a shape error against zero
    /// dates. Other reports ignore `dates`.
    pub fn run(
        &self,
        kind: ReportKind,
        request: &AnalysisRequest,
        mode: Option<Mode>,
    ) -> Result<Report, ReportError> {
        let mode = match mode {
            Some(mode) => mode,
            None => request.model_type.parse()?,
        };
        let docs = if kind.needs_dates() {
            let dates: &[String] = request.dates.as_deref().unwrap_or_default();
            Document::dated(&request.texts, dates)?
        } else {
            Document::undated(&request.texts)
        };
        let texts = Document::texts(&docs);
        let dates = Document::dates(&docs);

        let report = match kind {
            ReportKind::SentimentTrend => {
                Report::SentimentTrend(self.sentiment_trend(&texts, &dates, mode)?)
            }
            ReportKind::DamageFrequency => Report::DamageFrequency(self.damage_frequency(&texts, mode)),
            ReportKind::DamageLabels => Report::DamageLabels(self.damage_labels(&texts, mode)),
            ReportKind::ReliefSentiment => Report::ReliefSentiment(self.relief_sentiment(&texts, mode)),
            ReportKind::ReliefTrend => Report::ReliefTrend(self.relief_trend(&texts, &dates, mode)?),
            ReportKind::IntentStats => Report::IntentStats(self.intent_stats(&texts, mode)),
        };
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use reliefwatch_core::{Lexicon, Taxonomy, TaxonomyId};

    use crate::adapter::ModelClassifier;
    use crate::service::{BackendError, ClassificationService, ScoredLabel};

    fn lexicon() -> Lexicon {
        Lexicon {
            damage: Taxonomy::new(
                TaxonomyId::Damage,
                [
                    ("HouseDamage", vec!["nhà", "tốc mái"]),
                    ("InfrastructureDamage", vec!["mất điện", "cầu"]),
                ],
            )
            .unwrap(),
            relief: Taxonomy::new(
                TaxonomyId::Relief,
                [
                    ("Food_Water", vec!["gạo", "nước"]),
                    ("Utilities", vec!["điện"]),
                ],
            )
            .unwrap(),
            intent: Taxonomy::new(
                TaxonomyId::Intent,
                [
                    ("Yêu cầu cứu trợ (Request/Demand)", vec!["cần", "xin"]),
                    ("Cung cấp cứu trợ (Offer/Supply)", vec!["ủng hộ", "gửi"]),
                    ("Tin tức chung (General News/Info)", vec!["tin"]),
                ],
            )
            .unwrap(),
            sentiment: Taxonomy::new(
                TaxonomyId::Sentiment,
                [("positive", vec!["tốt", "cảm ơn"]), ("negative", vec!["tồi", "mất điện"])],
            )
            .unwrap(),
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(lexicon()))
    }

    /// Counts every call so tests can assert the service was never reached.
    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl ClassificationService for Counting {
        fn name(&self) -> &str {
            "counting"
        }
        fn sentiment(&self, texts: &[&str]) -> Result<Vec<String>, BackendError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["NEU".to_string(); texts.len()])
        }
        fn zero_shot_multi_label(
            &self,
            texts: &[&str],
            _: &[&str],
        ) -> Result<Vec<Vec<ScoredLabel>>, BackendError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Vec::new(); texts.len()])
        }
        fn zero_shot_single_label(
            &self,
            texts: &[&str],
            candidates: &[&str],
        ) -> Result<Vec<String>, BackendError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![candidates[0].to_string(); texts.len()])
        }
    }

    #[test]
    fn sentiment_trend_groups_by_date() {
        let rows = dispatcher()
            .sentiment_trend(
                &["rất tốt", "quá tồi", "bình thường"],
                &["2024-09-01", "2024-09-01", "2024-09-02"],
                Mode::Keyword,
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2024-09-01");
        assert_eq!((rows[0].counts.positive, rows[0].counts.negative), (1, 1));
        assert_eq!(rows[1].counts.neutral, 1);
    }

    #[test]
    fn shape_checked_before_classification() {
        let service = Arc::new(Counting::default());
        let d = dispatcher().with_model(ModelClassifier::new(service.clone()));

        let err = d.sentiment_trend(&["a", "b"], &["2024-01-01"], Mode::Ai).unwrap_err();
        assert_eq!(err, InputShapeError { texts: 2, dates: 1 });
        let err = d.relief_trend(&["a"], &["x", "y"], Mode::Ai).unwrap_err();
        assert_eq!(err, InputShapeError { texts: 1, dates: 2 });

        assert_eq!(service.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn damage_counts_every_category() {
        let d = dispatcher();
        let texts = ["nhà tốc mái, mất điện", "mất điện cả xã", "trời nắng"];

        let labels = d.damage_labels(&texts, Mode::Keyword);
        assert_eq!(labels[0], vec!["HouseDamage", "InfrastructureDamage"]);

        let freq = d.damage_frequency(&texts, Mode::Keyword);
        assert_eq!(freq.get("InfrastructureDamage"), Some(2));
        assert_eq!(freq.get("HouseDamage"), Some(1));
        assert_eq!(freq.get("Other"), Some(1));
    }

    #[test]
    fn relief_sentiment_counts_both_categories() {
        let stats = dispatcher().relief_sentiment(&["mất điện, không có nước"], Mode::Keyword);
        assert_eq!(stats.get("Food_Water").unwrap().negative, 1);
        assert_eq!(stats.get("Utilities").unwrap().negative, 1);
    }

    #[test]
    fn relief_trend_is_flat_and_non_empty() {
        let rows = dispatcher()
            .relief_trend(
                &["cảm ơn đã gửi gạo", "mất điện"],
                &["2024-09-09", "2024-09-10"],
                Mode::Keyword,
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category, "Food_Water");
        assert_eq!(rows[0].counts.positive, 1);
        assert_eq!(rows[1].category, "Utilities");
        assert!(rows.iter().all(|r| r.counts.total() > 0));
    }

    #[test]
    fn intent_stats_buckets() {
        let counts = dispatcher().intent_stats(
            &["cần gạo gấp", "đã gửi 100 thùng mì", "tin bão", "mưa to"],
            Mode::Keyword,
        );
        assert_eq!((counts.request, counts.offer, counts.news), (1, 1, 2));
    }

    #[test]
    fn run_reads_mode_and_dates_from_request() {
        let d = dispatcher();
        let request = AnalysisRequest::new(vec!["tốt".into(), "tồi".into()])
            .with_dates(vec!["10/09/2024".into(), "2024-09-08".into()]);

        let mut report = d.run(ReportKind::SentimentTrend, &request, None).unwrap();
        report.sort_dates();
        let Report::SentimentTrend(rows) = report else {
            panic!("wrong report variant");
        };
        assert_eq!(rows[0].date, "2024-09-08");
        assert_eq!(rows[1].date, "10/09/2024");
    }

    #[test]
    fn run_rejects_unknown_mode_and_missing_dates() {
        let d = dispatcher();
        let mut request = AnalysisRequest::new(vec!["tốt".into()]);

        let err = d.run(ReportKind::ReliefTrend, &request, None).unwrap_err();
        assert_eq!(err, ReportError::Shape(InputShapeError { texts: 1, dates: 0 }));

        request.model_type = "gpt".into();
        let err = d.run(ReportKind::IntentStats, &request, None).unwrap_err();
        assert!(matches!(err, ReportError::Mode(_)));

        // An explicit override wins over the request body.
        assert!(d.run(ReportKind::IntentStats, &request, Some(Mode::Keyword)).is_ok());
    }

    #[test]
    fn undated_reports_ignore_stray_dates() {
        let service = Arc::new(Counting::default());
        let d = dispatcher().with_model(ModelClassifier::new(service.clone()));
        let request = AnalysisRequest::new(vec!["nhà sập".into(), "cần gạo".into()])
            .with_dates(vec!["2024-09-07".into()]);

        let report = d.run(ReportKind::DamageLabels, &request, Some(Mode::Keyword)).unwrap();
        assert_eq!(
            report,
            Report::DamageLabels(vec![vec!["HouseDamage".into()], vec!["Other".into()]])
        );

        let err = d.run(ReportKind::ReliefTrend, &request, None).unwrap_err();
        assert_eq!(err, ReportError::Shape(InputShapeError { texts: 2, dates: 1 }));
        assert_eq!(service.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn report_serializes_as_bare_shape() {
        let report = dispatcher()
            .run(
                ReportKind::DamageFrequency,
                &AnalysisRequest::new(vec!["nhà sập".into()]),
                Some(Mode::Keyword),
            )
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({"HouseDamage": 1}));
    }

    #[test]
    fn kinds_know_their_date_needs() {
        let dated: Vec<_> = ReportKind::ALL.iter().filter(|k| k.needs_dates()).collect();
        assert_eq!(dated, vec![&ReportKind::SentimentTrend, &ReportKind::ReliefTrend]);
    }
}
