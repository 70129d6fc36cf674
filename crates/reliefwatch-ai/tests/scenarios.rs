//! End-to-end report scenarios over a lexicon loaded from disk.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use reliefwatch_ai::{
    BackendError, ClassificationService, Dispatcher, Mode, ModelClassifier, Report, ReportKind,
    ScoredLabel, keyword,
};
use reliefwatch_core::{AnalysisRequest, InputShapeError, Lexicon, Provenance, Sentiment, TaxonomyId};

fn write_lexicon(dir: &Path) {
    let files = [
        (
            TaxonomyId::Damage,
            r#"{"HouseDamage": ["nhà", "tốc mái"], "InfrastructureDamage": ["cầu", "cột điện"]}"#,
        ),
        (
            TaxonomyId::Relief,
            r#"{"Food_Water": ["gạo", "nước uống", "mì tôm"], "Medical": ["thuốc"], "Utilities": ["điện lực", "có điện lại"]}"#,
        ),
        (
            TaxonomyId::Intent,
            r#"{"Yêu cầu cứu trợ (Request/Demand)": ["cần", "xin"], "Cung cấp cứu trợ (Offer/Supply)": ["ủng hộ", "đã gửi"], "Tin tức chung (General News/Info)": ["cập nhật"]}"#,
        ),
        (
            TaxonomyId::Sentiment,
            r#"{"positive": ["tốt", "cảm ơn"], "negative": ["tồi", "thiếu"]}"#,
        ),
    ];
    for (id, json) in files {
        std::fs::write(dir.join(id.file_name()), json).unwrap();
    }
}

fn load() -> (tempfile::TempDir, Arc<Lexicon>) {
    let dir = tempfile::tempdir().unwrap();
    write_lexicon(dir.path());
    let lexicon = Lexicon::load_dir(dir.path()).unwrap();
    (dir, Arc::new(lexicon))
}

/// Deterministic stand-in for a model server. Texts containing `FAIL` make
/// the whole call fail; `[Label]` markers score that label at 0.9.
#[derive(Default)]
struct ScriptedService {
    batches: Mutex<Vec<usize>>,
}

impl ScriptedService {
    fn record(&self, texts: &[&str]) -> Result<(), BackendError> {
        self.batches.lock().unwrap().push(texts.len());
        if texts.iter().any(|t| t.contains("FAIL")) {
            return Err(BackendError::Unavailable("scripted failure".into()));
        }
        Ok(())
    }
}

impl ClassificationService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    fn sentiment(&self, texts: &[&str]) -> Result<Vec<String>, BackendError> {
        self.record(texts)?;
        Ok(texts
            .iter()
            .map(|t| if t.contains('+') { "POS" } else { "NEU" }.to_string())
            .collect())
    }

    fn zero_shot_multi_label(
        &self,
        texts: &[&str],
        candidates: &[&str],
    ) -> Result<Vec<Vec<ScoredLabel>>, BackendError> {
        self.record(texts)?;
        Ok(texts
            .iter()
            .map(|t| {
                candidates
                    .iter()
                    .map(|c| {
                        let marked = t.contains(&format!("[{c}]"));
                        ScoredLabel::new(*c, if marked { 0.9 } else { 0.05 })
                    })
                    .collect()
            })
            .collect())
    }

    fn zero_shot_single_label(
        &self,
        texts: &[&str],
        candidates: &[&str],
    ) -> Result<Vec<String>, BackendError> {
        self.record(texts)?;
        Ok(texts
            .iter()
            .map(|t| {
                candidates
                    .iter()
                    .find(|c| t.contains(&format!("[{c}]")))
                    .unwrap_or(&candidates[candidates.len() - 1])
                    .to_string()
            })
            .collect())
    }
}

#[test]
fn sentiment_trend_by_date() {
    let (_dir, lexicon) = load();
    let d = Dispatcher::new(lexicon);

    let rows = d
        .sentiment_trend(
            &["rất tốt", "quá tồi", "bình thường"],
            &["2024-09-01", "2024-09-01", "2024-09-02"],
            Mode::Keyword,
        )
        .unwrap();

    let json = serde_json::to_value(&rows).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"date": "2024-09-01", "positive": 1, "negative": 1, "neutral": 0},
            {"date": "2024-09-02", "positive": 0, "negative": 0, "neutral": 1},
        ])
    );
}

#[test]
fn mismatched_dates_are_rejected() {
    let (_dir, lexicon) = load();
    let d = Dispatcher::new(lexicon);

    let err = d.sentiment_trend(&["a", "b"], &["2024-01-01"], Mode::Keyword).unwrap_err();
    assert_eq!(err, InputShapeError { texts: 2, dates: 1 });
    assert_eq!(
        err.to_string(),
        "texts and dates must have the same length (got 2 texts, 1 dates)"
    );
}

#[test]
fn multi_category_document_counts_in_each_bucket() {
    let (_dir, lexicon) = load();
    let d = Dispatcher::new(lexicon);

    let stats = d.relief_sentiment(&["thiếu gạo và thuốc", "cảm ơn mì tôm"], Mode::Keyword);
    let food = stats.get("Food_Water").unwrap();
    let medical = stats.get("Medical").unwrap();
    assert_eq!((food.positive, food.negative), (1, 1));
    assert_eq!(medical.negative, 1);

    let total: u64 = stats.0.iter().map(|(_, c)| c.total()).sum();
    assert_eq!(total, 3, "one document contributes to two categories");
}

#[test]
fn failed_chunk_matches_keyword_output() {
    let (_dir, lexicon) = load();
    let service = Arc::new(ScriptedService::default());
    let model = ModelClassifier::new(service.clone()).with_chunk_size(2);
    let d = Dispatcher::new(lexicon.clone()).with_model(model);

    let texts = [
        "[Medical] + thiếu gạo",
        "FAIL cảm ơn thuốc",
        "[Utilities] có điện lại",
        "",
        "[Food_Water]",
    ];
    let decisions = d.classify(&texts, &lexicon.relief, Mode::Ai);
    assert_eq!(decisions.len(), texts.len());

    let expected = keyword::decide_batch(&texts[..2], &lexicon.relief, &lexicon.sentiment);
    assert_eq!(&decisions[..2], expected.as_slice());
    assert!(decisions[..2].iter().all(|d| d.provenance == Provenance::Keyword));

    assert_eq!(decisions[2].categories(), &["Utilities".to_string()]);
    assert_eq!(decisions[2].provenance, Provenance::Model);
    assert!(decisions[3].is_other());
    assert_eq!(decisions[3].sentiment, Sentiment::Neutral);
    assert_eq!(decisions[4].categories(), &["Food_Water".to_string()]);
}

#[test]
fn chunk_size_never_changes_reports() {
    let (_dir, lexicon) = load();
    let texts: Vec<String> = (0..19)
        .map(|i| match i % 5 {
            0 => format!("[Medical] + tin {i}"),
            1 => format!("[Food_Water][Utilities] {i}"),
            2 => String::new(),
            3 => format!("thiếu gạo {i}"),
            _ => format!("+ {i}"),
        })
        .collect();
    let dates: Vec<String> = (0..texts.len()).map(|i| format!("2024-09-{:02}", 7 + i % 3)).collect();
    let texts: Vec<&str> = texts.iter().map(String::as_str).collect();

    let run = |chunk: usize| {
        let model = ModelClassifier::new(Arc::new(ScriptedService::default())).with_chunk_size(chunk);
        let d = Dispatcher::new(lexicon.clone()).with_model(model);
        (
            d.relief_trend(&texts, &dates, Mode::Ai).unwrap(),
            d.damage_frequency(&texts, Mode::Ai),
            d.intent_stats(&texts, Mode::Ai),
        )
    };

    let reference = run(1);
    for chunk in [2, 4, 8, 100] {
        assert_eq!(run(chunk), reference, "chunk size {chunk}");
    }
}

#[test]
fn service_sees_fixed_chunks_without_blanks() {
    let (_dir, lexicon) = load();
    let service = Arc::new(ScriptedService::default());
    let model = ModelClassifier::new(service.clone()).with_chunk_size(3);
    let d = Dispatcher::new(lexicon).with_model(model);

    let texts = ["a", "", "b", "c", "d", "  ", "e"];
    d.classify_sentiments(&texts, Mode::Ai);
    assert_eq!(*service.batches.lock().unwrap(), vec![2, 2, 1]);
}

#[test]
fn intent_report_from_request_body() {
    let (_dir, lexicon) = load();
    let d = Dispatcher::new(lexicon)
        .with_model(ModelClassifier::new(Arc::new(ScriptedService::default())));

    let request: AnalysisRequest = serde_json::from_str(
        r#"{
            "texts": ["cần xuồng gấp", "đã gửi 50 thùng mì", "cập nhật bão số 3", null],
            "model_type": "keyword"
        }"#,
    )
    .unwrap();

    let report = d.run(ReportKind::IntentStats, &request, None).unwrap();
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        serde_json::json!({"Request": 1, "Offer": 1, "News": 2})
    );

    // Same body in ai mode: the scripted service picks the last candidate
    // unless a label is marked.
    let Report::IntentStats(counts) = d.run(ReportKind::IntentStats, &request, Some(Mode::Ai)).unwrap()
    else {
        panic!("wrong report variant");
    };
    assert_eq!(counts.total(), 4);
    assert_eq!(counts.news, 4);
}

#[test]
fn shipped_lexicon_loads() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config");
    let lexicon = Lexicon::load_dir(&dir).unwrap();

    assert_eq!(lexicon.relief.len(), 6);
    assert_eq!(lexicon.damage.len(), 5);
    assert_eq!(lexicon.intent.len(), 3);

    let d = Dispatcher::new(Arc::new(lexicon));
    let labels = d.damage_labels(&["Mất điện, cột điện đổ, nhà tốc mái"], Mode::Keyword);
    assert_eq!(labels[0], vec!["HouseDamage", "InfrastructureDamage", "PropertyLost"]);
}
