//! Analysis request body shared by every report.

use serde::{Deserialize, Deserializer, Serialize};

/// Mode used when a request does not name one.
pub const DEFAULT_MODE: &str = "ai";

/// A batch of snippets to analyse.
///
/// Mirrors the JSON accepted by the report endpoints:
/// `{"texts": [...], "dates": [...], "model_type": "ai"}`. `dates` is only
/// required by the date-keyed reports. A `null` text is treated as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(deserialize_with = "nullable_texts")]
    pub texts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<Vec<String>>,
    #[serde(default = "default_mode")]
    pub model_type: String,
}

fn default_mode() -> String {
    DEFAULT_MODE.to_string()
}

fn nullable_texts<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let texts: Vec<Option<String>> = Vec::deserialize(deserializer)?;
    Ok(texts.into_iter().map(Option::unwrap_or_default).collect())
}

impl AnalysisRequest {
    pub fn new(texts: Vec<String>) -> Self {
        Self {
            texts,
            dates: None,
            model_type: default_mode(),
        }
    }

    pub fn with_dates(mut self, dates: Vec<String>) -> Self {
        self.dates = Some(dates);
        self
    }
}
