use std::path::PathBuf;

use thiserror::Error;

use crate::taxonomy::TaxonomyId;

/// Lexicon loading failure. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("lexicon file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{taxonomy} lexicon is not valid JSON: {source}")]
    Json {
        taxonomy: TaxonomyId,
        #[source]
        source: serde_json::Error,
    },

    #[error("{taxonomy} lexicon is malformed: {reason}")]
    Malformed { taxonomy: TaxonomyId, reason: String },
}

/// Texts and dates of a date-keyed report differ in length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("texts and dates must have the same length (got {texts} texts, {dates} dates)")]
pub struct InputShapeError {
    pub texts: usize,
    pub dates: usize,
}

impl InputShapeError {
    /// Succeeds only when both lengths agree.
    pub fn check(texts: usize, dates: usize) -> Result<(), Self> {
        if texts == dates {
            Ok(())
        } else {
            Err(Self { texts, dates })
        }
    }
}
