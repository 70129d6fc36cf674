//! Keyword taxonomies loaded from the external lexicon directory.
//!
//! A taxonomy maps category names to keyword lists. Category order is the
//! order of the source JSON object and is significant: classifiers walk
//! categories in that order. Taxonomies are validated once at startup and
//! never mutated afterwards.

use std::fmt;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::ConfigError;

/// Bucket names required in the sentiment-polarity taxonomy.
pub const POSITIVE_BUCKET: &str = "positive";
pub const NEGATIVE_BUCKET: &str = "negative";

/// The four independent taxonomies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyId {
    Damage,
    Relief,
    Intent,
    /// Positive/negative keyword buckets, used as a score source.
    Sentiment,
}

impl TaxonomyId {
    pub const ALL: [TaxonomyId; 4] = [Self::Damage, Self::Relief, Self::Intent, Self::Sentiment];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Damage => "damage",
            Self::Relief => "relief",
            Self::Intent => "intent",
            Self::Sentiment => "sentiment",
        }
    }

    /// Conventional file name inside the lexicon directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Damage => "damage_keywords.json",
            Self::Relief => "relief_keywords.json",
            Self::Intent => "intent_keywords.json",
            Self::Sentiment => "sentiment_keywords.json",
        }
    }
}

impl fmt::Display for TaxonomyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One category and its keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    keywords: Vec<String>,
    /// Lower-cased non-blank keywords used for matching. Padding is kept.
    needles: Vec<String>,
}

impl Category {
    fn new(name: String, keywords: Vec<String>) -> Self {
        let needles = keywords
            .iter()
            .filter(|kw| !kw.trim().is_empty())
            .map(|kw| kw.to_lowercase())
            .collect();
        Self {
            name,
            keywords,
            needles,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keywords exactly as configured.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Normalized keywords for case-insensitive substring matching.
    pub fn needles(&self) -> &[String] {
        &self.needles
    }
}

/// A validated category → keywords mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    id: TaxonomyId,
    categories: Vec<Category>,
}

impl Taxonomy {
    /// Build a taxonomy from `(category, keywords)` pairs, preserving their order.
    pub fn new<I, S, K>(id: TaxonomyId, entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, Vec<K>)>,
        S: Into<String>,
        K: Into<String>,
    {
        let mut categories: Vec<Category> = Vec::new();
        for (name, keywords) in entries {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(malformed(id, "category name is blank"));
            }
            if categories.iter().any(|c| c.name == name) {
                return Err(malformed(id, format!("duplicate category {name:?}")));
            }
            categories.push(Category::new(
                name,
                keywords.into_iter().map(Into::into).collect(),
            ));
        }

        if categories.is_empty() {
            return Err(malformed(id, "no categories"));
        }

        if id == TaxonomyId::Sentiment {
            for required in [POSITIVE_BUCKET, NEGATIVE_BUCKET] {
                if !categories.iter().any(|c| c.name == required) {
                    return Err(malformed(id, format!("missing {required:?} bucket")));
                }
            }
            if let Some(extra) = categories
                .iter()
                .find(|c| c.name != POSITIVE_BUCKET && c.name != NEGATIVE_BUCKET)
            {
                return Err(malformed(
                    id,
                    format!("unexpected bucket {:?}", extra.name),
                ));
            }
        }

        Ok(Self { id, categories })
    }

    /// Parse a JSON object of `string → [string]`.
    pub fn from_json_str(id: TaxonomyId, json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|source| ConfigError::Json { taxonomy: id, source })?;
        Self::from_json_value(id, value)
    }

    pub fn from_json_value(id: TaxonomyId, value: Value) -> Result<Self, ConfigError> {
        let Value::Object(map) = value else {
            return Err(malformed(id, "expected a JSON object of category → keyword list"));
        };

        let mut entries = Vec::with_capacity(map.len());
        for (name, keywords) in map {
            let Value::Array(items) = keywords else {
                return Err(malformed(
                    id,
                    format!("category {name:?} must map to a list of strings"),
                ));
            };
            let mut words = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => words.push(s),
                    other => {
                        return Err(malformed(
                            id,
                            format!("category {name:?} contains non-string keyword {other}"),
                        ));
                    }
                }
            }
            entries.push((name, words));
        }

        Self::new(id, entries)
    }

    /// Load and validate a taxonomy file.
    pub fn load(id: TaxonomyId, path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let taxonomy = Self::from_json_str(id, &json)?;
        info!(
            taxonomy = %id,
            categories = taxonomy.len(),
            path = %path.display(),
            "loaded lexicon"
        );
        Ok(taxonomy)
    }

    pub fn id(&self) -> TaxonomyId {
        self.id
    }

    /// Categories in configured order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category names in configured order (the candidate labels for model classification).
    pub fn labels(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total configured keywords across all categories.
    pub fn keyword_count(&self) -> usize {
        self.categories.iter().map(|c| c.keywords.len()).sum()
    }
}

fn malformed(id: TaxonomyId, reason: impl Into<String>) -> ConfigError {
    ConfigError::Malformed {
        taxonomy: id,
        reason: reason.into(),
    }
}

/// The four taxonomies, loaded together at process start.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub damage: Taxonomy,
    pub relief: Taxonomy,
    pub intent: Taxonomy,
    pub sentiment: Taxonomy,
}

/// Per-taxonomy size figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomySummary {
    pub id: TaxonomyId,
    pub categories: usize,
    pub keywords: usize,
}

impl Lexicon {
    /// Load a single taxonomy from `dir` by its conventional file name.
    pub fn load_taxonomy(dir: &Path, id: TaxonomyId) -> Result<Taxonomy, ConfigError> {
        Taxonomy::load(id, &dir.join(id.file_name()))
    }

    /// Load all four taxonomies from a lexicon directory.
    pub fn load_dir(dir: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            damage: Self::load_taxonomy(dir, TaxonomyId::Damage)?,
            relief: Self::load_taxonomy(dir, TaxonomyId::Relief)?,
            intent: Self::load_taxonomy(dir, TaxonomyId::Intent)?,
            sentiment: Self::load_taxonomy(dir, TaxonomyId::Sentiment)?,
        })
    }

    pub fn taxonomy(&self, id: TaxonomyId) -> &Taxonomy {
        match id {
            TaxonomyId::Damage => &self.damage,
            TaxonomyId::Relief => &self.relief,
            TaxonomyId::Intent => &self.intent,
            TaxonomyId::Sentiment => &self.sentiment,
        }
    }

    pub fn summary(&self) -> Vec<TaxonomySummary> {
        TaxonomyId::ALL
            .iter()
            .map(|&id| {
                let t = self.taxonomy(id);
                TaxonomySummary {
                    id,
                    categories: t.len(),
                    keywords: t.keyword_count(),
                }
            })
            .collect()
    }
}
