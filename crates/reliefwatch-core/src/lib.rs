pub mod aggregate;
pub mod dates;
pub mod decision;
pub mod error;
pub mod request;
pub mod schema;
pub mod taxonomy;

pub use aggregate::{
    CategoryFrequency, CategorySentiment, DateCategorySummary, DateSummary, IntentCounts,
    IntentKind, SentimentCounts,
};
pub use decision::{Decision, Document, OTHER_CATEGORY, Provenance, Sentiment};
pub use error::{ConfigError, InputShapeError};
pub use request::AnalysisRequest;
pub use taxonomy::{Category, Lexicon, Taxonomy, TaxonomyId};
