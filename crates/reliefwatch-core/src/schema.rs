/// Arrow schemas and record batches for report output.
pub mod report {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, ListBuilder, StringArray, StringBuilder, UInt64Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::error::ArrowError;
    use arrow::record_batch::RecordBatch;

    use crate::aggregate::{
        CategoryFrequency, CategorySentiment, DateCategorySummary, DateSummary, IntentCounts,
        SentimentCounts,
    };

    fn count_fields() -> [Field; 3] {
        [
            Field::new("positive", DataType::UInt64, false),
            Field::new("negative", DataType::UInt64, false),
            Field::new("neutral", DataType::UInt64, false),
        ]
    }

    /// Schema for the sentiment trend.
    pub fn date_summary_schema() -> Schema {
        let mut fields = vec![Field::new("date", DataType::Utf8, false)];
        fields.extend(count_fields());
        Schema::new(fields)
    }

    /// Schema for the relief trend.
    pub fn date_category_schema() -> Schema {
        let mut fields = vec![
            Field::new("date", DataType::Utf8, false),
            Field::new("category", DataType::Utf8, false),
        ];
        fields.extend(count_fields());
        Schema::new(fields)
    }

    /// Schema for per-category sentiment.
    pub fn category_sentiment_schema() -> Schema {
        let mut fields = vec![Field::new("category", DataType::Utf8, false)];
        fields.extend(count_fields());
        Schema::new(fields)
    }

    /// Schema for category and intent frequencies.
    pub fn frequency_schema() -> Schema {
        Schema::new(vec![
            Field::new("category", DataType::Utf8, false),
            Field::new("count", DataType::UInt64, false),
        ])
    }

    /// Schema for per-document category labels.
    pub fn labels_schema() -> Schema {
        Schema::new(vec![
            Field::new("document", DataType::UInt64, false),
            Field::new(
                "categories",
                DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
                false,
            ),
        ])
    }

    fn count_columns<'a>(counts: impl Iterator<Item = &'a SentimentCounts> + Clone) -> [ArrayRef; 3] {
        [
            Arc::new(UInt64Array::from_iter_values(counts.clone().map(|c| c.positive))),
            Arc::new(UInt64Array::from_iter_values(counts.clone().map(|c| c.negative))),
            Arc::new(UInt64Array::from_iter_values(counts.map(|c| c.neutral))),
        ]
    }

    pub fn date_summary_batch(rows: &[DateSummary]) -> Result<RecordBatch, ArrowError> {
        let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.date.as_str()),
        ))];
        columns.extend(count_columns(rows.iter().map(|r| &r.counts)));
        RecordBatch::try_new(Arc::new(date_summary_schema()), columns)
    }

    pub fn date_category_batch(rows: &[DateCategorySummary]) -> Result<RecordBatch, ArrowError> {
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.date.as_str()))),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.category.as_str()),
            )),
        ];
        columns.extend(count_columns(rows.iter().map(|r| &r.counts)));
        RecordBatch::try_new(Arc::new(date_category_schema()), columns)
    }

    pub fn category_sentiment_batch(stats: &CategorySentiment) -> Result<RecordBatch, ArrowError> {
        let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from_iter_values(
            stats.0.iter().map(|(c, _)| c.as_str()),
        ))];
        columns.extend(count_columns(stats.0.iter().map(|(_, counts)| counts)));
        RecordBatch::try_new(Arc::new(category_sentiment_schema()), columns)
    }

    pub fn frequency_batch(freq: &CategoryFrequency) -> Result<RecordBatch, ArrowError> {
        RecordBatch::try_new(
            Arc::new(frequency_schema()),
            vec![
                Arc::new(StringArray::from_iter_values(freq.0.iter().map(|(c, _)| c.as_str()))),
                Arc::new(UInt64Array::from_iter_values(freq.0.iter().map(|(_, n)| *n))),
            ],
        )
    }

    pub fn labels_batch(labels: &[Vec<String>]) -> Result<RecordBatch, ArrowError> {
        let mut categories = ListBuilder::new(StringBuilder::new());
        for cats in labels {
            for c in cats {
                categories.values().append_value(c);
            }
            categories.append(true);
        }
        RecordBatch::try_new(
            Arc::new(labels_schema()),
            vec![
                Arc::new(UInt64Array::from_iter_values(0..labels.len() as u64)),
                Arc::new(categories.finish()),
            ],
        )
    }

    pub fn intent_batch(counts: &IntentCounts) -> Result<RecordBatch, ArrowError> {
        RecordBatch::try_new(
            Arc::new(frequency_schema()),
            vec![
                Arc::new(StringArray::from(vec!["Request", "Offer", "News"])),
                Arc::new(UInt64Array::from(vec![counts.request, counts.offer, counts.news])),
            ],
        )
    }
}
