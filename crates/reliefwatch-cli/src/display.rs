//! Report rendering: pretty JSON for machines, Arrow tables for people.

use std::sync::Arc;

use arrow::array::{StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use clap::ValueEnum;
use reliefwatch_ai::Report;
use reliefwatch_core::schema::report as tables;
use reliefwatch_core::taxonomy::TaxonomySummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Json,
    Table,
}

pub fn render_report(report: &Report, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(report)?),
        Format::Table => table(report_batch(report)?),
    }
}

pub fn render_lexicon(summary: &[TaxonomySummary], format: Format) -> anyhow::Result<String> {
    match format {
        Format::Json => {
            let rows: Vec<serde_json::Value> = summary
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "taxonomy": s.id.as_str(),
                        "file": s.id.file_name(),
                        "categories": s.categories,
                        "keywords": s.keywords,
                    })
                })
                .collect();
            Ok(serde_json::to_string_pretty(&rows)?)
        }
        Format::Table => table(lexicon_batch(summary)?),
    }
}

fn report_batch(report: &Report) -> anyhow::Result<RecordBatch> {
    let batch = match report {
        Report::SentimentTrend(rows) => tables::date_summary_batch(rows)?,
        Report::DamageFrequency(freq) => tables::frequency_batch(freq)?,
        Report::DamageLabels(labels) => tables::labels_batch(labels)?,
        Report::ReliefSentiment(stats) => tables::category_sentiment_batch(stats)?,
        Report::ReliefTrend(rows) => tables::date_category_batch(rows)?,
        Report::IntentStats(counts) => tables::intent_batch(counts)?,
    };
    Ok(batch)
}

fn lexicon_batch(summary: &[TaxonomySummary]) -> anyhow::Result<RecordBatch> {
    let schema = Schema::new(vec![
        Field::new("taxonomy", DataType::Utf8, false),
        Field::new("categories", DataType::UInt64, false),
        Field::new("keywords", DataType::UInt64, false),
    ]);
    Ok(RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(StringArray::from_iter_values(summary.iter().map(|s| s.id.as_str()))),
            Arc::new(UInt64Array::from_iter_values(
                summary.iter().map(|s| s.categories as u64),
            )),
            Arc::new(UInt64Array::from_iter_values(
                summary.iter().map(|s| s.keywords as u64),
            )),
        ],
    )?)
}

fn table(batch: RecordBatch) -> anyhow::Result<String> {
    Ok(pretty_format_batches(&[batch])?.to_string())
}
