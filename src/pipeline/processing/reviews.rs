//! Review Table Cleaner.
//!
//! Filters unusable review rows, normalizes sentiment fields and keeps only
//! reviews of applications present in the cleaned app table.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::ReviewsConfig;
use crate::constants::*;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::ingestion::RawTable;
use crate::pipeline::processing::apps::coerce::{parse_float, round_to};
use crate::types::ReviewRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewCleanSummary {
    pub raw_rows: usize,
    pub placeholder_rows_dropped: usize,
    pub invalid_sentiment_dropped: usize,
    pub unmatched_app_dropped: usize,
    pub final_rows: usize,
    pub distinct_apps: usize,
}

#[derive(Debug, Clone)]
pub struct ReviewCleanOutput {
    pub records: Vec<ReviewRecord>,
    pub summary: ReviewCleanSummary,
}

pub struct ReviewTableCleaner {
    config: ReviewsConfig,
}

impl ReviewTableCleaner {
    pub fn new(config: ReviewsConfig) -> Self {
        Self { config }
    }

    /// Clean the raw review table against the identifiers of the cleaned app table
    #[instrument(skip_all, fields(table = %table.name(), known_apps = app_ids.len()))]
    pub fn clean(&self, table: &RawTable, app_ids: &HashSet<String>) -> Result<ReviewCleanOutput> {
        table.require_columns(REVIEW_REQUIRED_COLUMNS)?;
        let app_col = table.column(COL_APP)?;
        let review_col = table.column(COL_TRANSLATED_REVIEW)?;
        let sentiment_col = table.column(COL_SENTIMENT)?;
        let polarity_col = table.column(COL_SENTIMENT_POLARITY)?;
        let subjectivity_col = table.column(COL_SENTIMENT_SUBJECTIVITY)?;

        let mut summary = ReviewCleanSummary {
            raw_rows: table.len(),
            ..Default::default()
        };
        info!("Raw reviews: {} rows", summary.raw_rows);
        metrics::reviews::rows_read(summary.raw_rows);

        let mut records = Vec::new();
        for i in 0..table.len() {
            // Absent identifiers textify to the placeholder and fall out below
            let app = table
                .cell(i, app_col)
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| NAN_PLACEHOLDER.to_string());

            let Some(review) = usable_review_text(&app, table.cell(i, review_col)) else {
                summary.placeholder_rows_dropped += 1;
                continue;
            };

            let Some(sentiment) = self.normalize_sentiment(table.cell(i, sentiment_col)) else {
                summary.invalid_sentiment_dropped += 1;
                continue;
            };

            let polarity = table.cell(i, polarity_col).and_then(parse_float);
            let subjectivity = table.cell(i, subjectivity_col).and_then(parse_float);

            records.push(ReviewRecord {
                app,
                translated_review: review.to_string(),
                sentiment,
                sentiment_polarity: polarity.map(|v| round_to(v, 4)),
                sentiment_subjectivity: subjectivity.map(|v| round_to(v, 4)),
            });
        }

        // Set-membership filter; no app columns are merged in
        let before_join = records.len();
        records.retain(|r| app_ids.contains(&r.app));
        summary.unmatched_app_dropped = before_join - records.len();

        summary.final_rows = records.len();
        summary.distinct_apps = records
            .iter()
            .map(|r| r.app.as_str())
            .collect::<HashSet<_>>()
            .len();

        metrics::reviews::rows_dropped("placeholder", summary.placeholder_rows_dropped);
        metrics::reviews::rows_dropped("invalid_sentiment", summary.invalid_sentiment_dropped);
        metrics::reviews::rows_dropped("unmatched_app", summary.unmatched_app_dropped);
        metrics::reviews::distinct_apps(summary.distinct_apps);

        debug!(
            placeholder = summary.placeholder_rows_dropped,
            invalid_sentiment = summary.invalid_sentiment_dropped,
            unmatched_app = summary.unmatched_app_dropped,
            "Review filters applied"
        );
        info!("After full cleaning: {} reviews", summary.final_rows);
        info!("Unique apps with reviews: {}", summary.distinct_apps);

        Ok(ReviewCleanOutput { records, summary })
    }

    fn normalize_sentiment(&self, raw: Option<&str>) -> Option<String> {
        let sentiment = title_case(raw?);
        self.config
            .valid_sentiments
            .iter()
            .any(|valid| *valid == sentiment)
            .then_some(sentiment)
    }
}

/// Review text, unless the row is a placeholder left by an upstream export
fn usable_review_text<'a>(app: &str, review: Option<&'a str>) -> Option<&'a str> {
    if app == NAN_PLACEHOLDER {
        return None;
    }
    review.filter(|text| text.to_lowercase() != NAN_PLACEHOLDER)
}

/// Uppercase the first letter of each alphabetic run, lowercase the rest
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_word = false;
    for c in raw.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReaderConfig;

    const HEADER: &str =
        "App,Translated_Review,Sentiment,Sentiment_Polarity,Sentiment_Subjectivity\n";

    fn clean(rows: &str, apps: &[&str]) -> ReviewCleanOutput {
        let content = format!("{}{}", HEADER, rows);
        let table =
            RawTable::from_reader("reviews", content.as_bytes(), &ReaderConfig::default())
                .unwrap();
        let ids: HashSet<String> = apps.iter().map(|s| s.to_string()).collect();
        ReviewTableCleaner::new(ReviewsConfig::default())
            .clean(&table, &ids)
            .unwrap()
    }

    #[test]
    fn title_case_matches_sentiment_labels() {
        assert_eq!(title_case("positive"), "Positive");
        assert_eq!(title_case("NEGATIVE"), "Negative");
        assert_eq!(title_case("neutral"), "Neutral");
        assert_eq!(title_case("very good"), "Very Good");
    }

    #[test]
    fn placeholder_rows_are_dropped() {
        let output = clean(
            "foo,nan,Positive,0.5,0.5\n\
             foo,NaN,Positive,0.5,0.5\n\
             foo,,Positive,0.5,0.5\n\
             ,Great app,Positive,0.5,0.5\n\
             nan,Great app,Positive,0.5,0.5\n\
             foo,Great app,Positive,0.5,0.5\n",
            &["foo"],
        );
        assert_eq!(output.summary.raw_rows, 6);
        assert_eq!(output.summary.placeholder_rows_dropped, 5);
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].translated_review, "Great app");
    }

    #[test]
    fn sentiment_is_title_cased_and_validated() {
        let output = clean(
            "foo,a,positive,0.1,0.2\n\
             foo,b,NEUTRAL,0.0,0.0\n\
             foo,c,Mixed,0.1,0.2\n\
             foo,d,,0.1,0.2\n",
            &["foo"],
        );
        let sentiments: Vec<_> = output.records.iter().map(|r| r.sentiment.as_str()).collect();
        assert_eq!(sentiments, vec!["Positive", "Neutral"]);
        assert_eq!(output.summary.invalid_sentiment_dropped, 2);
    }

    #[test]
    fn numeric_fields_are_rounded_and_may_be_absent() {
        let output = clean(
            "foo,a,Positive,0.123456,0.987654\n\
             foo,b,Negative,oops,\n",
            &["foo"],
        );
        assert_eq!(output.records.len(), 2);
        assert_eq!(output.records[0].sentiment_polarity, Some(0.1235));
        assert_eq!(output.records[0].sentiment_subjectivity, Some(0.9877));
        assert_eq!(output.records[1].sentiment_polarity, None);
        assert_eq!(output.records[1].sentiment_subjectivity, None);
    }

    #[test]
    fn join_keeps_only_known_apps() {
        let output = clean(
            " foo ,a,Positive,0.1,0.2\n\
             bar,b,Positive,0.1,0.2\n\
             baz,c,Positive,0.1,0.2\n\
             foo,d,Negative,-0.1,0.2\n",
            &["foo", "baz"],
        );
        assert_eq!(output.summary.unmatched_app_dropped, 1);
        assert_eq!(output.summary.final_rows, 3);
        assert_eq!(output.summary.distinct_apps, 2);
        assert!(output.records.iter().all(|r| r.app == "foo" || r.app == "baz"));
    }
}
