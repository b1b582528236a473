//! App Table Cleaner.
//!
//! Turns the raw Play Store metadata table into one cleaned row per
//! application. Stages run strictly in order; each one reads what the
//! previous one left behind.

pub mod coerce;
pub mod impute;

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::AppsConfig;
use crate::constants::*;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::ingestion::RawTable;
use crate::types::{AppRecord, AppType};

use self::impute::GroupMedians;

/// Counts reported once the app table is cleaned
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppCleanSummary {
    pub raw_rows: usize,
    pub corrupted_rows_dropped: usize,
    pub duplicate_rows_dropped: usize,
    pub final_rows: usize,
    pub missing_rating: usize,
    pub missing_reviews: usize,
    pub missing_installs: usize,
    pub missing_size_before_imputation: usize,
    pub missing_size_after_imputation: usize,
    pub missing_android_version_before_imputation: usize,
    pub missing_android_version_after_imputation: usize,
}

#[derive(Debug, Clone)]
pub struct AppCleanOutput {
    pub records: Vec<AppRecord>,
    pub summary: AppCleanSummary,
}

impl AppCleanOutput {
    /// Identifiers present in the cleaned table, used by the review join
    pub fn identifiers(&self) -> HashSet<String> {
        self.records.iter().filter_map(|r| r.app.clone()).collect()
    }
}

/// Working row: raw text for fields not yet coerced, typed values once they are
#[derive(Debug, Clone, Default)]
struct AppRow {
    app: Option<String>,
    category: Option<String>,
    rating: Option<f64>,
    reviews_raw: Option<String>,
    size_raw: Option<String>,
    installs_raw: Option<String>,
    type_raw: Option<String>,
    price_raw: Option<String>,
    content_rating: Option<String>,
    genres: Option<String>,
    last_updated_raw: Option<String>,
    android_ver_raw: Option<String>,

    last_updated: Option<NaiveDate>,
    reviews: Option<u64>,
    installs: Option<u64>,
    size_mb: Option<f64>,
    price: Option<f64>,
    app_type: Option<AppType>,
    android_min_version: Option<f64>,
}

impl AppRow {
    /// Only derived fields survive; the raw Size, Current Ver and Android Ver
    /// text never reaches the output record.
    fn into_record(self) -> AppRecord {
        AppRecord {
            app: self.app,
            category: self.category,
            rating: self.rating,
            reviews: self.reviews,
            installs: self.installs,
            app_type: self.app_type.unwrap_or(AppType::Free),
            price: self.price,
            content_rating: self.content_rating,
            genres: self.genres,
            last_updated: self.last_updated,
            size_mb: self.size_mb,
            android_min_version: self.android_min_version,
            rating_display: String::new(),
        }
    }
}

pub struct AppTableCleaner {
    config: AppsConfig,
}

impl AppTableCleaner {
    pub fn new(config: AppsConfig) -> Self {
        Self { config }
    }

    /// Run every stage over the raw table
    #[instrument(skip_all, fields(table = %table.name()))]
    pub fn clean(&self, table: &RawTable) -> Result<AppCleanOutput> {
        let rows = load_rows(table)?;
        let mut summary = AppCleanSummary {
            raw_rows: rows.len(),
            ..Default::default()
        };
        info!("Original: {} rows", summary.raw_rows);
        metrics::apps::rows_read(summary.raw_rows);

        let (mut rows, corrupted) = filter_corrupted(rows, &self.config.corrupted_category);
        summary.corrupted_rows_dropped = corrupted;
        metrics::apps::rows_dropped("corrupted_category", corrupted);

        normalize_identity(&mut rows);

        let (mut rows, duplicates) = dedup_keep_latest(rows, &self.config.date_formats);
        summary.duplicate_rows_dropped = duplicates;
        metrics::apps::rows_dropped("duplicate", duplicates);
        debug!(corrupted, duplicates, remaining = rows.len(), "Row filters applied");

        coerce_installs(&mut rows);
        coerce_sizes(&mut rows);
        coerce_prices(&mut rows);
        coerce_reviews(&mut rows);
        sanitize_ratings(&mut rows);
        derive_types(&mut rows);

        summary.missing_size_before_imputation =
            rows.iter().filter(|r| r.size_mb.is_none()).count();
        let size_imputed = impute_sizes(&mut rows);
        metrics::apps::values_imputed("size_mb", size_imputed);

        extract_android_versions(&mut rows);
        summary.missing_android_version_before_imputation =
            rows.iter().filter(|r| r.android_min_version.is_none()).count();
        let version_imputed =
            impute_android_versions(&mut rows, self.config.android_version_fallback);
        metrics::apps::values_imputed("android_min_version", version_imputed);

        let mut records: Vec<AppRecord> = rows.into_iter().map(AppRow::into_record).collect();
        for record in &mut records {
            round_record(record);
            record.rating_display = coerce::rating_display(record.rating);
            record.genres = record.genres.as_deref().map(coerce::normalize_genres);
        }

        summary.final_rows = records.len();
        summary.missing_rating = records.iter().filter(|r| r.rating.is_none()).count();
        summary.missing_reviews = records.iter().filter(|r| r.reviews.is_none()).count();
        summary.missing_installs = records.iter().filter(|r| r.installs.is_none()).count();
        summary.missing_size_after_imputation =
            records.iter().filter(|r| r.size_mb.is_none()).count();
        summary.missing_android_version_after_imputation =
            records.iter().filter(|r| r.android_min_version.is_none()).count();

        metrics::apps::missing_values("size_mb", summary.missing_size_after_imputation);
        metrics::apps::missing_values(
            "android_min_version",
            summary.missing_android_version_after_imputation,
        );

        if summary.missing_size_after_imputation > 0 {
            warn!(
                "{} rows still have no Size_MB: no size is known for any app",
                summary.missing_size_after_imputation
            );
        }
        info!("Final: {} rows", summary.final_rows);
        info!("Missing Size_MB: {}", summary.missing_size_after_imputation);
        info!(
            "Missing Android_Min_Version: {}",
            summary.missing_android_version_after_imputation
        );

        Ok(AppCleanOutput { records, summary })
    }
}

/// Round size to 2 decimals, version to 1, price to 2 and rating to 1.
/// Applying it twice gives the same record.
pub fn round_record(record: &mut AppRecord) {
    record.size_mb = record.size_mb.map(|v| coerce::round_to(v, 2));
    record.android_min_version = record.android_min_version.map(|v| coerce::round_to(v, 1));
    record.price = record.price.map(|v| coerce::round_to(v, 2));
    record.rating = record.rating.map(|v| coerce::round_to(v, 1));
}

fn load_rows(table: &RawTable) -> Result<Vec<AppRow>> {
    table.require_columns(APP_REQUIRED_COLUMNS)?;

    let app = table.column(COL_APP)?;
    let category = table.column(COL_CATEGORY)?;
    let rating = table.column(COL_RATING)?;
    let reviews = table.column(COL_REVIEWS)?;
    let size = table.column(COL_SIZE)?;
    let installs = table.column(COL_INSTALLS)?;
    let app_type = table.column(COL_TYPE)?;
    let price = table.column(COL_PRICE)?;
    let content_rating = table.column(COL_CONTENT_RATING)?;
    let genres = table.column(COL_GENRES)?;
    let last_updated = table.column(COL_LAST_UPDATED)?;
    let android_ver = table.column(COL_ANDROID_VER)?;

    let text = |row: usize, col: usize| table.cell(row, col).map(str::to_string);

    Ok((0..table.len())
        .map(|i| AppRow {
            app: text(i, app),
            category: text(i, category),
            rating: table.cell(i, rating).and_then(coerce::parse_float),
            reviews_raw: text(i, reviews),
            size_raw: text(i, size),
            installs_raw: text(i, installs),
            type_raw: text(i, app_type),
            price_raw: text(i, price),
            content_rating: text(i, content_rating),
            genres: text(i, genres),
            last_updated_raw: text(i, last_updated),
            android_ver_raw: text(i, android_ver),
            ..Default::default()
        })
        .collect())
}

/// Stage 1: drop the known malformed feed row
fn filter_corrupted(rows: Vec<AppRow>, sentinel: &str) -> (Vec<AppRow>, usize) {
    let before = rows.len();
    let kept: Vec<AppRow> = rows
        .into_iter()
        .filter(|r| r.category.as_deref() != Some(sentinel))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Stage 2
fn normalize_identity(rows: &mut [AppRow]) {
    for row in rows {
        row.app = row.app.as_deref().map(coerce::normalize_app_name);
    }
}

/// Stage 3: latest "Last Updated" wins per normalized name.
///
/// Unparseable dates sort last; the sort is stable so equal dates keep
/// input order. Rows stay in this order for the rest of the pipeline.
fn dedup_keep_latest(mut rows: Vec<AppRow>, date_formats: &[String]) -> (Vec<AppRow>, usize) {
    for row in rows.iter_mut() {
        row.last_updated = row
            .last_updated_raw
            .as_deref()
            .and_then(|raw| coerce::parse_last_updated(raw, date_formats));
    }

    // None < Some(_), so descending order puts absent dates at the end
    rows.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));

    let before = rows.len();
    let mut seen: HashSet<Option<String>> = HashSet::new();
    rows.retain(|row| seen.insert(row.app.clone()));
    let dropped = before - rows.len();
    (rows, dropped)
}

/// Stage 4
fn coerce_installs(rows: &mut [AppRow]) {
    for row in rows {
        row.installs = row.installs_raw.as_deref().and_then(coerce::clean_installs);
    }
}

/// Stage 5
fn coerce_sizes(rows: &mut [AppRow]) {
    for row in rows {
        row.size_mb = row.size_raw.as_deref().and_then(coerce::parse_size_mb);
    }
}

/// Stage 6
fn coerce_prices(rows: &mut [AppRow]) {
    for row in rows {
        row.price = row.price_raw.as_deref().and_then(coerce::parse_price);
    }
}

/// Stage 7
fn coerce_reviews(rows: &mut [AppRow]) {
    for row in rows {
        row.reviews = row.reviews_raw.as_deref().and_then(coerce::parse_count);
    }
}

/// Stage 8
fn sanitize_ratings(rows: &mut [AppRow]) {
    for row in rows {
        row.rating = coerce::sanitize_rating(row.rating);
    }
}

/// Stage 9: price decides the type whenever it is known
fn derive_types(rows: &mut [AppRow]) {
    for row in rows {
        let labelled = row
            .type_raw
            .as_deref()
            .map(AppType::from_label)
            .unwrap_or(AppType::Free);
        row.app_type = Some(match row.price {
            Some(p) if p > 0.0 => AppType::Paid,
            Some(_) => AppType::Free,
            None => labelled,
        });
    }
}

/// Stage 10: category median size, else the global median. Returns the number imputed.
fn impute_sizes(rows: &mut [AppRow]) -> usize {
    let medians = GroupMedians::build(rows.iter().map(|r| (r.category.as_deref(), r.size_mb)));
    let mut imputed = 0;
    for row in rows.iter_mut().filter(|r| r.size_mb.is_none()) {
        row.size_mb = medians.lookup_or(row.category.as_deref(), medians.global());
        if row.size_mb.is_some() {
            imputed += 1;
        }
    }
    imputed
}

/// Stage 11
fn extract_android_versions(rows: &mut [AppRow]) {
    for row in rows {
        row.android_min_version = row
            .android_ver_raw
            .as_deref()
            .and_then(coerce::extract_android_version);
    }
}

/// Stage 12: category median version, else the configured fallback
fn impute_android_versions(rows: &mut [AppRow], fallback: f64) -> usize {
    let medians =
        GroupMedians::build(rows.iter().map(|r| (r.category.as_deref(), r.android_min_version)));
    let mut imputed = 0;
    for row in rows.iter_mut() {
        if row.android_min_version.is_none() {
            row.android_min_version = medians.lookup_or(row.category.as_deref(), Some(fallback));
            imputed += 1;
        }
        row.android_min_version = row.android_min_version.map(|v| coerce::round_to(v, 1));
    }
    imputed
}
