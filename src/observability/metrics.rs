//! Metrics for the cleaning pipelines.
//!
//! Counters and gauges go through the `metrics` facade. The CLI installs an
//! in-process Prometheus recorder and can render a snapshot to a text file
//! after the run; without a recorder every call here is a no-op.

use std::fmt;
use std::fs;
use std::path::Path;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

use crate::error::{CleanerError, Result};

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Every metric name used by the cleaner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // App table metrics
    AppsRowsRead,
    AppsRowsDropped,
    AppsValuesImputed,
    AppsRowsWritten,
    AppsMissingValues,

    // Review table metrics
    ReviewsRowsRead,
    ReviewsRowsDropped,
    ReviewsRowsWritten,
    ReviewsDistinctApps,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::AppsRowsRead => "playstore_apps_rows_read_total",
            MetricName::AppsRowsDropped => "playstore_apps_rows_dropped_total",
            MetricName::AppsValuesImputed => "playstore_apps_values_imputed_total",
            MetricName::AppsRowsWritten => "playstore_apps_rows_written_total",
            MetricName::AppsMissingValues => "playstore_apps_missing_values",

            MetricName::ReviewsRowsRead => "playstore_reviews_rows_read_total",
            MetricName::ReviewsRowsDropped => "playstore_reviews_rows_dropped_total",
            MetricName::ReviewsRowsWritten => "playstore_reviews_rows_written_total",
            MetricName::ReviewsDistinctApps => "playstore_reviews_distinct_apps",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Install the in-process recorder. Safe to call more than once.
pub fn init() -> Result<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| {
            CleanerError::Metrics(format!("Failed to install Prometheus recorder: {}", e))
        })?;
    let _ = METRICS_HANDLE.set(handle);
    info!("Metrics recorder initialized");
    Ok(())
}

/// Current metrics in Prometheus text format, if a recorder is installed
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

/// Write the current snapshot to `path` (textfile-collector style)
pub fn write_snapshot(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let body = render().ok_or_else(|| {
        CleanerError::Metrics("metrics recorder is not initialized".to_string())
    })?;
    fs::write(path, body)?;
    info!("Wrote metrics snapshot to {}", path.display());
    Ok(())
}

pub mod apps {
    use super::MetricName;

    pub fn rows_read(count: usize) {
        ::metrics::counter!(MetricName::AppsRowsRead.as_str()).increment(count as u64);
    }

    /// Rows removed by a filter stage, labelled by reason
    pub fn rows_dropped(reason: &'static str, count: usize) {
        ::metrics::counter!(MetricName::AppsRowsDropped.as_str(), "reason" => reason)
            .increment(count as u64);
    }

    pub fn values_imputed(field: &'static str, count: usize) {
        ::metrics::counter!(MetricName::AppsValuesImputed.as_str(), "field" => field)
            .increment(count as u64);
    }

    /// Absent values left in a field after the pipeline finished
    pub fn missing_values(field: &'static str, count: usize) {
        ::metrics::gauge!(MetricName::AppsMissingValues.as_str(), "field" => field)
            .set(count as f64);
    }

    pub fn rows_written(count: usize) {
        ::metrics::counter!(MetricName::AppsRowsWritten.as_str()).increment(count as u64);
    }
}

pub mod reviews {
    use super::MetricName;

    pub fn rows_read(count: usize) {
        ::metrics::counter!(MetricName::ReviewsRowsRead.as_str()).increment(count as u64);
    }

    pub fn rows_dropped(reason: &'static str, count: usize) {
        ::metrics::counter!(MetricName::ReviewsRowsDropped.as_str(), "reason" => reason)
            .increment(count as u64);
    }

    pub fn rows_written(count: usize) {
        ::metrics::counter!(MetricName::ReviewsRowsWritten.as_str()).increment(count as u64);
    }

    pub fn distinct_apps(count: usize) {
        ::metrics::gauge!(MetricName::ReviewsDistinctApps.as_str()).set(count as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_follow_prometheus_conventions() {
        assert_eq!(
            MetricName::AppsRowsDropped.to_string(),
            "playstore_apps_rows_dropped_total"
        );
        assert!(MetricName::ReviewsDistinctApps.as_str().starts_with("playstore_"));
    }

    #[test]
    fn phase_counters_render_with_their_labels() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        ::metrics::with_local_recorder(&recorder, || {
            apps::rows_read(10);
            reviews::rows_dropped("invalid_sentiment", 2);
        });

        let rendered = handle.render();
        assert!(rendered.contains("playstore_apps_rows_read_total 10"));
        assert!(rendered
            .contains("playstore_reviews_rows_dropped_total{reason=\"invalid_sentiment\"} 2"));
    }
}
