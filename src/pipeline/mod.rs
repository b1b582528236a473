// Data cleaning pipeline: ingestion, processing, and storage

pub mod ingestion;
pub mod processing;
pub mod storage;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::{Config, PathsConfig, ReaderConfig};
use crate::constants::{APP_OUTPUT_COLUMNS, COL_APP, REVIEW_OUTPUT_COLUMNS};
use crate::error::Result;
use crate::observability::metrics;

use self::ingestion::RawTable;
use self::processing::{
    AppCleanOutput, AppCleanSummary, AppTableCleaner, ReviewCleanOutput, ReviewCleanSummary,
    ReviewTableCleaner,
};
use self::storage::PendingOutput;

/// Input and output locations for one run
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub apps_input: PathBuf,
    pub reviews_input: PathBuf,
    pub apps_output: PathBuf,
    pub reviews_output: PathBuf,
}

impl From<&PathsConfig> for RunPaths {
    fn from(paths: &PathsConfig) -> Self {
        Self {
            apps_input: PathBuf::from(&paths.apps_input),
            reviews_input: PathBuf::from(&paths.reviews_input),
            apps_output: PathBuf::from(&paths.apps_output),
            reviews_output: PathBuf::from(&paths.reviews_output),
        }
    }
}

/// Result of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub apps: Option<AppCleanSummary>,
    pub reviews: Option<ReviewCleanSummary>,
    pub output_files: Vec<String>,
    pub duration_secs: f64,
}

pub struct Pipeline;

impl Pipeline {
    /// Clean the app table, then the review table against it, then write both
    #[instrument(skip_all)]
    pub fn run(config: &Config, paths: &RunPaths) -> Result<RunSummary> {
        let started = Instant::now();
        info!("Starting full cleaning run");

        let apps = Self::clean_apps_file(config, &paths.apps_input)?;
        let reviews = Self::clean_reviews_file(config, &paths.reviews_input, &apps.identifiers())?;

        let outputs = vec![
            storage::pending(&paths.apps_output, &apps.records, APP_OUTPUT_COLUMNS)?,
            storage::pending(&paths.reviews_output, &reviews.records, REVIEW_OUTPUT_COLUMNS)?,
        ];
        Self::finish(
            Some(apps.summary),
            Some(reviews.summary),
            outputs,
            started,
        )
    }

    /// Only the app table
    #[instrument(skip_all)]
    pub fn run_apps(config: &Config, paths: &RunPaths) -> Result<RunSummary> {
        let started = Instant::now();
        let apps = Self::clean_apps_file(config, &paths.apps_input)?;
        let outputs = vec![storage::pending(
            &paths.apps_output,
            &apps.records,
            APP_OUTPUT_COLUMNS,
        )?];
        Self::finish(Some(apps.summary), None, outputs, started)
    }

    /// Only the review table, joined against an already-cleaned app table on disk
    #[instrument(skip_all, fields(apps_clean = %apps_clean.display()))]
    pub fn run_reviews(config: &Config, paths: &RunPaths, apps_clean: &Path) -> Result<RunSummary> {
        let started = Instant::now();
        let app_ids = Self::load_app_identifiers(apps_clean, &config.reader)?;
        let reviews = Self::clean_reviews_file(config, &paths.reviews_input, &app_ids)?;
        let outputs = vec![storage::pending(
            &paths.reviews_output,
            &reviews.records,
            REVIEW_OUTPUT_COLUMNS,
        )?];
        Self::finish(None, Some(reviews.summary), outputs, started)
    }

    pub fn clean_apps_file(config: &Config, path: &Path) -> Result<AppCleanOutput> {
        let table = RawTable::from_path("apps", path, &config.reader)?;
        AppTableCleaner::new(config.apps.clone()).clean(&table)
    }

    pub fn clean_reviews_file(
        config: &Config,
        path: &Path,
        app_ids: &HashSet<String>,
    ) -> Result<ReviewCleanOutput> {
        let table = RawTable::from_path("reviews", path, &config.reader)?;
        ReviewTableCleaner::new(config.reviews.clone()).clean(&table, app_ids)
    }

    /// Identifiers from the `App` column of a cleaned app table
    pub fn load_app_identifiers(path: &Path, reader: &ReaderConfig) -> Result<HashSet<String>> {
        let table = RawTable::from_path("cleaned apps", path, reader)?;
        let app = table.column(COL_APP)?;
        let ids: HashSet<String> = (0..table.len())
            .filter_map(|i| table.cell(i, app).map(str::to_string))
            .collect();
        info!("Loaded {} app identifiers from {}", ids.len(), path.display());
        Ok(ids)
    }

    /// Nothing touches disk until every table of the run is serialized
    fn finish(
        apps: Option<AppCleanSummary>,
        reviews: Option<ReviewCleanSummary>,
        outputs: Vec<PendingOutput>,
        started: Instant,
    ) -> Result<RunSummary> {
        storage::commit(&outputs)?;

        if let Some(apps) = &apps {
            metrics::apps::rows_written(apps.final_rows);
        }
        if let Some(reviews) = &reviews {
            metrics::reviews::rows_written(reviews.final_rows);
        }

        let duration_secs = started.elapsed().as_secs_f64();
        info!("Cleaning run finished in {:.2}s", duration_secs);

        Ok(RunSummary {
            apps,
            reviews,
            output_files: outputs
                .iter()
                .map(|o| o.path.to_string_lossy().to_string())
                .collect(),
            duration_secs,
        })
    }
}
