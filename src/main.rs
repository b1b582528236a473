use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use playstore_cleaner::constants;
use playstore_cleaner::observability::{self, metrics};
use playstore_cleaner::{Config, Pipeline, RunPaths, RunSummary};

#[derive(Parser)]
#[command(name = "playstore_cleaner")]
#[command(about = "Clean the Google Play Store app and user review datasets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct CommonArgs {
    /// TOML configuration file (defaults apply when it does not exist)
    #[arg(long, global = true, default_value = constants::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Raw app metadata CSV
    #[arg(long, global = true)]
    apps_input: Option<PathBuf>,

    /// Raw user review CSV
    #[arg(long, global = true)]
    reviews_input: Option<PathBuf>,

    /// Where to write the cleaned app table
    #[arg(long, global = true)]
    apps_output: Option<PathBuf>,

    /// Where to write the cleaned review table
    #[arg(long, global = true)]
    reviews_output: Option<PathBuf>,

    /// Write the run summary as JSON to this path
    #[arg(long, global = true)]
    summary: Option<PathBuf>,

    /// Write a Prometheus text snapshot of the run metrics to this path
    #[arg(long, global = true)]
    metrics_file: Option<PathBuf>,

    /// Directory for rolling JSON log files
    #[arg(long, global = true, default_value = constants::DEFAULT_LOG_DIR)]
    log_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the app table, then the review table against it
    Run,
    /// Clean only the app table
    Apps,
    /// Clean only the review table, joined against an already-cleaned app table
    Reviews {
        /// Cleaned app table providing the set of known app identifiers
        #[arg(long)]
        apps_clean: PathBuf,
    },
}

impl CommonArgs {
    fn run_paths(&self, config: &Config) -> RunPaths {
        let mut paths = RunPaths::from(&config.paths);
        if let Some(p) = &self.apps_input {
            paths.apps_input = p.clone();
        }
        if let Some(p) = &self.reviews_input {
            paths.reviews_input = p.clone();
        }
        if let Some(p) = &self.apps_output {
            paths.apps_output = p.clone();
        }
        if let Some(p) = &self.reviews_output {
            paths.reviews_output = p.clone();
        }
        paths
    }
}

fn print_summary(summary: &RunSummary) {
    if let Some(apps) = &summary.apps {
        println!("\n📊 App table:");
        println!("   Original rows: {}", apps.raw_rows);
        println!("   Corrupted rows dropped: {}", apps.corrupted_rows_dropped);
        println!("   Duplicates dropped: {}", apps.duplicate_rows_dropped);
        println!("   Final rows: {}", apps.final_rows);
        println!("   Missing Size_MB: {}", apps.missing_size_after_imputation);
        println!(
            "   Missing Android_Min_Version: {}",
            apps.missing_android_version_after_imputation
        );
        println!("   Unrated apps: {}", apps.missing_rating);
    }
    if let Some(reviews) = &summary.reviews {
        println!("\n📊 Review table:");
        println!("   Raw reviews: {}", reviews.raw_rows);
        println!("   Final reviews: {}", reviews.final_rows);
        println!("   Unique apps with reviews: {}", reviews.distinct_apps);
    }
    for file in &summary.output_files {
        println!("💾 Saved → {}", file);
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    info!("Wrote run summary to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    observability::init_logging(&cli.common.log_dir);
    if cli.common.metrics_file.is_some() {
        metrics::init()?;
    }

    let config = Config::load_or_default(&cli.common.config)
        .with_context(|| format!("Failed to load config from {}", cli.common.config.display()))?;
    let paths = cli.common.run_paths(&config);

    let result = match &cli.command {
        Commands::Run => {
            println!("🚀 Cleaning apps and reviews...");
            Pipeline::run(&config, &paths)
        }
        Commands::Apps => {
            println!("🔧 Cleaning apps...");
            Pipeline::run_apps(&config, &paths)
        }
        Commands::Reviews { apps_clean } => {
            println!("🔧 Cleaning reviews...");
            Pipeline::run_reviews(&config, &paths, apps_clean)
        }
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            error!("Cleaning run failed: {}", e);
            println!("❌ Cleaning run failed: {}", e);
            return Err(e.into());
        }
    };

    print_summary(&summary);

    if let Some(path) = &cli.common.summary {
        write_summary(path, &summary)?;
    }
    if let Some(path) = &cli.common.metrics_file {
        metrics::write_snapshot(path)?;
    }

    println!("✅ Done");
    Ok(())
}
