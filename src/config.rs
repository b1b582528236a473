use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::constants;
use crate::error::{CleanerError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reader: ReaderConfig,
    pub apps: AppsConfig,
    pub reviews: ReviewsConfig,
    pub paths: PathsConfig,
}

/// How raw cells are classified as absent
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub na_values: Vec<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            na_values: to_strings(constants::DEFAULT_NA_VALUES),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppsConfig {
    pub corrupted_category: String,
    pub android_version_fallback: f64,
    pub date_formats: Vec<String>,
}

impl Default for AppsConfig {
    fn default() -> Self {
        Self {
            corrupted_category: constants::DEFAULT_CORRUPTED_CATEGORY.to_string(),
            android_version_fallback: constants::DEFAULT_ANDROID_VERSION_FALLBACK,
            date_formats: to_strings(constants::DEFAULT_DATE_FORMATS),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReviewsConfig {
    pub valid_sentiments: Vec<String>,
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            valid_sentiments: to_strings(constants::DEFAULT_VALID_SENTIMENTS),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub apps_input: String,
    pub reviews_input: String,
    pub apps_output: String,
    pub reviews_output: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            apps_input: constants::DEFAULT_APPS_INPUT.to_string(),
            reviews_input: constants::DEFAULT_REVIEWS_INPUT.to_string(),
            apps_output: constants::DEFAULT_APPS_OUTPUT.to_string(),
            reviews_output: constants::DEFAULT_REVIEWS_OUTPUT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            CleanerError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_content)
    }

    /// Load the file when it exists, otherwise fall back to built-in defaults
    pub fn load_or_default(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        if config_path.exists() {
            Self::load(config_path)
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fallback = self.apps.android_version_fallback;
        if !fallback.is_finite() || fallback < 0.0 {
            return Err(CleanerError::Config(format!(
                "apps.android_version_fallback must be a non-negative number, got {}",
                fallback
            )));
        }
        if self.reviews.valid_sentiments.is_empty() {
            return Err(CleanerError::Config(
                "reviews.valid_sentiments must not be empty".to_string(),
            ));
        }
        if self.apps.date_formats.is_empty() {
            return Err(CleanerError::Config(
                "apps.date_formats must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.apps.corrupted_category, "1.9");
        assert_eq!(config.apps.android_version_fallback, 4.1);
        assert_eq!(
            config.reviews.valid_sentiments,
            vec!["Positive", "Negative", "Neutral"]
        );
        assert!(config.reader.na_values.iter().any(|v| v == "NaN"));
        assert_eq!(config.paths.apps_output, "GooglePlayStore_CLEAN.csv");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
            [apps]
            android_version_fallback = 5.0

            [paths]
            apps_output = "out/apps.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.apps.android_version_fallback, 5.0);
        assert_eq!(config.apps.corrupted_category, "1.9");
        assert_eq!(config.paths.apps_output, "out/apps.csv");
        assert_eq!(config.paths.reviews_input, "googleplaystore_user_reviews.csv");
    }

    #[test]
    fn negative_fallback_is_rejected() {
        let err = Config::from_toml("[apps]\nandroid_version_fallback = -1.0").unwrap_err();
        assert!(matches!(err, CleanerError::Config(_)));
    }

    #[test]
    fn empty_sentiment_list_is_rejected() {
        let err = Config::from_toml("[reviews]\nvalid_sentiments = []").unwrap_err();
        assert!(matches!(err, CleanerError::Config(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default("definitely/not/here.toml").unwrap();
        assert_eq!(config.apps.date_formats.len(), 4);
    }
}
