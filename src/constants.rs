/// Column names of the raw and cleaned tables.
/// Keeping them here avoids magic strings between the reader, the cleaners and the writer.

// App table
pub const COL_APP: &str = "App";
pub const COL_CATEGORY: &str = "Category";
pub const COL_RATING: &str = "Rating";
pub const COL_REVIEWS: &str = "Reviews";
pub const COL_SIZE: &str = "Size";
pub const COL_INSTALLS: &str = "Installs";
pub const COL_TYPE: &str = "Type";
pub const COL_PRICE: &str = "Price";
pub const COL_CONTENT_RATING: &str = "Content Rating";
pub const COL_GENRES: &str = "Genres";
pub const COL_LAST_UPDATED: &str = "Last Updated";
pub const COL_CURRENT_VER: &str = "Current Ver";
pub const COL_ANDROID_VER: &str = "Android Ver";

/// Columns the app cleaner cannot run without
pub const APP_REQUIRED_COLUMNS: &[&str] = &[
    COL_APP,
    COL_CATEGORY,
    COL_RATING,
    COL_REVIEWS,
    COL_SIZE,
    COL_INSTALLS,
    COL_TYPE,
    COL_PRICE,
    COL_CONTENT_RATING,
    COL_GENRES,
    COL_LAST_UPDATED,
    COL_CURRENT_VER,
    COL_ANDROID_VER,
];

// Review table
pub const COL_TRANSLATED_REVIEW: &str = "Translated_Review";
pub const COL_SENTIMENT: &str = "Sentiment";
pub const COL_SENTIMENT_POLARITY: &str = "Sentiment_Polarity";
pub const COL_SENTIMENT_SUBJECTIVITY: &str = "Sentiment_Subjectivity";

pub const REVIEW_REQUIRED_COLUMNS: &[&str] = &[
    COL_APP,
    COL_TRANSLATED_REVIEW,
    COL_SENTIMENT,
    COL_SENTIMENT_POLARITY,
    COL_SENTIMENT_SUBJECTIVITY,
];

// Derived app columns
pub const COL_SIZE_MB: &str = "Size_MB";
pub const COL_ANDROID_MIN_VERSION: &str = "Android_Min_Version";
pub const COL_RATING_DISPLAY: &str = "Rating_Display";

/// Cleaned app table header, in output order
pub const APP_OUTPUT_COLUMNS: &[&str] = &[
    COL_APP,
    COL_CATEGORY,
    COL_RATING,
    COL_REVIEWS,
    COL_INSTALLS,
    COL_TYPE,
    COL_PRICE,
    COL_CONTENT_RATING,
    COL_GENRES,
    COL_LAST_UPDATED,
    COL_SIZE_MB,
    COL_ANDROID_MIN_VERSION,
    COL_RATING_DISPLAY,
];

/// Cleaned review table header, in output order
pub const REVIEW_OUTPUT_COLUMNS: &[&str] = REVIEW_REQUIRED_COLUMNS;

/// Known malformed row in the Play Store feed: its columns are shifted left by one
pub const DEFAULT_CORRUPTED_CATEGORY: &str = "1.9";

/// Minimum Android version used when a category has no extracted versions at all
pub const DEFAULT_ANDROID_VERSION_FALLBACK: f64 = 4.1;

/// Size sentinel meaning "no fixed size"
pub const SIZE_VARIES: &str = "Varies with device";

/// Textual placeholder left behind by upstream exports of missing values
pub const NAN_PLACEHOLDER: &str = "nan";

pub const UNRATED_LABEL: &str = "Unrated";

/// Formats tried in order when parsing "Last Updated"
pub const DEFAULT_DATE_FORMATS: &[&str] = &["%B %d, %Y", "%Y-%m-%d", "%m/%d/%Y", "%d-%b-%y"];

/// Cell tokens read as absent values
pub const DEFAULT_NA_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub const DEFAULT_VALID_SENTIMENTS: &[&str] = &["Positive", "Negative", "Neutral"];

// Default file locations
pub const DEFAULT_APPS_INPUT: &str = "googleplaystore.csv";
pub const DEFAULT_REVIEWS_INPUT: &str = "googleplaystore_user_reviews.csv";
pub const DEFAULT_APPS_OUTPUT: &str = "GooglePlayStore_CLEAN.csv";
pub const DEFAULT_REVIEWS_OUTPUT: &str = "reviews_CLEAN.csv";
pub const DEFAULT_CONFIG_PATH: &str = "cleaner.toml";
pub const DEFAULT_LOG_DIR: &str = "logs";
