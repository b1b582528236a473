use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;

/// Pricing model of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AppType {
    Free,
    Paid,
}

impl AppType {
    /// Source labels are free text; anything that is not "paid" counts as free
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("paid") {
            AppType::Paid
        } else {
            AppType::Free
        }
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppType::Free => write!(f, "Free"),
            AppType::Paid => write!(f, "Paid"),
        }
    }
}

/// One cleaned application row.
///
/// Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppRecord {
    /// Trimmed, lower-cased name; the dedup and join key
    #[serde(rename = "App")]
    pub app: Option<String>,
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "Rating")]
    pub rating: Option<f64>,
    #[serde(rename = "Reviews")]
    pub reviews: Option<u64>,
    #[serde(rename = "Installs")]
    pub installs: Option<u64>,
    #[serde(rename = "Type")]
    pub app_type: AppType,
    #[serde(rename = "Price")]
    pub price: Option<f64>,
    #[serde(rename = "Content Rating")]
    pub content_rating: Option<String>,
    #[serde(rename = "Genres")]
    pub genres: Option<String>,
    #[serde(rename = "Last Updated", serialize_with = "serialize_date")]
    pub last_updated: Option<NaiveDate>,
    #[serde(rename = "Size_MB")]
    pub size_mb: Option<f64>,
    #[serde(rename = "Android_Min_Version")]
    pub android_min_version: Option<f64>,
    #[serde(rename = "Rating_Display")]
    pub rating_display: String,
}

/// One cleaned review row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRecord {
    #[serde(rename = "App")]
    pub app: String,
    #[serde(rename = "Translated_Review")]
    pub translated_review: String,
    #[serde(rename = "Sentiment")]
    pub sentiment: String,
    #[serde(rename = "Sentiment_Polarity")]
    pub sentiment_polarity: Option<f64>,
    #[serde(rename = "Sentiment_Subjectivity")]
    pub sentiment_subjectivity: Option<f64>,
}

fn serialize_date<S>(
    date: &Option<NaiveDate>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_labels_are_case_insensitive() {
        assert_eq!(AppType::from_label("Paid"), AppType::Paid);
        assert_eq!(AppType::from_label(" paid "), AppType::Paid);
        assert_eq!(AppType::from_label("Free"), AppType::Free);
        assert_eq!(AppType::from_label("0"), AppType::Free);
        assert_eq!(AppType::Paid.to_string(), "Paid");
    }
}
