// Pipeline storage: serializing cleaned tables and committing them to disk

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;

/// A serialized table waiting to be written
#[derive(Debug, Clone)]
pub struct PendingOutput {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub rows: usize,
}

/// Serialize records (header row first) into an in-memory CSV buffer.
///
/// The header is written explicitly so an empty table still has one.
pub fn to_csv_bytes<T: Serialize>(records: &[T], header: &[&str]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(header)?;
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    Ok(bytes)
}

pub fn pending<T: Serialize>(
    path: impl Into<PathBuf>,
    records: &[T],
    header: &[&str],
) -> Result<PendingOutput> {
    Ok(PendingOutput {
        path: path.into(),
        bytes: to_csv_bytes(records, header)?,
        rows: records.len(),
    })
}

/// Write every pending table. Each file goes to a sibling temporary path
/// first and is renamed into place, so readers never see a partial file.
/// On failure nothing is left behind: staged files are discarded and any
/// table already renamed into place is removed again.
pub fn commit(outputs: &[PendingOutput]) -> Result<()> {
    for output in outputs {
        if let Some(parent) = output.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
    }

    let mut staged = Vec::with_capacity(outputs.len());
    for output in outputs {
        let tmp = staging_path(&output.path);
        let written = fs::write(&tmp, &output.bytes);
        staged.push(tmp);
        if let Err(e) = written {
            discard(&staged);
            return Err(e.into());
        }
        debug!("Staged {} rows at {}", output.rows, output.path.display());
    }

    for (i, (output, tmp)) in outputs.iter().zip(&staged).enumerate() {
        if let Err(e) = fs::rename(tmp, &output.path) {
            warn!("Failed to move {} into place: {}", output.path.display(), e);
            discard(&staged[i..]);
            for done in &outputs[..i] {
                let _ = fs::remove_file(&done.path);
            }
            return Err(e.into());
        }
        info!("Saved {} rows to {}", output.rows, output.path.display());
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn discard(staged: &[PathBuf]) {
    for tmp in staged {
        let _ = fs::remove_file(tmp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use crate::types::{AppRecord, AppType, ReviewRecord};
    use chrono::NaiveDate;

    #[test]
    fn app_records_serialize_in_output_column_order() {
        let record = AppRecord {
            app: Some("candy crush".to_string()),
            category: Some("GAME".to_string()),
            rating: None,
            reviews: Some(159),
            installs: None,
            app_type: AppType::Free,
            price: Some(0.0),
            content_rating: Some("Everyone".to_string()),
            genres: Some("Art  &  Design".to_string()),
            last_updated: NaiveDate::from_ymd_opt(2018, 1, 7),
            size_mb: Some(19.0),
            android_min_version: Some(4.1),
            rating_display: "Unrated".to_string(),
        };
        let bytes = to_csv_bytes(&[record], APP_OUTPUT_COLUMNS).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            APP_OUTPUT_COLUMNS.join(",")
        );
        assert_eq!(
            lines.next().unwrap(),
            "candy crush,GAME,,159,,Free,0.0,Everyone,Art  &  Design,2018-01-07,19.0,4.1,Unrated"
        );
    }

    #[test]
    fn empty_table_still_has_header() {
        let records: Vec<ReviewRecord> = Vec::new();
        let bytes = to_csv_bytes(&records, REVIEW_OUTPUT_COLUMNS).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "App,Translated_Review,Sentiment,Sentiment_Polarity,Sentiment_Subjectivity\n"
        );
    }

    #[test]
    fn commit_writes_files_and_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("reviews.csv");
        let records = vec![ReviewRecord {
            app: "foo".to_string(),
            translated_review: "Great, really".to_string(),
            sentiment: "Positive".to_string(),
            sentiment_polarity: Some(0.5),
            sentiment_subjectivity: None,
        }];
        let output = pending(&path, &records, REVIEW_OUTPUT_COLUMNS).unwrap();
        commit(&[output]).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("foo,\"Great, really\",Positive,0.5,\n"));
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    fn review(app: &str) -> ReviewRecord {
        ReviewRecord {
            app: app.to_string(),
            translated_review: "Fine".to_string(),
            sentiment: "Neutral".to_string(),
            sentiment_polarity: Some(0.0),
            sentiment_subjectivity: Some(0.0),
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn failed_rename_rolls_back_every_output() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("apps.csv");
        // A non-empty directory cannot be replaced by a file
        let second = dir.path().join("reviews.csv");
        fs::create_dir(&second).unwrap();
        fs::write(second.join("keep"), "x").unwrap();

        let outputs = vec![
            pending(&first, &[review("a")], REVIEW_OUTPUT_COLUMNS).unwrap(),
            pending(&second, &[review("b")], REVIEW_OUTPUT_COLUMNS).unwrap(),
        ];
        assert!(commit(&outputs).is_err());

        assert!(!first.exists());
        assert!(second.is_dir());
        let mut names = entries(dir.path());
        names.sort();
        assert_eq!(names, vec!["reviews.csv".to_string()]);
    }

    #[test]
    fn failed_staging_discards_earlier_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("apps.csv");
        let second = dir.path().join("reviews.csv");
        // The staging path itself is taken by a directory
        fs::create_dir(staging_path(&second)).unwrap();

        let outputs = vec![
            pending(&first, &[review("a")], REVIEW_OUTPUT_COLUMNS).unwrap(),
            pending(&second, &[review("b")], REVIEW_OUTPUT_COLUMNS).unwrap(),
        ];
        assert!(commit(&outputs).is_err());

        assert!(!first.exists());
        assert!(!second.exists());
        let names = entries(dir.path());
        assert_eq!(names, vec!["reviews.csv.tmp".to_string()]);
    }
}
