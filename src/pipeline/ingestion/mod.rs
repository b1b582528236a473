// Pipeline ingestion: loading raw delimited tables into memory

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::config::ReaderConfig;
use crate::error::{CleanerError, Result};

/// A fully loaded raw table: header names plus string rows.
///
/// Rows shorter than the header are padded with empty (absent) cells and
/// longer rows are truncated, so every row has exactly one cell per column.
#[derive(Debug, Clone)]
pub struct RawTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    na_values: HashSet<String>,
}

impl RawTable {
    /// Read a table from any reader
    pub fn from_reader<R: Read>(name: &str, reader: R, config: &ReaderConfig) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let width = headers.len();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        debug!(table = name, columns = width, rows = rows.len(), "Loaded raw table");

        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
            na_values: config.na_values.iter().cloned().collect(),
        })
    }

    /// Read a table from a file on disk
    pub fn from_path(name: &str, path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading {} table from {}", name, path.display());
        let file = File::open(path)?;
        Self::from_reader(name, file, config)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve a column name to its index; a missing column is fatal
    pub fn column(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| CleanerError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Ensure every named column exists before any stage runs
    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        for column in columns {
            self.column(column)?;
        }
        Ok(())
    }

    /// Cell value, or `None` when the cell is empty or an NA token
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        let value = self.rows.get(row)?.get(col)?.as_str();
        if value.is_empty() || self.na_values.contains(value) {
            None
        } else {
            Some(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(content: &str) -> RawTable {
        RawTable::from_reader("test", content.as_bytes(), &ReaderConfig::default()).unwrap()
    }

    #[test]
    fn reports_absent_cells() {
        let t = table("App,Rating\nfoo,NaN\nbar,\nbaz,4.5\n");
        let rating = t.column("Rating").unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.cell(0, rating), None);
        assert_eq!(t.cell(1, rating), None);
        assert_eq!(t.cell(2, rating), Some("4.5"));
    }

    #[test]
    fn missing_column_is_fatal() {
        let t = table("App,Rating\nfoo,4.0\n");
        match t.column("Sentiment") {
            Err(CleanerError::MissingColumn { table, column }) => {
                assert_eq!(table, "test");
                assert_eq!(column, "Sentiment");
            }
            other => panic!("expected MissingColumn, got {:?}", other),
        }
        assert!(t.require_columns(&["App", "Rating"]).is_ok());
        assert!(t.require_columns(&["App", "Genres"]).is_err());
    }

    #[test]
    fn short_rows_are_padded() {
        let t = table("App,Category,Rating\nfoo,GAME\n");
        let rating = t.column("Rating").unwrap();
        assert_eq!(t.cell(0, rating), None);
        assert_eq!(t.cell(0, 1), Some("GAME"));
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let t = table("App,Installs\n\"Foo, the app\",\"1,000+\"\n");
        assert_eq!(t.cell(0, 0), Some("Foo, the app"));
        assert_eq!(t.cell(0, 1), Some("1,000+"));
    }
}
