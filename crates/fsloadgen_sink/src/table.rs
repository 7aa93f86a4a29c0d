//! The table sink: where rotated detailed-results CSVs get loaded.
//! Stands in for BigQuery; a real warehouse client is a drop-in behind
//! [`TableSink`].

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Whether a table load replaces or extends existing rows, mirroring
/// BigQuery's `WRITE_TRUNCATE` / `WRITE_APPEND` job dispositions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDisposition {
    /// Replace the table's contents with this load.
    Truncate,
    /// Append this load's rows to the table's existing contents.
    Append,
}

/// Loads CSV blobs into a named table within a dataset.
pub trait TableSink: Send + Sync {
    /// Ensures `dataset` exists, creating it if this is the first write.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ExternalUnavailable`] if the dataset cannot
    /// be provisioned.
    fn ensure_dataset(&self, dataset: &str) -> Result<()>;

    /// Synchronously loads the CSV at `csv_path` into `dataset.table`,
    /// blocking until the load job completes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ExternalUnavailable`] if the load job fails.
    fn load_csv(
        &self,
        dataset: &str,
        table: &str,
        csv_path: &Path,
        disposition: WriteDisposition,
    ) -> Result<()>;
}

/// A [`TableSink`] backed by a local append-only CSV ledger per
/// `dataset/table`, standing in for BigQuery.
#[derive(Debug, Clone)]
pub struct LocalCsvTableSink {
    root: PathBuf,
}

impl LocalCsvTableSink {
    /// Creates a sink that keeps one ledger file per table under `root`,
    /// creating the directory tree on first use.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn ledger_path(&self, dataset: &str, table: &str) -> PathBuf {
        self.root.join(dataset).join(format!("{table}.csv"))
    }

    /// The rows currently recorded for `dataset.table`, for tests to assert
    /// against without re-implementing CSV parsing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Csv`] if the ledger cannot be parsed.
    pub fn read_rows(&self, dataset: &str, table: &str) -> Result<Vec<csv::StringRecord>> {
        let path = self.ledger_path(dataset, table);
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
        Ok(reader.records().collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

impl TableSink for LocalCsvTableSink {
    fn ensure_dataset(&self, dataset: &str) -> Result<()> {
        fs::create_dir_all(self.root.join(dataset))?;
        Ok(())
    }

    fn load_csv(
        &self,
        dataset: &str,
        table: &str,
        csv_path: &Path,
        disposition: WriteDisposition,
    ) -> Result<()> {
        fs::create_dir_all(self.root.join(dataset))?;
        let ledger_path = self.ledger_path(dataset, table);

        match disposition {
            WriteDisposition::Truncate => {
                fs::copy(csv_path, &ledger_path)?;
            }
            WriteDisposition::Append => {
                let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(csv_path)?;
                let mut ledger = OpenOptions::new().append(true).open(&ledger_path)?;
                let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(&mut ledger);
                for record in reader.records() {
                    writer.write_record(&record?)?;
                }
                writer.flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("fsloadgen-table-test-{}", uuid::Uuid::new_v4()))
    }

    fn write_csv(path: &Path, rows: &[&str]) {
        let mut file = std::fs::File::create(path).unwrap();
        writeln!(file, "StartTime,Duration").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
    }

    #[test]
    fn truncate_then_append_accumulates_every_row() {
        let dir = scratch_dir();
        let sink = LocalCsvTableSink::new(&dir);
        sink.ensure_dataset("ds").unwrap();

        let first = dir.join("first.csv");
        write_csv(&first, &["2024-01-01 00:00:00.000000,00:00:00.010000"]);
        sink.load_csv("ds", "tbl", &first, WriteDisposition::Truncate).unwrap();

        let second = dir.join("second.csv");
        write_csv(&second, &["2024-01-01 00:00:01.000000,00:00:00.020000"]);
        sink.load_csv("ds", "tbl", &second, WriteDisposition::Append).unwrap();

        let rows = sink.read_rows("ds", "tbl").unwrap();
        assert_eq!(rows.len(), 2);
        fs::remove_dir_all(&dir).ok();
    }
}
