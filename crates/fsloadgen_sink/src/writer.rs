//! The results writer: buffers detailed per-request records, rotates blob
//! objects at a size threshold, and appends each object to a columnar
//! table.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use fsloadgen_executor::SampleResult;
use fsloadgen_manager::{Aggregate, RunIdentity};
use tracing::info;

use crate::blob::BlobSink;
use crate::error::Result;
use crate::table::{TableSink, WriteDisposition};

const DETAILED_CSV_HEADER: &[u8] = b"StartTime,Duration\n";

/// Default rotation threshold: 2*10^9 bytes.
pub const DEFAULT_ROTATION_THRESHOLD_BYTES: u64 = 2_000_000_000;

/// What a completed write produced, for the CLI to report back to the user.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    /// Where the one-line aggregate summary was written.
    pub aggregate_object: PathBuf,
    /// Where each rotated detailed-results CSV was written, in order.
    pub detailed_objects: Vec<PathBuf>,
    /// The fully qualified table the detailed CSVs were loaded into.
    pub table_name: String,
}

/// Persists a run's aggregate and detailed results.
pub struct ResultsWriter {
    blob_sink: Arc<dyn BlobSink>,
    table_sink: Arc<dyn TableSink>,
    dataset: String,
    rotation_threshold_bytes: u64,
}

impl ResultsWriter {
    /// Builds a writer that persists into `dataset` through `blob_sink` and
    /// `table_sink`, using the default 2 GB rotation threshold.
    #[must_use]
    pub fn new(blob_sink: Arc<dyn BlobSink>, table_sink: Arc<dyn TableSink>, dataset: impl Into<String>) -> Self {
        Self {
            blob_sink,
            table_sink,
            dataset: dataset.into(),
            rotation_threshold_bytes: DEFAULT_ROTATION_THRESHOLD_BYTES,
        }
    }

    /// Overrides the rotation threshold. Exposed so tests can exercise
    /// rotation without generating gigabytes of results.
    #[must_use]
    pub const fn with_rotation_threshold_bytes(mut self, bytes: u64) -> Self {
        self.rotation_threshold_bytes = bytes;
        self
    }

    /// Writes the aggregate summary object, the rotated detailed-results
    /// CSVs, and loads every CSV into the configured table.
    ///
    /// # Errors
    ///
    /// Returns an error if any blob write or table load fails. Artifacts
    /// already written before a failure are left in place.
    pub fn write(&self, identity: &RunIdentity, aggregate: &Aggregate, results: &[SampleResult]) -> Result<WriteOutcome> {
        let date = &identity.formatted_timestamp;
        let uuid = identity.uuid;

        let aggregate_object = self.write_aggregate_object(date, uuid, aggregate)?;
        let detailed_objects = self.write_detailed_objects(date, uuid, results)?;

        let table_name = format!("loadtest_result_table_{date}_{uuid}");
        self.table_sink.ensure_dataset(&self.dataset)?;
        for (n, path) in detailed_objects.iter().enumerate() {
            let disposition = if n == 0 { WriteDisposition::Truncate } else { WriteDisposition::Append };
            self.table_sink.load_csv(&self.dataset, &table_name, path, disposition)?;
        }

        info!(
            aggregate_object = %aggregate_object.display(),
            detailed_objects = detailed_objects.len(),
            table_name,
            "results written"
        );

        Ok(WriteOutcome {
            aggregate_object,
            detailed_objects,
            table_name,
        })
    }

    fn write_aggregate_object(&self, date: &str, uuid: uuid::Uuid, aggregate: &Aggregate) -> Result<PathBuf> {
        let name = format!("aggregated_results_{date}_{uuid}.txt");
        let mut handle = self.blob_sink.create(&name)?;
        handle.write_all(aggregate.format_line().as_bytes())?;
        handle.finish()
    }

    fn write_detailed_objects(&self, date: &str, uuid: uuid::Uuid, results: &[SampleResult]) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        let mut n = 1_u32;
        let mut current = self.open_detailed_blob(date, uuid, n)?;

        for result in results {
            let row = format_row(result);
            if current.bytes_written + row.len() as u64 > self.rotation_threshold_bytes {
                paths.push(current.handle.finish()?);
                n += 1;
                current = self.open_detailed_blob(date, uuid, n)?;
            }
            current.handle.write_all(row.as_bytes())?;
            current.bytes_written += row.len() as u64;
        }

        paths.push(current.handle.finish()?);
        Ok(paths)
    }

    fn open_detailed_blob(&self, date: &str, uuid: uuid::Uuid, n: u32) -> Result<DetailedBlob> {
        let name = format!("detailed_results_{date}_{uuid}_{n}.csv");
        let mut handle = self.blob_sink.create(&name)?;
        handle.write_all(DETAILED_CSV_HEADER)?;
        Ok(DetailedBlob {
            handle,
            bytes_written: u64::try_from(DETAILED_CSV_HEADER.len()).unwrap_or(u64::MAX),
        })
    }
}

struct DetailedBlob {
    handle: Box<dyn crate::blob::BlobHandle>,
    bytes_written: u64,
}

fn format_row(result: &SampleResult) -> String {
    format!(
        "{},{}\n",
        result.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S%.6f"),
        format_duration(result.duration),
    )
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let micros = duration.subsec_micros();
    format!("{hours:02}:{minutes:02}:{seconds:02}.{micros:06}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::LocalBlobSink;
    use crate::table::LocalCsvTableSink;
    use chrono::Utc;
    use std::fs;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("fsloadgen-writer-test-{}", uuid::Uuid::new_v4()))
    }

    fn sample(index: usize, millis: u64) -> SampleResult {
        SampleResult {
            index,
            started_at: Utc::now(),
            duration: Duration::from_millis(millis),
            success: true,
            error: None,
        }
    }

    #[test]
    fn format_duration_zero_pads_every_component() {
        assert_eq!(format_duration(Duration::from_micros(1_234)), "00:00:00.001234");
        assert_eq!(format_duration(Duration::from_secs(3_661)), "01:01:01.000000");
    }

    #[test]
    fn writes_aggregate_and_one_detailed_object_when_under_threshold() {
        let dir = scratch_dir();
        let blobs = Arc::new(LocalBlobSink::new(dir.join("blobs")));
        let tables = Arc::new(LocalCsvTableSink::new(dir.join("tables")));
        let writer = ResultsWriter::new(blobs, tables.clone(), "ds");

        let identity = RunIdentity::new();
        let aggregate = Aggregate::compute(&[Duration::from_millis(10), Duration::from_millis(20)]).unwrap();
        let results = vec![sample(0, 10), sample(1, 20)];

        let outcome = writer.write(&identity, &aggregate, &results).unwrap();
        assert_eq!(outcome.detailed_objects.len(), 1);
        assert!(fs::read_to_string(&outcome.aggregate_object).unwrap().starts_with("Min: 10ms"));

        let rows = tables.read_rows("ds", &outcome.table_name).unwrap();
        assert_eq!(rows.len(), 2);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rotates_into_multiple_objects_once_the_threshold_is_crossed() {
        let dir = scratch_dir();
        let blobs = Arc::new(LocalBlobSink::new(dir.join("blobs")));
        let tables = Arc::new(LocalCsvTableSink::new(dir.join("tables")));
        // Each row is ~35 bytes; a 100-byte threshold forces rotation well
        // before 2*10^9 real-world bytes would.
        let writer = ResultsWriter::new(blobs, tables.clone(), "ds").with_rotation_threshold_bytes(100);

        let identity = RunIdentity::new();
        let results: Vec<SampleResult> = (0..10).map(|i| sample(i, 10)).collect();
        let aggregate = Aggregate::compute(&results.iter().map(|r| r.duration).collect::<Vec<_>>()).unwrap();

        let outcome = writer.write(&identity, &aggregate, &results).unwrap();
        assert!(outcome.detailed_objects.len() >= 2);

        let rows = tables.read_rows("ds", &outcome.table_name).unwrap();
        assert_eq!(rows.len(), 10);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_results_still_produce_one_header_only_detailed_object() {
        let dir = scratch_dir();
        let blobs = Arc::new(LocalBlobSink::new(dir.join("blobs")));
        let tables = Arc::new(LocalCsvTableSink::new(dir.join("tables")));
        let writer = ResultsWriter::new(blobs, tables, "ds");

        let identity = RunIdentity::new();
        let aggregate = Aggregate::compute(&[Duration::from_millis(1)]).unwrap();
        let outcome = writer.write(&identity, &aggregate, &[]).unwrap();

        assert_eq!(outcome.detailed_objects.len(), 1);
        assert_eq!(fs::read_to_string(&outcome.detailed_objects[0]).unwrap(), "StartTime,Duration\n");
        fs::remove_dir_all(&dir).ok();
    }
}
