//! Persists a run's results: a one-line aggregate summary, rotated
//! detailed-results CSVs, and a load into a columnar table.
//!
//! [`BlobSink`] and [`TableSink`] are the seams the production system
//! plugs a real GCS client and a real BigQuery client into; the local
//! filesystem implementations here ([`LocalBlobSink`], [`LocalCsvTableSink`])
//! make the crate runnable end to end without either.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod blob;
mod error;
mod table;
mod writer;

pub use blob::{normalize_gcs_output_path, BlobHandle, BlobSink, LocalBlobSink};
pub use error::{Error, Result};
pub use table::{LocalCsvTableSink, TableSink, WriteDisposition};
pub use writer::{ResultsWriter, WriteOutcome, DEFAULT_ROTATION_THRESHOLD_BYTES};
