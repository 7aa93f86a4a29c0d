//! Error types for writing aggregate and detailed results.

use thiserror::Error;

/// Errors that can occur while persisting a run's results.
#[derive(Debug, Error)]
pub enum Error {
    /// A `gcsOutputPath`-style string did not match `gs://{bucket}/{object}`.
    #[error("GCS path '{0}' does not match gs://{{bucket}}/{{object}}")]
    InvalidGcsPath(String),

    /// The blob sink or table sink could not be reached.
    #[error("results sink unavailable: {0}")]
    ExternalUnavailable(String),

    /// Underlying filesystem I/O failure from a local sink implementation.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// CSV encoding failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Result type alias for results-writer operations.
pub type Result<T> = std::result::Result<T, Error>;
