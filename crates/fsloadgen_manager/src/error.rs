//! Error types for driving a run.

use thiserror::Error;

/// Errors that can occur while running a load-generation experiment.
#[derive(Debug, Error)]
pub enum Error {
    /// A work queue cannot be built from an empty corpus.
    #[error("corpus is empty; cannot build a work queue")]
    EmptyCorpus,

    /// The measured phase produced no successful samples, so no aggregate
    /// statistics can be computed.
    #[error("no measured samples completed successfully; cannot compute aggregate statistics")]
    NoMeasuredSamples,
}

/// Result type alias for load-manager operations.
pub type Result<T> = std::result::Result<T, Error>;
