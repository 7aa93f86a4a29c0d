//! Error types for issuing calls to the remote feature-retrieval service.

use thiserror::Error;

/// Errors that can occur while issuing a request through a [`crate::Caller`].
#[derive(Debug, Error)]
pub enum Error {
    /// The remote service could not be reached, or returned a transport
    /// or HTTP-level failure.
    #[error("remote service unavailable: {0}")]
    Unavailable(String),

    /// The remote service returned a non-success status.
    #[error("remote service returned status {status}: {body}")]
    ServiceError {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated if large.
        body: String,
    },

    /// A [`crate::TestCaller`] was given a request it could not evaluate
    /// (fewer than two numeric feature IDs).
    #[error("test caller requires at least two numeric feature IDs, got {0:?}")]
    InvalidTestRequest(Vec<String>),

    /// Underlying HTTP client error.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Result type alias for caller operations.
pub type Result<T> = std::result::Result<T, Error>;
