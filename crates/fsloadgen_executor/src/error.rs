//! Error types for sample execution.

use thiserror::Error;

/// Errors that can occur while executing a batch of requests.
#[derive(Debug, Error)]
pub enum Error {
    /// The batch did not finish within its deadline; the caller receives
    /// whatever results had completed by then.
    #[error("execution timed out after {elapsed_ms}ms with {completed}/{total} calls finished")]
    Timeout {
        /// How long execution ran before the timeout fired.
        elapsed_ms: u64,
        /// How many calls had completed.
        completed: usize,
        /// How many calls were submitted.
        total: usize,
    },
}

/// Result type alias for sample execution.
pub type Result<T> = std::result::Result<T, Error>;
