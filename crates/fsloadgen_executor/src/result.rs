//! The outcome of issuing a single request.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Explicit identity and scheduling context for one in-flight call,
/// constructed once at submission time and threaded through to completion
/// rather than recovered after the fact.
#[derive(Debug, Clone, Copy)]
pub struct TaskContext {
    /// This call's position in the batch it was submitted with.
    pub index: usize,
    /// When this call was submitted, used to measure end-to-end latency
    /// including any time spent waiting for a free execution slot.
    pub start: tokio::time::Instant,
}

impl TaskContext {
    /// Captures a context for the call at `index`, starting the clock now.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            start: tokio::time::Instant::now(),
        }
    }
}

/// The measured outcome of issuing one request.
#[derive(Debug, Clone)]
pub struct SampleResult {
    /// The call's position in the batch it was submitted with.
    pub index: usize,
    /// Wall-clock time the call was submitted, for the detailed results
    /// ledger.
    pub started_at: DateTime<Utc>,
    /// End-to-end latency from submission to completion, including any
    /// time spent queued behind the concurrency limit.
    pub duration: Duration,
    /// Whether the call completed successfully.
    pub success: bool,
    /// The error message, if the call failed.
    pub error: Option<String>,
}

impl SampleResult {
    /// Latency in whole milliseconds, rounding down.
    #[must_use]
    pub fn latency_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }
}
