//! Constructs the [`Caller`] a run should use from CLI-level configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::caller::Caller;
use crate::error::Result;
use crate::http::{HttpCaller, HttpCallerConfig};
use crate::test_caller::TestCaller;

/// Which concrete [`Caller`] implementation to build.
pub enum CallerKind {
    /// Issue real HTTP calls against the Vertex AI Feature Store API.
    Http(HttpCallerConfig),
    /// Use the in-process deterministic test double instead of the
    /// network, with the given artificial per-call latency.
    Test {
        /// Artificial latency applied to every call.
        latency: Duration,
    },
}

/// Builds a shared, clonable [`Caller`] from a [`CallerKind`].
///
/// # Errors
///
/// Returns an error if the chosen implementation fails to construct, e.g.
/// an `Http` caller whose HTTP client could not be built.
pub fn build_caller(kind: CallerKind) -> Result<Arc<dyn Caller>> {
    match kind {
        CallerKind::Http(config) => Ok(Arc::new(HttpCaller::new(config)?)),
        CallerKind::Test { latency } => Ok(Arc::new(TestCaller::new(latency))),
    }
}
