//! An in-process [`Caller`] used for deterministic scenario testing: no
//! network, fixed artificial latency, and an arithmetic "response" derived
//! from the request's feature IDs so a test can assert the engine observed
//! the exact requests it expected.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fsloadgen_request::Request;

use crate::caller::Caller;
use crate::error::{Error, Result};

/// A [`Caller`] that never leaves the process. For each request it parses
/// the first two feature IDs as `i64` and records their sum, after
/// sleeping for a configured artificial latency. This gives tests a way to
/// both control timing deterministically and verify exactly which requests
/// were issued.
pub struct TestCaller {
    latency: Duration,
    observed_sums: Arc<Mutex<Vec<i64>>>,
}

impl TestCaller {
    /// Builds a caller with the given artificial per-call latency.
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            observed_sums: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The arithmetic results computed so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned, which only happens if a
    /// prior call panicked while holding it.
    #[must_use]
    pub fn observed_sums(&self) -> Vec<i64> {
        self.observed_sums.lock().expect("mutex poisoned").clone()
    }
}

#[async_trait]
impl Caller for TestCaller {
    async fn issue(&self, request: &Request) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if request.feature_ids.len() < 2 {
            return Err(Error::InvalidTestRequest(request.feature_ids.clone()));
        }
        let a: i64 = request.feature_ids[0]
            .parse()
            .map_err(|_| Error::InvalidTestRequest(request.feature_ids.clone()))?;
        let b: i64 = request.feature_ids[1]
            .parse()
            .map_err(|_| Error::InvalidTestRequest(request.feature_ids.clone()))?;

        self.observed_sums
            .lock()
            .expect("mutex poisoned")
            .push(a + b);
        Ok(())
    }
}
