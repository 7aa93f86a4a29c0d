//! Bounded-concurrency execution of one batch of requests.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fsloadgen_caller::Caller;
use fsloadgen_request::Request;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::error::Error;
use crate::result::{SampleResult, TaskContext};

const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(1);

/// Executes requests against a shared [`Caller`], bounding concurrency to a
/// fixed pool size. Matches a bounded thread pool with an unbounded FIFO
/// submission queue: every request in a batch is submitted immediately, but
/// at most `concurrency` calls are in flight against the remote service at
/// once. The wait for a free slot counts toward that call's measured
/// latency, since it's a real part of how long the caller waited for a
/// response.
pub struct Executor {
    caller: Arc<dyn Caller>,
    semaphore: Arc<Semaphore>,
    batch_timeout: Duration,
}

impl Executor {
    /// Builds an executor backed by `caller`, allowing up to `concurrency`
    /// calls in flight at once.
    #[must_use]
    pub fn new(caller: Arc<dyn Caller>, concurrency: usize) -> Self {
        Self {
            caller,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }

    /// Overrides the default one-second batch deadline. Exposed for tests
    /// that need to observe partial-completion behavior without waiting a
    /// full second.
    #[must_use]
    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    /// Issues every request in `requests` concurrently, bounded by this
    /// executor's concurrency limit, and collects the results.
    ///
    /// If not every call completes within the batch deadline, the results
    /// gathered so far are returned alongside [`Error::Timeout`]; the
    /// caller is expected to treat this as a best-effort partial batch, not
    /// a hard failure of the whole run.
    pub async fn execute_batch(&self, requests: &[Request]) -> (Vec<SampleResult>, Option<Error>) {
        let total = requests.len();
        let mut tasks: JoinSet<SampleResult> = JoinSet::new();

        for (index, request) in requests.iter().cloned().enumerate() {
            let caller = Arc::clone(&self.caller);
            let semaphore = Arc::clone(&self.semaphore);
            let ctx = TaskContext::new(index);
            tasks.spawn(async move { run_one(caller, semaphore, request, ctx).await });
        }

        let mut results = Vec::with_capacity(total);
        let collect = async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(result) => results.push(result),
                    Err(join_err) => warn!(error = %join_err, "sample task panicked"),
                }
            }
        };

        match tokio::time::timeout(self.batch_timeout, collect).await {
            Ok(()) => (results, None),
            Err(_) => {
                tasks.abort_all();
                let completed = results.len();
                warn!(completed, total, "batch execution timed out");
                (
                    results,
                    Some(Error::Timeout {
                        elapsed_ms: u64::try_from(self.batch_timeout.as_millis()).unwrap_or(u64::MAX),
                        completed,
                        total,
                    }),
                )
            }
        }
    }
}

async fn run_one(
    caller: Arc<dyn Caller>,
    semaphore: Arc<Semaphore>,
    request: Request,
    ctx: TaskContext,
) -> SampleResult {
    let started_at = Utc::now();
    let permit = semaphore
        .acquire_owned()
        .await
        .expect("executor semaphore should never be closed while tasks are in flight");
    let outcome = caller.issue(&request).await;
    drop(permit);

    SampleResult {
        index: ctx.index,
        started_at,
        duration: ctx.start.elapsed(),
        success: outcome.is_ok(),
        error: outcome.err().map(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsloadgen_caller::TestCaller;

    fn arithmetic_request(a: i64, b: i64) -> Request {
        Request::single("fs1", "users", "u1", vec![a.to_string(), b.to_string()]).unwrap()
    }

    #[tokio::test]
    async fn executes_every_request_in_batch() {
        let caller: Arc<dyn Caller> = Arc::new(TestCaller::new(Duration::ZERO));
        let executor = Executor::new(Arc::clone(&caller), 4);
        let requests: Vec<Request> = (0..10).map(|i| arithmetic_request(i, i)).collect();

        let (results, err) = executor.execute_batch(&requests).await;
        assert!(err.is_none());
        assert_eq!(results.len(), 10);
        assert!(results.iter().all(|r| r.success));
    }

    #[tokio::test]
    async fn bounds_concurrency_so_latency_reflects_queueing() {
        let caller: Arc<dyn Caller> = Arc::new(TestCaller::new(Duration::from_millis(50)));
        let executor = Executor::new(Arc::clone(&caller), 1);
        let requests: Vec<Request> = (0..3).map(|i| arithmetic_request(i, 1)).collect();

        let (results, _) = executor.execute_batch(&requests).await;
        assert_eq!(results.len(), 3);
        let max_latency = results.iter().map(|r| r.duration).max().unwrap();
        // With concurrency 1 and 3 sequential 50ms calls, the last result to
        // finish queued behind the other two.
        assert!(max_latency >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn partial_timeout_returns_completed_results_and_an_error() {
        let caller: Arc<dyn Caller> = Arc::new(TestCaller::new(Duration::from_millis(200)));
        let executor =
            Executor::new(Arc::clone(&caller), 2).with_batch_timeout(Duration::from_millis(50));
        let requests: Vec<Request> = (0..4).map(|i| arithmetic_request(i, 1)).collect();

        let (results, err) = executor.execute_batch(&requests).await;
        assert!(results.len() < requests.len());
        assert!(matches!(err, Some(Error::Timeout { .. })));
    }
}
