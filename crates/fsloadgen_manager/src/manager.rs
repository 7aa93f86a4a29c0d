//! The load manager: the owner of the work queue, sampling strategy,
//! warmup/measured phases, per-sample pacing, and aggregate statistics.

use std::sync::Arc;
use std::time::Duration;

use fsloadgen_caller::Caller;
use fsloadgen_executor::{Executor, SampleResult};
use fsloadgen_request::Request;
use tokio::task::JoinHandle;
use tokio::time::Instant as TokioInstant;
use tracing::{debug, info, warn};

use crate::aggregate::Aggregate;
use crate::config::LoadManagerConfig;
use crate::error::{Error, Result};
use crate::identity::RunIdentity;
use crate::state::RunState;
use crate::work_queue::{build_work_queue, wrapping_batch};

/// Everything a completed run hands back: the run's identity, its
/// aggregate statistics, the full ordered measured-sample sequence (for the
/// results writer), and how many samples missed their one-second budget.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Names this run's output artifacts.
    pub run_identity: RunIdentity,
    /// Min/max/mean/percentile summary over the measured phase.
    pub aggregate: Aggregate,
    /// Every successful measured [`SampleResult`], in sample order.
    pub results: Vec<SampleResult>,
    /// How many samples (warmup or measured) did not finish within their
    /// one-second budget.
    pub exceeded_samples: usize,
    /// Total samples run, warmup and measured combined.
    pub total_samples: usize,
}

/// Drives one load-generation experiment: builds the work queue, runs the
/// warmup and measured phases back to back with a single continuously
/// advancing index, and reduces the measured phase to an [`Aggregate`].
pub struct LoadManager {
    config: LoadManagerConfig,
    caller: Arc<dyn Caller>,
}

impl LoadManager {
    /// Builds a manager that will issue calls through `caller` according to
    /// `config`.
    #[must_use]
    pub fn new(config: LoadManagerConfig, caller: Arc<dyn Caller>) -> Self {
        Self { config, caller }
    }

    /// Runs the full experiment against `corpus` and returns the resulting
    /// report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCorpus`] if `corpus` is empty, or
    /// [`Error::NoMeasuredSamples`] if every measured-phase call failed.
    pub async fn run(&self, corpus: Vec<Request>) -> Result<RunReport> {
        if corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let state = RunState::Init;
        debug!(?state, "load manager starting");

        let run_identity = RunIdentity::new();
        let work_queue = build_work_queue(&corpus, self.config.sample_strategy, self.config.seed);
        let state = RunState::WorkQueueBuilt;
        debug!(queue_len = work_queue.len(), ?state, "work queue built");

        let state = RunState::Warmup;
        info!(
            warmup_samples = self.config.warmup_sample_count,
            measured_samples = self.config.measured_sample_count,
            ?state,
            "entering sampling loop"
        );
        let outcome = self.run_sampling_loop(&work_queue).await;
        let state = RunState::Measure;
        debug!(?state, "measured phase complete");

        let state = RunState::Aggregate;
        let latencies: Vec<Duration> = outcome.measured_results.iter().map(|r| r.duration).collect();
        let aggregate = match Aggregate::compute(&latencies) {
            Ok(aggregate) => aggregate,
            Err(err) => {
                warn!(?state, error = %err, "run ending without an aggregate");
                return Err(err);
            }
        };
        info!(line = %aggregate.format_line().trim_end(), ?state, "aggregate computed");

        let state = RunState::Flush;
        debug!(?state, "handing measured results to results writer");
        let state = RunState::Done;
        debug!(?state, "run complete");

        Ok(RunReport {
            run_identity,
            aggregate,
            results: outcome.measured_results,
            exceeded_samples: outcome.exceeded_samples,
            total_samples: self.config.warmup_sample_count + self.config.measured_sample_count,
        })
    }

    /// Runs the warmup and measured phases as one continuously advancing
    /// index over `work_queue`, per spec: a single per-sample contract
    /// applied `warmupSampleCount + measuredSampleCount` times, with
    /// `keepStats` flipping on once the warmup samples are behind us.
    async fn run_sampling_loop(&self, work_queue: &[Request]) -> SamplingOutcome {
        let total_samples = self.config.warmup_sample_count + self.config.measured_sample_count;
        let qps = self.config.target_qps.max(1);
        let queue_len = work_queue.len();

        let mut index = 0_usize;
        let mut handles: Vec<SampleHandle> = Vec::with_capacity(total_samples);
        let mut exceeded_samples = 0_usize;

        for sample_no in 0..total_samples {
            let keep_stats = sample_no >= self.config.warmup_sample_count;
            let deadline = TokioInstant::now() + self.config.sample_duration;

            let batch = wrapping_batch(work_queue, index, qps);
            index = (index + qps) % queue_len.max(1);

            let caller = Arc::clone(&self.caller);
            let worker_threads = self.config.worker_threads;
            // A fresh executor (and fresh bounded pool) per sample, so cold-pool
            // effects show up during warmup rather than being amortized away.
            let handle = tokio::spawn(async move {
                let executor = Executor::new(caller, worker_threads);
                executor.execute_batch(&batch).await
            });

            tokio::time::sleep_until(deadline).await;

            if !handle.is_finished() {
                exceeded_samples += 1;
                warn!(sample = sample_no, keep_stats, "unable to reach desired QPS");
            }

            handles.push(SampleHandle { keep_stats, handle });
        }

        let measured_results = drain_handles(handles).await;
        SamplingOutcome {
            measured_results,
            exceeded_samples,
        }
    }
}

struct SampleHandle {
    keep_stats: bool,
    handle: JoinHandle<(Vec<SampleResult>, Option<fsloadgen_executor::Error>)>,
}

struct SamplingOutcome {
    measured_results: Vec<SampleResult>,
    exceeded_samples: usize,
}

/// Waits up to ten seconds total for every outstanding sample job to
/// finish, accumulating successful measured-phase results as they land.
/// A sample still pending when the budget runs out is not awaited further
/// and is reported, but does not block the rest of the drain.
async fn drain_handles(handles: Vec<SampleHandle>) -> Vec<SampleResult> {
    const DRAIN_BUDGET: Duration = Duration::from_secs(10);
    let drain_deadline = TokioInstant::now() + DRAIN_BUDGET;

    let mut results = Vec::new();
    let mut pending = 0_usize;

    for sample in handles {
        let remaining = drain_deadline.saturating_duration_since(TokioInstant::now());
        match tokio::time::timeout(remaining, sample.handle).await {
            Ok(Ok((batch, timeout_err))) => {
                if let Some(err) = timeout_err {
                    warn!(error = %err, "sample executor reported a timeout");
                }
                if sample.keep_stats {
                    // Per spec: a failed call's latency is never included in
                    // the results the aggregator or results writer see.
                    results.extend(batch.into_iter().filter(|r| r.success));
                }
            }
            Ok(Err(join_err)) => warn!(error = %join_err, "sample task panicked"),
            Err(_elapsed) => pending += 1,
        }
    }

    if pending > 0 {
        warn!(pending, "run ended with sample jobs still pending after the 10s drain budget");
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsloadgen_caller::TestCaller;
    use fsloadgen_request::Request;

    fn arithmetic_corpus(pairs: &[(i64, i64)]) -> Vec<Request> {
        pairs
            .iter()
            .map(|(a, b)| Request::single("fs1", "users", "u1", vec![a.to_string(), b.to_string()]).unwrap())
            .collect()
    }

    fn fast_config(target_qps: usize, measured: usize) -> LoadManagerConfig {
        LoadManagerConfig::new(target_qps, 1)
            .with_measured_sample_count(measured)
            .with_sample_duration(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn in_order_arithmetic_corpus_observes_sums_in_corpus_order() {
        let corpus = arithmetic_corpus(&[(1, 2), (2, 2), (3, 2), (4, 2), (5, 2), (6, 2)]);
        let test_caller = Arc::new(TestCaller::new(Duration::ZERO));
        let caller: Arc<dyn Caller> = test_caller.clone();
        let manager = LoadManager::new(fast_config(1, 6), caller);

        let report = manager.run(corpus).await.unwrap();

        assert_eq!(report.results.len(), 6);
        assert_eq!(test_caller.observed_sums(), vec![3, 4, 5, 6, 7, 8]);
    }

    #[tokio::test]
    async fn shuffled_runs_with_the_same_seed_observe_the_same_sequence() {
        let corpus = arithmetic_corpus(&[(1, 2), (2, 2), (3, 2), (4, 2), (5, 2), (6, 2)]);

        let config = fast_config(1, 6).with_sample_strategy(crate::SampleStrategy::Shuffled).with_seed(0);
        let first_caller = Arc::new(TestCaller::new(Duration::ZERO));
        let first: Arc<dyn Caller> = first_caller.clone();
        LoadManager::new(config.clone(), first).run(corpus.clone()).await.unwrap();

        let second_caller = Arc::new(TestCaller::new(Duration::ZERO));
        let second: Arc<dyn Caller> = second_caller.clone();
        LoadManager::new(config, second).run(corpus).await.unwrap();

        assert_eq!(first_caller.observed_sums(), second_caller.observed_sums());
    }

    #[tokio::test]
    async fn warmup_samples_are_discarded_from_the_report() {
        let corpus = arithmetic_corpus(&[(1, 2), (2, 2), (3, 2), (4, 2)]);
        let config = fast_config(1, 2).with_warmup_sample_count(2);
        let caller: Arc<dyn Caller> = Arc::new(TestCaller::new(Duration::ZERO));
        let manager = LoadManager::new(config, caller);

        let report = manager.run(corpus).await.unwrap();
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.total_samples, 4);
    }

    #[tokio::test]
    async fn qps_misses_are_counted_when_the_caller_is_too_slow() {
        let corpus = arithmetic_corpus(&[(1, 1), (2, 2), (3, 3)]);
        let config = LoadManagerConfig::new(3, 1)
            .with_measured_sample_count(3)
            .with_sample_duration(Duration::from_millis(10));
        let caller: Arc<dyn Caller> = Arc::new(TestCaller::new(Duration::from_millis(50)));
        let manager = LoadManager::new(config, caller);

        let report = manager.run(corpus).await.unwrap();
        assert!(report.exceeded_samples > 0);
    }

    #[tokio::test]
    async fn empty_corpus_is_rejected_before_any_sample_runs() {
        let caller: Arc<dyn Caller> = Arc::new(TestCaller::new(Duration::ZERO));
        let manager = LoadManager::new(fast_config(1, 1), caller);
        let err = manager.run(Vec::new()).await.unwrap_err();
        assert!(matches!(err, Error::EmptyCorpus));
    }

    #[tokio::test]
    async fn in_order_first_sample_covers_the_whole_corpus_when_qps_exceeds_its_size() {
        let corpus = arithmetic_corpus(&[(1, 1), (2, 2), (3, 3)]);
        let config = fast_config(10, 1);
        let caller = Arc::new(TestCaller::new(Duration::ZERO));
        let manager = LoadManager::new(config, Arc::clone(&caller) as Arc<dyn Caller>);

        manager.run(corpus).await.unwrap();
        let sums = caller.observed_sums();
        // QPS (10) exceeds the corpus size (3); the single sample wraps
        // around and must still touch every request at least once.
        assert!(sums.contains(&2));
        assert!(sums.contains(&4));
        assert!(sums.contains(&6));
    }
}
