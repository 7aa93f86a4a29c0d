//! Aggregate latency statistics over a measured phase's samples.

use std::time::Duration;

use crate::error::{Error, Result};

/// Min/max/mean/percentile summary of a measured phase's latencies.
///
/// Percentiles interpolate across the exact nanosecond-resolution sorted
/// distribution and are only rounded to milliseconds when rendered; `min`,
/// `max`, and `mean` are computed over the millisecond-truncated
/// distribution, matching the pinned policy: interpolate in nanoseconds,
/// render in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    /// Smallest latency, in whole milliseconds.
    pub min_ms: u64,
    /// Largest latency, in whole milliseconds.
    pub max_ms: u64,
    /// Arithmetic mean over millisecond-truncated latencies.
    pub mean_ms: f64,
    /// 90th percentile, interpolated in nanoseconds and reported in
    /// milliseconds.
    pub p90_ms: f64,
    /// 95th percentile, interpolated in nanoseconds and reported in
    /// milliseconds.
    pub p95_ms: f64,
    /// 99th percentile, interpolated in nanoseconds and reported in
    /// milliseconds.
    pub p99_ms: f64,
}

impl Aggregate {
    /// Computes the aggregate over `latencies`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMeasuredSamples`] if `latencies` is empty.
    pub fn compute(latencies: &[Duration]) -> Result<Self> {
        if latencies.is_empty() {
            return Err(Error::NoMeasuredSamples);
        }

        let mut ns: Vec<u128> = latencies.iter().map(Duration::as_nanos).collect();
        ns.sort_unstable();

        let ms_truncated: Vec<u64> = ns
            .iter()
            .map(|v| u64::try_from(v / 1_000_000).unwrap_or(u64::MAX))
            .collect();
        let n = ns.len();

        #[allow(clippy::cast_precision_loss)]
        let mean_ms = ms_truncated.iter().sum::<u64>() as f64 / n as f64;

        Ok(Self {
            min_ms: ms_truncated[0],
            max_ms: ms_truncated[n - 1],
            mean_ms,
            p90_ms: percentile_ms(&ns, 90.0),
            p95_ms: percentile_ms(&ns, 95.0),
            p99_ms: percentile_ms(&ns, 99.0),
        })
    }

    /// Renders the exact output line specified for the aggregate artifact
    /// and stdout summary: `Min: {int}ms, Max: {int}ms, Average:
    /// {float:.2f}ms, P90: {int}ms, P95: {int}ms, P99: {int}ms\n`.
    #[must_use]
    pub fn format_line(&self) -> String {
        format!(
            "Min: {}ms, Max: {}ms, Average: {:.2}ms, P90: {}ms, P95: {}ms, P99: {}ms\n",
            self.min_ms,
            self.max_ms,
            self.mean_ms,
            self.p90_ms.round(),
            self.p95_ms.round(),
            self.p99_ms.round(),
        )
    }
}

/// Linear-interpolation percentile over a nanosecond-resolution sorted
/// distribution, rendered in milliseconds.
///
/// With `n = sorted.len()`, `stride = 100/(n-1)`, `floor = floor(x*(n-1)/100)`,
/// `frac = (x - stride*floor)/stride`; the result is
/// `sorted[floor] + frac*(sorted[floor+1] - sorted[floor])`.
#[allow(clippy::cast_precision_loss)]
fn percentile_ms(sorted_ns: &[u128], x: f64) -> f64 {
    let n = sorted_ns.len();
    if n == 1 {
        return sorted_ns[0] as f64 / 1_000_000.0;
    }

    let stride = 100.0 / (n as f64 - 1.0);
    let floor = ((x * (n as f64 - 1.0)) / 100.0).floor() as usize;
    let floor = floor.min(n - 2);
    let frac = (x - stride * floor as f64) / stride;

    let lo = sorted_ns[floor] as f64;
    let hi = sorted_ns[floor + 1] as f64;
    (lo + frac * (hi - lo)) / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&v| Duration::from_millis(v)).collect()
    }

    #[test]
    fn rejects_empty_latencies() {
        assert!(matches!(Aggregate::compute(&[]), Err(Error::NoMeasuredSamples)));
    }

    #[test]
    fn interpolates_percentiles_per_the_pinned_policy() {
        let latencies = ms(&[10, 20, 30, 40, 50]);
        let aggregate = Aggregate::compute(&latencies).unwrap();
        assert_eq!(aggregate.min_ms, 10);
        assert_eq!(aggregate.max_ms, 50);
        assert!((aggregate.mean_ms - 30.0).abs() < 1e-9);
        assert!((aggregate.p90_ms - 46.0).abs() < 1e-9);
        assert!((aggregate.p95_ms - 48.0).abs() < 1e-9);
        assert!((aggregate.p99_ms - 49.6).abs() < 1e-9);
    }

    #[test]
    fn single_sample_all_percentiles_equal_the_value() {
        let latencies = ms(&[42]);
        let aggregate = Aggregate::compute(&latencies).unwrap();
        assert_eq!(aggregate.p90_ms, 42.0);
        assert_eq!(aggregate.p95_ms, 42.0);
        assert_eq!(aggregate.p99_ms, 42.0);
    }

    #[test]
    fn renders_the_exact_output_line_format() {
        let latencies = ms(&[10, 20, 30, 40, 50]);
        let aggregate = Aggregate::compute(&latencies).unwrap();
        assert_eq!(
            aggregate.format_line(),
            "Min: 10ms, Max: 50ms, Average: 30.00ms, P90: 46ms, P95: 48ms, P99: 50ms\n"
        );
    }

    #[test]
    fn percentile_monotonicity_holds_over_varied_distributions() {
        for n in 2_usize..40 {
            let latencies: Vec<Duration> = (1..=n).map(|i| Duration::from_millis(i as u64 * 3)).collect();
            let aggregate = Aggregate::compute(&latencies).unwrap();
            assert!(aggregate.min_ms as f64 <= aggregate.mean_ms);
            assert!(aggregate.mean_ms <= aggregate.max_ms as f64);
            assert!(aggregate.p90_ms <= aggregate.p95_ms);
            assert!(aggregate.p95_ms <= aggregate.p99_ms);
            assert!(aggregate.p99_ms <= aggregate.max_ms as f64);
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn percentiles_stay_monotonic_and_bounded(millis in proptest::collection::vec(0_u64..10_000, 1..200)) {
            let latencies: Vec<Duration> = millis.into_iter().map(Duration::from_millis).collect();
            let aggregate = Aggregate::compute(&latencies).unwrap();
            prop_assert!(aggregate.min_ms as f64 <= aggregate.mean_ms);
            prop_assert!(aggregate.mean_ms <= aggregate.max_ms as f64);
            prop_assert!(aggregate.p90_ms <= aggregate.p95_ms);
            prop_assert!(aggregate.p95_ms <= aggregate.p99_ms);
            prop_assert!(aggregate.p99_ms <= aggregate.max_ms as f64 + 1.0);
        }
    }
}
