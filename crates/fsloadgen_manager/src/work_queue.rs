//! Builds the indexed [`WorkQueue`](crate) view of a corpus that the
//! sampling loop drives through.

use fsloadgen_request::Request;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Which order the work queue replays the corpus in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStrategy {
    /// `workQueue[i] = corpus[i]`.
    InOrder,
    /// A Fisher-Yates shuffle of the corpus, seeded for reproducibility.
    Shuffled,
}

/// Builds the work queue for a run: the corpus unchanged for
/// [`SampleStrategy::InOrder`], or a seeded Fisher-Yates shuffle of it for
/// [`SampleStrategy::Shuffled`].
///
/// A missing seed falls back to a nondeterministic source; callers that need
/// reproducibility must supply a seed explicitly. The seed given here is
/// always the one applied, rather than silently dropped in favor of a
/// constructor-time default.
#[must_use]
pub fn build_work_queue(
    corpus: &[Request],
    strategy: SampleStrategy,
    seed: Option<u64>,
) -> Vec<Request> {
    let mut queue = corpus.to_vec();
    if strategy == SampleStrategy::Shuffled {
        let mut rng = seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        fisher_yates(&mut queue, &mut rng);
    }
    queue
}

/// Durstenfeld's in-place variant of Fisher-Yates: walks the slice from the
/// last element down to the second, swapping each with a uniformly chosen
/// earlier-or-equal element.
fn fisher_yates<T>(items: &mut [T], rng: &mut impl Rng) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Materializes a `len`-element batch starting at `start` in `queue`,
/// wrapping around the end of the queue with modular indexing.
///
/// # Panics
///
/// Panics if `queue` is empty.
#[must_use]
pub fn wrapping_batch(queue: &[Request], start: usize, len: usize) -> Vec<Request> {
    assert!(!queue.is_empty(), "cannot slice an empty work queue");
    let n = queue.len();
    (0..len).map(|i| queue[(start + i) % n].clone()).collect()
}
