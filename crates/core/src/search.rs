//! Deterministic parallel search
//!
//! The index space `[0, N)` is cut into contiguous partitions, one per
//! worker, ordered by starting index. A worker scans its range in canonical
//! order and stops at its first match. Once partition `j` reports a match,
//! every partition above `j` is cancelled at its next batch boundary, while
//! partitions below `j` keep running since they may still hold an earlier
//! match. The answer is therefore the globally smallest matching index, no
//! matter how many workers ran.

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::codec::TargetMask;
use crate::params::CHECK_INTERVAL;
use crate::pattern::Pattern;
use crate::registry::DigestFn;
use crate::{Error, Result};

/// Threading and cancellation knobs for a search
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Worker count (default: available hardware concurrency)
    pub threads: Option<usize>,
    /// External stop flag, polled at batch boundaries
    pub cancel: Option<Arc<AtomicBool>>,
    /// Running total of digests evaluated, updated once per batch
    pub progress: Option<Arc<AtomicU64>>,
}

impl SearchConfig {
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads: Some(threads),
            ..Self::default()
        }
    }

    /// Resolved worker count, at least 1
    pub fn thread_count(&self) -> usize {
        self.threads
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(2)
            })
            .max(1)
    }
}

/// Outcome of a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    /// The lowest-index matching candidate
    Found(Vec<u8>),
    /// No candidate in the space matches
    Exhausted,
    /// Stopped through `SearchConfig::cancel` before the answer was settled
    Cancelled,
}

impl SearchResult {
    pub fn found(&self) -> Option<&[u8]> {
        match self {
            SearchResult::Found(candidate) => Some(candidate),
            _ => None,
        }
    }

    pub fn into_found(self) -> Option<Vec<u8>> {
        match self {
            SearchResult::Found(candidate) => Some(candidate),
            _ => None,
        }
    }
}

/// What a single partition ended with
#[derive(Debug)]
enum Outcome {
    Found { index: u128, candidate: Vec<u8> },
    Exhausted,
    Stopped,
}

/// State shared by every worker of one search
struct Shared<'a> {
    /// Smallest partition index known to hold a match
    settled: AtomicUsize,
    cancel: Option<&'a AtomicBool>,
    progress: Option<&'a AtomicU64>,
}

impl Shared<'_> {
    #[inline]
    fn should_stop(&self, partition: usize) -> bool {
        self.settled.load(Ordering::Relaxed) < partition
            || self.cancel.is_some_and(|c| c.load(Ordering::Relaxed))
    }

    #[inline]
    fn settle(&self, partition: usize) {
        self.settled.fetch_min(partition, Ordering::Relaxed);
    }

    #[inline]
    fn record(&self, hashes: usize) {
        if let Some(progress) = self.progress {
            progress.fetch_add(hashes as u64, Ordering::Relaxed);
        }
    }
}

/// Search `pattern` for the first candidate whose digest matches `target`.
///
/// The result is identical for every thread count.
pub fn search(
    pattern: &Pattern,
    target: &TargetMask,
    digest: &DigestFn,
    config: &SearchConfig,
) -> Result<SearchResult> {
    if target.len() != digest.output_len() {
        return Err(Error::InvalidPattern(format!(
            "target/mask are {} bytes but {} digests are {} bytes",
            target.len(),
            digest.name(),
            digest.output_len()
        )));
    }

    let ranges = partition(pattern.space_size(), config.thread_count());
    debug!(
        algorithm = digest.name(),
        space = %pattern.space_size(),
        partitions = ranges.len(),
        constrained_bits = target.constrained_bits(),
        "starting search"
    );

    let shared = Shared {
        settled: AtomicUsize::new(usize::MAX),
        cancel: config.cancel.as_deref(),
        progress: config.progress.as_deref(),
    };

    let outcomes = run_partitions(&ranges, pattern, target, digest, &shared)?;
    Ok(merge(outcomes))
}

/// Split `[0, space)` into at most `parts` contiguous, non-empty ranges
pub(crate) fn partition(space: u128, parts: usize) -> Vec<Range<u128>> {
    let parts = (parts.max(1) as u128).min(space);
    if parts == 0 {
        return Vec::new();
    }

    let base = space / parts;
    let extra = space % parts;
    let mut start = 0u128;

    (0..parts)
        .map(|i| {
            let len = base + u128::from(i < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

/// Run every partition on its own pool thread
#[cfg(feature = "parallel")]
fn run_partitions(
    ranges: &[Range<u128>],
    pattern: &Pattern,
    target: &TargetMask,
    digest: &DigestFn,
    shared: &Shared<'_>,
) -> Result<Vec<Outcome>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ranges.len().max(1))
        .thread_name(|i| format!("easypow-worker-{i}"))
        .build()
        .map_err(|e| Error::ThreadPool(e.to_string()))?;

    Ok(pool.install(|| {
        ranges
            .par_iter()
            .with_max_len(1)
            .enumerate()
            .map(|(i, range)| scan(i, range.clone(), pattern, target, digest, shared))
            .collect()
    }))
}

/// Run partitions one after another (sequential fallback)
#[cfg(not(feature = "parallel"))]
fn run_partitions(
    ranges: &[Range<u128>],
    pattern: &Pattern,
    target: &TargetMask,
    digest: &DigestFn,
    shared: &Shared<'_>,
) -> Result<Vec<Outcome>> {
    let mut outcomes = Vec::with_capacity(ranges.len());
    for (i, range) in ranges.iter().enumerate() {
        let outcome = scan(i, range.clone(), pattern, target, digest, shared);
        let done = !matches!(outcome, Outcome::Exhausted);
        outcomes.push(outcome);
        if done {
            break;
        }
    }
    Ok(outcomes)
}

/// Scan one partition in canonical order
fn scan(
    partition: usize,
    range: Range<u128>,
    pattern: &Pattern,
    target: &TargetMask,
    digest: &DigestFn,
    shared: &Shared<'_>,
) -> Outcome {
    let mut odometer = pattern.odometer(range.start);
    let mut out = vec![0u8; digest.output_len()];
    let mut batch = 0usize;

    for index in range {
        if batch == CHECK_INTERVAL {
            shared.record(batch);
            batch = 0;
        }
        if batch == 0 && shared.should_stop(partition) {
            debug!(partition, index = %index, "partition cancelled");
            return Outcome::Stopped;
        }

        digest.digest_into(odometer.candidate(), &mut out);
        batch += 1;

        if target.matches(&out) {
            shared.record(batch);
            shared.settle(partition);
            debug!(partition, index = %index, "partition found a match");
            return Outcome::Found {
                index,
                candidate: odometer.candidate().to_vec(),
            };
        }

        odometer.advance();
    }

    shared.record(batch);
    Outcome::Exhausted
}

/// Walk partitions in index order: the first one that did not exhaust decides
fn merge(outcomes: Vec<Outcome>) -> SearchResult {
    for (partition, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Outcome::Exhausted => continue,
            Outcome::Found { index, candidate } => {
                debug!(partition, index = %index, "search settled");
                return SearchResult::Found(candidate);
            }
            Outcome::Stopped => {
                debug!(partition, "search cancelled before settling");
                return SearchResult::Cancelled;
            }
        }
    }
    SearchResult::Exhausted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_cover_the_space_in_order() {
        let ranges = partition(10, 3);
        assert_eq!(ranges, vec![0..4, 4..7, 7..10]);
    }

    #[test]
    fn fewer_partitions_than_workers_when_space_is_small() {
        let ranges = partition(3, 8);
        assert_eq!(ranges, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn zero_workers_means_one_partition() {
        assert_eq!(partition(5, 0), vec![0..5]);
    }

    #[test]
    fn merge_prefers_lowest_partition() {
        let outcomes = vec![
            Outcome::Exhausted,
            Outcome::Found {
                index: 5,
                candidate: b"b".to_vec(),
            },
            Outcome::Found {
                index: 9,
                candidate: b"c".to_vec(),
            },
        ];
        assert_eq!(merge(outcomes), SearchResult::Found(b"b".to_vec()));
    }

    #[test]
    fn merge_stopped_before_a_match_is_cancelled() {
        let outcomes = vec![
            Outcome::Stopped,
            Outcome::Found {
                index: 9,
                candidate: b"c".to_vec(),
            },
        ];
        assert_eq!(merge(outcomes), SearchResult::Cancelled);
        assert_eq!(
            merge(vec![Outcome::Exhausted, Outcome::Exhausted]),
            SearchResult::Exhausted
        );
    }
}
