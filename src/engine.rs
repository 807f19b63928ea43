//! Parallel execution of pairwise comparisons.
//!
//! The coordinator loads the cache for the requested comparison kind, enumerates the pairs that
//! still need a distance, dispatches them over a bounded worker pool and persists every result
//! through the cache as soon as it arrives. Workers never touch the cache file; results flow
//! back over a channel and the coordinator performs every append itself, so the store only ever
//! has a single writer.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
};

use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    cache::{ComparisonKind, DistanceCache},
    distance_metric::DistanceMetric,
    error::QuedistError,
    pairing,
    series::{Series, SourceKind},
};

/// The outcome of a comparison run.
#[derive(Debug)]
pub struct ComparisonSummary {
    /// The full distance mapping: cached entries plus this run's new results. For same-kind
    /// comparisons every pair is resolvable under both index orders.
    pub distances: HashMap<(u32, u32), f64>,
    /// The number of pairs already present in the cache when the run started.
    pub cached: usize,
    /// The number of pairs that needed a distance at the start of the run.
    pub pending: usize,
    /// The number of distances computed (and kept in the mapping) by this run.
    pub computed: usize,
    /// The number of jobs skipped because a series on either side was empty. These are not
    /// persisted, so a future run with better data will retry them.
    pub skipped: usize,
    /// The number of computed distances that could not be persisted to the cache file.
    pub unsaved: usize,
    /// The number of unparsable lines encountered when loading the cache.
    pub corrupt_cache_lines: usize,
    /// Whether the run was interrupted before all pending jobs were attempted.
    pub interrupted: bool,
}

/// Run all pending comparisons of one kind and persist the results.
///
/// Workers are OS-level threads in a pool of `workers` (0 selects one less than the number of
/// available processing units, floored at 1). Jobs complete in an arbitrary order; `on_result`
/// is invoked from the coordinator as each one lands, before the distance is appended to the
/// cache. Setting `stop` makes the remaining queued jobs bail out while everything already
/// appended stays valid, so an interrupted run resumes for free.
///
/// The only fatal errors are an unusable cache directory and a worker pool that fails to build;
/// per-job problems (an empty series, a failed append) are reported through the summary instead
/// of aborting the run.
///
/// # Arguments
/// * `qdisc_series` - The available qdisc series, keyed by index.
/// * `emulator_series` - The available emulator series, keyed by index.
/// * `kind` - The kind of comparison to run.
/// * `metric` - The distance metric to compute.
/// * `cache_dir` - The directory holding the per-kind cache files.
/// * `workers` - The worker pool size (0 = auto).
/// * `stop` - Cooperative interruption flag.
/// * `on_result` - Called with `(i, j, distance)` as each job completes.
#[allow(clippy::too_many_arguments)]
pub fn run_comparisons<F>(
    qdisc_series: &BTreeMap<u32, Series>,
    emulator_series: &BTreeMap<u32, Series>,
    kind: ComparisonKind,
    metric: DistanceMetric,
    cache_dir: &Path,
    workers: usize,
    stop: &AtomicBool,
    mut on_result: F,
) -> Result<ComparisonSummary, QuedistError>
where
    F: FnMut(u32, u32, Option<f64>),
{
    fs::create_dir_all(cache_dir).map_err(|err| {
        error!(
            "could not create cache directory '{}': {}.",
            cache_dir.display(),
            err
        )
    })?;

    let mut cache = DistanceCache::load(cache_dir, kind)?;

    let series_for = |source_kind: SourceKind| match source_kind {
        SourceKind::Qdisc => qdisc_series,
        SourceKind::Emulator => emulator_series,
    };
    let (left_kind, right_kind) = kind.source_kinds();
    let (left, right) = (series_for(left_kind), series_for(right_kind));

    let jobs = match kind.is_symmetric() {
        true => {
            let ids: Vec<u32> = left.keys().copied().collect();
            pairing::same_kind_pairs(&ids, &cache)
        }
        false => {
            let qdisc_ids: Vec<u32> = left.keys().copied().collect();
            let emulator_ids: Vec<u32> = right.keys().copied().collect();
            pairing::cross_kind_pairs(&qdisc_ids, &emulator_ids, &cache)
        }
    };

    let mut summary = ComparisonSummary {
        distances: cache.distances().clone(),
        cached: cache.len(),
        pending: jobs.len(),
        computed: 0,
        skipped: 0,
        unsaved: 0,
        corrupt_cache_lines: cache.corrupt_lines(),
        interrupted: false,
    };

    if jobs.is_empty() {
        return Ok(summary);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count(workers))
        .build()
        .map_err(|err| error!("could not build worker pool: {}.", err))?;

    let (sender, receiver) = mpsc::channel();

    pool.in_place_scope(|scope| {
        scope.spawn(move |_| {
            jobs.par_iter().for_each_with(sender, |sender, &(i, j)| {
                // Abandon queued jobs on interruption; whatever has already been appended
                // stays valid for the next run.
                if stop.load(Ordering::SeqCst) {
                    return;
                }

                let distance = match (left.get(&i), right.get(&j)) {
                    (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => {
                        Some(metric.dist(&a.samples, &b.samples))
                    }
                    _ => None,
                };

                // The receiver only disappears if the coordinator is gone; nothing to report
                // to at that point.
                let _ = sender.send((i, j, distance));
            });
        });

        // Drain results as they complete (completion order is arbitrary). The coordinator is
        // the only writer to the cache file.
        for (i, j, distance) in receiver.iter() {
            on_result(i, j, distance);

            match distance {
                Some(distance) => {
                    summary.computed += 1;
                    summary.distances.insert((i, j), distance);
                    if kind.is_symmetric() {
                        summary.distances.insert((j, i), distance);
                    }

                    if cache.append(i, j, distance).is_err() {
                        summary.unsaved += 1;
                    }
                }
                None => summary.skipped += 1,
            }
        }
    });

    summary.interrupted = stop.load(Ordering::SeqCst);

    Ok(summary)
}

/// Resolve a configured worker count, where 0 means "auto".
///
/// Auto leaves one processing unit free for coordination and I/O.
pub fn worker_count(configured: usize) -> usize {
    match configured {
        0 => thread::available_parallelism()
            .map(|units| units.get().saturating_sub(1))
            .unwrap_or(1)
            .max(1),
        configured => configured,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn series(index: u32, kind: SourceKind, samples: Vec<u64>) -> (u32, Series) {
        (
            index,
            Series {
                index,
                kind,
                samples,
            },
        )
    }

    fn qdisc_fixture() -> BTreeMap<u32, Series> {
        BTreeMap::from([
            series(1, SourceKind::Qdisc, vec![10, 20, 10]),
            series(2, SourceKind::Qdisc, vec![10, 20, 10]),
            series(3, SourceKind::Qdisc, vec![]),
        ])
    }

    fn run(
        qdisc: &BTreeMap<u32, Series>,
        emulator: &BTreeMap<u32, Series>,
        kind: ComparisonKind,
        cache_dir: &Path,
    ) -> ComparisonSummary {
        run_comparisons(
            qdisc,
            emulator,
            kind,
            DistanceMetric::Dtw,
            cache_dir,
            1,
            &AtomicBool::new(false),
            |_, _, _| {},
        )
        .unwrap()
    }

    #[test]
    fn empty_series_jobs_are_skipped_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let qdisc = qdisc_fixture();

        let summary = run(&qdisc, &BTreeMap::new(), ComparisonKind::Qdisc, dir.path());

        assert_eq!(summary.pending, 3);
        assert_eq!(summary.computed, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.distances.get(&(1, 2)), Some(&0.0));
        assert!(!summary.distances.contains_key(&(1, 3)));

        let cache = DistanceCache::load(dir.path(), ComparisonKind::Qdisc).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains(1, 3));
        assert!(!cache.contains(2, 3));
    }

    #[test]
    fn warm_cache_run_computes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let qdisc = qdisc_fixture();

        let first = run(&qdisc, &BTreeMap::new(), ComparisonKind::Qdisc, dir.path());
        let second = run(&qdisc, &BTreeMap::new(), ComparisonKind::Qdisc, dir.path());

        assert_eq!(second.computed, 0);
        assert_eq!(second.cached, 1);
        // Empty-series jobs are retried, not remembered as failures.
        assert_eq!(second.skipped, 2);
        assert_eq!(second.distances, first.distances);
    }

    #[test]
    fn cross_kind_keys_are_oriented() {
        let dir = tempfile::tempdir().unwrap();
        let qdisc = BTreeMap::from([series(1, SourceKind::Qdisc, vec![5, 5])]);
        let emulator = BTreeMap::from([series(2, SourceKind::Emulator, vec![5, 5, 5])]);

        let summary = run(&qdisc, &emulator, ComparisonKind::Cross, dir.path());

        assert_eq!(summary.computed, 1);
        assert_eq!(summary.distances.get(&(1, 2)), Some(&0.0));
        assert!(!summary.distances.contains_key(&(2, 1)));
    }

    #[test]
    fn unwritable_cache_directory_is_fatal() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let cache_dir = PathBuf::from(file.path());

        let result = run_comparisons(
            &BTreeMap::new(),
            &BTreeMap::new(),
            ComparisonKind::Qdisc,
            DistanceMetric::Dtw,
            &cache_dir,
            1,
            &AtomicBool::new(false),
            |_, _, _| {},
        );

        assert!(result.is_err());
    }

    #[test]
    fn worker_count_floors_at_one() {
        assert!(worker_count(0) >= 1);
        assert_eq!(worker_count(4), 4);
    }
}
