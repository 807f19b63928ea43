//! Enumeration of the series pairs that still need a distance.
//!
//! The generators take the identifiers available on each side of a comparison and the loaded
//! cache, and produce the jobs whose distance has not been computed yet. Identifiers are sorted
//! before pairing, so the job list is deterministic and repeated runs are diff-able.

use itertools::Itertools;

use crate::cache::DistanceCache;

/// Enumerate the uncached pairs for a same-kind comparison.
///
/// Pairs are unordered combinations with `i < j`; a pair is excluded if the cache holds an entry
/// under either index order.
pub fn same_kind_pairs(ids: &[u32], cache: &DistanceCache) -> Vec<(u32, u32)> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();

    ids.into_iter()
        .tuple_combinations()
        .filter(|&(i, j)| !cache.contains(i, j))
        .collect()
}

/// Enumerate the uncached pairs for a cross-kind comparison.
///
/// Pairs are the full Cartesian product; `i` always denotes a qdisc series and `j` an emulator
/// series, so no symmetry deduplication applies.
pub fn cross_kind_pairs(
    qdisc_ids: &[u32],
    emulator_ids: &[u32],
    cache: &DistanceCache,
) -> Vec<(u32, u32)> {
    let mut qdisc_ids = qdisc_ids.to_vec();
    qdisc_ids.sort_unstable();
    let mut emulator_ids = emulator_ids.to_vec();
    emulator_ids.sort_unstable();

    qdisc_ids
        .into_iter()
        .cartesian_product(emulator_ids)
        .filter(|&(i, j)| !cache.contains(i, j))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::cache::ComparisonKind;

    use super::*;

    #[test]
    fn same_kind_pairs_exclude_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DistanceCache::load(dir.path(), ComparisonKind::Qdisc).unwrap();
        cache.append(1, 2, 0.5).unwrap();

        assert_eq!(
            same_kind_pairs(&[1, 2, 3], &cache),
            vec![(1, 3), (2, 3)]
        );
    }

    #[test]
    fn same_kind_pairs_exclude_symmetric_aliases() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DistanceCache::load(dir.path(), ComparisonKind::Qdisc).unwrap();
        // Cached under the reversed order; the canonical job must still be excluded.
        cache.append(3, 1, 0.25).unwrap();

        assert_eq!(same_kind_pairs(&[1, 2, 3], &cache), vec![(1, 2), (2, 3)]);
    }

    #[test]
    fn same_kind_pairs_sort_before_pairing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DistanceCache::load(dir.path(), ComparisonKind::Qdisc).unwrap();

        assert_eq!(
            same_kind_pairs(&[3, 1, 2], &cache),
            vec![(1, 2), (1, 3), (2, 3)]
        );
    }

    #[test]
    fn cross_kind_pairs_are_a_full_product() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DistanceCache::load(dir.path(), ComparisonKind::Cross).unwrap();
        cache.append(1, 1, 0.0).unwrap();

        assert_eq!(
            cross_kind_pairs(&[1, 2], &[1, 2], &cache),
            vec![(1, 2), (2, 1), (2, 2)]
        );
    }
}
