//! Distance metrics to be used when measuring similarity between series.
//!
//! A distance metric compares two queue-occupancy series to determine the "distance" (or
//! similarity) between them. The available distance metrics are implemented here.

use std::{fmt, str};

use serde::{Deserialize, Serialize};

use crate::error::QuedistError;

/// The available distance metrics.
#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub enum DistanceMetric {
    /// Normalized [Dynamic Time Warping](https://en.wikipedia.org/wiki/Dynamic_time_warping).
    ///
    /// The accumulated alignment cost (with absolute-difference local cost) is divided by the
    /// length of the longer series, which makes distances comparable across series pairs of
    /// different lengths.
    #[serde(rename = "dtw")]
    Dtw,
}

impl DistanceMetric {
    /// Compute the distance between two series of queue-occupancy samples.
    ///
    /// The metric is symmetric, and the distance between a series and itself is 0. It is not a
    /// true metric in general (the triangle inequality is not guaranteed), so callers must not
    /// assume it.
    ///
    /// # Arguments
    /// * `a` - The first series.
    /// * `b` - The second series.
    ///
    /// # Examples
    /// ```
    /// use quedist::distance_metric::DistanceMetric;
    ///
    /// let metric = DistanceMetric::Dtw;
    /// assert_eq!(metric.dist(&[10, 20, 10], &[10, 20, 10]), 0.0);
    /// ```
    pub fn dist(&self, a: &[u64], b: &[u64]) -> f64 {
        match self {
            Self::Dtw => dtw(a, b),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Dtw => "dtw",
            }
        )
    }
}

impl str::FromStr for DistanceMetric {
    type Err = QuedistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dtw" => Ok(Self::Dtw),
            unknown => fail!("invalid distance metric '{}'.", unknown),
        }
    }
}

/// Compute the normalized DTW distance between two series.
///
/// The accumulated cost `D[i][j] = |a[i] - b[j]| + min(D[i-1][j], D[i][j-1], D[i-1][j-1])` is
/// computed with two rolling rows over the shorter series, then divided by `max(n, m)`. If either
/// series is empty the distance is `|sum(a) - sum(b)|` (an empty series contributes zero total
/// mass); this degenerate value is not normalized.
fn dtw(a: &[u64], b: &[u64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        let total = |series: &[u64]| series.iter().map(|&sample| sample as f64).sum::<f64>();
        return (total(a) - total(b)).abs();
    }

    // Roll over the shorter series; the metric is symmetric, so the orientation is free.
    let (outer, inner) = match a.len() >= b.len() {
        true => (a, b),
        false => (b, a),
    };
    let (n, m) = (outer.len(), inner.len());

    let mut prev = vec![f64::INFINITY; m + 1];
    let mut curr = vec![f64::INFINITY; m + 1];
    prev[0] = 0.0;

    for i in 1..=n {
        curr[0] = f64::INFINITY;
        let outer_i = outer[i - 1] as f64;

        for j in 1..=m {
            let cost = (outer_i - inner[j - 1] as f64).abs();
            curr[j] = cost + prev[j].min(curr[j - 1]).min(prev[j - 1]);
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[m] / (n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let series = vec![3, 1, 4, 1, 5, 9, 2, 6];

        assert_eq!(DistanceMetric::Dtw.dist(&series, &series), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = vec![10, 20, 10, 0, 5];
        let b = vec![0, 15, 30];

        assert_eq!(
            DistanceMetric::Dtw.dist(&a, &b),
            DistanceMetric::Dtw.dist(&b, &a)
        );
    }

    #[test]
    fn empty_series_degenerate_case() {
        assert_eq!(DistanceMetric::Dtw.dist(&[], &[]), 0.0);
        assert_eq!(DistanceMetric::Dtw.dist(&[], &[5, 3]), 8.0);
        assert_eq!(DistanceMetric::Dtw.dist(&[5, 3], &[]), 8.0);
    }

    #[test]
    fn perfect_alignment_normalizes_to_zero() {
        // [1, 1, 1] aligns perfectly onto [1, 1, 1, 1] by stretching.
        assert_eq!(DistanceMetric::Dtw.dist(&[1, 1, 1], &[1, 1, 1, 1]), 0.0);
    }

    #[test]
    fn hand_computed_distance() {
        // Raw accumulated cost between [1, 2, 3] and [2, 3, 4] is 2, normalized by max(3, 3).
        let distance = DistanceMetric::Dtw.dist(&[1, 2, 3], &[2, 3, 4]);

        assert!((distance - 2.0 / 3.0).abs() < 1e-9, "got {}", distance);
    }

    #[test]
    fn single_sample_stretches_across_longer_series() {
        // The lone sample aligns against every sample of the longer series at zero cost.
        assert_eq!(DistanceMetric::Dtw.dist(&[50], &[50, 50, 50, 50]), 0.0);
    }
}
