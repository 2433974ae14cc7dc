//! Summary statistics and the Wilcoxon signed-rank test used to compare
//! experiment variants.

use std::cmp::Ordering;

// ── Percentile helper ─────────────────────────────────────────────────────────

/// Compute the `p`-th percentile of a **sorted** slice using standard linear
/// interpolation (the same algorithm used by NumPy's `percentile` function).
///
/// Returns `0.0` for an empty slice.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    let len = sorted_data.len();
    if len == 1 {
        return sorted_data[0];
    }
    let rank = (p / 100.0) * (len as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted_data[lo];
    }
    let frac = rank - lo as f64;
    sorted_data[lo] + frac * (sorted_data[hi] - sorted_data[lo])
}

fn sorted(data: &[f64]) -> Vec<f64> {
    let mut ordered = data.to_vec();
    ordered.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    ordered
}

// ── Median ────────────────────────────────────────────────────────────────────

/// Median of `data`: the middle value, or the mean of the two middle values
/// for an even count. Returns `0.0` for an empty slice.
pub fn find_median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let ordered = sorted(data);
    let middle = ordered.len() / 2;
    if ordered.len() % 2 == 1 {
        ordered[middle]
    } else {
        (ordered[middle] + ordered[middle - 1]) / 2.0
    }
}

/// Return `(median, median absolute deviation)` of `data`.
///
/// Pass `median` when it is already known to skip recomputing it.
pub fn median_deviation(data: &[f64], median: Option<f64>) -> (f64, f64) {
    let median = median.unwrap_or_else(|| find_median(data));
    let deviations: Vec<f64> = data.iter().map(|x| (x - median).abs()).collect();
    (median, find_median(&deviations))
}

/// Number of positions at which `a` and `b` differ (over the shorter length).
pub fn diff_count<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

// ── Wilcoxon signed-rank ──────────────────────────────────────────────────────

/// Result of [`wilcoxon_signed_rank`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Wilcoxon {
    /// Absolute value of the signed rank sum.
    pub w: f64,
    /// Number of pairs with a non-zero difference.
    pub pairs: usize,
    /// Standard deviation of the rank sum under the null hypothesis.
    pub std: f64,
    /// Normal approximation with continuity correction. Only meaningful for
    /// more than ten non-identical pairs.
    pub z: f64,
}

/// Paired Wilcoxon signed-rank test of `d1` against `d2`.
///
/// Zero differences are dropped and tied absolute differences share the
/// average of their ranks.
pub fn wilcoxon_signed_rank(d1: &[f64], d2: &[f64]) -> Wilcoxon {
    let mut diffs: Vec<f64> = d1
        .iter()
        .zip(d2)
        .map(|(x, y)| x - y)
        .filter(|d| *d != 0.0)
        .collect();
    diffs.sort_by(|a, b| a.abs().partial_cmp(&b.abs()).unwrap_or(Ordering::Equal));

    let pairs = diffs.len();
    let mut total = 0.0;
    let mut rank = 0;
    while rank < pairs {
        let mut last = rank;
        let mut signs = sign(diffs[rank]);
        while last + 1 < pairs && diffs[rank].abs() == diffs[last + 1].abs() {
            last += 1;
            signs += sign(diffs[last]);
        }
        let average_rank = (last - rank) as f64 / 2.0 + rank as f64 + 1.0;
        total += average_rank * signs;
        rank = last + 1;
    }

    let n = pairs as f64;
    let std = (n * (n + 1.0) * (2.0 * n + 1.0) / 6.0).sqrt();
    let z = if std == 0.0 {
        0.0
    } else {
        let correction = if total > 0.0 { -0.5 } else { 0.5 };
        (total + correction) / std
    };

    Wilcoxon {
        w: total.abs(),
        pairs,
        std,
        z,
    }
}

fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
