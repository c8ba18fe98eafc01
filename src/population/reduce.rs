//! NaN-aware batch reductions
//!
//! Sorting and statistics over fitness batches. NaNs sort last and are
//! skipped by the `nan_*` reductions.

use std::cmp::Ordering;

/// Total order on fitness values with NaN placed after every number
pub fn cmp_nan_last(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b)
        .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

/// Indices that sort `values` ascending; ties keep their original order
pub fn argsort(values: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| cmp_nan_last(values[a], values[b]));
    idx
}

/// Ranks in `0..n`: `ranks[i]` is the position of `values[i]` after sorting
pub fn ranks(values: &[f64]) -> Vec<usize> {
    let mut ranks = vec![0; values.len()];
    for (rank, i) in argsort(values).into_iter().enumerate() {
        ranks[i] = rank;
    }
    ranks
}

/// Index of the smallest value (first one on ties)
pub fn argmin(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| cmp_nan_last(**a, **b))
        .map(|(i, _)| i)
}

/// Mean ignoring NaNs; NaN if nothing remains
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Population standard deviation ignoring NaNs
pub fn nan_std(values: &[f64]) -> f64 {
    let mean = nan_mean(values);
    nan_mean(
        &values
            .iter()
            .map(|v| (v - mean).powi(2))
            .collect::<Vec<_>>(),
    )
    .sqrt()
}

/// Minimum ignoring NaNs
pub fn nan_min(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::min)
        .unwrap_or(f64::NAN)
}

/// Maximum ignoring NaNs
pub fn nan_max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
        .unwrap_or(f64::NAN)
}
