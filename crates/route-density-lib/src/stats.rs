//! Distribution statistics over trip counts
//!
//! Quantiles use linear interpolation between order statistics: for `n` sorted
//! values and a cutpoint `p` in [0, 100], the position is `h = (n - 1) * p / 100`
//! and the result is `v[floor(h)] + (h - floor(h)) * (v[floor(h) + 1] - v[floor(h)])`.
//! Percentile ranks use the mean-tie convention: values strictly below count
//! fully, equal values count half.

use crate::segment::TripAttributes;
use crate::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cutpoint used by [`filter_top_percentile`] to keep the busiest 1% of routes
pub const DEFAULT_TOP_CUTPOINT: f64 = 99.0;

/// Check that `cutpoint` is a finite percentile position in [0, 100]
pub(crate) fn validate_cutpoint(cutpoint: f64) -> Result<()> {
    if !cutpoint.is_finite() || !(0.0..=100.0).contains(&cutpoint) {
        return Err(Error::InvalidInput(format!(
            "cutpoint {cutpoint} is outside [0, 100]"
        )));
    }
    Ok(())
}

/// Trip counts with missing values replaced by `fill_count`, in input order
pub fn filled_counts<T: TripAttributes>(segments: &[T], fill_count: u64) -> Vec<f64> {
    segments
        .iter()
        .map(|s| s.count().unwrap_or(fill_count) as f64)
        .collect()
}

/// Sort values ascending, using a total order on f64
pub fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}

/// Quantile at `cutpoint` (0-100) of already sorted values
///
/// Returns `None` for an empty slice. The cutpoint is clamped to [0, 100].
pub fn quantile_sorted(sorted: &[f64], cutpoint: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let h = last as f64 * (cutpoint.clamp(0.0, 100.0) / 100.0);
    let lo = (h.floor() as usize).min(last);
    let hi = (lo + 1).min(last);
    let fraction = h - lo as f64;
    Some(sorted[lo] + fraction * (sorted[hi] - sorted[lo]))
}

/// Percentile rank (0-100) of `score` within already sorted values
///
/// Returns `None` for an empty slice.
pub fn percentile_of_score(sorted: &[f64], score: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let less = sorted.partition_point(|v| *v < score);
    let less_or_equal = sorted.partition_point(|v| *v <= score);
    let equal = less_or_equal - less;
    Some(100.0 * (less as f64 + 0.5 * equal as f64) / sorted.len() as f64)
}

/// Keep only the segments whose count reaches the quantile at `cutpoint`
///
/// Missing counts are replaced by `fill_count` before the threshold is computed
/// and compared. Kept segments are cloned in input order.
pub fn filter_top_percentile<T: TripAttributes + Clone>(
    segments: &[T],
    cutpoint: f64,
    fill_count: u64,
) -> Result<Vec<T>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("stats::filter_top_percentile");

    validate_cutpoint(cutpoint)?;
    if segments.is_empty() {
        return Err(Error::EmptyDataset);
    }

    let counts = filled_counts(segments, fill_count);
    let ordered = sorted(counts.clone());
    let threshold = quantile_sorted(&ordered, cutpoint).ok_or(Error::EmptyDataset)?;

    let kept: Vec<T> = segments
        .iter()
        .zip(&counts)
        .filter(|(_, count)| **count >= threshold)
        .map(|(segment, _)| segment.clone())
        .collect();

    tracing::debug!(
        cutpoint,
        threshold,
        kept = kept.len(),
        total = segments.len(),
        "Filtered segments by trip count"
    );

    Ok(kept)
}

/// Five-number summary of trip counts
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TripSummary {
    /// Number of routes summarized
    pub route_count: usize,
    pub min: f64,
    /// 25th percentile
    pub q1: f64,
    pub median: f64,
    /// 75th percentile
    pub q3: f64,
    pub max: f64,
}

impl TripSummary {
    /// Summarize the filled counts of `segments`
    pub fn from_segments<T: TripAttributes>(segments: &[T], fill_count: u64) -> Result<Self> {
        Self::from_values(filled_counts(segments, fill_count))
    }

    /// Summarize arbitrary values
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(
                "cannot summarize non-finite values".to_string(),
            ));
        }
        let ordered = sorted(values);
        let at = |cutpoint| quantile_sorted(&ordered, cutpoint).ok_or(Error::EmptyDataset);

        Ok(Self {
            route_count: ordered.len(),
            min: at(0.0)?,
            q1: at(25.0)?,
            median: at(50.0)?,
            q3: at(75.0)?,
            max: at(100.0)?,
        })
    }
}
