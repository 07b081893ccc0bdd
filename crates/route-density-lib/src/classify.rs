//! Trip classification - colour buckets, percentile ranks and display widths
//!
//! Buckets are defined by the quantiles of the trip count distribution at a set
//! of cutpoints. A count lands in bucket `k` when exactly `k` quantile values are
//! less than or equal to it, so bucket 0 holds counts below the first quantile
//! and a count equal to a quantile belongs to the bucket starting there.
//! Mapping buckets to colours is left to the caller.

use crate::segment::TripAttributes;
use crate::stats::{percentile_of_score, quantile_sorted, sorted, validate_cutpoint};
use crate::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for trip classification
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassifierConfig {
    /// Percentile positions (0-100, strictly increasing) whose quantiles bound the buckets.
    /// Default: 60, 80, 95, 99, 99.5, 99.95
    pub cutpoints: Vec<f64>,
    /// Count used for segments without one (default 1)
    pub fill_count: u64,
    /// Percentage used for segments without one (default 1)
    pub fill_percentage: f64,
    /// Display width of the smallest percentage (default 4)
    pub width_min: f64,
    /// Display width of the largest percentage (default 12)
    pub width_max: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            cutpoints: vec![60.0, 80.0, 95.0, 99.0, 99.5, 99.95],
            fill_count: 1,
            fill_percentage: 1.0,
            width_min: 4.0,
            width_max: 12.0,
        }
    }
}

impl ClassifierConfig {
    /// Replace the bucket cutpoints
    pub fn with_cutpoints(mut self, cutpoints: impl Into<Vec<f64>>) -> Self {
        self.cutpoints = cutpoints.into();
        self
    }

    /// Replace the fill values for missing attributes
    pub fn with_fill(mut self, fill_count: u64, fill_percentage: f64) -> Self {
        self.fill_count = fill_count;
        self.fill_percentage = fill_percentage;
        self
    }

    /// Replace the display width range
    pub fn with_width_range(mut self, width_min: f64, width_max: f64) -> Self {
        self.width_min = width_min;
        self.width_max = width_max;
        self
    }

    /// Check the configuration without classifying anything
    pub fn validate(&self) -> Result<()> {
        if self.cutpoints.is_empty() {
            return Err(Error::InvalidInput("no cutpoints given".to_string()));
        }
        for &cutpoint in &self.cutpoints {
            validate_cutpoint(cutpoint)?;
        }
        if let Some(pair) = self.cutpoints.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::InvalidInput(format!(
                "cutpoints must be strictly increasing, found {} then {}",
                pair[0], pair[1]
            )));
        }
        if !self.fill_percentage.is_finite() {
            return Err(Error::InvalidInput(
                "fill percentage must be finite".to_string(),
            ));
        }
        if !self.width_min.is_finite() || !self.width_max.is_finite() {
            return Err(Error::InvalidInput("width range must be finite".to_string()));
        }
        if self.width_min > self.width_max {
            return Err(Error::InvalidInput(format!(
                "width range is inverted: {} > {}",
                self.width_min, self.width_max
            )));
        }
        Ok(())
    }
}

/// Classification of one segment
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Classification {
    /// Colour bucket, in `0..=thresholds.len()`
    pub bucket: usize,
    /// Percentile rank of the count, 0-100
    pub percentile_rank: f64,
    /// Line width scaled from the percentage
    pub width: f64,
    /// Count after filling
    pub count: u64,
    /// Percentage after filling
    pub percentage: f64,
}

/// Result of [`classify`]: per-segment classifications and the bucket thresholds
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassifiedSegments {
    /// Quantile values at each cutpoint, non-decreasing
    thresholds: Vec<f64>,
    /// One entry per input segment, in input order
    classifications: Vec<Classification>,
}

impl ClassifiedSegments {
    /// Quantile values bounding the buckets, useful for a legend
    #[inline]
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Number of distinct buckets (one more than the number of thresholds)
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.thresholds.len() + 1
    }

    #[inline]
    pub fn classifications(&self) -> &[Classification] {
        &self.classifications
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Classification> {
        self.classifications.get(index)
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Classification> {
        self.classifications.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.classifications.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classifications.is_empty()
    }

    pub fn into_classifications(self) -> Vec<Classification> {
        self.classifications
    }
}

impl std::ops::Index<usize> for ClassifiedSegments {
    type Output = Classification;

    fn index(&self, index: usize) -> &Self::Output {
        &self.classifications[index]
    }
}

impl<'a> IntoIterator for &'a ClassifiedSegments {
    type Item = &'a Classification;
    type IntoIter = std::slice::Iter<'a, Classification>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Bucket of `value` given non-decreasing `thresholds`
#[inline]
pub fn bucket_index(thresholds: &[f64], value: f64) -> usize {
    thresholds.partition_point(|q| *q <= value)
}

/// Linearly map `value` from `[min, max]` onto `[width_min, width_max]`
///
/// A degenerate input range (`max <= min`) maps everything to `width_max`.
#[inline]
pub fn scale_width(value: f64, min: f64, max: f64, width_min: f64, width_max: f64) -> f64 {
    if max > min {
        width_min + (value - min) / (max - min) * (width_max - width_min)
    } else {
        width_max
    }
}

/// Classify every segment by trip count and percentage
///
/// # Errors
/// - [`Error::InvalidInput`] for an invalid `config` or a non-finite percentage
/// - [`Error::EmptyDataset`] when `segments` is empty
pub fn classify<T: TripAttributes>(
    segments: &[T],
    config: &ClassifierConfig,
) -> Result<ClassifiedSegments> {
    #[cfg(feature = "profiling")]
    profiling::scope!("classify::classify");

    config.validate()?;
    if segments.is_empty() {
        return Err(Error::EmptyDataset);
    }

    let filled: Vec<u64> = segments
        .iter()
        .map(|s| s.count().unwrap_or(config.fill_count))
        .collect();
    let counts: Vec<f64> = filled.iter().map(|&c| c as f64).collect();
    let percentages: Vec<f64> = segments
        .iter()
        .map(|s| s.percentage().unwrap_or(config.fill_percentage))
        .collect();
    if let Some(index) = percentages.iter().position(|p| !p.is_finite()) {
        return Err(Error::InvalidInput(format!(
            "segment {index} has a non-finite percentage"
        )));
    }

    let ordered = sorted(counts.clone());
    let thresholds = config
        .cutpoints
        .iter()
        .map(|&cutpoint| quantile_sorted(&ordered, cutpoint).ok_or(Error::EmptyDataset))
        .collect::<Result<Vec<f64>>>()?;

    let (min_percentage, max_percentage) = percentages
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
            (lo.min(p), hi.max(p))
        });

    let classifications = filled
        .iter()
        .zip(&counts)
        .zip(&percentages)
        .map(|((&filled_count, &count), &percentage)| {
            Ok(Classification {
                bucket: bucket_index(&thresholds, count),
                percentile_rank: percentile_of_score(&ordered, count)
                    .ok_or(Error::EmptyDataset)?,
                width: scale_width(
                    percentage,
                    min_percentage,
                    max_percentage,
                    config.width_min,
                    config.width_max,
                ),
                count: filled_count,
                percentage,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        segments = segments.len(),
        buckets = thresholds.len() + 1,
        "Classified segments"
    );

    Ok(ClassifiedSegments {
        thresholds,
        classifications,
    })
}

/// [`classify`] with explicit cutpoints and fill values and the default width range
pub fn classify_with(
    segments: &[impl TripAttributes],
    cutpoints: &[f64],
    fill_count: u64,
    fill_percentage: f64,
) -> Result<ClassifiedSegments> {
    let config = ClassifierConfig::default()
        .with_cutpoints(cutpoints)
        .with_fill(fill_count, fill_percentage);
    classify(segments, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Segment;

    fn segment(count: Option<u64>, percentage: Option<f64>) -> Segment {
        let mut s = Segment::from_points([(0.0, 0.0), (1.0, 0.0)]);
        if let Some(c) = count {
            s = s.with_count(c);
        }
        if let Some(p) = percentage {
            s = s.with_percentage(p);
        }
        s
    }

    fn counts(values: impl IntoIterator<Item = u64>) -> Vec<Segment> {
        values.into_iter().map(|c| segment(Some(c), None)).collect()
    }

    #[test]
    fn test_config_default() {
        let config = ClassifierConfig::default();
        assert_eq!(config.cutpoints, vec![60.0, 80.0, 95.0, 99.0, 99.5, 99.95]);
        assert_eq!(config.fill_count, 1);
        assert_eq!(config.width_min, 4.0);
        assert_eq!(config.width_max, 12.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_bad_cutpoints() {
        let base = ClassifierConfig::default();
        for cutpoints in [
            vec![],
            vec![50.0, 50.0],
            vec![80.0, 60.0],
            vec![-1.0, 50.0],
            vec![50.0, 100.5],
            vec![f64::NAN],
        ] {
            let config = base.clone().with_cutpoints(cutpoints);
            assert!(matches!(config.validate(), Err(Error::InvalidInput(_))));
        }
    }

    #[test]
    fn test_config_rejects_bad_width_range() {
        let config = ClassifierConfig::default().with_width_range(5.0, 1.0);
        assert!(matches!(config.validate(), Err(Error::InvalidInput(_))));

        let config = ClassifierConfig::default().with_width_range(f64::NAN, 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_dataset() {
        let empty: Vec<Segment> = Vec::new();
        assert!(matches!(
            classify(&empty, &ClassifierConfig::default()),
            Err(Error::EmptyDataset)
        ));
    }

    #[test]
    fn test_invalid_config_reported_before_empty_dataset() {
        let empty: Vec<Segment> = Vec::new();
        let config = ClassifierConfig::default().with_cutpoints(vec![]);
        assert!(matches!(
            classify(&empty, &config),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_buckets_follow_quantiles() {
        let segments = counts(1..=10);
        let config = ClassifierConfig::default().with_cutpoints(vec![25.0, 50.0, 75.0]);

        let result = classify(&segments, &config).unwrap();
        // h = 9 * p: 3.25, 5.5, 7.75
        assert_eq!(result.thresholds(), &[3.25, 5.5, 7.75]);
        assert_eq!(result.bucket_count(), 4);

        let buckets: Vec<usize> = result.iter().map(|c| c.bucket).collect();
        assert_eq!(buckets, vec![0, 0, 0, 1, 1, 2, 2, 3, 3, 3]);
    }

    #[test]
    fn test_value_equal_to_threshold_starts_bucket() {
        let thresholds = [2.0, 4.0];
        assert_eq!(bucket_index(&thresholds, 1.9), 0);
        assert_eq!(bucket_index(&thresholds, 2.0), 1);
        assert_eq!(bucket_index(&thresholds, 3.9), 1);
        assert_eq!(bucket_index(&thresholds, 4.0), 2);
        assert_eq!(bucket_index(&thresholds, 100.0), 2);
    }

    #[test]
    fn test_bucket_monotonic_in_count() {
        // Skewed distribution with repeated values
        let values: Vec<u64> = (0..500u64).map(|i| (i * i * 7919) % 1013).collect();
        let segments = counts(values.iter().copied());

        let result = classify(&segments, &ClassifierConfig::default()).unwrap();
        let mut pairs: Vec<(u64, usize)> = result.iter().map(|c| (c.count, c.bucket)).collect();
        pairs.sort_unstable();
        assert!(pairs.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_percentile_rank_bounds() {
        let segments = counts([5, 1, 9, 1, 3, 7, 7]);
        let result = classify(&segments, &ClassifierConfig::default()).unwrap();

        let min_rank = result[1].percentile_rank;
        for c in &result {
            assert!((0.0..=100.0).contains(&c.percentile_rank));
            assert!(min_rank <= c.percentile_rank);
        }
        // Two ones out of seven, mean-tie convention
        assert!((min_rank - 100.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_width_scaling() {
        let segments = vec![
            segment(Some(1), Some(0.0)),
            segment(Some(1), Some(5.0)),
            segment(Some(1), Some(10.0)),
        ];
        let result = classify(&segments, &ClassifierConfig::default()).unwrap();

        let widths: Vec<f64> = result.iter().map(|c| c.width).collect();
        assert_eq!(widths, vec![4.0, 8.0, 12.0]);
    }

    #[test]
    fn test_constant_percentage_uses_width_max() {
        let segments = vec![segment(Some(1), Some(3.0)), segment(Some(8), None)];
        let config = ClassifierConfig::default().with_fill(1, 3.0);

        let result = classify(&segments, &config).unwrap();
        assert!(result.iter().all(|c| c.width == config.width_max));
    }

    #[test]
    fn test_missing_count_matches_fill_count() {
        let with_missing = vec![segment(None, None), segment(Some(4), None), segment(Some(9), None)];
        let explicit = vec![segment(Some(2), None), segment(Some(4), None), segment(Some(9), None)];
        let config = ClassifierConfig::default()
            .with_cutpoints(vec![30.0, 60.0])
            .with_fill(2, 1.0);

        let a = classify(&with_missing, &config).unwrap();
        let b = classify(&explicit, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].count, 2);
    }

    #[test]
    fn test_non_finite_percentage_rejected() {
        let segments = vec![segment(Some(1), Some(f64::INFINITY))];
        assert!(matches!(
            classify(&segments, &ClassifierConfig::default()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_classify_with() {
        let segments = counts([10, 20, 30]);
        let result = classify_with(&segments, &[50.0], 0, 1.0).unwrap();
        assert_eq!(result.thresholds(), &[20.0]);
        let buckets: Vec<usize> = result.iter().map(|c| c.bucket).collect();
        assert_eq!(buckets, vec![0, 1, 1]);

        assert_eq!(result.get(2).map(|c| c.count), Some(30));
        assert!(result.get(3).is_none());

        let owned = result.into_classifications();
        assert_eq!(owned.len(), 3);
        assert_eq!(owned[0].count, 10);
    }

    #[test]
    fn test_scale_width_degenerate_range() {
        assert_eq!(scale_width(7.0, 7.0, 7.0, 1.0, 5.0), 5.0);
        assert_eq!(scale_width(2.0, 0.0, 4.0, 1.0, 5.0), 3.0);
    }
}
