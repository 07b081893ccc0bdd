//! JSON records read and written by the command line tool
//!
//! Input is an array of segment records:
//!
//! ```json
//! [{ "coordinates": [[-87.62, 41.88], [-87.61, 41.88]], "count": 120, "percentage": 2.5 }]
//! ```
//!
//! `count` and `percentage` may be omitted or `null`.

use geo::{Coord, LineString};
use route_density_lib::{Classification, Segment, SuperSegment, TripAttributes, TripSummary};
use serde::{Deserialize, Serialize};

/// One input segment as found in the JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub coordinates: Vec<[f64; 2]>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub percentage: Option<f64>,
}

impl From<SegmentRecord> for Segment {
    fn from(record: SegmentRecord) -> Self {
        let line: LineString<f64> = record
            .coordinates
            .into_iter()
            .map(|[x, y]| Coord { x, y })
            .collect();
        let mut segment = Segment::new(line);
        if let Some(count) = record.count {
            segment = segment.with_count(count);
        }
        if let Some(percentage) = record.percentage {
            segment = segment.with_percentage(percentage);
        }
        segment
    }
}

fn line_to_coordinates(line: &LineString<f64>) -> Vec<[f64; 2]> {
    line.coords().map(|c| [c.x, c.y]).collect()
}

/// One output feature: a polyline plus whatever was computed for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub coordinates: Vec<[f64; 2]>,
    /// Source segment indices of a merged feature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile_rank: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl FeatureRecord {
    /// A merged polyline, without attributes
    pub fn merged(super_segment: &SuperSegment) -> Self {
        Self {
            coordinates: line_to_coordinates(super_segment.line()),
            members: Some(super_segment.members().to_vec()),
            count: super_segment.count(),
            percentage: super_segment.percentage(),
            bucket: None,
            percentile_rank: None,
            width: None,
        }
    }

    /// A merged polyline with the classification of its attached attributes
    pub fn merged_classified(super_segment: &SuperSegment, classification: &Classification) -> Self {
        Self {
            count: Some(classification.count),
            percentage: Some(classification.percentage),
            bucket: Some(classification.bucket),
            percentile_rank: Some(classification.percentile_rank),
            width: Some(classification.width),
            ..Self::merged(super_segment)
        }
    }

    /// An input segment with its classification
    pub fn classified(segment: &Segment, classification: &Classification) -> Self {
        Self {
            coordinates: line_to_coordinates(segment.line()),
            members: None,
            count: Some(classification.count),
            percentage: Some(classification.percentage),
            bucket: Some(classification.bucket),
            percentile_rank: Some(classification.percentile_rank),
            width: Some(classification.width),
        }
    }
}

/// Complete output document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Quantile values bounding the colour buckets (classification only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<TripSummary>,
    pub features: Vec<FeatureRecord>,
}
