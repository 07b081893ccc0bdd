//! Segment merging - chain disconnected segments into super-segments
//!
//! Segments are connected when the rounded last point of one equals the rounded
//! first point of another. Every unvisited segment, in input order, starts a
//! depth-first walk over its successors; all points reached by one walk form a
//! single [`SuperSegment`].
//!
//! # Branch policy
//!
//! When several segments start where the current one ends, *all* of them are
//! walked, in input order, and appended to the same coordinate list. A true
//! intersection therefore collapses into one (geometrically odd) polyline
//! instead of producing one output per branch: an append-all walk, not a
//! "pick one path" walk.

use crate::Result;
use crate::segment::{DEFAULT_PRECISION, RoundedCoord, Segment, SuperSegment, validate_precision};

use geo::LineString;
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Configuration for segment merging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MergeConfig {
    /// Decimal places endpoints are rounded to before matching.
    /// This silently decides which segments connect: with the default of 3 on
    /// longitude/latitude data, endpoints snap to a grid of roughly 100 m.
    pub precision: u32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }
}

/// Index from rounded first endpoint to the segments starting there
///
/// Built once per merge run and read-only afterwards. Segment lists keep input
/// order, which fixes the order branches are walked in.
#[derive(Debug, Clone)]
pub struct SegmentIndex {
    by_first: HashMap<RoundedCoord, SmallVec<[usize; 2]>>,
    /// Rounded (first, last) endpoints per segment
    endpoints: Vec<(RoundedCoord, RoundedCoord)>,
    precision: u32,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl SegmentIndex {
    /// Validate `segments` and index them by rounded first endpoint
    pub fn build(segments: &[Segment], precision: u32) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("merge::index_build");

        validate_precision(precision)?;

        let mut by_first: HashMap<RoundedCoord, SmallVec<[usize; 2]>> =
            HashMap::with_capacity(segments.len());
        let mut endpoints = Vec::with_capacity(segments.len());

        for (i, segment) in segments.iter().enumerate() {
            segment.validate(i)?;
            let (first, last) = segment.rounded_endpoints(i, precision)?;
            by_first.entry(first).or_default().push(i);
            endpoints.push((first, last));
        }

        Ok(Self {
            by_first,
            endpoints,
            precision,
        })
    }

    /// Segments whose rounded first endpoint is `coord`, in input order
    #[inline]
    pub fn starting_at(&self, coord: RoundedCoord) -> &[usize] {
        self.by_first
            .get(&coord)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Segments that continue where segment `index` ends
    ///
    /// May include `index` itself when the segment is a closed loop.
    #[inline]
    pub fn successors(&self, index: usize) -> &[usize] {
        match self.endpoints.get(index) {
            Some(&(_, last)) => self.starting_at(last),
            None => &[],
        }
    }

    /// Rounded (first, last) endpoints of segment `index`
    #[inline]
    pub fn endpoints(&self, index: usize) -> Option<(RoundedCoord, RoundedCoord)> {
        self.endpoints.get(index).copied()
    }

    /// Number of distinct rounded start points
    #[inline]
    pub fn distinct_starts(&self) -> usize {
        self.by_first.len()
    }

    /// Number of indexed segments
    #[inline]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    #[inline]
    pub fn precision(&self) -> u32 {
        self.precision
    }
}

/// Merge connected segments into super-segments
///
/// Endpoints are rounded to `precision` decimal places before matching
/// (see [`DEFAULT_PRECISION`]). The output partitions the input: every segment
/// belongs to exactly one super-segment. An empty input yields an empty output.
///
/// # Errors
/// - [`crate::Error::InvalidInput`] if `precision` exceeds [`crate::MAX_PRECISION`],
///   or an endpoint is too large to round exactly at that precision
/// - [`crate::Error::MalformedGeometry`] for a segment with fewer than 2 points
///   or a non-finite coordinate
pub fn merge(segments: &[Segment], precision: u32) -> Result<Vec<SuperSegment>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("merge::merge");

    let index = SegmentIndex::build(segments, precision)?;
    let merged = walk(segments, &index);

    tracing::debug!(
        segments = segments.len(),
        distinct_starts = index.distinct_starts(),
        super_segments = merged.len(),
        precision,
        "Merged segments"
    );

    Ok(merged)
}

/// [`merge`] using the precision from `config`
#[inline]
pub fn merge_with_config(segments: &[Segment], config: &MergeConfig) -> Result<Vec<SuperSegment>> {
    merge(segments, config.precision)
}

/// Merge several independent datasets in parallel
///
/// Each dataset is merged on its own; results keep the order of `datasets`.
/// Fails with the first error encountered if any dataset is invalid.
pub fn merge_batch(datasets: &[Vec<Segment>], precision: u32) -> Result<Vec<Vec<SuperSegment>>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("merge::merge_batch");

    datasets
        .par_iter()
        .map(|segments| merge(segments, precision))
        .collect()
}

/// Depth-first append-all walk using an explicit stack
fn walk(segments: &[Segment], index: &SegmentIndex) -> Vec<SuperSegment> {
    let mut visited = vec![false; segments.len()];
    let mut stack: Vec<usize> = Vec::new();
    let mut merged = Vec::new();

    for start in 0..segments.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;

        let mut coords = segments[start].coords().to_vec();
        let mut members = vec![start];

        // Successors are pushed reversed so the first one in input order pops first
        stack.extend(index.successors(start).iter().rev().copied());

        while let Some(current) = stack.pop() {
            if visited[current] {
                continue;
            }
            visited[current] = true;

            // Skip the join point, it is already the last coordinate
            coords.extend_from_slice(&segments[current].coords()[1..]);
            members.push(current);

            stack.extend(index.successors(current).iter().rev().copied());
        }

        merged.push(SuperSegment::new(LineString::new(coords), members));
    }

    merged
}
