//! Segment structures: raw input polylines, merged super-segments and the
//! rounded endpoint keys used to connect them

use crate::{Error, Result};
use geo::{Coord, LineString};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of decimal places used to round endpoints when no precision is given
pub const DEFAULT_PRECISION: u32 = 3;

/// Largest precision accepted; f64 carries no more significant decimals than this
pub const MAX_PRECISION: u32 = 15;

/// 2^53, the bound below which scaled coordinates stay exact integers
const MAX_EXACT_SCALED: f64 = 9_007_199_254_740_992.0;

/// A coordinate rounded to a fixed number of decimal places
///
/// Stored as the scaled integer values (`round(x * 10^precision)`) so that it can be
/// hashed and compared exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RoundedCoord {
    x: i64,
    y: i64,
}

impl RoundedCoord {
    /// Round `coord` to `precision` decimal places
    ///
    /// Returns `None` when a scaled value leaves the range where f64 still holds
    /// every integer exactly (`|v| < 2^53`), since distinct endpoints would then
    /// share a key.
    #[inline]
    pub fn new(coord: Coord<f64>, precision: u32) -> Option<Self> {
        let scale = 10f64.powi(precision as i32);
        let x = (coord.x * scale).round();
        let y = (coord.y * scale).round();
        if !(x.abs() < MAX_EXACT_SCALED && y.abs() < MAX_EXACT_SCALED) {
            return None;
        }
        Some(Self {
            x: x as i64,
            y: y as i64,
        })
    }

    /// Convert back to a coordinate at the rounded position
    pub fn to_coord(self, precision: u32) -> Coord<f64> {
        let scale = 10f64.powi(precision as i32);
        Coord {
            x: self.x as f64 / scale,
            y: self.y as f64 / scale,
        }
    }
}

/// Check that a rounding precision is usable
pub(crate) fn validate_precision(precision: u32) -> Result<()> {
    if precision > MAX_PRECISION {
        return Err(Error::InvalidInput(format!(
            "precision {precision} exceeds the maximum of {MAX_PRECISION} decimal places"
        )));
    }
    Ok(())
}

/// Numeric trip attributes attached to a polyline
///
/// Both values may be missing; consumers substitute configured fill values.
pub trait TripAttributes {
    /// Number of trips recorded on the polyline
    fn count(&self) -> Option<u64>;
    /// Share of trips (0-100) recorded on the polyline
    fn percentage(&self) -> Option<f64>;
}

/// One input polyline with optional trip attributes
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    line: LineString<f64>,
    count: Option<u64>,
    percentage: Option<f64>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Segment {
    /// Create a segment without attributes
    pub fn new(line: LineString<f64>) -> Self {
        Self {
            line,
            count: None,
            percentage: None,
        }
    }

    /// Create a segment from `(x, y)` pairs
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self::new(points.into_iter().map(Coord::from).collect())
    }

    /// Attach a trip count
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Attach a trip percentage
    pub fn with_percentage(mut self, percentage: f64) -> Self {
        self.percentage = Some(percentage);
        self
    }

    /// The underlying polyline
    #[inline]
    pub fn line(&self) -> &LineString<f64> {
        &self.line
    }

    /// All points of the polyline
    #[inline]
    pub fn coords(&self) -> &[Coord<f64>] {
        &self.line.0
    }

    /// Number of points
    #[inline]
    pub fn len(&self) -> usize {
        self.line.0.len()
    }

    /// Whether the polyline has no points at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.line.0.is_empty()
    }

    /// Ensure the segment is a usable polyline
    ///
    /// `index` is the segment's position in its collection, reported in the error.
    pub fn validate(&self, index: usize) -> Result<()> {
        if self.len() < 2 {
            return Err(Error::MalformedGeometry {
                index,
                reason: format!("expected at least 2 points, found {}", self.len()),
            });
        }
        if let Some(bad) = self
            .coords()
            .iter()
            .find(|c| !c.x.is_finite() || !c.y.is_finite())
        {
            return Err(Error::MalformedGeometry {
                index,
                reason: format!("non-finite coordinate ({}, {})", bad.x, bad.y),
            });
        }
        Ok(())
    }

    /// Rounded first and last endpoints
    ///
    /// Must only be called on validated segments; `index` is reported in the error.
    pub(crate) fn rounded_endpoints(
        &self,
        index: usize,
        precision: u32,
    ) -> Result<(RoundedCoord, RoundedCoord)> {
        let coords = self.coords();
        let round = |coord: Coord<f64>| {
            RoundedCoord::new(coord, precision).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "segment {index}: endpoint ({}, {}) is too large to round to {precision} decimal places",
                    coord.x, coord.y
                ))
            })
        };
        Ok((round(coords[0])?, round(coords[coords.len() - 1])?))
    }
}

impl TripAttributes for Segment {
    #[inline]
    fn count(&self) -> Option<u64> {
        self.count
    }

    #[inline]
    fn percentage(&self) -> Option<f64> {
        self.percentage
    }
}

/// A polyline formed by chaining one or more segments at matching endpoints
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SuperSegment {
    /// Concatenated points, join points appear once
    line: LineString<f64>,
    /// Indices of the source segments in the order they were appended
    members: Vec<usize>,
    count: Option<u64>,
    percentage: Option<f64>,
}

impl SuperSegment {
    pub(crate) fn new(line: LineString<f64>, members: Vec<usize>) -> Self {
        Self {
            line,
            members,
            count: None,
            percentage: None,
        }
    }

    /// Attach a trip count (merging never sets one)
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Attach a trip percentage (merging never sets one)
    pub fn with_percentage(mut self, percentage: f64) -> Self {
        self.percentage = Some(percentage);
        self
    }

    #[inline]
    pub fn line(&self) -> &LineString<f64> {
        &self.line
    }

    #[inline]
    pub fn coords(&self) -> &[Coord<f64>] {
        &self.line.0
    }

    /// Source segment indices, in traversal order
    #[inline]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Consume the super-segment, keeping only its polyline
    pub fn into_line(self) -> LineString<f64> {
        self.line
    }
}

impl TripAttributes for SuperSegment {
    #[inline]
    fn count(&self) -> Option<u64> {
        self.count
    }

    #[inline]
    fn percentage(&self) -> Option<f64> {
        self.percentage
    }
}
