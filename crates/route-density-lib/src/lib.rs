//! Route Density Library - Segment Merging and Trip Classification
//!
//! This library turns a collection of disconnected route segments carrying trip
//! counts into display-ready data: connected super-segments and, per segment, a
//! colour bucket, a percentile rank and a line width.
//!
//! # Architecture
//!
//! - **[`Segment`]**: Immutable input polyline with optional `count` and `percentage`
//! - **[`merge()`]**: Chains segments whose rounded endpoints coincide into [`SuperSegment`]s
//! - **[`classify()`]**: Quantile buckets, percentile ranks and width scaling
//! - **[`stats`]**: Quantile primitives, summary statistics and top-percentile filtering
//!
//! # Example
//!
//! ```rust
//! use route_density_lib::{ClassifierConfig, Segment, classify, merge};
//!
//! # fn main() -> route_density_lib::Result<()> {
//! let segments = vec![
//!     Segment::from_points([(0.0, 0.0), (1.0, 0.0)]).with_count(10),
//!     Segment::from_points([(1.0, 0.0), (2.0, 0.0)]).with_count(20),
//! ];
//!
//! let merged = merge(&segments, 3)?;
//! assert_eq!(merged.len(), 1);
//!
//! let classified = classify(&segments, &ClassifierConfig::default())?;
//! assert_eq!(classified.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Performance Characteristics
//!
//! - **Merge**: O(N) expected for N segments (hash index + single walk), no recursion
//! - **Classify**: O(N log N) for sorting the count distribution

mod classify;
mod merge;
mod segment;
pub mod stats;

// Public API exports
pub use classify::{
    Classification, ClassifiedSegments, ClassifierConfig, bucket_index, classify, classify_with,
    scale_width,
};
pub use merge::{MergeConfig, SegmentIndex, merge, merge_batch, merge_with_config};
pub use segment::{
    DEFAULT_PRECISION, MAX_PRECISION, RoundedCoord, Segment, SuperSegment, TripAttributes,
};
pub use stats::{TripSummary, filter_top_percentile};

/// Error types for merging and classification
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Empty dataset: operation is undefined without segments")]
    EmptyDataset,

    #[error("Malformed geometry in segment {index}: {reason}")]
    MalformedGeometry { index: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
