//! End-to-end tests: merge raw segments, then classify the result

use route_density_lib::{
    ClassifierConfig, Error, Segment, TripAttributes, TripSummary, classify, classify_with,
    filter_top_percentile, merge,
};

fn segment(points: &[(f64, f64)], count: u64) -> Segment {
    Segment::from_points(points.iter().copied()).with_count(count)
}

#[test]
fn test_merge_then_classify_single_super_segment() {
    let segments = vec![
        segment(&[(0.0, 0.0), (1.0, 0.0)], 10),
        segment(&[(1.0, 0.0), (2.0, 0.0)], 20),
    ];

    let merged = merge(&segments, 3).unwrap();
    assert_eq!(merged.len(), 1);
    let points: Vec<(f64, f64)> = merged[0].coords().iter().map(|c| (c.x, c.y)).collect();
    assert_eq!(points, vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);

    // Merged output carries no count, so the fill value stands in for it
    assert_eq!(merged[0].count(), None);
    let classified = classify_with(&merged, &[50.0], 1, 1.0).unwrap();
    assert_eq!(classified.len(), 1);

    // A single-value distribution has its 50th percentile equal to that value.
    // Quantile boundaries are inclusive lower bounds (bucket = number of
    // thresholds <= count), so the value sits in bucket 1. A step colormap
    // that gives `x <= first threshold` the first colour would report bucket 0
    // here instead; this crate deliberately does not follow that convention.
    assert_eq!(classified.thresholds(), &[1.0]);
    assert_eq!(classified[0].bucket, 1);
    assert_eq!(classified[0].percentile_rank, 50.0);
    assert_eq!(classified[0].width, ClassifierConfig::default().width_max);
}

#[test]
fn test_classification_preserves_input_order() {
    let segments = vec![
        segment(&[(0.0, 0.0), (1.0, 0.0)], 30),
        segment(&[(5.0, 0.0), (6.0, 0.0)], 10),
        segment(&[(9.0, 0.0), (9.0, 1.0)], 20),
    ];

    let classified = classify(&segments, &ClassifierConfig::default()).unwrap();
    let counts: Vec<u64> = classified.iter().map(|c| c.count).collect();
    assert_eq!(counts, vec![30, 10, 20]);
}

#[test]
fn test_attached_counts_on_super_segments() {
    let segments = vec![
        segment(&[(0.0, 0.0), (1.0, 0.0)], 10),
        segment(&[(1.0, 0.0), (2.0, 0.0)], 20),
        segment(&[(7.0, 7.0), (8.0, 8.0)], 5),
    ];

    // Attach the busiest member's count to each super-segment
    let merged: Vec<_> = merge(&segments, 3)
        .unwrap()
        .into_iter()
        .map(|s| {
            let busiest = s
                .members()
                .iter()
                .filter_map(|&i| segments[i].count())
                .max()
                .unwrap_or(0);
            s.with_count(busiest)
        })
        .collect();

    let config = ClassifierConfig::default().with_cutpoints(vec![50.0]);
    let classified = classify(&merged, &config).unwrap();
    assert_eq!(classified[0].count, 20);
    assert_eq!(classified[1].count, 5);
    assert!(classified[1].bucket <= classified[0].bucket);
    assert!(classified[1].percentile_rank < classified[0].percentile_rank);
}

#[test]
fn test_filter_merge_summarize() {
    // Twenty disconnected unit segments plus one busy chain of three
    let mut segments: Vec<Segment> = (0..20)
        .map(|i| segment(&[(i as f64 * 10.0, 50.0), (i as f64 * 10.0, 51.0)], 1))
        .collect();
    segments.push(segment(&[(0.0, 0.0), (1.0, 0.0)], 500));
    segments.push(segment(&[(1.0, 0.0), (2.0, 0.0)], 400));
    segments.push(segment(&[(2.0, 0.0), (3.0, 0.0)], 450));

    let busy = filter_top_percentile(&segments, 90.0, 0).unwrap();
    assert_eq!(busy.len(), 3);

    let merged = merge(&busy, 3).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].coords().len(), 4);

    let summary = TripSummary::from_segments(&segments, 0).unwrap();
    assert_eq!(summary.route_count, 23);
    assert_eq!(summary.min, 1.0);
    assert_eq!(summary.max, 500.0);
}

#[test]
fn test_empty_inputs() {
    let empty: Vec<Segment> = Vec::new();
    assert!(merge(&empty, 3).unwrap().is_empty());
    assert!(matches!(
        classify(&empty, &ClassifierConfig::default()),
        Err(Error::EmptyDataset)
    ));
}
