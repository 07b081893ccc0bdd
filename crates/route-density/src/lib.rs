//! Route Density - Command Line Tool
//!
//! Thin adapter over `route-density-lib`: reads segment records as JSON, optionally
//! keeps only the busiest routes, then merges them into super-segments, classifies
//! them, or both, and writes the result as JSON.

pub mod records;
pub mod settings;

use records::{FeatureRecord, Report, SegmentRecord};
use route_density_lib::{
    Segment, SuperSegment, TripAttributes, TripSummary, classify, filter_top_percentile,
    merge_with_config,
};
use settings::Settings;
use std::io::{Read, Write};

/// Error types for the command line tool
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Data(#[from] route_density_lib::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Parse segment records from a JSON document
pub fn read_segments(reader: impl Read) -> Result<Vec<Segment>> {
    let records: Vec<SegmentRecord> = serde_json::from_reader(reader)?;
    Ok(records.into_iter().map(Segment::from).collect())
}

/// Give a super-segment the busiest count and percentage among its members
///
/// Members without a value are ignored; if none has one the attribute stays
/// unset and classification substitutes the fill value.
fn attach_member_attributes(super_segment: SuperSegment, segments: &[Segment]) -> SuperSegment {
    let members = || super_segment.members().iter().map(|&i| &segments[i]);
    let count = members().filter_map(|s| s.count()).max();
    let percentage = members()
        .filter_map(|s| s.percentage())
        .reduce(f64::max);

    let mut super_segment = super_segment;
    if let Some(count) = count {
        super_segment = super_segment.with_count(count);
    }
    if let Some(percentage) = percentage {
        super_segment = super_segment.with_percentage(percentage);
    }
    super_segment
}

/// Run the merge and/or classification pipeline on already loaded segments
pub fn process(segments: Vec<Segment>, settings: &Settings) -> Result<Report> {
    let segments = match settings.top_percentile {
        Some(cutpoint) => {
            let kept = filter_top_percentile(&segments, cutpoint, settings.filter_fill_count)?;
            tracing::info!(
                "Kept {} of {} segments at or above the {}th percentile",
                kept.len(),
                segments.len(),
                cutpoint
            );
            kept
        }
        None => segments,
    };

    let summary = if settings.summary {
        Some(TripSummary::from_segments(&segments, settings.fill_count)?)
    } else {
        None
    };

    if settings.merge {
        let merged = merge_with_config(&segments, &settings.merge_config())?;
        tracing::info!(
            "Merged {} segments into {} super-segments",
            segments.len(),
            merged.len()
        );
        if !settings.classify {
            return Ok(Report {
                thresholds: None,
                summary,
                features: merged.iter().map(FeatureRecord::merged).collect(),
            });
        }

        let merged: Vec<SuperSegment> = merged
            .into_iter()
            .map(|super_segment| attach_member_attributes(super_segment, &segments))
            .collect();
        let classified = classify(&merged, &settings.classifier_config())?;
        tracing::info!(
            "Classified {} super-segments into {} buckets",
            classified.len(),
            classified.bucket_count()
        );

        return Ok(Report {
            thresholds: Some(classified.thresholds().to_vec()),
            summary,
            features: merged
                .iter()
                .zip(&classified)
                .map(|(super_segment, classification)| {
                    FeatureRecord::merged_classified(super_segment, classification)
                })
                .collect(),
        });
    }

    let classified = classify(&segments, &settings.classifier_config())?;
    tracing::info!(
        "Classified {} segments into {} buckets",
        classified.len(),
        classified.bucket_count()
    );

    Ok(Report {
        thresholds: Some(classified.thresholds().to_vec()),
        summary,
        features: segments
            .iter()
            .zip(&classified)
            .map(|(segment, classification)| FeatureRecord::classified(segment, classification))
            .collect(),
    })
}

/// Read the input named in `settings`, process it and write the report
pub fn run(settings: &Settings) -> Result<()> {
    let segments = if settings.input.as_os_str() == "-" {
        read_segments(std::io::stdin().lock())?
    } else {
        let file = std::fs::File::open(&settings.input)?;
        read_segments(std::io::BufReader::new(file))?
    };
    tracing::info!(
        "Loaded {} segments from {}",
        segments.len(),
        settings.input.display()
    );
    if segments.is_empty() {
        tracing::warn!("Input contains no segments");
    }

    let report = process(segments, settings)?;

    let mut writer: Box<dyn Write> = match &settings.output {
        Some(path) => Box::new(std::io::BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    if settings.pretty {
        serde_json::to_writer_pretty(&mut writer, &report)?;
    } else {
        serde_json::to_writer(&mut writer, &report)?;
    }
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}
