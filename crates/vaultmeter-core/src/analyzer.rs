//! The sequential decode → classify → apply pipeline.
//!
//! Processes one backup file per run: pull one record, classify it, apply
//! its events, pull the next. No concurrency, no cancellation; the run
//! either exhausts the stream or unwinds on the first fatal error, in
//! which case no metrics must be exported.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::info;

use crate::classify::{ClassifyError, classify};
use crate::decoder::{DecodeError, RecordStream};
use crate::metrics::{MetricError, MetricSet};
use crate::mounts::MountDirectory;

/// Totals of one completed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzeStats {
    /// Records decoded from the stream.
    pub records: u64,
    /// Metric events applied.
    pub events: u64,
    /// Records that produced no events (classification gaps).
    pub unclassified: u64,
}

/// Any fatal pipeline failure. All of these suppress the metrics push.
#[derive(Debug)]
pub enum AnalyzeError {
    /// The backup file could not be opened.
    Open { path: String, source: io::Error },
    /// Stream decoding failed.
    Decode(DecodeError),
    /// A record referenced a mount the directory does not know.
    Classify(ClassifyError),
    /// A metric invariant was violated (programming error).
    Metric(MetricError),
}

impl std::fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyzeError::Open { path, source } => {
                write!(f, "cannot open backup '{}': {}", path, source)
            }
            AnalyzeError::Decode(e) => write!(f, "{}", e),
            AnalyzeError::Classify(e) => write!(f, "{}", e),
            AnalyzeError::Metric(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AnalyzeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalyzeError::Open { source, .. } => Some(source),
            AnalyzeError::Decode(e) => Some(e),
            AnalyzeError::Classify(e) => Some(e),
            AnalyzeError::Metric(e) => Some(e),
        }
    }
}

impl From<DecodeError> for AnalyzeError {
    fn from(e: DecodeError) -> Self {
        AnalyzeError::Decode(e)
    }
}

impl From<ClassifyError> for AnalyzeError {
    fn from(e: ClassifyError) -> Self {
        AnalyzeError::Classify(e)
    }
}

impl From<MetricError> for AnalyzeError {
    fn from(e: MetricError) -> Self {
        AnalyzeError::Metric(e)
    }
}

/// Analyze a backup stream, accumulating into `metrics`.
pub fn analyze_backup<R: Read>(
    source: R,
    chunk_size: usize,
    directory: &MountDirectory,
    metrics: &MetricSet,
) -> Result<AnalyzeStats, AnalyzeError> {
    let mut stats = AnalyzeStats::default();

    for result in RecordStream::with_chunk_size(source, chunk_size) {
        let record = result?;
        stats.records += 1;

        let events = classify(&record, directory)?;
        if events.is_empty() {
            stats.unclassified += 1;
            continue;
        }
        for event in &events {
            metrics.apply(event)?;
            stats.events += 1;
        }
    }

    info!(
        records = stats.records,
        events = stats.events,
        unclassified = stats.unclassified,
        "backup analyzed"
    );
    Ok(stats)
}

/// Analyze a backup file by path.
pub fn analyze_file(
    path: &Path,
    chunk_size: usize,
    directory: &MountDirectory,
    metrics: &MetricSet,
) -> Result<AnalyzeStats, AnalyzeError> {
    let file = File::open(path).map_err(|e| AnalyzeError::Open {
        path: path.display().to_string(),
        source: e,
    })?;
    analyze_backup(file, chunk_size, directory, metrics)
}
