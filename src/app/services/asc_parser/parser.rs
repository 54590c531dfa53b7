//! Whole-file streaming parse of ASCII survey exports
//!
//! Streams a source file line by line through the record parser, producing
//! point features or sentinel-delimited line features together with parse
//! statistics. Malformed records are reported and skipped; they never abort
//! the file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

use crate::app::models::{
    CategoryCode, ExtentTracker, LineFeature, PointFeature, SheetKey,
};
use crate::{Error, Result};

use super::line_builder::{FeedEvent, LineBuilder};
use super::record::{AscRecord, parse_record};
use super::stats::{MalformedRecord, ParseStats};

/// Features and statistics produced by one file parse
#[derive(Debug)]
pub struct ParseOutcome<T> {
    pub features: Vec<T>,
    pub stats: ParseStats,
}

/// Streaming parser for one sheet's category files
#[derive(Debug, Clone)]
pub struct AscParser {
    epsilon: f64,
}

impl AscParser {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Parse a point category file into point features
    ///
    /// Every accepted vertex grows the sheet-level extent.
    pub fn parse_point_file(
        &self,
        path: &Path,
        category: CategoryCode,
        sheet: &SheetKey,
        sheet_extent: &mut ExtentTracker,
    ) -> Result<ParseOutcome<PointFeature>> {
        let reader = open_file(path)?;
        let mut stats = ParseStats::new();
        let mut features = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;
            stats.records_total += 1;

            match parse_record(&line) {
                AscRecord::Vertex(vertex) => {
                    sheet_extent.update(vertex.x, vertex.y);
                    features.push(PointFeature {
                        location: vertex,
                        category,
                        sheet: sheet.clone(),
                    });
                    stats.vertices_parsed += 1;
                    stats.features_emitted += 1;
                }
                AscRecord::Blank => {}
                AscRecord::Malformed(raw) => {
                    report_malformed(path, index + 1, &raw, &mut stats);
                }
                // Sentinels are not part of the point format; treat as malformed input
                AscRecord::SentinelStart | AscRecord::SentinelEnd => {
                    report_malformed(path, index + 1, line.trim(), &mut stats);
                }
            }
        }

        debug!(
            "{} - converted: {} points, {} malformed",
            path.display(),
            stats.features_emitted,
            stats.malformed.len()
        );

        Ok(ParseOutcome { features, stats })
    }

    /// Parse a line category file into line features
    ///
    /// Vertex runs are delimited by the start/end sentinels; runs shorter
    /// than two vertices are discarded and a malformed record abandons the
    /// current run.
    pub fn parse_line_file(
        &self,
        path: &Path,
        category: CategoryCode,
        sheet: &SheetKey,
        sheet_extent: &mut ExtentTracker,
    ) -> Result<ParseOutcome<LineFeature>> {
        let reader = open_file(path)?;
        let mut stats = ParseStats::new();
        let mut features = Vec::new();
        let mut builder = LineBuilder::new(self.epsilon);

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;
            stats.records_total += 1;
            let line_number = index + 1;

            let record = parse_record(&line);
            if let AscRecord::Vertex(vertex) = &record {
                sheet_extent.update(vertex.x, vertex.y);
                stats.vertices_parsed += 1;
            }
            if let AscRecord::Malformed(raw) = &record {
                report_malformed(path, line_number, raw, &mut stats);
            }

            self.apply_event(
                builder.feed(&record),
                path,
                line_number,
                category,
                sheet,
                &mut features,
                &mut stats,
            );
        }

        let line_number = stats.records_total;
        self.apply_event(
            builder.finish(),
            path,
            line_number,
            category,
            sheet,
            &mut features,
            &mut stats,
        );

        debug!(
            "{} - converted: {} lines, {} malformed",
            path.display(),
            stats.features_emitted,
            stats.malformed.len()
        );

        Ok(ParseOutcome { features, stats })
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_event(
        &self,
        event: FeedEvent,
        path: &Path,
        line_number: usize,
        category: CategoryCode,
        sheet: &SheetKey,
        features: &mut Vec<LineFeature>,
        stats: &mut ParseStats,
    ) {
        match event {
            FeedEvent::None => {}
            FeedEvent::Flushed { vertices, axis_flag } => {
                if axis_flag.is_degenerate() {
                    stats.degenerate_lines += 1;
                    warn!(
                        "{} - horizontal or vertical line found (line {})",
                        path.display(),
                        line_number
                    );
                }
                features.push(LineFeature {
                    vertices,
                    category,
                    sheet: sheet.clone(),
                    axis_flag,
                });
                stats.features_emitted += 1;
            }
            FeedEvent::DiscardedUnterminated { vertices } => {
                stats.runs_unterminated += 1;
                warn!(
                    "{} - unterminated run of {} vertices discarded (line {})",
                    path.display(),
                    vertices,
                    line_number
                );
            }
            FeedEvent::DiscardedShort { vertices } => {
                stats.runs_discarded_short += 1;
                debug!(
                    "{} - run of {} vertices too short, discarded (line {})",
                    path.display(),
                    vertices,
                    line_number
                );
            }
            FeedEvent::AbandonedRun { vertices } => {
                stats.runs_abandoned += 1;
                warn!(
                    "{} - run of {} vertices abandoned after malformed record (line {})",
                    path.display(),
                    vertices,
                    line_number
                );
            }
            FeedEvent::StrayVertex => {
                stats.stray_vertices += 1;
                warn!(
                    "{} - vertex outside any run discarded (line {})",
                    path.display(),
                    line_number
                );
            }
            FeedEvent::StrayEnd => {
                debug!(
                    "{} - end sentinel outside any run ignored (line {})",
                    path.display(),
                    line_number
                );
            }
        }
    }
}

fn open_file(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .map_err(|e| Error::io(format!("Failed to open {}", path.display()), e))?;
    Ok(BufReader::new(file))
}

fn report_malformed(path: &Path, line_number: usize, raw: &str, stats: &mut ParseStats) {
    warn!(
        "{} - conversion error at line {}: {}",
        path.display(),
        line_number,
        raw
    );
    stats.malformed.push(MalformedRecord {
        line_number,
        raw: raw.to_string(),
    });
}
