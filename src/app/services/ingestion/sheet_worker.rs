//! Per-sheet parsing and coverage filtering
//!
//! One worker invocation handles a single sheet: streams its point and
//! line category files through the parser, tracks the sheet extent, and
//! filters the parsed geometry to the sheet's own coverage polygon. The
//! result set is handed back to the merging coordinator by value.

use geo::Intersects;
use tracing::{debug, warn};

use crate::app::models::{
    CoveragePolygon, ExtentTracker, LineFeature, PointFeature, SheetKey,
};
use crate::app::services::asc_parser::{AscParser, ParseStats};
use crate::app::services::coverage_loader::CoverageIndex;
use crate::app::services::sheet_catalog::SheetCatalog;
use crate::app::services::spatial::SpatialOps;
use crate::config::Config;
use crate::constants::{LINE_CATEGORIES, POINT_CATEGORIES};
use crate::Result;

/// Completed result set of one sheet
#[derive(Debug)]
pub struct SheetBatch {
    pub raw_id: String,
    pub key: SheetKey,
    /// The sheet's coverage polygon; absent when the sheet was skipped
    pub coverage: Option<CoveragePolygon>,
    /// Point features intersecting the coverage polygon
    pub points: Vec<PointFeature>,
    /// Line features clipped to the coverage polygon
    pub lines: Vec<LineFeature>,
    pub stats: ParseStats,
    pub files_missing: usize,
    /// True when the sheet extent stayed empty and nothing was merged
    pub skipped_empty: bool,
}

/// Parse and locally filter one sheet
///
/// A sheet whose extent stays empty is skipped without a coverage lookup.
/// Otherwise exactly one coverage polygon must match the sheet key; the
/// lookup failure is fatal for this sheet's merge step only.
pub fn process_sheet(
    raw_id: &str,
    config: &Config,
    catalog: &SheetCatalog,
    coverage_index: &CoverageIndex,
    ops: &dyn SpatialOps,
) -> Result<SheetBatch> {
    let key = SheetKey::from_raw(raw_id);
    let parser = AscParser::new(config.degenerate_epsilon);
    let mut extent = ExtentTracker::new();
    let mut stats = ParseStats::new();
    let mut files_missing = 0;

    let mut points = Vec::new();
    if config.import_points {
        for &category in POINT_CATEGORIES {
            let Some(path) = catalog.source_for(raw_id, category) else {
                continue;
            };
            if !path.exists() {
                warn!("{} - not found", path.display());
                files_missing += 1;
                continue;
            }
            let outcome = parser.parse_point_file(path, category, &key, &mut extent)?;
            points.extend(outcome.features);
            stats.merge(outcome.stats);
        }
    }

    let mut lines = Vec::new();
    if config.import_lines {
        for &category in LINE_CATEGORIES {
            let Some(path) = catalog.source_for(raw_id, category) else {
                continue;
            };
            if !path.exists() {
                warn!("{} - not found", path.display());
                files_missing += 1;
                continue;
            }
            let outcome = parser.parse_line_file(path, category, &key, &mut extent)?;
            lines.extend(outcome.features);
            stats.merge(outcome.stats);
        }
    }

    // No data for this sheet: no coverage entry, no features
    if extent.is_empty() {
        return Ok(SheetBatch {
            raw_id: raw_id.to_string(),
            key,
            coverage: None,
            points: Vec::new(),
            lines: Vec::new(),
            stats,
            files_missing,
            skipped_empty: true,
        });
    }

    let coverage = coverage_index.lookup(&key)?.clone();

    // Keep only geometry inside this sheet's own coverage; neighboring
    // sheets' exports bleed past the nominal boundary
    let parsed_points = points.len();
    points.retain(|feature| feature.point().intersects(&coverage.polygon));
    debug!(
        "Sheet '{}': {} of {} points inside coverage",
        raw_id,
        points.len(),
        parsed_points
    );

    let mut clipped_lines = Vec::new();
    for feature in &lines {
        clipped_lines.extend(ops.clip(feature, &coverage.polygon)?);
    }
    debug!(
        "Sheet '{}': {} line pieces after coverage clip of {} runs",
        raw_id,
        clipped_lines.len(),
        lines.len()
    );

    Ok(SheetBatch {
        raw_id: raw_id.to_string(),
        key,
        coverage: Some(coverage),
        points,
        lines: clipped_lines,
        stats,
        files_missing,
        skipped_empty: false,
    })
}
