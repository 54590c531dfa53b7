//! Duplicate line removal along shared sheet-coverage edges
//!
//! Adjacent sheets independently re-trace their common border, so the
//! shared edge shows up twice in the cumulative line container even after
//! per-sheet clipping. The deduplicator derives the shared edges from the
//! coverage-polygon self-intersection, buffers them into a thin corridor,
//! pulls every intersecting line out of the cumulative container, breaks
//! the extracted polylines into atomic 2-vertex segments and restores only
//! the segments not wholly inside the corridor. Segments lying along the
//! boundary are permanently dropped; segments crossing it transversally
//! survive.

use geo::{Intersects, Relate};
use tracing::{debug, info};

use crate::Result;
use crate::app::models::{CoverageSet, LineSet};
use crate::app::services::spatial::SpatialOps;

/// Effectiveness metrics of one deduplication pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DedupStats {
    /// Shared boundary edges found between coverage polygons
    pub shared_edges: usize,
    /// Polylines moved out of the cumulative container
    pub lines_extracted: usize,
    /// Atomic segments the extracted polylines decomposed into
    pub segments_split: usize,
    /// Segments returned to the cumulative container
    pub segments_restored: usize,
    /// Segments dropped as boundary duplicates
    pub segments_removed: usize,
}

/// Removes duplicated boundary geometry from the cumulative line container
pub struct BoundaryDeduplicator<'a> {
    ops: &'a dyn SpatialOps,
    edge_buffer: f64,
}

impl<'a> BoundaryDeduplicator<'a> {
    pub fn new(ops: &'a dyn SpatialOps, edge_buffer: f64) -> Self {
        Self { ops, edge_buffer }
    }

    /// Run one deduplication pass over the cumulative lines
    ///
    /// Idempotent: a second pass over its own output removes nothing.
    pub fn dedup(&self, lines: &mut LineSet, coverage: &CoverageSet) -> Result<DedupStats> {
        let mut stats = DedupStats::default();

        let shared_edges = self.ops.self_intersect(coverage.as_slice())?;
        stats.shared_edges = shared_edges.0.len();
        if shared_edges.0.is_empty() {
            debug!("No shared coverage edges, deduplication is a no-op");
            return Ok(stats);
        }

        let corridor = self.ops.buffer(&shared_edges, self.edge_buffer)?;

        let extracted = lines.extract_where(|feature| feature.line_string().intersects(&corridor));
        stats.lines_extracted = extracted.len();

        for feature in &extracted {
            for segment in self.ops.split(feature) {
                stats.segments_split += 1;
                let inside_corridor = segment.line_string().relate(&corridor).is_within();
                if inside_corridor {
                    stats.segments_removed += 1;
                } else {
                    stats.segments_restored += 1;
                    lines.push(segment);
                }
            }
        }

        info!(
            "Boundary dedup: {} shared edges, {} lines extracted, {} segments removed, {} restored",
            stats.shared_edges, stats.lines_extracted, stats.segments_removed, stats.segments_restored
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon, coord};

    use crate::app::models::{
        AxisFlag, CategoryCode, CoveragePolygon, LineFeature, SheetKey, Vertex,
    };
    use crate::app::services::spatial::GeoSpatialOps;
    use crate::constants::EDGE_BUFFER_DISTANCE;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::new(vec![
                coord! { x: x0, y: y0 },
                coord! { x: x1, y: y0 },
                coord! { x: x1, y: y1 },
                coord! { x: x0, y: y1 },
                coord! { x: x0, y: y0 },
            ]),
            Vec::new(),
        )
    }

    fn two_adjacent_sheets() -> CoverageSet {
        let mut coverage = CoverageSet::new();
        coverage.push(CoveragePolygon {
            raw_id: "N-33-1".to_string(),
            key: SheetKey::from_raw("N-33-1"),
            polygon: rect(0.0, 0.0, 100.0, 100.0),
        });
        coverage.push(CoveragePolygon {
            raw_id: "N-33-2".to_string(),
            key: SheetKey::from_raw("N-33-2"),
            polygon: rect(100.0, 0.0, 200.0, 100.0),
        });
        coverage
    }

    fn line(sheet: &str, points: &[(f64, f64)]) -> LineFeature {
        LineFeature {
            vertices: points
                .iter()
                .map(|(x, y)| Vertex::new(*x, *y, 100.0))
                .collect(),
            category: CategoryCode::BreakLine,
            sheet: SheetKey::from_raw(sheet),
            axis_flag: AxisFlag::None,
        }
    }

    /// Both sheets exported their copy of the shared edge, plus one
    /// interior line each
    fn cumulative_lines() -> LineSet {
        let mut lines = LineSet::new();
        lines.push(line("N-33-1", &[(100.0, 10.0), (100.0, 90.0)]));
        lines.push(line("N-33-2", &[(100.0, 90.0), (100.0, 10.0)]));
        lines.push(line("N-33-1", &[(20.0, 20.0), (60.0, 70.0)]));
        lines.push(line("N-33-2", &[(130.0, 20.0), (170.0, 70.0)]));
        lines
    }

    #[test]
    fn test_shared_edge_copies_removed_interior_kept() {
        let ops = GeoSpatialOps::new();
        let dedup = BoundaryDeduplicator::new(&ops, EDGE_BUFFER_DISTANCE);

        let coverage = two_adjacent_sheets();
        let mut lines = cumulative_lines();

        let stats = dedup.dedup(&mut lines, &coverage).unwrap();

        assert_eq!(stats.shared_edges, 1);
        assert_eq!(stats.lines_extracted, 2);
        assert_eq!(stats.segments_removed, 2);
        assert_eq!(stats.segments_restored, 0);

        // The two interior lines survive, the duplicated edge is gone
        assert_eq!(lines.len(), 2);
        for feature in lines.iter() {
            assert!(feature.vertices.iter().all(|v| (v.x - 100.0).abs() > 5.0));
        }
    }

    #[test]
    fn test_transversal_crossing_survives_as_segments() {
        let ops = GeoSpatialOps::new();
        let dedup = BoundaryDeduplicator::new(&ops, EDGE_BUFFER_DISTANCE);

        let coverage = two_adjacent_sheets();
        let mut lines = LineSet::new();
        // A watercourse crossing the sheet boundary at a right angle
        lines.push(line("N-33-1", &[(50.0, 50.0), (100.0, 50.0)]));
        lines.push(line("N-33-2", &[(100.0, 50.0), (150.0, 50.0)]));

        let stats = dedup.dedup(&mut lines, &coverage).unwrap();

        assert_eq!(stats.lines_extracted, 2);
        assert_eq!(stats.segments_removed, 0);
        assert_eq!(stats.segments_restored, 2);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_interior_lines_untouched() {
        let ops = GeoSpatialOps::new();
        let dedup = BoundaryDeduplicator::new(&ops, EDGE_BUFFER_DISTANCE);

        let coverage = two_adjacent_sheets();
        let mut lines = LineSet::new();
        lines.push(line("N-33-1", &[(20.0, 20.0), (40.0, 40.0), (60.0, 20.0)]));

        let stats = dedup.dedup(&mut lines, &coverage).unwrap();

        assert_eq!(stats.lines_extracted, 0);
        assert_eq!(lines.len(), 1);
        // Not decomposed into segments either
        assert_eq!(lines.as_slice()[0].vertex_count(), 3);
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let ops = GeoSpatialOps::new();
        let dedup = BoundaryDeduplicator::new(&ops, EDGE_BUFFER_DISTANCE);

        let coverage = two_adjacent_sheets();
        let mut lines = cumulative_lines();
        // Add a crossing line so the second pass has corridor work to do
        lines.push(line("N-33-1", &[(50.0, 50.0), (150.0, 50.0)]));

        dedup.dedup(&mut lines, &coverage).unwrap();
        let after_first = lines.len();

        let stats = dedup.dedup(&mut lines, &coverage).unwrap();
        assert_eq!(stats.segments_removed, 0);
        assert_eq!(lines.len(), after_first);
    }

    #[test]
    fn test_single_sheet_is_a_noop() {
        let ops = GeoSpatialOps::new();
        let dedup = BoundaryDeduplicator::new(&ops, EDGE_BUFFER_DISTANCE);

        let mut coverage = CoverageSet::new();
        coverage.push(CoveragePolygon {
            raw_id: "N-33-1".to_string(),
            key: SheetKey::from_raw("N-33-1"),
            polygon: rect(0.0, 0.0, 100.0, 100.0),
        });

        let mut lines = LineSet::new();
        lines.push(line("N-33-1", &[(100.0, 10.0), (100.0, 90.0)]));

        let stats = dedup.dedup(&mut lines, &coverage).unwrap();
        assert_eq!(stats.shared_edges, 0);
        assert_eq!(lines.len(), 1);
    }
}
