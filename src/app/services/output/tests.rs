//! Tests for the output projector and GeoJSON writer

use geo::{LineString, Polygon, coord};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use crate::app::models::{
    AxisFlag, CategoryCode, CoveragePolygon, CoverageSet, LineFeature, LineSet, PointFeature,
    PointSet, SheetKey, Vertex,
};
use crate::app::services::output::{GeoJsonWriter, OutputBundle, OutputProjector};
use crate::app::services::spatial::{CrsTransform, GeoSpatialOps};
use crate::config::Config;
use crate::{Error, Result};

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

fn point(x: f64, y: f64, category: CategoryCode) -> PointFeature {
    PointFeature {
        location: Vertex::new(x, y, 50.0),
        category,
        sheet: SheetKey::from_raw("N-33-1"),
    }
}

fn line(points: &[(f64, f64)], category: CategoryCode) -> LineFeature {
    LineFeature {
        vertices: points.iter().map(|(x, y)| Vertex::new(*x, *y, 10.0)).collect(),
        category,
        sheet: SheetKey::from_raw("N-33-1"),
        axis_flag: AxisFlag::None,
    }
}

fn coverage_set() -> CoverageSet {
    let mut set = CoverageSet::new();
    set.push(CoveragePolygon {
        raw_id: "N-33-1".to_string(),
        key: SheetKey::from_raw("N-33-1"),
        polygon: rect(0.0, 0.0, 100.0, 100.0),
    });
    set
}

/// Transform stub that counts invocations
struct RecordingTransform {
    calls: AtomicUsize,
}

impl RecordingTransform {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl CrsTransform for RecordingTransform {
    fn transform(&self, x: f64, y: f64, z: f64) -> Result<(f64, f64, f64)> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((x / 1000.0, y / 1000.0, z))
    }
}

#[test]
fn test_region_of_interest_selection() {
    let ops = GeoSpatialOps::new();
    let config = Config::default();
    let projector = OutputProjector::new(&ops, &config);

    let mut points = PointSet::new();
    points.append(vec![
        point(10.0, 10.0, CategoryCode::GridPoint),
        point(90.0, 90.0, CategoryCode::GridPoint),
    ]);

    let mut lines = LineSet::new();
    lines.push(line(&[(10.0, 10.0), (20.0, 20.0)], CategoryCode::BreakLine));
    lines.push(line(&[(80.0, 80.0), (95.0, 95.0)], CategoryCode::BreakLine));

    // Region covering only the lower-left corner
    let roi = rect(0.0, 0.0, 30.0, 30.0);
    let bundle = projector
        .project(points, lines, coverage_set(), None, None, &roi)
        .unwrap();

    assert_eq!(bundle.points.len(), 1);
    assert_eq!(bundle.lines.len(), 1);
    // Envelopes are emitted unclipped
    assert_eq!(bundle.envelopes.len(), 1);
}

#[test]
fn test_structures_split_out_of_lines() {
    let ops = GeoSpatialOps::new();
    let config = Config::default();
    let projector = OutputProjector::new(&ops, &config);

    let mut lines = LineSet::new();
    lines.push(line(&[(10.0, 10.0), (20.0, 20.0)], CategoryCode::BreakLine));
    lines.push(line(&[(30.0, 30.0), (40.0, 40.0)], CategoryCode::Structure));

    let roi = rect(0.0, 0.0, 100.0, 100.0);
    let bundle = projector
        .project(PointSet::new(), lines, coverage_set(), None, None, &roi)
        .unwrap();

    assert_eq!(bundle.lines.len(), 1);
    assert_eq!(bundle.lines[0].category, CategoryCode::BreakLine);
    assert_eq!(bundle.structures.len(), 1);
    assert_eq!(bundle.structures[0].category, CategoryCode::Structure);
}

#[test]
fn test_native_reference_skips_reprojection() {
    let transform = Arc::new(RecordingTransform::new());
    let ops = GeoSpatialOps::new().with_transform(transform.clone());
    // 102173 is the second declared-equivalent native code
    let config = Config::default().with_output_crs(102173);
    let projector = OutputProjector::new(&ops, &config);

    let mut points = PointSet::new();
    points.append(vec![point(10.0, 10.0, CategoryCode::GridPoint)]);

    let roi = rect(0.0, 0.0, 100.0, 100.0);
    let bundle = projector
        .project(points, LineSet::new(), coverage_set(), None, None, &roi)
        .unwrap();

    // Bit-identical copy, the transform was never consulted
    assert_eq!(transform.calls.load(Ordering::SeqCst), 0);
    assert_eq!(bundle.points[0].location, Vertex::new(10.0, 10.0, 50.0));
}

#[test]
fn test_non_native_reference_invokes_transform() {
    let transform = Arc::new(RecordingTransform::new());
    let ops = GeoSpatialOps::new().with_transform(transform.clone());
    let config = Config::default().with_output_crs(4326);
    let projector = OutputProjector::new(&ops, &config);

    let mut points = PointSet::new();
    points.append(vec![point(10.0, 10.0, CategoryCode::GridPoint)]);
    let mut lines = LineSet::new();
    lines.push(line(&[(10.0, 10.0), (20.0, 20.0)], CategoryCode::BreakLine));

    let roi = rect(0.0, 0.0, 100.0, 100.0);
    let bundle = projector
        .project(points, lines, coverage_set(), None, None, &roi)
        .unwrap();

    assert!(transform.calls.load(Ordering::SeqCst) > 0);
    assert_eq!(bundle.points[0].location.x, 0.01);
    // Elevations survive reprojection untouched
    assert_eq!(bundle.points[0].location.z, 50.0);
}

#[test]
fn test_non_native_reference_without_transform_is_fatal() {
    let ops = GeoSpatialOps::new();
    let config = Config::default().with_output_crs(4326);
    let projector = OutputProjector::new(&ops, &config);

    let mut points = PointSet::new();
    points.append(vec![point(10.0, 10.0, CategoryCode::GridPoint)]);

    let roi = rect(0.0, 0.0, 100.0, 100.0);
    let result = projector.project(points, LineSet::new(), coverage_set(), None, None, &roi);
    assert!(matches!(result, Err(Error::SpatialOps { .. })));
}

#[test]
fn test_writer_emits_named_datasets() {
    let dir = TempDir::new().unwrap();
    let writer = GeoJsonWriter::new(dir.path(), "survey", false).unwrap();

    let bundle = OutputBundle {
        points: vec![point(10.0, 10.0, CategoryCode::SpotHeight)],
        lines: vec![line(&[(10.0, 10.0), (20.0, 20.0)], CategoryCode::BreakLine)],
        structures: vec![],
        envelopes: coverage_set().into_vec(),
        raw_points: None,
        raw_lines: None,
    };

    let stats = writer.write_bundle(&bundle).unwrap();
    assert_eq!(stats.datasets.len(), 4);
    assert_eq!(stats.total_features(), 3);

    for name in ["points", "lines", "envelopes", "structures"] {
        assert!(dir.path().join(format!("survey_{}.geojson", name)).exists());
    }
    assert!(!dir.path().join("survey_raw_points.geojson").exists());
}

#[test]
fn test_writer_round_trips_attributes_and_elevation() {
    let dir = TempDir::new().unwrap();
    let writer = GeoJsonWriter::new(dir.path(), "survey", false).unwrap();

    let bundle = OutputBundle {
        points: vec![point(10.0, 20.0, CategoryCode::SpotHeight)],
        envelopes: coverage_set().into_vec(),
        ..OutputBundle::default()
    };
    writer.write_bundle(&bundle).unwrap();

    let raw = fs::read_to_string(dir.path().join("survey_points.geojson")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let feature = &parsed["features"][0];
    assert_eq!(feature["properties"]["category"], "k");
    assert_eq!(feature["properties"]["sheet"], "n331");
    assert_eq!(feature["geometry"]["coordinates"][2], 50.0);

    let raw = fs::read_to_string(dir.path().join("survey_envelopes.geojson")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let envelope = &parsed["features"][0];
    assert_eq!(envelope["properties"]["GODLO"], "N-33-1");
    assert_eq!(envelope["properties"]["GODLO_UNIFIED"], "n331");
}

#[test]
fn test_writer_refuses_overwrite_without_force() {
    let dir = TempDir::new().unwrap();

    let bundle = OutputBundle {
        envelopes: coverage_set().into_vec(),
        ..OutputBundle::default()
    };

    let writer = GeoJsonWriter::new(dir.path(), "survey", false).unwrap();
    writer.write_bundle(&bundle).unwrap();

    let again = GeoJsonWriter::new(dir.path(), "survey", false).unwrap();
    assert!(matches!(
        again.write_bundle(&bundle),
        Err(Error::Configuration { .. })
    ));

    let forced = GeoJsonWriter::new(dir.path(), "survey", true).unwrap();
    assert!(forced.write_bundle(&bundle).is_ok());
}

#[test]
fn test_raw_snapshots_written_when_present() {
    let dir = TempDir::new().unwrap();
    let writer = GeoJsonWriter::new(dir.path(), "survey", false).unwrap();

    let bundle = OutputBundle {
        raw_points: Some(vec![point(10.0, 10.0, CategoryCode::GridPoint)]),
        raw_lines: Some(vec![line(&[(0.0, 0.0), (1.0, 1.0)], CategoryCode::BreakLine)]),
        ..OutputBundle::default()
    };

    let stats = writer.write_bundle(&bundle).unwrap();
    assert_eq!(stats.datasets.len(), 6);
    assert!(dir.path().join("survey_raw_points.geojson").exists());
    assert!(dir.path().join("survey_raw_lines.geojson").exists());
}
