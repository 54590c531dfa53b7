//! Integration tests for the ASCII survey parser
//!
//! Exercises file-level parsing through the public API: vertex run
//! recovery, elevation preservation and tolerance to malformed input.

use std::fs;
use tempfile::TempDir;

use nmt_processor::app::models::{CategoryCode, ExtentTracker, SheetKey};
use nmt_processor::app::services::asc_parser::AscParser;
use nmt_processor::constants::DEGENERATE_EPSILON;

fn sheet() -> SheetKey {
    SheetKey::from_raw("N-33-132-A-c-2-2")
}

#[test]
fn test_vertex_runs_preserved_in_order_with_elevation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("N-33-132-A-c-2-2_s.asc");

    // Two runs, written in on-disk (secondary, primary, elevation) order
    let mut content = String::from("Start\n");
    for i in 0..5 {
        content.push_str(&format!("{} {} {}\n", i as f64, 100.0 + i as f64, 200.0 + i as f64));
    }
    content.push_str("End\nStart\n10.0 20.0 30.0\n11.0 21.0 31.0\nEnd\n");
    fs::write(&path, content).unwrap();

    let parser = AscParser::new(DEGENERATE_EPSILON);
    let mut extent = ExtentTracker::new();
    let outcome = parser
        .parse_line_file(&path, CategoryCode::BreakLine, &sheet(), &mut extent)
        .unwrap();

    assert_eq!(outcome.features.len(), 2);

    let first = &outcome.features[0];
    assert_eq!(first.vertex_count(), 5);
    for (i, vertex) in first.vertices.iter().enumerate() {
        assert_eq!(vertex.x, 100.0 + i as f64);
        assert_eq!(vertex.y, i as f64);
        assert_eq!(vertex.z, 200.0 + i as f64);
    }

    assert_eq!(outcome.features[1].vertex_count(), 2);
    assert!(outcome.stats.malformed.is_empty());
}

#[test]
fn test_malformed_records_reported_with_position() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("N-33-132-A-c-2-2_p.asc");
    fs::write(
        &path,
        "1.0 2.0 3.0\nnot-a-number 2.0 3.0\n\n4.0 5.0 6.0\n7.0 8.0\n",
    )
    .unwrap();

    let parser = AscParser::new(DEGENERATE_EPSILON);
    let mut extent = ExtentTracker::new();
    let outcome = parser
        .parse_point_file(&path, CategoryCode::GridPoint, &sheet(), &mut extent)
        .unwrap();

    assert_eq!(outcome.features.len(), 2);
    assert_eq!(outcome.stats.malformed.len(), 2);
    assert_eq!(outcome.stats.malformed[0].line_number, 2);
    assert!(outcome.stats.malformed[0].raw.contains("not-a-number"));
    assert_eq!(outcome.stats.malformed[1].line_number, 5);
}

#[test]
fn test_exclusively_malformed_file_produces_empty_extent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("N-33-132-A-c-2-2_k.asc");
    fs::write(&path, "header line\nanother bad line\n12 only-two\n").unwrap();

    let parser = AscParser::new(DEGENERATE_EPSILON);
    let mut extent = ExtentTracker::new();
    let outcome = parser
        .parse_point_file(&path, CategoryCode::SpotHeight, &sheet(), &mut extent)
        .unwrap();

    assert!(outcome.features.is_empty());
    assert!(extent.is_empty());
    assert_eq!(outcome.stats.malformed.len(), 3);
}
