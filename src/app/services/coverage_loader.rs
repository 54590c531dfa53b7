//! Coverage index and region-of-interest loading
//!
//! Reads the index-area dataset (one polygon per survey sheet, carrying the
//! raw sheet identifier) and the region-of-interest boundary from GeoJSON,
//! and indexes coverage polygons by their normalized sheet key for the
//! exactly-one lookup the ingestion pipeline relies on.

use geo::{Coord, LineString, Polygon, coord};
use geojson::{Feature, GeoJson, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::app::models::{CoveragePolygon, SheetKey};
use crate::{Error, Result};

/// Coverage polygons indexed by normalized sheet key
#[derive(Debug, Default)]
pub struct CoverageIndex {
    by_key: HashMap<SheetKey, Vec<CoveragePolygon>>,
    total: usize,
}

impl CoverageIndex {
    /// Look up the single coverage polygon of a sheet key
    ///
    /// Zero or multiple matches are an error; the caller treats it as fatal
    /// for that sheet's merge step.
    pub fn lookup(&self, key: &SheetKey) -> Result<&CoveragePolygon> {
        match self.by_key.get(key).map(Vec::as_slice) {
            Some([single]) => Ok(single),
            Some(multiple) => Err(Error::coverage_lookup(key.as_str(), multiple.len())),
            None => Err(Error::coverage_lookup(key.as_str(), 0)),
        }
    }

    /// Number of indexed polygons
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Load and index the coverage/index dataset
///
/// `sheet_id_property` names the feature property holding the raw sheet
/// identifier; the normalized key is derived here, which also creates the
/// unified-key attribute for datasets that lack it.
pub fn load_coverage_index(path: &Path, sheet_id_property: &str) -> Result<CoverageIndex> {
    let features = read_feature_collection(path)?;
    let mut index = CoverageIndex::default();

    for (position, feature) in features.iter().enumerate() {
        let raw_id = match read_string_property(feature, sheet_id_property) {
            Some(raw_id) => raw_id,
            None => {
                return Err(Error::geojson(
                    path.display().to_string(),
                    format!(
                        "Feature {} has no '{}' property",
                        position, sheet_id_property
                    ),
                ));
            }
        };

        let polygon = match feature_polygon(feature) {
            Some(polygon) => polygon,
            None => {
                return Err(Error::geojson(
                    path.display().to_string(),
                    format!("Feature {} ('{}') is not polygonal", position, raw_id),
                ));
            }
        };

        let key = SheetKey::from_raw(&raw_id);
        index.total += 1;
        index.by_key.entry(key.clone()).or_default().push(CoveragePolygon {
            raw_id,
            key,
            polygon,
        });
    }

    info!(
        "Loaded {} coverage polygons ({} distinct sheet keys) from {}",
        index.total,
        index.by_key.len(),
        path.display()
    );

    Ok(index)
}

/// Load the region-of-interest boundary polygon
///
/// The first polygonal feature is used; additional features are ignored
/// with a warning.
pub fn load_region_of_interest(path: &Path) -> Result<Polygon<f64>> {
    let features = read_feature_collection(path)?;

    let mut polygons = features.iter().filter_map(feature_polygon);
    let first = polygons.next().ok_or_else(|| {
        Error::geojson(
            path.display().to_string(),
            "No polygonal feature found for the region of interest",
        )
    })?;

    let ignored = polygons.count();
    if ignored > 0 {
        warn!(
            "{} - region of interest has {} extra polygonal features, using the first",
            path.display(),
            ignored
        );
    }

    Ok(first)
}

/// Read a GeoJSON file into its feature list
///
/// A bare Feature or Geometry document is wrapped into a single-element
/// list so all inputs are handled alike.
fn read_feature_collection(path: &Path) -> Result<Vec<Feature>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;

    let geojson: GeoJson = raw
        .parse()
        .map_err(|e| Error::geojson(path.display().to_string(), format!("{}", e)))?;

    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(feature) => Ok(vec![feature]),
        GeoJson::Geometry(geometry) => Ok(vec![Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        }]),
    }
}

fn read_string_property(feature: &Feature, name: &str) -> Option<String> {
    let value = feature.properties.as_ref()?.get(name)?;
    match value {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Extract a single polygon from a feature's geometry
///
/// Accepts Polygon geometry, or MultiPolygon with exactly one member.
fn feature_polygon(feature: &Feature) -> Option<Polygon<f64>> {
    match &feature.geometry.as_ref()?.value {
        Value::Polygon(rings) => Some(rings_to_polygon(rings)),
        Value::MultiPolygon(polygons) if polygons.len() == 1 => {
            Some(rings_to_polygon(&polygons[0]))
        }
        _ => None,
    }
}

fn rings_to_polygon(rings: &[Vec<Vec<f64>>]) -> Polygon<f64> {
    let mut converted = rings.iter().map(|ring| {
        LineString::new(
            ring.iter()
                .map(|position| position_to_coord(position))
                .collect(),
        )
    });

    let exterior = converted.next().unwrap_or_else(|| LineString::new(vec![]));
    Polygon::new(exterior, converted.collect())
}

fn position_to_coord(position: &[f64]) -> Coord<f64> {
    // Elevation on ring positions is not carried; coverage is planar
    coord! {
        x: position.first().copied().unwrap_or(0.0),
        y: position.get(1).copied().unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_coverage(dir: &TempDir, name: &str, features: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(
            &path,
            format!(r#"{{"type":"FeatureCollection","features":[{}]}}"#, features),
        )
        .unwrap();
        path
    }

    fn polygon_feature(id: &str, x0: f64) -> String {
        format!(
            r#"{{"type":"Feature","properties":{{"GODLO":"{}"}},"geometry":{{"type":"Polygon","coordinates":[[[{x0},0.0],[{x1},0.0],[{x1},10.0],[{x0},10.0],[{x0},0.0]]]}}}}"#,
            id,
            x0 = x0,
            x1 = x0 + 10.0,
        )
    }

    #[test]
    fn test_load_and_lookup_by_normalized_key() {
        let dir = TempDir::new().unwrap();
        let path = write_coverage(
            &dir,
            "index.geojson",
            &[polygon_feature("N-33-1", 0.0), polygon_feature("N-33-2", 10.0)].join(","),
        );

        let index = load_coverage_index(&path, "GODLO").unwrap();
        assert_eq!(index.len(), 2);

        let coverage = index.lookup(&SheetKey::from_raw("N-33-1")).unwrap();
        assert_eq!(coverage.raw_id, "N-33-1");
        assert_eq!(coverage.key.as_str(), "n331");
    }

    #[test]
    fn test_lookup_miss() {
        let dir = TempDir::new().unwrap();
        let path = write_coverage(&dir, "index.geojson", &polygon_feature("N-33-1", 0.0));

        let index = load_coverage_index(&path, "GODLO").unwrap();
        let result = index.lookup(&SheetKey::from_raw("N-99-9"));
        assert!(matches!(
            result,
            Err(Error::CoverageLookup { matches: 0, .. })
        ));
    }

    #[test]
    fn test_lookup_ambiguous() {
        let dir = TempDir::new().unwrap();
        // Same identifier twice: two polygons behind one key
        let path = write_coverage(
            &dir,
            "index.geojson",
            &[polygon_feature("N-33-1", 0.0), polygon_feature("n-33-1", 10.0)].join(","),
        );

        let index = load_coverage_index(&path, "GODLO").unwrap();
        let result = index.lookup(&SheetKey::from_raw("N-33-1"));
        assert!(matches!(
            result,
            Err(Error::CoverageLookup { matches: 2, .. })
        ));
    }

    #[test]
    fn test_missing_identifier_property_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_coverage(
            &dir,
            "index.geojson",
            r#"{"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}}"#,
        );

        let result = load_coverage_index(&path, "GODLO");
        assert!(matches!(result, Err(Error::GeoJson { .. })));
    }

    #[test]
    fn test_region_of_interest_from_bare_geometry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roi.geojson");
        fs::write(
            &path,
            r#"{"type":"Polygon","coordinates":[[[0,0],[5,0],[5,5],[0,5],[0,0]]]}"#,
        )
        .unwrap();

        let polygon = load_region_of_interest(&path).unwrap();
        assert_eq!(polygon.exterior().0.len(), 5);
    }
}
