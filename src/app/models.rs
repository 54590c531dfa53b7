//! Core data structures for sheet-partitioned survey processing.
//!
//! Defines the geometry feature types, category codes, sheet key
//! normalization and the cumulative containers handed between pipeline
//! stages.

use geo::{Coord, LineString, Point, Polygon, coord};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod extent;

pub use extent::ExtentTracker;

use crate::constants::{SHEET_KEY_PREFIX, SHEET_KEY_SEPARATOR};

/// Thematic category of a geometry within a sheet export
///
/// Point and line categories are disjoint sets fixed by the source format;
/// the letter codes are the on-disk identifiers used in file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryCode {
    /// `p` - regular grid points
    GridPoint,
    /// `t` - terrain points
    TerrainPoint,
    /// `pz` - grid points inside masked areas
    MaskedGridPoint,
    /// `k` - spot heights
    SpotHeight,
    /// `w` - form lines
    FormLine,
    /// `s` - break lines
    BreakLine,
    /// `c` - watercourses
    Watercourse,
    /// `sz` - break lines inside masked areas
    MaskedBreakLine,
    /// `j` - planar areas, imported as boundary polylines
    PlanarArea,
    /// `z` - reduced-accuracy mask areas, imported as boundary polylines
    MaskArea,
    /// `o` - engineering structures (bridges, viaducts)
    Structure,
}

impl CategoryCode {
    /// Resolve a file-name letter code to a category
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "p" => Some(Self::GridPoint),
            "t" => Some(Self::TerrainPoint),
            "pz" => Some(Self::MaskedGridPoint),
            "k" => Some(Self::SpotHeight),
            "w" => Some(Self::FormLine),
            "s" => Some(Self::BreakLine),
            "c" => Some(Self::Watercourse),
            "sz" => Some(Self::MaskedBreakLine),
            "j" => Some(Self::PlanarArea),
            "z" => Some(Self::MaskArea),
            "o" => Some(Self::Structure),
            _ => None,
        }
    }

    /// The on-disk letter code of this category
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::GridPoint => "p",
            Self::TerrainPoint => "t",
            Self::MaskedGridPoint => "pz",
            Self::SpotHeight => "k",
            Self::FormLine => "w",
            Self::BreakLine => "s",
            Self::Watercourse => "c",
            Self::MaskedBreakLine => "sz",
            Self::PlanarArea => "j",
            Self::MaskArea => "z",
            Self::Structure => "o",
        }
    }

    /// True for point categories
    pub fn is_point(&self) -> bool {
        matches!(
            self,
            Self::GridPoint | Self::TerrainPoint | Self::MaskedGridPoint | Self::SpotHeight
        )
    }

    /// True for line categories
    pub fn is_line(&self) -> bool {
        !self.is_point()
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Canonical lookup key of a survey sheet
///
/// Derived deterministically from a raw sheet identifier; joins parsed
/// geometry with the sheet's coverage polygon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetKey(String);

impl SheetKey {
    /// Normalize a raw sheet identifier into its canonical key
    ///
    /// Removes separator characters, lowercases, and strips a leading
    /// source prefix token: `"N-33-132-A-c-2-2"` becomes `"n33132ac22"`,
    /// `"NMT-N-33-132-A-c-2-2"` the same. Always yields a single string,
    /// in both branches.
    pub fn from_raw(raw: &str) -> Self {
        let unified: String = raw
            .trim()
            .chars()
            .filter(|c| *c != SHEET_KEY_SEPARATOR)
            .collect::<String>()
            .to_lowercase();

        match unified.strip_prefix(SHEET_KEY_PREFIX) {
            Some(rest) => Self(rest.to_string()),
            None => Self(unified),
        }
    }

    /// The canonical key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SheetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single surveyed position in the sheet's native reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vertex {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar coordinate of this vertex
    pub fn coord(&self) -> Coord<f64> {
        coord! { x: self.x, y: self.y }
    }
}

/// Degenerate-extent classification of a line feature
///
/// Lines whose extent collapses to near-zero width or height are typically
/// sheet-edge tracing artifacts rather than real terrain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisFlag {
    None,
    AllHorizontal,
    AllVertical,
}

impl AxisFlag {
    /// Stable text form used on output datasets
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::AllHorizontal => "all_horizontal",
            Self::AllVertical => "all_vertical",
        }
    }

    /// True for axis-aligned degenerate lines
    pub fn is_degenerate(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A parsed survey point tagged with its sheet and category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointFeature {
    pub location: Vertex,
    pub category: CategoryCode,
    pub sheet: SheetKey,
}

impl PointFeature {
    /// Planar geometry of this feature
    pub fn point(&self) -> Point<f64> {
        Point::from(self.location.coord())
    }
}

/// A parsed survey polyline tagged with its sheet and category
///
/// Always carries at least two vertices; `axis_flag` is derived from the
/// run's extent once at flush time and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineFeature {
    pub vertices: Vec<Vertex>,
    pub category: CategoryCode,
    pub sheet: SheetKey,
    pub axis_flag: AxisFlag,
}

impl LineFeature {
    /// Planar geometry of this feature
    pub fn line_string(&self) -> LineString<f64> {
        LineString::new(self.vertices.iter().map(|v| v.coord()).collect())
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Authoritative boundary polygon of one survey sheet
#[derive(Debug, Clone, PartialEq)]
pub struct CoveragePolygon {
    /// Raw identifier as present in the index dataset
    pub raw_id: String,
    /// Normalized join key
    pub key: SheetKey,
    /// Boundary geometry in the native reference
    pub polygon: Polygon<f64>,
}

/// Growable, append-only container of point features
///
/// Owned by the ingestion pipeline and moved by value into downstream
/// stages; never shared mutably.
#[derive(Debug, Default, Clone)]
pub struct PointSet {
    features: Vec<PointFeature>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of features
    pub fn append(&mut self, mut features: Vec<PointFeature>) {
        self.features.append(&mut features);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PointFeature> {
        self.features.iter()
    }

    pub fn as_slice(&self) -> &[PointFeature] {
        &self.features
    }

    pub fn into_vec(self) -> Vec<PointFeature> {
        self.features
    }
}

/// Growable, append-only container of line features
#[derive(Debug, Default, Clone)]
pub struct LineSet {
    features: Vec<LineFeature>,
}

impl LineSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of features
    pub fn append(&mut self, mut features: Vec<LineFeature>) {
        self.features.append(&mut features);
    }

    /// Append a single feature
    pub fn push(&mut self, feature: LineFeature) {
        self.features.push(feature);
    }

    /// Remove and return every feature matching the predicate
    pub fn extract_where<F>(&mut self, mut predicate: F) -> Vec<LineFeature>
    where
        F: FnMut(&LineFeature) -> bool,
    {
        let mut extracted = Vec::new();
        let mut kept = Vec::with_capacity(self.features.len());
        for feature in self.features.drain(..) {
            if predicate(&feature) {
                extracted.push(feature);
            } else {
                kept.push(feature);
            }
        }
        self.features = kept;
        extracted
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineFeature> {
        self.features.iter()
    }

    pub fn as_slice(&self) -> &[LineFeature] {
        &self.features
    }

    pub fn into_vec(self) -> Vec<LineFeature> {
        self.features
    }
}

/// Growable, append-only container of coverage polygons
#[derive(Debug, Default, Clone)]
pub struct CoverageSet {
    polygons: Vec<CoveragePolygon>,
}

impl CoverageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sheet's coverage polygon
    pub fn push(&mut self, polygon: CoveragePolygon) {
        self.polygons.push(polygon);
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CoveragePolygon> {
        self.polygons.iter()
    }

    pub fn as_slice(&self) -> &[CoveragePolygon] {
        &self.polygons
    }

    pub fn into_vec(self) -> Vec<CoveragePolygon> {
        self.polygons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_code_round_trip() {
        for code in ["p", "t", "pz", "k", "w", "s", "c", "sz", "j", "z", "o"] {
            let category = CategoryCode::from_code(code).unwrap();
            assert_eq!(category.as_code(), code);
        }
        assert!(CategoryCode::from_code("q").is_none());
        assert!(CategoryCode::from_code("").is_none());
    }

    #[test]
    fn test_category_point_line_split() {
        assert!(CategoryCode::GridPoint.is_point());
        assert!(CategoryCode::SpotHeight.is_point());
        assert!(CategoryCode::BreakLine.is_line());
        assert!(CategoryCode::Structure.is_line());
    }

    #[test]
    fn test_sheet_key_normalization() {
        assert_eq!(SheetKey::from_raw("N-33-132-A-c-2-2").as_str(), "n33132ac22");
        assert_eq!(SheetKey::from_raw("n33132ac22").as_str(), "n33132ac22");
    }

    #[test]
    fn test_sheet_key_prefix_stripping_returns_string() {
        // The reference field-calculation snippet returned a split list when
        // the prefix fired; the resolver contract is "always a string".
        let key = SheetKey::from_raw("NMT-N-33-132-A-c-2-2");
        assert_eq!(key.as_str(), "n33132ac22");

        let key = SheetKey::from_raw("nmt-m-34-1-B-d-1-4");
        assert_eq!(key.as_str(), "m341bd14");
    }

    #[test]
    fn test_sheet_key_without_prefix_unchanged() {
        assert_eq!(SheetKey::from_raw("M-34-5-D").as_str(), "m345d");
    }

    #[test]
    fn test_line_feature_geometry() {
        let feature = LineFeature {
            vertices: vec![
                Vertex::new(0.0, 0.0, 10.0),
                Vertex::new(1.0, 1.0, 11.0),
                Vertex::new(2.0, 0.0, 12.0),
            ],
            category: CategoryCode::BreakLine,
            sheet: SheetKey::from_raw("N-33-1"),
            axis_flag: AxisFlag::None,
        };

        let ls = feature.line_string();
        assert_eq!(ls.0.len(), 3);
        assert_eq!(ls.0[1], coord! { x: 1.0, y: 1.0 });
    }

    #[test]
    fn test_line_set_extract_where() {
        let sheet = SheetKey::from_raw("N-33-1");
        let mut set = LineSet::new();
        for category in [CategoryCode::BreakLine, CategoryCode::Structure] {
            set.push(LineFeature {
                vertices: vec![Vertex::new(0.0, 0.0, 0.0), Vertex::new(1.0, 0.0, 0.0)],
                category,
                sheet: sheet.clone(),
                axis_flag: AxisFlag::None,
            });
        }

        let extracted = set.extract_where(|f| f.category == CategoryCode::Structure);
        assert_eq!(extracted.len(), 1);
        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice()[0].category, CategoryCode::BreakLine);
    }
}
