//! Spatial operations collaborator
//!
//! The pipeline requests all low-level geometric work through the
//! [`SpatialOps`] trait: clipping line runs to sheet coverage, deriving the
//! shared edges between neighboring coverage polygons, corridor buffering,
//! segment splitting, dissolving and reprojection. Callers treat every
//! operation as atomic and side-effect-free on its inputs; a failure is
//! fatal for the run.
//!
//! Coordinate transformation mathematics stays out of scope: it is
//! delegated further behind the [`CrsTransform`] seam, which callers
//! inject when a non-native output reference is requested.

pub mod geo_ops;

pub use geo_ops::GeoSpatialOps;

use geo::{MultiLineString, MultiPolygon, Polygon};

use crate::Result;
use crate::app::models::{CoveragePolygon, LineFeature, Vertex};

/// Coordinate transformation into a target reference
///
/// Implementations encapsulate the projection mathematics for one target
/// code; the processor itself never computes transformations.
pub trait CrsTransform: Send + Sync {
    /// Transform one coordinate triple into the target reference
    fn transform(&self, x: f64, y: f64, z: f64) -> Result<(f64, f64, f64)>;
}

/// Blocking request-response contract for geometric operations
pub trait SpatialOps: Send + Sync {
    /// Clip a line feature against a boundary polygon
    ///
    /// Returns the pieces inside the boundary; a feature entirely within
    /// the boundary is returned unchanged (bit-identical, elevations
    /// untouched).
    fn clip(&self, feature: &LineFeature, boundary: &Polygon<f64>) -> Result<Vec<LineFeature>>;

    /// Shared edges between distinct polygons of the coverage set
    ///
    /// The self-intersection of the coverage polygons as a line layer:
    /// exactly the edges where neighboring sheets touch.
    fn self_intersect(&self, coverage: &[CoveragePolygon]) -> Result<MultiLineString<f64>>;

    /// Buffer a line layer outward into a corridor polygon
    fn buffer(&self, lines: &MultiLineString<f64>, distance: f64) -> Result<MultiPolygon<f64>>;

    /// Decompose a polyline into its 2-vertex segments
    fn split(&self, feature: &LineFeature) -> Vec<LineFeature>;

    /// Dissolve a polygon collection into one multi-polygon
    fn dissolve(&self, polygons: &[Polygon<f64>]) -> Result<MultiPolygon<f64>>;

    /// Reproject vertices into the target reference
    fn project(&self, vertices: &[Vertex], target_crs: u32) -> Result<Vec<Vertex>>;

    /// Reproject a planar polygon into the target reference
    fn project_polygon(&self, polygon: &Polygon<f64>, target_crs: u32) -> Result<Polygon<f64>>;
}
