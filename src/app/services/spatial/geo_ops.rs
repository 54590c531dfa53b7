//! Geometry-backed implementation of the spatial operations contract
//!
//! Implements the [`SpatialOps`] collaborator on top of the `geo` crate:
//! boolean clipping for line runs, exact collinear-overlap detection for
//! the coverage self-intersection, rectangle-union corridor buffering and
//! union-fold dissolve. Elevations are carried outside the planar
//! geometry and restored by interpolation along the source polyline
//! whenever clipping introduces new coordinates.

use geo::{
    BooleanOps, Coord, Intersects, Line, LineString, MultiLineString, MultiPolygon, Polygon,
    Relate, coord,
};
use std::sync::Arc;

use crate::app::models::{CoveragePolygon, LineFeature, Vertex};
use crate::constants::DEGENERATE_EPSILON;
use crate::{Error, Result};

use super::{CrsTransform, SpatialOps};

/// Spatial operations backed by the `geo` crate
pub struct GeoSpatialOps {
    transform: Option<Arc<dyn CrsTransform>>,
    tolerance: f64,
}

impl Default for GeoSpatialOps {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoSpatialOps {
    pub fn new() -> Self {
        Self {
            transform: None,
            tolerance: DEGENERATE_EPSILON,
        }
    }

    /// Attach a coordinate transformation for non-native output references
    pub fn with_transform(mut self, transform: Arc<dyn CrsTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    fn transformer(&self, target_crs: u32) -> Result<&Arc<dyn CrsTransform>> {
        self.transform.as_ref().ok_or_else(|| {
            Error::spatial_ops(format!(
                "No coordinate transform configured for target reference {}",
                target_crs
            ))
        })
    }
}

impl SpatialOps for GeoSpatialOps {
    fn clip(&self, feature: &LineFeature, boundary: &Polygon<f64>) -> Result<Vec<LineFeature>> {
        let line = feature.line_string();

        // Fast path: geometry entirely inside stays bit-identical
        if line.relate(boundary).is_within() {
            return Ok(vec![feature.clone()]);
        }
        if !line.intersects(boundary) {
            return Ok(Vec::new());
        }

        let clipped = boundary.clip(&MultiLineString::new(vec![line]), false);

        let mut pieces = Vec::new();
        for part in clipped.0 {
            if part.0.len() < 2 {
                continue;
            }
            let vertices = part
                .0
                .iter()
                .map(|c| Vertex::new(c.x, c.y, elevation_at(&feature.vertices, *c)))
                .collect();
            pieces.push(LineFeature {
                vertices,
                category: feature.category,
                sheet: feature.sheet.clone(),
                axis_flag: feature.axis_flag,
            });
        }
        Ok(pieces)
    }

    fn self_intersect(&self, coverage: &[CoveragePolygon]) -> Result<MultiLineString<f64>> {
        let mut edges = Vec::new();

        for (i, first) in coverage.iter().enumerate() {
            for second in &coverage[i + 1..] {
                if !first.polygon.intersects(&second.polygon) {
                    continue;
                }
                for segment_a in rings(&first.polygon).flat_map(|ring| ring.lines()) {
                    for segment_b in rings(&second.polygon).flat_map(|ring| ring.lines()) {
                        if let Some(shared) =
                            collinear_overlap(segment_a, segment_b, self.tolerance)
                        {
                            edges.push(LineString::new(vec![shared.start, shared.end]));
                        }
                    }
                }
            }
        }

        Ok(MultiLineString::new(edges))
    }

    fn buffer(&self, lines: &MultiLineString<f64>, distance: f64) -> Result<MultiPolygon<f64>> {
        if distance <= 0.0 {
            return Err(Error::spatial_ops(format!(
                "Buffer distance must be positive, got {}",
                distance
            )));
        }

        let quads: Vec<Polygon<f64>> = lines
            .0
            .iter()
            .flat_map(|line| line.lines())
            .map(|segment| segment_envelope(&segment, distance))
            .collect();

        self.dissolve(&quads)
    }

    fn split(&self, feature: &LineFeature) -> Vec<LineFeature> {
        feature
            .vertices
            .windows(2)
            .map(|pair| LineFeature {
                vertices: vec![pair[0], pair[1]],
                category: feature.category,
                sheet: feature.sheet.clone(),
                axis_flag: feature.axis_flag,
            })
            .collect()
    }

    fn dissolve(&self, polygons: &[Polygon<f64>]) -> Result<MultiPolygon<f64>> {
        let mut parts = polygons.iter();
        let first = match parts.next() {
            Some(first) => MultiPolygon::new(vec![first.clone()]),
            None => return Ok(MultiPolygon::new(Vec::new())),
        };

        Ok(parts.fold(first, |acc, polygon| {
            acc.union(&MultiPolygon::new(vec![polygon.clone()]))
        }))
    }

    fn project(&self, vertices: &[Vertex], target_crs: u32) -> Result<Vec<Vertex>> {
        let transform = self.transformer(target_crs)?;
        vertices
            .iter()
            .map(|v| {
                transform
                    .transform(v.x, v.y, v.z)
                    .map(|(x, y, z)| Vertex::new(x, y, z))
            })
            .collect()
    }

    fn project_polygon(&self, polygon: &Polygon<f64>, target_crs: u32) -> Result<Polygon<f64>> {
        let transform = self.transformer(target_crs)?;

        let project_ring = |ring: &LineString<f64>| -> Result<LineString<f64>> {
            ring.0
                .iter()
                .map(|c| {
                    transform
                        .transform(c.x, c.y, 0.0)
                        .map(|(x, y, _)| coord! { x: x, y: y })
                })
                .collect::<Result<Vec<_>>>()
                .map(LineString::new)
        };

        let exterior = project_ring(polygon.exterior())?;
        let interiors = polygon
            .interiors()
            .iter()
            .map(project_ring)
            .collect::<Result<Vec<_>>>()?;

        Ok(Polygon::new(exterior, interiors))
    }
}

fn rings(polygon: &Polygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors().iter())
}

/// Overlapping collinear portion of two segments, if any
///
/// Both endpoints of `b` must lie within `tolerance` of the infinite line
/// through `a`; the overlap is the intersection of their parameter
/// intervals along `a`, kept only when longer than the tolerance.
fn collinear_overlap(a: Line<f64>, b: Line<f64>, tolerance: f64) -> Option<Line<f64>> {
    let dx = a.end.x - a.start.x;
    let dy = a.end.y - a.start.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < tolerance {
        return None;
    }
    let (ux, uy) = (dx / len, dy / len);

    let offset = |p: Coord<f64>| ((p.x - a.start.x) * uy - (p.y - a.start.y) * ux).abs();
    if offset(b.start) > tolerance || offset(b.end) > tolerance {
        return None;
    }

    let along = |p: Coord<f64>| (p.x - a.start.x) * ux + (p.y - a.start.y) * uy;
    let (tb0, tb1) = (along(b.start), along(b.end));
    let lo = tb0.min(tb1).max(0.0);
    let hi = tb0.max(tb1).min(len);
    if hi - lo <= tolerance {
        return None;
    }

    Some(Line::new(
        coord! { x: a.start.x + ux * lo, y: a.start.y + uy * lo },
        coord! { x: a.start.x + ux * hi, y: a.start.y + uy * hi },
    ))
}

/// Rectangle covering a segment inflated by `distance` in every direction
fn segment_envelope(segment: &Line<f64>, distance: f64) -> Polygon<f64> {
    let dx = segment.end.x - segment.start.x;
    let dy = segment.end.y - segment.start.y;
    let len = (dx * dx + dy * dy).sqrt();

    let (ux, uy) = if len > 0.0 { (dx / len, dy / len) } else { (1.0, 0.0) };
    let (nx, ny) = (-uy, ux);

    let (sx, sy) = (segment.start.x - ux * distance, segment.start.y - uy * distance);
    let (ex, ey) = (segment.end.x + ux * distance, segment.end.y + uy * distance);

    Polygon::new(
        LineString::new(vec![
            coord! { x: sx + nx * distance, y: sy + ny * distance },
            coord! { x: ex + nx * distance, y: ey + ny * distance },
            coord! { x: ex - nx * distance, y: ey - ny * distance },
            coord! { x: sx - nx * distance, y: sy - ny * distance },
            coord! { x: sx + nx * distance, y: sy + ny * distance },
        ]),
        Vec::new(),
    )
}

/// Elevation of a planar coordinate, interpolated along the source polyline
///
/// Projects the coordinate onto every segment of the source run and
/// linearly interpolates z on the closest one. Coordinates already present
/// in the run resolve to their original elevation.
fn elevation_at(vertices: &[Vertex], target: Coord<f64>) -> f64 {
    let mut best_distance = f64::INFINITY;
    let mut best_z = vertices.first().map(|v| v.z).unwrap_or(0.0);

    for pair in vertices.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len_sq = dx * dx + dy * dy;

        let t = if len_sq > 0.0 {
            (((target.x - a.x) * dx + (target.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let (px, py) = (a.x + t * dx, a.y + t * dy);
        let dist_sq = (target.x - px).powi(2) + (target.y - py).powi(2);
        if dist_sq < best_distance {
            best_distance = dist_sq;
            best_z = a.z + t * (b.z - a.z);
        }
    }

    best_z
}
