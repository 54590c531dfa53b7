//! Region-of-interest selection and reprojection gate
//!
//! Selects the cumulative features intersecting the region of interest,
//! splits bridge/structure lines into their own thematic subset and either
//! copies features bit-identically (native output reference) or routes
//! every subset through the spatial operations collaborator for
//! reprojection.

use geo::{Intersects, Polygon};
use tracing::{debug, info};

use crate::Result;
use crate::app::models::{
    CategoryCode, CoveragePolygon, CoverageSet, LineFeature, LineSet, PointFeature, PointSet,
};
use crate::app::services::spatial::SpatialOps;
use crate::config::Config;

/// The named output subsets of one processing run
#[derive(Debug, Default)]
pub struct OutputBundle {
    pub points: Vec<PointFeature>,
    pub lines: Vec<LineFeature>,
    /// Bridge/structure category lines, kept out of the main line output
    pub structures: Vec<LineFeature>,
    pub envelopes: Vec<CoveragePolygon>,
    /// Pre-deduplication snapshots, always in the native reference
    pub raw_points: Option<Vec<PointFeature>>,
    pub raw_lines: Option<Vec<LineFeature>>,
}

/// Builds the output subsets from the cumulative containers
pub struct OutputProjector<'a> {
    ops: &'a dyn SpatialOps,
    config: &'a Config,
}

impl<'a> OutputProjector<'a> {
    pub fn new(ops: &'a dyn SpatialOps, config: &'a Config) -> Self {
        Self { ops, config }
    }

    /// Produce the output bundle for the requested reference
    #[allow(clippy::too_many_arguments)]
    pub fn project(
        &self,
        points: PointSet,
        lines: LineSet,
        coverage: CoverageSet,
        raw_points: Option<PointSet>,
        raw_lines: Option<LineSet>,
        region_of_interest: &Polygon<f64>,
    ) -> Result<OutputBundle> {
        let selected_points: Vec<PointFeature> = points
            .into_vec()
            .into_iter()
            .filter(|feature| feature.point().intersects(region_of_interest))
            .collect();

        let selected_lines: Vec<LineFeature> = lines
            .into_vec()
            .into_iter()
            .filter(|feature| feature.line_string().intersects(region_of_interest))
            .collect();

        // Structures are reported separately, never in the main line output
        let (structures, lines_out): (Vec<_>, Vec<_>) = selected_lines
            .into_iter()
            .partition(|feature| feature.category == CategoryCode::Structure);

        debug!(
            "Region selection: {} points, {} lines, {} structures",
            selected_points.len(),
            lines_out.len(),
            structures.len()
        );

        let mut bundle = OutputBundle {
            points: selected_points,
            lines: lines_out,
            structures,
            envelopes: coverage.into_vec(),
            raw_points: raw_points.map(PointSet::into_vec),
            raw_lines: raw_lines.map(LineSet::into_vec),
        };

        if self.config.output_is_native() {
            info!(
                "Output reference {} is native, copying features as-is",
                self.config.output_crs
            );
            return Ok(bundle);
        }

        info!(
            "Reprojecting output subsets into reference {}",
            self.config.output_crs
        );
        let target = self.config.output_crs;

        for feature in &mut bundle.points {
            let projected = self.ops.project(std::slice::from_ref(&feature.location), target)?;
            feature.location = projected[0];
        }
        for feature in bundle.lines.iter_mut().chain(bundle.structures.iter_mut()) {
            feature.vertices = self.ops.project(&feature.vertices, target)?;
        }
        for envelope in &mut bundle.envelopes {
            envelope.polygon = self.ops.project_polygon(&envelope.polygon, target)?;
        }

        Ok(bundle)
    }
}
