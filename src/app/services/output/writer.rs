//! GeoJSON serialization of the named output datasets
//!
//! Writes each output subset as a GeoJSON FeatureCollection into the
//! output workspace, carrying category, sheet and axis-flag attributes on
//! features and elevations on coordinates. Existing outputs are only
//! overwritten when the run was forced.

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app::models::{CoveragePolygon, LineFeature, PointFeature};
use crate::constants::{DEFAULT_SHEET_ID_PROPERTY, UNIFIED_KEY_PROPERTY, output_filename, outputs};
use crate::{Error, Result};

use super::projector::OutputBundle;

/// Per-dataset write metrics
#[derive(Debug, Default)]
pub struct WriteStats {
    /// (dataset name, feature count, path) per written output
    pub datasets: Vec<(String, usize, PathBuf)>,
}

impl WriteStats {
    /// Total features across all written datasets
    pub fn total_features(&self) -> usize {
        self.datasets.iter().map(|(_, count, _)| count).sum()
    }
}

/// GeoJSON writer for one output workspace
pub struct GeoJsonWriter {
    out_dir: PathBuf,
    prefix: String,
    force_overwrite: bool,
}

impl GeoJsonWriter {
    /// Create a writer, creating the output workspace if needed
    pub fn new(out_dir: &Path, prefix: &str, force_overwrite: bool) -> Result<Self> {
        fs::create_dir_all(out_dir).map_err(|e| {
            Error::io(
                format!("Failed to create output directory {}", out_dir.display()),
                e,
            )
        })?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            prefix: prefix.to_string(),
            force_overwrite,
        })
    }

    /// Write every subset of the bundle as a named dataset
    pub fn write_bundle(&self, bundle: &OutputBundle) -> Result<WriteStats> {
        let mut stats = WriteStats::default();

        self.write_dataset(
            outputs::POINTS,
            bundle.points.iter().map(point_to_feature).collect(),
            &mut stats,
        )?;
        self.write_dataset(
            outputs::LINES,
            bundle.lines.iter().map(line_to_feature).collect(),
            &mut stats,
        )?;
        self.write_dataset(
            outputs::ENVELOPES,
            bundle.envelopes.iter().map(envelope_to_feature).collect(),
            &mut stats,
        )?;
        self.write_dataset(
            outputs::STRUCTURES,
            bundle.structures.iter().map(line_to_feature).collect(),
            &mut stats,
        )?;

        if let Some(raw_points) = &bundle.raw_points {
            self.write_dataset(
                outputs::RAW_POINTS,
                raw_points.iter().map(point_to_feature).collect(),
                &mut stats,
            )?;
        }
        if let Some(raw_lines) = &bundle.raw_lines {
            self.write_dataset(
                outputs::RAW_LINES,
                raw_lines.iter().map(line_to_feature).collect(),
                &mut stats,
            )?;
        }

        info!(
            "Wrote {} datasets with {} features to {}",
            stats.datasets.len(),
            stats.total_features(),
            self.out_dir.display()
        );

        Ok(stats)
    }

    fn write_dataset(
        &self,
        name: &str,
        features: Vec<Feature>,
        stats: &mut WriteStats,
    ) -> Result<()> {
        let path = self.out_dir.join(output_filename(&self.prefix, name));

        if path.exists() && !self.force_overwrite {
            return Err(Error::configuration(format!(
                "Output already exists (use --force to overwrite): {}",
                path.display()
            )));
        }

        let count = features.len();
        let collection = GeoJson::FeatureCollection(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        });

        fs::write(&path, collection.to_string())
            .map_err(|e| Error::io(format!("Failed to write {}", path.display()), e))?;

        debug!("{} - wrote {} features", path.display(), count);
        stats.datasets.push((name.to_string(), count, path));
        Ok(())
    }
}

fn point_to_feature(feature: &PointFeature) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert(
        "category".to_string(),
        feature.category.as_code().into(),
    );
    properties.insert("sheet".to_string(), feature.sheet.as_str().into());

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            feature.location.x,
            feature.location.y,
            feature.location.z,
        ]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn line_to_feature(feature: &LineFeature) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert(
        "category".to_string(),
        feature.category.as_code().into(),
    );
    properties.insert("sheet".to_string(), feature.sheet.as_str().into());
    properties.insert(
        "axis_flag".to_string(),
        feature.axis_flag.as_str().into(),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(
            feature
                .vertices
                .iter()
                .map(|v| vec![v.x, v.y, v.z])
                .collect(),
        ))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn envelope_to_feature(envelope: &CoveragePolygon) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert(
        DEFAULT_SHEET_ID_PROPERTY.to_string(),
        envelope.raw_id.clone().into(),
    );
    properties.insert(
        UNIFIED_KEY_PROPERTY.to_string(),
        envelope.key.as_str().into(),
    );

    let ring_to_positions = |ring: &geo::LineString<f64>| -> Vec<Vec<f64>> {
        ring.0.iter().map(|c| vec![c.x, c.y]).collect()
    };

    let mut rings = vec![ring_to_positions(envelope.polygon.exterior())];
    rings.extend(envelope.polygon.interiors().iter().map(ring_to_positions));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(rings))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
