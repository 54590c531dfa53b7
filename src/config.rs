//! Configuration for survey processing runs.
//!
//! Provides the processing parameters shared by the ingestion pipeline,
//! boundary deduplication and output stages, with builder-style setters
//! for programmatic use.

use crate::constants::{
    DEFAULT_OUTPUT_CRS, DEFAULT_OUTPUT_PREFIX, DEFAULT_SHEET_ID_PROPERTY, DEGENERATE_EPSILON,
    EDGE_BUFFER_DISTANCE, EQUIVALENT_CRS_CODES, MAX_AUTO_WORKERS,
};
use serde::{Deserialize, Serialize};

/// Global configuration for a processing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of parallel sheet workers
    pub workers: usize,

    /// Ingest point category files
    pub import_points: bool,

    /// Ingest line category files
    pub import_lines: bool,

    /// Capture pre-deduplication snapshots of the cumulative containers
    pub export_raw: bool,

    /// Spread below which a line extent counts as degenerate (native units)
    pub degenerate_epsilon: f64,

    /// Outward buffer distance around shared coverage edges (native units)
    pub edge_buffer: f64,

    /// Property holding the raw sheet identifier on coverage polygons
    pub sheet_id_property: String,

    /// Requested output coordinate reference code
    pub output_crs: u32,

    /// Output file name prefix
    pub prefix: String,

    /// Overwrite existing output datasets
    pub force_overwrite: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().min(MAX_AUTO_WORKERS).max(1),
            import_points: true,
            import_lines: true,
            export_raw: false,
            degenerate_epsilon: DEGENERATE_EPSILON,
            edge_buffer: EDGE_BUFFER_DISTANCE,
            sheet_id_property: DEFAULT_SHEET_ID_PROPERTY.to_string(),
            output_crs: DEFAULT_OUTPUT_CRS,
            prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            force_overwrite: false,
        }
    }
}

impl Config {
    /// Create configuration with custom worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Disable point ingestion
    pub fn without_points(mut self) -> Self {
        self.import_points = false;
        self
    }

    /// Disable line ingestion
    pub fn without_lines(mut self) -> Self {
        self.import_lines = false;
        self
    }

    /// Enable raw snapshot export
    pub fn with_raw_export(mut self) -> Self {
        self.export_raw = true;
        self
    }

    /// Set the shared-edge buffer distance
    pub fn with_edge_buffer(mut self, distance: f64) -> Self {
        self.edge_buffer = distance;
        self
    }

    /// Set the sheet identifier property name on coverage polygons
    pub fn with_sheet_id_property(mut self, property: impl Into<String>) -> Self {
        self.sheet_id_property = property.into();
        self
    }

    /// Set the requested output coordinate reference
    pub fn with_output_crs(mut self, code: u32) -> Self {
        self.output_crs = code;
        self
    }

    /// Set the output file name prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Enable overwriting of existing outputs
    pub fn with_force_overwrite(mut self) -> Self {
        self.force_overwrite = true;
        self
    }

    /// Check whether the configured output reference equals the native one
    pub fn output_is_native(&self) -> bool {
        EQUIVALENT_CRS_CODES.contains(&self.output_crs)
    }
}
