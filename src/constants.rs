//! Application constants for NMT processor
//!
//! This module contains the category code tables, file format markers,
//! geometric tolerances and output naming used throughout the application.

use crate::app::models::CategoryCode;

// =============================================================================
// Source File Format
// =============================================================================

/// File extension of ASCII survey exports (matched case-insensitively)
pub const SURVEY_FILE_EXTENSION: &str = "asc";

/// Literal token marking the beginning of a vertex run
pub const SENTINEL_START: &str = "Start";

/// Literal token marking the end of a vertex run
pub const SENTINEL_END: &str = "End";

/// Separator between sheet identifier and category code in file stems
pub const CATEGORY_SEPARATOR: char = '_';

// =============================================================================
// Category Codes
// =============================================================================

/// Point category codes present in sheet exports
pub const POINT_CATEGORIES: &[CategoryCode] = &[
    CategoryCode::GridPoint,
    CategoryCode::TerrainPoint,
    CategoryCode::MaskedGridPoint,
    CategoryCode::SpotHeight,
];

/// Line category codes present in sheet exports
pub const LINE_CATEGORIES: &[CategoryCode] = &[
    CategoryCode::FormLine,
    CategoryCode::BreakLine,
    CategoryCode::Watercourse,
    CategoryCode::MaskedBreakLine,
    CategoryCode::PlanarArea,
    CategoryCode::MaskArea,
    CategoryCode::Structure,
];

// =============================================================================
// Sheet Key Normalization
// =============================================================================

/// Source prefix token stripped from unified sheet identifiers
pub const SHEET_KEY_PREFIX: &str = "nmt";

/// Separator character removed during sheet key normalization
pub const SHEET_KEY_SEPARATOR: char = '-';

// =============================================================================
// Geometric Tolerances
// =============================================================================

/// Spread below which a line extent counts as degenerate (native units)
pub const DEGENERATE_EPSILON: f64 = 0.005;

/// Outward buffer distance around shared coverage edges (native units)
pub const EDGE_BUFFER_DISTANCE: f64 = 1.0;

// =============================================================================
// Coordinate Reference Systems
// =============================================================================

/// Native coordinate reference of the survey exports (PUWG-92)
pub const CRS_NATIVE: u32 = 2180;

/// Legacy vendor alias of the native reference
pub const CRS_NATIVE_ALIAS: u32 = 102173;

/// Output reference codes for which reprojection is skipped
pub const EQUIVALENT_CRS_CODES: &[u32] = &[CRS_NATIVE, CRS_NATIVE_ALIAS];

/// Default output coordinate reference code
pub const DEFAULT_OUTPUT_CRS: u32 = CRS_NATIVE;

// =============================================================================
// Coverage / Index Dataset Fields
// =============================================================================

/// Default property holding the raw sheet identifier on coverage polygons
pub const DEFAULT_SHEET_ID_PROPERTY: &str = "GODLO";

/// Property carrying the normalized sheet key on envelope outputs
pub const UNIFIED_KEY_PROPERTY: &str = "GODLO_UNIFIED";

// =============================================================================
// Output Dataset Names
// =============================================================================

/// Named output datasets produced by a processing run
pub mod outputs {
    /// Reconciled point features clipped to the region of interest
    pub const POINTS: &str = "points";

    /// Reconciled line features clipped to the region of interest
    pub const LINES: &str = "lines";

    /// Coverage envelope polygons of the merged sheets
    pub const ENVELOPES: &str = "envelopes";

    /// Bridge/structure category lines, split out of the main line output
    pub const STRUCTURES: &str = "structures";

    /// Pre-deduplication snapshot of the cumulative point container
    pub const RAW_POINTS: &str = "raw_points";

    /// Pre-deduplication snapshot of the cumulative line container
    pub const RAW_LINES: &str = "raw_lines";
}

// =============================================================================
// Processing Defaults
// =============================================================================

/// Upper bound for auto-detected parallel sheet workers
pub const MAX_AUTO_WORKERS: usize = 8;

/// Default output file name prefix
pub const DEFAULT_OUTPUT_PREFIX: &str = "nmt";

// =============================================================================
// Helper Functions
// =============================================================================

/// Build the file name of a named output dataset
pub fn output_filename(prefix: &str, name: &str) -> String {
    format!("{}_{}.geojson", prefix, name)
}

/// Check whether an output reference code is equivalent to the native one
pub fn is_native_crs(code: u32) -> bool {
    EQUIVALENT_CRS_CODES.contains(&code)
}
