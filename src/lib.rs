//! NMT Processor Library
//!
//! A Rust library for reconciling sheet-partitioned terrain survey ASCII
//! exports into continuous, deduplicated vector datasets.
//!
//! This library provides tools for:
//! - Parsing sentinel-delimited ASCII survey files with tolerant record handling
//! - Discovering per-sheet source files and their category codes
//! - Merging per-sheet geometry into cumulative datasets filtered by sheet coverage
//! - Removing duplicate line geometry along shared sheet boundaries
//! - Clipping the reconciled datasets to a region of interest and writing
//!   GeoJSON outputs in the requested coordinate reference

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod asc_parser;
        pub mod boundary_dedup;
        pub mod coverage_loader;
        pub mod ingestion;
        pub mod output;
        pub mod sheet_catalog;
        pub mod spatial;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{CategoryCode, LineFeature, PointFeature, SheetKey, Vertex};
pub use config::Config;

/// Result type alias for the NMT processor
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for survey processing operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Source catalog error
    #[error("Catalog error: {message}")]
    Catalog { message: String },

    /// Two source files resolve to the same (sheet, category) key
    #[error(
        "Catalog collision for sheet '{sheet}' category '{category}': '{}' and '{}' resolve to the same key",
        .first.display(),
        .second.display()
    )]
    CatalogCollision {
        sheet: String,
        category: String,
        first: std::path::PathBuf,
        second: std::path::PathBuf,
    },

    /// Coverage polygon lookup did not yield exactly one match
    #[error("Coverage lookup for sheet key '{key}' matched {matches} polygons, expected exactly 1")]
    CoverageLookup { key: String, matches: usize },

    /// GeoJSON input/output error
    #[error("GeoJSON error in '{path}': {message}")]
    GeoJson { path: String, message: String },

    /// Spatial operation failed
    #[error("Spatial operation failed: {message}")]
    SpatialOps { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Pipeline execution error
    #[error("Pipeline error: {message}")]
    Pipeline { message: String },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    Interrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create an I/O error with a simple message
    pub fn io_error(message: impl Into<String>) -> Self {
        let message_str = message.into();
        Self::Io {
            message: message_str.clone(),
            source: std::io::Error::other(message_str),
        }
    }

    /// Create a catalog error
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Create a catalog collision error
    pub fn catalog_collision(
        sheet: impl Into<String>,
        category: impl Into<String>,
        first: std::path::PathBuf,
        second: std::path::PathBuf,
    ) -> Self {
        Self::CatalogCollision {
            sheet: sheet.into(),
            category: category.into(),
            first,
            second,
        }
    }

    /// Create a coverage lookup error
    pub fn coverage_lookup(key: impl Into<String>, matches: usize) -> Self {
        Self::CoverageLookup {
            key: key.into(),
            matches,
        }
    }

    /// Create a GeoJSON error
    pub fn geojson(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GeoJson {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a spatial operations error
    pub fn spatial_ops(message: impl Into<String>) -> Self {
        Self::SpatialOps {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a pipeline error
    pub fn pipeline(message: impl Into<String>) -> Self {
        Self::Pipeline {
            message: message.into(),
        }
    }

    /// Create a processing interrupted error
    pub fn interrupted(reason: impl Into<String>) -> Self {
        Self::Interrupted {
            reason: reason.into(),
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(error: walkdir::Error) -> Self {
        Self::Catalog {
            message: format!("Directory traversal failed: {}", error),
        }
    }
}
