//! Command-line argument definitions for NMT processor
//!
//! Defines the complete CLI interface using the clap derive API.

use crate::constants::{DEFAULT_OUTPUT_CRS, DEFAULT_OUTPUT_PREFIX, DEFAULT_SHEET_ID_PROPERTY};
use crate::{Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the NMT terrain survey processor
///
/// Reconciles sheet-partitioned ASCII terrain survey exports into
/// continuous, deduplicated vector datasets clipped to a region of
/// interest.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "nmt-processor",
    version,
    about = "Reconcile sheet-partitioned terrain survey ASCII exports into continuous vector datasets",
    long_about = "A production-ready tool that merges per-sheet ASCII terrain survey exports into \
                  continuous point and line datasets. Handles sheet-boundary deduplication, \
                  tolerant parsing of sentinel-delimited vertex runs, coverage-based filtering \
                  and GeoJSON output in the requested coordinate reference."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the NMT processor
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Process survey sheets into reconciled vector datasets (main command)
    Process(ProcessArgs),
    /// Report the discovered sheet catalog without processing
    Sheets(SheetsArgs),
}

/// Arguments for the process command (main data processing)
#[derive(Debug, Clone, Parser)]
pub struct ProcessArgs {
    /// Input path to the folder holding per-sheet ASCII survey exports
    ///
    /// Scanned recursively for files following the
    /// `<sheetId>_<category>.asc` naming convention.
    #[arg(
        short = 'i',
        long = "input",
        value_name = "PATH",
        help = "Input folder with per-sheet ASCII survey exports"
    )]
    pub input_path: PathBuf,

    /// Output workspace for generated GeoJSON datasets
    ///
    /// Will be created if it doesn't exist. If not specified, defaults to ./output
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help = "Output workspace for generated GeoJSON datasets"
    )]
    pub output_path: Option<PathBuf>,

    /// Prefix for output dataset names
    #[arg(
        short = 'p',
        long = "prefix",
        value_name = "NAME",
        default_value = DEFAULT_OUTPUT_PREFIX,
        help = "Prefix for output dataset names"
    )]
    pub prefix: String,

    /// Index-area dataset with one coverage polygon per sheet (GeoJSON)
    ///
    /// Each polygon must carry the raw sheet identifier in the property
    /// named by --sheet-field.
    #[arg(
        long = "index-area",
        value_name = "FILE",
        help = "GeoJSON dataset with one coverage polygon per sheet"
    )]
    pub index_area: PathBuf,

    /// Region-of-interest boundary polygon (GeoJSON)
    #[arg(
        long = "clip-area",
        value_name = "FILE",
        help = "GeoJSON polygon bounding the region of interest"
    )]
    pub clip_area: PathBuf,

    /// Requested output coordinate reference code
    ///
    /// Features are copied bit-identically when the code is equivalent to
    /// the native reference, and reprojected otherwise.
    #[arg(
        long = "output-crs",
        value_name = "CODE",
        default_value_t = DEFAULT_OUTPUT_CRS,
        help = "Output coordinate reference code"
    )]
    pub output_crs: u32,

    /// Property holding the raw sheet identifier on coverage polygons
    #[arg(
        long = "sheet-field",
        value_name = "NAME",
        default_value = DEFAULT_SHEET_ID_PROPERTY,
        help = "Sheet identifier property on the index-area dataset"
    )]
    pub sheet_field: String,

    /// Skip point category files
    #[arg(long = "skip-points", help = "Skip point category files")]
    pub skip_points: bool,

    /// Skip line category files
    #[arg(long = "skip-lines", help = "Skip line category files")]
    pub skip_lines: bool,

    /// Export pre-deduplication raw snapshots for diagnostics
    #[arg(
        long = "export-raw",
        help = "Export pre-deduplication raw snapshots of points and lines"
    )]
    pub export_raw: bool,

    /// Force overwrite of existing output datasets
    #[arg(long = "force", help = "Force overwrite of existing output datasets")]
    pub force_overwrite: bool,

    /// Number of parallel sheet workers
    ///
    /// Defaults to the number of CPU cores, capped at 8.
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "COUNT",
        help = "Number of parallel sheet workers (default: auto)"
    )]
    pub workers: Option<usize>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors and critical messages. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format for machine-readable results
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,
}

/// Arguments for the sheets command (catalog report)
#[derive(Debug, Clone, Parser)]
pub struct SheetsArgs {
    /// Input path to the folder holding per-sheet ASCII survey exports
    #[arg(
        short = 'i',
        long = "input",
        value_name = "PATH",
        help = "Input folder with per-sheet ASCII survey exports"
    )]
    pub input_path: PathBuf,

    /// Output format for the catalog report
    #[arg(
        long = "format",
        value_enum,
        default_value = "human",
        help = "Output format for the catalog report"
    )]
    pub output_format: OutputFormat,

    /// Output file for the catalog report
    ///
    /// If not specified, outputs to stdout
    #[arg(
        short = 'o',
        long = "output-file",
        value_name = "FILE",
        help = "Output file for the catalog report"
    )]
    pub output_file: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Enable verbose logging (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,
}

/// Output format options for machine-readable results
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

impl Args {
    /// Get the command if one was specified
    pub fn get_command(&self) -> Commands {
        self.command
            .clone()
            .expect("Command should be present when get_command() is called")
    }
}

impl ProcessArgs {
    /// Validate the process command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if !self.input_path.exists() {
            return Err(Error::configuration(format!(
                "Input path does not exist: {}",
                self.input_path.display()
            )));
        }
        if !self.input_path.is_dir() {
            return Err(Error::configuration(format!(
                "Input path is not a directory: {}",
                self.input_path.display()
            )));
        }

        for (label, path) in [("Index area", &self.index_area), ("Clip area", &self.clip_area)] {
            if !path.exists() {
                return Err(Error::configuration(format!(
                    "{} file does not exist: {}",
                    label,
                    path.display()
                )));
            }
        }

        if self.prefix.is_empty() {
            return Err(Error::configuration(
                "Output prefix cannot be empty".to_string(),
            ));
        }
        if self.prefix.contains(['/', '\\']) {
            return Err(Error::configuration(
                "Output prefix cannot contain path separators".to_string(),
            ));
        }

        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err(Error::configuration(
                    "Number of workers must be greater than 0".to_string(),
                ));
            }
            if workers > 100 {
                return Err(Error::configuration(
                    "Number of workers cannot exceed 100".to_string(),
                ));
            }
        }

        if self.skip_points && self.skip_lines {
            return Err(Error::configuration(
                "Nothing to do: both point and line ingestion are disabled".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve the output workspace path
    pub fn get_output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("./output"))
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl SheetsArgs {
    /// Validate the sheets command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if !self.input_path.exists() {
            return Err(Error::configuration(format!(
                "Input path does not exist: {}",
                self.input_path.display()
            )));
        }

        if let Some(output_file) = &self.output_file {
            if let Some(parent) = output_file.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(Error::configuration(format!(
                        "Output file directory does not exist: {}",
                        parent.display()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn valid_args(dir: &TempDir) -> ProcessArgs {
        let index = dir.path().join("index.geojson");
        let clip = dir.path().join("clip.geojson");
        fs::write(&index, "{}").unwrap();
        fs::write(&clip, "{}").unwrap();

        ProcessArgs {
            input_path: dir.path().to_path_buf(),
            output_path: Some(dir.path().join("output")),
            prefix: "nmt".to_string(),
            index_area: index,
            clip_area: clip,
            output_crs: DEFAULT_OUTPUT_CRS,
            sheet_field: DEFAULT_SHEET_ID_PROPERTY.to_string(),
            skip_points: false,
            skip_lines: false,
            export_raw: false,
            force_overwrite: false,
            workers: None,
            verbose: 0,
            quiet: false,
            output_format: OutputFormat::Human,
        }
    }

    #[test]
    fn test_process_args_validation() {
        let dir = TempDir::new().unwrap();
        let args = valid_args(&dir);
        assert!(args.validate().is_ok());

        let mut invalid = args.clone();
        invalid.input_path = PathBuf::from("/nonexistent/path");
        assert!(invalid.validate().is_err());

        let mut invalid = args.clone();
        invalid.index_area = PathBuf::from("/nonexistent/index.geojson");
        assert!(invalid.validate().is_err());

        let mut invalid = args.clone();
        invalid.workers = Some(0);
        assert!(invalid.validate().is_err());

        let mut invalid = args.clone();
        invalid.workers = Some(101);
        assert!(invalid.validate().is_err());

        let mut invalid = args.clone();
        invalid.prefix = "a/b".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = args.clone();
        invalid.skip_points = true;
        invalid.skip_lines = true;
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let dir = TempDir::new().unwrap();
        let mut args = valid_args(&dir);

        assert_eq!(args.get_log_level(), "warn");

        args.verbose = 1;
        assert_eq!(args.get_log_level(), "info");

        args.verbose = 2;
        assert_eq!(args.get_log_level(), "debug");

        args.verbose = 3;
        assert_eq!(args.get_log_level(), "trace");

        args.verbose = 0;
        args.quiet = true;
        assert_eq!(args.get_log_level(), "error");
    }

    #[test]
    fn test_show_progress() {
        let dir = TempDir::new().unwrap();
        let mut args = valid_args(&dir);

        assert!(args.show_progress());
        args.quiet = true;
        assert!(!args.show_progress());
    }

    #[test]
    fn test_default_output_path() {
        let dir = TempDir::new().unwrap();
        let mut args = valid_args(&dir);
        args.output_path = None;
        assert_eq!(args.get_output_path(), PathBuf::from("./output"));
    }
}
