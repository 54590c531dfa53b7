//! Shared components for CLI commands
//!
//! Common types, logging setup and progress reporting used across the
//! command implementations.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::debug;

use crate::Result;

/// Processing statistics for reporting across all commands
#[derive(Debug, Clone, Default)]
pub struct ProcessingStats {
    /// Number of sheets discovered in the catalog
    pub sheets_total: usize,
    /// Number of sheets merged into the cumulative datasets
    pub sheets_merged: usize,
    /// Number of sheets skipped with an empty extent
    pub sheets_skipped: usize,
    /// Number of sheets whose merge step failed
    pub sheets_failed: usize,
    /// Malformed records encountered across all files
    pub malformed_records: usize,
    /// Boundary segments removed by deduplication
    pub duplicates_removed: usize,
    /// Written output datasets as (name, feature count, path)
    pub outputs: Vec<(String, usize, PathBuf)>,
    /// Total processing time
    pub processing_time: std::time::Duration,
}

impl ProcessingStats {
    /// Total features across all written outputs
    pub fn total_output_features(&self) -> usize {
        self.outputs.iter().map(|(_, count, _)| count).sum()
    }
}

/// Set up structured logging from a resolved log level
pub fn setup_logging(log_level: &str, quiet: bool) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    // Create filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nmt_processor={}", log_level)));

    if quiet {
        // Minimal logging for quiet mode
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        // Standard logging with timestamps
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Create a styled progress bar for sheet processing
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let progress_bar = ProgressBar::new(len);
    progress_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );
    progress_bar.set_message(message.to_string());
    progress_bar
}
