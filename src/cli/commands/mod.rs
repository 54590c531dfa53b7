//! Command implementations for NMT processor CLI
//!
//! This module contains the main command execution logic, progress
//! reporting, and error handling for the CLI interface. Each command is
//! implemented in its own module.

pub mod process;
pub mod shared;
pub mod sheets;

// Re-export the main types and functions for convenience
pub use shared::ProcessingStats;

use crate::Result;
use crate::cli::args::{Args, Commands};
use tokio_util::sync::CancellationToken;

/// Main command runner for NMT processor
///
/// Dispatches to the appropriate subcommand handler based on CLI args:
/// - `process`: full reconciliation workflow with GeoJSON output
/// - `sheets`: catalog discovery report
pub async fn run(args: Args, cancellation_token: CancellationToken) -> Result<ProcessingStats> {
    match args.get_command() {
        Commands::Process(process_args) => {
            process::run_process(process_args, cancellation_token).await
        }
        Commands::Sheets(sheets_args) => sheets::run_sheets(sheets_args).await,
    }
}
