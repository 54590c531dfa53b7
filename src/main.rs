use clap::Parser;
use nmt_processor::cli::{args::Args, commands};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    // Create async runtime and run the main command logic with signal handling
    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Create cancellation token for coordinating graceful shutdown
        let cancellation_token = CancellationToken::new();

        // Set up graceful shutdown handling
        let shutdown_signal = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install CTRL+C signal handler");

            // Cancel all operations when Ctrl+C is received
            cancellation_token.cancel();
        };

        // Run the main command with cancellation support
        tokio::select! {
            result = commands::run(args, cancellation_token.clone()) => {
                result
            }
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down gracefully...");
                Err(nmt_processor::Error::interrupted(
                    "Processing interrupted by user".to_string()
                ))
            }
        }
    });

    match result {
        Ok(_stats) => {
            // Success - stats have already been reported by the command
            process::exit(0);
        }
        Err(error) => {
            // Error occurred - print to stderr and exit with error code
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("NMT Processor - Terrain Survey Sheet Reconciliation");
    println!("===================================================");
    println!();
    println!("Reconcile sheet-partitioned ASCII terrain survey exports into continuous,");
    println!("deduplicated vector datasets clipped to a region of interest.");
    println!();
    println!("USAGE:");
    println!("    nmt-processor <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    process     Process survey sheets into reconciled datasets (main command)");
    println!("    sheets      Report the discovered sheet catalog");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Process a survey export folder:");
    println!("    nmt-processor process --input /path/to/sheets --output /path/to/output \\");
    println!("                          --index-area index.geojson --clip-area roi.geojson");
    println!();
    println!("    # Keep raw pre-deduplication snapshots for diagnostics:");
    println!("    nmt-processor process --input ./sheets --index-area index.geojson \\");
    println!("                          --clip-area roi.geojson --export-raw");
    println!();
    println!("    # List the discovered sheets:");
    println!("    nmt-processor sheets --input ./sheets --format json");
    println!();
    println!("For detailed help on any command, use:");
    println!("    nmt-processor <COMMAND> --help");
}
