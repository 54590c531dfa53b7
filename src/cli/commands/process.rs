//! Main processing command: catalog discovery through GeoJSON output
//!
//! Orchestrates the full reconciliation workflow: discover the sheet
//! catalog, load coverage and region-of-interest polygons, ingest sheets
//! in parallel, deduplicate shared-boundary lines, select and reproject
//! the output subsets and write the named GeoJSON datasets.

use colored::Colorize;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::app::services::boundary_dedup::BoundaryDeduplicator;
use crate::app::services::coverage_loader::{load_coverage_index, load_region_of_interest};
use crate::app::services::ingestion::IngestionPipeline;
use crate::app::services::output::{GeoJsonWriter, OutputProjector};
use crate::app::services::sheet_catalog::SheetCatalog;
use crate::app::services::spatial::{GeoSpatialOps, SpatialOps};
use crate::cli::args::{OutputFormat, ProcessArgs};
use crate::config::Config;
use crate::{Error, Result};

use super::shared::{ProcessingStats, create_progress_bar, setup_logging};

/// Run the process command
pub async fn run_process(
    args: ProcessArgs,
    cancellation_token: CancellationToken,
) -> Result<ProcessingStats> {
    setup_logging(args.get_log_level(), args.quiet)?;
    args.validate()?;

    let start = Instant::now();
    let config = build_config(&args);

    // Catalog discovery; a key collision aborts before any processing
    let catalog = Arc::new(SheetCatalog::discover(&args.input_path)?);
    if catalog.is_empty() {
        return Err(Error::catalog(format!(
            "No survey files found below {}",
            args.input_path.display()
        )));
    }

    // Coverage index and region of interest
    let coverage_index = Arc::new(load_coverage_index(&args.index_area, &config.sheet_id_property)?);
    let region_of_interest = load_region_of_interest(&args.clip_area)?;

    let ops: Arc<dyn SpatialOps> = Arc::new(GeoSpatialOps::new());
    let config = Arc::new(config);

    // Ingestion across parallel sheet workers
    let progress = if args.show_progress() {
        Some(create_progress_bar(
            catalog.distinct_sheet_ids().len() as u64,
            "Processing sheets...",
        ))
    } else {
        None
    };

    let pipeline = IngestionPipeline::new(
        Arc::clone(&config),
        Arc::clone(&catalog),
        coverage_index,
        Arc::clone(&ops),
    );
    let mut ingestion = pipeline.run(cancellation_token.clone(), progress.as_ref()).await?;

    if let Some(pb) = &progress {
        pb.finish_with_message(format!(
            "Ingested {} sheets ({} skipped, {} failed)",
            ingestion.report.sheets_merged,
            ingestion.report.sheets_skipped_empty,
            ingestion.report.sheets_failed.len()
        ));
    }

    // Boundary deduplication over the cumulative line container
    let dedup_stats = if config.import_lines {
        let deduplicator = BoundaryDeduplicator::new(ops.as_ref(), config.edge_buffer);
        deduplicator.dedup(&mut ingestion.lines, &ingestion.coverage)?
    } else {
        Default::default()
    };

    if cancellation_token.is_cancelled() {
        return Err(Error::interrupted("Processing cancelled"));
    }

    // Region selection, thematic split and reprojection gate
    let projector = OutputProjector::new(ops.as_ref(), &config);
    let bundle = projector.project(
        ingestion.points,
        ingestion.lines,
        ingestion.coverage,
        ingestion.raw_points,
        ingestion.raw_lines,
        &region_of_interest,
    )?;

    // GeoJSON output
    let writer = GeoJsonWriter::new(&args.get_output_path(), &config.prefix, config.force_overwrite)?;
    let write_stats = writer.write_bundle(&bundle)?;

    let stats = ProcessingStats {
        sheets_total: ingestion.report.sheets_total,
        sheets_merged: ingestion.report.sheets_merged,
        sheets_skipped: ingestion.report.sheets_skipped_empty,
        sheets_failed: ingestion.report.sheets_failed.len(),
        malformed_records: ingestion.report.parse.malformed.len(),
        duplicates_removed: dedup_stats.segments_removed,
        outputs: write_stats.datasets,
        processing_time: start.elapsed(),
    };

    info!(
        "Processing finished in {:.2}s",
        stats.processing_time.as_secs_f64()
    );

    match args.output_format {
        OutputFormat::Human => {
            if !args.quiet {
                print_summary(&stats, &ingestion.report.sheets_failed);
            }
        }
        OutputFormat::Json => print_json_summary(&stats)?,
    }

    Ok(stats)
}

fn build_config(args: &ProcessArgs) -> Config {
    let mut config = Config::default()
        .with_sheet_id_property(args.sheet_field.clone())
        .with_output_crs(args.output_crs)
        .with_prefix(args.prefix.clone());

    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if args.skip_points {
        config = config.without_points();
    }
    if args.skip_lines {
        config = config.without_lines();
    }
    if args.export_raw {
        config = config.with_raw_export();
    }
    if args.force_overwrite {
        config = config.with_force_overwrite();
    }

    config
}

fn print_summary(stats: &ProcessingStats, failed: &[(String, String)]) {
    println!();
    println!("{}", "Processing Summary".bold().underline());
    println!(
        "  Sheets:     {} merged, {} skipped, {} failed (of {})",
        stats.sheets_merged.to_string().green(),
        stats.sheets_skipped,
        if stats.sheets_failed > 0 {
            stats.sheets_failed.to_string().red().to_string()
        } else {
            "0".to_string()
        },
        stats.sheets_total
    );
    println!("  Malformed records: {}", stats.malformed_records);
    println!(
        "  Boundary duplicates removed: {}",
        stats.duplicates_removed
    );
    println!(
        "  Elapsed: {:.2}s",
        stats.processing_time.as_secs_f64()
    );

    println!();
    println!("{}", "Outputs".bold());
    for (name, count, path) in &stats.outputs {
        println!("  {:12} {:>8} features  {}", name, count, path.display());
    }

    if !failed.is_empty() {
        println!();
        println!("{}", "Failed sheets".bold().red());
        for (sheet, reason) in failed {
            println!("  {}: {}", sheet.red(), reason);
        }
    }
}

fn print_json_summary(stats: &ProcessingStats) -> Result<()> {
    let outputs: Vec<serde_json::Value> = stats
        .outputs
        .iter()
        .map(|(name, count, path)| {
            serde_json::json!({
                "name": name,
                "features": count,
                "path": path.display().to_string(),
            })
        })
        .collect();

    let summary = serde_json::json!({
        "sheets_total": stats.sheets_total,
        "sheets_merged": stats.sheets_merged,
        "sheets_skipped": stats.sheets_skipped,
        "sheets_failed": stats.sheets_failed,
        "malformed_records": stats.malformed_records,
        "duplicates_removed": stats.duplicates_removed,
        "processing_time_ms": stats.processing_time.as_millis() as u64,
        "outputs": outputs,
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&summary)
            .map_err(|e| Error::pipeline(format!("Failed to serialize summary: {}", e)))?
    );
    Ok(())
}
