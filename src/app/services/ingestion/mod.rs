//! Ingestion pipeline for sheet-partitioned survey exports
//!
//! Parses every discovered sheet on parallel workers and merges the
//! completed per-sheet result sets into the cumulative point, line and
//! coverage containers on a single coordinator. Workers only touch
//! sheet-local temporaries and the immutable catalog/coverage handles, so
//! no locks are involved; finished batches are handed over by value.

pub mod sheet_worker;


pub use sheet_worker::{SheetBatch, process_sheet};

use futures::StreamExt;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::models::{CoverageSet, LineSet, PointSet};
use crate::app::services::asc_parser::ParseStats;
use crate::app::services::coverage_loader::CoverageIndex;
use crate::app::services::sheet_catalog::SheetCatalog;
use crate::app::services::spatial::SpatialOps;
use crate::config::Config;
use crate::{Error, Result};

/// Cumulative containers and diagnostics of one ingestion run
#[derive(Debug)]
pub struct IngestionResult {
    pub points: PointSet,
    pub lines: LineSet,
    pub coverage: CoverageSet,
    /// Pre-deduplication snapshot of the cumulative points, when requested
    pub raw_points: Option<PointSet>,
    /// Pre-deduplication snapshot of the cumulative lines, when requested
    pub raw_lines: Option<LineSet>,
    pub report: IngestionReport,
}

/// Per-run ingestion diagnostics
#[derive(Debug, Default)]
pub struct IngestionReport {
    pub sheets_total: usize,
    pub sheets_merged: usize,
    pub sheets_skipped_empty: usize,
    /// Sheets whose merge step failed, with the failure text
    pub sheets_failed: Vec<(String, String)>,
    /// Parse statistics aggregated across all sheets
    pub parse: ParseStats,
    /// Expected source files that disappeared between discovery and parse
    pub files_missing: usize,
    pub elapsed: Duration,
}

/// Single-coordinator pipeline over parallel sheet workers
pub struct IngestionPipeline {
    config: Arc<Config>,
    catalog: Arc<SheetCatalog>,
    coverage: Arc<CoverageIndex>,
    ops: Arc<dyn SpatialOps>,
}

impl IngestionPipeline {
    pub fn new(
        config: Arc<Config>,
        catalog: Arc<SheetCatalog>,
        coverage: Arc<CoverageIndex>,
        ops: Arc<dyn SpatialOps>,
    ) -> Self {
        Self {
            config,
            catalog,
            coverage,
            ops,
        }
    }

    /// Run the pipeline over every cataloged sheet
    ///
    /// Coverage-lookup failures fail only the affected sheet and are
    /// collected in the report; any other error aborts the run.
    pub async fn run(
        &self,
        cancellation: CancellationToken,
        progress: Option<&ProgressBar>,
    ) -> Result<IngestionResult> {
        let start = Instant::now();
        let sheet_ids = self.catalog.distinct_sheet_ids();

        let mut report = IngestionReport {
            sheets_total: sheet_ids.len(),
            ..IngestionReport::default()
        };

        info!(
            "Ingesting {} sheets with {} workers",
            sheet_ids.len(),
            self.config.workers
        );

        let mut points = PointSet::new();
        let mut lines = LineSet::new();
        let mut coverage = CoverageSet::new();

        let mut batches = futures::stream::iter(sheet_ids.into_iter().map(|sheet_id| {
            let config = Arc::clone(&self.config);
            let catalog = Arc::clone(&self.catalog);
            let coverage = Arc::clone(&self.coverage);
            let ops = Arc::clone(&self.ops);
            async move {
                let worker_id = sheet_id.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    process_sheet(&worker_id, &config, &catalog, &coverage, ops.as_ref())
                })
                .await;
                (sheet_id, joined)
            }
        }))
        .buffer_unordered(self.config.workers.max(1));

        // Single-writer merge; batches arrive in completion order, which is
        // fine because deduplication and dissolve are order-independent
        while let Some((sheet_id, joined)) = batches.next().await {
            if cancellation.is_cancelled() {
                return Err(Error::interrupted("Ingestion cancelled"));
            }

            let outcome = joined
                .map_err(|e| Error::pipeline(format!("Sheet worker for '{}' died: {}", sheet_id, e)))?;

            match outcome {
                Ok(batch) => {
                    report.parse.merge(batch.stats);
                    report.files_missing += batch.files_missing;

                    if batch.skipped_empty {
                        report.sheets_skipped_empty += 1;
                        info!("Sheet '{}' produced no data, skipped", sheet_id);
                    } else {
                        let coverage_polygon = batch
                            .coverage
                            .ok_or_else(|| Error::pipeline(format!(
                                "Sheet '{}' merged without a coverage polygon",
                                sheet_id
                            )))?;
                        coverage.push(coverage_polygon);
                        points.append(batch.points);
                        lines.append(batch.lines);
                        report.sheets_merged += 1;
                    }
                }
                // A failed coverage lookup only loses this sheet
                Err(error @ Error::CoverageLookup { .. }) => {
                    warn!("Sheet '{}' failed: {}", sheet_id, error);
                    report.sheets_failed.push((sheet_id, error.to_string()));
                }
                Err(error) => return Err(error),
            }

            if let Some(pb) = progress {
                pb.inc(1);
                pb.set_message(format!("Merged sheet {}", report.sheets_merged));
            }
        }

        report.elapsed = start.elapsed();
        info!(
            "Ingestion complete: {} sheets merged, {} skipped, {} failed, {} points, {} lines in {:.2}s",
            report.sheets_merged,
            report.sheets_skipped_empty,
            report.sheets_failed.len(),
            points.len(),
            lines.len(),
            report.elapsed.as_secs_f64()
        );

        // Snapshots are taken once the cumulative containers are complete,
        // before boundary deduplication runs
        let (raw_points, raw_lines) = if self.config.export_raw {
            (Some(points.clone()), Some(lines.clone()))
        } else {
            (None, None)
        };

        Ok(IngestionResult {
            points,
            lines,
            coverage,
            raw_points,
            raw_lines,
            report,
        })
    }
}
