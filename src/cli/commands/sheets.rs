//! Sheet catalog report command
//!
//! Discovers the per-sheet source files below the input folder and reports
//! the distinct sheet identifiers with their available category files,
//! without running the processing pipeline.

use colored::Colorize;
use std::fs;

use crate::app::models::SheetKey;
use crate::app::services::sheet_catalog::SheetCatalog;
use crate::cli::args::{OutputFormat, SheetsArgs};
use crate::{Error, Result};

use super::shared::{ProcessingStats, setup_logging};

/// Run the sheets command
pub async fn run_sheets(args: SheetsArgs) -> Result<ProcessingStats> {
    setup_logging(args.get_log_level(), false)?;
    args.validate()?;

    let catalog = SheetCatalog::discover(&args.input_path)?;

    let report = match args.output_format {
        OutputFormat::Human => human_report(&catalog),
        OutputFormat::Json => json_report(&catalog)?,
    };

    match &args.output_file {
        Some(path) => {
            fs::write(path, &report)
                .map_err(|e| Error::io(format!("Failed to write {}", path.display()), e))?;
        }
        None => print!("{}", report),
    }

    Ok(ProcessingStats {
        sheets_total: catalog.distinct_sheet_ids().len(),
        ..ProcessingStats::default()
    })
}

fn human_report(catalog: &SheetCatalog) -> String {
    let summary = catalog.summary();
    let mut report = String::new();

    report.push_str(&format!(
        "{}\n",
        format!("Discovered {} sheets, {} files", summary.len(), catalog.len()).bold()
    ));
    report.push_str(&format!(
        "{:<24} {:<14} {:>6} {:>6}\n",
        "Sheet", "Key", "Points", "Lines"
    ));

    for (sheet_id, (point_files, line_files)) in &summary {
        report.push_str(&format!(
            "{:<24} {:<14} {:>6} {:>6}\n",
            sheet_id,
            SheetKey::from_raw(sheet_id).as_str(),
            point_files,
            line_files
        ));
    }

    if catalog.files_skipped() > 0 {
        report.push_str(&format!(
            "\n{} files outside the naming convention were skipped\n",
            catalog.files_skipped()
        ));
    }

    report
}

fn json_report(catalog: &SheetCatalog) -> Result<String> {
    let sheets: Vec<serde_json::Value> = catalog
        .summary()
        .iter()
        .map(|(sheet_id, (point_files, line_files))| {
            let categories: Vec<String> = catalog
                .categories_for(sheet_id)
                .iter()
                .map(|c| c.as_code().to_string())
                .collect();
            serde_json::json!({
                "sheet": sheet_id,
                "key": SheetKey::from_raw(sheet_id).as_str(),
                "point_files": point_files,
                "line_files": line_files,
                "categories": categories,
            })
        })
        .collect();

    let report = serde_json::json!({
        "sheet_count": sheets.len(),
        "file_count": catalog.len(),
        "files_skipped": catalog.files_skipped(),
        "sheets": sheets,
    });

    serde_json::to_string_pretty(&report)
        .map(|mut text| {
            text.push('\n');
            text
        })
        .map_err(|e| Error::pipeline(format!("Failed to serialize report: {}", e)))
}
