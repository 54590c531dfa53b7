//! Source file catalog for sheet-partitioned survey exports
//!
//! Recursively discovers ASCII survey files below a source root and keys
//! them by `(sheet identifier, category code)` following the
//! `<sheetId>_<category>.<ext>` file name convention. Two files resolving
//! to the same key are an ambiguous source and fail discovery fast.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::app::models::CategoryCode;
use crate::constants::{CATEGORY_SEPARATOR, SURVEY_FILE_EXTENSION};
use crate::{Error, Result};

/// Characters permitted in a raw sheet identifier
const SHEET_ID_PATTERN: &str = r"^[0-9A-Za-z-]+$";

/// Catalog of discovered source files, keyed by sheet and category
#[derive(Debug, Default)]
pub struct SheetCatalog {
    entries: HashMap<(String, CategoryCode), PathBuf>,
    sheet_ids: BTreeSet<String>,
    files_skipped: usize,
}

impl SheetCatalog {
    /// Recursively enumerate survey files below the source root
    ///
    /// Files without the survey extension, without a category separator or
    /// with an unknown category code are skipped with a warning. A key
    /// collision aborts discovery.
    pub fn discover(source_root: &Path) -> Result<Self> {
        if !source_root.is_dir() {
            return Err(Error::catalog(format!(
                "Source root is not a directory: {}",
                source_root.display()
            )));
        }

        info!("Scanning for survey files in: {}", source_root.display());
        let sheet_id_re = Regex::new(SHEET_ID_PATTERN).expect("valid sheet id pattern");

        let mut catalog = Self::default();

        for entry in WalkDir::new(source_root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !has_survey_extension(path) {
                continue;
            }

            match parse_file_stem(path, &sheet_id_re) {
                Some((sheet_id, category)) => {
                    catalog.insert(sheet_id, category, path.to_path_buf())?;
                }
                None => {
                    warn!(
                        "Skipping file outside the naming convention: {}",
                        path.display()
                    );
                    catalog.files_skipped += 1;
                }
            }
        }

        info!(
            "Catalog ready: {} files across {} sheets ({} skipped)",
            catalog.entries.len(),
            catalog.sheet_ids.len(),
            catalog.files_skipped
        );

        Ok(catalog)
    }

    fn insert(&mut self, sheet_id: String, category: CategoryCode, path: PathBuf) -> Result<()> {
        let key = (sheet_id.clone(), category);
        if let Some(existing) = self.entries.get(&key) {
            return Err(Error::catalog_collision(
                sheet_id,
                category.as_code(),
                existing.clone(),
                path,
            ));
        }

        debug!(
            "Cataloged sheet '{}' category '{}': {}",
            sheet_id,
            category,
            path.display()
        );
        self.sheet_ids.insert(sheet_id);
        self.entries.insert(key, path);
        Ok(())
    }

    /// Source file for a sheet/category pair, if present
    pub fn source_for(&self, sheet_id: &str, category: CategoryCode) -> Option<&Path> {
        self.entries
            .get(&(sheet_id.to_string(), category))
            .map(PathBuf::as_path)
    }

    /// The distinct raw sheet identifiers present in the catalog
    pub fn distinct_sheet_ids(&self) -> Vec<String> {
        self.sheet_ids.iter().cloned().collect()
    }

    /// Categories available for one sheet
    pub fn categories_for(&self, sheet_id: &str) -> Vec<CategoryCode> {
        let mut categories: Vec<CategoryCode> = self
            .entries
            .keys()
            .filter(|(id, _)| id == sheet_id)
            .map(|(_, category)| *category)
            .collect();
        categories.sort_by_key(|c| c.as_code());
        categories
    }

    /// Per-sheet counts of point and line category files, in sheet order
    pub fn summary(&self) -> BTreeMap<String, (usize, usize)> {
        let mut summary: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for (sheet_id, category) in self.entries.keys() {
            let counts = summary.entry(sheet_id.clone()).or_default();
            if category.is_point() {
                counts.0 += 1;
            } else {
                counts.1 += 1;
            }
        }
        summary
    }

    /// Number of cataloged files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of files skipped during discovery
    pub fn files_skipped(&self) -> usize {
        self.files_skipped
    }
}

fn has_survey_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SURVEY_FILE_EXTENSION))
}

/// Split a file stem into sheet identifier and category code
///
/// The identifier is the stem text before the first category separator;
/// the remainder must be a known category letter code.
fn parse_file_stem(path: &Path, sheet_id_re: &Regex) -> Option<(String, CategoryCode)> {
    let stem = path.file_stem()?.to_str()?;
    let (sheet_id, code) = stem.split_once(CATEGORY_SEPARATOR)?;

    if sheet_id.is_empty() || !sheet_id_re.is_match(sheet_id) {
        return None;
    }

    let category = CategoryCode::from_code(code)?;
    Some((sheet_id.to_string(), category))
}
