//! Tests for the ASCII survey parser
//!
//! Covers single-record parsing, the sentinel state machine and whole-file
//! streaming behavior.


use crate::app::models::{CategoryCode, SheetKey};

/// Sheet key used across parser tests
pub fn test_sheet() -> SheetKey {
    SheetKey::from_raw("N-33-132-A-c-2-2")
}

/// A point category used across parser tests
pub fn point_category() -> CategoryCode {
    CategoryCode::GridPoint
}

/// A line category used across parser tests
pub fn line_category() -> CategoryCode {
    CategoryCode::BreakLine
}
