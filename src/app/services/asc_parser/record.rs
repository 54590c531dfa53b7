//! Single-record parsing for ASCII survey files
//!
//! Each text line is one record: a numeric vertex tuple, a sentinel token,
//! a blank filler line, or malformed input.

use crate::app::models::Vertex;
use crate::constants::{SENTINEL_END, SENTINEL_START};

/// One parsed record of an ASCII survey file
#[derive(Debug, Clone, PartialEq)]
pub enum AscRecord {
    /// A surveyed position, already swapped into (primary, secondary, elevation)
    Vertex(Vertex),
    /// Literal marker beginning a vertex run
    SentinelStart,
    /// Literal marker ending a vertex run
    SentinelEnd,
    /// Empty or whitespace-only line
    Blank,
    /// Unparseable line, carrying the raw text for reporting
    Malformed(String),
}

/// Parse one raw text line into a typed record
///
/// Sentinel tokens are detected by containment, before numeric parsing
/// (source format convention). A line is malformed if it has fewer than
/// three whitespace-separated tokens or any token fails float conversion.
/// The on-disk field order (secondary, primary, elevation) is swapped to
/// (primary, secondary, elevation) unconditionally. Never panics.
pub fn parse_record(line: &str) -> AscRecord {
    if line.contains(SENTINEL_START) {
        return AscRecord::SentinelStart;
    }
    if line.contains(SENTINEL_END) {
        return AscRecord::SentinelEnd;
    }

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return AscRecord::Blank;
    }

    let mut values = Vec::with_capacity(3);
    for token in trimmed.split_whitespace() {
        match token.parse::<f64>() {
            Ok(value) => values.push(value),
            Err(_) => return AscRecord::Malformed(line.to_string()),
        }
    }

    if values.len() < 3 {
        return AscRecord::Malformed(line.to_string());
    }

    AscRecord::Vertex(Vertex::new(values[1], values[0], values[2]))
}
