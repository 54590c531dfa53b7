//! Output stage: region-of-interest selection, thematic splitting,
//! reprojection gate and GeoJSON serialization
//!
//! The projector restricts the reconciled datasets to the region of
//! interest, splits the bridge/structure category into its own subset and
//! decides between bit-identical copy and reprojection; the writer emits
//! the named GeoJSON datasets into the output workspace.

pub mod projector;
pub mod writer;

#[cfg(test)]
mod tests;

pub use projector::{OutputBundle, OutputProjector};
pub use writer::{GeoJsonWriter, WriteStats};
