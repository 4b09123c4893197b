//! Line diffing: the primitive that compares two line sequences and the
//! builder that turns its output into tracker ranges.

pub mod builder;
mod primitive;

pub use builder::RangeBuilder;
pub use primitive::{Change, DiffError, LineDiff, SimilarLineDiff};
