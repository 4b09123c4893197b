//! Text utilities.
//!
//! This module provides small helpers shared by the document and diff layers:
//! - Content hashing for line comparison
//! - Line start tables and blank-span checks

mod hash;
pub mod lines;

pub use hash::fnv1a_hash;
pub use lines::{compute_line_starts, is_blank};
