//! Error handling types for line-status
//!
//! This module provides the error types shared by the tracker, the diff
//! primitive and the document contract.

use std::sync::PoisonError;
use thiserror::Error;

use crate::diff::DiffError;
use crate::document::DocumentError;

/// Comprehensive error type for tracker operations
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The tracker cannot answer right now (uninitialized, released,
    /// bulk-updating, rolling back or in too-big mode)
    #[error("Tracker unavailable: {reason}")]
    Unavailable { reason: String },

    /// The range was superseded by a reconciliation and is no longer tracked
    #[error("Range is no longer valid: {line1}..{line2}")]
    InvalidRange { line1: usize, line2: usize },

    /// The diff primitive refused the input
    #[error("Too large to diff: {0}")]
    TooLargeToDiff(#[from] DiffError),

    /// Internal bookkeeping no longer matches the document
    #[error("Inconsistent tracker state: {message}")]
    Inconsistent { message: String },

    /// The document rejected an edit
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// A mutation was attempted away from the thread that owns the tracker
    #[error("Tracker mutation attempted off its owning thread")]
    WrongThread,
}

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Helper trait to convert PoisonError into a usable guard
pub trait LockResultExt<T> {
    /// Recover the guard from a poisoned lock, logging the recovery.
    ///
    /// The context parameter identifies which operation triggered lock recovery,
    /// helping developers debug thread safety issues.
    fn recover_poison(self, context: &str) -> T;
}

impl<T> LockResultExt<T> for Result<T, PoisonError<T>> {
    fn recover_poison(self, context: &str) -> T {
        match self {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!(
                    target: "line_status::lock_recovery",
                    "Recovered from poisoned lock in {}",
                    context
                );
                poisoned.into_inner()
            }
        }
    }
}

/// Helper functions for common error patterns
impl TrackerError {
    /// Create an unavailable error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        TrackerError::Unavailable {
            reason: reason.into(),
        }
    }

    /// Create an invalid range error
    pub fn invalid_range(line1: usize, line2: usize) -> Self {
        TrackerError::InvalidRange { line1, line2 }
    }

    /// Create an inconsistency error
    pub fn inconsistent(message: impl Into<String>) -> Self {
        TrackerError::Inconsistent {
            message: message.into(),
        }
    }
}
