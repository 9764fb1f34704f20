//! Error types for the catalog store.

use crate::blob::BlobError;
use guidestore_core::CoreError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by repositories.
///
/// Absent records are not errors: lookups return `None` and updates
/// return `false`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Engine error (I/O, corruption, locking, uniqueness).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Blob store error.
    #[error("blob store error: {0}")]
    Blob(#[from] BlobError),

    /// Input rejected before reaching the engine.
    #[error("validation failed: {message}")]
    Validation {
        /// What was wrong.
        message: String,
    },

    /// A JSON setting or export could not be read or written.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns true if a unique index rejected the write.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_constraint_violation())
    }
}
