//! Error types for the document engine.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in engine operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] guidestore_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A document could not be encoded or decoded.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the codec failure.
        message: String,
    },

    /// The file is not a database file or has an unsupported version.
    #[error("invalid database format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// A record failed its checksum.
    #[error("checksum mismatch at offset {offset}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Offset of the damaged record.
        offset: u64,
        /// Stored checksum.
        expected: u32,
        /// Computed checksum.
        actual: u32,
    },

    /// A unique index already holds the key for another document.
    #[error("unique index {collection}.{index} already contains key {key}")]
    UniqueViolation {
        /// Collection name.
        collection: String,
        /// Index name.
        index: String,
        /// Human-readable key.
        key: String,
    },

    /// A document with the same id already exists.
    #[error("document {id} already exists in collection {collection}")]
    DuplicateId {
        /// Collection name.
        collection: String,
        /// The conflicting id.
        id: String,
    },

    /// Collection is not declared in the schema.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Name of the collection.
        name: String,
    },

    /// Index is not declared on the collection.
    #[error("index {index} not found on collection {collection}")]
    IndexNotFound {
        /// Collection name.
        collection: String,
        /// Index name.
        index: String,
    },

    /// Another process holds the database file exclusively.
    #[error("database locked: another process has exclusive access")]
    DatabaseLocked,

    /// The database handle has been closed.
    #[error("database is closed")]
    DatabaseClosed,

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a collection not found error.
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound { name: name.into() }
    }

    /// Returns true for errors caused by a uniqueness constraint.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. } | Self::DuplicateId { .. })
    }
}
