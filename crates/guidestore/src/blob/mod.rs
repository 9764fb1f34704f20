//! Binary attachment storage.
//!
//! Step images live outside the document file. The catalog only keeps
//! their string ids; a [`BlobStore`] maps ids to bytes.

mod file;
mod memory;

pub use file::FileBlobStore;
pub use memory::InMemoryBlobStore;

use thiserror::Error;

/// Result type for blob operations.
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors from a blob store.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Underlying I/O failed.
    #[error("blob I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The id cannot name a blob in this store.
    #[error("invalid blob id: {id}")]
    InvalidId {
        /// The rejected id.
        id: String,
    },

    /// The store refused the operation.
    #[error("blob store unavailable: {message}")]
    Unavailable {
        /// Why.
        message: String,
    },
}

/// Storage for opaque binary blobs addressed by string ids.
///
/// Deleting an id that does not exist succeeds.
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` and returns a fresh id.
    fn store(&self, bytes: &[u8]) -> BlobResult<String>;

    /// Returns the bytes stored under `id`, or `None`.
    fn retrieve(&self, id: &str) -> BlobResult<Option<Vec<u8>>>;

    /// Removes the blob stored under `id`.
    fn delete(&self, id: &str) -> BlobResult<()>;

    /// Returns true if `id` is stored.
    fn contains(&self, id: &str) -> BlobResult<bool> {
        Ok(self.retrieve(id)?.is_some())
    }
}

/// Generates a blob id.
pub(crate) fn new_blob_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
