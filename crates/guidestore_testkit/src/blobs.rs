//! Blob store doubles.

use guidestore::{BlobError, BlobResult, BlobStore, InMemoryBlobStore};
use parking_lot::Mutex;
use std::collections::HashSet;

/// An in-memory blob store that records every delete and can be told to
/// fail for specific ids.
#[derive(Debug, Default)]
pub struct RecordingBlobStore {
    inner: InMemoryBlobStore,
    deletes: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingBlobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes deletes of `id` fail.
    pub fn fail_on(&self, id: impl Into<String>) {
        self.failing.lock().insert(id.into());
    }

    /// Ids passed to `delete`, in call order, failed ones included.
    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().clone()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl BlobStore for RecordingBlobStore {
    fn store(&self, bytes: &[u8]) -> BlobResult<String> {
        self.inner.store(bytes)
    }

    fn retrieve(&self, id: &str) -> BlobResult<Option<Vec<u8>>> {
        self.inner.retrieve(id)
    }

    fn delete(&self, id: &str) -> BlobResult<()> {
        self.deletes.lock().push(id.to_string());
        if self.failing.lock().contains(id) {
            return Err(BlobError::Unavailable {
                message: format!("injected failure for {id}"),
            });
        }
        self.inner.delete(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_fails() {
        let blobs = RecordingBlobStore::new();
        let keep = blobs.store(b"a").unwrap();
        let drop = blobs.store(b"b").unwrap();
        blobs.fail_on(keep.clone());

        assert!(blobs.delete(&keep).is_err());
        blobs.delete(&drop).unwrap();

        assert_eq!(blobs.deletes(), vec![keep.clone(), drop]);
        assert_eq!(blobs.len(), 1);
        assert!(blobs.contains(&keep).unwrap());
    }
}
