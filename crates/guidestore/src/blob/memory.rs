use super::{new_blob_id, BlobResult, BlobStore};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Blob store kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Stores `bytes` under a caller-chosen id, replacing any previous blob.
    pub fn insert(&self, id: impl Into<String>, bytes: Vec<u8>) {
        self.blobs.write().insert(id.into(), bytes);
    }
}

impl BlobStore for InMemoryBlobStore {
    fn store(&self, bytes: &[u8]) -> BlobResult<String> {
        let id = new_blob_id();
        self.blobs.write().insert(id.clone(), bytes.to_vec());
        Ok(id)
    }

    fn retrieve(&self, id: &str) -> BlobResult<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(id).cloned())
    }

    fn delete(&self, id: &str) -> BlobResult<()> {
        self.blobs.write().remove(id);
        Ok(())
    }

    fn contains(&self, id: &str) -> BlobResult<bool> {
        Ok(self.blobs.read().contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_retrieve_delete() {
        let blobs = InMemoryBlobStore::new();
        let id = blobs.store(b"png").unwrap();

        assert_eq!(blobs.retrieve(&id).unwrap(), Some(b"png".to_vec()));
        assert!(blobs.contains(&id).unwrap());

        blobs.delete(&id).unwrap();
        blobs.delete(&id).unwrap();
        assert!(blobs.is_empty());
        assert_eq!(blobs.retrieve(&id).unwrap(), None);
    }

    #[test]
    fn ids_are_distinct() {
        let blobs = InMemoryBlobStore::new();
        let a = blobs.store(b"same").unwrap();
        let b = blobs.store(b"same").unwrap();
        assert_ne!(a, b);
        assert_eq!(blobs.len(), 2);
    }
}
