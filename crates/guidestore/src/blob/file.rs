use super::{new_blob_id, BlobError, BlobResult, BlobStore};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Blob store keeping one file per blob under a directory.
///
/// Files are named by their id. Ids are restricted to ASCII
/// alphanumerics, `-` and `_` so an id can never escape the directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> BlobResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the blobs.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ids of every stored blob, sorted.
    pub fn ids(&self) -> BlobResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_valid_id(name) {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn blob_path(&self, id: &str) -> BlobResult<PathBuf> {
        if !is_valid_id(id) {
            return Err(BlobError::InvalidId { id: id.to_string() });
        }
        Ok(self.dir.join(id))
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl BlobStore for FileBlobStore {
    fn store(&self, bytes: &[u8]) -> BlobResult<String> {
        let id = new_blob_id();
        let path = self.blob_path(&id)?;
        let mut file = fs::File::create(&path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(id)
    }

    fn retrieve(&self, id: &str) -> BlobResult<Option<Vec<u8>>> {
        let path = self.blob_path(id)?;
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, id: &str) -> BlobResult<()> {
        let path = self.blob_path(id)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn contains(&self, id: &str) -> BlobResult<bool> {
        Ok(self.blob_path(id)?.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn blobs_survive_reopen() {
        let dir = tempdir().unwrap();
        let id = {
            let blobs = FileBlobStore::open(dir.path().join("images")).unwrap();
            blobs.store(b"\x89PNG").unwrap()
        };

        let blobs = FileBlobStore::open(dir.path().join("images")).unwrap();
        assert_eq!(blobs.retrieve(&id).unwrap(), Some(b"\x89PNG".to_vec()));
        assert_eq!(blobs.ids().unwrap(), vec![id]);
    }

    #[test]
    fn delete_missing_is_ok() {
        let dir = tempdir().unwrap();
        let blobs = FileBlobStore::open(dir.path()).unwrap();

        let id = blobs.store(b"x").unwrap();
        blobs.delete(&id).unwrap();
        blobs.delete(&id).unwrap();
        assert!(!blobs.contains(&id).unwrap());
        assert_eq!(blobs.retrieve(&id).unwrap(), None);
    }

    #[test]
    fn path_like_ids_are_rejected() {
        let dir = tempdir().unwrap();
        let blobs = FileBlobStore::open(dir.path()).unwrap();

        for id in ["../guides.db", "a/b", "", "name.png"] {
            assert!(matches!(
                blobs.retrieve(id),
                Err(BlobError::InvalidId { .. })
            ));
        }
        assert!(matches!(
            blobs.delete("../x"),
            Err(BlobError::InvalidId { .. })
        ));
    }
}
