//! In-memory storage backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::sync::Arc;

/// An in-memory storage backend.
///
/// Backs throwaway catalogs and compaction scratch space. Handles created
/// with [`InMemoryBackend::handle`] share one buffer the way two processes
/// share one database file: each handle only sees bytes up to its last
/// append or [`StorageBackend::refresh`].
///
/// # Example
///
/// ```rust
/// use guidestore_storage::{StorageBackend, InMemoryBackend};
///
/// let mut writer = InMemoryBackend::new();
/// let mut reader = writer.handle();
///
/// writer.append(b"guide").unwrap();
/// assert_eq!(reader.size().unwrap(), 0);
/// assert_eq!(reader.refresh().unwrap(), 5);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    bytes: Arc<RwLock<Vec<u8>>>,
    visible: u64,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend over existing file contents.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        let visible = data.len() as u64;
        Self {
            bytes: Arc::new(RwLock::new(data)),
            visible,
        }
    }

    /// Opens another handle onto the same bytes, seeing everything
    /// written so far.
    #[must_use]
    pub fn handle(&self) -> Self {
        let visible = self.bytes.read().len() as u64;
        Self {
            bytes: Arc::clone(&self.bytes),
            visible,
        }
    }

    /// Returns a copy of every byte in the shared buffer.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.bytes.read().clone()
    }

    /// Flips every bit of the byte at `offset`, simulating on-disk damage.
    ///
    /// Returns false if `offset` lies past the end.
    pub fn corrupt(&self, offset: u64) -> bool {
        let mut bytes = self.bytes.write();
        match bytes.get_mut(offset as usize) {
            Some(byte) => {
                *byte ^= 0xFF;
                true
            }
            None => false,
        }
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let end = offset.saturating_add(len as u64);
        if end > self.visible {
            return Err(StorageError::ReadPastEnd {
                offset,
                len,
                size: self.visible,
            });
        }

        Ok(self.bytes.read()[offset as usize..end as usize].to_vec())
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let mut bytes = self.bytes.write();
        let offset = bytes.len() as u64;
        bytes.extend_from_slice(data);
        self.visible = bytes.len() as u64;
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.visible)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let mut bytes = self.bytes.write();
        let size = bytes.len() as u64;
        if new_size > size {
            return Err(StorageError::TruncateBeyondEnd {
                requested: new_size,
                size,
            });
        }

        bytes.truncate(new_size as usize);
        self.visible = new_size;
        Ok(())
    }

    fn refresh(&mut self) -> StorageResult<u64> {
        self.visible = self.bytes.read().len() as u64;
        Ok(self.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_return_physical_offsets() {
        let mut backend = InMemoryBackend::new();
        assert_eq!(backend.append(b"GSDB").unwrap(), 0);
        assert_eq!(backend.append(b"\x01\x00\x00\x00").unwrap(), 4);
        assert_eq!(backend.size().unwrap(), 8);
        assert_eq!(backend.read_at(0, 4).unwrap(), b"GSDB");
    }

    #[test]
    fn handle_sees_nothing_until_refresh() {
        let mut writer = InMemoryBackend::with_data(b"header".to_vec());
        let mut reader = writer.handle();
        assert_eq!(reader.size().unwrap(), 6);

        writer.append(b"+step").unwrap();
        assert!(matches!(
            reader.read_at(6, 5),
            Err(StorageError::ReadPastEnd { size: 6, .. })
        ));

        assert_eq!(reader.refresh().unwrap(), 11);
        assert_eq!(reader.read_at(6, 5).unwrap(), b"+step");
    }

    #[test]
    fn stale_handle_appends_after_other_writes() {
        let mut first = InMemoryBackend::new();
        let mut second = first.handle();

        first.append(b"abc").unwrap();
        assert_eq!(second.append(b"def").unwrap(), 3);
        assert_eq!(second.size().unwrap(), 6);
        assert_eq!(first.data(), b"abcdef");
    }

    #[test]
    fn truncate_drops_torn_tail() {
        let mut backend = InMemoryBackend::with_data(b"complete|tor".to_vec());
        backend.truncate(9).unwrap();

        assert_eq!(backend.size().unwrap(), 9);
        assert_eq!(backend.data(), b"complete|");
        assert!(matches!(
            backend.truncate(20),
            Err(StorageError::TruncateBeyondEnd { requested: 20, size: 9 })
        ));
    }

    #[test]
    fn corrupt_flips_one_byte() {
        let backend = InMemoryBackend::with_data(vec![0x00, 0x0F]);
        assert!(backend.corrupt(1));
        assert!(!backend.corrupt(2));
        assert_eq!(backend.read_at(0, 2).unwrap(), [0x00, 0xF0]);
    }
}
