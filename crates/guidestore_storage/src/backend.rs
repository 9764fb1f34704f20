//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level storage backend for the document file.
///
/// Backends are **opaque byte stores**. They provide simple operations
/// for reading, appending and flushing data. The engine owns the file
/// format; backends do not understand records or collections.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `flush` pushes buffered writes to the OS, `sync` makes them durable
/// - Backends must be `Send + Sync` so one handle can serve every repository
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the read would extend beyond the current size
    /// or an I/O error occurs.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the storage.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Flushes all pending writes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// This is the offset where the next `append` will write.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Truncates the storage to the given size.
    ///
    /// Used to drop a torn trailing record after a crash.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_size` is greater than the current size
    /// or the truncation fails.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Re-reads the size from the underlying medium.
    ///
    /// A file shared with a cooperating process may grow behind this
    /// handle's back; the default implementation assumes it cannot.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn refresh(&mut self) -> StorageResult<u64> {
        self.size()
    }
}
