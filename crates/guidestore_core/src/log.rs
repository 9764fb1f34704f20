//! Append-only document log.
//!
//! The database file is a fixed header followed by [`Record`]s:
//!
//! ```text
//! | "GSDB" (4) | major (2) | minor (2) | record | record | ... |
//! ```
//!
//! Records are never rewritten in place. Updates append a new `Put`,
//! deletes append a `Tombstone`; the latest record for an id wins.

use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use guidestore_storage::StorageBackend;
use parking_lot::RwLock;

/// Magic bytes at the start of every database file.
pub const FILE_MAGIC: [u8; 4] = *b"GSDB";
/// Size of the file header in bytes.
pub const FILE_HEADER_SIZE: u64 = 8;

/// Outcome of scanning a region of the log.
#[derive(Debug, Default)]
pub struct LogScan {
    /// Complete records with the offset each starts at.
    pub records: Vec<(u64, Record)>,
    /// Offset just past the last complete record.
    pub end: u64,
    /// Bytes after `end` that do not form a complete record.
    pub torn_bytes: u64,
}

/// The record log on top of a storage backend.
pub struct DocumentLog {
    backend: RwLock<Option<Box<dyn StorageBackend>>>,
    format_version: (u16, u16),
    sync_on_write: bool,
}

impl DocumentLog {
    /// Opens a log, writing the header into an empty backend or
    /// validating the header of an existing one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the header is missing, has the wrong
    /// magic, or carries an incompatible major version.
    pub fn open(
        mut backend: Box<dyn StorageBackend>,
        format_version: (u16, u16),
        sync_on_write: bool,
    ) -> CoreResult<Self> {
        let size = backend.size()?;

        let found = if size == 0 {
            let mut header = Vec::with_capacity(FILE_HEADER_SIZE as usize);
            header.extend_from_slice(&FILE_MAGIC);
            header.extend_from_slice(&format_version.0.to_le_bytes());
            header.extend_from_slice(&format_version.1.to_le_bytes());
            backend.append(&header)?;
            backend.sync()?;
            format_version
        } else {
            let found = read_header(backend.as_ref())?;
            if found.0 != format_version.0 {
                return Err(CoreError::invalid_format(format!(
                    "incompatible format version: file is v{}.{}, expected v{}.{}",
                    found.0, found.1, format_version.0, format_version.1
                )));
            }
            found
        };

        Ok(Self {
            backend: RwLock::new(Some(backend)),
            format_version: found,
            sync_on_write,
        })
    }

    /// Returns the format version recorded in the file header.
    #[must_use]
    pub fn format_version(&self) -> (u16, u16) {
        self.format_version
    }

    /// Appends a record and returns its offset.
    pub fn append(&self, record: &Record) -> CoreResult<u64> {
        let mut guard = self.backend.write();
        let backend = guard.as_mut().ok_or(CoreError::DatabaseClosed)?;

        let offset = backend.append(&record.encode())?;
        if self.sync_on_write {
            backend.sync()?;
        } else {
            backend.flush()?;
        }
        Ok(offset)
    }

    /// Reads the record starting at `offset`.
    pub fn read_at(&self, offset: u64) -> CoreResult<Record> {
        let guard = self.backend.read();
        let backend = guard.as_ref().ok_or(CoreError::DatabaseClosed)?;

        let prefix = backend.read_at(offset, 4)?;
        let len = Record::peek_len(&prefix)
            .ok_or_else(|| CoreError::invalid_format("short record prefix"))?;
        let data = backend.read_at(offset, len)?;
        Record::decode(&data, offset)
    }

    /// Scans every complete record from `start` to the current end.
    ///
    /// Stops at the first incomplete record instead of failing, so a
    /// crash mid-append (or a concurrent writer mid-append) shows up as
    /// `torn_bytes`. A complete record with a bad checksum is an error.
    pub fn scan_from(&self, start: u64) -> CoreResult<LogScan> {
        let guard = self.backend.read();
        let backend = guard.as_ref().ok_or(CoreError::DatabaseClosed)?;
        scan_backend(backend.as_ref(), start)
    }

    /// Truncates the log to `size` bytes.
    pub fn truncate(&self, size: u64) -> CoreResult<()> {
        let mut guard = self.backend.write();
        let backend = guard.as_mut().ok_or(CoreError::DatabaseClosed)?;
        backend.truncate(size)?;
        Ok(())
    }

    /// Re-reads the physical size of the file.
    pub fn refresh(&self) -> CoreResult<u64> {
        let mut guard = self.backend.write();
        let backend = guard.as_mut().ok_or(CoreError::DatabaseClosed)?;
        Ok(backend.refresh()?)
    }

    /// Returns the current size in bytes.
    pub fn size(&self) -> CoreResult<u64> {
        let guard = self.backend.read();
        let backend = guard.as_ref().ok_or(CoreError::DatabaseClosed)?;
        Ok(backend.size()?)
    }

    /// Flushes and syncs buffered writes to the durable file.
    pub fn sync(&self) -> CoreResult<()> {
        let mut guard = self.backend.write();
        let backend = guard.as_mut().ok_or(CoreError::DatabaseClosed)?;
        backend.flush()?;
        backend.sync()?;
        Ok(())
    }

    /// Syncs and releases the backend. Later calls fail with `DatabaseClosed`.
    pub fn close(&self) -> CoreResult<()> {
        let mut guard = self.backend.write();
        if let Some(mut backend) = guard.take() {
            backend.flush()?;
            backend.sync()?;
        }
        Ok(())
    }

    /// Reads the whole file, header included.
    pub fn read_all(&self) -> CoreResult<Vec<u8>> {
        let guard = self.backend.read();
        let backend = guard.as_ref().ok_or(CoreError::DatabaseClosed)?;
        let size = backend.size()?;
        Ok(backend.read_at(0, size as usize)?)
    }

    /// Flushes and takes the backend out, leaving the log closed.
    pub(crate) fn detach(&self) -> CoreResult<Option<Box<dyn StorageBackend>>> {
        let mut guard = self.backend.write();
        if let Some(backend) = guard.as_mut() {
            backend.flush()?;
            backend.sync()?;
        }
        Ok(guard.take())
    }

    /// Consumes the log, returning its backend.
    pub(crate) fn into_backend(self) -> Option<Box<dyn StorageBackend>> {
        self.backend.into_inner()
    }

    /// Replaces the backend, used after compaction swaps the file.
    pub(crate) fn replace_backend(&self, backend: Box<dyn StorageBackend>) {
        *self.backend.write() = Some(backend);
    }
}

/// Reads and checks the file header, returning the format version.
pub(crate) fn read_header(backend: &dyn StorageBackend) -> CoreResult<(u16, u16)> {
    if backend.size()? < FILE_HEADER_SIZE {
        return Err(CoreError::invalid_format("file too small for header"));
    }

    let header = backend.read_at(0, FILE_HEADER_SIZE as usize)?;
    if header[0..4] != FILE_MAGIC {
        return Err(CoreError::invalid_format("not a GuideStore database file"));
    }

    let major = u16::from_le_bytes([header[4], header[5]]);
    let minor = u16::from_le_bytes([header[6], header[7]]);
    Ok((major, minor))
}

/// Scans records of any backend, used by the log and by offline verification.
pub(crate) fn scan_backend(backend: &dyn StorageBackend, start: u64) -> CoreResult<LogScan> {
    let size = backend.size()?;
    let mut scan = LogScan {
        end: start,
        ..LogScan::default()
    };
    let mut offset = start.max(FILE_HEADER_SIZE);
    scan.end = offset;

    while offset < size {
        if size - offset < 4 {
            break;
        }

        let prefix = backend.read_at(offset, 4)?;
        let len = Record::peek_len(&prefix).unwrap_or(0);
        if len < Record::HEADER_SIZE + Record::CRC_SIZE || offset + len as u64 > size {
            break;
        }

        let data = backend.read_at(offset, len)?;
        let record = Record::decode(&data, offset)?;
        scan.records.push((offset, record));

        offset += len as u64;
        scan.end = offset;
    }

    scan.torn_bytes = size.saturating_sub(scan.end);
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;
    use crate::types::CollectionId;
    use guidestore_storage::InMemoryBackend;

    fn open_log() -> DocumentLog {
        DocumentLog::open(Box::new(InMemoryBackend::new()), (1, 0), false).unwrap()
    }

    #[test]
    fn new_log_writes_header() {
        let log = open_log();
        assert_eq!(log.size().unwrap(), FILE_HEADER_SIZE);
        assert!(log.scan_from(0).unwrap().records.is_empty());
    }

    #[test]
    fn append_and_read_back() {
        let log = open_log();
        let record = Record::put(CollectionId::new(1), EntityId::new(), b"doc".to_vec());

        let offset = log.append(&record).unwrap();
        assert_eq!(offset, FILE_HEADER_SIZE);
        assert_eq!(log.read_at(offset).unwrap(), record);
    }

    #[test]
    fn scan_reports_torn_tail() {
        let record = Record::put(CollectionId::new(1), EntityId::new(), b"complete".to_vec());
        let mut bytes = b"GSDB\x01\x00\x00\x00".to_vec();
        bytes.extend_from_slice(&record.encode());
        let partial = Record::put(CollectionId::new(1), EntityId::new(), b"partial".to_vec());
        bytes.extend_from_slice(&partial.encode()[..10]);

        let log =
            DocumentLog::open(Box::new(InMemoryBackend::with_data(bytes)), (1, 0), false).unwrap();
        let scan = log.scan_from(0).unwrap();

        assert_eq!(scan.records.len(), 1);
        assert_eq!(scan.torn_bytes, 10);
        assert_eq!(scan.end, FILE_HEADER_SIZE + record.encoded_size() as u64);
    }

    #[test]
    fn rejects_foreign_file() {
        let backend = InMemoryBackend::with_data(b"SQLite format 3\0".to_vec());
        let err = DocumentLog::open(Box::new(backend), (1, 0), false)
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::InvalidFormat { .. }));
    }

    #[test]
    fn rejects_newer_major_version() {
        let backend = InMemoryBackend::with_data(b"GSDB\x02\x00\x00\x00".to_vec());
        let result = DocumentLog::open(Box::new(backend), (1, 0), false);
        assert!(matches!(result, Err(CoreError::InvalidFormat { .. })));
    }

    #[test]
    fn existing_file_reports_its_minor_version() {
        let backend = InMemoryBackend::with_data(b"GSDB\x01\x00\x03\x00".to_vec());
        let log = DocumentLog::open(Box::new(backend), (1, 0), false).unwrap();
        assert_eq!(log.format_version(), (1, 3));
        assert_eq!(log.read_all().unwrap().len(), FILE_HEADER_SIZE as usize);
    }

    #[test]
    fn refresh_picks_up_records_from_another_log() {
        let file = InMemoryBackend::with_data(b"GSDB\x01\x00\x00\x00".to_vec());
        let writer = DocumentLog::open(Box::new(file.handle()), (1, 0), false).unwrap();
        let reader = DocumentLog::open(Box::new(file.handle()), (1, 0), false).unwrap();

        let record = Record::put(CollectionId::new(2), EntityId::new(), b"progress".to_vec());
        writer.append(&record).unwrap();
        assert!(reader.scan_from(FILE_HEADER_SIZE).unwrap().records.is_empty());

        reader.refresh().unwrap();
        let scan = reader.scan_from(FILE_HEADER_SIZE).unwrap();
        assert_eq!(scan.records, vec![(FILE_HEADER_SIZE, record)]);
        assert_eq!(scan.torn_bytes, 0);
    }

    #[test]
    fn damaged_record_fails_scan() {
        let file = InMemoryBackend::new();
        let log = DocumentLog::open(Box::new(file.handle()), (1, 0), false).unwrap();
        let record = Record::put(CollectionId::new(1), EntityId::new(), b"title".to_vec());
        let offset = log.append(&record).unwrap();

        assert!(file.corrupt(offset + Record::HEADER_SIZE as u64));
        assert!(matches!(
            log.scan_from(0),
            Err(CoreError::ChecksumMismatch { offset: 8, .. })
        ));
    }

    #[test]
    fn closed_log_rejects_operations() {
        let log = open_log();
        log.close().unwrap();
        log.close().unwrap();

        assert!(matches!(log.size(), Err(CoreError::DatabaseClosed)));
        let record = Record::tombstone(CollectionId::new(1), EntityId::new());
        assert!(matches!(log.append(&record), Err(CoreError::DatabaseClosed)));
    }
}
