//! Database facade and recovery.

use crate::backup::{copy_database_file, default_backup_path, write_database_bytes};
use crate::compaction::{self, CompactionResult, Relocation};
use crate::config::{Config, OpenMode};
use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};
use crate::index::IndexValue;
use crate::lock::{FileLock, WriteGuard};
use crate::log::DocumentLog;
use crate::record::Record;
use crate::schema::{IndexDefinition, Schema};
use crate::state::{decode_value, State};
use crate::stats::{CollectionStats, DatabaseStats, StatsSnapshot};
use crate::types::ScanOrder;
use crate::verify::VerifyReport;
use guidestore_storage::{FileBackend, InMemoryBackend, StorageBackend};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// An open database file.
///
/// `Database` works on raw document bytes; typed access goes through
/// [`Collection`](crate::Collection). It provides:
/// - Document CRUD keyed by collection name and [`EntityId`]
/// - Secondary index lookups and ordered index scans
/// - Checkpoint, backup, compaction and verification
///
/// # Opening a Database
///
/// ```rust,ignore
/// use guidestore_core::{Config, Database, Schema};
/// use std::path::Path;
///
/// let db = Database::open(Path::new("guides.db"), Config::default(), &schema)?;
/// db.insert("settings", EntityId::new(), payload)?;
/// db.close()?;
/// ```
///
/// Most callers go through [`Engine`](crate::Engine), which opens the
/// database lazily and shares it between repositories.
///
/// # Recovery
///
/// Opening replays the whole log. A torn record at the end of the file
/// (a crash mid-append) is truncated away; a damaged record anywhere else
/// fails the open with `ChecksumMismatch`.
pub struct Database {
    /// File path. None for in-memory databases.
    path: Option<PathBuf>,
    /// Configuration.
    config: Config,
    /// Record log.
    log: DocumentLog,
    /// Cross-process lock. None for in-memory databases.
    lock: Option<FileLock>,
    /// Replayed state.
    state: RwLock<State>,
    /// Operation counters.
    stats: DatabaseStats,
    /// Set once `close` has run.
    closed: AtomicBool,
}

/// Exclusive access for one write: the in-process state lock and, in
/// shared mode, the cross-process file lock. Fields drop in order, so the
/// state is released before the file lock.
struct WriteSession<'a> {
    state: RwLockWriteGuard<'a, State>,
    _file: Option<WriteGuard<'a>>,
}

impl Database {
    /// Opens or creates the database file at `path`.
    ///
    /// Declares every collection of `schema` the file does not have yet
    /// and builds all declared indexes from the log.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist and `create_if_missing` is false
    /// - Another process holds the file exclusively (`DatabaseLocked`)
    /// - The file is not a database file or is damaged
    /// - I/O errors occur
    pub fn open(path: &Path, config: Config, schema: &Schema) -> CoreResult<Self> {
        if !path.exists() {
            if !config.create_if_missing {
                return Err(CoreError::invalid_format(format!(
                    "database file does not exist: {}",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }

        let lock = FileLock::acquire(path, config.open_mode)?;
        let backend = FileBackend::open(path)?;

        let (log, state) = {
            let _guard = lock.write_guard()?;
            Self::recover(Box::new(backend), &config, schema)?
        };

        debug!(
            path = %path.display(),
            mode = ?config.open_mode,
            bytes = state.applied_to,
            "opened database"
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            config,
            log,
            lock: Some(lock),
            state: RwLock::new(state),
            stats: DatabaseStats::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Opens an empty database that lives only in memory.
    pub fn open_in_memory(schema: &Schema) -> CoreResult<Self> {
        let config = Config::default();
        let (log, state) = Self::recover(Box::new(InMemoryBackend::new()), &config, schema)?;

        Ok(Self {
            path: None,
            config,
            log,
            lock: None,
            state: RwLock::new(state),
            stats: DatabaseStats::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Replays the log and applies the schema.
    fn recover(
        backend: Box<dyn StorageBackend>,
        config: &Config,
        schema: &Schema,
    ) -> CoreResult<(DocumentLog, State)> {
        let log = DocumentLog::open(backend, config.format_version, config.sync_on_write)?;

        let scan = log.scan_from(0)?;
        if scan.torn_bytes > 0 {
            warn!(
                offset = scan.end,
                bytes = scan.torn_bytes,
                "truncating incomplete record at end of database file"
            );
            log.truncate(scan.end)?;
        }

        let mut state = State::new(schema, scan.end);
        for (offset, record) in &scan.records {
            state.apply(*offset, record)?;
        }

        for name in state.undeclared(schema) {
            let record = Record::collection(state.next_collection_id(), name);
            let offset = log.append(&record)?;
            state.apply(offset, &record)?;
            state.applied_to = offset + record.encoded_size() as u64;
            debug!(collection = name, "declared collection");
        }

        Ok((log, state))
    }

    /// Returns the database file path, if file-backed.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the configuration the database was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns true until [`Database::close`] is called.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(CoreError::DatabaseClosed)
        }
    }

    fn is_shared(&self) -> bool {
        self.config.open_mode == OpenMode::Shared
    }

    /// Applies records another process appended since the last read.
    fn catch_up(&self, state: &mut State, repair_tail: bool) -> CoreResult<()> {
        let size = self.log.refresh()?;
        if size < state.applied_to {
            return Err(CoreError::invalid_format(
                "database file shrank while open",
            ));
        }
        if size == state.applied_to {
            return Ok(());
        }

        let scan = self.log.scan_from(state.applied_to)?;
        for (offset, record) in &scan.records {
            state.apply(*offset, record)?;
        }
        state.applied_to = scan.end;

        if repair_tail && scan.torn_bytes > 0 {
            warn!(
                offset = scan.end,
                bytes = scan.torn_bytes,
                "truncating incomplete record left by another process"
            );
            self.log.truncate(scan.end)?;
        }
        Ok(())
    }

    fn read_state(&self) -> CoreResult<RwLockReadGuard<'_, State>> {
        self.ensure_open()?;
        if self.is_shared() {
            let mut state = self.state.write();
            self.catch_up(&mut state, false)?;
            return Ok(RwLockWriteGuard::downgrade(state));
        }
        Ok(self.state.read())
    }

    fn write_session(&self) -> CoreResult<WriteSession<'_>> {
        self.ensure_open()?;
        let file = match &self.lock {
            Some(lock) => Some(lock.write_guard()?),
            None => None,
        };
        let mut state = self.state.write();
        if self.is_shared() {
            self.catch_up(&mut state, true)?;
        }
        Ok(WriteSession { state, _file: file })
    }

    /// Appends `record` and returns its offset, advancing the replay mark.
    fn append(&self, state: &mut State, record: &Record) -> CoreResult<u64> {
        let offset = self.log.append(record)?;
        let len = record.encoded_size() as u64;
        state.applied_to = offset + len;
        self.stats.record_write(len);
        Ok(offset)
    }

    // === Documents ===

    /// Gets the payload of a document.
    ///
    /// Returns `None` if the document doesn't exist.
    pub fn get(&self, collection: &str, id: EntityId) -> CoreResult<Option<Vec<u8>>> {
        let state = self.read_state()?;
        let Some(offset) = state.collection(collection)?.offset_of(id) else {
            return Ok(None);
        };
        let record = self.log.read_at(offset)?;
        self.stats.record_read(record.payload.len() as u64);
        Ok(Some(record.payload))
    }

    /// Returns true if the document exists.
    pub fn contains(&self, collection: &str, id: EntityId) -> CoreResult<bool> {
        Ok(self.read_state()?.collection(collection)?.contains(id))
    }

    /// Returns the ids of every live document, in id order.
    pub fn ids(&self, collection: &str) -> CoreResult<Vec<EntityId>> {
        let state = self.read_state()?;
        self.stats.record_scan();
        Ok(state
            .collection(collection)?
            .documents()
            .map(|(id, _)| id)
            .collect())
    }

    /// Returns every live document, in id order.
    pub fn list(&self, collection: &str) -> CoreResult<Vec<(EntityId, Vec<u8>)>> {
        let state = self.read_state()?;
        self.stats.record_scan();
        state
            .collection(collection)?
            .documents()
            .map(|(id, offset)| {
                let record = self.log.read_at(offset)?;
                self.stats.record_read(record.payload.len() as u64);
                Ok((id, record.payload))
            })
            .collect()
    }

    /// Returns the number of live documents.
    pub fn count(&self, collection: &str) -> CoreResult<usize> {
        Ok(self.read_state()?.collection(collection)?.len())
    }

    /// Inserts a new document.
    ///
    /// # Errors
    ///
    /// - `DuplicateId` if a document with `id` exists
    /// - `UniqueViolation` if a unique index already holds one of its keys
    /// - `Codec` if `payload` is not a CBOR document
    pub fn insert(&self, collection: &str, id: EntityId, payload: Vec<u8>) -> CoreResult<()> {
        if id.is_nil() {
            return Err(CoreError::invalid_operation(
                "cannot insert a document with a nil id",
            ));
        }
        let document = decode_value(&payload)?;

        let mut session = self.write_session()?;
        let state = &mut *session.state;

        let coll = state.collection(collection)?;
        if coll.contains(id) {
            return Err(CoreError::DuplicateId {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        let keys = coll.keys_for(&document);
        coll.check_unique(&keys, id)?;

        let record = Record::put(coll.id(), id, payload);
        let offset = self.append(state, &record)?;
        state.collection_mut(collection)?.put(id, offset, keys)
    }

    /// Replaces an existing document.
    ///
    /// Returns false (and writes nothing) if no document has `id`.
    ///
    /// # Errors
    ///
    /// Returns `UniqueViolation` if the new version collides with another
    /// document on a unique index.
    pub fn update(&self, collection: &str, id: EntityId, payload: Vec<u8>) -> CoreResult<bool> {
        let document = decode_value(&payload)?;

        let mut session = self.write_session()?;
        let state = &mut *session.state;

        let coll = state.collection(collection)?;
        if !coll.contains(id) {
            return Ok(false);
        }
        let keys = coll.keys_for(&document);
        coll.check_unique(&keys, id)?;

        let record = Record::put(coll.id(), id, payload);
        let offset = self.append(state, &record)?;
        state.collection_mut(collection)?.put(id, offset, keys)?;
        Ok(true)
    }

    /// Deletes a document. Returns false if it did not exist.
    pub fn delete(&self, collection: &str, id: EntityId) -> CoreResult<bool> {
        let mut session = self.write_session()?;
        let state = &mut *session.state;

        let coll = state.collection(collection)?;
        if !coll.contains(id) {
            return Ok(false);
        }

        let record = Record::tombstone(coll.id(), id);
        self.append(state, &record)?;
        state.collection_mut(collection)?.remove(id);
        self.stats.record_delete();
        Ok(true)
    }

    // === Indexes ===

    /// Returns the documents whose key in `index` equals `key`, in id order.
    ///
    /// Text keys are compared case-insensitively.
    pub fn index_lookup(
        &self,
        collection: &str,
        index: &str,
        key: &IndexValue,
    ) -> CoreResult<Vec<EntityId>> {
        let state = self.read_state()?;
        self.stats.record_index_lookup();
        Ok(state.collection(collection)?.index(index)?.lookup(key))
    }

    /// Walks a BTree index in key order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for hash indexes.
    pub fn index_scan(
        &self,
        collection: &str,
        index: &str,
        order: ScanOrder,
        limit: Option<usize>,
    ) -> CoreResult<Vec<(IndexValue, EntityId)>> {
        let state = self.read_state()?;
        self.stats.record_index_lookup();
        state.collection(collection)?.index(index)?.scan(order, limit)
    }

    /// Returns the names of the declared collections, in declaration order.
    pub fn collection_names(&self) -> CoreResult<Vec<String>> {
        Ok(self
            .read_state()?
            .collections()
            .into_iter()
            .map(|c| c.name().to_string())
            .collect())
    }

    /// Returns the index definitions maintained for a collection.
    pub fn indexes(&self, collection: &str) -> CoreResult<Vec<IndexDefinition>> {
        Ok(self
            .read_state()?
            .collection(collection)?
            .indexes()
            .map(|i| i.definition().clone())
            .collect())
    }

    // === Maintenance ===

    /// Forces buffered writes to the durable file.
    pub fn checkpoint(&self) -> CoreResult<()> {
        self.ensure_open()?;
        self.log.sync()?;
        self.stats.record_checkpoint();
        debug!("checkpoint complete");
        Ok(())
    }

    /// Copies the database file after a checkpoint.
    ///
    /// Without a destination the copy goes to
    /// `<db dir>/<backup dir>/data_backup_<yyyyMMdd_HHmmss>.<ext>`.
    /// Missing directories are created and an existing file at the
    /// destination is overwritten. Writers in this process wait for the
    /// copy; a cooperating process in shared mode does not.
    ///
    /// # Errors
    ///
    /// In-memory databases need an explicit destination.
    pub fn backup(&self, destination: Option<&Path>) -> CoreResult<PathBuf> {
        self.checkpoint()?;
        let _state = self.state.read();

        let (target, bytes) = match &self.path {
            Some(path) => {
                let target = match destination {
                    Some(dest) => dest.to_path_buf(),
                    None => default_backup_path(
                        path,
                        &self.config.backup_dir_name,
                        &chrono::Local::now(),
                    ),
                };
                let bytes = copy_database_file(path, &target)?;
                (target, bytes)
            }
            None => {
                let target = destination.ok_or_else(|| {
                    CoreError::invalid_operation("in-memory backup needs a destination")
                })?;
                let bytes = write_database_bytes(&self.log.read_all()?, target)?;
                (target.to_path_buf(), bytes)
            }
        };

        info!(destination = %target.display(), bytes, "backup written");
        Ok(target)
    }

    /// Rewrites the file with only live documents.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` in shared mode, where another process
    /// may hold offsets into the current file.
    pub fn compact(&self) -> CoreResult<CompactionResult> {
        self.ensure_open()?;
        if self.is_shared() {
            return Err(CoreError::invalid_operation(
                "compaction requires exclusive mode",
            ));
        }

        let mut state = self.state.write();
        let bytes_before = self.log.size()?;
        let input_records = self.log.scan_from(0)?.records.len();

        let compacted = match &self.path {
            Some(path) => self.compact_file(&state, path)?,
            None => {
                let compacted =
                    compaction::rewrite(&state, &self.log, Box::new(InMemoryBackend::new()))?;
                self.log.replace_backend(compacted.backend);
                (compacted.relocations, compacted.records, compacted.end)
            }
        };

        let (relocations, output_records, end) = compacted;
        for (collection, id, offset) in relocations {
            state.relocate(collection, id, offset);
        }
        state.applied_to = end;

        let result = CompactionResult {
            input_records,
            output_records,
            bytes_before,
            bytes_after: end,
        };
        info!(
            before = result.bytes_before,
            after = result.bytes_after,
            records = result.output_records,
            "compacted database"
        );
        Ok(result)
    }

    fn compact_file(
        &self,
        state: &State,
        path: &Path,
    ) -> CoreResult<(Vec<Relocation>, usize, u64)> {
        let temp = temp_path(path);
        if temp.exists() {
            fs::remove_file(&temp)?;
        }

        let compacted = compaction::rewrite(state, &self.log, Box::new(FileBackend::open(&temp)?))?;
        drop(compacted.backend);

        let previous = self.log.detach()?;
        if let Err(e) = fs::rename(&temp, path) {
            if let Some(previous) = previous {
                self.log.replace_backend(previous);
            }
            return Err(e.into());
        }
        drop(previous);

        self.log
            .replace_backend(Box::new(FileBackend::open_existing(path)?));
        Ok((compacted.relocations, compacted.records, compacted.end))
    }

    /// Rescans the file and checks every record.
    pub fn verify(&self) -> CoreResult<VerifyReport> {
        let _state = self.read_state()?;
        let scan = self.log.scan_from(0)?;
        VerifyReport::from_scan(self.log.format_version(), self.log.size()?, &scan)
    }

    /// Returns counters and per-collection document counts.
    pub fn stats(&self) -> CoreResult<StatsSnapshot> {
        let state = self.read_state()?;
        let mut collections: Vec<CollectionStats> = state
            .collections()
            .into_iter()
            .map(|c| CollectionStats {
                name: c.name().to_string(),
                documents: c.len(),
                indexes: c.index_count(),
            })
            .collect();
        collections.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(StatsSnapshot {
            reads: self.stats.reads(),
            writes: self.stats.writes(),
            deletes: self.stats.deletes(),
            scans: self.stats.scans(),
            index_lookups: self.stats.index_lookups(),
            checkpoints: self.stats.checkpoints(),
            bytes_written: self.stats.bytes_written(),
            bytes_read: self.stats.bytes_read(),
            file_size: self.log.size()?,
            collections,
        })
    }

    /// Syncs and releases the file and its lock.
    ///
    /// Idempotent. Every later operation fails with `DatabaseClosed`.
    pub fn close(&self) -> CoreResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let _state = self.state.write();
        self.log.close()?;
        if let Some(lock) = &self.lock {
            lock.release()?;
        }
        debug!("closed database");
        Ok(())
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close database cleanly");
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".compact");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CollectionSchema;
    use serde::Serialize;
    use tempfile::tempdir;

    #[derive(Serialize)]
    struct Category<'a> {
        name: &'a str,
        rank: i64,
    }

    fn doc(name: &str, rank: i64) -> Vec<u8> {
        let mut bytes = Vec::new();
        ciborium::into_writer(&Category { name, rank }, &mut bytes).unwrap();
        bytes
    }

    fn schema() -> Schema {
        Schema::new().collection(
            CollectionSchema::new("categories")
                .index(IndexDefinition::btree("name").unique())
                .index(IndexDefinition::btree("rank")),
        )
    }

    #[test]
    fn insert_get_update_delete() {
        let db = Database::open_in_memory(&schema()).unwrap();
        let id = EntityId::new();

        db.insert("categories", id, doc("Networking", 1)).unwrap();
        assert_eq!(db.get("categories", id).unwrap(), Some(doc("Networking", 1)));

        assert!(db.update("categories", id, doc("Cabling", 1)).unwrap());
        assert!(!db.update("categories", EntityId::new(), doc("x", 0)).unwrap());

        assert!(db.delete("categories", id).unwrap());
        assert!(!db.delete("categories", id).unwrap());
        assert_eq!(db.get("categories", id).unwrap(), None);
        assert_eq!(db.count("categories").unwrap(), 0);
    }

    #[test]
    fn duplicate_id_rejected() {
        let db = Database::open_in_memory(&schema()).unwrap();
        let id = EntityId::new();

        db.insert("categories", id, doc("A", 1)).unwrap();
        let err = db.insert("categories", id, doc("B", 2)).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateId { .. }));
    }

    #[test]
    fn unique_index_is_case_insensitive() {
        let db = Database::open_in_memory(&schema()).unwrap();

        db.insert("categories", EntityId::new(), doc("Networking", 1))
            .unwrap();
        let err = db
            .insert("categories", EntityId::new(), doc("NETWORKING", 2))
            .unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(db.count("categories").unwrap(), 1);
    }

    #[test]
    fn failed_update_leaves_indexes_untouched() {
        let db = Database::open_in_memory(&schema()).unwrap();
        let a = EntityId::new();
        let b = EntityId::new();
        db.insert("categories", a, doc("Alpha", 1)).unwrap();
        db.insert("categories", b, doc("Beta", 2)).unwrap();

        assert!(db.update("categories", b, doc("alpha", 2)).is_err());
        assert_eq!(
            db.index_lookup("categories", "name", &IndexValue::text("beta"))
                .unwrap(),
            vec![b]
        );
    }

    #[test]
    fn index_scan_orders_by_key() {
        let db = Database::open_in_memory(&schema()).unwrap();
        let ids: Vec<EntityId> = (0..4).map(|_| EntityId::new()).collect();
        for (i, id) in ids.iter().enumerate() {
            db.insert("categories", *id, doc(&format!("c{i}"), i as i64 * 10))
                .unwrap();
        }

        let desc: Vec<EntityId> = db
            .index_scan("categories", "rank", ScanOrder::Descending, Some(2))
            .unwrap()
            .into_iter()
            .map(|(_, id)| id)
            .collect();
        assert_eq!(desc, vec![ids[3], ids[2]]);
    }

    #[test]
    fn unknown_collection_and_index() {
        let db = Database::open_in_memory(&schema()).unwrap();
        assert!(matches!(
            db.get("guides", EntityId::new()),
            Err(CoreError::CollectionNotFound { .. })
        ));
        assert!(matches!(
            db.index_lookup("categories", "color", &IndexValue::Null),
            Err(CoreError::IndexNotFound { .. })
        ));
    }

    #[test]
    fn nil_id_and_garbage_payload_rejected() {
        let db = Database::open_in_memory(&schema()).unwrap();
        assert!(db.insert("categories", EntityId::nil(), doc("a", 1)).is_err());
        assert!(matches!(
            db.insert("categories", EntityId::new(), vec![0xFF, 0xFF]),
            Err(CoreError::Codec { .. })
        ));
    }

    #[test]
    fn reopen_replays_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("guides.db");
        let kept = EntityId::new();
        {
            let db = Database::open(&path, Config::default(), &schema()).unwrap();
            db.insert("categories", kept, doc("Kept", 1)).unwrap();
            let gone = EntityId::new();
            db.insert("categories", gone, doc("Gone", 2)).unwrap();
            db.delete("categories", gone).unwrap();
            db.close().unwrap();
        }

        let db = Database::open(&path, Config::default(), &schema()).unwrap();
        assert_eq!(db.ids("categories").unwrap(), vec![kept]);
        assert_eq!(
            db.index_lookup("categories", "name", &IndexValue::text("KEPT"))
                .unwrap(),
            vec![kept]
        );
        assert_eq!(db.collection_names().unwrap(), vec!["categories"]);
    }

    #[test]
    fn schema_is_applied_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("guides.db");

        let size = {
            let db = Database::open(&path, Config::default(), &schema()).unwrap();
            db.stats().unwrap().file_size
        };
        let db = Database::open(&path, Config::default(), &schema()).unwrap();
        assert_eq!(db.stats().unwrap().file_size, size);
    }

    #[test]
    fn torn_tail_is_truncated_on_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("guides.db");
        let id = EntityId::new();
        let clean_size = {
            let db = Database::open(&path, Config::default(), &schema()).unwrap();
            db.insert("categories", id, doc("Survivor", 1)).unwrap();
            db.close().unwrap();
            fs::metadata(&path).unwrap().len()
        };

        let partial = Record::put(
            crate::types::CollectionId::new(1),
            EntityId::new(),
            doc("Lost", 2),
        )
        .encode();
        let mut bytes = fs::read(&path).unwrap();
        bytes.extend_from_slice(&partial[..partial.len() / 2]);
        fs::write(&path, &bytes).unwrap();

        let db = Database::open(&path, Config::default(), &schema()).unwrap();
        assert_eq!(db.ids("categories").unwrap(), vec![id]);
        assert_eq!(fs::metadata(&path).unwrap().len(), clean_size);
    }

    #[test]
    fn exclusive_mode_rejects_second_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("guides.db");

        let first = Database::open(&path, Config::default(), &schema()).unwrap();
        let second = Database::open(&path, Config::default(), &schema());
        assert!(matches!(second, Err(CoreError::DatabaseLocked)));

        first.close().unwrap();
        assert!(Database::open(&path, Config::default(), &schema()).is_ok());
    }

    #[test]
    fn shared_mode_sees_other_handle_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("guides.db");
        let config = Config::default().open_mode(OpenMode::Shared);

        let a = Database::open(&path, config.clone(), &schema()).unwrap();
        let b = Database::open(&path, config, &schema()).unwrap();

        let id = EntityId::new();
        a.insert("categories", id, doc("Shared", 1)).unwrap();
        assert_eq!(b.get("categories", id).unwrap(), Some(doc("Shared", 1)));

        let err = b
            .insert("categories", EntityId::new(), doc("SHARED", 2))
            .unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(matches!(b.compact(), Err(CoreError::InvalidOperation { .. })));
    }

    #[test]
    fn missing_file_without_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let result = Database::open(&path, Config::default().create_if_missing(false), &schema());
        assert!(matches!(result, Err(CoreError::InvalidFormat { .. })));
    }

    #[test]
    fn compaction_preserves_logical_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("guides.db");
        let db = Database::open(&path, Config::default(), &schema()).unwrap();

        let keep = EntityId::new();
        db.insert("categories", keep, doc("Keep", 1)).unwrap();
        for rank in 2..10 {
            db.update("categories", keep, doc("Keep", rank)).unwrap();
        }
        let temp = EntityId::new();
        db.insert("categories", temp, doc("Temp", 0)).unwrap();
        db.delete("categories", temp).unwrap();

        let result = db.compact().unwrap();
        assert!(result.bytes_saved() > 0);
        assert_eq!(result.output_records, 2);

        assert_eq!(db.get("categories", keep).unwrap(), Some(doc("Keep", 9)));
        db.insert("categories", EntityId::new(), doc("After", 3))
            .unwrap();
        db.close().unwrap();

        let db = Database::open(&path, Config::default(), &schema()).unwrap();
        assert_eq!(db.count("categories").unwrap(), 2);
        assert_eq!(db.get("categories", keep).unwrap(), Some(doc("Keep", 9)));
        assert!(db.verify().unwrap().is_clean());
    }

    #[test]
    fn backup_copies_checkpointed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("guides.db");
        let db = Database::open(&path, Config::default(), &schema()).unwrap();
        db.insert("categories", EntityId::new(), doc("Backed up", 1))
            .unwrap();

        let default_target = db.backup(None).unwrap();
        assert!(default_target.starts_with(dir.path().join("backups")));
        assert_eq!(fs::read(&default_target).unwrap(), fs::read(&path).unwrap());

        let explicit = dir.path().join("manual").join("copy.db");
        fs::create_dir_all(explicit.parent().unwrap()).unwrap();
        fs::write(&explicit, b"stale").unwrap();
        assert_eq!(db.backup(Some(&explicit)).unwrap(), explicit);
        assert_eq!(fs::read(&explicit).unwrap(), fs::read(&path).unwrap());
    }

    #[test]
    fn in_memory_backup_needs_destination() {
        let db = Database::open_in_memory(&schema()).unwrap();
        assert!(matches!(
            db.backup(None),
            Err(CoreError::InvalidOperation { .. })
        ));

        let dir = tempdir().unwrap();
        let target = dir.path().join("memory.db");
        db.backup(Some(&target)).unwrap();
        assert!(crate::verify::verify_file(&target).is_ok());
    }

    #[test]
    fn closed_database_rejects_operations() {
        let db = Database::open_in_memory(&schema()).unwrap();
        db.close().unwrap();
        db.close().unwrap();

        assert!(!db.is_open());
        assert!(matches!(
            db.count("categories"),
            Err(CoreError::DatabaseClosed)
        ));
        assert!(matches!(db.checkpoint(), Err(CoreError::DatabaseClosed)));
    }

    #[test]
    fn stats_report_collections() {
        let db = Database::open_in_memory(&schema()).unwrap();
        db.insert("categories", EntityId::new(), doc("a", 1)).unwrap();
        db.list("categories").unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.reads, 1);
        assert_eq!(stats.total_documents(), 1);
        assert_eq!(stats.collections[0].indexes, 2);
    }
}
